// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The default, process-local metrics backend.

use crate::storage::backend::MetricsBackend;
use ordo_core::telemetry::{
    Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Keeps every metric in a `HashMap` behind a `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<MetricId, Metric>>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> MetricsResult<RwLockReadGuard<'_, HashMap<MetricId, Metric>>> {
        self.storage
            .read()
            .map_err(|_| MetricsError::StorageError("Failed to acquire read lock".to_string()))
    }

    fn write(&self) -> MetricsResult<RwLockWriteGuard<'_, HashMap<MetricId, Metric>>> {
        self.storage
            .write()
            .map_err(|_| MetricsError::StorageError("Failed to acquire write lock".to_string()))
    }

    fn update<T>(
        &self,
        id: &MetricId,
        f: impl FnOnce(&mut Metric) -> MetricsResult<T>,
    ) -> MetricsResult<T> {
        let mut storage = self.write()?;
        let metric = storage
            .get_mut(id)
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))?;
        f(metric)
    }

    /// Get metrics by namespace
    pub fn get_metrics_by_namespace(&self, namespace: &str) -> Vec<Metric> {
        self.read().map_or_else(
            |_| Vec::new(),
            |storage| {
                storage
                    .values()
                    .filter(|metric| metric.metadata.id.namespace == namespace)
                    .cloned()
                    .collect()
            },
        )
    }

    /// Get metrics by type
    pub fn get_metrics_by_type(&self, metric_type: MetricType) -> Vec<Metric> {
        self.read().map_or_else(
            |_| Vec::new(),
            |storage| {
                storage
                    .values()
                    .filter(|metric| metric.metadata.metric_type == metric_type)
                    .cloned()
                    .collect()
            },
        )
    }
}

impl MetricsBackend for InMemoryBackend {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn put_metric(&self, metric: Metric) -> MetricsResult<()> {
        self.write()?.insert(metric.metadata.id.clone(), metric);
        Ok(())
    }

    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn contains_metric(&self, id: &MetricId) -> bool {
        self.read().is_ok_and(|storage| storage.contains_key(id))
    }

    fn remove_metric(&self, id: &MetricId) -> MetricsResult<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn list_all_metrics(&self) -> Vec<Metric> {
        self.read()
            .map_or_else(|_| Vec::new(), |storage| storage.values().cloned().collect())
    }

    fn clear_all(&self) -> MetricsResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn metric_count(&self) -> usize {
        self.read().map_or(0, |storage| storage.len())
    }

    fn put_if_absent(&self, metric: Metric) -> MetricsResult<Metric> {
        let mut storage = self.write()?;
        Ok(storage
            .entry(metric.metadata.id.clone())
            .or_insert(metric)
            .clone())
    }

    // Read-modify-write under a single write lock.

    fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        self.update(id, |metric| match metric.value {
            MetricValue::Counter(ref mut value) => {
                *value = value.saturating_add(delta);
                Ok(*value)
            }
            ref other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: other.metric_type(),
            }),
        })
    }

    fn set_gauge(&self, id: &MetricId, value: f64) -> MetricsResult<()> {
        self.update(id, |metric| match metric.value {
            MetricValue::Gauge(ref mut gauge) => {
                *gauge = value;
                Ok(())
            }
            ref other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: other.metric_type(),
            }),
        })
    }

    fn record_histogram_sample(&self, id: &MetricId, sample: f64) -> MetricsResult<()> {
        self.update(id, |metric| metric.value.observe(sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_backend_basic_operations() {
        let backend = InMemoryBackend::new();
        let id = MetricId::for_pass("passes_applied", "IndexMesh");
        let metric = Metric::new_counter(id.clone(), "Applied passes", 42);

        assert!(backend.put_metric(metric).is_ok());
        assert!(backend.contains_metric(&id));
        assert_eq!(backend.get_metric(&id).unwrap().value.as_counter(), Some(42));
        assert_eq!(backend.metric_count(), 1);

        assert!(backend.remove_metric(&id).is_ok());
        assert!(!backend.contains_metric(&id));
        assert_eq!(
            backend.remove_metric(&id),
            Err(MetricsError::MetricNotFound(id))
        );
    }

    #[test]
    fn test_counter_increment() {
        let backend = InMemoryBackend::new();
        let id = MetricId::ordo("meshes");
        backend
            .put_metric(Metric::new_counter(id.clone(), "Meshes", 0))
            .unwrap();

        assert_eq!(backend.increment_counter(&id, 5).unwrap(), 5);
        assert_eq!(backend.increment_counter(&id, 3).unwrap(), 8);
        assert_eq!(backend.get_metric(&id).unwrap().value.as_counter(), Some(8));
    }

    #[test]
    fn test_histogram_samples() {
        // --- 1. ARRANGE ---
        let backend = InMemoryBackend::new();
        let id = MetricId::for_pass("pass_time_ms", "VertexCache");
        let metric = Metric::new_histogram(id.clone(), "Pass time", "ms", vec![1.0, 5.0]).unwrap();
        backend.put_metric(metric).unwrap();

        // --- 2. ACT ---
        for sample in [0.5, 3.0, 7.0, 25.0] {
            backend.record_histogram_sample(&id, sample).unwrap();
        }

        // --- 3. ASSERT ---
        match backend.get_metric(&id).unwrap().value {
            MetricValue::Histogram {
                bucket_counts,
                count,
                ..
            } => {
                assert_eq!(bucket_counts, vec![1, 1, 2]);
                assert_eq!(count, 4);
            }
            other => panic!("Expected a histogram, got {other:?}"),
        }
    }

    #[test]
    fn test_filters_and_type_mismatch() {
        let backend = InMemoryBackend::new();
        let gauge = MetricId::ordo("acmr_after");
        backend
            .put_metric(Metric::new_gauge(gauge.clone(), "ACMR", "ratio", 0.0))
            .unwrap();
        backend
            .put_metric(Metric::new_counter(MetricId::new("other", "c"), "", 0))
            .unwrap();

        assert_eq!(backend.get_metrics_by_namespace("ordo").len(), 1);
        assert_eq!(backend.get_metrics_by_type(MetricType::Counter).len(), 1);
        assert_eq!(
            backend.increment_counter(&gauge, 1),
            Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: MetricType::Gauge,
            })
        );

        backend.clear_all().unwrap();
        assert_eq!(backend.metric_count(), 0);
        assert!(backend.list_all_metrics().is_empty());
    }
}
