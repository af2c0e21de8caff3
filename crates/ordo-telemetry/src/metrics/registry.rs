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

//! Registry for managing metrics.

use crate::storage::{backend::MetricsBackend, memory_backend::InMemoryBackend};
use ordo_core::telemetry::{Metric, MetricId, MetricType, MetricsError, MetricsResult};
use std::sync::Arc;

/// Central registry for optimizer metrics.
///
/// Registration hands out typed handles that update the backend directly.
/// Registering an id that already exists returns a handle to the existing
/// metric without resetting it, so several components can share a metric by
/// id. Cloning the registry shares its backend.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    backend: Arc<dyn MetricsBackend>,
}

impl MetricsRegistry {
    /// Create a new metrics registry with the default in-memory backend
    pub fn new() -> Self {
        Self {
            backend: Arc::new(InMemoryBackend::new()),
        }
    }

    /// Create a new metrics registry with a custom backend
    pub fn with_backend(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    fn ensure(&self, metric: Metric) -> MetricsResult<MetricId> {
        let expected = metric.metadata.metric_type;
        let stored = self.backend.put_if_absent(metric)?;
        if stored.metadata.metric_type != expected {
            return Err(MetricsError::TypeMismatch {
                expected,
                found: stored.metadata.metric_type,
            });
        }
        Ok(stored.metadata.id)
    }

    /// Register a counter starting at zero
    pub fn register_counter(
        &self,
        id: MetricId,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = self.ensure(Metric::new_counter(id, description, 0))?;
        Ok(CounterHandle::new(id, self.backend.clone()))
    }

    /// Register a gauge starting at zero
    pub fn register_gauge(
        &self,
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        let id = self.ensure(Metric::new_gauge(id, description, unit, 0.0))?;
        Ok(GaugeHandle::new(id, self.backend.clone()))
    }

    /// Register an empty histogram over ascending `buckets`
    pub fn register_histogram(
        &self,
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        buckets: Vec<f64>,
    ) -> MetricsResult<HistogramHandle> {
        let id = self.ensure(Metric::new_histogram(id, description, unit, buckets)?)?;
        Ok(HistogramHandle::new(id, self.backend.clone()))
    }

    /// Get a metric by ID
    pub fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.backend.get_metric(id)
    }

    /// Check if a metric exists
    pub fn contains_metric(&self, id: &MetricId) -> bool {
        self.backend.contains_metric(id)
    }

    /// Get all metrics in a namespace
    pub fn get_namespace_metrics(&self, namespace: &str) -> Vec<Metric> {
        if let Some(memory_backend) = self.backend.as_any().downcast_ref::<InMemoryBackend>() {
            memory_backend.get_metrics_by_namespace(namespace)
        } else {
            self.backend
                .list_all_metrics()
                .into_iter()
                .filter(|m| m.metadata.id.namespace == namespace)
                .collect()
        }
    }

    /// Get all metrics of one type
    pub fn get_metrics_by_type(&self, metric_type: MetricType) -> Vec<Metric> {
        if let Some(memory_backend) = self.backend.as_any().downcast_ref::<InMemoryBackend>() {
            memory_backend.get_metrics_by_type(metric_type)
        } else {
            self.backend
                .list_all_metrics()
                .into_iter()
                .filter(|m| m.metadata.metric_type == metric_type)
                .collect()
        }
    }

    /// Serializes every metric to pretty-printed JSON, sorted by id
    pub fn snapshot_json(&self) -> anyhow::Result<String> {
        let mut metrics = self.backend.list_all_metrics();
        metrics.sort_by_cached_key(|m| m.metadata.id.to_string_formatted());
        Ok(serde_json::to_string_pretty(&metrics)?)
    }

    /// Get the total number of metrics
    pub fn metric_count(&self) -> usize {
        self.backend.metric_count()
    }

    /// Clear all metrics
    pub fn clear_all(&self) -> MetricsResult<()> {
        self.backend.clear_all()
    }

    /// Get direct access to the backend
    pub fn backend(&self) -> &Arc<dyn MetricsBackend> {
        &self.backend
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for counter operations
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl CounterHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Increment the counter by 1
    pub fn increment(&self) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, 1)
    }

    /// Increment the counter by a specific amount
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, amount)
    }

    /// Get the current counter value
    pub fn get(&self) -> MetricsResult<u64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric
            .value
            .as_counter()
            .ok_or_else(|| MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: metric.value.metric_type(),
            })
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for gauge operations
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl GaugeHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Set the gauge to a specific value
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        self.backend.set_gauge(&self.id, value)
    }

    /// Get the current gauge value
    pub fn get(&self) -> MetricsResult<f64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric
            .value
            .as_gauge()
            .ok_or_else(|| MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: metric.value.metric_type(),
            })
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for histogram operations
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl HistogramHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Record a sample in the histogram
    pub fn observe(&self, value: f64) -> MetricsResult<()> {
        self.backend.record_histogram_sample(&self.id, value)
    }

    /// Mean of the recorded samples, `None` before the first one
    pub fn mean(&self) -> MetricsResult<Option<f64>> {
        Ok(self.backend.get_metric(&self.id)?.value.histogram_mean())
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }

    /// Get the full histogram metric
    pub fn get_metric(&self) -> MetricsResult<Metric> {
        self.backend.get_metric(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_counter_registration_and_operations() {
        let registry = MetricsRegistry::new();

        let counter = registry
            .register_counter(MetricId::ordo("meshes"), "Meshes processed")
            .unwrap();

        assert_eq!(counter.increment().unwrap(), 1);
        assert_eq!(counter.increment_by(5).unwrap(), 6);
        assert_eq!(counter.get().unwrap(), 6);
        assert!(registry.contains_metric(counter.id()));
        assert_eq!(registry.metric_count(), 1);
    }

    #[test]
    fn test_registering_twice_keeps_value() {
        let registry = MetricsRegistry::new();
        let id = MetricId::for_pass("passes_applied", "IndexMesh");

        let first = registry.register_counter(id.clone(), "Applied").unwrap();
        first.increment_by(3).unwrap();
        let second = registry.register_counter(id.clone(), "Applied").unwrap();

        assert_eq!(second.get().unwrap(), 3);
        assert!(matches!(
            registry.register_gauge(id, "Applied", "count"),
            Err(MetricsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_gauge_and_histogram() {
        let registry = MetricsRegistry::new();

        let gauge = registry
            .register_gauge(MetricId::ordo("acmr_after"), "ACMR after", "ratio")
            .unwrap();
        gauge.set(0.75).unwrap();
        assert_relative_eq!(gauge.get().unwrap(), 0.75);

        let histogram = registry
            .register_histogram(
                MetricId::for_pass("pass_time_ms", "AccessOrder"),
                "Pass time",
                "ms",
                vec![1.0, 10.0],
            )
            .unwrap();
        assert_eq!(histogram.mean().unwrap(), None);
        histogram.observe(2.0).unwrap();
        histogram.observe(4.0).unwrap();
        assert_relative_eq!(histogram.mean().unwrap().unwrap(), 3.0);
    }

    #[test]
    fn test_filtering_and_snapshot() {
        // --- 1. ARRANGE ---
        let registry = MetricsRegistry::new();
        registry
            .register_counter(MetricId::ordo("meshes"), "Meshes")
            .unwrap();
        registry
            .register_gauge(MetricId::new("host", "memory"), "Memory", "MB")
            .unwrap();

        // --- 2. ACT ---
        let json = registry.snapshot_json().unwrap();

        // --- 3. ASSERT ---
        assert_eq!(registry.get_namespace_metrics("ordo").len(), 1);
        assert_eq!(registry.get_metrics_by_type(MetricType::Gauge).len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert!(json.contains("\"meshes\""), "Snapshot must name the metrics: {json}");

        registry.clear_all().unwrap();
        assert_eq!(registry.metric_count(), 0);
    }
}
