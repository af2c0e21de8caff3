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

//! The storage abstraction behind [`MetricsRegistry`](crate::MetricsRegistry).

use ordo_core::telemetry::{
    Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult,
};
use std::fmt::Debug;

/// Stores metrics by id. Implementations must be usable from several threads.
pub trait MetricsBackend: Send + Sync + Debug + 'static {
    /// Get a reference to this object as Any for downcasting
    fn as_any(&self) -> &dyn std::any::Any;

    /// Store or replace a metric
    fn put_metric(&self, metric: Metric) -> MetricsResult<()>;

    /// Retrieve a metric by ID
    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric>;

    /// Check if a metric exists
    fn contains_metric(&self, id: &MetricId) -> bool;

    /// Remove a metric
    fn remove_metric(&self, id: &MetricId) -> MetricsResult<()>;

    /// Get all metrics, in no particular order
    fn list_all_metrics(&self) -> Vec<Metric>;

    /// Clear all metrics
    fn clear_all(&self) -> MetricsResult<()>;

    /// Get the number of metrics stored
    fn metric_count(&self) -> usize;

    /// Store `metric` unless its id is already present, returning whichever
    /// metric ends up stored
    fn put_if_absent(&self, metric: Metric) -> MetricsResult<Metric> {
        match self.get_metric(&metric.metadata.id) {
            Err(MetricsError::MetricNotFound(_)) => {
                self.put_metric(metric.clone())?;
                Ok(metric)
            }
            other => other,
        }
    }

    /// Increment a counter by the given amount, returning the new value
    fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Counter(ref mut value) => {
                *value = value.saturating_add(delta);
                let result = *value;
                self.put_metric(metric)?;
                Ok(result)
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: metric.value.metric_type(),
            }),
        }
    }

    /// Set a gauge value
    fn set_gauge(&self, id: &MetricId, value: f64) -> MetricsResult<()> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Gauge(ref mut gauge_value) => {
                *gauge_value = value;
                self.put_metric(metric)
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: metric.value.metric_type(),
            }),
        }
    }

    /// Add a sample to a histogram
    fn record_histogram_sample(&self, id: &MetricId, sample: f64) -> MetricsResult<()> {
        let mut metric = self.get_metric(id)?;
        metric.value.observe(sample)?;
        self.put_metric(metric)
    }
}
