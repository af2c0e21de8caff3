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

//! Metric identifiers, values and errors.

use serde::Serialize;
use std::fmt::{self, Display};

/// Namespace shared by every metric the optimizer publishes.
pub const NAMESPACE: &str = "ordo";

/// A structured metric identifier: namespace, name and sorted labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricId {
    /// Broad category of the metric.
    pub namespace: String,
    /// Name of the metric (e.g. `"acmr_after"`).
    pub name: String,
    /// Key-value pairs, kept sorted by key.
    pub labels: Vec<(String, String)>,
}

impl MetricId {
    /// Creates a new `MetricId` with a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: Vec::new(),
        }
    }

    /// Creates an id in the optimizer's [`NAMESPACE`].
    pub fn ordo(name: impl Into<String>) -> Self {
        Self::new(NAMESPACE, name)
    }

    /// Creates an id in the optimizer's namespace labelled with a pass name.
    pub fn for_pass(name: impl Into<String>, pass: impl Into<String>) -> Self {
        Self::ordo(name).with_label("pass", pass)
    }

    /// Adds a label, keeping labels sorted by key.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self.labels.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }

    /// Formats the id as `namespace:name[k=v,...]`.
    pub fn to_string_formatted(&self) -> String {
        if self.labels.is_empty() {
            format!("{}:{}", self.namespace, self.name)
        } else {
            let labels_str = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            format!("{}:{}[{}]", self.namespace, self.name, labels_str)
        }
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_formatted())
    }
}

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricType {
    /// Monotonic count.
    Counter,
    /// Last observed value.
    Gauge,
    /// Bucketed distribution of observations.
    Histogram,
}

/// The current value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetricValue {
    /// A counter value.
    Counter(u64),
    /// A gauge value.
    Gauge(f64),
    /// A histogram summary.
    Histogram {
        /// Upper bounds of the buckets; the last bucket is open-ended.
        bucket_bounds: Vec<f64>,
        /// Observation count per bucket, one more entry than `bucket_bounds`.
        bucket_counts: Vec<u64>,
        /// Number of observations.
        count: u64,
        /// Sum of every observation.
        sum: f64,
    },
}

impl MetricValue {
    /// Returns the [`MetricType`] corresponding to this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// Returns the value as a `u64` if it is a `Counter`.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is a `Gauge`.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// Mean of the observations of a histogram, if it has any.
    pub fn histogram_mean(&self) -> Option<f64> {
        match self {
            MetricValue::Histogram { count, sum, .. } if *count > 0 => Some(sum / *count as f64),
            _ => None,
        }
    }

    /// Records one observation into a histogram value.
    pub fn observe(&mut self, sample: f64) -> MetricsResult<()> {
        match self {
            MetricValue::Histogram {
                bucket_bounds,
                bucket_counts,
                count,
                sum,
            } => {
                let bucket = bucket_bounds
                    .iter()
                    .position(|&bound| sample <= bound)
                    .unwrap_or(bucket_bounds.len());
                bucket_counts[bucket] += 1;
                *count += 1;
                *sum += sample;
                Ok(())
            }
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: other.metric_type(),
            }),
        }
    }
}

/// Static description of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricMetadata {
    /// The metric's unique identifier.
    pub id: MetricId,
    /// The type of the metric.
    pub metric_type: MetricType,
    /// What the metric measures.
    pub description: String,
    /// Unit of measurement (e.g. `"ms"`, `"count"`).
    pub unit: String,
}

/// A metric's metadata together with its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    /// Descriptive metadata.
    pub metadata: MetricMetadata,
    /// Current value.
    pub value: MetricValue,
}

impl Metric {
    /// Creates a counter starting at `initial_value`.
    pub fn new_counter(id: MetricId, description: impl Into<String>, initial_value: u64) -> Self {
        Self {
            metadata: MetricMetadata {
                id,
                metric_type: MetricType::Counter,
                description: description.into(),
                unit: "count".into(),
            },
            value: MetricValue::Counter(initial_value),
        }
    }

    /// Creates a gauge starting at `initial_value`.
    pub fn new_gauge(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        initial_value: f64,
    ) -> Self {
        Self {
            metadata: MetricMetadata {
                id,
                metric_type: MetricType::Gauge,
                description: description.into(),
                unit: unit.into(),
            },
            value: MetricValue::Gauge(initial_value),
        }
    }

    /// Creates an empty histogram over ascending `bucket_bounds`.
    pub fn new_histogram(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        bucket_bounds: Vec<f64>,
    ) -> MetricsResult<Self> {
        if bucket_bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MetricsError::InvalidOperation(format!(
                "histogram bounds for {id} must be strictly ascending"
            )));
        }
        let bucket_counts = vec![0; bucket_bounds.len() + 1];
        Ok(Self {
            metadata: MetricMetadata {
                id,
                metric_type: MetricType::Histogram,
                description: description.into(),
                unit: unit.into(),
            },
            value: MetricValue::Histogram {
                bucket_bounds,
                bucket_counts,
                count: 0,
                sum: 0.0,
            },
        })
    }
}

/// A specialized `Result` type for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error raised by the metrics system.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// The requested metric was never registered.
    MetricNotFound(MetricId),
    /// An operation was applied to a metric of another type.
    TypeMismatch {
        /// The type the operation needs.
        expected: MetricType,
        /// The type that was found.
        found: MetricType,
    },
    /// The storage backend failed.
    StorageError(String),
    /// The operation is invalid for its arguments.
    InvalidOperation(String),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::MetricNotFound(id) => write!(f, "Metric not found: {id}"),
            MetricsError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected:?}, found {found:?}")
            }
            MetricsError::StorageError(msg) => write!(f, "Storage error: {msg}"),
            MetricsError::InvalidOperation(msg) => write!(f, "Invalid operation: {msg}"),
        }
    }
}

impl std::error::Error for MetricsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pass_metric_id_formatting() {
        let id = MetricId::for_pass("pass_time_ms", "VertexCache");
        assert_eq!(id.to_string_formatted(), "ordo:pass_time_ms[pass=VertexCache]");

        let plain = MetricId::ordo("acmr_after");
        assert_eq!(plain.to_string(), "ordo:acmr_after");
    }

    #[test]
    fn test_labels_are_sorted() {
        let id = MetricId::ordo("x")
            .with_label("z", "1")
            .with_label("a", "2");
        assert_eq!(id.labels[0].0, "a");
    }

    #[test]
    fn test_histogram_observe_buckets() {
        let id = MetricId::ordo("pass_time_ms");
        let mut metric = Metric::new_histogram(id, "Pass time", "ms", vec![1.0, 10.0]).unwrap();

        for sample in [0.5, 5.0, 50.0, 8.0] {
            metric.value.observe(sample).unwrap();
        }

        match &metric.value {
            MetricValue::Histogram {
                bucket_counts,
                count,
                ..
            } => {
                assert_eq!(bucket_counts, &vec![1, 2, 1]);
                assert_eq!(*count, 4);
            }
            other => panic!("Expected a histogram, got {other:?}"),
        }
        assert_relative_eq!(metric.value.histogram_mean().unwrap(), 15.875);
    }

    #[test]
    fn test_observe_on_counter_is_type_mismatch() {
        let mut value = MetricValue::Counter(1);
        assert_eq!(
            value.observe(1.0),
            Err(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: MetricType::Counter,
            })
        );
    }

    #[test]
    fn test_histogram_rejects_unsorted_bounds() {
        let result = Metric::new_histogram(MetricId::ordo("h"), "", "ms", vec![5.0, 1.0]);
        assert!(matches!(result, Err(MetricsError::InvalidOperation(_))));
    }
}
