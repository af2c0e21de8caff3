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

//! The metrics published by the mesh optimizer pipeline.

use crate::metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};
use ordo_core::telemetry::{MetricId, MetricsResult};

/// Bucket bounds of the per-pass timing histograms, in milliseconds.
pub const PASS_TIME_BUCKETS_MS: [f64; 8] = [0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0];

/// Typed access to every metric the optimizer reports.
///
/// | Metric | Type |
/// |--------|------|
/// | `ordo:meshes` | counter |
/// | `ordo:passes_applied[pass=…]` | counter |
/// | `ordo:passes_skipped[pass=…]` | counter |
/// | `ordo:pass_time_ms[pass=…]` | histogram |
/// | `ordo:acmr_before` | gauge |
/// | `ordo:acmr_after` | gauge |
///
/// Per-pass metrics are registered the first time a pass reports.
#[derive(Debug, Clone)]
pub struct OptimizerMetrics {
    registry: MetricsRegistry,
    meshes: CounterHandle,
    acmr_before: GaugeHandle,
    acmr_after: GaugeHandle,
}

impl OptimizerMetrics {
    /// Registers the pipeline-wide metrics in `registry`.
    pub fn new(registry: MetricsRegistry) -> MetricsResult<Self> {
        let meshes = registry.register_counter(MetricId::ordo("meshes"), "Meshes processed")?;
        let acmr_before = registry.register_gauge(
            MetricId::ordo("acmr_before"),
            "Average cache miss ratio before optimization",
            "ratio",
        )?;
        let acmr_after = registry.register_gauge(
            MetricId::ordo("acmr_after"),
            "Average cache miss ratio after optimization",
            "ratio",
        )?;
        Ok(Self {
            registry,
            meshes,
            acmr_before,
            acmr_after,
        })
    }

    /// The registry the metrics live in.
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Counts one processed mesh.
    pub fn record_mesh(&self) -> MetricsResult<()> {
        self.meshes.increment().map(drop)
    }

    /// Number of meshes processed so far.
    pub fn meshes(&self) -> MetricsResult<u64> {
        self.meshes.get()
    }

    /// The timing histogram of `pass`, for use with
    /// [`ScopedMetricTimer`](crate::ScopedMetricTimer).
    pub fn pass_time(&self, pass: &str) -> MetricsResult<HistogramHandle> {
        self.registry.register_histogram(
            MetricId::for_pass("pass_time_ms", pass),
            "Wall time of one pass on one mesh",
            "ms",
            PASS_TIME_BUCKETS_MS.to_vec(),
        )
    }

    fn outcome_counter(&self, pass: &str, applied: bool) -> MetricsResult<CounterHandle> {
        let (name, description) = if applied {
            ("passes_applied", "Meshes a pass rewrote")
        } else {
            ("passes_skipped", "Meshes a pass left untouched")
        };
        self.registry
            .register_counter(MetricId::for_pass(name, pass), description)
    }

    /// Counts one run of `pass`, applied or skipped.
    pub fn record_pass(&self, pass: &str, applied: bool) -> MetricsResult<()> {
        self.outcome_counter(pass, applied)?.increment().map(drop)
    }

    /// How often `pass` rewrote a mesh.
    pub fn passes_applied(&self, pass: &str) -> MetricsResult<u64> {
        self.outcome_counter(pass, true)?.get()
    }

    /// How often `pass` left a mesh untouched.
    pub fn passes_skipped(&self, pass: &str) -> MetricsResult<u64> {
        self.outcome_counter(pass, false)?.get()
    }

    /// Publishes the cache miss ratios measured around the pipeline.
    pub fn record_acmr(&self, before: f64, after: f64) -> MetricsResult<()> {
        self.acmr_before.set(before)?;
        self.acmr_after.set(after)
    }

    /// The last published `(before, after)` cache miss ratios.
    pub fn acmr(&self) -> MetricsResult<(f64, f64)> {
        Ok((self.acmr_before.get()?, self.acmr_after.get()?))
    }
}
