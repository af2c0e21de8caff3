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

//! The configurable optimization pipeline.

use std::mem;

use ordo_core::lane::{Lane, LaneContext, LaneRegistry};
use ordo_core::{Geometry, OptimizerSettings};
use ordo_lanes::{
    AccessOrderLane, CacheMissLane, CacheMissStats, IndexMeshLane, PassOutcome, VertexCacheLane,
};
use ordo_telemetry::{OptimizerMetrics, ScopedMetricTimer};

/// What the pipeline did to one mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizationReport {
    /// One outcome per executed pass, in execution order.
    pub outcomes: Vec<PassOutcome>,
    /// FIFO misses before the first pass, when reporting is enabled.
    pub misses_before: Option<CacheMissStats>,
    /// FIFO misses after the last pass, when reporting is enabled.
    pub misses_after: Option<CacheMissStats>,
}

impl OptimizationReport {
    /// Returns `true` if at least one pass modified the mesh.
    pub fn modified(&self) -> bool {
        self.outcomes.iter().any(PassOutcome::applied)
    }

    /// The outcome of the pass with the given strategy name, if it ran.
    pub fn outcome(&self, pass: &str) -> Option<&PassOutcome> {
        self.outcomes.iter().find(|o| o.pass == pass)
    }

    /// ACMR before optimization, when reporting is enabled.
    pub fn acmr_before(&self) -> Option<f64> {
        self.misses_before.map(|s| s.acmr())
    }

    /// ACMR after optimization, when reporting is enabled.
    pub fn acmr_after(&self) -> Option<f64> {
        self.misses_after.map(|s| s.acmr())
    }
}

/// What the pipeline did to a batch of meshes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One report per mesh, in input order.
    pub meshes: Vec<OptimizationReport>,
    /// Misses summed over every mesh before optimization.
    pub misses_before: CacheMissStats,
    /// Misses summed over every mesh after optimization.
    pub misses_after: CacheMissStats,
}

impl BatchReport {
    /// Number of meshes at least one pass modified.
    pub fn modified_count(&self) -> usize {
        self.meshes.iter().filter(|r| r.modified()).count()
    }

    /// ACMR over the whole batch before optimization.
    pub fn acmr_before(&self) -> f64 {
        self.misses_before.acmr()
    }

    /// ACMR over the whole batch after optimization.
    pub fn acmr_after(&self) -> f64 {
        self.misses_after.acmr()
    }
}

/// Runs the passes enabled in an [`OptimizerSettings`] over meshes.
///
/// Passes run in the order index, vertex cache, access order. A pass that
/// does not apply to a mesh leaves it untouched and the next pass still runs.
#[derive(Debug)]
pub struct MeshOptimizer {
    settings: OptimizerSettings,
    lanes: LaneRegistry,
    miss_counter: CacheMissLane,
    metrics: Option<OptimizerMetrics>,
}

impl MeshOptimizer {
    /// Builds the pipeline for `settings`.
    pub fn new(settings: OptimizerSettings) -> Self {
        let mut lanes = LaneRegistry::new();
        if settings.index_mesh {
            lanes.register(Box::new(IndexMeshLane::new()));
        }
        if settings.optimize_vertex_cache {
            lanes.register(Box::new(VertexCacheLane::new()));
        }
        if settings.optimize_vertex_order {
            lanes.register(Box::new(AccessOrderLane::new()));
        }

        if !settings.any_pass_enabled() {
            log::warn!("[MeshOptimizer] every pass is disabled, meshes will only be measured");
        }
        let mut ctx = LaneContext::new();
        for lane in lanes.all() {
            if let Err(e) = lane.on_initialize(&mut ctx) {
                log::warn!("[MeshOptimizer] {} failed to initialize: {e}", lane.strategy_name());
            }
        }
        log::debug!("[MeshOptimizer] pipeline: {lanes:?}");

        Self {
            miss_counter: CacheMissLane::new(settings.miss_cache_size as usize),
            settings,
            lanes,
            metrics: None,
        }
    }

    /// Reports every run into `metrics`.
    pub fn with_metrics(mut self, metrics: OptimizerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The settings the pipeline was built from.
    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// The registered passes, in execution order.
    pub fn lanes(&self) -> &LaneRegistry {
        &self.lanes
    }

    /// The attached metrics, if any.
    pub fn metrics(&self) -> Option<&OptimizerMetrics> {
        self.metrics.as_ref()
    }

    fn run_lane(&self, lane: &dyn Lane, ctx: &mut LaneContext) -> Option<PassOutcome> {
        let pass = lane.strategy_name();
        log::trace!(
            "[MeshOptimizer] {pass} ({}): estimated cost {}",
            lane.lane_kind(),
            lane.estimate_cost(ctx)
        );

        let histogram = self.metrics.as_ref().and_then(|m| {
            m.pass_time(pass)
                .map_err(|e| log::warn!("[MeshOptimizer] no timing for {pass}: {e}"))
                .ok()
        });
        let result = {
            let _timer = histogram.as_ref().map(ScopedMetricTimer::new);
            lane.execute(ctx)
        };
        if let Err(e) = result {
            log::error!("[MeshOptimizer] {pass} failed: {e}");
            return None;
        }

        let outcome = ctx.remove::<PassOutcome>()?;
        if let Some(metrics) = &self.metrics {
            if let Err(e) = metrics.record_pass(pass, outcome.applied()) {
                log::warn!("[MeshOptimizer] failed to record {pass}: {e}");
            }
        }
        Some(outcome)
    }

    fn measure(&self, geometry: &Geometry) -> Option<CacheMissStats> {
        self.settings
            .report_cache_misses
            .then(|| self.miss_counter.measure(geometry))
    }

    /// Runs every enabled pass on `geometry`.
    pub fn optimize(&self, geometry: &mut Geometry) -> OptimizationReport {
        let misses_before = self.measure(geometry);

        let mut outcomes = Vec::new();
        if self.settings.any_pass_enabled() {
            let mut ctx = LaneContext::new();
            ctx.insert(mem::take(geometry));
            outcomes.extend(
                self.lanes
                    .all()
                    .iter()
                    .filter_map(|lane| self.run_lane(lane.as_ref(), &mut ctx)),
            );
            *geometry = ctx.remove::<Geometry>().unwrap_or_default();
        }

        let report = OptimizationReport {
            outcomes,
            misses_before,
            misses_after: self.measure(geometry),
        };
        if let Some(metrics) = &self.metrics {
            let recorded = metrics.record_mesh().and_then(|()| {
                match (report.acmr_before(), report.acmr_after()) {
                    (Some(before), Some(after)) => metrics.record_acmr(before, after),
                    _ => Ok(()),
                }
            });
            if let Err(e) = recorded {
                log::warn!("[MeshOptimizer] failed to record mesh metrics: {e}");
            }
        }
        report
    }

    /// Runs every enabled pass on each mesh of `geometries`.
    ///
    /// When reporting is enabled the returned misses are summed over the whole
    /// batch and an `info!` summary is logged.
    pub fn optimize_batch(&self, geometries: &mut [Geometry]) -> BatchReport {
        let mut batch = BatchReport::default();
        for geometry in geometries.iter_mut() {
            let report = self.optimize(geometry);
            batch.misses_before += report.misses_before.unwrap_or_default();
            batch.misses_after += report.misses_after.unwrap_or_default();
            batch.meshes.push(report);
        }

        if self.settings.report_cache_misses {
            log::info!(
                "[MeshOptimizer] {} meshes, {} modified, ACMR {:.3} -> {:.3} (FIFO {})",
                batch.meshes.len(),
                batch.modified_count(),
                batch.acmr_before(),
                batch.acmr_after(),
                self.miss_counter.cache_size()
            );
            if let Some(metrics) = &self.metrics {
                if let Err(e) = metrics.record_acmr(batch.acmr_before(), batch.acmr_after()) {
                    log::warn!("[MeshOptimizer] failed to record batch ACMR: {e}");
                }
            }
        }
        batch
    }
}

impl Default for MeshOptimizer {
    fn default() -> Self {
        Self::new(OptimizerSettings::default())
    }
}

impl Drop for MeshOptimizer {
    fn drop(&mut self) {
        let mut ctx = LaneContext::new();
        for lane in self.lanes.all() {
            lane.on_shutdown(&mut ctx);
        }
    }
}
