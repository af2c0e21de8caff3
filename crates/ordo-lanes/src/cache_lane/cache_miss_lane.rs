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

//! The diagnostic lane measuring cache misses of an existing index order.

use std::any::Any;
use std::ops::AddAssign;
use std::sync::{Mutex, PoisonError};

use ordo_core::lane::{Lane, LaneContext, LaneError, LaneKind};
use ordo_core::mesh::{Geometry, PrimitiveIndexVisitor};
use ordo_core::settings::DEFAULT_MISS_CACHE_SIZE;

use super::simulator::FifoCache;

/// Cache misses and triangles counted over one or more meshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMissStats {
    /// Vertex references not found in the cache.
    pub misses: u64,
    /// Triangles replayed, degenerate ones included.
    pub triangles: u64,
}

impl CacheMissStats {
    /// Average cache miss ratio: misses per triangle, `0.0` with no triangles.
    pub fn acmr(&self) -> f64 {
        if self.triangles == 0 {
            0.0
        } else {
            self.misses as f64 / self.triangles as f64
        }
    }
}

impl AddAssign for CacheMissStats {
    fn add_assign(&mut self, rhs: Self) {
        self.misses += rhs.misses;
        self.triangles += rhs.triangles;
    }
}

struct CacheRecorder {
    cache: FifoCache,
    stats: CacheMissStats,
}

impl PrimitiveIndexVisitor for CacheRecorder {
    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        let corners = [a, b, c];
        self.stats.triangles += 1;
        self.stats.misses += corners
            .iter()
            .filter(|&&v| !self.cache.contains(v))
            .count() as u64;
        self.cache.add_entries(&corners);
    }
}

/// Replays the triangles of a mesh through a FIFO cache and counts misses.
///
/// The lane never modifies a mesh. [`CacheMissLane::record`] and
/// [`Lane::execute`] also add each measurement to running totals, so one
/// lane can report over a whole batch until [`CacheMissLane::reset`].
#[derive(Debug)]
pub struct CacheMissLane {
    cache_size: usize,
    totals: Mutex<CacheMissStats>,
}

impl CacheMissLane {
    /// Creates a lane simulating a FIFO cache of `cache_size` entries.
    ///
    /// Sizes below [`FifoCache::MIN_SIZE`] are raised to it with a warning.
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache_size: FifoCache::new(cache_size).max_size(),
            totals: Mutex::new(CacheMissStats::default()),
        }
    }

    /// Size of the simulated cache.
    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// Measures one mesh without touching the running totals.
    ///
    /// Every primitive set is replayed in order, implicit ranges included,
    /// through one cache that starts empty. Lines and points are ignored, and
    /// so is any set referencing a vertex past the end of the mesh.
    pub fn measure(&self, geometry: &Geometry) -> CacheMissStats {
        let vertex_count = geometry.vertex_count();
        if vertex_count == 0 {
            return CacheMissStats::default();
        }
        let mut recorder = CacheRecorder {
            cache: FifoCache::new(self.cache_size),
            stats: CacheMissStats::default(),
        };
        for set in geometry.primitive_sets() {
            if !set.indices_within(vertex_count) {
                log::warn!(
                    "[CacheMiss] skipping {:?} set: index {:?} out of range for {vertex_count} vertices",
                    set.mode(),
                    set.max_index()
                );
                continue;
            }
            set.accept(&mut recorder);
        }
        recorder.stats
    }

    /// Measures one mesh and adds the result to the running totals.
    pub fn record(&self, geometry: &Geometry) -> CacheMissStats {
        let stats = self.measure(geometry);
        *self.totals.lock().unwrap_or_else(PoisonError::into_inner) += stats;
        stats
    }

    /// Running totals since creation or the last reset.
    pub fn totals(&self) -> CacheMissStats {
        *self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ACMR of the running totals.
    pub fn acmr(&self) -> f64 {
        self.totals().acmr()
    }

    /// Clears the running totals.
    pub fn reset(&self) {
        *self.totals.lock().unwrap_or_else(PoisonError::into_inner) = CacheMissStats::default();
    }
}

impl Default for CacheMissLane {
    fn default() -> Self {
        Self::new(DEFAULT_MISS_CACHE_SIZE as usize)
    }
}

impl Lane for CacheMissLane {
    fn strategy_name(&self) -> &'static str {
        "CacheMiss"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Diagnostics
    }

    /// Records the [`Geometry`] in `ctx` and stores its [`CacheMissStats`] there.
    fn execute(&self, ctx: &mut LaneContext) -> Result<(), LaneError> {
        let geometry = ctx
            .get::<Geometry>()
            .ok_or(LaneError::missing("Geometry"))?;
        let stats = self.record(geometry);
        log::trace!(
            "[CacheMiss] {} misses over {} triangles (acmr {:.3})",
            stats.misses,
            stats.triangles,
            stats.acmr()
        );
        ctx.insert(stats);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
