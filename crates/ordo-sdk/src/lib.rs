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

//! The public-facing API of the Ordo mesh optimizer.
//!
//! The four free functions run one pass each and report whether the mesh
//! changed. [`MeshOptimizer`] chains the passes selected by an
//! [`OptimizerSettings`], measures cache misses around them and reports into
//! [`OptimizerMetrics`] when attached.
//!
//! ```rust,ignore
//! use ordo_sdk::prelude::*;
//!
//! let optimizer = MeshOptimizer::new(OptimizerSettings {
//!     report_cache_misses: true,
//!     ..Default::default()
//! });
//! let report = optimizer.optimize(&mut geometry);
//! log::info!("ACMR {:?} -> {:?}", report.acmr_before(), report.acmr_after());
//! ```

#![warn(missing_docs)]

pub mod optimizer;
pub mod settings;

use ordo_core::Geometry;
use ordo_lanes::{AccessOrderLane, CacheMissLane, IndexMeshLane, MeshLane, VertexCacheLane};

pub use optimizer::{BatchReport, MeshOptimizer, OptimizationReport};
pub use ordo_lanes::{CacheMissStats, PassOutcome, SkipReason};
pub use ordo_telemetry::OptimizerMetrics;
pub use settings::{load_settings, parse_settings, settings_to_ron};

/// Commonly used types, re-exported for glob import.
pub mod prelude {
    pub use crate::{
        deduplicate_and_index, measure_cache_misses, optimize_vertex_access_order,
        optimize_vertex_cache, BatchReport, CacheMissStats, MeshOptimizer, OptimizationReport,
        OptimizerMetrics,
    };
    pub use ordo_core::math::{Vec2, Vec3, Vec4};
    pub use ordo_core::{
        Binding, Channel, Geometry, IndexBuffer, OptimizerSettings, PrimitiveMode, PrimitiveSet,
        VertexArray,
    };
}

/// Merges identical vertices and converts the mesh's surface primitives into
/// a single indexed triangle list.
///
/// Returns `false`, leaving the mesh untouched, when the mesh has line or
/// point primitives, is already fully indexed, has fewer than three
/// vertices, or binds normals or colors coarser than per vertex.
pub fn deduplicate_and_index(geometry: &mut Geometry) -> bool {
    IndexMeshLane::new().apply(geometry).is_ok()
}

/// Reorders the mesh's indexed triangles for post-transform cache reuse.
///
/// Returns `false`, leaving the mesh untouched, for meshes of 16 vertices or
/// fewer and meshes with unindexed or non-surface primitives.
pub fn optimize_vertex_cache(geometry: &mut Geometry) -> bool {
    VertexCacheLane::new().apply(geometry).is_ok()
}

/// Replays the mesh's triangles through a FIFO cache of `cache_size` entries
/// and counts the misses. The mesh is not modified.
pub fn measure_cache_misses(geometry: &Geometry, cache_size: usize) -> CacheMissStats {
    CacheMissLane::new(cache_size).measure(geometry)
}

/// Renumbers the mesh's vertices in the order its primitives first use them,
/// dropping unreferenced vertices.
///
/// Returns `false`, leaving the mesh untouched, when a primitive set is not
/// indexed or the mesh has no vertices.
pub fn optimize_vertex_access_order(geometry: &mut Geometry) -> bool {
    AccessOrderLane::new().apply(geometry).is_ok()
}
