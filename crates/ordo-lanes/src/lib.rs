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

//! # Ordo Lanes
//!
//! The mesh optimization passes, each packaged as a [`Lane`](ordo_core::lane::Lane):
//!
//! - [`IndexMeshLane`] merges identical vertices and converts every surface
//!   primitive set into one indexed triangle list.
//! - [`VertexCacheLane`] reorders triangles for post-transform cache reuse.
//! - [`AccessOrderLane`] renumbers vertices in the order they are first used.
//! - [`CacheMissLane`] replays index streams through a FIFO cache and counts misses.
//!
//! Every mutating pass either rewrites the mesh completely or leaves it
//! untouched, reporting the reason as a [`SkipReason`].

#![warn(missing_docs)]

pub mod cache_lane;
pub mod index_lane;
pub mod order_lane;
pub mod pass;

pub use cache_lane::{
    optimize_triangle_order, CacheMissLane, CacheMissStats, FifoCache, LruCache, VertexCacheLane,
};
pub use index_lane::IndexMeshLane;
pub use order_lane::{AccessOrderLane, SharedArrayOptimizer};
pub use pass::{MeshLane, PassOutcome, PassResult, PassStats, SkipReason};
