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

//! Post-transform vertex cache: simulation, triangle ordering and miss measurement.

mod cache_miss_lane;
mod forsyth;
mod simulator;
mod vertex_cache_lane;

pub use cache_miss_lane::{CacheMissLane, CacheMissStats};
pub use forsyth::{
    optimize_triangle_order, vertex_score, CACHE_DECAY_POWER, LAST_TRI_SCORE, MAX_CACHE_SIZE,
    VALENCE_BOOST_POWER, VALENCE_BOOST_SCALE,
};
pub use simulator::{FifoCache, LruCache};
pub use vertex_cache_lane::{VertexCacheLane, MIN_OPTIMIZED_VERTEX_COUNT};
