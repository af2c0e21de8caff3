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

//! The lane that reorders triangles for vertex cache reuse.

use std::any::Any;

use ordo_core::lane::{Lane, LaneContext, LaneError, LaneKind};
use ordo_core::mesh::{Geometry, IndexBuffer, PrimitiveMode, PrimitiveSet};

use super::forsyth::optimize_triangle_order;
use crate::pass::{
    check_array_lengths, check_index_range, execute_mesh_lane, require_vertices, MeshLane,
    PassResult, PassStats, SkipReason,
};

/// Meshes with fewer vertices fit in a typical cache and are left alone.
pub const MIN_OPTIMIZED_VERTEX_COUNT: usize = 17;

/// Rewrites the indexed surface primitives of a mesh into a single triangle
/// list ordered for post-transform vertex cache reuse.
///
/// The vertex arrays are not modified.
#[derive(Debug, Default)]
pub struct VertexCacheLane;

impl VertexCacheLane {
    /// Creates a new `VertexCacheLane`.
    pub fn new() -> Self {
        Self
    }
}

impl MeshLane for VertexCacheLane {
    fn optimize(&self, geometry: &mut Geometry) -> PassResult {
        let vertex_count = require_vertices(geometry)?;
        if vertex_count < MIN_OPTIMIZED_VERTEX_COUNT {
            return Err(SkipReason::TooFewVertices {
                count: vertex_count,
                required: MIN_OPTIMIZED_VERTEX_COUNT,
            });
        }
        if geometry.primitive_sets().is_empty() {
            return Err(SkipReason::NoPrimitives);
        }
        for set in geometry.primitive_sets() {
            if !set.mode().is_surface() {
                return Err(SkipReason::UnsupportedTopology(set.mode()));
            }
            if !set.is_indexed() {
                return Err(SkipReason::NotIndexed);
            }
        }
        check_array_lengths(geometry)?;
        check_index_range(geometry)?;

        let mut triangles = Vec::new();
        for set in geometry.primitive_sets() {
            set.for_each_triangle(|a, b, c| triangles.push([a, b, c]));
        }
        let draw_list = optimize_triangle_order(&triangles);
        if draw_list.is_empty() {
            return Err(SkipReason::NoTriangles);
        }

        let triangle_count = draw_list.len() / 3;
        geometry.set_primitive_sets(vec![PrimitiveSet::elements(
            PrimitiveMode::Triangles,
            IndexBuffer::for_vertex_count(draw_list, vertex_count),
        )]);
        Ok(PassStats {
            vertices_before: vertex_count,
            vertices_after: vertex_count,
            triangles: triangle_count,
        })
    }
}

impl Lane for VertexCacheLane {
    fn strategy_name(&self) -> &'static str {
        "VertexCache"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::CacheOrdering
    }

    fn estimate_cost(&self, ctx: &LaneContext) -> f32 {
        ctx.get::<Geometry>().map_or(0.0, |g| {
            g.primitive_sets()
                .iter()
                .map(|p| p.index_count())
                .sum::<usize>() as f32
                / 3.0
        })
    }

    fn execute(&self, ctx: &mut LaneContext) -> Result<(), LaneError> {
        execute_mesh_lane(self, ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordo_core::math::Vec3;
    use ordo_core::mesh::Channel;

    fn grid_strip(vertex_count: usize) -> Geometry {
        let positions: Vec<Vec3> = (0..vertex_count)
            .map(|i| Vec3::new((i / 2) as f32, (i % 2) as f32, 0.0))
            .collect();
        let indices: Vec<u16> = (0..vertex_count as u16).collect();
        Geometry::new()
            .with_array(Channel::Position, positions)
            .with_primitive_set(PrimitiveSet::elements(PrimitiveMode::TriangleStrip, indices))
    }

    #[test]
    fn test_threshold_boundary() {
        // --- 1. ARRANGE ---
        let lane = VertexCacheLane::new();
        let mut small = grid_strip(16);
        let mut large = grid_strip(17);

        // --- 2. ACT ---
        let small_result = lane.apply(&mut small);
        let large_result = lane.apply(&mut large);

        // --- 3. ASSERT ---
        assert_eq!(
            small_result,
            Err(SkipReason::TooFewVertices {
                count: 16,
                required: 17
            })
        );
        assert_eq!(small.primitive_sets()[0].mode(), PrimitiveMode::TriangleStrip);

        let stats = large_result.expect("A 17-vertex strip must be optimized");
        assert_eq!(stats.triangles, 15);
        assert_eq!(large.primitive_sets().len(), 1);
        assert_eq!(large.primitive_sets()[0].mode(), PrimitiveMode::Triangles);
        assert_eq!(large.primitive_sets()[0].indices().map(|i| i.width_bits()), Some(16));
    }

    #[test]
    fn test_rejects_unindexed_and_lines() {
        let lane = VertexCacheLane::new();

        let mut arrays = grid_strip(20);
        arrays.set_primitive_sets(vec![PrimitiveSet::DrawArrays {
            mode: PrimitiveMode::Triangles,
            first: 0,
            count: 18,
        }]);
        assert_eq!(lane.apply(&mut arrays), Err(SkipReason::NotIndexed));

        let mut lines = grid_strip(20);
        lines
            .primitive_sets_mut()
            .push(PrimitiveSet::elements(PrimitiveMode::Lines, vec![0u16, 1]));
        assert_eq!(
            lane.apply(&mut lines),
            Err(SkipReason::UnsupportedTopology(PrimitiveMode::Lines))
        );
        assert_eq!(lines.primitive_sets().len(), 2, "A skipped mesh must be untouched");
    }

    #[test]
    fn test_all_degenerate_is_noop() {
        let lane = VertexCacheLane::new();
        let mut geometry = grid_strip(20);
        geometry.set_primitive_sets(vec![PrimitiveSet::triangles(vec![0u16, 0, 1, 2, 2, 2])]);
        assert_eq!(lane.apply(&mut geometry), Err(SkipReason::NoTriangles));
    }

    #[test]
    fn test_execute_through_context() {
        let lane = VertexCacheLane::new();
        let mut ctx = LaneContext::new();
        assert!(lane.execute(&mut ctx).is_err(), "No geometry in context");

        ctx.insert(grid_strip(24));
        assert!(lane.estimate_cost(&ctx) > 0.0);
        lane.execute(&mut ctx).unwrap();

        let outcome = ctx.get::<crate::PassOutcome>().unwrap();
        assert_eq!(outcome.pass, "VertexCache");
        assert!(outcome.applied());
    }
}
