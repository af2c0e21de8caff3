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

//! The lane that welds duplicate vertices and indexes surface primitives.

use std::any::Any;
use std::sync::Arc;

use ordo_core::lane::{Lane, LaneContext, LaneError, LaneKind};
use ordo_core::mesh::{ArrayData, Geometry, IndexBuffer, PrimitiveMode, PrimitiveSet};

use super::vertex_welder::WeldMap;
use crate::pass::{
    check_array_lengths, check_index_range, execute_mesh_lane, require_vertices, MeshLane,
    PassResult, PassStats, SkipReason,
};

/// Meshes with fewer vertices cannot hold a triangle and are left alone.
pub const MIN_INDEXED_VERTEX_COUNT: usize = 3;

/// Converts the surface primitives of a mesh into one indexed triangle list
/// over a compacted set of unique vertices.
///
/// The pass runs only when at least one primitive set is not yet indexed and
/// every set is a surface topology. Degenerate triangles produced by merging
/// vertices are dropped. Attribute arrays are rebuilt rather than edited, so
/// arrays shared with other geometries keep their contents.
#[derive(Debug, Default)]
pub struct IndexMeshLane;

impl IndexMeshLane {
    /// Creates a new `IndexMeshLane`.
    pub fn new() -> Self {
        Self
    }

    fn check(&self, geometry: &Geometry) -> Result<usize, SkipReason> {
        for channel in geometry.channels() {
            let coarse = geometry
                .array(channel)
                .is_some_and(|array| !array.is_per_vertex());
            if coarse && channel.is_binding_sensitive() {
                return Err(SkipReason::CoarseBinding(channel));
            }
        }

        let vertex_count = require_vertices(geometry)?;
        if vertex_count < MIN_INDEXED_VERTEX_COUNT {
            return Err(SkipReason::TooFewVertices {
                count: vertex_count,
                required: MIN_INDEXED_VERTEX_COUNT,
            });
        }

        let mut unindexed = 0;
        for set in geometry.primitive_sets() {
            if !set.mode().is_surface() {
                return Err(SkipReason::UnsupportedTopology(set.mode()));
            }
            if !set.is_indexed() {
                unindexed += 1;
            }
        }
        if unindexed == 0 {
            return Err(SkipReason::NothingToIndex);
        }

        check_array_lengths(geometry)?;
        check_index_range(geometry)?;
        Ok(vertex_count)
    }
}

impl MeshLane for IndexMeshLane {
    fn optimize(&self, geometry: &mut Geometry) -> PassResult {
        let vertex_count = self.check(geometry)?;
        let channels = geometry.per_vertex_channels();

        let weld = {
            let arrays: Vec<_> = channels
                .iter()
                .filter_map(|&c| geometry.array(c))
                .map(|array| &array.values)
                .collect();
            WeldMap::build(&arrays, vertex_count)
        };

        let mut indices = Vec::new();
        for set in geometry.primitive_sets() {
            set.for_each_triangle(|a, b, c| {
                let [a, b, c] = [a, b, c].map(|v| weld.remap[v as usize]);
                if a != b && b != c && a != c {
                    indices.extend_from_slice(&[a, b, c]);
                }
            });
        }
        if indices.is_empty() {
            return Err(SkipReason::NoTriangles);
        }

        let unique_count = weld.unique_count();
        if weld.has_duplicates() {
            for channel in channels {
                let compacted = geometry.array(channel).map(|array| ArrayData {
                    values: array.values.gather(&weld.sources),
                    binding: array.binding,
                });
                if let Some(compacted) = compacted {
                    geometry.set_array(channel, Some(Arc::new(compacted)));
                }
            }
        }

        let triangle_count = indices.len() / 3;
        geometry.set_primitive_sets(vec![PrimitiveSet::elements(
            PrimitiveMode::Triangles,
            IndexBuffer::for_vertex_count(indices, unique_count),
        )]);
        log::trace!(
            "[IndexMesh] welded {vertex_count} vertices into {unique_count}, {triangle_count} triangles"
        );
        Ok(PassStats {
            vertices_before: vertex_count,
            vertices_after: unique_count,
            triangles: triangle_count,
        })
    }
}

impl Lane for IndexMeshLane {
    fn strategy_name(&self) -> &'static str {
        "IndexMesh"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Indexing
    }

    fn estimate_cost(&self, ctx: &LaneContext) -> f32 {
        ctx.get::<Geometry>().map_or(0.0, |g| {
            let n = g.vertex_count().max(1) as f32;
            n * n.log2().max(1.0)
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
    use ordo_core::math::{Vec2, Vec3, Vec4};
    use ordo_core::mesh::{Binding, Channel, VertexArray};

    fn fan_with_duplicate() -> Geometry {
        Geometry::new()
            .with_array(
                Channel::Position,
                vec![Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Y],
            )
            .with_primitive_set(PrimitiveSet::DrawArrays {
                mode: PrimitiveMode::TriangleFan,
                first: 0,
                count: 4,
            })
    }

    fn positions(geometry: &Geometry) -> Vec<Vec3> {
        match geometry.array(Channel::Position).map(|a| &a.values) {
            Some(VertexArray::Vec3(v)) => v.clone(),
            other => panic!("Unexpected position array: {other:?}"),
        }
    }

    fn indices(geometry: &Geometry) -> Vec<u32> {
        geometry.primitive_sets()[0]
            .indices()
            .map(|i| i.iter().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_duplicate_collapses_to_lowest_index() {
        // --- 1. ARRANGE ---
        let lane = IndexMeshLane::new();
        let mut geometry = fan_with_duplicate();

        // --- 2. ACT ---
        let stats = lane.apply(&mut geometry).expect("The fan must be indexed");

        // --- 3. ASSERT ---
        assert_eq!(stats.vertices_before, 4);
        assert_eq!(stats.vertices_after, 3);
        assert_eq!(positions(&geometry), vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(
            indices(&geometry),
            vec![0, 1, 2],
            "The (0,1,2) triangle collapses and is dropped, (0,2,3) becomes (0,1,2)"
        );
        assert_eq!(geometry.primitive_sets().len(), 1);
        assert_eq!(geometry.primitive_sets()[0].mode(), PrimitiveMode::Triangles);
        assert_eq!(
            geometry.primitive_sets()[0].indices().map(|i| i.width_bits()),
            Some(16)
        );
    }

    #[test]
    fn test_mixed_sets_become_one_list() {
        let lane = IndexMeshLane::new();
        let mut geometry = Geometry::new()
            .with_array(Channel::Position, vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE])
            .with_array(Channel::TexCoord(0), vec![Vec2::ZERO, Vec2::ONE, Vec2::ZERO, Vec2::ONE])
            .with_primitive_set(PrimitiveSet::triangles(vec![0u8, 1, 2]))
            .with_primitive_set(PrimitiveSet::DrawArrayLengths {
                mode: PrimitiveMode::Triangles,
                first: 1,
                lengths: vec![3],
            });

        let stats = lane.apply(&mut geometry).unwrap();

        assert_eq!(stats.vertices_after, 4, "Distinct vertices are all kept");
        assert_eq!(stats.triangles, 2);
        assert_eq!(indices(&geometry), vec![0, 1, 2, 1, 2, 3]);
    }

    #[test]
    fn test_other_channels_keep_vertices_apart() {
        let lane = IndexMeshLane::new();
        let mut geometry = fan_with_duplicate()
            .with_array(Channel::Normal, vec![Vec3::Z, Vec3::Z, Vec3::Y, Vec3::Z])
            .with_array(Channel::VertexAttrib(2), vec![1.0f32, 2.0, 2.0, 3.0]);

        let stats = lane.apply(&mut geometry).unwrap();

        assert_eq!(stats.vertices_after, 4);
        assert_eq!(stats.triangles, 2);
    }

    #[test]
    fn test_preconditions_leave_mesh_untouched() {
        let lane = IndexMeshLane::new();

        let mut coarse = fan_with_duplicate().with_bound_array(
            Channel::Color,
            vec![Vec4::ONE],
            Binding::Overall,
        );
        assert_eq!(
            lane.apply(&mut coarse),
            Err(SkipReason::CoarseBinding(Channel::Color))
        );
        assert_eq!(positions(&coarse).len(), 4);

        let mut lines = fan_with_duplicate()
            .with_primitive_set(PrimitiveSet::elements(PrimitiveMode::Lines, vec![0u16, 1]));
        assert_eq!(
            lane.apply(&mut lines),
            Err(SkipReason::UnsupportedTopology(PrimitiveMode::Lines))
        );

        let mut indexed = Geometry::new()
            .with_array(Channel::Position, vec![Vec3::ZERO, Vec3::X, Vec3::X])
            .with_primitive_set(PrimitiveSet::triangles(vec![0u16, 1, 2]));
        assert_eq!(lane.apply(&mut indexed), Err(SkipReason::NothingToIndex));

        let mut tiny = Geometry::new()
            .with_array(Channel::Position, vec![Vec3::ZERO, Vec3::X])
            .with_primitive_set(PrimitiveSet::DrawArrays {
                mode: PrimitiveMode::Triangles,
                first: 0,
                count: 2,
            });
        assert_eq!(
            lane.apply(&mut tiny),
            Err(SkipReason::TooFewVertices {
                count: 2,
                required: 3
            })
        );
    }

    #[test]
    fn test_overall_texcoords_are_kept() {
        let lane = IndexMeshLane::new();
        let mut geometry = fan_with_duplicate().with_bound_array(
            Channel::TexCoord(0),
            vec![Vec2::ONE],
            Binding::Overall,
        );

        lane.apply(&mut geometry).unwrap();

        let texcoords = geometry.array(Channel::TexCoord(0)).unwrap();
        assert_eq!(texcoords.len(), 1);
        assert_eq!(texcoords.binding, Binding::Overall);
    }

    #[test]
    fn test_shared_arrays_are_not_modified() {
        // --- 1. ARRANGE ---
        let lane = IndexMeshLane::new();
        let original = fan_with_duplicate();
        let mut copy = original.clone();

        // --- 2. ACT ---
        lane.apply(&mut copy).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(positions(&original).len(), 4, "The other holder keeps all vertices");
        assert_eq!(positions(&copy).len(), 3);
        assert!(!original.primitive_sets()[0].is_indexed());
    }

    #[test]
    fn test_large_mesh_uses_wide_indices() {
        let count = 70_002u32;
        let positions: Vec<Vec3> = (0..count).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mut geometry = Geometry::new()
            .with_array(Channel::Position, positions)
            .with_primitive_set(PrimitiveSet::DrawArrays {
                mode: PrimitiveMode::Triangles,
                first: 0,
                count,
            });

        let stats = IndexMeshLane::new().apply(&mut geometry).unwrap();

        assert_eq!(stats.vertices_after, count as usize);
        assert_eq!(
            geometry.primitive_sets()[0].indices().map(|i| i.width_bits()),
            Some(32)
        );
    }
}
