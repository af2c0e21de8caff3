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

//! Outcome types and shared preconditions of the mesh passes.

use ordo_core::lane::{Lane, LaneContext, LaneError};
use ordo_core::mesh::{Channel, Geometry, PrimitiveMode};

/// Why a pass left a mesh untouched.
///
/// Skipping is not a failure: the mesh is still valid, the pass simply does
/// not apply to it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// The geometry has no position array, or it is empty.
    #[error("geometry has no vertices")]
    MissingVertices,
    /// The geometry is below the pass's vertex-count threshold.
    #[error("mesh has {count} vertices, at least {required} required")]
    TooFewVertices {
        /// Vertices in the mesh.
        count: usize,
        /// Minimum vertex count the pass works on.
        required: usize,
    },
    /// A primitive set uses a topology the pass cannot handle.
    #[error("primitive mode {0:?} is not supported by this pass")]
    UnsupportedTopology(PrimitiveMode),
    /// A primitive set has no explicit index buffer.
    #[error("primitive set without an index buffer")]
    NotIndexed,
    /// Every primitive set is already indexed.
    #[error("every primitive set is already indexed")]
    NothingToIndex,
    /// A channel that takes part in vertex comparison is not bound per vertex.
    #[error("{0:?} array is not bound per vertex")]
    CoarseBinding(Channel),
    /// A per-vertex array does not match the position array's length.
    #[error("{channel:?} array holds {found} elements, expected {expected}")]
    ArrayLengthMismatch {
        /// The offending channel.
        channel: Channel,
        /// The position array's length.
        expected: usize,
        /// The channel's length.
        found: usize,
    },
    /// A primitive set references a vertex that does not exist.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The largest index found.
        index: u32,
        /// Vertices in the mesh.
        vertex_count: usize,
    },
    /// The primitive sets produce no non-degenerate triangle.
    #[error("mesh has no non-degenerate triangles")]
    NoTriangles,
    /// The geometry has no primitive sets.
    #[error("mesh has no primitive sets")]
    NoPrimitives,
}

/// Summary of an applied pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassStats {
    /// Vertex count before the pass.
    pub vertices_before: usize,
    /// Vertex count after the pass.
    pub vertices_after: usize,
    /// Triangles in the rewritten primitive sets.
    pub triangles: usize,
}

/// `Ok` when the pass rewrote the mesh, `Err` when it left it untouched.
pub type PassResult = Result<PassStats, SkipReason>;

/// The result of the last mesh pass run through a [`LaneContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    /// Strategy name of the lane that produced this outcome.
    pub pass: &'static str,
    /// What the pass did.
    pub result: PassResult,
}

impl PassOutcome {
    /// Returns `true` if the pass modified the mesh.
    pub fn applied(&self) -> bool {
        self.result.is_ok()
    }
}

/// A lane that rewrites one [`Geometry`] at a time.
pub trait MeshLane: Lane {
    /// Runs the pass. Implementations must leave `geometry` untouched when
    /// returning `Err`.
    fn optimize(&self, geometry: &mut Geometry) -> PassResult;

    /// Runs the pass and logs what happened.
    fn apply(&self, geometry: &mut Geometry) -> PassResult {
        let result = self.optimize(geometry);
        match &result {
            Ok(stats) => log::debug!(
                "[{}] applied: {} -> {} vertices, {} triangles",
                self.strategy_name(),
                stats.vertices_before,
                stats.vertices_after,
                stats.triangles
            ),
            Err(reason) => log::debug!("[{}] skipped: {reason}", self.strategy_name()),
        }
        result
    }
}

/// Shared `Lane::execute` body: runs `lane` on the [`Geometry`] stored in
/// `ctx` and records a [`PassOutcome`] next to it.
pub fn execute_mesh_lane<L: MeshLane + ?Sized>(
    lane: &L,
    ctx: &mut LaneContext,
) -> Result<(), LaneError> {
    let geometry = ctx
        .get_mut::<Geometry>()
        .ok_or(LaneError::missing("Geometry"))?;
    let result = lane.apply(geometry);
    ctx.insert(PassOutcome {
        pass: lane.strategy_name(),
        result,
    });
    Ok(())
}

/// Returns the vertex count, or [`SkipReason::MissingVertices`].
pub(crate) fn require_vertices(geometry: &Geometry) -> Result<usize, SkipReason> {
    match geometry.vertex_count() {
        0 => Err(SkipReason::MissingVertices),
        count => Ok(count),
    }
}

/// Checks that every per-vertex array matches the position array's length.
pub(crate) fn check_array_lengths(geometry: &Geometry) -> Result<(), SkipReason> {
    let expected = geometry.vertex_count();
    for channel in geometry.per_vertex_channels() {
        let found = geometry.array(channel).map_or(0, |a| a.len());
        if found != expected {
            return Err(SkipReason::ArrayLengthMismatch {
                channel,
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Checks that every primitive set only references existing vertices.
pub(crate) fn check_index_range(geometry: &Geometry) -> Result<(), SkipReason> {
    let vertex_count = geometry.vertex_count();
    for set in geometry.primitive_sets() {
        if let Some(index) = set.max_index() {
            if index as usize >= vertex_count {
                return Err(SkipReason::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordo_core::math::Vec3;
    use ordo_core::mesh::PrimitiveSet;

    #[test]
    fn test_skip_reason_messages() {
        assert_eq!(
            SkipReason::TooFewVertices {
                count: 16,
                required: 17
            }
            .to_string(),
            "mesh has 16 vertices, at least 17 required"
        );
        assert_eq!(
            SkipReason::CoarseBinding(Channel::Color).to_string(),
            "Color array is not bound per vertex"
        );
    }

    #[test]
    fn test_shared_preconditions() {
        let empty = Geometry::new();
        assert_eq!(require_vertices(&empty), Err(SkipReason::MissingVertices));

        let geometry = Geometry::new()
            .with_array(Channel::Position, vec![Vec3::ZERO; 3])
            .with_array(Channel::Normal, vec![Vec3::Z; 2])
            .with_primitive_set(PrimitiveSet::triangles(vec![0u16, 1, 3]));

        assert_eq!(require_vertices(&geometry), Ok(3));
        assert_eq!(
            check_array_lengths(&geometry),
            Err(SkipReason::ArrayLengthMismatch {
                channel: Channel::Normal,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            check_index_range(&geometry),
            Err(SkipReason::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
    }
}
