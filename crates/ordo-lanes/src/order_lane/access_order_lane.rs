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

//! The lane that renumbers vertices in the order primitives first use them.

use std::any::Any;
use std::sync::Arc;

use ordo_core::lane::{Lane, LaneContext, LaneError, LaneKind};
use ordo_core::mesh::{ArrayData, Geometry, PrimitiveIndexVisitor, PrimitiveSet, INVALID_INDEX};

use super::shared_arrays::SharedArrayOptimizer;
use crate::pass::{
    check_array_lengths, check_index_range, execute_mesh_lane, require_vertices, MeshLane,
    PassResult, PassStats, SkipReason,
};

/// Assigns each vertex the next free slot the first time it is referenced.
struct FirstUseOrder {
    remap: Vec<u32>,
    next: u32,
    triangles: usize,
}

impl FirstUseOrder {
    fn new(vertex_count: usize) -> Self {
        Self {
            remap: vec![INVALID_INDEX; vertex_count],
            next: 0,
            triangles: 0,
        }
    }

    #[inline]
    fn visit(&mut self, vertex: u32) {
        let slot = &mut self.remap[vertex as usize];
        if *slot == INVALID_INDEX {
            *slot = self.next;
            self.next += 1;
        }
    }
}

impl PrimitiveIndexVisitor for FirstUseOrder {
    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.triangles += 1;
        self.visit(a);
        self.visit(b);
        self.visit(c);
    }

    fn line(&mut self, a: u32, b: u32) {
        self.visit(a);
        self.visit(b);
    }

    fn point(&mut self, a: u32) {
        self.visit(a);
    }
}

/// Renumbers the vertices of an indexed mesh so that they appear in the
/// order the primitive sets first reference them, triangles first, then
/// lines, then points.
///
/// Vertices no primitive references are dropped. Texture units aliasing the
/// same array keep sharing it afterwards (see [`SharedArrayOptimizer`]).
#[derive(Debug, Default)]
pub struct AccessOrderLane;

impl AccessOrderLane {
    /// Creates a new `AccessOrderLane`.
    pub fn new() -> Self {
        Self
    }
}

impl MeshLane for AccessOrderLane {
    fn optimize(&self, geometry: &mut Geometry) -> PassResult {
        let vertex_count = require_vertices(geometry)?;
        if geometry.primitive_sets().is_empty() {
            return Err(SkipReason::NoPrimitives);
        }
        if geometry.primitive_sets().iter().any(|set| !set.is_indexed()) {
            return Err(SkipReason::NotIndexed);
        }
        check_array_lengths(geometry)?;
        check_index_range(geometry)?;

        let mut sets = geometry.set_primitive_sets(Vec::new());
        sets.sort_by_key(|set| set.mode().kind());

        let mut order = FirstUseOrder::new(vertex_count);
        for set in &sets {
            set.accept(&mut order);
        }
        // Trailing indices of an incomplete primitive are never visited but
        // still sit in the buffer, so they get a slot after everything else.
        for index in sets.iter().filter_map(PrimitiveSet::indices).flat_map(|i| i.iter()) {
            order.visit(index);
        }
        let FirstUseOrder {
            remap,
            next: used,
            triangles,
        } = order;
        let used = used as usize;

        let mut shared = SharedArrayOptimizer::new();
        shared.find_duplicated_uvs(geometry);
        shared.detach_duplicates(geometry);

        for channel in geometry.per_vertex_channels() {
            let reordered = geometry.array(channel).map(|array| ArrayData {
                values: array.values.scatter(&remap, used),
                binding: array.binding,
            });
            if let Some(reordered) = reordered {
                geometry.set_array(channel, Some(Arc::new(reordered)));
            }
        }

        for set in &mut sets {
            if let PrimitiveSet::DrawElements { indices, .. } = set {
                *indices = indices.remapped(&remap);
            }
        }
        geometry.set_primitive_sets(sets);
        shared.deduplicate_uvs(geometry);

        log::trace!("[AccessOrder] kept {used} of {vertex_count} vertices");
        Ok(PassStats {
            vertices_before: vertex_count,
            vertices_after: used,
            triangles,
        })
    }
}

impl Lane for AccessOrderLane {
    fn strategy_name(&self) -> &'static str {
        "AccessOrder"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::AccessOrdering
    }

    fn estimate_cost(&self, ctx: &LaneContext) -> f32 {
        ctx.get::<Geometry>().map_or(0.0, |g| {
            let indices: usize = g.primitive_sets().iter().map(|p| p.index_count()).sum();
            (indices + g.vertex_count()) as f32
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
