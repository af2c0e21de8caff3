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

//! Detection of vertices whose attributes are identical across every channel.

use std::cmp::Ordering;

use ordo_core::mesh::{VertexArray, INVALID_INDEX};

/// How the vertices of a mesh collapse onto their unique representatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeldMap {
    /// For each original vertex, its slot in the compacted arrays.
    pub remap: Vec<u32>,
    /// For each compacted slot, the original vertex copied into it.
    pub sources: Vec<u32>,
}

impl WeldMap {
    /// Groups the `vertex_count` vertices described by `arrays` into runs of
    /// identical vertices.
    ///
    /// Two vertices are identical when every array compares equal at their
    /// positions. Each run is represented by its lowest original index, and
    /// the representatives keep their original relative order in the
    /// compacted numbering.
    ///
    /// Every array must hold at least `vertex_count` elements.
    pub fn build(arrays: &[&VertexArray], vertex_count: usize) -> Self {
        let compare = |lhs: u32, rhs: u32| {
            arrays
                .iter()
                .map(|a| a.compare(lhs as usize, rhs as usize))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        };

        let mut order: Vec<u32> = (0..vertex_count as u32).collect();
        // Stable, so the first vertex of every run is its lowest index.
        order.sort_by(|&a, &b| compare(a, b));

        let mut representative = vec![INVALID_INDEX; vertex_count];
        let mut run_start = 0;
        for (i, &vertex) in order.iter().enumerate() {
            if compare(order[run_start], vertex).is_ne() {
                run_start = i;
            }
            representative[vertex as usize] = order[run_start];
        }

        let mut remap = vec![INVALID_INDEX; vertex_count];
        let mut sources = Vec::new();
        for vertex in 0..vertex_count {
            if representative[vertex] as usize == vertex {
                remap[vertex] = sources.len() as u32;
                sources.push(vertex as u32);
            }
        }
        for vertex in 0..vertex_count {
            let rep = representative[vertex] as usize;
            if rep != vertex {
                remap[vertex] = remap[rep];
            }
        }

        Self { remap, sources }
    }

    /// Number of unique vertices.
    pub fn unique_count(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if at least two vertices were merged.
    pub fn has_duplicates(&self) -> bool {
        self.sources.len() < self.remap.len()
    }
}
