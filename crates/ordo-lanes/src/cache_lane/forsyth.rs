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

//! Greedy triangle ordering for vertex cache reuse (Forsyth's algorithm).
//!
//! Every vertex is scored from its position in a simulated LRU cache and
//! from how many unprocessed triangles still use it. A triangle scores the
//! sum of its vertices. The best triangle is emitted, its vertices move to
//! the front of the cache, and the affected scores are refreshed.
//!
//! While the cache holds anything, only triangles touching cached vertices
//! are candidates, which keeps each step proportional to the cache size.

use super::simulator::LruCache;

/// Capacity of the simulated LRU cache.
pub const MAX_CACHE_SIZE: usize = 32;
/// Exponent of the decay applied to deeper cache positions.
pub const CACHE_DECAY_POWER: f32 = 1.5;
/// Fixed score of the three most recent cache positions.
pub const LAST_TRI_SCORE: f32 = 0.75;
/// Scale of the low-valence bonus.
pub const VALENCE_BOOST_SCALE: f32 = 2.0;
/// Exponent of the low-valence bonus.
pub const VALENCE_BOOST_POWER: f32 = 0.5;

/// Scores a vertex from its cache position and its count of unprocessed triangles.
///
/// A vertex no triangle needs any more scores `-1`.
pub fn vertex_score(cache_position: Option<usize>, active_triangles: usize) -> f32 {
    if active_triangles == 0 {
        return -1.0;
    }
    let mut score = match cache_position {
        None => 0.0,
        // Used by the previous triangle: same score whatever its slot, so the
        // winding of that triangle does not matter.
        Some(position) if position < 3 => LAST_TRI_SCORE,
        Some(position) => {
            debug_assert!(position < MAX_CACHE_SIZE);
            let scaler = 1.0 / (MAX_CACHE_SIZE - 3) as f32;
            (1.0 - (position - 3) as f32 * scaler).powf(CACHE_DECAY_POWER)
        }
    };
    score += VALENCE_BOOST_SCALE * (active_triangles as f32).powf(-VALENCE_BOOST_POWER);
    score
}

#[derive(Debug, Clone, Copy, Default)]
struct VertexState {
    cache_position: Option<usize>,
    score: f32,
    active_triangles: usize,
    /// Start of this vertex's slice in `triangle_store`.
    first_triangle: usize,
}

#[derive(Debug, Clone, Copy)]
struct TriangleState {
    score: f32,
    vertices: [u32; 3],
}

/// Vertex-to-triangle adjacency plus the running scores.
struct Adjacency {
    vertices: Vec<VertexState>,
    triangles: Vec<TriangleState>,
    /// Per-vertex triangle lists, packed back to back. The first
    /// `active_triangles` entries of each slice are the unprocessed ones.
    triangle_store: Vec<u32>,
}

impl Adjacency {
    fn new(triangles: &[[u32; 3]]) -> Self {
        let vertex_count = triangles
            .iter()
            .flatten()
            .map(|&v| v as usize + 1)
            .max()
            .unwrap_or(0);
        let mut vertices = vec![VertexState::default(); vertex_count];
        for &v in triangles.iter().flatten() {
            vertices[v as usize].active_triangles += 1;
        }

        let mut offset = 0;
        for vertex in &mut vertices {
            vertex.first_triangle = offset;
            offset += vertex.active_triangles;
        }

        let mut triangle_store = vec![0u32; offset];
        let mut filled = vec![0usize; vertex_count];
        for (t, tri) in triangles.iter().enumerate() {
            for &v in tri {
                let v = v as usize;
                triangle_store[vertices[v].first_triangle + filled[v]] = t as u32;
                filled[v] += 1;
            }
        }

        for vertex in &mut vertices {
            vertex.score = vertex_score(None, vertex.active_triangles);
        }
        let mut adjacency = Self {
            vertices,
            triangles: triangles
                .iter()
                .map(|&corners| TriangleState {
                    score: 0.0,
                    vertices: corners,
                })
                .collect(),
            triangle_store,
        };
        for t in 0..adjacency.triangles.len() {
            adjacency.triangles[t].score = adjacency.triangle_score(t);
        }
        adjacency
    }

    fn triangle_score(&self, t: usize) -> f32 {
        self.triangles[t]
            .vertices
            .iter()
            .map(|&v| self.vertices[v as usize].score)
            .sum()
    }

    fn rescore_vertex(&mut self, v: u32) {
        let vertex = &mut self.vertices[v as usize];
        vertex.score = vertex_score(vertex.cache_position, vertex.active_triangles);
    }

    /// Refreshes the score of every unprocessed triangle using `v` and
    /// returns the best one, if any scores above zero.
    fn rescore_triangles_of(&mut self, v: u32) -> Option<(usize, f32)> {
        let vertex = self.vertices[v as usize];
        let mut best: Option<(usize, f32)> = None;
        let mut best_score = 0.0;
        for i in vertex.first_triangle..vertex.first_triangle + vertex.active_triangles {
            let t = self.triangle_store[i] as usize;
            let score = self.triangle_score(t);
            self.triangles[t].score = score;
            if score > best_score {
                best_score = score;
                best = Some((t, score));
            }
        }
        best
    }

    /// First triangle with the highest score, scanning the whole mesh.
    fn best_triangle_overall(&self) -> usize {
        let mut best = 0;
        for t in 1..self.triangles.len() {
            if self.triangles[t].score > self.triangles[best].score {
                best = t;
            }
        }
        best
    }

    /// Removes `t` from the active list of `v`, keeping the remaining order.
    fn retire_triangle_from(&mut self, v: u32, t: usize) {
        let vertex = &mut self.vertices[v as usize];
        let start = vertex.first_triangle;
        let active = &mut self.triangle_store[start..start + vertex.active_triangles];
        if let Some(pos) = active.iter().position(|&x| x as usize == t) {
            active[pos..].rotate_left(1);
            vertex.active_triangles -= 1;
        }
    }
}

/// Orders `triangles` for vertex cache reuse and returns the flattened index list.
///
/// Degenerate triangles (two equal corners) are dropped. Each emitted
/// triangle keeps its original winding.
pub fn optimize_triangle_order(triangles: &[[u32; 3]]) -> Vec<u32> {
    let triangles: Vec<[u32; 3]> = triangles
        .iter()
        .copied()
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect();
    let mut adjacency = Adjacency::new(&triangles);
    let mut cache = LruCache::new(MAX_CACHE_SIZE);
    let mut draw_list = Vec::with_capacity(triangles.len() * 3);

    for _ in 0..triangles.len() {
        let mut best: Option<usize> = None;
        let mut best_score = 0.0;
        for &v in cache.entries() {
            if let Some((t, score)) = adjacency.rescore_triangles_of(v) {
                if score > best_score {
                    best_score = score;
                    best = Some(t);
                }
            }
        }
        let t = match best {
            Some(t) => t,
            None => {
                log::trace!("No cached candidate, searching all triangles");
                adjacency.best_triangle_overall()
            }
        };
        debug_assert!(adjacency.triangles[t].score > 0.0);

        adjacency.triangles[t].score = -1.0;
        let added = adjacency.triangles[t].vertices;
        for &v in &added {
            draw_list.push(v);
            adjacency.retire_triangle_from(v, t);
        }

        // Assume the three oldest entries are about to be evicted and score
        // them as uncached now; once evicted they are never rescored.
        if cache.max_size() - cache.len() < 3 {
            let len = cache.len();
            let oldest = [
                cache.entries()[len - 3],
                cache.entries()[len - 2],
                cache.entries()[len - 1],
            ];
            for &v in &oldest {
                adjacency.vertices[v as usize].cache_position = None;
                adjacency.rescore_vertex(v);
            }
            for &v in &oldest {
                adjacency.rescore_triangles_of(v);
            }
        }

        cache.add_entries(&added);
        for (position, &v) in cache.entries().iter().enumerate() {
            adjacency.vertices[v as usize].cache_position = Some(position);
            adjacency.rescore_vertex(v);
        }
    }
    draw_list
}
