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

use ordo_core::math::Vec3;
use ordo_core::mesh::{Channel, Geometry, PrimitiveSet};
use ordo_lanes::{CacheMissLane, MeshLane, VertexCacheLane};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const VERTICES: u32 = 10_000;
const TRIANGLES: usize = 20_000;

fn mesh(indices: Vec<u32>) -> Geometry {
    Geometry::new()
        .with_array(Channel::Position, vec![Vec3::ZERO; VERTICES as usize])
        .with_primitive_set(PrimitiveSet::triangles(indices))
}

/// Random triangles over a sliding window of vertices, so that the mesh has
/// locality an optimizer can exploit, then shuffled to destroy it.
fn shuffled_triangles(rng: &mut StdRng) -> Vec<[u32; 3]> {
    let mut triangles = Vec::with_capacity(TRIANGLES);
    while triangles.len() < TRIANGLES {
        let base = (triangles.len() as u32 / 2).min(VERTICES - 8);
        let t = [0; 3].map(|_| base + rng.gen_range(0..8));
        if t[0] != t[1] && t[1] != t[2] && t[0] != t[2] {
            triangles.push(t);
        }
    }
    triangles.shuffle(rng);
    triangles
}

#[test]
fn test_optimized_order_beats_random_order() {
    // --- 1. ARRANGE ---
    let mut rng = StdRng::seed_from_u64(0x0D0);
    let triangles = shuffled_triangles(&mut rng);
    let shuffled = mesh(triangles.iter().flatten().copied().collect());
    let mut optimized = shuffled.clone();
    let counter = CacheMissLane::new(16);

    // --- 2. ACT ---
    VertexCacheLane::new()
        .apply(&mut optimized)
        .expect("A random mesh must be optimized");
    let before = counter.measure(&shuffled);
    let after = counter.measure(&optimized);

    // --- 3. ASSERT ---
    assert_eq!(before.triangles, TRIANGLES as u64);
    assert_eq!(after.triangles, TRIANGLES as u64);
    assert!(
        after.acmr() <= before.acmr(),
        "Optimized ACMR {:.3} must not exceed shuffled ACMR {:.3}",
        after.acmr(),
        before.acmr()
    );
}

#[test]
fn test_fully_random_connectivity_is_not_worse() {
    // --- 1. ARRANGE ---
    let mut rng = StdRng::seed_from_u64(42);
    let mut indices = Vec::with_capacity(TRIANGLES * 3);
    while indices.len() < TRIANGLES * 3 {
        let t: [u32; 3] = [0; 3].map(|_| rng.gen_range(0..VERTICES));
        if t[0] != t[1] && t[1] != t[2] && t[0] != t[2] {
            indices.extend_from_slice(&t);
        }
    }
    let random = mesh(indices);
    let mut optimized = random.clone();
    let counter = CacheMissLane::new(16);

    // --- 2. ACT ---
    VertexCacheLane::new().apply(&mut optimized).unwrap();

    // --- 3. ASSERT ---
    let before = counter.measure(&random);
    let after = counter.measure(&optimized);
    assert!(
        after.misses <= before.misses,
        "Optimized misses {} exceed random misses {}",
        after.misses,
        before.misses
    );
}
