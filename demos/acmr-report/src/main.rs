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

//! Optimizes a batch of generated meshes and logs the cache miss ratio
//! before and after, followed by a JSON snapshot of the collected metrics.
//!
//! ```text
//! acmr-report [settings.ron] [seed]
//! ```

use anyhow::{Context, Result};
use ordo_sdk::prelude::*;
use ordo_sdk::{load_settings, settings_to_ron};
use ordo_telemetry::{init_logging, MetricsRegistry};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const DEFAULT_SEED: u64 = 0x0dd0;

/// A terrain-like grid drawn as unindexed triangles in random order, the way
/// a naive exporter writes it.
fn scrambled_terrain(rng: &mut StdRng, side: u32) -> Geometry {
    let mut cells: Vec<(u32, u32)> = (0..side)
        .flat_map(|y| (0..side).map(move |x| (x, y)))
        .collect();
    cells.shuffle(rng);

    let height = |x: u32, y: u32| ((x * 7 + y * 13) % 5) as f32 * 0.25;
    let mut positions = Vec::with_capacity(cells.len() * 6);
    let mut uvs = Vec::with_capacity(cells.len() * 6);
    for (x, y) in cells {
        for (dx, dy) in [(0, 0), (1, 0), (1, 1), (0, 0), (1, 1), (0, 1)] {
            let (vx, vy) = (x + dx, y + dy);
            positions.push(Vec3::new(vx as f32, vy as f32, height(vx, vy)));
            uvs.push(Vec2::new(vx as f32 / side as f32, vy as f32 / side as f32));
        }
    }
    let count = positions.len() as u32;
    Geometry::new()
        .with_array(Channel::Position, positions)
        .with_array(Channel::TexCoord(0), uvs)
        .with_primitive_set(PrimitiveSet::DrawArrays {
            mode: PrimitiveMode::Triangles,
            first: 0,
            count,
        })
}

/// An indexed mesh with random connectivity, the worst case for any cache.
fn random_soup(rng: &mut StdRng, vertices: u32, triangles: usize) -> Geometry {
    let positions: Vec<Vec3> = (0..vertices)
        .map(|_| Vec3::new(rng.gen(), rng.gen(), rng.gen()))
        .collect();
    let mut indices = Vec::with_capacity(triangles * 3);
    while indices.len() < triangles * 3 {
        let t: [u32; 3] = [0; 3].map(|_| rng.gen_range(0..vertices));
        if t[0] != t[1] && t[1] != t[2] && t[0] != t[2] {
            indices.extend_from_slice(&t);
        }
    }
    Geometry::new()
        .with_array(Channel::Position, positions)
        .with_primitive_set(PrimitiveSet::triangles(indices))
}

fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let mut settings = match args.next() {
        Some(path) => load_settings(&path)?,
        None => OptimizerSettings::default(),
    };
    settings.report_cache_misses = true;
    let seed = match args.next() {
        Some(seed) => seed.parse().with_context(|| format!("Invalid seed '{seed}'"))?,
        None => DEFAULT_SEED,
    };
    log::debug!("Settings:\n{}", settings_to_ron(&settings)?);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut meshes: Vec<Geometry> = [8, 32, 64]
        .into_iter()
        .map(|side| scrambled_terrain(&mut rng, side))
        .collect();
    meshes.push(random_soup(&mut rng, 2_000, 4_000));

    let metrics = OptimizerMetrics::new(MetricsRegistry::new())?;
    let optimizer = MeshOptimizer::new(settings).with_metrics(metrics.clone());
    let batch = optimizer.optimize_batch(&mut meshes);

    for (i, (report, mesh)) in batch.meshes.iter().zip(&meshes).enumerate() {
        log::info!(
            "mesh {i}: {} vertices, ACMR {:.3} -> {:.3}",
            mesh.vertex_count(),
            report.acmr_before().unwrap_or_default(),
            report.acmr_after().unwrap_or_default()
        );
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(stats) => log::info!(
                    "  {:<12} applied, {} triangles",
                    outcome.pass,
                    stats.triangles
                ),
                Err(reason) => log::info!("  {:<12} skipped: {reason}", outcome.pass),
            }
        }
    }
    log::info!(
        "batch ACMR {:.3} -> {:.3}",
        batch.acmr_before(),
        batch.acmr_after()
    );
    log::info!("metrics:\n{}", metrics.registry().snapshot_json()?);
    Ok(())
}
