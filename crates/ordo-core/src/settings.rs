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

//! Runtime configuration of the mesh optimizer pipeline.

use serde::{Deserialize, Serialize};

/// FIFO size used for miss measurement when none is configured.
pub const DEFAULT_MISS_CACHE_SIZE: u32 = 16;

/// Selects which optimization passes run and how results are measured.
///
/// Enabled passes always run in the order index, vertex cache, access order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Deduplicate vertices and convert every primitive set to indexed triangles.
    pub index_mesh: bool,
    /// Reorder triangles for post-transform vertex cache reuse.
    pub optimize_vertex_cache: bool,
    /// Renumber vertices in first-use order.
    pub optimize_vertex_order: bool,
    /// Measure FIFO cache misses before and after the passes.
    pub report_cache_misses: bool,
    /// FIFO size used for miss measurement. Sizes below one triangle are
    /// raised to 3 with a warning.
    pub miss_cache_size: u32,
}

impl OptimizerSettings {
    /// Returns `true` if at least one mutating pass is enabled.
    pub fn any_pass_enabled(&self) -> bool {
        self.index_mesh || self.optimize_vertex_cache || self.optimize_vertex_order
    }
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            index_mesh: true,
            optimize_vertex_cache: true,
            optimize_vertex_order: true,
            report_cache_misses: false,
            miss_cache_size: DEFAULT_MISS_CACHE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_every_pass() {
        let settings = OptimizerSettings::default();
        assert!(settings.any_pass_enabled());
        assert!(!settings.report_cache_misses);
        assert_eq!(settings.miss_cache_size, DEFAULT_MISS_CACHE_SIZE);
    }

    #[test]
    fn test_all_passes_disabled() {
        let settings = OptimizerSettings {
            index_mesh: false,
            optimize_vertex_cache: false,
            optimize_vertex_order: false,
            ..Default::default()
        };
        assert!(!settings.any_pass_enabled());
    }
}
