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

//! Loading [`OptimizerSettings`] from RON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ordo_core::OptimizerSettings;

/// Parses settings from RON text. Missing fields take their default value.
///
/// ```ron
/// (
///   optimize_vertex_order: false,
///   report_cache_misses: true,
///   miss_cache_size: 24,
/// )
/// ```
pub fn parse_settings(text: &str) -> Result<OptimizerSettings> {
    ron::from_str(text).context("Failed to parse optimizer settings")
}

/// Reads and parses a RON settings file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<OptimizerSettings> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings = parse_settings(&text)
        .with_context(|| format!("Invalid settings file {}", path.display()))?;
    log::debug!("Loaded optimizer settings from {}", path.display());
    Ok(settings)
}

/// Serializes settings to pretty-printed RON.
pub fn settings_to_ron(settings: &OptimizerSettings) -> Result<String> {
    let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
    ron::ser::to_string_pretty(settings, pretty_config).context("Failed to serialize settings")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings = parse_settings("(optimize_vertex_order: false, miss_cache_size: 24)").unwrap();

        assert!(settings.index_mesh);
        assert!(settings.optimize_vertex_cache);
        assert!(!settings.optimize_vertex_order);
        assert_eq!(settings.miss_cache_size, 24);
    }

    #[test]
    fn test_empty_struct_is_default() {
        assert_eq!(parse_settings("()").unwrap(), OptimizerSettings::default());
    }

    #[test]
    fn test_serialized_settings_parse_back() {
        let settings = OptimizerSettings {
            report_cache_misses: true,
            ..Default::default()
        };
        let text = settings_to_ron(&settings).unwrap();
        assert!(text.contains("report_cache_misses: true"), "{text}");
        assert_eq!(parse_settings(&text).unwrap(), settings);
    }

    #[test]
    fn test_invalid_input_reports_context() {
        let err = parse_settings("(miss_cache_size: \"big\")").unwrap_err();
        assert!(err.to_string().contains("optimizer settings"), "{err:#}");
    }

    #[test]
    fn test_load_settings_from_file() {
        // --- 1. ARRANGE ---
        let path = std::env::temp_dir().join(format!("ordo-settings-{}.ron", std::process::id()));
        fs::write(&path, "(index_mesh: false)").unwrap();

        // --- 2. ACT ---
        let loaded = load_settings(&path);
        let missing = load_settings(path.with_extension("missing"));
        let _ = fs::remove_file(&path);

        // --- 3. ASSERT ---
        assert!(!loaded.unwrap().index_mesh);
        assert!(missing.is_err());
    }
}
