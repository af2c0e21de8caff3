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

use std::sync::Arc;
use std::thread;

use ordo_core::telemetry::{MetricId, MetricValue};
use ordo_telemetry::{InMemoryBackend, MetricsRegistry, OptimizerMetrics, ScopedMetricTimer};

#[test]
fn test_metrics_shared_across_threads() {
    // --- 1. ARRANGE ---
    let registry = MetricsRegistry::with_backend(Arc::new(InMemoryBackend::new()));
    let metrics = OptimizerMetrics::new(registry.clone()).unwrap();

    // --- 2. ACT ---
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let metrics = metrics.clone();
            thread::spawn(move || {
                let histogram = metrics.pass_time("VertexCache").unwrap();
                let _timer = ScopedMetricTimer::new(&histogram);
                metrics.record_pass("VertexCache", true).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // --- 3. ASSERT ---
    assert_eq!(metrics.passes_applied("VertexCache").unwrap(), 4);
    let timing = registry
        .get_metric(&MetricId::for_pass("pass_time_ms", "VertexCache"))
        .unwrap();
    match timing.value {
        MetricValue::Histogram { count, .. } => assert_eq!(count, 4),
        other => panic!("Expected a histogram, got {other:?}"),
    }
}

#[test]
fn test_snapshot_lists_pipeline_metrics() {
    let metrics = OptimizerMetrics::new(MetricsRegistry::new()).unwrap();
    metrics.record_acmr(1.5, 0.7).unwrap();
    metrics.record_pass("AccessOrder", false).unwrap();

    let json = metrics.registry().snapshot_json().unwrap();

    for name in ["acmr_before", "acmr_after", "meshes", "passes_skipped"] {
        assert!(json.contains(name), "Missing {name} in snapshot: {json}");
    }
}
