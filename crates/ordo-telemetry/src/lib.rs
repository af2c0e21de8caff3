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

//! # Ordo Telemetry
//!
//! Observability for the mesh optimizer: a metrics registry over a pluggable
//! storage backend, RAII pass timers, the [`OptimizerMetrics`] bundle the
//! pipeline reports into, and logger initialisation for binaries.

#![warn(missing_docs)]

pub mod logging;
pub mod metrics;
pub mod storage;
pub mod utils;

pub use logging::init_logging;
pub use metrics::optimizer::OptimizerMetrics;
pub use metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};
pub use storage::backend::MetricsBackend;
pub use storage::memory_backend::InMemoryBackend;
pub use utils::timer::ScopedMetricTimer;
