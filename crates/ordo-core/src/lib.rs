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

//! # Ordo Core
//!
//! Foundational crate containing the mesh data model, primitive decomposition,
//! lane contracts and shared types used by every optimization pass.

#![warn(missing_docs)]

pub mod lane;
pub mod math;
pub mod mesh;
pub mod settings;
pub mod telemetry;
pub mod utils;

pub use mesh::{
    ArrayData, Binding, Channel, Geometry, IndexBuffer, PrimitiveKind, PrimitiveMode,
    PrimitiveSet, VertexArray,
};
pub use settings::OptimizerSettings;
pub use utils::timer::Stopwatch;
