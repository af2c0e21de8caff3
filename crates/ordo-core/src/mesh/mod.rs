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

//! Defines the abstract mesh the optimization passes operate on.
//!
//! A [`Geometry`] owns a set of attribute channels (position, normal, color,
//! texture coordinates, ...) and a list of [`PrimitiveSet`]s that reference
//! vertices either through explicit index buffers or implicit ranges.
//!
//! Attribute arrays are reference counted. Two geometries (or two channels of
//! the same geometry) may point at the same [`ArrayData`]; mutation goes
//! through [`Geometry::array_mut`], which clones a shared array before
//! handing out a mutable reference so another holder never observes the change.

mod array;
mod geometry;
mod primitive;

pub use array::{ArrayData, ArrayElement, Binding, VertexArray, INVALID_INDEX};
pub use geometry::{Channel, Geometry};
pub use primitive::{
    IndexBuffer, PrimitiveIndexVisitor, PrimitiveKind, PrimitiveMode, PrimitiveSet,
    MAX_U16_VERTEX_COUNT,
};
