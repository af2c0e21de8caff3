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

//! Small vector types used as vertex attribute elements.
//!
//! Only what the mesh passes need lives here: construction, component access,
//! a few arithmetic operators for building test geometry, and a total order
//! over floating-point components so attribute arrays can be sorted.

use std::cmp::Ordering;

pub mod vector;

pub use self::vector::{Vec2, Vec3, Vec4};

/// Compares two `f32` values with a total order in which `-0.0 == 0.0`.
///
/// Adding `0.0` folds negative zero into positive zero before the IEEE
/// `totalOrder` comparison, so geometrically identical vertices compare equal
/// while NaNs still sort deterministically.
#[inline]
pub fn cmp_f32(a: f32, b: f32) -> Ordering {
    (a + 0.0).total_cmp(&(b + 0.0))
}

/// Compares two `f64` values with the same rules as [`cmp_f32`].
#[inline]
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    (a + 0.0).total_cmp(&(b + 0.0))
}
