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

//! Typed attribute arrays and the generic algorithms run over them.

use crate::math::{cmp_f32, cmp_f64, Vec2, Vec3, Vec4};
use std::cmp::Ordering;

/// Marker for "no destination slot" in a remapping table.
pub const INVALID_INDEX: u32 = u32::MAX;

/// How often an attribute value changes across the primitives of a geometry.
///
/// Only [`Binding::PerVertex`] arrays take part in vertex-level deduplication
/// and reordering. Coarser bindings are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Binding {
    /// One value for the whole geometry.
    Overall,
    /// One value per primitive set.
    PerPrimitiveSet,
    /// One value per vertex.
    #[default]
    PerVertex,
}

/// An element type that can be stored in a [`VertexArray`].
///
/// The comparison must be a total order: deduplication sorts vertices with it
/// and treats `Ordering::Equal` across every channel as "same vertex".
pub trait ArrayElement: Copy + Default + Send + Sync + 'static {
    /// Compares two elements.
    fn compare(&self, other: &Self) -> Ordering;
}

macro_rules! impl_integer_element {
    ($($t:ty),*) => {
        $(impl ArrayElement for $t {
            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        })*
    };
}

impl_integer_element!(i8, u8, i16, u16, i32, u32, [u8; 4]);

impl ArrayElement for f32 {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        cmp_f32(*self, *other)
    }
}

impl ArrayElement for f64 {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        cmp_f64(*self, *other)
    }
}

impl ArrayElement for Vec2 {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl ArrayElement for Vec3 {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl ArrayElement for Vec4 {
    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

macro_rules! impl_f64_tuple_element {
    ($($n:literal),*) => {
        $(impl ArrayElement for [f64; $n] {
            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.iter()
                    .zip(other.iter())
                    .map(|(a, b)| cmp_f64(*a, *b))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            }
        })*
    };
}

impl_f64_tuple_element!(2, 3, 4);

/// Copies `values[sources[i]]` into slot `i` of a new vector.
///
/// Used to compact an array down to a list of surviving source elements.
pub fn gather<T: ArrayElement>(values: &[T], sources: &[u32]) -> Vec<T> {
    sources.iter().map(|&src| values[src as usize]).collect()
}

/// Moves every element `i` to slot `remap[i]` of a new vector of `new_len`
/// elements. Elements mapped to [`INVALID_INDEX`] are dropped.
///
/// Unlike [`gather`], elements may move up as well as down.
pub fn scatter<T: ArrayElement>(values: &[T], remap: &[u32], new_len: usize) -> Vec<T> {
    let mut out = vec![T::default(); new_len];
    for (value, &dst) in values.iter().zip(remap) {
        if dst != INVALID_INDEX {
            out[dst as usize] = *value;
        }
    }
    out
}

/// A homogeneous array of vertex attribute values.
///
/// Each variant wraps a `Vec` of one concrete element type. The generic
/// algorithms ([`gather`], [`scatter`], element comparison) are written once
/// against [`ArrayElement`] and dispatched here per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexArray {
    /// Signed 8-bit scalars.
    Byte(Vec<i8>),
    /// Unsigned 8-bit scalars.
    UByte(Vec<u8>),
    /// Signed 16-bit scalars.
    Short(Vec<i16>),
    /// Unsigned 16-bit scalars.
    UShort(Vec<u16>),
    /// Signed 32-bit scalars.
    Int(Vec<i32>),
    /// Unsigned 32-bit scalars.
    UInt(Vec<u32>),
    /// Single-precision scalars (e.g. fog coordinates).
    Float(Vec<f32>),
    /// Double-precision scalars.
    Double(Vec<f64>),
    /// Two-component `f32` vectors (e.g. texture coordinates).
    Vec2(Vec<Vec2>),
    /// Three-component `f32` vectors (e.g. positions, normals).
    Vec3(Vec<Vec3>),
    /// Four-component `f32` vectors (e.g. colors).
    Vec4(Vec<Vec4>),
    /// Two-component `f64` vectors.
    Vec2d(Vec<[f64; 2]>),
    /// Three-component `f64` vectors.
    Vec3d(Vec<[f64; 3]>),
    /// Four-component `f64` vectors.
    Vec4d(Vec<[f64; 4]>),
    /// Packed 8-bit RGBA colors.
    Vec4ub(Vec<[u8; 4]>),
}

macro_rules! dispatch {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            VertexArray::Byte($values) => $body,
            VertexArray::UByte($values) => $body,
            VertexArray::Short($values) => $body,
            VertexArray::UShort($values) => $body,
            VertexArray::Int($values) => $body,
            VertexArray::UInt($values) => $body,
            VertexArray::Float($values) => $body,
            VertexArray::Double($values) => $body,
            VertexArray::Vec2($values) => $body,
            VertexArray::Vec3($values) => $body,
            VertexArray::Vec4($values) => $body,
            VertexArray::Vec2d($values) => $body,
            VertexArray::Vec3d($values) => $body,
            VertexArray::Vec4d($values) => $body,
            VertexArray::Vec4ub($values) => $body,
        }
    };
}

macro_rules! dispatch_map {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            VertexArray::Byte($values) => VertexArray::Byte($body),
            VertexArray::UByte($values) => VertexArray::UByte($body),
            VertexArray::Short($values) => VertexArray::Short($body),
            VertexArray::UShort($values) => VertexArray::UShort($body),
            VertexArray::Int($values) => VertexArray::Int($body),
            VertexArray::UInt($values) => VertexArray::UInt($body),
            VertexArray::Float($values) => VertexArray::Float($body),
            VertexArray::Double($values) => VertexArray::Double($body),
            VertexArray::Vec2($values) => VertexArray::Vec2($body),
            VertexArray::Vec3($values) => VertexArray::Vec3($body),
            VertexArray::Vec4($values) => VertexArray::Vec4($body),
            VertexArray::Vec2d($values) => VertexArray::Vec2d($body),
            VertexArray::Vec3d($values) => VertexArray::Vec3d($body),
            VertexArray::Vec4d($values) => VertexArray::Vec4d($body),
            VertexArray::Vec4ub($values) => VertexArray::Vec4ub($body),
        }
    };
}

impl VertexArray {
    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    /// Returns `true` if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compares the elements at `lhs` and `rhs`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn compare(&self, lhs: usize, rhs: usize) -> Ordering {
        dispatch!(self, v => v[lhs].compare(&v[rhs]))
    }

    /// Returns a new array holding `self[sources[i]]` at each slot `i`.
    pub fn gather(&self, sources: &[u32]) -> VertexArray {
        dispatch_map!(self, v => gather(v, sources))
    }

    /// Returns a new array of `new_len` elements where element `i` was moved to
    /// `remap[i]`; elements mapped to [`INVALID_INDEX`] are dropped.
    pub fn scatter(&self, remap: &[u32], new_len: usize) -> VertexArray {
        dispatch_map!(self, v => scatter(v, remap, new_len))
    }
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),*) => {
        $(impl From<Vec<$t>> for VertexArray {
            fn from(values: Vec<$t>) -> Self {
                VertexArray::$variant(values)
            }
        })*
    };
}

impl_from_vec!(
    i8 => Byte,
    u8 => UByte,
    i16 => Short,
    u16 => UShort,
    i32 => Int,
    u32 => UInt,
    f32 => Float,
    f64 => Double,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    [f64; 2] => Vec2d,
    [f64; 3] => Vec3d,
    [f64; 4] => Vec4d,
    [u8; 4] => Vec4ub
);

/// An attribute array together with its binding.
///
/// Geometries hold these behind an `Arc` so that several channels or several
/// geometries can share one array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayData {
    /// The attribute values.
    pub values: VertexArray,
    /// How the values map onto the geometry's primitives.
    pub binding: Binding,
}

impl ArrayData {
    /// Creates a per-vertex array.
    pub fn per_vertex(values: impl Into<VertexArray>) -> Self {
        Self {
            values: values.into(),
            binding: Binding::PerVertex,
        }
    }

    /// Creates an array with an explicit binding.
    pub fn with_binding(values: impl Into<VertexArray>, binding: Binding) -> Self {
        Self {
            values: values.into(),
            binding,
        }
    }

    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` if the array is bound per vertex.
    pub fn is_per_vertex(&self) -> bool {
        self.binding == Binding::PerVertex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_compacts_to_sources() {
        let array = VertexArray::from(vec![10u16, 11, 12, 13]);
        assert_eq!(array.gather(&[0, 2, 3]), VertexArray::UShort(vec![10, 12, 13]));
    }

    #[test]
    fn test_scatter_moves_and_drops() {
        let array = VertexArray::from(vec![1.0f32, 2.0, 3.0]);
        let moved = array.scatter(&[1, INVALID_INDEX, 0], 2);
        assert_eq!(moved, VertexArray::Float(vec![3.0, 1.0]));
    }

    #[test]
    fn test_compare_uses_element_order() {
        let array = VertexArray::from(vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 9.0, 0.0),
            Vec3::new(1.0, -0.0, 0.0),
        ]);
        assert_eq!(array.compare(0, 1), Ordering::Greater);
        assert_eq!(array.compare(0, 2), Ordering::Equal);
    }

    #[test]
    fn test_double_tuples_compare_lexicographically() {
        let array = VertexArray::from(vec![[0.0f64, 1.0, 2.0], [0.0, 1.0, 3.0]]);
        assert_eq!(array.compare(0, 1), Ordering::Less);
    }
}
