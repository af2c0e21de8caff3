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

use super::array::{ArrayData, Binding, VertexArray};
use super::primitive::PrimitiveSet;

/// Identifies one attribute channel of a [`Geometry`].
///
/// The order of the variants is the channel order used wherever channels are
/// visited in sequence, including the lexicographic vertex comparison of the
/// deduplication pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Vertex positions. Defines the vertex count.
    Position,
    /// Normals.
    Normal,
    /// Primary colors.
    Color,
    /// Secondary colors.
    SecondaryColor,
    /// Fog coordinates.
    FogCoord,
    /// Texture coordinates for the given unit.
    TexCoord(usize),
    /// Generic vertex attributes at the given location.
    VertexAttrib(usize),
}

impl Channel {
    /// Returns `true` for the channels whose coarse binding prevents
    /// per-vertex deduplication.
    pub fn is_binding_sensitive(self) -> bool {
        matches!(
            self,
            Channel::Normal | Channel::Color | Channel::SecondaryColor | Channel::FogCoord
        )
    }
}

type Slot = Option<Arc<ArrayData>>;

/// A renderable mesh: attribute channels plus the primitive sets drawing them.
///
/// Cloning a `Geometry` is shallow: the clone shares every attribute array
/// with the original until one of them writes through [`Geometry::array_mut`].
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    vertices: Slot,
    normals: Slot,
    colors: Slot,
    secondary_colors: Slot,
    fog_coords: Slot,
    tex_coords: Vec<Slot>,
    vertex_attribs: Vec<Slot>,
    primitive_sets: Vec<PrimitiveSet>,
}

impl Geometry {
    /// Creates an empty geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: sets a per-vertex array on `channel`.
    pub fn with_array(mut self, channel: Channel, values: impl Into<VertexArray>) -> Self {
        self.set_array(channel, Some(Arc::new(ArrayData::per_vertex(values))));
        self
    }

    /// Builder: sets an array with an explicit binding on `channel`.
    pub fn with_bound_array(
        mut self,
        channel: Channel,
        values: impl Into<VertexArray>,
        binding: Binding,
    ) -> Self {
        self.set_array(
            channel,
            Some(Arc::new(ArrayData::with_binding(values, binding))),
        );
        self
    }

    /// Builder: appends a primitive set.
    pub fn with_primitive_set(mut self, set: PrimitiveSet) -> Self {
        self.primitive_sets.push(set);
        self
    }

    fn slot(&self, channel: Channel) -> Option<&Slot> {
        match channel {
            Channel::Position => Some(&self.vertices),
            Channel::Normal => Some(&self.normals),
            Channel::Color => Some(&self.colors),
            Channel::SecondaryColor => Some(&self.secondary_colors),
            Channel::FogCoord => Some(&self.fog_coords),
            Channel::TexCoord(unit) => self.tex_coords.get(unit),
            Channel::VertexAttrib(index) => self.vertex_attribs.get(index),
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Slot {
        fn grow(slots: &mut Vec<Slot>, index: usize) -> &mut Slot {
            if slots.len() <= index {
                slots.resize(index + 1, None);
            }
            &mut slots[index]
        }
        match channel {
            Channel::Position => &mut self.vertices,
            Channel::Normal => &mut self.normals,
            Channel::Color => &mut self.colors,
            Channel::SecondaryColor => &mut self.secondary_colors,
            Channel::FogCoord => &mut self.fog_coords,
            Channel::TexCoord(unit) => grow(&mut self.tex_coords, unit),
            Channel::VertexAttrib(index) => grow(&mut self.vertex_attribs, index),
        }
    }

    /// Returns the shared handle of the array on `channel`, if any.
    pub fn array(&self, channel: Channel) -> Option<&Arc<ArrayData>> {
        self.slot(channel).and_then(Option::as_ref)
    }

    /// Replaces the array on `channel`, returning the previous one.
    pub fn set_array(
        &mut self,
        channel: Channel,
        array: Option<Arc<ArrayData>>,
    ) -> Option<Arc<ArrayData>> {
        if array.is_none() && self.slot(channel).is_none() {
            return None;
        }
        std::mem::replace(self.slot_mut(channel), array)
    }

    /// Removes and returns the array on `channel`.
    pub fn take_array(&mut self, channel: Channel) -> Option<Arc<ArrayData>> {
        self.set_array(channel, None)
    }

    /// Returns a mutable reference to the array on `channel`.
    ///
    /// If the array is shared with another channel or another geometry it is
    /// cloned first, so the other holders keep the original values.
    pub fn array_mut(&mut self, channel: Channel) -> Option<&mut ArrayData> {
        self.slot_mut(channel).as_mut().map(Arc::make_mut)
    }

    /// Lists every channel that currently holds an array, in channel order.
    pub fn channels(&self) -> Vec<Channel> {
        let fixed = [
            (Channel::Position, &self.vertices),
            (Channel::Normal, &self.normals),
            (Channel::Color, &self.colors),
            (Channel::SecondaryColor, &self.secondary_colors),
            (Channel::FogCoord, &self.fog_coords),
        ];
        let mut out: Vec<Channel> = fixed
            .into_iter()
            .filter(|(_, slot)| slot.is_some())
            .map(|(channel, _)| channel)
            .collect();
        out.extend(
            self.tex_coords
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_some())
                .map(|(unit, _)| Channel::TexCoord(unit)),
        );
        out.extend(
            self.vertex_attribs
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_some())
                .map(|(index, _)| Channel::VertexAttrib(index)),
        );
        out
    }

    /// Lists the channels whose array is bound per vertex, in channel order.
    pub fn per_vertex_channels(&self) -> Vec<Channel> {
        self.channels()
            .into_iter()
            .filter(|&c| self.array(c).is_some_and(|a| a.is_per_vertex()))
            .collect()
    }

    /// Number of vertices, defined by the position array (zero if absent).
    pub fn vertex_count(&self) -> usize {
        self.vertices.as_ref().map_or(0, |a| a.len())
    }

    /// Returns `true` if every per-vertex array holds exactly
    /// [`Geometry::vertex_count`] elements.
    pub fn per_vertex_lengths_consistent(&self) -> bool {
        let count = self.vertex_count();
        self.per_vertex_channels()
            .into_iter()
            .filter_map(|c| self.array(c))
            .all(|a| a.len() == count)
    }

    /// Returns `true` if every primitive set only references existing vertices.
    pub fn indices_within_bounds(&self) -> bool {
        let count = self.vertex_count();
        self.primitive_sets.iter().all(|p| p.indices_within(count))
    }

    /// The primitive sets, in draw order.
    pub fn primitive_sets(&self) -> &[PrimitiveSet] {
        &self.primitive_sets
    }

    /// Mutable access to the primitive sets.
    pub fn primitive_sets_mut(&mut self) -> &mut Vec<PrimitiveSet> {
        &mut self.primitive_sets
    }

    /// Replaces the primitive sets, returning the previous ones.
    pub fn set_primitive_sets(&mut self, sets: Vec<PrimitiveSet>) -> Vec<PrimitiveSet> {
        std::mem::replace(&mut self.primitive_sets, sets)
    }

    /// Returns `true` if the array on `channel` has another holder.
    pub fn is_array_shared(&self, channel: Channel) -> bool {
        self.array(channel).is_some_and(|a| Arc::strong_count(a) > 1)
    }

    /// Returns `true` if any array of this geometry has another holder.
    pub fn contains_shared_arrays(&self) -> bool {
        self.channels().into_iter().any(|c| self.is_array_shared(c))
    }

    /// Gives every shared array a private copy.
    pub fn duplicate_shared_arrays(&mut self) {
        for channel in self.channels() {
            if self.is_array_shared(channel) {
                log::trace!("Copying shared {channel:?} array before mutation");
                if let Some(array) = self.take_array(channel) {
                    self.set_array(channel, Some(Arc::new((*array).clone())));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec2, Vec3};

    fn quad() -> Geometry {
        Geometry::new()
            .with_array(Channel::Position, vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE])
            .with_array(Channel::TexCoord(1), vec![Vec2::ZERO; 4])
            .with_primitive_set(PrimitiveSet::triangles(vec![0u16, 1, 2, 2, 1, 3]))
    }

    #[test]
    fn test_channels_in_order() {
        let geometry = quad().with_bound_array(
            Channel::Color,
            vec![crate::math::Vec4::ONE],
            Binding::Overall,
        );
        assert_eq!(
            geometry.channels(),
            vec![Channel::Position, Channel::Color, Channel::TexCoord(1)]
        );
        assert_eq!(
            geometry.per_vertex_channels(),
            vec![Channel::Position, Channel::TexCoord(1)],
            "Overall-bound colors are not per-vertex"
        );
        assert_eq!(geometry.vertex_count(), 4);
        assert!(geometry.per_vertex_lengths_consistent());
    }

    #[test]
    fn test_array_mut_copies_shared_array() {
        // --- 1. ARRANGE ---
        let original = quad();
        let mut copy = original.clone();
        assert!(copy.is_array_shared(Channel::Position));

        // --- 2. ACT ---
        if let Some(array) = copy.array_mut(Channel::Position) {
            array.values = VertexArray::Vec3(vec![Vec3::ZERO]);
        }

        // --- 3. ASSERT ---
        assert_eq!(original.vertex_count(), 4, "The original must not observe the write");
        assert_eq!(copy.vertex_count(), 1);
        assert!(!original.is_array_shared(Channel::Position));
    }

    #[test]
    fn test_duplicate_shared_arrays() {
        let original = quad();
        let mut copy = original.clone();
        assert!(copy.contains_shared_arrays());
        copy.duplicate_shared_arrays();
        assert!(!copy.contains_shared_arrays());
        assert!(!original.contains_shared_arrays());
    }

    #[test]
    fn test_take_missing_channel_is_noop() {
        let mut geometry = quad();
        assert!(geometry.take_array(Channel::VertexAttrib(7)).is_none());
        assert!(geometry.channels().len() == 2);
    }
}
