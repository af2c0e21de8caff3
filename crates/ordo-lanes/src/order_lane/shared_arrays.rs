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

//! Tracking of texture coordinate arrays aliased between channels of one geometry.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use ordo_core::mesh::{ArrayData, Channel, Geometry};

/// Remembers which texture units of a geometry point at the same array, so
/// that the aliasing can be restored after the arrays are rebuilt.
///
/// Only arrays referenced exclusively from within the geometry qualify. An
/// array also held by another geometry is left to the usual copy-on-rebuild
/// path.
///
/// ```rust,ignore
/// let mut shared = SharedArrayOptimizer::new();
/// shared.find_duplicated_uvs(&geometry);
/// shared.detach_duplicates(&mut geometry);
/// // ... rebuild the remaining arrays ...
/// shared.deduplicate_uvs(&mut geometry);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SharedArrayOptimizer {
    // duplicate unit -> first unit holding the same array
    duplicates: BTreeMap<usize, usize>,
}

impl SharedArrayOptimizer {
    /// Creates an optimizer with no recorded duplicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the texture units whose array is an alias of a lower unit's
    /// array and is not referenced from outside `geometry`.
    ///
    /// Replaces anything recorded by a previous call.
    pub fn find_duplicated_uvs(&mut self, geometry: &Geometry) -> &BTreeMap<usize, usize> {
        self.duplicates.clear();

        let units: Vec<(usize, &Arc<ArrayData>)> = geometry
            .channels()
            .into_iter()
            .filter_map(|channel| match channel {
                Channel::TexCoord(unit) => geometry.array(channel).map(|a| (unit, a)),
                _ => None,
            })
            .filter(|(_, array)| !array.is_empty())
            .collect();

        let mut holders: AHashMap<*const ArrayData, usize> = AHashMap::new();
        for (_, array) in &units {
            *holders.entry(Arc::as_ptr(array)).or_insert(0) += 1;
        }

        let mut first_unit: AHashMap<*const ArrayData, usize> = AHashMap::new();
        for (unit, array) in units {
            let ptr = Arc::as_ptr(array);
            if Arc::strong_count(array) != holders.get(&ptr).copied().unwrap_or(0) {
                continue;
            }
            match first_unit.get(&ptr) {
                Some(&original) => {
                    self.duplicates.insert(unit, original);
                }
                None => {
                    first_unit.insert(ptr, unit);
                }
            }
        }

        if !self.duplicates.is_empty() {
            log::trace!(
                "[SharedArrays] {} texture unit(s) alias another unit",
                self.duplicates.len()
            );
        }
        &self.duplicates
    }

    /// The recorded `duplicate unit -> original unit` pairs.
    pub fn duplicates(&self) -> &BTreeMap<usize, usize> {
        &self.duplicates
    }

    /// Removes the arrays of the recorded duplicate units from `geometry`,
    /// so only the original unit's array is rebuilt.
    pub fn detach_duplicates(&self, geometry: &mut Geometry) {
        for &unit in self.duplicates.keys() {
            geometry.take_array(Channel::TexCoord(unit));
        }
    }

    /// Points every recorded duplicate unit back at its original unit's
    /// current array.
    pub fn deduplicate_uvs(&self, geometry: &mut Geometry) {
        for (&duplicate, &original) in &self.duplicates {
            let array = geometry.array(Channel::TexCoord(original)).cloned();
            geometry.set_array(Channel::TexCoord(duplicate), array);
        }
    }
}
