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

//! Software models of a vertex cache.
//!
//! Position 0 is always the most recently inserted entry.

/// A least-recently-used cache model.
///
/// Re-inserting a resident vertex moves it back to the front instead of
/// duplicating it. Used to drive triangle ordering, where it makes the result
/// independent of the real hardware cache size.
#[derive(Debug, Clone)]
pub struct LruCache {
    entries: Vec<u32>,
    max_size: usize,
}

impl LruCache {
    /// Creates an empty cache holding at most `max_size` vertices.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_size + 3),
            max_size,
        }
    }

    /// Inserts `vertices` at the front, in order.
    ///
    /// Entries already resident are first removed from their old position.
    /// Anything pushed past `max_size` is evicted.
    pub fn add_entries(&mut self, vertices: &[u32]) {
        self.entries.retain(|e| !vertices.contains(e));
        self.entries.splice(0..0, vertices.iter().copied());
        self.entries.truncate(self.max_size);
    }

    /// Resident vertices, most recent first.
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Returns `true` if `vertex` is resident.
    pub fn contains(&self, vertex: u32) -> bool {
        self.entries.contains(&vertex)
    }

    /// Number of resident vertices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacity of the cache.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// A first-in-first-out cache model, closer to real hardware.
///
/// Every inserted vertex is pushed at the front even if it is already
/// resident, so hits do not refresh an entry's age. Used only to measure
/// the miss rate of an existing index order.
#[derive(Debug, Clone)]
pub struct FifoCache {
    entries: Vec<u32>,
    max_size: usize,
}

impl FifoCache {
    /// Smallest supported capacity: one triangle.
    pub const MIN_SIZE: usize = 3;

    /// Creates an empty cache holding at most `max_size` entries.
    ///
    /// Sizes below [`FifoCache::MIN_SIZE`] are raised to it.
    pub fn new(max_size: usize) -> Self {
        let max_size = if max_size < Self::MIN_SIZE {
            log::warn!(
                "FIFO cache size {max_size} is below {}, using {}",
                Self::MIN_SIZE,
                Self::MIN_SIZE
            );
            Self::MIN_SIZE
        } else {
            max_size
        };
        Self {
            entries: Vec::with_capacity(max_size + 3),
            max_size,
        }
    }

    /// Pushes `vertices` at the front, in order, evicting the oldest entries.
    pub fn add_entries(&mut self, vertices: &[u32]) {
        self.entries.splice(0..0, vertices.iter().copied());
        self.entries.truncate(self.max_size);
    }

    /// Resident entries, most recent first. May contain repeats.
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Returns `true` if `vertex` is resident.
    pub fn contains(&self, vertex: u32) -> bool {
        self.entries.contains(&vertex)
    }

    /// Capacity of the cache.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_moves_resident_entries_to_front() {
        let mut cache = LruCache::new(4);
        cache.add_entries(&[0, 1, 2]);
        assert_eq!(cache.entries(), &[0, 1, 2]);

        cache.add_entries(&[2, 3, 4]);
        assert_eq!(
            cache.entries(),
            &[2, 3, 4, 0],
            "2 must move to the front and 1 must be evicted"
        );
        assert!(cache.contains(0));
        assert!(!cache.contains(1));
    }

    #[test]
    fn test_lru_never_exceeds_capacity() {
        let mut cache = LruCache::new(32);
        for i in 0..100 {
            cache.add_entries(&[i, i + 1, i + 2]);
            assert!(cache.len() <= cache.max_size());
        }
        assert_eq!(cache.len(), 32);
        assert_eq!(&cache.entries()[..4], &[99, 100, 101, 98]);
    }

    #[test]
    fn test_fifo_keeps_duplicates() {
        let mut cache = FifoCache::new(6);
        cache.add_entries(&[0, 1, 2]);
        cache.add_entries(&[2, 1, 3]);
        assert_eq!(cache.entries(), &[2, 1, 3, 0, 1, 2]);

        cache.add_entries(&[4, 5, 6]);
        assert_eq!(cache.entries(), &[4, 5, 6, 2, 1, 3]);
        assert!(!cache.contains(0), "The oldest entries are evicted first");
    }

    #[test]
    fn test_fifo_minimum_size() {
        let cache = FifoCache::new(1);
        assert_eq!(cache.max_size(), FifoCache::MIN_SIZE);
        assert!(cache.entries().is_empty());
    }
}
