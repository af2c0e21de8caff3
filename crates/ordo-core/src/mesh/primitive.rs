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

//! Primitive sets, index buffers and their decomposition into triangles,
//! lines and points.

/// Largest vertex count addressable by a 16-bit index buffer.
pub const MAX_U16_VERTEX_COUNT: usize = 65535;

/// The topology of a primitive set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Independent points.
    Points,
    /// Independent line segments, two indices each.
    Lines,
    /// A connected polyline.
    LineStrip,
    /// A closed polyline.
    LineLoop,
    /// Independent triangles, three indices each.
    Triangles,
    /// A triangle strip with alternating winding.
    TriangleStrip,
    /// A triangle fan around the first index.
    TriangleFan,
    /// Independent quads, four indices each.
    Quads,
    /// A strip of quads sharing an edge.
    QuadStrip,
    /// A convex polygon, decomposed as a fan.
    Polygon,
}

/// Coarse classification of a [`PrimitiveMode`].
///
/// The derived ordering is the one used when sorting primitive sets before
/// access-order optimization: surfaces first, then lines, then points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveKind {
    /// Triangles, strips, fans, quads and polygons.
    Surface,
    /// Lines, line strips and line loops.
    Line,
    /// Points.
    Point,
}

impl PrimitiveMode {
    /// Returns the coarse kind of this mode.
    pub fn kind(self) -> PrimitiveKind {
        match self {
            PrimitiveMode::Points => PrimitiveKind::Point,
            PrimitiveMode::Lines | PrimitiveMode::LineStrip | PrimitiveMode::LineLoop => {
                PrimitiveKind::Line
            }
            _ => PrimitiveKind::Surface,
        }
    }

    /// Returns `true` for triangle-producing modes.
    pub fn is_surface(self) -> bool {
        self.kind() == PrimitiveKind::Surface
    }
}

/// An index buffer stored at one of three widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    /// 8-bit indices.
    U8(Vec<u8>),
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Builds a buffer from 32-bit indices, choosing 16-bit storage when
    /// `vertex_count` fits in [`MAX_U16_VERTEX_COUNT`] and 32-bit otherwise.
    pub fn for_vertex_count(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count <= MAX_U16_VERTEX_COUNT {
            IndexBuffer::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            IndexBuffer::U32(indices)
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U8(v) => v.len(),
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    /// Returns `true` if the buffer holds no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the index at position `i`, widened to `u32`.
    #[inline]
    pub fn get(&self, i: usize) -> u32 {
        match self {
            IndexBuffer::U8(v) => v[i] as u32,
            IndexBuffer::U16(v) => v[i] as u32,
            IndexBuffer::U32(v) => v[i],
        }
    }

    /// Iterates the indices, widened to `u32`.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Storage width in bits.
    pub fn width_bits(&self) -> u32 {
        match self {
            IndexBuffer::U8(_) => 8,
            IndexBuffer::U16(_) => 16,
            IndexBuffer::U32(_) => 32,
        }
    }

    /// Returns a buffer where every index `i` has been replaced by `table[i]`.
    ///
    /// The storage width is kept unless a remapped value no longer fits, in
    /// which case the buffer is widened to the smallest width that does.
    pub fn remapped(&self, table: &[u32]) -> IndexBuffer {
        let mapped: Vec<u32> = self.iter().map(|i| table[i as usize]).collect();
        let max = mapped.iter().copied().max().unwrap_or(0);
        let width = if max <= u8::MAX as u32 {
            8
        } else if max <= u16::MAX as u32 {
            16
        } else {
            32
        };
        match width.max(self.width_bits()) {
            8 => IndexBuffer::U8(mapped.into_iter().map(|i| i as u8).collect()),
            16 => IndexBuffer::U16(mapped.into_iter().map(|i| i as u16).collect()),
            _ => IndexBuffer::U32(mapped),
        }
    }
}

impl From<Vec<u8>> for IndexBuffer {
    fn from(v: Vec<u8>) -> Self {
        IndexBuffer::U8(v)
    }
}

impl From<Vec<u16>> for IndexBuffer {
    fn from(v: Vec<u16>) -> Self {
        IndexBuffer::U16(v)
    }
}

impl From<Vec<u32>> for IndexBuffer {
    fn from(v: Vec<u32>) -> Self {
        IndexBuffer::U32(v)
    }
}

/// Receives the primitives a [`PrimitiveSet`] decomposes into.
///
/// Implementors that only care about triangles can ignore the default `line`
/// and `point` callbacks.
pub trait PrimitiveIndexVisitor {
    /// Called once per triangle, with the winding produced by the topology.
    fn triangle(&mut self, a: u32, b: u32, c: u32);

    /// Called once per line segment.
    fn line(&mut self, _a: u32, _b: u32) {}

    /// Called once per point.
    fn point(&mut self, _a: u32) {}
}

struct TriangleFn<F>(F);

impl<F: FnMut(u32, u32, u32)> PrimitiveIndexVisitor for TriangleFn<F> {
    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        (self.0)(a, b, c)
    }
}

/// One group of primitives sharing a topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveSet {
    /// A contiguous range of vertices, `first..first + count`.
    DrawArrays {
        /// Topology.
        mode: PrimitiveMode,
        /// First vertex.
        first: u32,
        /// Number of vertices.
        count: u32,
    },
    /// Consecutive runs of vertices starting at `first`, each run drawn as an
    /// independent primitive of `mode`.
    DrawArrayLengths {
        /// Topology.
        mode: PrimitiveMode,
        /// First vertex of the first run.
        first: u32,
        /// Vertex count of each run.
        lengths: Vec<u32>,
    },
    /// Vertices referenced through an explicit index buffer.
    DrawElements {
        /// Topology.
        mode: PrimitiveMode,
        /// Index buffer.
        indices: IndexBuffer,
    },
}

impl PrimitiveSet {
    /// Shorthand for an indexed triangle list.
    pub fn triangles(indices: impl Into<IndexBuffer>) -> Self {
        PrimitiveSet::DrawElements {
            mode: PrimitiveMode::Triangles,
            indices: indices.into(),
        }
    }

    /// Shorthand for an indexed primitive set of any mode.
    pub fn elements(mode: PrimitiveMode, indices: impl Into<IndexBuffer>) -> Self {
        PrimitiveSet::DrawElements {
            mode,
            indices: indices.into(),
        }
    }

    /// The topology of this set.
    pub fn mode(&self) -> PrimitiveMode {
        match self {
            PrimitiveSet::DrawArrays { mode, .. }
            | PrimitiveSet::DrawArrayLengths { mode, .. }
            | PrimitiveSet::DrawElements { mode, .. } => *mode,
        }
    }

    /// Returns `true` for [`PrimitiveSet::DrawElements`].
    pub fn is_indexed(&self) -> bool {
        matches!(self, PrimitiveSet::DrawElements { .. })
    }

    /// The explicit index buffer, if any.
    pub fn indices(&self) -> Option<&IndexBuffer> {
        match self {
            PrimitiveSet::DrawElements { indices, .. } => Some(indices),
            _ => None,
        }
    }

    /// Number of vertex references made by this set.
    pub fn index_count(&self) -> usize {
        match self {
            PrimitiveSet::DrawArrays { count, .. } => *count as usize,
            PrimitiveSet::DrawArrayLengths { lengths, .. } => {
                lengths.iter().map(|&l| l as usize).sum()
            }
            PrimitiveSet::DrawElements { indices, .. } => indices.len(),
        }
    }

    /// The largest vertex index referenced, or `None` for an empty set.
    pub fn max_index(&self) -> Option<u32> {
        match self {
            PrimitiveSet::DrawArrays { first, count, .. } => {
                (*count > 0).then(|| first.saturating_add(*count - 1))
            }
            PrimitiveSet::DrawArrayLengths { first, lengths, .. } => {
                let total: u64 = lengths.iter().map(|&l| l as u64).sum();
                (total > 0).then(|| (*first as u64 + total - 1).min(u32::MAX as u64) as u32)
            }
            PrimitiveSet::DrawElements { indices, .. } => indices.iter().max(),
        }
    }

    /// Returns `true` if every vertex reference is below `vertex_count`.
    pub fn indices_within(&self, vertex_count: usize) -> bool {
        self.max_index()
            .map_or(true, |max| (max as usize) < vertex_count)
    }

    /// Decomposes the set into triangles, lines and points.
    pub fn accept<V: PrimitiveIndexVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            PrimitiveSet::DrawArrays { mode, first, count } => {
                let first = *first;
                let count = addressable(first, *count);
                decompose(*mode, count, |i| first + i as u32, visitor);
            }
            PrimitiveSet::DrawArrayLengths {
                mode,
                first,
                lengths,
            } => {
                let mut start = Some(*first);
                for &length in lengths {
                    let Some(base) = start else { break };
                    decompose(*mode, addressable(base, length), |i| base + i as u32, visitor);
                    start = base.checked_add(length);
                }
            }
            PrimitiveSet::DrawElements { mode, indices } => {
                decompose(*mode, indices.len(), |i| indices.get(i), visitor);
            }
        }
    }

    /// Decomposes the set into triangles only.
    pub fn for_each_triangle(&self, f: impl FnMut(u32, u32, u32)) {
        self.accept(&mut TriangleFn(f));
    }
}

/// How many of the `count` vertices starting at `first` have a `u32` index.
fn addressable(first: u32, count: u32) -> usize {
    (u64::from(u32::MAX - first) + 1).min(u64::from(count)) as usize
}

fn decompose<V, I>(mode: PrimitiveMode, count: usize, index: I, visitor: &mut V)
where
    V: PrimitiveIndexVisitor + ?Sized,
    I: Fn(usize) -> u32,
{
    match mode {
        PrimitiveMode::Points => {
            for i in 0..count {
                visitor.point(index(i));
            }
        }
        PrimitiveMode::Lines => {
            for i in (0..count.saturating_sub(1)).step_by(2) {
                visitor.line(index(i), index(i + 1));
            }
        }
        PrimitiveMode::LineStrip => {
            for i in 1..count {
                visitor.line(index(i - 1), index(i));
            }
        }
        PrimitiveMode::LineLoop => {
            for i in 1..count {
                visitor.line(index(i - 1), index(i));
            }
            if count > 1 {
                visitor.line(index(count - 1), index(0));
            }
        }
        PrimitiveMode::Triangles => {
            for i in (0..count / 3).map(|t| t * 3) {
                visitor.triangle(index(i), index(i + 1), index(i + 2));
            }
        }
        PrimitiveMode::TriangleStrip => {
            for i in 2..count {
                if i % 2 == 1 {
                    visitor.triangle(index(i - 2), index(i), index(i - 1));
                } else {
                    visitor.triangle(index(i - 2), index(i - 1), index(i));
                }
            }
        }
        PrimitiveMode::Quads => {
            for i in (0..count / 4).map(|q| q * 4) {
                visitor.triangle(index(i), index(i + 1), index(i + 2));
                visitor.triangle(index(i), index(i + 2), index(i + 3));
            }
        }
        PrimitiveMode::QuadStrip => {
            let mut i = 0;
            while i + 3 < count {
                visitor.triangle(index(i), index(i + 1), index(i + 2));
                visitor.triangle(index(i + 1), index(i + 3), index(i + 2));
                i += 2;
            }
        }
        PrimitiveMode::TriangleFan | PrimitiveMode::Polygon => {
            for i in 2..count {
                visitor.triangle(index(0), index(i - 1), index(i));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collector {
        triangles: Vec<[u32; 3]>,
        lines: Vec<[u32; 2]>,
        points: Vec<u32>,
    }

    impl PrimitiveIndexVisitor for Collector {
        fn triangle(&mut self, a: u32, b: u32, c: u32) {
            self.triangles.push([a, b, c]);
        }
        fn line(&mut self, a: u32, b: u32) {
            self.lines.push([a, b]);
        }
        fn point(&mut self, a: u32) {
            self.points.push(a);
        }
    }

    fn collect(set: &PrimitiveSet) -> Collector {
        let mut c = Collector::default();
        set.accept(&mut c);
        c
    }

    #[test]
    fn test_ranges_stop_at_last_addressable_vertex() {
        let set = PrimitiveSet::DrawArrays {
            mode: PrimitiveMode::Points,
            first: u32::MAX - 1,
            count: 3,
        };
        assert_eq!(collect(&set).points, vec![u32::MAX - 1, u32::MAX]);
        assert_eq!(set.max_index(), Some(u32::MAX));
        assert!(!set.indices_within(8));

        let runs = PrimitiveSet::DrawArrayLengths {
            mode: PrimitiveMode::Triangles,
            first: u32::MAX - 3,
            lengths: vec![3, 3],
        };
        assert_eq!(
            collect(&runs).triangles,
            vec![[u32::MAX - 3, u32::MAX - 2, u32::MAX - 1]],
            "The second run has a single addressable vertex"
        );
    }

    #[test]
    fn test_strip_alternates_winding() {
        let set = PrimitiveSet::elements(PrimitiveMode::TriangleStrip, vec![0u16, 1, 2, 3, 4]);
        assert_eq!(
            collect(&set).triangles,
            vec![[0, 1, 2], [1, 3, 2], [2, 3, 4]],
            "Odd strip triangles must swap their last two vertices"
        );
    }

    #[test]
    fn test_fan_and_polygon_pivot_on_first() {
        for mode in [PrimitiveMode::TriangleFan, PrimitiveMode::Polygon] {
            let set = PrimitiveSet::DrawArrays {
                mode,
                first: 10,
                count: 4,
            };
            assert_eq!(collect(&set).triangles, vec![[10, 11, 12], [10, 12, 13]]);
        }
    }

    #[test]
    fn test_quads_and_quad_strip() {
        let quads = PrimitiveSet::elements(PrimitiveMode::Quads, vec![0u8, 1, 2, 3]);
        assert_eq!(collect(&quads).triangles, vec![[0, 1, 2], [0, 2, 3]]);

        let strip = PrimitiveSet::elements(PrimitiveMode::QuadStrip, vec![0u8, 1, 2, 3, 4, 5]);
        assert_eq!(
            collect(&strip).triangles,
            vec![[0, 1, 2], [1, 3, 2], [2, 3, 4], [3, 5, 4]]
        );
    }

    #[test]
    fn test_array_lengths_restart_each_run() {
        let set = PrimitiveSet::DrawArrayLengths {
            mode: PrimitiveMode::TriangleStrip,
            first: 0,
            lengths: vec![3, 4],
        };
        assert_eq!(
            collect(&set).triangles,
            vec![[0, 1, 2], [3, 4, 5], [4, 6, 5]]
        );
    }

    #[test]
    fn test_lines_and_points() {
        let looped = PrimitiveSet::elements(PrimitiveMode::LineLoop, vec![0u32, 1, 2]);
        let c = collect(&looped);
        assert!(c.triangles.is_empty());
        assert_eq!(c.lines, vec![[0, 1], [1, 2], [2, 0]]);

        let points = PrimitiveSet::DrawArrays {
            mode: PrimitiveMode::Points,
            first: 2,
            count: 2,
        };
        assert_eq!(collect(&points).points, vec![2, 3]);
    }

    #[test]
    fn test_remapped_widens_when_needed() {
        let buffer = IndexBuffer::U8(vec![0, 1]);
        let mut table = vec![0u32; 2];
        table[1] = 300;
        let remapped = buffer.remapped(&table);
        assert_eq!(remapped.width_bits(), 16, "300 does not fit in 8 bits");
        assert_eq!(remapped.iter().collect::<Vec<_>>(), vec![0, 300]);
    }

    #[test]
    fn test_index_width_threshold() {
        assert_eq!(
            IndexBuffer::for_vertex_count(vec![0], MAX_U16_VERTEX_COUNT).width_bits(),
            16
        );
        assert_eq!(
            IndexBuffer::for_vertex_count(vec![0], MAX_U16_VERTEX_COUNT + 1).width_bits(),
            32
        );
    }

    #[test]
    fn test_max_index_and_bounds() {
        let set = PrimitiveSet::DrawArrays {
            mode: PrimitiveMode::Triangles,
            first: 3,
            count: 3,
        };
        assert_eq!(set.max_index(), Some(5));
        assert!(set.indices_within(6));
        assert!(!set.indices_within(5));
    }
}
