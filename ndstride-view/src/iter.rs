//! The canonical row-major iterator.
//!
//! [`NdIndex`] generates coordinate tuples (last axis fastest).
//! [`ShapeIter`] and [`Offsets`] pair each tuple with [`Shape::resolve`];
//! no other traversal computes offsets.

use std::iter::FusedIterator;

use smallvec::SmallVec;

use crate::shape::Shape;

/// Stack-allocated coordinate tuple.
/// 8 axes cover practically every array without touching the heap.
pub type Coords = SmallVec<[usize; 8]>;

/// Advance `coords` to the next row-major position within `dims`.
///
/// Returns `false` (and leaves `coords` all zero) after the last position.
#[inline]
pub fn increment(coords: &mut [usize], dims: &[usize]) -> bool {
    for (c, &d) in coords.iter_mut().zip(dims.iter()).rev() {
        *c += 1;
        if *c < d {
            return true;
        }
        *c = 0;
    }
    false
}

// ============================================================================
// NdIndex
// ============================================================================

/// Restartable row-major coordinate generator.
///
/// Yields `size` tuples: nothing for a zero-size shape, one empty tuple for
/// rank 0.
#[derive(Debug, Clone)]
pub struct NdIndex {
    dims: Coords,
    current: Coords,
    remaining: usize,
}

impl NdIndex {
    pub fn new(dims: &[usize]) -> Self {
        let size = dims.iter().product();
        Self::starting_at(dims, 0, size)
    }

    /// Generator over linear positions `start..end` (clamped to the size).
    ///
    /// The first tuple is recomputed from `start`, so a traversal can be
    /// split into independent chunks.
    pub fn starting_at(dims: &[usize], start: usize, end: usize) -> Self {
        let size: usize = dims.iter().product();
        let end = end.min(size);
        let start = start.min(end);
        let mut current: Coords = SmallVec::from_elem(0, dims.len());
        if start < end {
            let mut rest = start;
            for (c, &d) in current.iter_mut().zip(dims.iter()).rev() {
                *c = rest % d;
                rest /= d;
            }
        }
        Self {
            dims: SmallVec::from_slice(dims),
            current,
            remaining: end - start,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

impl Iterator for NdIndex {
    type Item = Coords;

    #[inline]
    fn next(&mut self) -> Option<Coords> {
        if self.remaining == 0 {
            return None;
        }
        let out = self.current.clone();
        self.remaining -= 1;
        if self.remaining > 0 {
            increment(&mut self.current, &self.dims);
        }
        Some(out)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for NdIndex {}
impl FusedIterator for NdIndex {}

// ============================================================================
// Shape traversal
// ============================================================================

/// `(coords, offset)` pairs of a shape in canonical order.
#[derive(Debug, Clone)]
pub struct ShapeIter {
    shape: Shape,
    index: NdIndex,
}

impl ShapeIter {
    pub fn new(shape: &Shape) -> Self {
        Self {
            shape: shape.clone(),
            index: NdIndex::new(shape.dims()),
        }
    }

    /// Traversal of the linear positions `start..end` only.
    pub fn range(shape: &Shape, start: usize, end: usize) -> Self {
        Self {
            shape: shape.clone(),
            index: NdIndex::starting_at(shape.dims(), start, end),
        }
    }
}

impl Iterator for ShapeIter {
    type Item = (Coords, usize);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let coords = self.index.next()?;
        let offset = self.shape.resolve(&coords);
        Some((coords, offset))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.index.size_hint()
    }
}

impl ExactSizeIterator for ShapeIter {}
impl FusedIterator for ShapeIter {}

/// Storage offsets of a shape in canonical order.
#[derive(Debug, Clone)]
pub struct Offsets {
    inner: ShapeIter,
}

impl Offsets {
    pub fn new(shape: &Shape) -> Self {
        Self {
            inner: ShapeIter::new(shape),
        }
    }

    pub fn range(shape: &Shape, start: usize, end: usize) -> Self {
        Self {
            inner: ShapeIter::range(shape, start, end),
        }
    }
}

impl Iterator for Offsets {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        self.inner.next().map(|(_, offset)| offset)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Offsets {}
impl FusedIterator for Offsets {}

impl Shape {
    /// Canonical `(coords, offset)` traversal.
    pub fn iter(&self) -> ShapeIter {
        ShapeIter::new(self)
    }

    /// Canonical offset traversal.
    pub fn offsets(&self) -> Offsets {
        Offsets::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndindex_row_major_order() {
        let all: Vec<Vec<usize>> = NdIndex::new(&[2, 3]).map(|c| c.to_vec()).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }

    #[test]
    fn test_ndindex_zero_size_is_empty() {
        assert_eq!(NdIndex::new(&[3, 0, 2]).count(), 0);
        assert_eq!(NdIndex::new(&[0]).len(), 0);
    }

    #[test]
    fn test_ndindex_rank_zero_yields_once() {
        let all: Vec<Coords> = NdIndex::new(&[]).collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn test_starting_at_matches_full_traversal() {
        let dims = [3, 4, 5];
        let full: Vec<Coords> = NdIndex::new(&dims).collect();
        let mut chunks: Vec<Coords> = Vec::new();
        for start in (0..60).step_by(7) {
            chunks.extend(NdIndex::starting_at(&dims, start, start + 7));
        }
        assert_eq!(full, chunks);
    }

    #[test]
    fn test_starting_at_clamps() {
        assert_eq!(NdIndex::starting_at(&[4], 3, 100).len(), 1);
        assert_eq!(NdIndex::starting_at(&[4], 9, 100).len(), 0);
        assert_eq!(NdIndex::starting_at(&[0, 4], 0, 4).len(), 0);
    }

    #[test]
    fn test_offsets_follow_negative_strides() {
        let reversed = Shape::with_strides(&[3], &[-1], 2).unwrap();
        let offs: Vec<usize> = reversed.offsets().collect();
        assert_eq!(offs, vec![2, 1, 0]);
    }

    #[test]
    fn test_offsets_follow_zero_strides() {
        let s = Shape::with_strides(&[2, 3], &[0, 1], 0).unwrap();
        let offs: Vec<usize> = s.offsets().collect();
        assert_eq!(offs, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_iter_offsets_agree_with_resolve() {
        let s = Shape::with_strides(&[2, 2, 3], &[-6, 0, 2], 7).unwrap();
        for (coords, offset) in s.iter() {
            assert_eq!(offset, s.resolve(&coords));
        }
        let ranged: Vec<usize> = Offsets::range(&s, 5, 9).collect();
        let full: Vec<usize> = s.offsets().skip(5).take(4).collect();
        assert_eq!(ranged, full);
    }
}
