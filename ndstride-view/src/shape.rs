//! Immutable shape/stride model and the canonical offset resolver.
//!
//! A [`Shape`] is a `(dims, strides, offset)` triple with strides counted in
//! elements. Every shape-changing operation returns a new `Shape`; nothing
//! here mutates a shape that another array may alias.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::iter::Coords;
use crate::{NdError, Result};

// ============================================================================
// Stride helpers
// ============================================================================

/// Compute row-major strides (C default: last index varies fastest).
///
/// Zero-length axes count as length 1 so a fresh allocation never carries a
/// zero stride.
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1].max(1) as isize;
    }
    strides
}

/// Normalize a possibly negative axis against `ndim`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let n = ndim as isize;
    let normalized = if axis < 0 { axis + n } else { axis };
    if normalized < 0 || normalized >= n {
        return Err(NdError::AxisOutOfRange { axis, ndim });
    }
    Ok(normalized as usize)
}

/// Smallest and largest offsets reachable through `(dims, strides, offset)`.
///
/// `None` for a zero-size shape, which reaches no memory at all.
fn offset_bounds(dims: &[usize], strides: &[isize], offset: isize) -> Result<Option<(usize, usize)>> {
    if dims.len() != strides.len() {
        return Err(NdError::StrideLengthMismatch);
    }
    if dims.iter().any(|&d| d == 0) {
        return Ok(None);
    }
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(NdError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset.checked_add(end).ok_or(NdError::OffsetOverflow)?;
            } else {
                min_offset = min_offset.checked_add(end).ok_or(NdError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 {
        return Err(NdError::OffsetOverflow);
    }
    Ok(Some((min_offset as usize, max_offset as usize)))
}

/// Resolve a reshape request with at most one `-1` against `size`.
fn infer_dims(from: &[usize], request: &[isize], size: usize) -> Result<Vec<usize>> {
    let invalid = || NdError::InvalidReshape {
        from: from.to_vec(),
        to: request.to_vec(),
    };
    let mut inferred = None;
    let mut known = 1usize;
    for (i, &d) in request.iter().enumerate() {
        if d == -1 {
            if inferred.replace(i).is_some() {
                return Err(invalid());
            }
        } else if d < 0 {
            return Err(invalid());
        } else {
            known = known.checked_mul(d as usize).ok_or_else(invalid)?;
        }
    }
    let mut dims: Vec<usize> = request.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(i) = inferred {
        if known == 0 || size % known != 0 {
            return Err(invalid());
        }
        dims[i] = size / known;
    } else if known != size {
        return Err(invalid());
    }
    Ok(dims)
}

// ============================================================================
// Shape
// ============================================================================

/// Dims, element strides, and the storage offset of coordinate zero.
///
/// Strides may be zero (broadcast axis) or negative (reversed traversal).
/// The offset is chosen so that every reachable element offset is
/// non-negative.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: usize,
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl Shape {
    /// Contiguous row-major shape at offset 0.
    pub fn new(dims: &[usize]) -> Self {
        let strides = row_major_strides(dims);
        Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset: 0,
        }
    }

    /// Rank-0 shape holding exactly one element.
    pub fn scalar() -> Self {
        Self::new(&[])
    }

    /// Shape with explicit strides and offset.
    ///
    /// Fails if the lengths differ or a reachable offset would be negative.
    pub fn with_strides(dims: &[usize], strides: &[isize], offset: usize) -> Result<Self> {
        offset_bounds(dims, strides, offset as isize)?;
        Ok(Self::from_parts(dims.to_vec(), strides.to_vec(), offset))
    }

    /// Internal constructor for shapes derived from an already valid shape.
    pub(crate) fn from_parts(dims: Vec<usize>, strides: Vec<isize>, offset: usize) -> Self {
        debug_assert_eq!(dims.len(), strides.len());
        Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of logical elements (1 for rank 0, 0 if any axis is empty).
    #[inline]
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// Alias of [`Shape::is_empty`].
    #[inline]
    pub fn has_zero_size(&self) -> bool {
        self.is_empty()
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Row-major contiguity of the strides.
    ///
    /// Size-1 axes are ignored and zero-size shapes are contiguous. A shape
    /// with a stretched (zero-stride) axis of extent > 1 is never contiguous.
    pub fn is_contiguous(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut expected = 1isize;
        for (&dim, &stride) in self.dims.iter().zip(self.strides.iter()).rev() {
            if dim == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= dim as isize;
        }
        true
    }

    /// True if any axis has stride 0.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.strides.iter().any(|&s| s == 0)
    }

    /// Map a coordinate tuple to its storage offset.
    ///
    /// This is the only offset computation in the engine. Coordinates are
    /// not bounds checked; see [`Shape::try_resolve`].
    #[inline]
    pub fn resolve(&self, coords: &[usize]) -> usize {
        debug_assert_eq!(coords.len(), self.dims.len());
        let mut offset = self.offset as isize;
        for (&c, &s) in coords.iter().zip(self.strides.iter()) {
            offset += c as isize * s;
        }
        offset as usize
    }

    /// Bounds-checked [`Shape::resolve`].
    pub fn try_resolve(&self, coords: &[usize]) -> Result<usize> {
        if coords.len() != self.ndim() {
            return Err(NdError::RankMismatch(coords.len(), self.ndim()));
        }
        for (axis, (&c, &dim)) in coords.iter().zip(self.dims.iter()).enumerate() {
            if c >= dim {
                return Err(NdError::IndexOutOfBounds {
                    axis,
                    index: c as isize,
                    dim,
                });
            }
        }
        Ok(self.resolve(coords))
    }

    /// Row-major coordinates of the `linear`-th element.
    pub fn unravel(&self, linear: usize) -> Coords {
        let mut coords: Coords = SmallVec::from_elem(0, self.ndim());
        let mut rest = linear;
        for (c, &dim) in coords.iter_mut().zip(self.dims.iter()).rev() {
            if dim == 0 {
                return coords;
            }
            *c = rest % dim;
            rest /= dim;
        }
        coords
    }

    /// Row-major linear position of `coords`; inverse of [`Shape::unravel`].
    pub fn ravel_coords(&self, coords: &[usize]) -> usize {
        coords
            .iter()
            .zip(self.dims.iter())
            .fold(0, |acc, (&c, &dim)| acc * dim + c)
    }

    /// Lowest and highest reachable offsets, `None` when empty.
    pub fn offset_range(&self) -> Option<(usize, usize)> {
        offset_bounds(&self.dims, &self.strides, self.offset as isize)
            .ok()
            .flatten()
    }

    /// Check that every reachable offset lies in `[0, len)`.
    pub fn validate_within(&self, len: usize) -> Result<()> {
        match offset_bounds(&self.dims, &self.strides, self.offset as isize)? {
            Some((_, max)) if max >= len => Err(NdError::OffsetOverflow),
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Metadata transformations
    // ------------------------------------------------------------------------

    /// Reshape without copying.
    ///
    /// `request` may contain a single `-1`. Returns `Ok(None)` when the
    /// current strides cannot express the new dims and the caller must copy.
    pub fn reshape_view(&self, request: &[isize]) -> Result<Option<Shape>> {
        let new_dims = infer_dims(&self.dims, request, self.size())?;
        if self.is_contiguous() {
            let strides = row_major_strides(&new_dims);
            return Ok(Some(Shape::from_parts(new_dims, strides, self.offset)));
        }
        Ok(self
            .nocopy_strides(&new_dims)
            .map(|strides| Shape::from_parts(new_dims, strides, self.offset)))
    }

    /// Strides for `new_dims` that address the same elements in the same
    /// row-major order, if they exist.
    fn nocopy_strides(&self, new_dims: &[usize]) -> Option<Vec<isize>> {
        let (old_dims, old_strides): (Vec<usize>, Vec<isize>) = self
            .dims
            .iter()
            .zip(self.strides.iter())
            .filter(|&(&d, _)| d != 1)
            .map(|(&d, &s)| (d, s))
            .unzip();

        let mut new_strides = vec![1isize; new_dims.len()];
        let (mut oi, mut oj) = (0usize, 1usize);
        let (mut ni, mut nj) = (0usize, 1usize);
        while ni < new_dims.len() && oi < old_dims.len() {
            let mut np = new_dims[ni];
            let mut op = old_dims[oi];
            while np != op {
                if np < op {
                    np *= *new_dims.get(nj)?;
                    nj += 1;
                } else {
                    op *= *old_dims.get(oj)?;
                    oj += 1;
                }
            }
            // old axes oi..oj must be mutually contiguous to be merged
            for ok in oi..oj - 1 {
                if old_strides[ok] != old_dims[ok + 1] as isize * old_strides[ok + 1] {
                    return None;
                }
            }
            new_strides[nj - 1] = old_strides[oj - 1];
            for nk in (ni + 1..nj).rev() {
                new_strides[nk - 1] = new_strides[nk] * new_dims[nk] as isize;
            }
            ni = nj;
            nj += 1;
            oi = oj;
            oj += 1;
        }
        // trailing unit axes
        let last = if ni > 0 { new_strides[ni - 1] } else { 1 };
        for s in new_strides.iter_mut().skip(ni) {
            *s = if last == 0 { 1 } else { last };
        }
        Some(new_strides)
    }

    /// Reorder axes; `perm[i]` is the source axis of output axis `i`.
    pub fn permute(&self, perm: &[usize]) -> Result<Shape> {
        let rank = self.ndim();
        if perm.len() != rank {
            return Err(NdError::RankMismatch(perm.len(), rank));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(NdError::InvalidPermutation(perm.to_vec()));
            }
            seen[p] = true;
        }
        let dims = perm.iter().map(|&p| self.dims[p]).collect();
        let strides = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(Shape::from_parts(dims, strides, self.offset))
    }

    /// Reverse the axis order.
    pub fn transpose(&self) -> Shape {
        let dims = self.dims.iter().rev().copied().collect();
        let strides = self.strides.iter().rev().copied().collect();
        Shape::from_parts(dims, strides, self.offset)
    }

    pub fn swap_axes(&self, a: isize, b: isize) -> Result<Shape> {
        let a = normalize_axis(a, self.ndim())?;
        let b = normalize_axis(b, self.ndim())?;
        let mut perm: Vec<usize> = (0..self.ndim()).collect();
        perm.swap(a, b);
        self.permute(&perm)
    }

    /// Move axis `src` to position `dst`, keeping the others in order.
    pub fn move_axis(&self, src: isize, dst: isize) -> Result<Shape> {
        let src = normalize_axis(src, self.ndim())?;
        let dst = normalize_axis(dst, self.ndim())?;
        let mut perm: Vec<usize> = (0..self.ndim()).filter(|&a| a != src).collect();
        perm.insert(dst, src);
        self.permute(&perm)
    }

    /// Insert a unit axis at `axis` (normalized against `ndim + 1`).
    pub fn expand_dims(&self, axis: isize) -> Result<Shape> {
        let axis = normalize_axis(axis, self.ndim() + 1)?;
        let mut dims = self.dims.to_vec();
        let mut strides = self.strides.to_vec();
        dims.insert(axis, 1);
        strides.insert(axis, 1);
        Ok(Shape::from_parts(dims, strides, self.offset))
    }

    /// Drop unit axes: all of them, or only `axis`, which must have extent 1.
    pub fn squeeze(&self, axis: Option<isize>) -> Result<Shape> {
        let keep: Vec<usize> = match axis {
            None => (0..self.ndim()).filter(|&a| self.dims[a] != 1).collect(),
            Some(ax) => {
                let ax = normalize_axis(ax, self.ndim())?;
                if self.dims[ax] != 1 {
                    let mut to: Vec<isize> = self.dims.iter().map(|&d| d as isize).collect();
                    to.remove(ax);
                    return Err(NdError::InvalidReshape {
                        from: self.dims.to_vec(),
                        to,
                    });
                }
                (0..self.ndim()).filter(|&a| a != ax).collect()
            }
        };
        let dims = keep.iter().map(|&a| self.dims[a]).collect();
        let strides = keep.iter().map(|&a| self.strides[a]).collect();
        Ok(Shape::from_parts(dims, strides, self.offset))
    }
}
