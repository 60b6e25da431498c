//! The user-facing array handle.
//!
//! An [`NdArray`] pairs one [`Shape`] with one [`Storage`]. Views share the
//! storage and differ only in shape. Writes go through the storage lock, so
//! handles are written through `&self`.

use std::fmt;

use log::{debug, trace};
use ndstride_traits::{DType, Element, Scalar};

use crate::iter::Offsets;
use crate::shape::Shape;
use crate::slice::{parse_slices, Slice};
use crate::storage::{Buffer, Storable, Storage};
use crate::{NdError, Result};

#[derive(Clone)]
pub struct NdArray {
    storage: Storage,
    shape: Shape,
}

impl fmt::Debug for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdArray")
            .field("dtype", &self.dtype())
            .field("dims", &self.dims())
            .field("strides", &self.strides())
            .field("offset", &self.shape.offset())
            .field("writable", &self.is_writable())
            .finish()
    }
}

impl NdArray {
    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Fresh zero-filled storage with a contiguous shape.
    pub fn allocate(dtype: DType, dims: &[usize]) -> Self {
        let size = dims.iter().product();
        Self::from_buffer_unchecked(Buffer::zeros(dtype, size), dims)
    }

    /// Wrap a buffer holding exactly `product(dims)` elements in row-major order.
    pub fn from_buffer(buffer: Buffer, dims: &[usize]) -> Result<Self> {
        let size: usize = dims.iter().product();
        if buffer.len() != size {
            return Err(NdError::ShapeMismatch {
                lhs: vec![buffer.len()],
                rhs: dims.to_vec(),
            });
        }
        Ok(Self::from_buffer_unchecked(buffer, dims))
    }

    pub(crate) fn from_buffer_unchecked(buffer: Buffer, dims: &[usize]) -> Self {
        Self {
            storage: Storage::new(buffer),
            shape: Shape::new(dims),
        }
    }

    /// Attach an explicit shape to existing storage.
    pub fn from_parts(storage: Storage, shape: Shape) -> Result<Self> {
        shape.validate_within(storage.len())?;
        Ok(Self { storage, shape })
    }

    /// Same storage, new shape. `shape` must be derived from `self.shape`.
    #[inline]
    fn view(&self, shape: Shape) -> Self {
        Self {
            storage: self.storage.clone(),
            shape,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.shape.strides()
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.shape.is_contiguous()
    }

    /// Writable iff the storage is writable and no axis has stride 0.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.storage.is_writable() && !self.shape.is_broadcast()
    }

    #[inline]
    pub fn shares_storage(&self, other: &NdArray) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    fn check_writable(&self) -> Result<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(NdError::ReadOnlyViolation)
        }
    }

    // ------------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------------

    pub fn read(&self, coords: &[usize]) -> Result<Scalar> {
        let offset = self.shape.try_resolve(coords)?;
        Ok(self.storage.get(offset))
    }

    /// Typed read with value-level conversion.
    pub fn get<T: Element>(&self, coords: &[usize]) -> Result<T> {
        self.read(coords).map(T::from_scalar)
    }

    pub fn write(&self, coords: &[usize], value: impl Into<Scalar>) -> Result<()> {
        self.check_writable()?;
        let offset = self.shape.try_resolve(coords)?;
        self.storage.set(offset, value.into())
    }

    /// Set every element of this view to `value`.
    pub fn fill(&self, value: impl Into<Scalar>) -> Result<()> {
        self.check_writable()?;
        let value = value.into();
        let mut buffer = self.storage.write()?;
        for offset in self.shape.offsets() {
            buffer.set(offset, value);
        }
        Ok(())
    }

    /// Copy `src`, broadcast to this view's dims, into this view.
    ///
    /// Source values are read before any write, so `src` may alias `self`.
    pub fn assign(&self, src: &NdArray) -> Result<()> {
        self.check_writable()?;
        let src_shape = src.shape.broadcast_to(self.dims())?;
        let values: Vec<Scalar> = {
            let buffer = src.storage.read();
            src_shape.offsets().map(|o| buffer.get(o)).collect()
        };
        let mut buffer = self.storage.write()?;
        for (offset, value) in self.shape.offsets().zip(values) {
            buffer.set(offset, value);
        }
        Ok(())
    }

    /// The single element of a size-1 array.
    pub fn item(&self) -> Result<Scalar> {
        if self.size() != 1 {
            return Err(NdError::InvalidReshape {
                from: self.dims().to_vec(),
                to: vec![],
            });
        }
        Ok(self.storage.get(self.shape.resolve(&self.shape.unravel(0))))
    }

    /// Elements in canonical order, converted to `T` by value.
    pub fn to_vec<T: Storable>(&self) -> Vec<T> {
        self.values_range(0, self.size())
    }

    /// Elements at canonical positions `start..end`, converted to `T` by value.
    ///
    /// The traversal restarts at `start`, so disjoint ranges can be read
    /// independently and concatenated.
    pub fn values_range<T: Storable>(&self, start: usize, end: usize) -> Vec<T> {
        let buffer = self.storage.read();
        let offsets = Offsets::range(&self.shape, start, end);
        match T::as_slice(&buffer) {
            Some(data) => offsets.map(|o| data[o]).collect(),
            None => offsets.map(|o| T::from_scalar(buffer.get(o))).collect(),
        }
    }

    /// Elements in canonical order as scalars.
    pub fn to_scalars(&self) -> Vec<Scalar> {
        let buffer = self.storage.read();
        self.shape.offsets().map(|o| buffer.get(o)).collect()
    }

    // ------------------------------------------------------------------------
    // Copies
    // ------------------------------------------------------------------------

    /// Contiguous, independently owned copy of this view.
    pub fn materialize(&self) -> NdArray {
        let buffer = {
            let guard = self.storage.read();
            with_buffer!(&*guard, data => Buffer::from(
                self.shape.offsets().map(|o| data[o]).collect::<Vec<_>>()
            ))
        };
        trace!(
            "materialize dims={:?} strides={:?} offset={}",
            self.dims(),
            self.strides(),
            self.shape.offset()
        );
        Self::from_buffer_unchecked(buffer, self.dims())
    }

    /// Contiguous copy converted to `dtype` by value.
    pub fn astype(&self, dtype: DType) -> NdArray {
        if dtype == self.dtype() {
            return self.materialize();
        }
        with_dtype!(dtype, T => Self::from_buffer_unchecked(
            Buffer::from(self.to_vec::<T>()),
            self.dims()
        ))
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub fn slice(&self, slices: &[Slice]) -> Result<NdArray> {
        Ok(self.view(self.shape.slice(slices)?))
    }

    /// Slice with NumPy notation, e.g. `a.slice_str(":, 1:2")`.
    pub fn slice_str(&self, text: &str) -> Result<NdArray> {
        self.slice(&parse_slices(text)?)
    }

    pub fn index_axis(&self, axis: isize, index: isize) -> Result<NdArray> {
        Ok(self.view(self.shape.index_axis(axis, index)?))
    }

    /// Read-only broadcast view with the given dims.
    pub fn broadcast_to(&self, dims: &[usize]) -> Result<NdArray> {
        Ok(self.view(self.shape.broadcast_to(dims)?))
    }

    pub fn permute(&self, perm: &[usize]) -> Result<NdArray> {
        Ok(self.view(self.shape.permute(perm)?))
    }

    pub fn transpose(&self) -> NdArray {
        self.view(self.shape.transpose())
    }

    pub fn swap_axes(&self, a: isize, b: isize) -> Result<NdArray> {
        Ok(self.view(self.shape.swap_axes(a, b)?))
    }

    pub fn move_axis(&self, src: isize, dst: isize) -> Result<NdArray> {
        Ok(self.view(self.shape.move_axis(src, dst)?))
    }

    pub fn expand_dims(&self, axis: isize) -> Result<NdArray> {
        Ok(self.view(self.shape.expand_dims(axis)?))
    }

    pub fn squeeze(&self, axis: Option<isize>) -> Result<NdArray> {
        Ok(self.view(self.shape.squeeze(axis)?))
    }

    /// Reshape as a view when the strides allow it, otherwise copy first.
    pub fn reshape(&self, dims: &[isize]) -> Result<NdArray> {
        if let Some(shape) = self.shape.reshape_view(dims)? {
            return Ok(self.view(shape));
        }
        debug!(
            "reshape {:?} -> {:?} needs a copy (strides {:?})",
            self.dims(),
            dims,
            self.strides()
        );
        let copy = self.materialize();
        let shape = copy
            .shape
            .reshape_view(dims)?
            .ok_or_else(|| NdError::InvalidReshape {
                from: self.dims().to_vec(),
                to: dims.to_vec(),
            })?;
        Ok(copy.view(shape))
    }
}
