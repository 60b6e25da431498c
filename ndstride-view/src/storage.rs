//! Reference-counted typed buffers shared by array views.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ndstride_traits::{DType, Element, Scalar};

use crate::{NdError, Result};

// ============================================================================
// Buffer
// ============================================================================

/// Contiguous element buffer, one variant per dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    Bool(Vec<bool>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Buffer {
    /// `len` zeros of `dtype`.
    pub fn zeros(dtype: DType, len: usize) -> Buffer {
        with_dtype!(dtype, T => Buffer::from(vec![T::default(); len]))
    }

    /// `len` copies of `value`, keeping its dtype.
    pub fn full(value: Scalar, len: usize) -> Buffer {
        with_dtype!(value.dtype(), T => Buffer::from(vec![T::from_scalar(value); len]))
    }

    /// Collect scalars into a buffer of `dtype`, casting each by value.
    pub fn from_scalars<I>(dtype: DType, values: I) -> Buffer
    where
        I: IntoIterator<Item = Scalar>,
    {
        with_dtype!(dtype, T => Buffer::from(
            values.into_iter().map(T::from_scalar).collect::<Vec<T>>()
        ))
    }

    pub fn dtype(&self) -> DType {
        match self {
            Buffer::Bool(_) => DType::Bool,
            Buffer::U8(_) => DType::U8,
            Buffer::I16(_) => DType::I16,
            Buffer::U16(_) => DType::U16,
            Buffer::I32(_) => DType::I32,
            Buffer::U32(_) => DType::U32,
            Buffer::I64(_) => DType::I64,
            Buffer::U64(_) => DType::U64,
            Buffer::F32(_) => DType::F32,
            Buffer::F64(_) => DType::F64,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        with_buffer!(self, v => v.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `offset` as a [`Scalar`].
    #[inline]
    pub fn get(&self, offset: usize) -> Scalar {
        with_buffer!(self, v => v[offset].to_scalar())
    }

    /// Store `value` at `offset`, converting it to the buffer's dtype.
    #[inline]
    pub fn set(&mut self, offset: usize, value: Scalar) {
        with_buffer!(self, v => v[offset] = Element::from_scalar(value))
    }
}

/// Typed access to the matching [`Buffer`] variant.
pub trait Storable: Element {
    fn as_slice(buffer: &Buffer) -> Option<&[Self]>;
    fn as_mut_slice(buffer: &mut Buffer) -> Option<&mut [Self]>;
    fn into_buffer(data: Vec<Self>) -> Buffer;
}

macro_rules! impl_storable {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Storable for $t {
                #[inline]
                fn as_slice(buffer: &Buffer) -> Option<&[Self]> {
                    match buffer {
                        Buffer::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }

                #[inline]
                fn as_mut_slice(buffer: &mut Buffer) -> Option<&mut [Self]> {
                    match buffer {
                        Buffer::$variant(v) => Some(v.as_mut_slice()),
                        _ => None,
                    }
                }

                #[inline]
                fn into_buffer(data: Vec<Self>) -> Buffer {
                    Buffer::$variant(data)
                }
            }
        )*
    };
}

impl_storable!(
    bool => Bool,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

impl<T: Storable> From<Vec<T>> for Buffer {
    fn from(data: Vec<T>) -> Self {
        T::into_buffer(data)
    }
}

// ============================================================================
// Storage
// ============================================================================

struct StorageInner {
    dtype: DType,
    len: usize,
    buffer: RwLock<Buffer>,
    writable: AtomicBool,
}

/// Shared handle to one buffer.
///
/// Cloning a `Storage` adds a reference; the buffer is freed when the last
/// view drops it. The writable flag is shared by every view of the buffer.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("dtype", &self.inner.dtype)
            .field("len", &self.inner.len)
            .field("writable", &self.is_writable())
            .field("refs", &self.ref_count())
            .finish()
    }
}

impl Storage {
    /// Wrap a buffer; fresh storage is writable.
    pub fn new(buffer: Buffer) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                dtype: buffer.dtype(),
                len: buffer.len(),
                buffer: RwLock::new(buffer),
                writable: AtomicBool::new(true),
            }),
        }
    }

    pub fn zeros(dtype: DType, len: usize) -> Self {
        Self::new(Buffer::zeros(dtype, len))
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Number of elements in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    #[inline]
    pub fn itemsize(&self) -> usize {
        self.inner.dtype.itemsize()
    }

    #[inline]
    pub fn nbytes(&self) -> usize {
        self.inner.len * self.itemsize()
    }

    /// Number of live handles to this buffer.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.inner.writable.load(Ordering::Acquire)
    }

    /// Set the flag seen by every view of this buffer.
    pub fn set_writable(&self, writable: bool) {
        self.inner.writable.store(writable, Ordering::Release);
    }

    /// Shared read access; a poisoned lock is recovered.
    pub fn read(&self) -> RwLockReadGuard<'_, Buffer> {
        self.inner
            .buffer
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Exclusive write access; fails if the storage is frozen.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Buffer>> {
        if !self.is_writable() {
            return Err(NdError::ReadOnlyViolation);
        }
        Ok(self
            .inner
            .buffer
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    #[inline]
    pub fn get(&self, offset: usize) -> Scalar {
        self.read().get(offset)
    }

    pub fn set(&self, offset: usize, value: Scalar) -> Result<()> {
        self.write()?.set(offset, value);
        Ok(())
    }

    /// Copy of the whole buffer.
    pub fn to_buffer(&self) -> Buffer {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_zeros_and_full() {
        let z = Buffer::zeros(DType::I16, 3);
        assert_eq!(z, Buffer::I16(vec![0, 0, 0]));
        let f = Buffer::full(Scalar::F32(1.5), 2);
        assert_eq!(f, Buffer::F32(vec![1.5, 1.5]));
        assert_eq!(f.dtype(), DType::F32);
    }

    #[test]
    fn test_buffer_set_converts_by_value() {
        let mut b = Buffer::zeros(DType::U8, 2);
        b.set(0, Scalar::F64(7.9));
        b.set(1, Scalar::Bool(true));
        assert_eq!(b, Buffer::U8(vec![7, 1]));
        assert_eq!(b.get(0), Scalar::U8(7));
    }

    #[test]
    fn test_storable_typed_access() {
        let b = Buffer::from(vec![1.0f64, 2.0]);
        assert_eq!(f64::as_slice(&b), Some(&[1.0, 2.0][..]));
        assert!(i32::as_slice(&b).is_none());
    }

    #[test]
    fn test_storage_ref_count_tracks_views() {
        let s = Storage::zeros(DType::F64, 4);
        assert_eq!(s.ref_count(), 1);
        let view = s.clone();
        assert_eq!(s.ref_count(), 2);
        assert!(s.ptr_eq(&view));
        drop(view);
        assert_eq!(s.ref_count(), 1);
    }

    #[test]
    fn test_storage_writable_flag_is_shared() {
        let s = Storage::zeros(DType::I32, 2);
        let view = s.clone();
        assert!(s.set(0, Scalar::I32(5)).is_ok());
        view.set_writable(false);
        assert!(matches!(s.set(1, Scalar::I32(1)), Err(NdError::ReadOnlyViolation)));
        assert_eq!(s.get(0), Scalar::I32(5));
    }

    #[test]
    fn test_storage_sizes() {
        let s = Storage::zeros(DType::U16, 5);
        assert_eq!(s.len(), 5);
        assert_eq!(s.itemsize(), 2);
        assert_eq!(s.nbytes(), 10);
    }
}
