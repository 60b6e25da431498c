//! Array constructors.

use ndstride_traits::{DType, Scalar};

use crate::array::NdArray;
use crate::storage::{Buffer, Storable};
use crate::{NdError, Result};

pub fn zeros(dtype: DType, dims: &[usize]) -> NdArray {
    NdArray::allocate(dtype, dims)
}

pub fn ones(dtype: DType, dims: &[usize]) -> NdArray {
    full(dims, Scalar::one(dtype))
}

/// Array of `dims` filled with `value`, taking the value's dtype.
pub fn full(dims: &[usize], value: impl Into<Scalar>) -> NdArray {
    let size = dims.iter().product();
    NdArray::from_buffer_unchecked(Buffer::full(value.into(), size), dims)
}

/// Zeros with the dims and dtype of `like`.
pub fn zeros_like(like: &NdArray) -> NdArray {
    zeros(like.dtype(), like.dims())
}

/// Row-major data with the given dims.
pub fn from_vec<T: Storable>(data: Vec<T>, dims: &[usize]) -> Result<NdArray> {
    NdArray::from_buffer(Buffer::from(data), dims)
}

/// Rank-0 array holding `value`.
pub fn from_scalar(value: impl Into<Scalar>) -> NdArray {
    full(&[], value)
}

/// Values `start, start + step, ...` below `stop` (above it for a negative step).
pub fn arange(start: f64, stop: f64, step: f64, dtype: DType) -> Result<NdArray> {
    if step == 0.0 || !step.is_finite() {
        return Err(NdError::InvalidSlice(format!("arange step {step} is not usable")));
    }
    let len = ((stop - start) / step).ceil();
    let len = if len.is_finite() && len > 0.0 { len as usize } else { 0 };
    let values = (0..len).map(|i| Scalar::F64(start + i as f64 * step));
    Ok(NdArray::from_buffer_unchecked(Buffer::from_scalars(dtype, values), &[len]))
}

/// `num` evenly spaced `f64` samples over `[start, stop]`.
pub fn linspace(start: f64, stop: f64, num: usize) -> NdArray {
    let mut data: Vec<f64> = Vec::with_capacity(num);
    if num == 1 {
        data.push(start);
    } else if num > 1 {
        let step = (stop - start) / (num - 1) as f64;
        data.extend((0..num - 1).map(|i| start + i as f64 * step));
        data.push(stop);
    }
    NdArray::from_buffer_unchecked(Buffer::from(data), &[num])
}

/// `n x n` identity matrix.
pub fn eye(n: usize, dtype: DType) -> NdArray {
    let one = Scalar::one(dtype);
    let zero = Scalar::zero(dtype);
    let values = (0..n * n).map(|i| if i % (n + 1) == 0 { one } else { zero });
    NdArray::from_buffer_unchecked(Buffer::from_scalars(dtype, values), &[n, n])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zeros_ones_full() {
        assert_eq!(zeros(DType::I16, &[2]).to_vec::<i16>(), vec![0, 0]);
        assert_eq!(ones(DType::Bool, &[3]).to_vec::<bool>(), vec![true; 3]);
        let f = full(&[2, 2], 2.5f32);
        assert_eq!(f.dtype(), DType::F32);
        assert_eq!(f.to_vec::<f32>(), vec![2.5; 4]);
        assert_eq!(zeros_like(&f).dtype(), DType::F32);
    }

    #[test]
    fn test_from_scalar_is_rank_zero() {
        let s = from_scalar(3u64);
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.size(), 1);
        assert_eq!(s.item().unwrap(), Scalar::U64(3));
    }

    #[test]
    fn test_arange() {
        assert_eq!(
            arange(0.0, 5.0, 1.0, DType::I32).unwrap().to_vec::<i32>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(
            arange(5.0, 0.0, -2.0, DType::I64).unwrap().to_vec::<i64>(),
            vec![5, 3, 1]
        );
        assert_eq!(arange(3.0, 1.0, 1.0, DType::F64).unwrap().size(), 0);
        assert!(arange(0.0, 1.0, 0.0, DType::F64).is_err());
    }

    #[test]
    fn test_linspace() {
        let l = linspace(0.0, 1.0, 5).to_vec::<f64>();
        assert_eq!(l.len(), 5);
        assert_relative_eq!(l[1], 0.25);
        assert_eq!(l[4], 1.0);
        assert_eq!(linspace(2.0, 3.0, 1).to_vec::<f64>(), vec![2.0]);
        assert_eq!(linspace(2.0, 3.0, 0).size(), 0);
    }

    #[test]
    fn test_eye() {
        let e = eye(3, DType::F64);
        assert_eq!(
            e.to_vec::<f64>(),
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(eye(0, DType::I32).size(), 0);
    }
}
