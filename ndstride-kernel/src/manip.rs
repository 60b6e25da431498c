//! Joining, flattening and rolling arrays.
//!
//! Every copy here is a view assignment: the destination region is sliced
//! out of a fresh array and filled with [`NdArray::assign`], which reads the
//! source through the canonical iterator.

use log::debug;
use ndstride_view::{normalize_axis, DType, NdArray, NdError, Result, Slice};

/// Slices selecting `start..stop` along `axis` and everything elsewhere.
fn axis_range(ndim: usize, axis: usize, start: usize, stop: usize) -> Vec<Slice> {
    let mut slices = vec![Slice::ALL; ndim];
    slices[axis] = Slice::range(start as isize, stop as isize);
    slices
}

/// Join arrays along an existing axis.
///
/// Ranks must match and every extent except `axis` must agree. The result
/// dtype is the promotion of all input dtypes.
pub fn concatenate(arrays: &[&NdArray], axis: isize) -> Result<NdArray> {
    let (first, rest) = arrays
        .split_first()
        .ok_or(NdError::EmptyInput("concatenate"))?;
    let ndim = first.ndim();
    let axis = normalize_axis(axis, ndim)?;
    let mut dims = first.dims().to_vec();
    for a in rest {
        if a.ndim() != ndim {
            return Err(NdError::RankMismatch(ndim, a.ndim()));
        }
        let agrees = (0..ndim).all(|i| i == axis || a.dims()[i] == dims[i]);
        if !agrees {
            return Err(NdError::ShapeMismatch {
                lhs: first.dims().to_vec(),
                rhs: a.dims().to_vec(),
            });
        }
        dims[axis] += a.dims()[axis];
    }
    let dtypes: Vec<DType> = arrays.iter().map(|a| a.dtype()).collect();
    let dtype = DType::promote_all(&dtypes).unwrap_or(first.dtype());
    debug!(
        "concatenate {} arrays along axis {} -> {:?} {}",
        arrays.len(),
        axis,
        dims,
        dtype
    );

    let out = NdArray::allocate(dtype, &dims);
    let mut start = 0;
    for a in arrays {
        let stop = start + a.dims()[axis];
        out.slice(&axis_range(ndim, axis, start, stop))?.assign(a)?;
        start = stop;
    }
    Ok(out)
}

/// Join equally shaped arrays along a new axis.
pub fn stack(arrays: &[&NdArray], axis: isize) -> Result<NdArray> {
    let first = arrays.first().ok_or(NdError::EmptyInput("stack"))?;
    let axis = normalize_axis(axis, first.ndim() + 1)? as isize;
    if let Some(a) = arrays.iter().find(|a| a.dims() != first.dims()) {
        return Err(NdError::ShapeMismatch {
            lhs: first.dims().to_vec(),
            rhs: a.dims().to_vec(),
        });
    }
    let expanded = arrays
        .iter()
        .map(|a| a.expand_dims(axis))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&NdArray> = expanded.iter().collect();
    concatenate(&refs, axis)
}

/// One-dimensional copy in canonical order.
pub fn flatten(a: &NdArray) -> Result<NdArray> {
    a.materialize().reshape(&[-1])
}

/// One-dimensional view when the strides allow it, otherwise a copy.
pub fn ravel(a: &NdArray) -> Result<NdArray> {
    a.reshape(&[-1])
}

/// Shift elements by `shift` positions along `axis`, wrapping around.
///
/// With `axis = None` the flattened array is rolled and the original dims
/// are restored.
pub fn roll(a: &NdArray, shift: isize, axis: Option<isize>) -> Result<NdArray> {
    let axis = match axis {
        Some(axis) => normalize_axis(axis, a.ndim())?,
        None => {
            let dims: Vec<isize> = a.dims().iter().map(|&d| d as isize).collect();
            return roll(&flatten(a)?, shift, Some(0))?.reshape(&dims);
        }
    };
    let n = a.dims()[axis];
    let out = NdArray::allocate(a.dtype(), a.dims());
    if a.is_empty() {
        return Ok(out);
    }
    let s = shift.rem_euclid(n as isize) as usize;
    let ndim = a.ndim();
    // out[s..] = a[..n-s], out[..s] = a[n-s..]
    out.slice(&axis_range(ndim, axis, s, n))?
        .assign(&a.slice(&axis_range(ndim, axis, 0, n - s))?)?;
    out.slice(&axis_range(ndim, axis, 0, s))?
        .assign(&a.slice(&axis_range(ndim, axis, n - s, n))?)?;
    Ok(out)
}
