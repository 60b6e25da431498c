//! Whole-array and single-axis reductions.
//!
//! The input is read in canonical order and walked in lockstep with an
//! [`NdIndex`] over its dims; each element is folded into the output cell
//! obtained by dropping the reduced axis from its coordinates. Cumulative
//! forms carry one running value per output cell, which sees the reduced
//! axis in increasing order.

use log::debug;
use ndstride_view::{
    normalize_axis, with_dtype, with_num_dtype, Buffer, DType, Element, NdArray, NdError, NdIndex,
    NumElement, Result, Scalar,
};
use num_traits::{Bounded, One, Zero};

// ============================================================================
// Reduction plan
// ============================================================================

/// Mapping from input coordinates to output cells.
#[derive(Debug)]
struct Reduction {
    dims: Vec<usize>,
    axis: Option<usize>,
    out_dims: Vec<usize>,
    /// Contribution of each input axis to the output linear index.
    pitch: Vec<usize>,
}

impl Reduction {
    fn new(name: &str, dims: &[usize], axis: Option<isize>) -> Result<Self> {
        let axis = axis.map(|a| normalize_axis(a, dims.len())).transpose()?;
        let mut pitch = vec![0; dims.len()];
        let out_dims = match axis {
            None => Vec::new(),
            Some(k) => {
                let mut p = 1;
                for i in (0..dims.len()).rev().filter(|&i| i != k) {
                    pitch[i] = p;
                    p *= dims[i];
                }
                dims.iter()
                    .enumerate()
                    .filter(|&(i, _)| i != k)
                    .map(|(_, &d)| d)
                    .collect()
            }
        };
        debug!("reduce {} over dims {:?} axis {:?}", name, dims, axis);
        Ok(Self {
            dims: dims.to_vec(),
            axis,
            out_dims,
            pitch,
        })
    }

    #[inline]
    fn out_size(&self) -> usize {
        self.out_dims.iter().product()
    }

    /// Number of input elements folded into each output cell.
    fn reduced_len(&self) -> usize {
        match self.axis {
            Some(k) => self.dims[k],
            None => self.dims.iter().product(),
        }
    }

    #[inline]
    fn cell(&self, coords: &[usize]) -> usize {
        coords.iter().zip(self.pitch.iter()).map(|(c, p)| c * p).sum()
    }

    fn result_dims(&self, keepdims: bool) -> Vec<usize> {
        if !keepdims {
            return self.out_dims.clone();
        }
        self.dims
            .iter()
            .enumerate()
            .map(|(i, &d)| if self.axis.map_or(true, |k| k == i) { 1 } else { d })
            .collect()
    }

    /// Fold canonical-order `values` into one accumulator per output cell.
    ///
    /// `f` also receives the element's position along the reduced axis (its
    /// flat index when reducing the whole array).
    fn fold<T, A, F>(&self, values: &[T], init: A, mut f: F) -> Vec<A>
    where
        T: Copy,
        A: Clone,
        F: FnMut(&mut A, T, usize),
    {
        let mut acc = vec![init; self.out_size()];
        for (linear, (coords, &v)) in NdIndex::new(&self.dims).zip(values).enumerate() {
            let position = self.axis.map_or(linear, |k| coords[k]);
            f(&mut acc[self.cell(&coords)], v, position);
        }
        acc
    }

    /// Running fold: one output per input element, in canonical order.
    fn scan<T, F>(&self, values: &[T], init: T, f: F) -> Vec<T>
    where
        T: Copy,
        F: Fn(T, T) -> T,
    {
        let mut running = vec![init; self.out_size()];
        NdIndex::new(&self.dims)
            .zip(values)
            .map(|(coords, &v)| {
                let cell = &mut running[self.cell(&coords)];
                *cell = f(*cell, v);
                *cell
            })
            .collect()
    }

    fn finish(&self, buffer: Buffer, keepdims: bool) -> Result<NdArray> {
        NdArray::from_buffer(buffer, &self.result_dims(keepdims))
    }
}

fn unsupported(op: &'static str, dtype: DType) -> NdError {
    NdError::UnsupportedDtype {
        op,
        dtypes: vec![dtype],
    }
}

// ============================================================================
// Sums and products
// ============================================================================

fn accumulate(
    name: &'static str,
    a: &NdArray,
    axis: Option<isize>,
    keepdims: bool,
    multiply: bool,
) -> Result<NdArray> {
    let plan = Reduction::new(name, a.dims(), axis)?;
    let dtype = a.dtype().sum_dtype();
    let buffer = with_num_dtype!(dtype, T => {
        let values = a.to_vec::<T>();
        let folded = if multiply {
            plan.fold(&values, T::one(), |acc, v, _| *acc = acc.times(v))
        } else {
            plan.fold(&values, T::zero(), |acc, v, _| *acc = acc.plus(v))
        };
        Buffer::from(folded)
    }, bool => return Err(unsupported(name, a.dtype())));
    plan.finish(buffer, keepdims)
}

/// Sum in the accumulator dtype ([`DType::sum_dtype`]); 0 when empty.
pub fn sum(a: &NdArray, axis: Option<isize>, keepdims: bool) -> Result<NdArray> {
    accumulate("sum", a, axis, keepdims, false)
}

/// Product in the accumulator dtype; 1 when empty.
pub fn prod(a: &NdArray, axis: Option<isize>, keepdims: bool) -> Result<NdArray> {
    accumulate("prod", a, axis, keepdims, true)
}

fn running(name: &'static str, a: &NdArray, axis: Option<isize>, multiply: bool) -> Result<NdArray> {
    // axis None scans the flattened array
    let (dims, axis) = match axis {
        Some(axis) => (a.dims().to_vec(), axis),
        None => (vec![a.size()], 0),
    };
    let plan = Reduction::new(name, &dims, Some(axis))?;
    let dtype = a.dtype().sum_dtype();
    let buffer = with_num_dtype!(dtype, T => {
        let values = a.to_vec::<T>();
        Buffer::from(if multiply {
            plan.scan(&values, T::one(), T::times)
        } else {
            plan.scan(&values, T::zero(), T::plus)
        })
    }, bool => return Err(unsupported(name, a.dtype())));
    NdArray::from_buffer(buffer, &dims)
}

/// Cumulative sum along `axis`, or over the flattened array.
pub fn cumsum(a: &NdArray, axis: Option<isize>) -> Result<NdArray> {
    running("cumsum", a, axis, false)
}

/// Cumulative product along `axis`, or over the flattened array.
pub fn cumprod(a: &NdArray, axis: Option<isize>) -> Result<NdArray> {
    running("cumprod", a, axis, true)
}

// ============================================================================
// Moments
// ============================================================================

/// Arithmetic mean in [`DType::float_dtype`]; NaN when empty.
pub fn mean(a: &NdArray, axis: Option<isize>, keepdims: bool) -> Result<NdArray> {
    let plan = Reduction::new("mean", a.dims(), axis)?;
    let n = plan.reduced_len() as f64;
    let sums = plan.fold(&a.to_vec::<f64>(), 0.0f64, |acc, v, _| *acc += v);
    let buffer = Buffer::from_scalars(
        a.dtype().float_dtype(),
        sums.into_iter().map(|s| Scalar::F64(s / n)),
    );
    plan.finish(buffer, keepdims)
}

/// Streaming mean and sum of squared deviations.
#[derive(Debug, Clone, Copy, Default)]
struct Welford {
    n: usize,
    mean: f64,
    m2: f64,
}

impl Welford {
    #[inline]
    fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn variance(&self, ddof: usize) -> f64 {
        if self.n <= ddof {
            f64::NAN
        } else {
            self.m2 / (self.n - ddof) as f64
        }
    }
}

fn moments(
    name: &'static str,
    a: &NdArray,
    axis: Option<isize>,
    ddof: usize,
    keepdims: bool,
    root: bool,
) -> Result<NdArray> {
    let plan = Reduction::new(name, a.dims(), axis)?;
    let states = plan.fold(&a.to_vec::<f64>(), Welford::default(), |w, v, _| w.push(v));
    let values = states.into_iter().map(|w| {
        let var = w.variance(ddof);
        Scalar::F64(if root { var.sqrt() } else { var })
    });
    let buffer = Buffer::from_scalars(a.dtype().float_dtype(), values);
    plan.finish(buffer, keepdims)
}

/// Variance with `ddof` delta degrees of freedom; NaN when `N - ddof <= 0`.
pub fn var(a: &NdArray, axis: Option<isize>, ddof: usize, keepdims: bool) -> Result<NdArray> {
    moments("var", a, axis, ddof, keepdims, false)
}

/// Standard deviation, the square root of [`var`].
pub fn std(a: &NdArray, axis: Option<isize>, ddof: usize, keepdims: bool) -> Result<NdArray> {
    moments("std", a, axis, ddof, keepdims, true)
}

// ============================================================================
// Extremes
// ============================================================================

/// Whether `x` replaces the current extreme `best`.
///
/// NaN wins over every number and the first NaN is kept; among numbers
/// the first extreme is kept.
#[inline]
fn replaces<T: Element>(best: T, x: T, greater: bool) -> bool {
    if best.is_nan() {
        return false;
    }
    x.is_nan() || if greater { x > best } else { x < best }
}

/// Value of `amax`/`amin` over an empty cell.
fn empty_extreme(dtype: DType, greater: bool) -> Scalar {
    if dtype.is_float() {
        return Scalar::F64(f64::NAN).cast(dtype);
    }
    with_num_dtype!(dtype, T => {
        let bound = if greater {
            <T as Bounded>::min_value()
        } else {
            <T as Bounded>::max_value()
        };
        bound.to_scalar()
    }, bool => Scalar::Bool(!greater))
}

fn extreme(
    name: &'static str,
    a: &NdArray,
    axis: Option<isize>,
    keepdims: bool,
    greater: bool,
) -> Result<NdArray> {
    let plan = Reduction::new(name, a.dims(), axis)?;
    let fill = empty_extreme(a.dtype(), greater);
    let buffer = with_dtype!(a.dtype(), T => {
        let best = plan.fold(&a.to_vec::<T>(), None::<T>, |best, x, _| match *best {
            Some(b) if !replaces(b, x, greater) => {}
            _ => *best = Some(x),
        });
        let fill = T::from_scalar(fill);
        Buffer::from(best.into_iter().map(|b| b.unwrap_or(fill)).collect::<Vec<T>>())
    });
    plan.finish(buffer, keepdims)
}

/// Maximum, propagating NaN. Empty cells hold NaN for floats and the
/// dtype's lower bound otherwise.
pub fn amax(a: &NdArray, axis: Option<isize>, keepdims: bool) -> Result<NdArray> {
    extreme("amax", a, axis, keepdims, true)
}

/// Minimum, propagating NaN. Empty cells hold NaN for floats and the
/// dtype's upper bound otherwise.
pub fn amin(a: &NdArray, axis: Option<isize>, keepdims: bool) -> Result<NdArray> {
    extreme("amin", a, axis, keepdims, false)
}

fn arg_extreme(
    name: &'static str,
    a: &NdArray,
    axis: Option<isize>,
    keepdims: bool,
    greater: bool,
) -> Result<NdArray> {
    let plan = Reduction::new(name, a.dims(), axis)?;
    let positions: Vec<i64> = with_dtype!(a.dtype(), T => {
        let best = plan.fold(&a.to_vec::<T>(), None::<(T, usize)>, |best, x, pos| match *best {
            Some((b, _)) if !replaces(b, x, greater) => {}
            _ => *best = Some((x, pos)),
        });
        best.into_iter()
            .map(|b| b.map_or(-1, |(_, pos)| pos as i64))
            .collect()
    });
    plan.finish(Buffer::from(positions), keepdims)
}

/// Position of the first maximum along `axis` (flat index when `None`).
///
/// The first NaN counts as the maximum; an empty cell yields -1.
pub fn argmax(a: &NdArray, axis: Option<isize>, keepdims: bool) -> Result<NdArray> {
    arg_extreme("argmax", a, axis, keepdims, true)
}

/// Position of the first minimum along `axis` (flat index when `None`).
///
/// The first NaN counts as the minimum; an empty cell yields -1.
pub fn argmin(a: &NdArray, axis: Option<isize>, keepdims: bool) -> Result<NdArray> {
    arg_extreme("argmin", a, axis, keepdims, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndstride_view::{arange, from_vec};

    fn grid() -> NdArray {
        arange(0.0, 12.0, 1.0, DType::I32)
            .unwrap()
            .reshape(&[3, 4])
            .unwrap()
    }

    #[test]
    fn test_sum_axis_of_broadcast_view() {
        let col = from_vec(vec![1i64, 2, 3], &[3, 1]).unwrap();
        let b = col.broadcast_to(&[3, 3]).unwrap();
        assert_eq!(sum(&b, Some(0), false).unwrap().to_vec::<i64>(), vec![6, 6, 6]);
        assert_eq!(sum(&b, Some(1), false).unwrap().to_vec::<i64>(), vec![3, 6, 9]);
        assert_eq!(sum(&b, None, false).unwrap().item().unwrap(), Scalar::I64(18));
    }

    #[test]
    fn test_sum_dtypes_and_keepdims() {
        let g = grid();
        let s = sum(&g, Some(-1), true).unwrap();
        assert_eq!(s.dtype(), DType::I64);
        assert_eq!(s.dims(), &[3, 1]);
        assert_eq!(s.to_vec::<i64>(), vec![6, 22, 38]);
        let total = sum(&g, None, true).unwrap();
        assert_eq!(total.dims(), &[1, 1]);
        let flags = from_vec(vec![true, false, true], &[3]).unwrap();
        assert_eq!(sum(&flags, None, false).unwrap().item().unwrap(), Scalar::I64(2));
        let u = from_vec(vec![200u8, 100], &[2]).unwrap();
        assert_eq!(sum(&u, None, false).unwrap().item().unwrap(), Scalar::U64(300));
    }

    #[test]
    fn test_sum_axis_out_of_range() {
        assert!(matches!(
            sum(&grid(), Some(2), false),
            Err(NdError::AxisOutOfRange { axis: 2, ndim: 2 })
        ));
        assert!(matches!(
            sum(&grid(), Some(-3), false),
            Err(NdError::AxisOutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_reductions() {
        let e = NdArray::allocate(DType::F64, &[0]);
        assert_eq!(sum(&e, None, false).unwrap().item().unwrap(), Scalar::F64(0.0));
        assert_eq!(prod(&e, None, false).unwrap().item().unwrap(), Scalar::F64(1.0));
        assert!(mean(&e, None, false).unwrap().item().unwrap().is_nan());
        assert!(var(&e, None, 0, false).unwrap().item().unwrap().is_nan());
        assert!(amax(&e, None, false).unwrap().item().unwrap().is_nan());
        assert_eq!(argmax(&e, None, false).unwrap().item().unwrap(), Scalar::I64(-1));

        let ints = NdArray::allocate(DType::I32, &[2, 0]);
        assert_eq!(amax(&ints, Some(1), false).unwrap().to_vec::<i32>(), vec![i32::MIN; 2]);
        assert_eq!(amin(&ints, Some(1), false).unwrap().to_vec::<i32>(), vec![i32::MAX; 2]);
        assert_eq!(argmin(&ints, Some(1), false).unwrap().to_vec::<i64>(), vec![-1, -1]);
        assert_eq!(sum(&ints, Some(0), false).unwrap().dims(), &[0]);
    }

    #[test]
    fn test_prod() {
        let a = from_vec(vec![1i16, 2, 3, 4], &[2, 2]).unwrap();
        let p = prod(&a, Some(0), false).unwrap();
        assert_eq!(p.dtype(), DType::I64);
        assert_eq!(p.to_vec::<i64>(), vec![3, 8]);
    }

    #[test]
    fn test_mean_var_std() {
        let a = from_vec(vec![2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], &[8]).unwrap();
        assert_relative_eq!(mean(&a, None, false).unwrap().item().unwrap().as_f64(), 5.0);
        assert_relative_eq!(var(&a, None, 0, false).unwrap().item().unwrap().as_f64(), 4.0);
        assert_relative_eq!(std(&a, None, 0, false).unwrap().item().unwrap().as_f64(), 2.0);
        assert_relative_eq!(
            var(&a, None, 1, false).unwrap().item().unwrap().as_f64(),
            32.0 / 7.0,
            epsilon = 1e-12
        );
        assert!(var(&a, None, 8, false).unwrap().item().unwrap().is_nan());
    }

    #[test]
    fn test_mean_keeps_float32() {
        let a = from_vec(vec![1.0f32, 2.0], &[2]).unwrap();
        assert_eq!(mean(&a, None, false).unwrap().dtype(), DType::F32);
        let i = from_vec(vec![1i32, 2], &[2]).unwrap();
        let m = mean(&i, None, false).unwrap();
        assert_eq!(m.dtype(), DType::F64);
        assert_eq!(m.item().unwrap(), Scalar::F64(1.5));
    }

    #[test]
    fn test_var_along_axis_of_sliced_view() {
        let g = grid();
        let v = g.slice_str(":, ::-2").unwrap();
        let out = var(&v, Some(0), 0, false).unwrap().to_vec::<f64>();
        assert_eq!(out.len(), 2);
        for x in out {
            assert_relative_eq!(x, 32.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_amax_amin() {
        let g = grid();
        assert_eq!(amax(&g, Some(0), false).unwrap().to_vec::<i32>(), vec![8, 9, 10, 11]);
        assert_eq!(amin(&g, Some(1), false).unwrap().to_vec::<i32>(), vec![0, 4, 8]);
        let b = from_vec(vec![false, true], &[2]).unwrap();
        assert_eq!(amax(&b, None, false).unwrap().item().unwrap(), Scalar::Bool(true));
    }

    #[test]
    fn test_nan_handling() {
        let a = from_vec(vec![1.0f64, f64::NAN, 3.0, f64::NAN], &[4]).unwrap();
        assert!(amax(&a, None, false).unwrap().item().unwrap().is_nan());
        assert!(amin(&a, None, false).unwrap().item().unwrap().is_nan());
        assert_eq!(argmax(&a, None, false).unwrap().item().unwrap(), Scalar::I64(1));
        assert_eq!(argmin(&a, None, false).unwrap().item().unwrap(), Scalar::I64(1));
    }

    #[test]
    fn test_argmax_first_occurrence() {
        let a = from_vec(vec![3i32, 7, 7, 1, 1, 0], &[2, 3]).unwrap();
        assert_eq!(argmax(&a, None, false).unwrap().item().unwrap(), Scalar::I64(1));
        assert_eq!(argmax(&a, Some(1), false).unwrap().to_vec::<i64>(), vec![1, 0]);
        assert_eq!(argmin(&a, Some(0), false).unwrap().to_vec::<i64>(), vec![1, 1, 1]);
    }

    #[test]
    fn test_arg_extreme_keepdims() {
        let a = from_vec(vec![3i32, 7, 7, 1, 1, 0], &[2, 3]).unwrap();
        let rows = argmax(&a, Some(1), true).unwrap();
        assert_eq!(rows.dims(), &[2, 1]);
        assert_eq!(rows.to_vec::<i64>(), vec![1, 0]);
        let cols = argmin(&a, Some(-2), true).unwrap();
        assert_eq!(cols.dims(), &[1, 3]);
        assert_eq!(cols.to_vec::<i64>(), vec![1, 1, 1]);
        let whole = argmax(&a, None, true).unwrap();
        assert_eq!(whole.dims(), &[1, 1]);
        assert_eq!(whole.to_vec::<i64>(), vec![1]);
    }

    #[test]
    fn test_cumsum_flattened_and_axis() {
        let g = grid();
        let flat = cumsum(&g, None).unwrap();
        assert_eq!(flat.dims(), &[12]);
        assert_eq!(flat.to_vec::<i64>()[..4], [0, 1, 3, 6]);
        let rows = cumsum(&g, Some(1)).unwrap();
        assert_eq!(rows.dims(), &[3, 4]);
        assert_eq!(rows.to_vec::<i64>()[4..8], [4, 9, 15, 22]);
        let cols = cumsum(&g, Some(0)).unwrap();
        assert_eq!(cols.to_vec::<i64>()[8..], [12, 15, 18, 21]);
    }

    #[test]
    fn test_cumsum_over_broadcast_view() {
        let col = from_vec(vec![1i32, 2, 3], &[3, 1]).unwrap();
        let b = col.broadcast_to(&[3, 3]).unwrap();
        assert_eq!(
            cumsum(&b, Some(1)).unwrap().to_vec::<i64>(),
            vec![1, 2, 3, 2, 4, 6, 3, 6, 9]
        );
        assert_eq!(
            cumsum(&b, Some(0)).unwrap().to_vec::<i64>(),
            vec![1, 1, 1, 3, 3, 3, 6, 6, 6]
        );
    }

    #[test]
    fn test_cumprod() {
        let a = from_vec(vec![1.0f64, 2.0, 3.0, 4.0], &[4]).unwrap();
        assert_eq!(cumprod(&a, None).unwrap().to_vec::<f64>(), vec![1.0, 2.0, 6.0, 24.0]);
        assert_eq!(cumprod(&NdArray::allocate(DType::U8, &[0]), None).unwrap().size(), 0);
    }
}
