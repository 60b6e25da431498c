//! Elementwise kernels.
//!
//! A binary op runs `resolve dtypes -> broadcast -> allocate -> iterate`:
//! each operand is re-viewed through its own broadcast [`Shape`], read in
//! canonical order (converted by value to the compute dtype), combined, and
//! collected into a fresh row-major buffer of the output dims.
//!
//! [`Shape`]: ndstride_view::Shape

use log::debug;
use ndstride_view::{
    broadcast_shapes, from_scalar, with_num_dtype, Buffer, NdArray, NdError, NumElement, Result,
    Scalar, Storable,
};

use crate::dispatch::{resolve_binary, resolve_unary, BinaryOp, KernelDecision, UnaryOp};
use crate::threading::collect_chunks;

// ============================================================================
// Typed kernels
// ============================================================================

enum NumericKernel<T> {
    Arith(fn(T, T) -> T),
    Compare(fn(&T, &T) -> bool),
}

/// NaN-propagating maximum.
#[inline]
fn maximum<T: NumElement>(x: T, y: T) -> T {
    if x.is_nan() || x >= y {
        x
    } else if y.is_nan() || y > x {
        y
    } else {
        x
    }
}

/// NaN-propagating minimum.
#[inline]
fn minimum<T: NumElement>(x: T, y: T) -> T {
    if x.is_nan() || x <= y {
        x
    } else if y.is_nan() || y < x {
        y
    } else {
        x
    }
}

fn numeric_kernel<T: NumElement>(op: BinaryOp) -> NumericKernel<T> {
    use NumericKernel::{Arith, Compare};
    match op {
        BinaryOp::Add => Arith(T::plus),
        BinaryOp::Subtract => Arith(T::minus),
        BinaryOp::Multiply => Arith(T::times),
        BinaryOp::Divide => Arith(T::divide),
        BinaryOp::Remainder => Arith(T::remainder),
        BinaryOp::Power => Arith(T::power),
        BinaryOp::Maximum => Arith(maximum::<T>),
        BinaryOp::Minimum => Arith(minimum::<T>),
        BinaryOp::Equal => Compare(|x, y| x == y),
        BinaryOp::NotEqual => Compare(|x, y| x != y),
        BinaryOp::Less => Compare(|x, y| x < y),
        BinaryOp::LessEqual => Compare(|x, y| x <= y),
        BinaryOp::Greater => Compare(|x, y| x > y),
        BinaryOp::GreaterEqual => Compare(|x, y| x >= y),
        BinaryOp::LogicalAnd => Compare(|x, y| *x != T::zero() && *y != T::zero()),
        BinaryOp::LogicalOr => Compare(|x, y| *x != T::zero() || *y != T::zero()),
    }
}

/// `bool` arithmetic is arithmetic modulo 2 with saturation: `+` is or,
/// `*` is and.
fn bool_kernel(op: BinaryOp) -> fn(bool, bool) -> bool {
    match op {
        BinaryOp::Add | BinaryOp::Maximum | BinaryOp::LogicalOr => |x, y| x || y,
        BinaryOp::Multiply | BinaryOp::Minimum | BinaryOp::LogicalAnd => |x, y| x && y,
        BinaryOp::Subtract | BinaryOp::NotEqual => |x, y| x != y,
        BinaryOp::Equal => |x, y| x == y,
        BinaryOp::Less => |x, y| !x && y,
        BinaryOp::LessEqual => |x, y| !x || y,
        BinaryOp::Greater => |x, y| x && !y,
        BinaryOp::GreaterEqual => |x, y| x || !y,
        // x ** y over {0, 1}
        BinaryOp::Power => |x, y| x || !y,
        // dispatch computes division in a float dtype
        BinaryOp::Divide => |x, y| x && y,
        BinaryOp::Remainder => |_, _| false,
    }
}

fn numeric_unary<T: NumElement>(op: UnaryOp) -> fn(T) -> T {
    match op {
        UnaryOp::Negative => |x| T::zero().minus(x),
        UnaryOp::Abs => |x| if x < T::zero() { T::zero().minus(x) } else { x },
        UnaryOp::Square => |x| x.times(x),
        UnaryOp::Sqrt => |x| T::from_f64(x.to_f64().sqrt()),
        UnaryOp::Exp => |x| T::from_f64(x.to_f64().exp()),
        UnaryOp::Log => |x| T::from_f64(x.to_f64().ln()),
        UnaryOp::Sin => |x| T::from_f64(x.to_f64().sin()),
        UnaryOp::Cos => |x| T::from_f64(x.to_f64().cos()),
        UnaryOp::LogicalNot => |x| if x == T::zero() { T::one() } else { T::zero() },
    }
}

fn bool_unary(op: UnaryOp) -> fn(bool) -> bool {
    match op {
        UnaryOp::LogicalNot => |x| !x,
        // abs and square are the identity on {0, 1}
        _ => |x| x,
    }
}

// ============================================================================
// Drivers
// ============================================================================

/// Collect `f` over the output range, split across threads when allowed.
fn run<O, F>(size: usize, parallel: bool, f: F) -> Vec<O>
where
    O: Send,
    F: Fn(usize, usize) -> Vec<O> + Sync,
{
    if parallel {
        collect_chunks(size, f)
    } else {
        f(0, size)
    }
}

fn eval_numeric<T>(op: BinaryOp, a: &NdArray, b: &NdArray, parallel: bool) -> Buffer
where
    T: NumElement + Storable,
{
    let size = a.size();
    match numeric_kernel::<T>(op) {
        NumericKernel::Arith(f) => Buffer::from(run(size, parallel, |s, e| {
            let x = a.values_range::<T>(s, e);
            let y = b.values_range::<T>(s, e);
            x.into_iter().zip(y).map(|(x, y)| f(x, y)).collect::<Vec<T>>()
        })),
        NumericKernel::Compare(f) => Buffer::from(run(size, parallel, |s, e| {
            let x = a.values_range::<T>(s, e);
            let y = b.values_range::<T>(s, e);
            x.iter().zip(y.iter()).map(|(x, y)| f(x, y)).collect::<Vec<bool>>()
        })),
    }
}

fn eval_binary(
    op: BinaryOp,
    decision: KernelDecision,
    a: &NdArray,
    b: &NdArray,
    parallel: bool,
) -> Buffer {
    with_num_dtype!(decision.compute, T => eval_numeric::<T>(op, a, b, parallel), bool => {
        let f = bool_kernel(op);
        Buffer::from(run(a.size(), parallel, |s, e| {
            let x = a.values_range::<bool>(s, e);
            let y = b.values_range::<bool>(s, e);
            x.into_iter().zip(y).map(|(x, y)| f(x, y)).collect::<Vec<bool>>()
        }))
    })
}

/// Both operands re-viewed with their broadcast shapes.
fn broadcast_operands(lhs: &NdArray, rhs: &NdArray) -> Result<(NdArray, NdArray)> {
    let bc = broadcast_shapes(&[lhs.shape(), rhs.shape()])?;
    let mut operands = bc.operands.into_iter();
    match (operands.next(), operands.next()) {
        (Some(a), Some(b)) => Ok((
            NdArray::from_parts(lhs.storage().clone(), a)?,
            NdArray::from_parts(rhs.storage().clone(), b)?,
        )),
        _ => Err(NdError::EmptyInput("broadcast")),
    }
}

/// Apply `op` elementwise with broadcasting into a fresh array.
pub fn binary(op: BinaryOp, lhs: &NdArray, rhs: &NdArray) -> Result<NdArray> {
    let decision = resolve_binary(op, lhs.dtype(), rhs.dtype())?;
    let (a, b) = broadcast_operands(lhs, rhs)?;
    debug!("{} over dims {:?}", op, a.dims());
    let buffer = eval_binary(op, decision, &a, &b, true);
    NdArray::from_buffer(buffer, a.dims())
}

/// `op(lhs, value)` with `value` as a rank-0 array.
///
/// The scalar takes part in promotion with its own dtype.
pub fn binary_scalar(op: BinaryOp, lhs: &NdArray, value: impl Into<Scalar>) -> Result<NdArray> {
    binary(op, lhs, &from_scalar(value))
}

/// Apply `op` and write the result through `out`.
///
/// `out` must be writable and its dims must equal the broadcast dims of the
/// operands; results are converted by value to `out`'s dtype. Operands may
/// alias `out`: all values are computed before the first write. Always
/// sequential.
pub fn binary_into(op: BinaryOp, out: &NdArray, lhs: &NdArray, rhs: &NdArray) -> Result<()> {
    if !out.is_writable() {
        return Err(NdError::ReadOnlyViolation);
    }
    let decision = resolve_binary(op, lhs.dtype(), rhs.dtype())?;
    let (a, b) = broadcast_operands(lhs, rhs)?;
    if a.dims() != out.dims() {
        return Err(NdError::ShapeMismatch {
            lhs: a.dims().to_vec(),
            rhs: out.dims().to_vec(),
        });
    }
    debug!("{} into dims {:?} (dtype {})", op, out.dims(), out.dtype());
    let result = NdArray::from_buffer(eval_binary(op, decision, &a, &b, false), a.dims())?;
    out.assign(&result)
}

/// Apply `op` elementwise into a fresh array.
pub fn unary(op: UnaryOp, a: &NdArray) -> Result<NdArray> {
    let decision = resolve_unary(op, a.dtype())?;
    let size = a.size();
    let buffer = with_num_dtype!(decision.compute, T => {
        let f = numeric_unary::<T>(op);
        Buffer::from(collect_chunks(size, |s, e| {
            a.values_range::<T>(s, e).into_iter().map(f).collect::<Vec<T>>()
        }))
    }, bool => {
        let f = bool_unary(op);
        Buffer::from(collect_chunks(size, |s, e| {
            a.values_range::<bool>(s, e).into_iter().map(f).collect::<Vec<bool>>()
        }))
    });
    NdArray::from_buffer(buffer, a.dims())
}

// ============================================================================
// Named operations
// ============================================================================

macro_rules! binary_fns {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            #[doc = concat!("Elementwise `", stringify!($name), "` with broadcasting.")]
            pub fn $name(lhs: &NdArray, rhs: &NdArray) -> Result<NdArray> {
                binary(BinaryOp::$op, lhs, rhs)
            }
        )*
    };
}

binary_fns!(
    add => Add,
    subtract => Subtract,
    multiply => Multiply,
    divide => Divide,
    remainder => Remainder,
    power => Power,
    maximum_of => Maximum,
    minimum_of => Minimum,
    equal => Equal,
    not_equal => NotEqual,
    less => Less,
    less_equal => LessEqual,
    greater => Greater,
    greater_equal => GreaterEqual,
    logical_and => LogicalAnd,
    logical_or => LogicalOr,
);

macro_rules! unary_fns {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            #[doc = concat!("Elementwise `", stringify!($name), "`.")]
            pub fn $name(a: &NdArray) -> Result<NdArray> {
                unary(UnaryOp::$op, a)
            }
        )*
    };
}

unary_fns!(
    negative => Negative,
    abs => Abs,
    sqrt => Sqrt,
    exp => Exp,
    log => Log,
    sin => Sin,
    cos => Cos,
    square => Square,
    logical_not => LogicalNot,
);
