//! Kernel dispatch for ndstride arrays.
//!
//! Every kernel here consumes arrays through the canonical iterator of
//! [`ndstride_view`]: operands are broadcast to a common [`Shape`], read in
//! row-major order, and results are written into fresh contiguous storage
//! (or through a writable view for the `*_into` forms).
//!
//! # Elementwise
//!
//! - [`binary`] / [`unary`] with [`BinaryOp`] / [`UnaryOp`], dtypes chosen by
//!   [`resolve_binary`] / [`resolve_unary`]
//! - Named forms: [`add`], [`subtract`], [`multiply`], [`divide`], [`less`], [`sqrt`], ...
//! - [`binary_into`]: in-place, sequential
//!
//! # Reductions
//!
//! [`sum`], [`prod`], [`mean`], [`var`], [`std`](reduce::std), [`amax`], [`amin`],
//! [`argmax`], [`argmin`], [`cumsum`], [`cumprod`]
//!
//! # Manipulation
//!
//! [`concatenate`], [`stack`], [`flatten`], [`ravel`], [`roll`]
//!
//! # Random
//!
//! [`Generator`]: explicit generator value with a serializable [`GeneratorState`]
//!
//! # Parallelism
//!
//! With the `parallel` feature, fresh elementwise outputs of at least
//! [`PARALLEL_THRESHOLD`] elements are computed on the rayon pool.
//!
//! [`Shape`]: ndstride_view::Shape

pub mod dispatch;
pub mod manip;
pub mod ops;
pub mod random;
pub mod reduce;
mod threading;

// ============================================================================
// Dispatch
// ============================================================================
pub use dispatch::{resolve_binary, resolve_unary, BinaryOp, KernelDecision, UnaryOp};

// ============================================================================
// Elementwise operations
// ============================================================================
pub use ops::{
    abs, add, binary, binary_into, binary_scalar, cos, divide, equal, exp, greater,
    greater_equal, less, less_equal, log, logical_and, logical_not, logical_or, maximum_of,
    minimum_of, multiply, negative, not_equal, power, remainder, sin, sqrt, square, subtract,
    unary,
};

// ============================================================================
// Reductions and manipulation
// ============================================================================
pub use manip::{concatenate, flatten, ravel, roll, stack};
pub use reduce::{amax, amin, argmax, argmin, cumprod, cumsum, mean, prod, std, sum, var};

// ============================================================================
// Random generation
// ============================================================================
pub use random::{Generator, GeneratorState};

pub use threading::PARALLEL_THRESHOLD;

pub use ndstride_view::{NdArray, NdError, Result};
