//! Shapes, storage, and array handles for the ndstride engine.
//!
//! Every element an array exposes is located by one function,
//! [`Shape::resolve`], which maps a coordinate tuple to
//! `offset + Σ coords[i] * strides[i]`. All traversals (display, copies,
//! reductions, kernels) generate coordinates with the canonical row-major
//! iterator in [`iter`] and resolve them through that function.
//!
//! # Core Types
//!
//! - [`Shape`]: immutable dims/strides/offset triple
//! - [`Slice`] / [`SliceDef`]: per-axis slice notation
//! - [`Storage`]: reference-counted typed buffer with a writable flag
//! - [`NdArray`]: a Shape paired with a Storage
//!
//! # Metadata Transformations
//!
//! These build a new [`Shape`] and never touch element data:
//! - `slice`: ranges, steps (negative included), indices, new axes
//! - `broadcast_to` / [`broadcast_shapes`]: stretch size-1 axes with stride 0
//! - `permute`, `transpose`, `swap_axes`, `move_axis`
//! - `expand_dims`, `squeeze`, `reshape_view`

#[macro_use]
mod macros;

pub mod array;
pub mod broadcast;
pub mod creation;
pub mod display;
pub mod iter;
pub mod shape;
pub mod slice;
pub mod storage;

pub use ndstride_traits::{DType, DTypeKind, Element, NumElement, Scalar};

// ============================================================================
// Shape and iteration
// ============================================================================
pub use broadcast::{broadcast_dims, broadcast_shapes, Broadcast};
pub use iter::{Coords, NdIndex, Offsets, ShapeIter};
pub use shape::{normalize_axis, row_major_strides, Shape};
pub use slice::{format_slices, parse_slices, Slice, SliceDef};

// ============================================================================
// Storage and array handles
// ============================================================================
pub use array::NdArray;
pub use creation::{arange, eye, from_scalar, from_vec, full, linspace, ones, zeros, zeros_like};
pub use display::PrintOptions;
pub use storage::{Buffer, Storable, Storage};

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during array operations.
///
/// A zero-size shape is never an error: iteration yields nothing and
/// reductions return their identity or NaN.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NdError {
    /// Extents are incompatible for broadcasting or the operation.
    #[error("shape mismatch: {lhs:?} vs {rhs:?}")]
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// No kernel exists for this operation and operand types.
    #[error("operation `{op}` is not supported for dtypes {dtypes:?}")]
    UnsupportedDtype { op: &'static str, dtypes: Vec<DType> },

    /// Axis (after negative normalization) is outside `0..ndim`.
    #[error("axis {axis} is out of range for array of rank {ndim}")]
    AxisOutOfRange { axis: isize, ndim: usize },

    /// Write attempted through a read-only view.
    #[error("array is read-only (broadcast view or frozen storage)")]
    ReadOnlyViolation,

    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    #[error("index {index} is out of bounds for axis {axis} with size {dim}")]
    IndexOutOfBounds { axis: usize, index: isize, dim: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// A view would address memory outside its storage.
    #[error("offset overflow: view does not fit its storage")]
    OffsetOverflow,

    #[error("invalid slice: {0}")]
    InvalidSlice(String),

    /// Element counts differ, or more than one axis was inferred.
    #[error("cannot reshape array of shape {from:?} into {to:?}")]
    InvalidReshape { from: Vec<usize>, to: Vec<isize> },

    #[error("dtype mismatch: expected {expected}, found {found}")]
    DTypeMismatch { expected: DType, found: DType },

    /// An operation that needs at least one input received none.
    #[error("{0} requires at least one input")]
    EmptyInput(&'static str),

    #[error("invalid permutation {0:?}")]
    InvalidPermutation(Vec<usize>),

    /// A sampling interval `[low, high)` contains no values.
    #[error("empty sampling range [{low}, {high})")]
    EmptyRange { low: i64, high: i64 },

    /// Serialized generator state has the wrong length.
    #[error("invalid generator state of {0} bytes")]
    InvalidGeneratorState(usize),
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, NdError>;
