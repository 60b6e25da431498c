//! Element-type registry for the ndstride array engine.
//!
//! This crate is the only place that knows which concrete numeric types
//! exist. It provides:
//!
//! - [`DType`]: the element-type tag, its byte size, and the fixed
//!   promotion table
//! - [`Scalar`]: a dynamically typed single value with value-level casts
//! - [`Element`] / [`NumElement`]: the typed side used by kernels
//!
//! Cross-type conversion is always numeric. Buffers are never
//! reinterpreted as another element type.

pub mod dtype;
pub mod element;
pub mod scalar;

pub use dtype::{DType, DTypeKind, ParseDTypeError};
pub use element::{Element, NumElement};
pub use scalar::Scalar;
