//! N-dimensional arrays over shared, strided storage.
//!
//! This crate re-exports the ndstride workspace:
//!
//! - [`ndstride_traits`]: dtype registry, [`Scalar`], element traits
//! - [`ndstride_view`]: [`Shape`], slicing, broadcasting, the canonical
//!   iterator, [`Storage`] and the [`NdArray`] handle
//! - [`ndstride_kernel`]: elementwise dispatch, reductions, manipulation and
//!   the explicit random [`Generator`]
//!
//! # Example
//!
//! ```rust
//! use ndstride::{arange, sum, DType};
//!
//! let a = arange(0.0, 12.0, 1.0, DType::I64).unwrap().reshape(&[3, 4]).unwrap();
//! let col = a.slice_str(":, 1:2").unwrap();
//! let b = col.broadcast_to(&[3, 3]).unwrap();
//! assert!(!b.is_writable());
//! assert_eq!(b.to_vec::<i64>(), vec![1, 1, 1, 5, 5, 5, 9, 9, 9]);
//! assert_eq!(sum(&b, Some(0), false).unwrap().to_vec::<i64>(), vec![15, 15, 15]);
//! ```

pub use ndstride_kernel::*;
pub use ndstride_traits::ParseDTypeError;
pub use ndstride_view::*;

pub use ndstride_kernel;
pub use ndstride_traits;
pub use ndstride_view;
