//! Broadcast resolution.
//!
//! Shapes are aligned from the trailing axis. Two extents are compatible if
//! they are equal or one of them is 1. Stretched and prepended axes get
//! stride 0, so a broadcast operand resolves offsets exactly like any other
//! shape.

use log::trace;

use crate::shape::Shape;
use crate::{NdError, Result};

/// Output dims of broadcasting `a` against `b`.
///
/// Symmetric: `broadcast_dims(a, b)` and `broadcast_dims(b, a)` accept the
/// same pairs and return the same dims.
pub fn broadcast_dims(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0usize; ndim];
    for i in 0..ndim {
        let da = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let db = if i < b.len() { b[b.len() - 1 - i] } else { 1 };
        out[ndim - 1 - i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(NdError::ShapeMismatch {
                lhs: a.to_vec(),
                rhs: b.to_vec(),
            });
        };
    }
    Ok(out)
}

/// Result of broadcasting several operands together.
#[derive(Debug, Clone)]
pub struct Broadcast {
    /// Contiguous shape of the common output.
    pub output: Shape,
    /// Each input re-expressed with the output's dims.
    pub operands: Vec<Shape>,
}

impl Broadcast {
    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.output.dims()
    }
}

/// Broadcast any number of shapes by pairwise reduction of their dims.
pub fn broadcast_shapes(shapes: &[&Shape]) -> Result<Broadcast> {
    let (first, rest) = shapes.split_first().ok_or(NdError::EmptyInput("broadcast"))?;
    let mut dims = first.dims().to_vec();
    for shape in rest {
        dims = broadcast_dims(&dims, shape.dims())?;
    }
    let operands = shapes
        .iter()
        .map(|s| s.broadcast_to(&dims))
        .collect::<Result<Vec<_>>>()?;
    trace!("broadcast {} operands to {:?}", shapes.len(), dims);
    Ok(Broadcast {
        output: Shape::new(&dims),
        operands,
    })
}

impl Shape {
    /// One-directional broadcast to `target`.
    ///
    /// Rejects a source with more axes than the target and any source axis
    /// whose extent is neither 1 nor the target extent.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Shape> {
        let mismatch = || NdError::ShapeMismatch {
            lhs: self.dims().to_vec(),
            rhs: target.to_vec(),
        };
        if self.ndim() > target.len() {
            return Err(mismatch());
        }
        let lead = target.len() - self.ndim();
        let mut strides = vec![0isize; target.len()];
        for (i, (&dim, &stride)) in self.dims().iter().zip(self.strides().iter()).enumerate() {
            let want = target[lead + i];
            if dim == want {
                strides[lead + i] = stride;
            } else if dim != 1 {
                return Err(mismatch());
            }
        }
        Ok(Shape::from_parts(target.to_vec(), strides, self.offset()))
    }
}
