//! Per-axis slice notation and its application to a [`Shape`].

use std::fmt;
use std::str::FromStr;

use crate::shape::{normalize_axis, Shape};
use crate::{NdError, Result};

/// One entry of an index expression such as `x[1:3, ::-1, ..., 2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    /// A single position; the axis is dropped. Negative counts from the end.
    Index(isize),
    /// `start:stop:step`; missing bounds take NumPy defaults.
    Range {
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    },
    /// Insert a unit axis.
    NewAxis,
    /// Stands for as many `:` as needed to cover the remaining axes.
    Ellipsis,
}

/// A slice resolved against a concrete axis length.
///
/// An empty selection is normalized to `{ start: 0, step: 0, count: 0 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceDef {
    pub start: isize,
    pub step: isize,
    pub count: usize,
}

impl Slice {
    /// `:`
    pub const ALL: Slice = Slice::Range {
        start: None,
        stop: None,
        step: 1,
    };

    pub fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Slice {
        Slice::Range { start, stop, step }
    }

    /// `start:stop`
    pub fn range(start: isize, stop: isize) -> Slice {
        Slice::Range {
            start: Some(start),
            stop: Some(stop),
            step: 1,
        }
    }

    /// `::step`
    pub fn step(step: isize) -> Slice {
        Slice::Range {
            start: None,
            stop: None,
            step,
        }
    }

    /// Parse one entry. Whitespace anywhere is ignored.
    pub fn parse(text: &str) -> Result<Slice> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = || NdError::InvalidSlice(text.to_string());
        match compact.as_str() {
            "" => return Err(invalid()),
            "..." => return Ok(Slice::Ellipsis),
            "np.newaxis" | "newaxis" | "None" => return Ok(Slice::NewAxis),
            _ => {}
        }
        let parts: Vec<&str> = compact.split(':').collect();
        let bound = |part: &str| -> Result<Option<isize>> {
            if part.is_empty() {
                Ok(None)
            } else {
                part.parse::<isize>().map(Some).map_err(|_| invalid())
            }
        };
        match parts.as_slice() {
            [index] => Ok(Slice::Index(index.parse::<isize>().map_err(|_| invalid())?)),
            [start, stop] => Ok(Slice::Range {
                start: bound(start)?,
                stop: bound(stop)?,
                step: 1,
            }),
            [start, stop, step] => {
                let step = bound(step)?.unwrap_or(1);
                if step == 0 {
                    return Err(invalid());
                }
                Ok(Slice::Range {
                    start: bound(start)?,
                    stop: bound(stop)?,
                    step,
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Resolve against an axis of length `dim` with NumPy clamping.
    ///
    /// `NewAxis` and `Ellipsis` have no single-axis meaning and are
    /// rejected.
    pub fn to_slice_def(&self, dim: usize) -> Result<SliceDef> {
        match *self {
            Slice::Index(index) => {
                let start = index_in_axis(index, dim, 0)?;
                Ok(SliceDef {
                    start: start as isize,
                    step: 1,
                    count: 1,
                })
            }
            Slice::Range { start, stop, step } => range_def(start, stop, step, dim),
            Slice::NewAxis | Slice::Ellipsis => Err(NdError::InvalidSlice(format!(
                "`{}` does not select along a single axis",
                self
            ))),
        }
    }
}

fn index_in_axis(index: isize, dim: usize, axis: usize) -> Result<usize> {
    let normalized = if index < 0 { index + dim as isize } else { index };
    if normalized < 0 || normalized >= dim as isize {
        return Err(NdError::IndexOutOfBounds { axis, index, dim });
    }
    Ok(normalized as usize)
}

fn range_def(start: Option<isize>, stop: Option<isize>, step: isize, dim: usize) -> Result<SliceDef> {
    if step == 0 {
        return Err(NdError::InvalidSlice("slice step cannot be zero".to_string()));
    }
    let n = dim as isize;
    let backward = step < 0;
    let clamp = |bound: isize| -> isize {
        if bound < 0 {
            let b = bound + n;
            if b < 0 {
                if backward {
                    -1
                } else {
                    0
                }
            } else {
                b
            }
        } else if bound >= n {
            if backward {
                n - 1
            } else {
                n
            }
        } else {
            bound
        }
    };
    let start = match start {
        Some(s) => clamp(s),
        None if backward => n - 1,
        None => 0,
    };
    let stop = match stop {
        Some(s) => clamp(s),
        None if backward => -1,
        None => n,
    };
    let span = if backward { start - stop } else { stop - start };
    let count = if span > 0 {
        (span - 1) as usize / step.unsigned_abs() + 1
    } else {
        0
    };
    if count == 0 {
        return Ok(SliceDef {
            start: 0,
            step: 0,
            count: 0,
        });
    }
    Ok(SliceDef { start, step, count })
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slice::Index(i) => write!(f, "{}", i),
            Slice::NewAxis => f.write_str("np.newaxis"),
            Slice::Ellipsis => f.write_str("..."),
            Slice::Range { start, stop, step } => {
                if let Some(s) = start {
                    write!(f, "{}", s)?;
                }
                f.write_str(":")?;
                if let Some(s) = stop {
                    write!(f, "{}", s)?;
                }
                if *step != 1 {
                    write!(f, ":{}", step)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Slice {
    type Err = NdError;

    fn from_str(s: &str) -> Result<Slice> {
        Slice::parse(s)
    }
}

/// Parse a comma-separated index expression, e.g. `"1:3, ::-1, ..., 2"`.
pub fn parse_slices(text: &str) -> Result<Vec<Slice>> {
    text.split(',').map(Slice::parse).collect()
}

/// Inverse of [`parse_slices`].
pub fn format_slices(slices: &[Slice]) -> String {
    slices
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl Shape {
    /// Apply an index expression, producing a view shape.
    ///
    /// Missing trailing entries mean `:`. At most one `Ellipsis` is allowed.
    pub fn slice(&self, slices: &[Slice]) -> Result<Shape> {
        let ellipses = slices.iter().filter(|s| matches!(s, Slice::Ellipsis)).count();
        if ellipses > 1 {
            return Err(NdError::InvalidSlice(
                "an index can only have a single ellipsis".to_string(),
            ));
        }
        let consuming = slices
            .iter()
            .filter(|s| matches!(s, Slice::Index(_) | Slice::Range { .. }))
            .count();
        if consuming > self.ndim() {
            return Err(NdError::InvalidSlice(format!(
                "too many indices: {} for rank {}",
                consuming,
                self.ndim()
            )));
        }

        let mut dims = Vec::with_capacity(self.ndim() + slices.len());
        let mut strides = Vec::with_capacity(self.ndim() + slices.len());
        let mut offset = self.offset() as isize;
        let mut axis = 0usize;
        for slice in slices {
            match *slice {
                Slice::Ellipsis => {
                    let covered = self.ndim() - consuming;
                    for _ in 0..covered {
                        dims.push(self.dims()[axis]);
                        strides.push(self.strides()[axis]);
                        axis += 1;
                    }
                }
                Slice::NewAxis => {
                    dims.push(1);
                    strides.push(1);
                }
                Slice::Index(index) => {
                    let pos = index_in_axis(index, self.dims()[axis], axis)?;
                    offset += pos as isize * self.strides()[axis];
                    axis += 1;
                }
                Slice::Range { start, stop, step } => {
                    let def = range_def(start, stop, step, self.dims()[axis])?;
                    let stride = self.strides()[axis];
                    if def.count > 0 {
                        offset += def.start * stride;
                    }
                    // a single selected element never advances along the axis
                    if def.count > 1 {
                        let stepped = stride.checked_mul(def.step).ok_or(NdError::OffsetOverflow)?;
                        strides.push(stepped);
                    } else {
                        strides.push(stride);
                    }
                    dims.push(def.count);
                    axis += 1;
                }
            }
        }
        for a in axis..self.ndim() {
            dims.push(self.dims()[a]);
            strides.push(self.strides()[a]);
        }
        Ok(Shape::from_parts(dims, strides, offset as usize))
    }

    /// Select a single position along `axis`, dropping it.
    pub fn index_axis(&self, axis: isize, index: isize) -> Result<Shape> {
        let axis = normalize_axis(axis, self.ndim())?;
        let mut slices = vec![Slice::ALL; axis];
        slices.push(Slice::Index(index));
        self.slice(&slices)
    }
}
