//! Text rendering of arrays.
//!
//! Rendering walks generated coordinates and reads every element through
//! [`Shape::resolve`](crate::Shape::resolve), so broadcast and sliced views
//! print the values they actually expose.

use std::fmt;
use std::fmt::Write as _;

use crate::array::NdArray;
use crate::storage::Buffer;

/// Rendering options, passed explicitly per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    /// Digits after the decimal point for floats; `None` prints the shortest
    /// exact form.
    pub precision: Option<usize>,
    /// Arrays with more elements than this are summarized.
    pub threshold: usize,
    /// Leading and trailing items kept per axis when summarizing.
    pub edge_items: usize,
    pub separator: String,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            precision: None,
            threshold: 1000,
            edge_items: 3,
            separator: ", ".to_string(),
        }
    }
}

struct Renderer<'a> {
    array: &'a NdArray,
    buffer: &'a Buffer,
    opts: &'a PrintOptions,
    summarize: bool,
}

impl Renderer<'_> {
    fn element(&self, coords: &[usize], out: &mut String) {
        let value = self.buffer.get(self.array.shape().resolve(coords));
        // writing into a String cannot fail
        let _ = match self.opts.precision {
            Some(p) => write!(out, "{:.*}", p, value),
            None => write!(out, "{}", value),
        };
    }

    /// Positions shown along an axis of length `dim`; `None` marks the gap.
    fn positions(&self, dim: usize) -> Vec<Option<usize>> {
        let edge = self.opts.edge_items;
        if self.summarize && dim > 2 * edge {
            (0..edge)
                .map(Some)
                .chain(std::iter::once(None))
                .chain((dim - edge..dim).map(Some))
                .collect()
        } else {
            (0..dim).map(Some).collect()
        }
    }

    fn axis(&self, coords: &mut Vec<usize>, out: &mut String) {
        let depth = coords.len();
        let ndim = self.array.ndim();
        let dim = self.array.dims()[depth];
        out.push('[');
        let last_axis = depth + 1 == ndim;
        let between = if last_axis {
            self.opts.separator.clone()
        } else {
            let blank_lines = "\n".repeat(ndim - depth - 1);
            format!("{}{}", self.opts.separator.trim_end(), blank_lines)
                + &" ".repeat(depth + 1)
        };
        for (i, pos) in self.positions(dim).into_iter().enumerate() {
            if i > 0 {
                out.push_str(&between);
            }
            match pos {
                None => out.push_str("..."),
                Some(p) => {
                    coords.push(p);
                    if last_axis {
                        self.element(coords, out);
                    } else {
                        self.axis(coords, out);
                    }
                    coords.pop();
                }
            }
        }
        out.push(']');
    }
}

impl NdArray {
    /// Render with explicit options.
    pub fn display_with(&self, opts: &PrintOptions) -> String {
        let buffer = self.storage().read();
        let renderer = Renderer {
            array: self,
            buffer: &buffer,
            opts,
            summarize: self.size() > opts.threshold,
        };
        let mut out = String::new();
        if self.ndim() == 0 {
            renderer.element(&[], &mut out);
        } else if self.is_empty() {
            out.push_str("[]");
        } else {
            renderer.axis(&mut Vec::with_capacity(self.ndim()), &mut out);
        }
        out
    }
}

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opts = PrintOptions {
            precision: f.precision(),
            ..PrintOptions::default()
        };
        f.write_str(&self.display_with(&opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creation::{arange, from_scalar, from_vec, zeros};
    use ndstride_traits::DType;

    #[test]
    fn test_display_scalar_and_vector() {
        assert_eq!(from_scalar(4i32).to_string(), "4");
        let v = from_vec(vec![1i64, 2, 3], &[3]).unwrap();
        assert_eq!(v.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_display_matrix_rows() {
        let m = from_vec(vec![1i32, 2, 3, 4], &[2, 2]).unwrap();
        assert_eq!(m.to_string(), "[[1, 2],\n [3, 4]]");
    }

    #[test]
    fn test_display_3d_separates_blocks() {
        let a = arange(0.0, 8.0, 1.0, DType::I32)
            .unwrap()
            .reshape(&[2, 2, 2])
            .unwrap();
        assert_eq!(a.to_string(), "[[[0, 1],\n  [2, 3]],\n\n [[4, 5],\n  [6, 7]]]");
    }

    #[test]
    fn test_display_bool() {
        let b = from_vec(vec![true, false, true, true], &[2, 2]).unwrap();
        assert_eq!(b.to_string(), "[[True, False],\n [True, True]]");
        assert_eq!(from_scalar(false).to_string(), "False");
    }

    #[test]
    fn test_display_empty() {
        assert_eq!(zeros(DType::F64, &[0]).to_string(), "[]");
        assert_eq!(zeros(DType::F64, &[2, 0]).to_string(), "[]");
    }

    #[test]
    fn test_display_float_precision() {
        let v = from_vec(vec![1.0f64, 0.126], &[2]).unwrap();
        assert_eq!(v.to_string(), "[1.0, 0.126]");
        assert_eq!(format!("{:.2}", v), "[1.00, 0.13]");
    }

    #[test]
    fn test_display_reads_through_views() {
        let v = from_vec(vec![0i32, 1, 2], &[3]).unwrap();
        let r = v.slice_str("::-1").unwrap().broadcast_to(&[2, 3]).unwrap();
        assert_eq!(r.to_string(), "[[2, 1, 0],\n [2, 1, 0]]");
    }

    #[test]
    fn test_display_summarizes_large_arrays() {
        let a = arange(0.0, 20.0, 1.0, DType::I64).unwrap();
        let opts = PrintOptions {
            threshold: 10,
            edge_items: 2,
            ..PrintOptions::default()
        };
        assert_eq!(a.display_with(&opts), "[0, 1, ..., 18, 19]");
        let small = PrintOptions {
            threshold: 100,
            ..opts
        };
        assert!(!a.display_with(&small).contains("..."));
    }
}
