//! Dynamically-typed single element values.

use std::fmt;

use crate::dtype::DType;
use crate::element::Element;

/// One element of any supported dtype.
///
/// `Scalar` is the currency between dynamically typed arrays and typed
/// kernels. Conversions between variants are value-level (see
/// [`Scalar::cast`]); bytes are never reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// Tag of the held value.
    pub const fn dtype(&self) -> DType {
        match self {
            Scalar::Bool(_) => DType::Bool,
            Scalar::U8(_) => DType::U8,
            Scalar::I16(_) => DType::I16,
            Scalar::U16(_) => DType::U16,
            Scalar::I32(_) => DType::I32,
            Scalar::U32(_) => DType::U32,
            Scalar::I64(_) => DType::I64,
            Scalar::U64(_) => DType::U64,
            Scalar::F32(_) => DType::F32,
            Scalar::F64(_) => DType::F64,
        }
    }

    /// Zero of the given dtype (`false` for bool).
    pub fn zero(dtype: DType) -> Scalar {
        Scalar::I64(0).cast(dtype)
    }

    /// One of the given dtype (`true` for bool).
    pub fn one(dtype: DType) -> Scalar {
        Scalar::I64(1).cast(dtype)
    }

    /// Integral view of the value; floats truncate toward zero and saturate.
    pub fn as_i128(self) -> i128 {
        match self {
            Scalar::Bool(v) => v as i128,
            Scalar::U8(v) => v as i128,
            Scalar::I16(v) => v as i128,
            Scalar::U16(v) => v as i128,
            Scalar::I32(v) => v as i128,
            Scalar::U32(v) => v as i128,
            Scalar::I64(v) => v as i128,
            Scalar::U64(v) => v as i128,
            Scalar::F32(v) => v as i128,
            Scalar::F64(v) => v as i128,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::U8(v) => v as f64,
            Scalar::I16(v) => v as f64,
            Scalar::U16(v) => v as f64,
            Scalar::I32(v) => v as f64,
            Scalar::U32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
        }
    }

    /// Truthiness: nonzero numbers are `true`, NaN included.
    pub fn as_bool(self) -> bool {
        match self {
            Scalar::Bool(v) => v,
            Scalar::F32(v) => v != 0.0,
            Scalar::F64(v) => v != 0.0,
            other => other.as_i128() != 0,
        }
    }

    pub fn is_nan(self) -> bool {
        match self {
            Scalar::F32(v) => v.is_nan(),
            Scalar::F64(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Value-level conversion to `dtype`.
    pub fn cast(self, dtype: DType) -> Scalar {
        match dtype {
            DType::Bool => Scalar::Bool(bool::from_scalar(self)),
            DType::U8 => Scalar::U8(u8::from_scalar(self)),
            DType::I16 => Scalar::I16(i16::from_scalar(self)),
            DType::U16 => Scalar::U16(u16::from_scalar(self)),
            DType::I32 => Scalar::I32(i32::from_scalar(self)),
            DType::U32 => Scalar::U32(u32::from_scalar(self)),
            DType::I64 => Scalar::I64(i64::from_scalar(self)),
            DType::U64 => Scalar::U64(u64::from_scalar(self)),
            DType::F32 => Scalar::F32(f32::from_scalar(self)),
            DType::F64 => Scalar::F64(f64::from_scalar(self)),
        }
    }

    /// Typed extraction with value-level conversion.
    #[inline]
    pub fn to<T: Element>(self) -> T {
        T::from_scalar(self)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(true) => f.write_str("True"),
            Scalar::Bool(false) => f.write_str("False"),
            Scalar::U8(v) => write!(f, "{}", v),
            Scalar::I16(v) => write!(f, "{}", v),
            Scalar::U16(v) => write!(f, "{}", v),
            Scalar::I32(v) => write!(f, "{}", v),
            Scalar::U32(v) => write!(f, "{}", v),
            Scalar::I64(v) => write!(f, "{}", v),
            Scalar::U64(v) => write!(f, "{}", v),
            Scalar::F32(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{:?}", v),
            },
            Scalar::F64(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{:?}", v),
            },
        }
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Scalar {
                #[inline]
                fn from(v: $t) -> Self {
                    Scalar::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive!(
    bool => Bool,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_of_variants() {
        assert_eq!(Scalar::from(1.5f32).dtype(), DType::F32);
        assert_eq!(Scalar::from(true).dtype(), DType::Bool);
        assert_eq!(Scalar::from(7u64).dtype(), DType::U64);
    }

    #[test]
    fn test_cast_int_to_float_by_value() {
        assert_eq!(Scalar::I32(-3).cast(DType::F64), Scalar::F64(-3.0));
        assert_eq!(Scalar::U64(u64::MAX).cast(DType::U64), Scalar::U64(u64::MAX));
        assert_eq!(Scalar::I64(i64::MIN).cast(DType::I64), Scalar::I64(i64::MIN));
    }

    #[test]
    fn test_cast_float_to_int_truncates() {
        assert_eq!(Scalar::F64(2.9).cast(DType::I32), Scalar::I32(2));
        assert_eq!(Scalar::F64(-2.9).cast(DType::I64), Scalar::I64(-2));
        assert_eq!(Scalar::F64(1e10).cast(DType::U8), Scalar::U8(u8::MAX));
    }

    #[test]
    fn test_cast_bool() {
        assert_eq!(Scalar::F64(0.0).cast(DType::Bool), Scalar::Bool(false));
        assert_eq!(Scalar::F64(f64::NAN).cast(DType::Bool), Scalar::Bool(true));
        assert_eq!(Scalar::I16(-1).cast(DType::Bool), Scalar::Bool(true));
        assert_eq!(Scalar::Bool(true).cast(DType::F32), Scalar::F32(1.0));
        assert_eq!(Scalar::Bool(true).cast(DType::U16), Scalar::U16(1));
    }

    #[test]
    fn test_zero_and_one() {
        assert_eq!(Scalar::zero(DType::Bool), Scalar::Bool(false));
        assert_eq!(Scalar::one(DType::F64), Scalar::F64(1.0));
        assert_eq!(Scalar::one(DType::U8), Scalar::U8(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Scalar::F64(1.0).to_string(), "1.0");
        assert_eq!(format!("{:.2}", Scalar::F64(1.0)), "1.00");
        assert_eq!(Scalar::I32(-4).to_string(), "-4");
        assert_eq!(Scalar::Bool(false).to_string(), "False");
        assert_eq!(format!("{:.3}", Scalar::Bool(true)), "True");
    }
}
