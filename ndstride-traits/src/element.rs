//! Typed element traits and the per-type conversion functions.
//!
//! [`Element`] is implemented for every dtype in the registry and is the
//! only place where a concrete Rust type is tied to a [`DType`] tag.
//! [`NumElement`] adds the arithmetic the kernels need for the nine numeric
//! types (everything except `bool`).

use std::fmt;

use num_traits::{Bounded, One, Zero};

use crate::dtype::DType;
use crate::scalar::Scalar;

/// A primitive that can live in a storage buffer.
pub trait Element:
    Copy + Default + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// Registry tag of this type.
    const DTYPE: DType;

    fn to_scalar(self) -> Scalar;

    /// Value-level conversion from any dtype.
    fn from_scalar(value: Scalar) -> Self;

    #[inline]
    fn is_nan(self) -> bool {
        false
    }
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    #[inline]
    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Self {
        value.as_bool()
    }
}

macro_rules! impl_int_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DTYPE: DType = DType::$variant;

                #[inline]
                fn to_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }

                #[inline]
                fn from_scalar(value: Scalar) -> Self {
                    match value {
                        Scalar::$variant(v) => v,
                        Scalar::F32(v) => v as $t,
                        Scalar::F64(v) => v as $t,
                        other => other.as_i128() as $t,
                    }
                }
            }
        )*
    };
}

impl_int_element!(
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
);

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_scalar(self) -> Scalar {
        Scalar::F32(self)
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Self {
        match value {
            Scalar::F32(v) => v,
            Scalar::F64(v) => v as f32,
            other => other.as_f64() as f32,
        }
    }

    #[inline]
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_scalar(self) -> Scalar {
        Scalar::F64(self)
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Self {
        match value {
            Scalar::F64(v) => v,
            Scalar::F32(v) => v as f64,
            Scalar::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            other => other.as_i128() as f64,
        }
    }

    #[inline]
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
}

/// Arithmetic over the numeric element types.
///
/// Integer operations wrap on overflow. Integer division and remainder by
/// zero yield zero. Remainder follows the sign of the divisor.
pub trait NumElement: Element + Zero + One + Bounded {
    fn plus(self, rhs: Self) -> Self;
    fn minus(self, rhs: Self) -> Self;
    fn times(self, rhs: Self) -> Self;
    fn divide(self, rhs: Self) -> Self;
    fn remainder(self, rhs: Self) -> Self;
    fn power(self, rhs: Self) -> Self;
    fn to_f64(self) -> f64;
    /// Saturating conversion; NaN maps to zero for integers.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_signed_num {
    ($($t:ty),* $(,)?) => {
        $(
            impl NumElement for $t {
                #[inline]
                fn plus(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                #[inline]
                fn minus(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }

                #[inline]
                fn times(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }

                #[inline]
                fn divide(self, rhs: Self) -> Self {
                    if rhs == 0 {
                        0
                    } else {
                        self.wrapping_div(rhs)
                    }
                }

                #[inline]
                fn remainder(self, rhs: Self) -> Self {
                    if rhs == 0 {
                        return 0;
                    }
                    let r = self.wrapping_rem(rhs);
                    if r != 0 && ((r < 0) != (rhs < 0)) {
                        r + rhs
                    } else {
                        r
                    }
                }

                #[inline]
                fn power(self, rhs: Self) -> Self {
                    if rhs < 0 {
                        0
                    } else {
                        self.wrapping_pow(u32::try_from(rhs).unwrap_or(u32::MAX))
                    }
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

macro_rules! impl_unsigned_num {
    ($($t:ty),* $(,)?) => {
        $(
            impl NumElement for $t {
                #[inline]
                fn plus(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                #[inline]
                fn minus(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }

                #[inline]
                fn times(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }

                #[inline]
                fn divide(self, rhs: Self) -> Self {
                    if rhs == 0 {
                        0
                    } else {
                        self / rhs
                    }
                }

                #[inline]
                fn remainder(self, rhs: Self) -> Self {
                    if rhs == 0 {
                        0
                    } else {
                        self % rhs
                    }
                }

                #[inline]
                fn power(self, rhs: Self) -> Self {
                    self.wrapping_pow(u32::try_from(rhs).unwrap_or(u32::MAX))
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

macro_rules! impl_float_num {
    ($($t:ty),* $(,)?) => {
        $(
            impl NumElement for $t {
                #[inline]
                fn plus(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline]
                fn minus(self, rhs: Self) -> Self {
                    self - rhs
                }

                #[inline]
                fn times(self, rhs: Self) -> Self {
                    self * rhs
                }

                #[inline]
                fn divide(self, rhs: Self) -> Self {
                    self / rhs
                }

                #[inline]
                fn remainder(self, rhs: Self) -> Self {
                    let r = self % rhs;
                    if r != 0.0 && ((r < 0.0) != (rhs < 0.0)) {
                        r + rhs
                    } else {
                        r
                    }
                }

                #[inline]
                fn power(self, rhs: Self) -> Self {
                    self.powf(rhs)
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

impl_signed_num!(i16, i32, i64);
impl_unsigned_num!(u8, u16, u32, u64);
impl_float_num!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_num_element<T: NumElement>() {}

    #[test]
    fn test_numeric_types_implement_num_element() {
        assert_num_element::<u8>();
        assert_num_element::<i16>();
        assert_num_element::<u64>();
        assert_num_element::<f32>();
        assert_num_element::<f64>();
    }

    #[test]
    fn test_dtype_tags() {
        assert_eq!(<bool as Element>::DTYPE, DType::Bool);
        assert_eq!(<u16 as Element>::DTYPE, DType::U16);
        assert_eq!(<f32 as Element>::DTYPE, DType::F32);
    }

    #[test]
    fn test_scalar_round_trip_preserves_value() {
        assert_eq!(i64::from_scalar(i64::MAX.to_scalar()), i64::MAX);
        assert_eq!(u64::from_scalar(u64::MAX.to_scalar()), u64::MAX);
        assert_eq!(f32::from_scalar(Scalar::I32(3)), 3.0);
        assert!(bool::from_scalar(Scalar::U8(2)));
    }

    #[test]
    fn test_wrapping_integer_arithmetic() {
        assert_eq!(250u8.plus(10), 4);
        assert_eq!(0u8.minus(1), 255);
        assert_eq!(i16::MAX.plus(1), i16::MIN);
    }

    #[test]
    fn test_integer_division_by_zero_is_zero() {
        assert_eq!(7i32.divide(0), 0);
        assert_eq!(7u32.remainder(0), 0);
        assert_eq!(i64::MIN.divide(-1), i64::MIN);
    }

    #[test]
    fn test_remainder_follows_divisor_sign() {
        assert_eq!((-7i32).remainder(3), 2);
        assert_eq!(7i32.remainder(-3), -2);
        assert_eq!((-7.5f64).remainder(2.0), 0.5);
    }

    #[test]
    fn test_power() {
        assert_eq!(3i64.power(4), 81);
        assert_eq!(2i32.power(-1), 0);
        assert_eq!(2u8.power(3), 8);
        assert_eq!(2.0f64.power(0.5), std::f64::consts::SQRT_2);
    }

    #[test]
    fn test_float_nan_detection() {
        assert!(f64::NAN.is_nan());
        assert!(Element::is_nan(f32::NAN));
        assert!(!Element::is_nan(1u8));
    }
}
