//! Element-type tags and the fixed promotion table.

use std::fmt;
use std::str::FromStr;

/// Element-type tag carried by every storage buffer.
///
/// The discriminant doubles as the row/column index into [`PROMOTION_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DType {
    Bool = 0,
    U8 = 1,
    I16 = 2,
    U16 = 3,
    I32 = 4,
    U32 = 5,
    I64 = 6,
    U64 = 7,
    F32 = 8,
    F64 = 9,
}

/// Coarse classification used by promotion and kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeKind {
    Bool,
    Unsigned,
    Signed,
    Float,
}

use DType::{Bool, F32, F64, I16, I32, I64, U16, U32, U64, U8};

/// Array-with-array promotion, indexed `[lhs as usize][rhs as usize]`.
///
/// Rows and columns follow the declaration order of [`DType`].
const PROMOTION_TABLE: [[DType; 10]; 10] = [
    // Bool
    [Bool, U8, I16, U16, I32, U32, I64, U64, F32, F64],
    // U8
    [U8, U8, I16, U16, I32, U32, I64, U64, F32, F64],
    // I16
    [I16, I16, I16, I32, I32, I64, I64, F64, F32, F64],
    // U16
    [U16, U16, I32, U16, I32, U32, I64, U64, F32, F64],
    // I32
    [I32, I32, I32, I32, I32, I64, I64, F64, F64, F64],
    // U32
    [U32, U32, I64, U32, I64, U32, I64, U64, F64, F64],
    // I64
    [I64, I64, I64, I64, I64, I64, I64, F64, F64, F64],
    // U64
    [U64, U64, F64, U64, F64, U64, F64, U64, F64, F64],
    // F32
    [F32, F32, F32, F32, F64, F64, F64, F64, F32, F64],
    // F64
    [F64, F64, F64, F64, F64, F64, F64, F64, F64, F64],
];

impl DType {
    /// Every supported tag, in table order.
    pub const ALL: [DType; 10] = [Bool, U8, I16, U16, I32, U32, I64, U64, F32, F64];

    /// Element size in bytes.
    #[inline]
    pub const fn itemsize(self) -> usize {
        match self {
            Bool | U8 => 1,
            I16 | U16 => 2,
            I32 | U32 | F32 => 4,
            I64 | U64 | F64 => 8,
        }
    }

    #[inline]
    pub const fn kind(self) -> DTypeKind {
        match self {
            Bool => DTypeKind::Bool,
            U8 | U16 | U32 | U64 => DTypeKind::Unsigned,
            I16 | I32 | I64 => DTypeKind::Signed,
            F32 | F64 => DTypeKind::Float,
        }
    }

    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, Bool)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, F32 | F64)
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self.kind(),
            DTypeKind::Signed | DTypeKind::Unsigned
        )
    }

    /// NumPy-style name (`"float64"`, `"int32"`, `"bool"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Bool => "bool",
            U8 => "uint8",
            I16 => "int16",
            U16 => "uint16",
            I32 => "int32",
            U32 => "uint32",
            I64 => "int64",
            U64 => "uint64",
            F32 => "float32",
            F64 => "float64",
        }
    }

    /// Common type of two operands.
    ///
    /// Symmetric, idempotent, and `Bool` yields to every other tag.
    #[inline]
    pub const fn promote(self, other: DType) -> DType {
        PROMOTION_TABLE[self as usize][other as usize]
    }

    /// Fold [`DType::promote`] over a list. Returns `None` for an empty list.
    pub fn promote_all(dtypes: &[DType]) -> Option<DType> {
        let (first, rest) = dtypes.split_first()?;
        Some(rest.iter().fold(*first, |acc, &d| acc.promote(d)))
    }

    /// Accumulator type for `sum`/`prod`/`cumsum`.
    pub const fn sum_dtype(self) -> DType {
        match self.kind() {
            DTypeKind::Bool | DTypeKind::Signed => I64,
            DTypeKind::Unsigned => U64,
            DTypeKind::Float => self,
        }
    }

    /// Result type of float-valued kernels (`mean`, `sqrt`, true division).
    pub const fn float_dtype(self) -> DType {
        match self {
            F32 => F32,
            _ => F64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a dtype name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dtype name: {0:?}")]
pub struct ParseDTypeError(pub String);

impl FromStr for DType {
    type Err = ParseDTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let dtype = match name.as_str() {
            "bool" | "boolean" => Bool,
            "uint8" | "u8" | "byte" => U8,
            "int16" | "i16" => I16,
            "uint16" | "u16" => U16,
            "int32" | "i32" | "int" => I32,
            "uint32" | "u32" => U32,
            "int64" | "i64" | "long" => I64,
            "uint64" | "u64" => U64,
            "float32" | "f32" | "single" => F32,
            "float64" | "f64" | "double" | "float" => F64,
            _ => return Err(ParseDTypeError(s.to_string())),
        };
        Ok(dtype)
    }
}
