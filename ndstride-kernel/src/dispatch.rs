//! Operation catalogue and dtype resolution.
//!
//! Every elementwise kernel asks this module which dtype to compute in and
//! which dtype to store. Operands are converted by value into the compute
//! dtype before the kernel runs; bytes are never reinterpreted.

use std::fmt;

use log::debug;
use ndstride_view::{DType, NdError, Result};

// ============================================================================
// Operations
// ============================================================================

/// Binary elementwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    /// True division; integer operands produce floats.
    Divide,
    /// Remainder with the sign of the divisor.
    Remainder,
    Power,
    Maximum,
    Minimum,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOp {
    pub const fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
            BinaryOp::Remainder => "remainder",
            BinaryOp::Power => "power",
            BinaryOp::Maximum => "maximum",
            BinaryOp::Minimum => "minimum",
            BinaryOp::Equal => "equal",
            BinaryOp::NotEqual => "not_equal",
            BinaryOp::Less => "less",
            BinaryOp::LessEqual => "less_equal",
            BinaryOp::Greater => "greater",
            BinaryOp::GreaterEqual => "greater_equal",
            BinaryOp::LogicalAnd => "logical_and",
            BinaryOp::LogicalOr => "logical_or",
        }
    }

    /// Comparisons produce `bool` from operands of any dtype.
    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    #[inline]
    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unary elementwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negative,
    Abs,
    Sqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Square,
    LogicalNot,
}

impl UnaryOp {
    pub const fn name(self) -> &'static str {
        match self {
            UnaryOp::Negative => "negative",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Square => "square",
            UnaryOp::LogicalNot => "logical_not",
        }
    }

    /// Transcendental ops that always compute in a float dtype.
    #[inline]
    pub const fn is_float_only(self) -> bool {
        matches!(
            self,
            UnaryOp::Sqrt | UnaryOp::Exp | UnaryOp::Log | UnaryOp::Sin | UnaryOp::Cos
        )
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Dtypes chosen for one kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelDecision {
    /// Both operands are converted to this dtype before the kernel runs.
    pub compute: DType,
    /// Dtype of the result array.
    pub output: DType,
}

impl KernelDecision {
    #[inline]
    const fn same(dtype: DType) -> Self {
        Self {
            compute: dtype,
            output: dtype,
        }
    }
}

/// Pick the compute and output dtypes of `op` for operands `lhs` and `rhs`.
///
/// `bool` supports `Add` (or), `Multiply` (and), `Maximum`/`Minimum`,
/// comparisons and logical ops; `Subtract`, `Remainder` and `Power` on two
/// bools are [`NdError::UnsupportedDtype`].
pub fn resolve_binary(op: BinaryOp, lhs: DType, rhs: DType) -> Result<KernelDecision> {
    let promoted = lhs.promote(rhs);
    let decision = match op {
        BinaryOp::Subtract | BinaryOp::Remainder | BinaryOp::Power if promoted.is_bool() => {
            return Err(NdError::UnsupportedDtype {
                op: op.name(),
                dtypes: vec![lhs, rhs],
            });
        }
        BinaryOp::Divide => KernelDecision::same(promoted.float_dtype()),
        _ if op.is_comparison() => KernelDecision {
            compute: promoted,
            output: DType::Bool,
        },
        _ if op.is_logical() => KernelDecision::same(DType::Bool),
        _ => KernelDecision::same(promoted),
    };
    debug!(
        "dispatch {} ({}, {}) -> compute {} output {}",
        op, lhs, rhs, decision.compute, decision.output
    );
    Ok(decision)
}

/// Pick the compute and output dtypes of `op` for an operand of `dtype`.
pub fn resolve_unary(op: UnaryOp, dtype: DType) -> Result<KernelDecision> {
    let decision = match op {
        UnaryOp::Negative if dtype.is_bool() => {
            return Err(NdError::UnsupportedDtype {
                op: op.name(),
                dtypes: vec![dtype],
            });
        }
        _ if op.is_float_only() => KernelDecision::same(dtype.float_dtype()),
        UnaryOp::LogicalNot => KernelDecision::same(DType::Bool),
        _ => KernelDecision::same(dtype),
    };
    debug!(
        "dispatch {} ({}) -> compute {} output {}",
        op, dtype, decision.compute, decision.output
    );
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_promotes() {
        let d = resolve_binary(BinaryOp::Add, DType::I32, DType::F64).unwrap();
        assert_eq!(d, KernelDecision::same(DType::F64));
        let d = resolve_binary(BinaryOp::Multiply, DType::U8, DType::I16).unwrap();
        assert_eq!(d.output, DType::I16);
    }

    #[test]
    fn test_divide_is_true_division() {
        let d = resolve_binary(BinaryOp::Divide, DType::I32, DType::I32).unwrap();
        assert_eq!(d, KernelDecision::same(DType::F64));
        let d = resolve_binary(BinaryOp::Divide, DType::F32, DType::Bool).unwrap();
        assert_eq!(d.output, DType::F32);
    }

    #[test]
    fn test_comparisons_output_bool() {
        let d = resolve_binary(BinaryOp::Less, DType::I64, DType::F32).unwrap();
        assert_eq!(d.compute, DType::F64);
        assert_eq!(d.output, DType::Bool);
    }

    #[test]
    fn test_logical_ops_compute_in_bool() {
        let d = resolve_binary(BinaryOp::LogicalOr, DType::F64, DType::I16).unwrap();
        assert_eq!(d, KernelDecision::same(DType::Bool));
    }

    #[test]
    fn test_bool_rules() {
        assert_eq!(
            resolve_binary(BinaryOp::Add, DType::Bool, DType::Bool).unwrap().output,
            DType::Bool
        );
        for op in [BinaryOp::Subtract, BinaryOp::Remainder, BinaryOp::Power] {
            assert!(matches!(
                resolve_binary(op, DType::Bool, DType::Bool),
                Err(NdError::UnsupportedDtype { .. })
            ));
        }
        // bool mixed with a number takes the number's dtype
        assert_eq!(
            resolve_binary(BinaryOp::Subtract, DType::Bool, DType::U16).unwrap().output,
            DType::U16
        );
    }

    #[test]
    fn test_unary_rules() {
        assert_eq!(
            resolve_unary(UnaryOp::Sqrt, DType::I32).unwrap().output,
            DType::F64
        );
        assert_eq!(
            resolve_unary(UnaryOp::Exp, DType::F32).unwrap().output,
            DType::F32
        );
        assert_eq!(
            resolve_unary(UnaryOp::Abs, DType::I16).unwrap().output,
            DType::I16
        );
        assert_eq!(
            resolve_unary(UnaryOp::LogicalNot, DType::F64).unwrap().output,
            DType::Bool
        );
        assert!(matches!(
            resolve_unary(UnaryOp::Negative, DType::Bool),
            Err(NdError::UnsupportedDtype { op: "negative", .. })
        ));
    }
}
