//! Arithmetic, comparison, and conversion instructions.
//!
//! Integer arithmetic wraps like the two's complement machine operations it
//! stands for. Division by zero is reported rather than trapping.

use qir_ir::{BinOp, CastOp, FloatPredicate, IntPredicate, IrType};

use crate::value::RtValue;
use crate::{EvalError, EvalResult};

pub(crate) fn binary(op: BinOp, lhs: &RtValue, rhs: &RtValue) -> EvalResult<RtValue> {
    match (lhs, rhs) {
        (RtValue::Int(a), RtValue::Int(b)) => int_binary(op, *a, *b).map(RtValue::Int),
        (RtValue::I32(a), RtValue::I32(b)) => {
            int_binary(op, i64::from(*a), i64::from(*b)).map(|n| RtValue::I32(wrap_i32(n)))
        }
        (RtValue::Bool(a), RtValue::Bool(b)) => match op {
            BinOp::And => Ok(RtValue::Bool(a & b)),
            BinOp::Or => Ok(RtValue::Bool(a | b)),
            BinOp::Xor => Ok(RtValue::Bool(a ^ b)),
            _ => Err(EvalError::mismatch("integer operands", &op)),
        },
        (RtValue::Double(a), RtValue::Double(b)) => match op {
            BinOp::FAdd => Ok(RtValue::Double(a + b)),
            BinOp::FSub => Ok(RtValue::Double(a - b)),
            BinOp::FMul => Ok(RtValue::Double(a * b)),
            BinOp::FDiv => Ok(RtValue::Double(a / b)),
            _ => Err(EvalError::mismatch("floating-point operator", &op)),
        },
        (RtValue::Undef, _) | (_, RtValue::Undef) => Err(EvalError::UndefinedValue),
        _ => Err(EvalError::mismatch("matching numeric operands", &(lhs, rhs))),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "i32 arithmetic keeps the low 32 bits"
)]
fn wrap_i32(n: i64) -> i32 {
    n as i32
}

fn int_binary(op: BinOp, a: i64, b: i64) -> EvalResult<i64> {
    Ok(match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::SDiv if b == 0 => return Err(EvalError::DivisionByZero),
        BinOp::SDiv => a.wrapping_div(b),
        BinOp::SRem if b == 0 => return Err(EvalError::DivisionByZero),
        BinOp::SRem => a.wrapping_rem(b),
        BinOp::Shl => u32::try_from(b)
            .ok()
            .and_then(|shift| a.checked_shl(shift))
            .unwrap_or(0),
        BinOp::AShr => {
            let shift = u32::try_from(b).map_or(63, |shift| shift.min(63));
            a >> shift
        }
        BinOp::And => a & b,
        BinOp::Or => a | b,
        BinOp::Xor => a ^ b,
        BinOp::FAdd | BinOp::FSub | BinOp::FMul | BinOp::FDiv => {
            return Err(EvalError::mismatch("integer operator", &op))
        }
    })
}

pub(crate) fn fneg(value: &RtValue) -> EvalResult<RtValue> {
    Ok(RtValue::Double(-value.as_double()?))
}

pub(crate) fn icmp(pred: IntPredicate, lhs: &RtValue, rhs: &RtValue) -> EvalResult<bool> {
    match pred {
        IntPredicate::Eq => identity_eq(lhs, rhs),
        IntPredicate::Ne => identity_eq(lhs, rhs).map(|eq| !eq),
        IntPredicate::Slt | IntPredicate::Sle | IntPredicate::Sgt | IntPredicate::Sge => {
            let (a, b) = match (lhs, rhs) {
                (RtValue::Int(a), RtValue::Int(b)) => (*a, *b),
                (RtValue::I32(a), RtValue::I32(b)) => (i64::from(*a), i64::from(*b)),
                (RtValue::Undef, _) | (_, RtValue::Undef) => return Err(EvalError::UndefinedValue),
                _ => return Err(EvalError::mismatch("integer operands", &(lhs, rhs))),
            };
            Ok(match pred {
                IntPredicate::Slt => a < b,
                IntPredicate::Sle => a <= b,
                IntPredicate::Sgt => a > b,
                _ => a >= b,
            })
        }
    }
}

/// Bitwise equality of integers, booleans, Paulis, and pointers.
fn identity_eq(lhs: &RtValue, rhs: &RtValue) -> EvalResult<bool> {
    match (lhs, rhs) {
        (RtValue::Undef, _) | (_, RtValue::Undef) => Err(EvalError::UndefinedValue),
        (RtValue::Double(_), _) | (_, RtValue::Double(_)) | (RtValue::Range(_), _) => {
            Err(EvalError::mismatch("integer or pointer operands", &(lhs, rhs)))
        }
        (RtValue::Int(_), RtValue::Int(_))
        | (RtValue::I32(_), RtValue::I32(_))
        | (RtValue::Bool(_), RtValue::Bool(_))
        | (RtValue::Pauli(_), RtValue::Pauli(_))
        | (RtValue::Result(_), RtValue::Result(_))
        | (RtValue::Qubit(_), RtValue::Qubit(_)) => Ok(lhs == rhs),
        (
            RtValue::Object(_) | RtValue::Null | RtValue::Ptr(_) | RtValue::Global(_),
            RtValue::Object(_) | RtValue::Null | RtValue::Ptr(_) | RtValue::Global(_),
        ) => Ok(lhs == rhs),
        (RtValue::Qubit(_), RtValue::Null) | (RtValue::Null, RtValue::Qubit(_)) => Ok(false),
        _ => Err(EvalError::mismatch("matching operands", &(lhs, rhs))),
    }
}

pub(crate) fn fcmp(pred: FloatPredicate, lhs: &RtValue, rhs: &RtValue) -> EvalResult<bool> {
    let (a, b) = (lhs.as_double()?, rhs.as_double()?);
    // Ordered: any NaN operand makes every predicate false.
    if a.is_nan() || b.is_nan() {
        return Ok(false);
    }
    Ok(match pred {
        FloatPredicate::Oeq => a == b,
        FloatPredicate::One => a != b,
        FloatPredicate::Olt => a < b,
        FloatPredicate::Ole => a <= b,
        FloatPredicate::Ogt => a > b,
        FloatPredicate::Oge => a >= b,
    })
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "casts follow the machine conversions they model"
)]
pub(crate) fn cast(op: CastOp, value: &RtValue, ty: &IrType) -> EvalResult<RtValue> {
    match (op, value) {
        (_, RtValue::Undef) => Err(EvalError::UndefinedValue),
        (CastOp::BitCast, value) => Ok(value.clone()),
        (CastOp::SiToFp, RtValue::Int(n)) => Ok(RtValue::Double(*n as f64)),
        (CastOp::SiToFp, RtValue::I32(n)) => Ok(RtValue::Double(f64::from(*n))),
        (CastOp::FpToSi, RtValue::Double(d)) => Ok(match ty {
            IrType::I32 => RtValue::I32(*d as i32),
            _ => RtValue::Int(*d as i64),
        }),
        (CastOp::ZExt, RtValue::Bool(b)) => Ok(match ty {
            IrType::I32 => RtValue::I32(i32::from(*b)),
            _ => RtValue::Int(i64::from(*b)),
        }),
        (CastOp::ZExt, RtValue::I32(n)) => Ok(RtValue::Int(i64::from(*n as u32))),
        (CastOp::Trunc, RtValue::Int(n)) => Ok(match ty {
            IrType::Bool => RtValue::Bool(n & 1 == 1),
            _ => RtValue::I32(*n as i32),
        }),
        (CastOp::Trunc, RtValue::I32(n)) if *ty == IrType::Bool => Ok(RtValue::Bool(n & 1 == 1)),
        _ => Err(EvalError::mismatch("convertible operand", &(op, value))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::ObjectId;

    #[test]
    fn remainder_takes_the_sign_of_the_dividend() {
        let rem = |a, b| binary(BinOp::SRem, &RtValue::Int(a), &RtValue::Int(b));
        assert_eq!(rem(7, 3), Ok(RtValue::Int(1)));
        assert_eq!(rem(-7, 3), Ok(RtValue::Int(-1)));
        assert_eq!(rem(7, 0), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let add = binary(BinOp::Add, &RtValue::Int(i64::MAX), &RtValue::Int(1));
        assert_eq!(add, Ok(RtValue::Int(i64::MIN)));
        let div = binary(BinOp::SDiv, &RtValue::Int(i64::MIN), &RtValue::Int(-1));
        assert_eq!(div, Ok(RtValue::Int(i64::MIN)));
    }

    #[test]
    fn shifts_saturate_past_the_width() {
        let shl = binary(BinOp::Shl, &RtValue::Int(1), &RtValue::Int(64));
        assert_eq!(shl, Ok(RtValue::Int(0)));
        let ashr = binary(BinOp::AShr, &RtValue::Int(-8), &RtValue::Int(100));
        assert_eq!(ashr, Ok(RtValue::Int(-1)));
    }

    #[test]
    fn logical_negation_is_xor_with_true() {
        let not = binary(BinOp::Xor, &RtValue::Bool(true), &RtValue::Bool(true));
        assert_eq!(not, Ok(RtValue::Bool(false)));
    }

    #[test]
    fn pointer_equality_is_identity() {
        let a = RtValue::Object(ObjectId::new(1));
        let b = RtValue::Object(ObjectId::new(2));
        assert_eq!(icmp(IntPredicate::Ne, &a, &b), Ok(true));
        assert_eq!(icmp(IntPredicate::Eq, &a, &a.clone()), Ok(true));
        assert_eq!(icmp(IntPredicate::Eq, &a, &RtValue::Null), Ok(false));
    }

    #[test]
    fn ordered_comparisons_reject_nan() {
        let nan = RtValue::Double(f64::NAN);
        assert_eq!(fcmp(FloatPredicate::Oeq, &nan, &nan), Ok(false));
        assert_eq!(fcmp(FloatPredicate::One, &nan, &RtValue::Double(1.0)), Ok(false));
        assert_eq!(
            fcmp(FloatPredicate::Ole, &RtValue::Double(1.0), &RtValue::Double(1.0)),
            Ok(true)
        );
    }

    #[test]
    fn conversions() {
        assert_eq!(
            cast(CastOp::FpToSi, &RtValue::Double(-2.7), &IrType::Int),
            Ok(RtValue::Int(-2))
        );
        assert_eq!(
            cast(CastOp::SiToFp, &RtValue::Int(3), &IrType::Double),
            Ok(RtValue::Double(3.0))
        );
        assert_eq!(
            cast(CastOp::Trunc, &RtValue::Int(0x1_0000_0005), &IrType::I32),
            Ok(RtValue::I32(5))
        );
        assert_eq!(
            cast(CastOp::ZExt, &RtValue::Bool(true), &IrType::Int),
            Ok(RtValue::Int(1))
        );
    }
}
