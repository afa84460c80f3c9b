//! Arbitrary-precision integers.

use num_bigint::BigInt;
use num_traits::{Pow, Zero};
use qir_ir::{GlobalKind, RuntimeFn};

use super::{arg, object_arg};
use crate::heap::ObjectKind;
use crate::interpreter::Interpreter;
use crate::value::RtValue;
use crate::{EvalError, EvalResult};

impl Interpreter<'_> {
    fn big_int_arg(&self, args: &[RtValue], index: usize) -> EvalResult<&BigInt> {
        self.heap.big_int(object_arg(args, index)?)
    }

    /// Shift amount argument; shifts by a negative amount fail.
    fn shift_arg(args: &[RtValue], index: usize) -> EvalResult<usize> {
        let amount = arg(args, index)?.as_int()?;
        usize::try_from(amount).map_err(|_| EvalError::fail("negative shift amount"))
    }

    pub(super) fn big_int_op(
        &mut self,
        function: RuntimeFn,
        args: &[RtValue],
    ) -> EvalResult<RtValue> {
        let value = match function {
            RuntimeFn::BigIntCreateI64 => BigInt::from(arg(args, 0)?.as_int()?),
            RuntimeFn::BigIntCreateArray => self.big_int_literal(args)?,
            RuntimeFn::BigIntNegate => -self.big_int_arg(args, 0)?,
            RuntimeFn::BigIntBitNot => !self.big_int_arg(args, 0)?,
            RuntimeFn::BigIntAdd => self.big_int_arg(args, 0)? + self.big_int_arg(args, 1)?,
            RuntimeFn::BigIntSubtract => self.big_int_arg(args, 0)? - self.big_int_arg(args, 1)?,
            RuntimeFn::BigIntMultiply => self.big_int_arg(args, 0)? * self.big_int_arg(args, 1)?,
            RuntimeFn::BigIntDivide | RuntimeFn::BigIntModulus => {
                let divisor = self.big_int_arg(args, 1)?;
                if divisor.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                let dividend = self.big_int_arg(args, 0)?;
                if function == RuntimeFn::BigIntDivide {
                    dividend / divisor
                } else {
                    dividend % divisor
                }
            }
            RuntimeFn::BigIntPower => {
                let exponent = u32::try_from(arg(args, 1)?.as_i32()?)
                    .map_err(|_| EvalError::fail("negative exponent in big integer power"))?;
                Pow::pow(self.big_int_arg(args, 0)?, exponent)
            }
            RuntimeFn::BigIntBitAnd => self.big_int_arg(args, 0)? & self.big_int_arg(args, 1)?,
            RuntimeFn::BigIntBitOr => self.big_int_arg(args, 0)? | self.big_int_arg(args, 1)?,
            RuntimeFn::BigIntBitXor => self.big_int_arg(args, 0)? ^ self.big_int_arg(args, 1)?,
            RuntimeFn::BigIntShiftLeft => self.big_int_arg(args, 0)? << Self::shift_arg(args, 1)?,
            RuntimeFn::BigIntShiftRight => self.big_int_arg(args, 0)? >> Self::shift_arg(args, 1)?,
            RuntimeFn::BigIntEqual => {
                return Ok(RtValue::Bool(
                    self.big_int_arg(args, 0)? == self.big_int_arg(args, 1)?,
                ));
            }
            RuntimeFn::BigIntGreater => {
                return Ok(RtValue::Bool(
                    self.big_int_arg(args, 0)? > self.big_int_arg(args, 1)?,
                ));
            }
            RuntimeFn::BigIntGreaterEq => {
                return Ok(RtValue::Bool(
                    self.big_int_arg(args, 0)? >= self.big_int_arg(args, 1)?,
                ));
            }
            other => return Err(EvalError::mismatch("big integer function", &other)),
        };
        Ok(RtValue::Object(self.heap.allocate(ObjectKind::BigInt(value))))
    }

    /// `bigint_create_array`: little-endian two's complement bytes of a global.
    fn big_int_literal(&self, args: &[RtValue]) -> EvalResult<BigInt> {
        let length = usize::try_from(arg(args, 0)?.as_i32()?)
            .map_err(|_| EvalError::mismatch("byte count", &args))?;
        let global = arg(args, 1)?
            .as_global()?
            .ok_or_else(|| EvalError::mismatch("byte array", &RtValue::Null))?;
        match &self.module().global(global).kind {
            GlobalKind::Bytes(bytes) if bytes.len() >= length => {
                Ok(BigInt::from_signed_bytes_le(&bytes[..length]))
            }
            other => Err(EvalError::mismatch("byte array", other)),
        }
    }
}
