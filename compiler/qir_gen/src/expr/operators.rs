//! Unary and binary operators.
//!
//! Dispatch is on the static type of the left operand only: Int and Double
//! map to native instructions, BigInt to runtime calls, String and array
//! addition to concatenation. Logical `and`/`or` evaluate both operands.

use qir_ast::{BinaryOp, Span, Type, TypedExpr, UnaryOp};
use qir_ir::{BinOp, CastOp, FloatPredicate, Intrinsic, IntPredicate, IrType, RuntimeFn, Value};

use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::types::{count_class, CountClass};
use crate::value::LoweredValue;
use crate::{GenError, Result};

fn operator_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "^",
        BinaryOp::Shl => "<<<",
        BinaryOp::Shr => ">>>",
        BinaryOp::BitAnd => "&&&",
        BinaryOp::BitOr => "|||",
        BinaryOp::BitXor => "^^^",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
    }
}

/// Result of an operator before it is wrapped.
enum Lowered {
    /// Native value, nothing to register.
    Native(Value),
    /// Fresh heap value returned by the runtime.
    Fresh(Value),
}

impl GenerationContext<'_> {
    pub(super) fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: &TypedExpr,
        rhs: &TypedExpr,
        span: Span,
    ) -> Result<LoweredValue> {
        let left_ty = lhs.ty.clone();
        let left = self.lower_expr(lhs)?;
        let right = self.lower_expr(rhs)?;
        let (l, r) = (left.ir().clone(), right.ir().clone());
        let unsupported = || {
            GenError::unsupported(
                UnsupportedKind::OperandType {
                    op: operator_symbol(op),
                },
                span,
            )
        };

        let lowered = match (op, &left_ty) {
            // ── Arithmetic ──
            (BinaryOp::Add, Type::Int) => Lowered::Native(self.builder.binary(BinOp::Add, l, r)),
            (BinaryOp::Add, Type::Double) => {
                Lowered::Native(self.builder.binary(BinOp::FAdd, l, r))
            }
            (BinaryOp::Add, Type::BigInt) => self.bigint(RuntimeFn::BigIntAdd, l, r),
            (BinaryOp::Add, Type::String) => Lowered::Fresh(
                self.builder
                    .call_runtime_value(RuntimeFn::StringConcatenate, vec![l, r]),
            ),
            (BinaryOp::Add, Type::Array(item)) => {
                let raw = self
                    .builder
                    .call_runtime_value(RuntimeFn::ArrayConcatenate, vec![l, r]);
                let array = LoweredValue::from_ir(raw, Type::array((**item).clone()));
                self.own_items(&array)?;
                self.scopes.register_value(&array, false)?;
                return Ok(array);
            }
            (BinaryOp::Sub, Type::Int) => Lowered::Native(self.builder.binary(BinOp::Sub, l, r)),
            (BinaryOp::Sub, Type::Double) => {
                Lowered::Native(self.builder.binary(BinOp::FSub, l, r))
            }
            (BinaryOp::Sub, Type::BigInt) => self.bigint(RuntimeFn::BigIntSubtract, l, r),
            (BinaryOp::Mul, Type::Int) => Lowered::Native(self.builder.binary(BinOp::Mul, l, r)),
            (BinaryOp::Mul, Type::Double) => {
                Lowered::Native(self.builder.binary(BinOp::FMul, l, r))
            }
            (BinaryOp::Mul, Type::BigInt) => self.bigint(RuntimeFn::BigIntMultiply, l, r),
            (BinaryOp::Div, Type::Int) => Lowered::Native(self.builder.binary(BinOp::SDiv, l, r)),
            (BinaryOp::Div, Type::Double) => {
                Lowered::Native(self.builder.binary(BinOp::FDiv, l, r))
            }
            (BinaryOp::Div, Type::BigInt) => self.bigint(RuntimeFn::BigIntDivide, l, r),
            (BinaryOp::Mod, Type::Int) => Lowered::Native(self.builder.binary(BinOp::SRem, l, r)),
            (BinaryOp::Mod, Type::BigInt) => self.bigint(RuntimeFn::BigIntModulus, l, r),
            (BinaryOp::Pow, Type::Int) => {
                let exponent = self.builder.cast(CastOp::Trunc, r, IrType::I32);
                Lowered::Native(
                    self.builder
                        .call_runtime_value(RuntimeFn::IntPower, vec![l, exponent]),
                )
            }
            (BinaryOp::Pow, Type::Double) => {
                Lowered::Native(self.builder.call_intrinsic(Intrinsic::PowF64, vec![l, r]))
            }
            (BinaryOp::Pow, Type::BigInt) => {
                let exponent = self.builder.cast(CastOp::Trunc, r, IrType::I32);
                self.bigint(RuntimeFn::BigIntPower, l, exponent)
            }

            // ── Bits ──
            (BinaryOp::Shl, Type::Int) => Lowered::Native(self.builder.binary(BinOp::Shl, l, r)),
            (BinaryOp::Shl, Type::BigInt) => self.bigint(RuntimeFn::BigIntShiftLeft, l, r),
            (BinaryOp::Shr, Type::Int) => Lowered::Native(self.builder.binary(BinOp::AShr, l, r)),
            (BinaryOp::Shr, Type::BigInt) => self.bigint(RuntimeFn::BigIntShiftRight, l, r),
            (BinaryOp::BitAnd, Type::Int) | (BinaryOp::And, Type::Bool) => {
                Lowered::Native(self.builder.binary(BinOp::And, l, r))
            }
            (BinaryOp::BitAnd, Type::BigInt) => self.bigint(RuntimeFn::BigIntBitAnd, l, r),
            (BinaryOp::BitOr, Type::Int) | (BinaryOp::Or, Type::Bool) => {
                Lowered::Native(self.builder.binary(BinOp::Or, l, r))
            }
            (BinaryOp::BitOr, Type::BigInt) => self.bigint(RuntimeFn::BigIntBitOr, l, r),
            (BinaryOp::BitXor, Type::Int) => {
                Lowered::Native(self.builder.binary(BinOp::Xor, l, r))
            }
            (BinaryOp::BitXor, Type::BigInt) => self.bigint(RuntimeFn::BigIntBitXor, l, r),

            // ── Comparisons ──
            (BinaryOp::Eq | BinaryOp::NotEq, _) => {
                let equal = self
                    .equality(&left_ty, l, r, op == BinaryOp::Eq)
                    .ok_or_else(unsupported)?;
                Lowered::Native(equal)
            }
            (BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq, _) => {
                let ordered = self.ordering(op, &left_ty, l, r).ok_or_else(unsupported)?;
                Lowered::Native(ordered)
            }
            _ => return Err(unsupported()),
        };
        self.wrap_result(lowered, left_ty_for(op, left_ty))
    }

    pub(super) fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: &TypedExpr,
        span: Span,
    ) -> Result<LoweredValue> {
        let ty = operand.ty.clone();
        let value = self.lower_expr(operand)?.into_ir();
        let lowered = match (op, &ty) {
            (UnaryOp::Not, Type::Bool) => {
                Lowered::Native(self.builder.binary(BinOp::Xor, value, Value::bool(true)))
            }
            (UnaryOp::BitNot, Type::Int) => {
                Lowered::Native(self.builder.binary(BinOp::Xor, value, Value::int(-1)))
            }
            (UnaryOp::BitNot, Type::BigInt) => Lowered::Fresh(
                self.builder
                    .call_runtime_value(RuntimeFn::BigIntBitNot, vec![value]),
            ),
            (UnaryOp::Neg, Type::Int) => {
                Lowered::Native(self.builder.binary(BinOp::Sub, Value::int(0), value))
            }
            (UnaryOp::Neg, Type::Double) => Lowered::Native(self.builder.fneg(value)),
            (UnaryOp::Neg, Type::BigInt) => Lowered::Fresh(
                self.builder
                    .call_runtime_value(RuntimeFn::BigIntNegate, vec![value]),
            ),
            _ => {
                let op = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "not",
                    UnaryOp::BitNot => "~~~",
                };
                return Err(GenError::unsupported(
                    UnsupportedKind::OperandType { op },
                    span,
                ));
            }
        };
        self.wrap_result(lowered, ty)
    }

    fn bigint(&mut self, function: RuntimeFn, l: Value, r: Value) -> Lowered {
        Lowered::Fresh(self.builder.call_runtime_value(function, vec![l, r]))
    }

    fn wrap_result(&mut self, lowered: Lowered, ty: Type) -> Result<LoweredValue> {
        match lowered {
            Lowered::Native(value) => Ok(LoweredValue::from_ir(value, ty)),
            Lowered::Fresh(value) => {
                let value = LoweredValue::from_ir(value, ty);
                self.scopes.register_value(&value, false)?;
                Ok(value)
            }
        }
    }

    /// `==` (or `!=` when `equal` is false); `None` for types without equality.
    fn equality(&mut self, ty: &Type, l: Value, r: Value, equal: bool) -> Option<Value> {
        let negate_if_needed = |ctx: &mut Self, value: Value| {
            if equal {
                value
            } else {
                ctx.builder.binary(BinOp::Xor, value, Value::bool(true))
            }
        };
        match ty {
            Type::Result => {
                let value = self
                    .builder
                    .call_runtime_value(RuntimeFn::ResultEqual, vec![l, r]);
                Some(negate_if_needed(self, value))
            }
            Type::String => {
                let value = self
                    .builder
                    .call_runtime_value(RuntimeFn::StringEqual, vec![l, r]);
                Some(negate_if_needed(self, value))
            }
            Type::BigInt => {
                let value = self
                    .builder
                    .call_runtime_value(RuntimeFn::BigIntEqual, vec![l, r]);
                Some(negate_if_needed(self, value))
            }
            Type::Bool | Type::Int | Type::Qubit | Type::Pauli => {
                let pred = if equal {
                    IntPredicate::Eq
                } else {
                    IntPredicate::Ne
                };
                Some(self.builder.icmp(pred, l, r))
            }
            Type::Double => {
                let pred = if equal {
                    FloatPredicate::Oeq
                } else {
                    FloatPredicate::One
                };
                Some(self.builder.fcmp(pred, l, r))
            }
            _ => None,
        }
    }

    /// `<`, `<=`, `>`, `>=`; `None` for unordered types.
    fn ordering(&mut self, op: BinaryOp, ty: &Type, l: Value, r: Value) -> Option<Value> {
        match ty {
            Type::Int => {
                let pred = match op {
                    BinaryOp::Lt => IntPredicate::Slt,
                    BinaryOp::LtEq => IntPredicate::Sle,
                    BinaryOp::Gt => IntPredicate::Sgt,
                    _ => IntPredicate::Sge,
                };
                Some(self.builder.icmp(pred, l, r))
            }
            Type::Double => {
                let pred = match op {
                    BinaryOp::Lt => FloatPredicate::Olt,
                    BinaryOp::LtEq => FloatPredicate::Ole,
                    BinaryOp::Gt => FloatPredicate::Ogt,
                    _ => FloatPredicate::Oge,
                };
                Some(self.builder.fcmp(pred, l, r))
            }
            Type::BigInt => {
                // a < b is !(a >= b); a <= b is !(a > b)
                let (function, negate) = match op {
                    BinaryOp::Gt => (RuntimeFn::BigIntGreater, false),
                    BinaryOp::GtEq => (RuntimeFn::BigIntGreaterEq, false),
                    BinaryOp::Lt => (RuntimeFn::BigIntGreaterEq, true),
                    _ => (RuntimeFn::BigIntGreater, true),
                };
                let value = self.builder.call_runtime_value(function, vec![l, r]);
                Some(if negate {
                    self.builder.binary(BinOp::Xor, value, Value::bool(true))
                } else {
                    value
                })
            }
            _ => None,
        }
    }

    /// Give a fresh array built from borrowed items its own reference to each item.
    ///
    /// Concatenation and slicing copy item pointers without referencing them.
    pub(crate) fn own_items(&mut self, array: &LoweredValue) -> Result<()> {
        if array
            .array_item()
            .is_some_and(|item| count_class(item) != CountClass::None)
        {
            self.scopes.increase_reference_count(array, false)?;
            self.scopes.decrease_reference_count(array, true)?;
        }
        Ok(())
    }
}

/// Semantic type of an operator's result.
fn left_ty_for(op: BinaryOp, left: Type) -> Type {
    if op.is_comparison() {
        Type::Bool
    } else {
        left
    }
}
