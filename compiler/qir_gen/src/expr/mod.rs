//! Expression lowering.
//!
//! [`GenerationContext::lower_expr`] turns one typed expression into a
//! [`LoweredValue`]. Heap values an expression creates are registered with
//! the innermost scope; values reached through variables are borrowed and
//! never registered again.
//!
//! # Layout
//!
//! - `literals`: numbers, ranges, tuples, arrays, default values
//! - `strings`: string constants and interpolation
//! - `operators`: unary and binary operators, dispatched on the left operand
//! - `items`: item access, slicing, unwrap, copy-and-update
//! - `calls`: direct calls, target instructions, inlining, callable values
//! - `partial`: partial application and lifted closures
//! - `functors`: adjoint and controlled application on values
//! - `builtins`: functions lowered to instructions instead of calls

mod builtins;
mod calls;
mod functors;
mod items;
mod literals;
mod operators;
mod partial;
mod strings;

use qir_ast::{ExprKind, Identifier, Name, ResultValue, Span, Type, TypedExpr};
use qir_ir::{Constant, Value};
use qir_stack::ensure_sufficient_stack;

pub(crate) use builtins::Builtin;
pub(crate) use partial::LiftedClosure;

use functors::Functor;

use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::types::lower_type;
use crate::value::LoweredValue;
use crate::{GenError, Result};

impl GenerationContext<'_> {
    /// Lower an expression.
    pub(crate) fn lower_expr(&mut self, expr: &TypedExpr) -> Result<LoweredValue> {
        ensure_sufficient_stack(|| self.lower_expr_inner(expr))
    }

    fn lower_expr_inner(&mut self, expr: &TypedExpr) -> Result<LoweredValue> {
        let scalar = |value: Value| LoweredValue::Scalar {
            value,
            ty: expr.ty.clone(),
        };
        match &expr.kind {
            ExprKind::UnitValue => Ok(LoweredValue::unit()),
            ExprKind::IntLiteral(value) => Ok(scalar(Value::int(*value))),
            ExprKind::DoubleLiteral(value) => Ok(scalar(Value::double(*value))),
            ExprKind::BoolLiteral(value) => Ok(scalar(Value::bool(*value))),
            ExprKind::PauliLiteral(pauli) => Ok(scalar(Value::Const(Constant::Pauli(*pauli as u8)))),
            ExprKind::ResultLiteral(result) => Ok(scalar(Value::Const(Constant::Result(
                *result == ResultValue::One,
            )))),
            ExprKind::BigIntLiteral(value) => self.lower_big_int(value),
            ExprKind::StringLiteral { template, items } => {
                self.lower_interpolated(template, items, expr.span)
            }
            ExprKind::RangeLiteral { start, step, end } => {
                self.lower_range(start, step.as_deref(), end)
            }
            ExprKind::ValueTuple(items) => self.lower_value_tuple(&expr.ty, items),
            ExprKind::ValueArray(items) => self.lower_value_array(&expr.ty, items),
            ExprKind::NewArray { length } => self.lower_new_array(&expr.ty, length),
            ExprKind::Identifier(Identifier::Local(name)) => self.lower_local(*name, expr.span),
            ExprKind::Identifier(Identifier::Global(name)) => {
                self.global_callable_value(*name, expr.span)
            }
            ExprKind::ArrayItem { array, index } => self.lower_array_item(array, index),
            ExprKind::NamedItem { target, item } => {
                self.lower_named_item(target, *item, expr.span)
            }
            ExprKind::Unwrap(target) => self.lower_unwrap(target, &expr.ty),
            ExprKind::CopyAndUpdate {
                target,
                accessor,
                value,
            } => {
                let original = self.lower_expr(target)?;
                self.copy_and_update(&original, accessor, value, false, expr.span)
            }
            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, expr.span),
            ExprKind::Unary { op, operand } => self.lower_unary(*op, operand, expr.span),
            ExprKind::Conditional {
                cond,
                if_true,
                if_false,
            } => self.lower_conditional(&expr.ty, cond, if_true, if_false),
            ExprKind::AdjointApplication(inner) => {
                self.lower_functor_application(Functor::Adjoint, inner, &expr.ty)
            }
            ExprKind::ControlledApplication(inner) => {
                self.lower_functor_application(Functor::Controlled, inner, &expr.ty)
            }
            ExprKind::Call { callee, arg } => {
                if arg.contains_missing() {
                    self.lower_partial_application(&expr.ty, callee, arg)
                } else {
                    self.lower_call(callee, arg, expr.span)
                }
            }
            ExprKind::Missing => {
                tracing::warn!(span = ?expr.span, "placeholder outside of a partial application");
                Ok(LoweredValue::undef(expr.ty.clone()))
            }
            ExprKind::Unsupported(what) => {
                tracing::warn!(span = ?expr.span, kind = what, "expression is not lowered");
                Ok(LoweredValue::undef(expr.ty.clone()))
            }
        }
    }

    /// Value of a local variable; mutable variables are loaded from their cell.
    fn lower_local(&mut self, name: Name, span: Span) -> Result<LoweredValue> {
        match self.scopes.variable(name) {
            Some(LoweredValue::Pointer { cell, ty }) => {
                let (cell, ty) = (cell.clone(), ty.clone());
                Ok(self.load_cell(&cell, &ty))
            }
            Some(value) => Ok(value.clone()),
            None => Err(GenError::unsupported(UnsupportedKind::UnknownVariable, span)),
        }
    }

    /// Lower `expr` in a scope of its own; the caller owns one reference to the result.
    pub(crate) fn build_subitem(&mut self, expr: &TypedExpr) -> Result<LoweredValue> {
        self.build_owned(|ctx| ctx.lower_expr(expr))
    }

    /// Whether an expression can be evaluated eagerly without side effects.
    fn is_self_evaluating(expr: &TypedExpr) -> bool {
        matches!(
            expr.kind,
            ExprKind::UnitValue
                | ExprKind::IntLiteral(_)
                | ExprKind::DoubleLiteral(_)
                | ExprKind::BoolLiteral(_)
                | ExprKind::PauliLiteral(_)
                | ExprKind::ResultLiteral(_)
                | ExprKind::Identifier(Identifier::Local(_))
        )
    }

    /// `cond ? if_true | if_false`.
    ///
    /// Side-effect free arms become a `select`; anything else gets a block
    /// per arm, each in a scope of its own, joined by a `phi`.
    fn lower_conditional(
        &mut self,
        ty: &Type,
        cond: &TypedExpr,
        if_true: &TypedExpr,
        if_false: &TypedExpr,
    ) -> Result<LoweredValue> {
        let cond = self.lower_expr(cond)?.into_ir();
        if Self::is_self_evaluating(if_true) && Self::is_self_evaluating(if_false) {
            let on_true = self.lower_expr(if_true)?.into_ir();
            let on_false = self.lower_expr(if_false)?.into_ir();
            let selected = self.builder.select(cond, on_true, on_false);
            return Ok(LoweredValue::from_ir(selected, ty.clone()));
        }

        let current = self.builder.current_block();
        let cont = self.builder.new_block_after(current, "condContinue");
        let false_block = self.builder.new_block_before(cont, "condFalse");
        let true_block = self.builder.new_block_before(false_block, "condTrue");
        self.builder.terminate_branch(cond, true_block, false_block);

        let mut incoming = Vec::with_capacity(2);
        for (block, arm) in [(true_block, if_true), (false_block, if_false)] {
            self.builder.position_at(block);
            let value = self.build_subitem(arm)?;
            incoming.push((value.into_ir(), self.builder.current_block()));
            self.builder.terminate_jump(cont);
        }

        self.builder.position_at(cont);
        if *ty == Type::Unit {
            return Ok(LoweredValue::unit());
        }
        let phi = self.builder.phi(lower_type(ty), incoming);
        let value = LoweredValue::from_ir(phi, ty.clone());
        self.scopes.register_value(&value, false)?;
        Ok(value)
    }
}
