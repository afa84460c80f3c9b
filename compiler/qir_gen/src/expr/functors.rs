//! Adjoint and controlled application on callable values.

use qir_ast::{ExprKind, Identifier, Type, TypedExpr};
use qir_ir::{RuntimeFn, Value};

use crate::context::GenerationContext;
use crate::value::LoweredValue;
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Functor {
    Adjoint,
    Controlled,
}

impl Functor {
    fn runtime_fn(self) -> RuntimeFn {
        match self {
            Functor::Adjoint => RuntimeFn::CallableMakeAdjoint,
            Functor::Controlled => RuntimeFn::CallableMakeControlled,
        }
    }
}

/// Whether `expr` builds a callable nobody else refers to yet.
fn is_fresh_callable(expr: &TypedExpr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Identifier(Identifier::Global(_))
            | ExprKind::AdjointApplication(_)
            | ExprKind::ControlledApplication(_)
    ) || expr.is_partial_application()
}

impl GenerationContext<'_> {
    /// `Adjoint inner` or `Controlled inner` where `inner` is not called directly.
    ///
    /// Fresh callables are modified in place; anything else is copied first
    /// so that other holders keep their functors.
    pub(super) fn lower_functor_application(
        &mut self,
        functor: Functor,
        inner: &TypedExpr,
        ty: &Type,
    ) -> Result<LoweredValue> {
        let value = self.lower_expr(inner)?;
        let target = if is_fresh_callable(inner) {
            value
        } else {
            let raw = self.builder.call_runtime_value(
                RuntimeFn::CallableCopy,
                vec![value.ir().clone(), Value::bool(false)],
            );
            let copy = LoweredValue::from_ir(raw, value.ty().clone());
            self.scopes.register_value(&copy, false)?;
            copy
        };
        self.builder
            .call_runtime(functor.runtime_fn(), vec![target.ir().clone()]);
        Ok(LoweredValue::from_ir(target.into_ir(), ty.clone()))
    }
}
