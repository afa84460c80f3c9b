//! Partial application.
//!
//! `Op(a, _, (b, _))` becomes a callable value over a capture tuple
//! `(Op, a, b)`. Each supported specialization gets a lifted closure with
//! the `(capture, args, result)` signature that rebuilds the argument of
//! `Op` from the capture and the supplied arguments, then invokes `Op`
//! through `callable_invoke`.
//!
//! The plan for rebuilding the argument is a [`RebuildItem`] tree, built
//! once per partial application and interpreted by every closure.

use qir_ast::{ExprKind, SpecKind, Type, TypedExpr};
use qir_ir::{FuncId, GlobalKind, IrType, Linkage, RuntimeFn, Value};

use crate::context::GenerationContext;
use crate::names::{specialization_name, table_name, wrapper_name};
use crate::tables::ENTRY_POINT_PARAMS;
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// How to produce one item of the inner callable's argument.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RebuildItem {
    /// Payload item `index` of the capture tuple; item 0 is the inner callable.
    Captured { index: usize },
    /// Supplied argument `index`, in placeholder order.
    Placeholder { index: usize },
    /// A new tuple of type `ty` built from `items`.
    NestedTuple { ty: Type, items: Vec<RebuildItem> },
}

/// A lifted closure waiting for its body.
#[derive(Clone, Debug)]
pub(crate) struct LiftedClosure {
    pub(crate) function: FuncId,
    pub(crate) kind: SpecKind,
    capture_ty: Type,
    /// Types of the placeholders; the closure's input is their tuple.
    placeholders: Vec<Type>,
    /// Input of the inner callable.
    inner_input: Type,
    rebuild: RebuildItem,
}

/// Specializations a value of type `ty` supports.
fn supported_kinds(ty: &Type) -> Vec<SpecKind> {
    let functors = ty.functors();
    SpecKind::ALL
        .into_iter()
        .filter(|kind| functors.contains(kind.required_functors()))
        .collect()
}

impl GenerationContext<'_> {
    pub(super) fn lower_partial_application(
        &mut self,
        ty: &Type,
        callee: &TypedExpr,
        arg: &TypedExpr,
    ) -> Result<LoweredValue> {
        let inner_input = callee
            .ty
            .callable_input()
            .cloned()
            .ok_or_else(|| GenError::invariant("partial application of a non-callable"))?;

        let mut placeholders = Vec::new();
        let mut captured = Vec::new();
        let rebuild = self.plan_rebuild(&inner_input, arg, &mut placeholders, &mut captured)?;
        let inner = self.build_subitem(callee)?;

        let capture_ty = Type::Tuple(
            std::iter::once(callee.ty.clone())
                .chain(captured.iter().map(|value| value.ty().clone()))
                .collect(),
        );
        let mut items = Vec::with_capacity(captured.len() + 1);
        items.push(inner);
        items.extend(captured);
        let capture = self.fill_tuple(&capture_ty, &items)?;

        let name = format!("Lifted__{}", self.global_name("PartialApplication"));
        let mut slots = [None; 4];
        for kind in supported_kinds(&callee.ty) {
            let function = self.module.declare_function(
                &wrapper_name(&specialization_name(&name, kind)),
                ENTRY_POINT_PARAMS.to_vec(),
                IrType::Void,
                Linkage::Internal,
            );
            slots[kind.table_index()] = Some(function);
            self.deferred.lifted.push(LiftedClosure {
                function,
                kind,
                capture_ty: capture_ty.clone(),
                placeholders: placeholders.clone(),
                inner_input: inner_input.clone(),
                rebuild: rebuild.clone(),
            });
        }
        tracing::debug!(
            name = %name,
            captured = items.len() - 1,
            placeholders = placeholders.len(),
            "partial application"
        );

        let table = self
            .module
            .add_global(&table_name(&name), GlobalKind::FunctionTable(slots));
        let table = self.global_address(table);
        let memory = self.memory_table(&capture_ty);
        let memory = self.global_address(memory);
        let raw = self.builder.call_runtime_value(
            RuntimeFn::CallableCreate,
            vec![table, memory, capture.into_ir()],
        );
        let value = LoweredValue::from_ir(raw, ty.clone());
        self.scopes.register_value(&value, false)?;
        Ok(value)
    }

    /// Plan the argument of type `ty`, capturing everything that is not a
    /// placeholder. Captured values are owned by the caller.
    fn plan_rebuild(
        &mut self,
        ty: &Type,
        arg: &TypedExpr,
        placeholders: &mut Vec<Type>,
        captured: &mut Vec<LoweredValue>,
    ) -> Result<RebuildItem> {
        match (&arg.kind, ty) {
            (ExprKind::Missing, _) => {
                placeholders.push(ty.clone());
                Ok(RebuildItem::Placeholder {
                    index: placeholders.len() - 1,
                })
            }
            (ExprKind::ValueTuple(items), Type::Tuple(types)) if items.len() == types.len() => {
                let items = types
                    .iter()
                    .zip(items)
                    .map(|(ty, item)| self.plan_rebuild(ty, item, placeholders, captured))
                    .collect::<Result<_>>()?;
                Ok(RebuildItem::NestedTuple {
                    ty: ty.clone(),
                    items,
                })
            }
            _ => {
                captured.push(self.build_subitem(arg)?);
                Ok(RebuildItem::Captured {
                    index: captured.len(),
                })
            }
        }
    }

    // ── Lifted closures ────────────────────────────────────────

    pub(crate) fn generate_lifted_closure(&mut self, closure: LiftedClosure) -> Result<()> {
        self.generate_function(closure.function, |ctx, params| {
            let [capture, args, result] = params.as_slice() else {
                return Err(GenError::invariant("lifted closure without three parameters"));
            };
            let capture = LoweredValue::from_ir(capture.clone(), closure.capture_ty.clone());
            let input = Type::tuple_of(closure.placeholders.clone());

            let (controls, supplied) = if closure.kind.is_controlled() {
                let outer = LoweredValue::from_ir(args.clone(), Type::controlled_input(&input));
                let controls = ctx.tuple_element(&outer, 0)?;
                (Some(controls), ctx.tuple_element(&outer, 1)?)
            } else {
                (None, ctx.argument_value(&input, args.clone())?)
            };
            let supplied = match closure.placeholders.len() {
                0 => Vec::new(),
                1 => vec![supplied],
                _ => ctx.tuple_elements(&supplied)?,
            };

            let inner_arg = ctx.rebuild(&closure.rebuild, &capture, &supplied)?;
            let inner = ctx.tuple_element(&capture, 0)?;
            let callee = ctx.specialized_callable(inner, closure.kind)?;
            let arg_tuple = match controls {
                Some(controls) => ctx.tuple_from_values(
                    &Type::controlled_input(&closure.inner_input),
                    &[controls, inner_arg],
                )?,
                None => ctx.argument_tuple(&closure.inner_input, inner_arg)?,
            };
            ctx.builder.call_runtime(
                RuntimeFn::CallableInvoke,
                vec![callee.into_ir(), arg_tuple.into_ir(), result.clone()],
            );
            Ok(())
        })
    }

    fn rebuild(
        &mut self,
        item: &RebuildItem,
        capture: &LoweredValue,
        supplied: &[LoweredValue],
    ) -> Result<LoweredValue> {
        match item {
            RebuildItem::Captured { index } => self.tuple_element(capture, *index),
            RebuildItem::Placeholder { index } => supplied.get(*index).cloned().ok_or_else(|| {
                GenError::invariant(format!("placeholder {index} was not supplied"))
            }),
            RebuildItem::NestedTuple { ty, items } => {
                let values = items
                    .iter()
                    .map(|item| self.rebuild(item, capture, supplied))
                    .collect::<Result<Vec<_>>>()?;
                self.tuple_from_values(ty, &values)
            }
        }
    }

    /// The captured callable with the functors of `kind` applied to a copy.
    fn specialized_callable(&mut self, inner: LoweredValue, kind: SpecKind) -> Result<LoweredValue> {
        if kind == SpecKind::Body {
            return Ok(inner);
        }
        let raw = self.builder.call_runtime_value(
            RuntimeFn::CallableCopy,
            vec![inner.ir().clone(), Value::bool(false)],
        );
        let copy = LoweredValue::from_ir(raw, inner.ty().clone());
        self.scopes.register_value(&copy, false)?;
        if kind.is_adjoint() {
            self.builder
                .call_runtime(RuntimeFn::CallableMakeAdjoint, vec![copy.ir().clone()]);
        }
        if kind.is_controlled() {
            self.builder
                .call_runtime(RuntimeFn::CallableMakeControlled, vec![copy.ir().clone()]);
        }
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use qir_ast::Functors;

    use super::*;

    #[test]
    fn kinds_follow_functors() {
        let op = |functors| Type::operation(Type::Qubit, Type::Unit, functors);
        assert_eq!(supported_kinds(&op(Functors::empty())), vec![SpecKind::Body]);
        assert_eq!(
            supported_kinds(&op(Functors::ADJOINT)),
            vec![SpecKind::Body, SpecKind::Adjoint]
        );
        assert_eq!(
            supported_kinds(&op(Functors::ADJOINT | Functors::CONTROLLED)),
            SpecKind::ALL.to_vec()
        );
        assert_eq!(
            supported_kinds(&Type::function(Type::Int, Type::Int)),
            vec![SpecKind::Body]
        );
    }
}
