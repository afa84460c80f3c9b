//! Calls.
//!
//! A call whose callee is a global callable under any number of functor
//! applications is lowered as a direct call:
//!
//! 1. built-ins become instructions
//! 2. callables with a target instruction call `__quantum__qis__{name}__body`
//! 3. inline callables have their body substituted
//! 4. anything else calls the specialization function selected by the
//!    functors, e.g. `Adjoint Controlled Op` calls `Op__ctladj`
//!
//! Any other callee is a callable value and goes through `callable_invoke`
//! with an argument tuple and a result tuple.

use qir_ast::{Callable, ExprKind, Identifier, QualifiedName, SpecImpl, SpecKind, Span, Type, TypedExpr};
use qir_ir::{Callee, FuncId, Linkage, RuntimeFn, Value};

use super::builtins::Builtin;
use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::names::{callable_base_name, specialization_name, target_instruction_name};
use crate::types::{lower_params, lower_return_type};
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// Global callable with its functor applications folded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct DirectCallee {
    name: QualifiedName,
    adjoint: bool,
    /// Number of Controlled applications; each adds a control array.
    controlled: usize,
}

impl DirectCallee {
    fn of(expr: &TypedExpr) -> Option<DirectCallee> {
        match &expr.kind {
            ExprKind::Identifier(Identifier::Global(name)) => Some(DirectCallee {
                name: *name,
                adjoint: false,
                controlled: 0,
            }),
            ExprKind::AdjointApplication(inner) => DirectCallee::of(inner).map(|callee| DirectCallee {
                adjoint: !callee.adjoint,
                ..callee
            }),
            ExprKind::ControlledApplication(inner) => {
                DirectCallee::of(inner).map(|callee| DirectCallee {
                    controlled: callee.controlled + 1,
                    ..callee
                })
            }
            _ => None,
        }
    }

    fn kind(self) -> SpecKind {
        SpecKind::from_flags(self.adjoint, self.controlled > 0)
    }
}

/// Argument not yet split into controls and inner argument.
enum ArgSource<'e> {
    Expr(&'e TypedExpr),
    Value(LoweredValue),
}

impl<'a> GenerationContext<'a> {
    pub(super) fn lower_call(
        &mut self,
        callee: &TypedExpr,
        arg: &TypedExpr,
        span: Span,
    ) -> Result<LoweredValue> {
        if let Some(direct) = DirectCallee::of(callee) {
            return self.call_global(direct, arg, span);
        }
        let callable = self.lower_expr(callee)?;
        self.invoke_callable_value(&callable, arg, span)
    }

    fn call_global(
        &mut self,
        direct: DirectCallee,
        arg: &TypedExpr,
        span: Span,
    ) -> Result<LoweredValue> {
        let kind = direct.kind();
        if kind == SpecKind::Body {
            if let Some(builtin) = Builtin::lookup(self.interner, direct.name) {
                let args = self.lower_flattened_args(arg)?;
                return self.apply_builtin(builtin, &args);
            }
        }
        let callable = self.callable(direct.name, span)?;
        if kind == SpecKind::Body {
            if let Some(instruction) = &callable.attrs.target_instruction {
                let function = self.target_instruction(callable, instruction);
                let args = self.lower_flattened_args(arg)?;
                return self.emit_call(function, into_values(args), &callable.output);
            }
            if callable.attrs.inline && self.config.inline_callables {
                return self.inline_call(callable, arg, span);
            }
        }

        let function = self.specialization_function(callable, kind, span)?;
        let args = if direct.controlled == 0 {
            self.lower_flattened_args(arg)?
        } else {
            self.controlled_args(arg, direct.controlled, span)?
        };
        self.emit_call(function, into_values(args), &callable.output)
    }

    /// Call `function` and take ownership of its result.
    pub(crate) fn emit_call(
        &mut self,
        function: FuncId,
        args: Vec<Value>,
        output: &Type,
    ) -> Result<LoweredValue> {
        let ret = lower_return_type(output);
        match self.builder.call(Callee::Function(function), ret, args) {
            Some(raw) => {
                let result = LoweredValue::from_ir(raw, output.clone());
                self.scopes.register_value(&result, false)?;
                Ok(result)
            }
            None => Ok(LoweredValue::unit()),
        }
    }

    // ── Declarations ───────────────────────────────────────────

    /// Declaration of the target instruction implementing a callable.
    pub(crate) fn target_instruction(&mut self, callable: &Callable, instruction: &str) -> FuncId {
        self.module.declare_function(
            &target_instruction_name(instruction),
            lower_params(&callable.input),
            lower_return_type(&callable.output),
            Linkage::External,
        )
    }

    /// Declaration of the function implementing one specialization.
    pub(crate) fn specialization_function(
        &mut self,
        callable: &Callable,
        kind: SpecKind,
        span: Span,
    ) -> Result<FuncId> {
        let spec = callable.specialization(kind).ok_or_else(|| {
            GenError::invariant(format!(
                "{} has no {} specialization",
                self.interner.lookup(callable.name.name),
                kind.suffix()
            ))
        })?;
        let linkage = match spec.implementation {
            SpecImpl::Provided { .. } if !self.config.is_library => Linkage::Internal,
            SpecImpl::Provided { .. } => Linkage::External,
            SpecImpl::Intrinsic if kind != SpecKind::Body && callable.attrs.target_instruction.is_some() => {
                return Err(GenError::unsupported(
                    UnsupportedKind::NonBodyTargetInstruction,
                    span,
                ));
            }
            SpecImpl::Intrinsic | SpecImpl::External => Linkage::External,
        };
        let input = if kind.is_controlled() {
            Type::controlled_input(&callable.input)
        } else {
            callable.input.clone()
        };
        let base = callable_base_name(self.interner, callable.name);
        Ok(self.module.declare_function(
            &specialization_name(&base, kind),
            lower_params(&input),
            lower_return_type(&callable.output),
            linkage,
        ))
    }

    // ── Arguments ──────────────────────────────────────────────

    /// Argument items, one per parameter of a direct call.
    ///
    /// Tuple literals are lowered item by item without building the tuple.
    pub(crate) fn lower_flattened_args(&mut self, arg: &TypedExpr) -> Result<Vec<LoweredValue>> {
        if let ExprKind::ValueTuple(items) = &arg.kind {
            return items.iter().map(|item| self.lower_expr(item)).collect();
        }
        let value = self.lower_expr(arg)?;
        match arg.ty {
            Type::Unit => Ok(Vec::new()),
            Type::Tuple(_) => self.tuple_elements(&value),
            _ => Ok(vec![value]),
        }
    }

    /// `[controls, inner]` for a call through `depth` Controlled applications.
    ///
    /// Nested `(controls, (controls, arg))` arguments are peeled and the
    /// control arrays concatenated, outermost first.
    fn controlled_args(
        &mut self,
        arg: &TypedExpr,
        depth: usize,
        span: Span,
    ) -> Result<Vec<LoweredValue>> {
        let mut controls = Vec::with_capacity(depth);
        let mut source = ArgSource::Expr(arg);
        for _ in 0..depth {
            let (ctls, rest) = match source {
                ArgSource::Expr(expr) => match &expr.kind {
                    ExprKind::ValueTuple(items) if items.len() == 2 => {
                        (self.lower_expr(&items[0])?, ArgSource::Expr(&items[1]))
                    }
                    _ => {
                        let value = self.lower_expr(expr)?;
                        self.split_controlled(&value, span)?
                    }
                },
                ArgSource::Value(value) => self.split_controlled(&value, span)?,
            };
            controls.push(ctls);
            source = rest;
        }

        let mut controls = controls.into_iter();
        let mut all = controls
            .next()
            .ok_or_else(|| GenError::invariant("controlled call without controls"))?;
        for more in controls {
            let raw = self.builder.call_runtime_value(
                RuntimeFn::ArrayConcatenate,
                vec![all.ir().clone(), more.ir().clone()],
            );
            all = LoweredValue::from_ir(raw, all.ty().clone());
            self.scopes.register_value(&all, false)?;
        }

        let inner = match source {
            ArgSource::Expr(expr) => self.lower_expr(expr)?,
            ArgSource::Value(value) => value,
        };
        Ok(vec![all, inner])
    }

    fn split_controlled<'e>(
        &mut self,
        value: &LoweredValue,
        span: Span,
    ) -> Result<(LoweredValue, ArgSource<'e>)> {
        match value.ty() {
            Type::Tuple(items) if items.len() == 2 => {
                let ctls = self.tuple_element(value, 0)?;
                let inner = self.tuple_element(value, 1)?;
                Ok((ctls, ArgSource::Value(inner)))
            }
            _ => Err(GenError::unsupported(
                UnsupportedKind::ControlledArgument,
                span,
            )),
        }
    }

    // ── Inlining ───────────────────────────────────────────────

    /// Substitute the body of an inline callable.
    ///
    /// Parameters are bound directly to the argument items in a scope of
    /// their own; a `return` records the result instead of leaving the
    /// function.
    fn inline_call(
        &mut self,
        callable: &'a Callable,
        arg: &TypedExpr,
        span: Span,
    ) -> Result<LoweredValue> {
        let Some(SpecImpl::Provided { body, .. }) = callable
            .specialization(SpecKind::Body)
            .map(|spec| &spec.implementation)
        else {
            return Err(GenError::unsupported(
                UnsupportedKind::MissingInlineBody,
                span,
            ));
        };
        tracing::trace!(callable = self.interner.lookup(callable.name.name), "inline call");

        self.inline_levels.push(None);
        self.scopes.open_scope();
        let symbols = crate::driver::param_symbols(&callable.params);
        self.bind_immutable(&symbols, arg, span)?;
        self.lower_statements(&body.stmts)?;
        let value = self
            .inline_levels
            .pop()
            .flatten()
            .unwrap_or_else(LoweredValue::unit);

        if value.is_unit() {
            self.close_scope()?;
        } else {
            let updates = self.scopes.close_scope_returning(&value)?;
            self.emit_updates(updates)?;
            self.scopes.register_value(&value, false)?;
        }
        Ok(value)
    }

    // ── Callable values ────────────────────────────────────────

    /// Call through a callable value.
    ///
    /// The argument is passed as a tuple (a non-tuple argument is wrapped
    /// into a one-item tuple, Unit is null). The callee writes its result
    /// items into a result tuple allocated here.
    pub(crate) fn invoke_callable_value(
        &mut self,
        callable: &LoweredValue,
        arg: &TypedExpr,
        span: Span,
    ) -> Result<LoweredValue> {
        let (input, output) = match callable.ty() {
            Type::Function { input, output } | Type::Operation { input, output, .. } => {
                ((**input).clone(), (**output).clone())
            }
            _ => return Err(GenError::unsupported(UnsupportedKind::NotCallable, span)),
        };
        let value = self.lower_expr(arg)?;
        let arg_tuple = self.argument_tuple(&input, value)?;

        let result_items = output.flattened();
        let result_tuple = if result_items.is_empty() {
            LoweredValue::unit()
        } else {
            self.allocate_tuple(&Type::Tuple(result_items))?
        };
        self.builder.call_runtime(
            RuntimeFn::CallableInvoke,
            vec![
                callable.ir().clone(),
                arg_tuple.into_ir(),
                result_tuple.ir().clone(),
            ],
        );

        match output {
            Type::Unit => Ok(LoweredValue::unit()),
            Type::Tuple(_) => {
                let result = LoweredValue::from_ir(result_tuple.into_ir(), output);
                self.scopes.register_value(&result, false)?;
                Ok(result)
            }
            _ => {
                self.scopes.register_value(&result_tuple, false)?;
                self.tuple_element(&result_tuple, 0)
            }
        }
    }

    /// Argument tuple handed to `callable_invoke` for a value of type `input`.
    pub(crate) fn argument_tuple(
        &mut self,
        input: &Type,
        value: LoweredValue,
    ) -> Result<LoweredValue> {
        match input {
            Type::Unit => Ok(LoweredValue::unit()),
            Type::Tuple(_) | Type::Udt(_) => Ok(value),
            single => self.tuple_from_values(&Type::Tuple(vec![single.clone()]), &[value]),
        }
    }

    /// Value of type `input` received as an argument tuple; the inverse of
    /// [`argument_tuple`](Self::argument_tuple).
    pub(crate) fn argument_value(&mut self, input: &Type, args: Value) -> Result<LoweredValue> {
        match input {
            Type::Unit => Ok(LoweredValue::unit()),
            Type::Tuple(_) | Type::Udt(_) => Ok(LoweredValue::from_ir(args, input.clone())),
            single => {
                let wrapped = LoweredValue::from_ir(args, Type::Tuple(vec![single.clone()]));
                self.tuple_element(&wrapped, 0)
            }
        }
    }
}

fn into_values(args: Vec<LoweredValue>) -> Vec<Value> {
    args.into_iter().map(LoweredValue::into_ir).collect()
}
