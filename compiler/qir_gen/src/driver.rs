//! Namespace driver.
//!
//! Walks every callable of the program and generates one function per
//! specialization. Intrinsic and external specializations are only
//! declared; built-ins and target instructions need no function of their
//! own. Each user-defined type gets a constructor unless the program
//! declares one.
//!
//! Work queued while generating a function (wrappers, lifted closures,
//! memory management functions) is generated right after it.

use qir_ast::{
    Block, Callable, CallableAttrs, CallableKind, Functors, Name, Param, Program, SpecImpl,
    Span, SpecKind, Specialization, StringInterner, SymbolTuple, Type, UdtDecl,
};
use qir_ir::{FuncId, Module, Value};

use crate::context::GenerationContext;
use crate::expr::Builtin;
use crate::value::LoweredValue;
use crate::{GenConfig, GenError, Result};

/// Pattern binding the parameters of a callable to its argument.
///
/// A single parameter binds the whole argument; one-item tuple patterns
/// collapse into their item like their types do.
pub(crate) fn param_symbols(params: &[Param]) -> SymbolTuple {
    fn symbol(param: &Param) -> SymbolTuple {
        match param {
            Param::Item { name: Some(name), .. } => SymbolTuple::Variable(*name),
            Param::Item { name: None, .. } => SymbolTuple::Discard,
            Param::Tuple(items) if items.len() == 1 => symbol(&items[0]),
            Param::Tuple(items) => SymbolTuple::Tuple(items.iter().map(symbol).collect()),
        }
    }
    match params {
        [single] => symbol(single),
        params => SymbolTuple::Tuple(params.iter().map(symbol).collect()),
    }
}

/// Constructor of a user-defined type: a function from the underlying items to the type.
fn constructor(udt: &UdtDecl) -> Callable {
    let input = udt.underlying();
    Callable {
        name: udt.name,
        kind: CallableKind::TypeConstructor,
        params: vec![Param::Item {
            name: None,
            ty: input.clone(),
        }],
        input,
        output: Type::Udt(udt.name),
        functors: Functors::empty(),
        attrs: CallableAttrs::default(),
        specializations: vec![Specialization {
            kind: SpecKind::Body,
            implementation: SpecImpl::Provided {
                controls: None,
                body: Block::empty(),
            },
        }],
        span: udt.span,
    }
}

/// Generate the module for a whole program.
pub(crate) fn generate_program(
    program: &Program,
    interner: &StringInterner,
    config: &GenConfig,
) -> Result<Module> {
    let mut callables = program.callable_index();
    let constructors: Vec<Callable> = program
        .types()
        .filter(|udt| !callables.contains_key(&udt.name))
        .map(constructor)
        .collect();
    for constructor in &constructors {
        callables.insert(constructor.name, constructor);
    }
    tracing::debug!(
        callables = callables.len(),
        types = constructors.len(),
        "generating program"
    );

    let mut ctx = GenerationContext::new(interner, config, callables, program.type_index());
    for callable in program.callables().chain(&constructors) {
        ctx.generate_callable(callable)?;
        ctx.generate_deferred()?;
    }
    if config.emit_wrappers_for_all {
        for callable in program.callables().chain(&constructors) {
            ctx.callable_table(callable);
        }
        ctx.generate_deferred()?;
    }
    Ok(ctx.into_module())
}

impl<'a> GenerationContext<'a> {
    fn generate_callable(&mut self, callable: &'a Callable) -> Result<()> {
        if Builtin::lookup(self.interner, callable.name).is_some() {
            return Ok(());
        }
        for spec in &callable.specializations {
            if spec.kind == SpecKind::Body {
                if let Some(instruction) = &callable.attrs.target_instruction {
                    self.target_instruction(callable, instruction);
                    continue;
                }
            }
            let function = self.specialization_function(callable, spec.kind, callable.span)?;
            let SpecImpl::Provided { controls, body } = &spec.implementation else {
                continue;
            };
            if callable.kind == CallableKind::TypeConstructor {
                self.generate_constructor(function, callable)?;
            } else {
                self.generate_specialization(function, callable, spec.kind, *controls, body)?;
            }
        }
        Ok(())
    }

    fn generate_specialization(
        &mut self,
        function: FuncId,
        callable: &'a Callable,
        kind: SpecKind,
        controls: Option<Name>,
        body: &Block,
    ) -> Result<()> {
        tracing::debug!(
            callable = self.interner.lookup(callable.name.name),
            kind = kind.suffix(),
            "specialization"
        );
        let symbols = param_symbols(&callable.params);
        let span = callable.span;
        self.generate_function(function, |ctx, params| {
            if kind.is_controlled() {
                let [control_array, inner] = params.as_slice() else {
                    return Err(GenError::invariant(
                        "controlled specialization without two parameters",
                    ));
                };
                if let Some(name) = controls {
                    let control_array =
                        LoweredValue::from_ir(control_array.clone(), Type::array(Type::Qubit));
                    ctx.bind_produced(&SymbolTuple::Variable(name), control_array, None, span)?;
                }
                let inner = LoweredValue::from_ir(inner.clone(), callable.input.clone());
                ctx.bind_produced(&symbols, inner, None, span)?;
            } else {
                ctx.bind_parameters(&symbols, &callable.input, params, span)?;
            }
            ctx.lower_statements(&body.stmts)
        })
    }

    /// Bind the flattened parameters of a specialization function.
    ///
    /// One parameter per pattern item binds directly; a single pattern
    /// spanning several parameters binds a tuple rebuilt from them.
    fn bind_parameters(
        &mut self,
        symbols: &SymbolTuple,
        input: &Type,
        params: Vec<Value>,
        span: Span,
    ) -> Result<()> {
        let items = input.flattened();
        if items.len() != params.len() {
            return Err(GenError::invariant(format!(
                "{} parameters for {} argument items",
                params.len(),
                items.len()
            )));
        }
        let mut values: Vec<LoweredValue> = params
            .into_iter()
            .zip(items)
            .map(|(value, ty)| LoweredValue::from_ir(value, ty))
            .collect();
        match symbols {
            SymbolTuple::Tuple(patterns) if patterns.len() == values.len() => {
                for (pattern, value) in patterns.iter().zip(values) {
                    self.bind_produced(pattern, value, None, span)?;
                }
                Ok(())
            }
            _ if values.len() == 1 => {
                let value = values.remove(0);
                self.bind_produced(symbols, value, None, span)
            }
            _ => {
                let tuple = self.tuple_from_values(input, &values)?;
                self.bind_produced(symbols, tuple, None, span)
            }
        }
    }

    /// Body of a type constructor: a new tuple referencing the parameters.
    fn generate_constructor(&mut self, function: FuncId, callable: &'a Callable) -> Result<()> {
        tracing::debug!(
            udt = self.interner.lookup(callable.name.name),
            "constructor"
        );
        self.generate_function(function, |ctx, params| {
            let values: Vec<LoweredValue> = params
                .into_iter()
                .zip(callable.input.flattened())
                .map(|(value, ty)| LoweredValue::from_ir(value, ty))
                .collect();
            let value = ctx.tuple_from_values(&callable.output, &values)?;
            ctx.add_return(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn single_parameter_binds_the_whole_argument() {
        let a = Name::from_raw(1);
        assert_eq!(
            param_symbols(&[Param::named(a, Type::Int)]),
            SymbolTuple::Variable(a)
        );
    }

    #[test]
    fn nested_parameters_become_tuple_patterns() {
        let a = Name::from_raw(1);
        let b = Name::from_raw(2);
        let c = Name::from_raw(3);
        let params = [
            Param::named(a, Type::Int),
            Param::Tuple(vec![
                Param::named(b, Type::Bool),
                Param::Item {
                    name: None,
                    ty: Type::Double,
                },
            ]),
            Param::Tuple(vec![Param::named(c, Type::Int)]),
        ];
        assert_eq!(
            param_symbols(&params),
            SymbolTuple::Tuple(vec![
                SymbolTuple::Variable(a),
                SymbolTuple::Tuple(vec![SymbolTuple::Variable(b), SymbolTuple::Discard]),
                SymbolTuple::Variable(c),
            ])
        );
    }

    #[test]
    fn no_parameters_bind_unit() {
        assert_eq!(param_symbols(&[]), SymbolTuple::Tuple(Vec::new()));
    }
}
