//! Callable tables, wrappers, and memory management tables.
//!
//! A callable value points at a four-entry table of entry points sharing
//! the `(capture, args, result)` signature, one per specialization. For a
//! global callable the entries are wrappers that unpack the argument tuple,
//! call the specialization function, and store the result items into the
//! result tuple. Partial applications bring their own tables of lifted
//! closures.
//!
//! A callable with a capture also points at a two-entry table of functions
//! changing the reference and alias counts of the capture, items included.
//!
//! None of these bodies can be generated while another function is under
//! construction, so they are queued in [`Deferred`] and generated between
//! functions by [`GenerationContext::generate_deferred`]. Generating one
//! may queue more, so the queues are drained until all are empty.

use std::mem;

use qir_ast::{Callable, QualifiedName, SpecKind, Span, Type};
use qir_ir::{FuncId, GlobalId, GlobalKind, IrType, Linkage, RuntimeFn, Value};
use rustc_hash::FxHashMap;

use crate::context::GenerationContext;
use crate::expr::{Builtin, LiftedClosure};
use crate::names::{callable_base_name, specialization_name, table_name, wrapper_name};
use crate::types::CountKind;
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// Work queued for after the current function.
#[derive(Default)]
pub(crate) struct Deferred {
    wrappers: Vec<Wrapper>,
    pub(crate) lifted: Vec<LiftedClosure>,
    counters: Vec<CaptureCounter>,
    callable_tables: FxHashMap<QualifiedName, GlobalId>,
    memory_tables: FxHashMap<Type, GlobalId>,
}

impl Deferred {
    fn is_empty(&self) -> bool {
        self.wrappers.is_empty() && self.lifted.is_empty() && self.counters.is_empty()
    }
}

struct Wrapper {
    function: FuncId,
    callable: QualifiedName,
    kind: SpecKind,
}

struct CaptureCounter {
    function: FuncId,
    kind: CountKind,
    capture_ty: Type,
}

/// Parameters of every table entry point: capture, arguments, result.
pub(crate) const ENTRY_POINT_PARAMS: [IrType; 3] = [IrType::Tuple, IrType::Tuple, IrType::Tuple];

impl<'a> GenerationContext<'a> {
    /// Table of wrappers for a global callable, created on first use.
    ///
    /// Missing specializations get a null entry.
    pub(crate) fn callable_table(&mut self, callable: &'a Callable) -> GlobalId {
        if let Some(&table) = self.deferred.callable_tables.get(&callable.name) {
            return table;
        }
        let base = callable_base_name(self.interner, callable.name);
        let mut slots = [None; 4];
        for spec in &callable.specializations {
            let function = self.module.declare_function(
                &wrapper_name(&specialization_name(&base, spec.kind)),
                ENTRY_POINT_PARAMS.to_vec(),
                IrType::Void,
                Linkage::Internal,
            );
            slots[spec.kind.table_index()] = Some(function);
            self.deferred.wrappers.push(Wrapper {
                function,
                callable: callable.name,
                kind: spec.kind,
            });
        }
        tracing::trace!(callable = %base, "callable table");
        let table = self
            .module
            .add_global(&table_name(&base), GlobalKind::FunctionTable(slots));
        self.deferred.callable_tables.insert(callable.name, table);
        table
    }

    /// A new callable value referring to a global callable, without capture.
    pub(crate) fn global_callable_value(
        &mut self,
        name: QualifiedName,
        span: Span,
    ) -> Result<LoweredValue> {
        let callable = self.callable(name, span)?;
        let table = self.callable_table(callable);
        let table = self.global_address(table);
        let raw = self.builder.call_runtime_value(
            RuntimeFn::CallableCreate,
            vec![
                table,
                Value::null(IrType::MemoryTable),
                Value::null(IrType::Tuple),
            ],
        );
        let value = LoweredValue::from_ir(raw, callable.signature());
        self.scopes.register_value(&value, false)?;
        Ok(value)
    }

    /// Count functions for captures of type `capture_ty`, shared between
    /// callables with the same capture type.
    pub(crate) fn memory_table(&mut self, capture_ty: &Type) -> GlobalId {
        if let Some(&table) = self.deferred.memory_tables.get(capture_ty) {
            return table;
        }
        let name = self.global_name("MemoryManagement");
        let mut slots = [None; 2];
        let counters = [
            (CountKind::Reference, "RefCount"),
            (CountKind::Alias, "AliasCount"),
        ];
        for (slot, (kind, suffix)) in counters.into_iter().enumerate() {
            let function = self.module.declare_function(
                &format!("{name}__{suffix}"),
                vec![IrType::Tuple, IrType::I32],
                IrType::Void,
                Linkage::Internal,
            );
            slots[slot] = Some(function);
            self.deferred.counters.push(CaptureCounter {
                function,
                kind,
                capture_ty: capture_ty.clone(),
            });
        }
        let table = self
            .module
            .add_global(&table_name(&name), GlobalKind::MemoryTable(slots));
        self.deferred.memory_tables.insert(capture_ty.clone(), table);
        table
    }

    // ── Deferred generation ────────────────────────────────────

    /// Generate every queued wrapper, lifted closure, and count function.
    pub(crate) fn generate_deferred(&mut self) -> Result<()> {
        while !self.deferred.is_empty() {
            for wrapper in mem::take(&mut self.deferred.wrappers) {
                self.generate_wrapper(&wrapper)?;
            }
            for closure in mem::take(&mut self.deferred.lifted) {
                self.generate_lifted_closure(closure)?;
            }
            for counter in mem::take(&mut self.deferred.counters) {
                self.generate_capture_counter(&counter)?;
            }
        }
        Ok(())
    }

    fn generate_wrapper(&mut self, wrapper: &Wrapper) -> Result<()> {
        let callable = self.callable(wrapper.callable, Span::DUMMY)?;
        let kind = wrapper.kind;
        tracing::debug!(
            callable = self.interner.lookup(callable.name.name),
            kind = kind.suffix(),
            "wrapper"
        );
        self.generate_function(wrapper.function, |ctx, params| {
            let [_, args, result] = params.as_slice() else {
                return Err(GenError::invariant("wrapper without three parameters"));
            };
            let input = if kind.is_controlled() {
                Type::controlled_input(&callable.input)
            } else {
                callable.input.clone()
            };
            let args = ctx.unpack_arguments(&input, args.clone())?;

            let builtin = Builtin::lookup(ctx.interner, callable.name);
            let value = match (kind, builtin, &callable.attrs.target_instruction) {
                (SpecKind::Body, Some(builtin), _) => ctx.apply_builtin(builtin, &args)?,
                (SpecKind::Body, None, Some(instruction)) => {
                    let function = ctx.target_instruction(callable, instruction);
                    let args = args.into_iter().map(LoweredValue::into_ir).collect();
                    ctx.emit_call(function, args, &callable.output)?
                }
                _ => {
                    let function = ctx.specialization_function(callable, kind, callable.span)?;
                    let args = args.into_iter().map(LoweredValue::into_ir).collect();
                    ctx.emit_call(function, args, &callable.output)?
                }
            };
            ctx.store_result(&callable.output, result.clone(), value)
        })
    }

    /// Argument items of a specialization function, read from an argument tuple.
    fn unpack_arguments(&mut self, input: &Type, args: Value) -> Result<Vec<LoweredValue>> {
        match input {
            Type::Unit => Ok(Vec::new()),
            Type::Tuple(_) => {
                let tuple = LoweredValue::from_ir(args, input.clone());
                self.tuple_elements(&tuple)
            }
            _ => Ok(vec![self.argument_value(input, args)?]),
        }
    }

    /// Store a call result into the caller's result tuple, which takes a
    /// reference to each item.
    fn store_result(&mut self, output: &Type, result: Value, value: LoweredValue) -> Result<()> {
        let items = match output {
            Type::Unit => return Ok(()),
            Type::Tuple(_) => self.tuple_elements(&value)?,
            _ => vec![value],
        };
        let result = LoweredValue::from_ir(result, Type::Tuple(output.flattened()));
        for (index, item) in items.into_iter().enumerate() {
            let (ptr, _) = self.tuple_element_ptr(&result, index)?;
            self.builder.store(item.ir().clone(), ptr);
            self.scopes.increase_reference_count(&item, false)?;
        }
        Ok(())
    }

    fn generate_capture_counter(&mut self, counter: &CaptureCounter) -> Result<()> {
        self.generate_function(counter.function, |ctx, params| {
            let [capture, change] = params.as_slice() else {
                return Err(GenError::invariant("count function without two parameters"));
            };
            let capture = LoweredValue::from_ir(capture.clone(), counter.capture_ty.clone());
            ctx.modify_counts(counter.kind, change, &capture, true)
        })
    }
}
