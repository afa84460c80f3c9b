//! Generation context.
//!
//! [`GenerationContext`] carries everything lowering needs for one
//! compilation unit: the module being built, the builder of the function
//! being generated, its scopes, and the bookkeeping of functions generated
//! after the current one (callable tables, lifted closures, memory
//! management tables).
//!
//! # Function lifecycle
//!
//! Specialization bodies, wrappers, and lifted closures all go through
//! [`GenerationContext::generate_function`]: start, open the outermost
//! scope, lower, close the scope unless every path already returned, and
//! attach the finished body to its declaration.

mod aggregates;
mod loops;

use std::mem;

use qir_ast::{Callable, Name, QualifiedName, Span, StringInterner, Type, UdtDecl};
use qir_ir::{Constant, FuncId, FunctionBuilder, GlobalId, GlobalKind, Module, RuntimeFn, Value};
use rustc_hash::FxHashMap;

use crate::error::UnsupportedKind;
use crate::scope::{CountUpdate, ScopeManager};
use crate::tables::Deferred;
use crate::types::{capture_count_function, count_function, has_count, lower_type, CountKind};
use crate::value::LoweredValue;
use crate::{GenConfig, GenError, Result};

/// State of one compilation unit.
pub(crate) struct GenerationContext<'a> {
    pub(crate) interner: &'a StringInterner,
    pub(crate) config: &'a GenConfig,
    pub(crate) module: Module,
    callables: FxHashMap<QualifiedName, &'a Callable>,
    udts: FxHashMap<QualifiedName, &'a UdtDecl>,
    /// Builder of the function being generated; a placeholder between functions.
    pub(crate) builder: FunctionBuilder,
    function: Option<FuncId>,
    pub(crate) scopes: ScopeManager,
    /// Return value of each callable being inlined, innermost last.
    pub(crate) inline_levels: Vec<Option<LoweredValue>>,
    pub(crate) deferred: Deferred,
    global_counters: FxHashMap<&'static str, u32>,
    strings: FxHashMap<String, GlobalId>,
}

impl<'a> GenerationContext<'a> {
    pub(crate) fn new(
        interner: &'a StringInterner,
        config: &'a GenConfig,
        callables: FxHashMap<QualifiedName, &'a Callable>,
        udts: FxHashMap<QualifiedName, &'a UdtDecl>,
    ) -> Self {
        GenerationContext {
            interner,
            config,
            module: Module::new(),
            callables,
            udts,
            builder: FunctionBuilder::new(&[]),
            function: None,
            scopes: ScopeManager::new(),
            inline_levels: Vec::new(),
            deferred: Deferred::default(),
            global_counters: FxHashMap::default(),
            strings: FxHashMap::default(),
        }
    }

    pub(crate) fn into_module(self) -> Module {
        self.module
    }

    // ── Declarations ───────────────────────────────────────────

    pub(crate) fn callable(&self, name: QualifiedName, span: Span) -> Result<&'a Callable> {
        self.callables
            .get(&name)
            .copied()
            .ok_or_else(|| GenError::unsupported(UnsupportedKind::UnknownGlobal, span))
    }

    pub(crate) fn udt(&self, name: QualifiedName) -> Result<&'a UdtDecl> {
        self.udts.get(&name).copied().ok_or_else(|| {
            GenError::invariant(format!(
                "no declaration for user-defined type {}",
                self.interner.lookup(name.name)
            ))
        })
    }

    /// Payload item types of a tuple-like value.
    ///
    /// A user-defined type over a non-tuple type has a single item.
    pub(crate) fn tuple_items(&self, ty: &Type) -> Result<Vec<Type>> {
        match ty {
            Type::Tuple(items) => Ok(items.clone()),
            Type::Udt(name) => match self.udt(*name)?.underlying() {
                Type::Tuple(items) => Ok(items),
                single => Ok(vec![single]),
            },
            other => Err(GenError::invariant(format!(
                "tuple items requested for {other:?}"
            ))),
        }
    }

    /// Next unique name of a synthesized global: `{prefix}__1`, `{prefix}__2`, ...
    pub(crate) fn global_name(&mut self, prefix: &'static str) -> String {
        let counter = self.global_counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{prefix}__{counter}")
    }

    /// Address of a NUL-terminated string constant, shared between uses.
    pub(crate) fn string_constant(&mut self, text: &str) -> Value {
        let id = match self.strings.get(text) {
            Some(&id) => id,
            None => {
                let name = self.global_name("cstr");
                let id = self
                    .module
                    .add_global(&name, GlobalKind::CString(text.to_owned()));
                self.strings.insert(text.to_owned(), id);
                id
            }
        };
        self.global_address(id)
    }

    /// Address of a module global, typed by its kind.
    pub(crate) fn global_address(&self, id: GlobalId) -> Value {
        let kind = &self.module.global(id).kind;
        Value::Const(Constant::Global(id, kind.pointer_type()))
    }

    /// Attach a source name to the IR variable holding `value`.
    pub(crate) fn name_value(&mut self, value: &LoweredValue, name: Name) {
        if let Some(var) = value.ir().as_var() {
            self.builder.set_var_name(var, self.interner.lookup(name));
        }
    }

    // ── Function lifecycle ─────────────────────────────────────

    /// Generate the body of a declared function.
    ///
    /// `lower` receives the parameter values. A path left open falls back
    /// to a void return, or to `unreachable` for functions returning a value.
    pub(crate) fn generate_function(
        &mut self,
        id: FuncId,
        lower: impl FnOnce(&mut Self, Vec<Value>) -> Result<()>,
    ) -> Result<()> {
        self.start_function(id)?;
        let params = self.builder.params().iter().copied().map(Value::Var).collect();
        self.scopes.open_scope();
        lower(self, params)?;
        let terminated = self.builder.is_terminated();
        let updates = self.scopes.close_scope(terminated)?;
        self.emit_updates(updates)?;
        if !self.builder.is_terminated() {
            if self.module.function(id).ret.is_void() {
                self.builder.terminate_return(None);
            } else {
                self.builder.terminate_unreachable();
            }
        }
        self.end_function()
    }

    fn start_function(&mut self, id: FuncId) -> Result<()> {
        if let Some(active) = self.function {
            return Err(GenError::invariant(format!(
                "starting {} while {} is being generated",
                self.module.function(id).name,
                self.module.function(active).name
            )));
        }
        let function = self.module.function(id);
        tracing::debug!(function = %function.name, params = function.params.len(), "start function");
        self.builder = FunctionBuilder::new(&function.params);
        self.function = Some(id);
        Ok(())
    }

    fn end_function(&mut self) -> Result<()> {
        let id = self
            .function
            .take()
            .ok_or_else(|| GenError::invariant("ending a function that was not started"))?;
        if !self.scopes.is_empty() {
            return Err(GenError::invariant(format!(
                "{} scopes left open at the end of {}",
                self.scopes.depth(),
                self.module.function(id).name
            )));
        }
        let body = mem::replace(&mut self.builder, FunctionBuilder::new(&[])).finish();
        tracing::debug!(
            function = %self.module.function(id).name,
            blocks = body.blocks_in_order().count(),
            "end function"
        );
        self.module.define_function(id, body);
        Ok(())
    }

    /// Whether a callable is being inlined into the current function.
    pub(crate) fn is_inlining(&self) -> bool {
        !self.inline_levels.is_empty()
    }

    /// Return `value` from the current function, or from the callable being inlined.
    pub(crate) fn add_return(&mut self, value: LoweredValue) -> Result<()> {
        if let Some(level) = self.inline_levels.last_mut() {
            if value.is_unit() {
                return Ok(());
            }
            if level.is_some() {
                return Err(GenError::invariant("inline return value defined twice"));
            }
            *level = Some(value);
            return Ok(());
        }
        let updates = self.scopes.exit_function(&value)?;
        self.emit_updates(updates)?;
        if value.is_unit() {
            self.builder.terminate_return(None);
        } else {
            self.builder.terminate_return(Some(value.into_ir()));
        }
        Ok(())
    }

    /// Unwind every scope and abort with `message`.
    pub(crate) fn add_fail(&mut self, message: LoweredValue) -> Result<()> {
        if self.is_inlining() {
            return Err(GenError::invariant("fail inside an inlined callable"));
        }
        // The message outlives the unwinding.
        let updates = self.scopes.exit_function(&message)?;
        self.emit_updates(updates)?;
        self.builder
            .call_runtime(RuntimeFn::Fail, vec![message.into_ir()]);
        self.builder.terminate_unreachable();
        Ok(())
    }

    // ── Subexpressions ─────────────────────────────────────────

    /// Lower `lower` in a scope of its own, handing the result to the caller.
    ///
    /// The caller owns one reference to the returned value and must store
    /// it somewhere that releases it.
    pub(crate) fn build_owned(
        &mut self,
        lower: impl FnOnce(&mut Self) -> Result<LoweredValue>,
    ) -> Result<LoweredValue> {
        self.scopes.open_scope();
        let value = lower(self)?;
        let updates = self.scopes.close_scope_returning(&value)?;
        self.emit_updates(updates)?;
        Ok(value)
    }

    /// Close the innermost scope and emit what it owes.
    pub(crate) fn close_scope(&mut self) -> Result<()> {
        let terminated = self.builder.is_terminated();
        let updates = self.scopes.close_scope(terminated)?;
        self.emit_updates(updates)
    }

    // ── Count emission ─────────────────────────────────────────

    pub(crate) fn emit_updates(&mut self, updates: Vec<CountUpdate>) -> Result<()> {
        for update in updates {
            match update {
                CountUpdate::Modify {
                    kind,
                    change,
                    value,
                    recurse,
                } => self.modify_counts(kind, &Value::i32(change), &value, recurse)?,
                CountUpdate::Release(value) => {
                    let function = if matches!(value.ty(), Type::Array(_)) {
                        RuntimeFn::QubitReleaseArray
                    } else {
                        RuntimeFn::QubitRelease
                    };
                    self.builder.call_runtime(function, vec![value.into_ir()]);
                }
            }
        }
        Ok(())
    }

    /// Emit a count change of `value`; `recurse` extends it to contained items.
    ///
    /// Items are visited before their container. Callables reach their
    /// capture tuple through the capture count entry points.
    pub(crate) fn modify_counts(
        &mut self,
        kind: CountKind,
        change: &Value,
        value: &LoweredValue,
        recurse: bool,
    ) -> Result<()> {
        if let LoweredValue::Pointer { cell, ty } = value {
            let loaded = self.load_cell(cell, ty);
            return self.modify_counts(kind, change, &loaded, recurse);
        }
        let Some(function) = count_function(value.ty(), kind) else {
            return Ok(());
        };
        if recurse {
            match value.ty() {
                Type::Tuple(_) | Type::Udt(_) => {
                    let items = self.tuple_items(value.ty())?;
                    for (index, item_ty) in items.iter().enumerate() {
                        if has_count(item_ty, kind) {
                            let item = self.tuple_element(value, index)?;
                            self.modify_counts(kind, change, &item, true)?;
                        }
                    }
                }
                Type::Array(item_ty) if has_count(item_ty, kind) => {
                    self.for_array_loop(value, |ctx, item| {
                        ctx.modify_counts(kind, change, &item, true)
                    })?;
                }
                Type::Function { .. } | Type::Operation { .. } => {
                    self.builder.call_runtime(
                        capture_count_function(kind),
                        vec![value.ir().clone(), change.clone()],
                    );
                }
                _ => {}
            }
        }
        self.builder
            .call_runtime(function, vec![value.ir().clone(), change.clone()]);
        Ok(())
    }

    /// Change a reference count now, after the deferred increases of the innermost scope.
    pub(crate) fn update_reference_count(
        &mut self,
        change: i32,
        value: &LoweredValue,
        shallow: bool,
    ) -> Result<()> {
        let updates = self.scopes.update_reference_count(change, value, shallow)?;
        self.emit_updates(updates)
    }

    pub(crate) fn update_alias_count(
        &mut self,
        change: i32,
        value: &LoweredValue,
        shallow: bool,
    ) -> Result<()> {
        let updates = ScopeManager::update_alias_count(change, value, shallow);
        self.emit_updates(updates)
    }

    /// Load the content of a mutable variable's cell.
    pub(crate) fn load_cell(&mut self, cell: &Value, ty: &Type) -> LoweredValue {
        let value = self.builder.load(lower_type(ty), cell.clone());
        LoweredValue::from_ir(value, ty.clone())
    }
}

#[cfg(test)]
mod tests;
