//! Scoped qubit allocation.
//!
//! `use (q, rs) = (Qubit(), Qubit[n]) { ... }` allocates in a scope of its
//! own that releases every qubit when it closes, in reverse order of
//! allocation. A terminated body already released them while unwinding.

use qir_ast::{Block, QubitInit, Span, SymbolTuple, Type};
use qir_ir::RuntimeFn;

use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// Type of the value an initializer produces.
fn init_type(init: &QubitInit) -> Type {
    match init {
        QubitInit::Single => Type::Qubit,
        QubitInit::Register(_) => Type::array(Type::Qubit),
        QubitInit::Tuple(items) => Type::Tuple(items.iter().map(init_type).collect()),
    }
}

impl GenerationContext<'_> {
    pub(super) fn lower_qubits(
        &mut self,
        symbols: &SymbolTuple,
        init: &QubitInit,
        body: &Block,
        span: Span,
    ) -> Result<()> {
        self.scopes.open_scope();
        self.bind_qubits(symbols, init, span)?;
        self.lower_statements(&body.stmts)?;
        self.close_scope()
    }

    /// Allocate and bind, matching tuple patterns against tuple initializers.
    fn bind_qubits(&mut self, symbols: &SymbolTuple, init: &QubitInit, span: Span) -> Result<()> {
        match (symbols, init) {
            (SymbolTuple::Tuple(patterns), QubitInit::Tuple(items)) => {
                if patterns.len() != items.len() {
                    return Err(GenError::unsupported(
                        UnsupportedKind::DestructuringShape,
                        span,
                    ));
                }
                for (pattern, item) in patterns.iter().zip(items) {
                    self.bind_qubits(pattern, item, span)?;
                }
                Ok(())
            }
            (SymbolTuple::Tuple(_), _) => Err(GenError::unsupported(
                UnsupportedKind::DestructuringShape,
                span,
            )),
            (symbols, init) => {
                let value = self.allocate_qubits(init)?;
                self.bind_produced(symbols, value, None, span)
            }
        }
    }

    fn allocate_qubits(&mut self, init: &QubitInit) -> Result<LoweredValue> {
        match init {
            QubitInit::Single => {
                let raw = self
                    .builder
                    .call_runtime_value(RuntimeFn::QubitAllocate, Vec::new());
                let qubit = LoweredValue::from_ir(raw, Type::Qubit);
                self.scopes.register_allocated_qubits(&qubit)?;
                Ok(qubit)
            }
            QubitInit::Register(length) => {
                let length = self.lower_expr(length)?.into_ir();
                let raw = self
                    .builder
                    .call_runtime_value(RuntimeFn::QubitAllocateArray, vec![length]);
                // Releasing the register also drops the array.
                let register = LoweredValue::from_ir(raw, Type::array(Type::Qubit));
                self.scopes.register_allocated_qubits(&register)?;
                Ok(register)
            }
            QubitInit::Tuple(items) => {
                let values = items
                    .iter()
                    .map(|item| self.allocate_qubits(item))
                    .collect::<Result<Vec<_>>>()?;
                self.tuple_from_values(&init_type(init), &values)
            }
        }
    }
}
