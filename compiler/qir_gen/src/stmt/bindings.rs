//! Bindings and assignments.
//!
//! A tuple pattern matched against a tuple literal binds item by item
//! without building the tuple. Anything else is evaluated once and
//! destructured through its items.
//!
//! A mutable variable lives in a stack cell holding one reference to its
//! content. `set` swaps the content: the new value is referenced, aliased
//! by the variable, and the old one released.

use qir_ast::{Accessor, ExprKind, Identifier, Name, Span, SymbolTuple, Type, TypedExpr};
use qir_ir::Value;

use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::types::lower_type;
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// How a pattern takes the values bound to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BindMode {
    Immutable,
    Mutable,
    Assign,
}

/// Pattern assigned to by a `set` statement.
fn assignment_symbols(target: &TypedExpr) -> Result<SymbolTuple> {
    match &target.kind {
        ExprKind::Identifier(Identifier::Local(name)) => Ok(SymbolTuple::Variable(*name)),
        ExprKind::ValueTuple(items) => items
            .iter()
            .map(assignment_symbols)
            .collect::<Result<_>>()
            .map(SymbolTuple::Tuple),
        ExprKind::Missing => Ok(SymbolTuple::Discard),
        _ => Err(GenError::unsupported(
            UnsupportedKind::AssignmentTarget,
            target.span,
        )),
    }
}

impl GenerationContext<'_> {
    /// `let symbols = init;`
    pub(crate) fn bind_immutable(
        &mut self,
        symbols: &SymbolTuple,
        init: &TypedExpr,
        span: Span,
    ) -> Result<()> {
        self.bind(BindMode::Immutable, symbols, init, span)
    }

    /// `mutable symbols = init;`
    pub(crate) fn bind_mutable(
        &mut self,
        symbols: &SymbolTuple,
        init: &TypedExpr,
        span: Span,
    ) -> Result<()> {
        self.bind(BindMode::Mutable, symbols, init, span)
    }

    /// `set target = value;`
    ///
    /// `set x = x w/ i <- v;` updates the content of `x` in place when
    /// nothing else refers to it.
    pub(crate) fn lower_set(
        &mut self,
        target: &TypedExpr,
        value: &TypedExpr,
        span: Span,
    ) -> Result<()> {
        if let (
            ExprKind::Identifier(Identifier::Local(name)),
            ExprKind::CopyAndUpdate {
                target: original,
                accessor,
                value: item,
            },
        ) = (&target.kind, &value.kind)
        {
            if matches!(&original.kind, ExprKind::Identifier(Identifier::Local(source)) if source == name)
            {
                return self.update_in_place(*name, accessor, item, span);
            }
        }
        let symbols = assignment_symbols(target)?;
        self.bind(BindMode::Assign, &symbols, value, span)
    }

    /// Bind a value produced by a loop or an allocation immutably.
    pub(crate) fn bind_produced(
        &mut self,
        symbols: &SymbolTuple,
        value: LoweredValue,
        from_local: Option<Name>,
        span: Span,
    ) -> Result<()> {
        self.bind_value(BindMode::Immutable, symbols, value, from_local, span)
    }

    fn bind(
        &mut self,
        mode: BindMode,
        symbols: &SymbolTuple,
        init: &TypedExpr,
        span: Span,
    ) -> Result<()> {
        if let (SymbolTuple::Tuple(patterns), ExprKind::ValueTuple(items)) = (symbols, &init.kind)
        {
            if patterns.len() != items.len() {
                return Err(GenError::unsupported(
                    UnsupportedKind::DestructuringShape,
                    span,
                ));
            }
            for (pattern, item) in patterns.iter().zip(items) {
                self.bind(mode, pattern, item, span)?;
            }
            return Ok(());
        }
        let value = self.lower_expr(init)?;
        self.bind_value(mode, symbols, value, init.accessed_via_local(), span)
    }

    /// Bind an evaluated value; `from_local` names the variable it was read through.
    fn bind_value(
        &mut self,
        mode: BindMode,
        symbols: &SymbolTuple,
        value: LoweredValue,
        from_local: Option<Name>,
        span: Span,
    ) -> Result<()> {
        match symbols {
            SymbolTuple::Discard => Ok(()),
            SymbolTuple::Variable(name) => match mode {
                BindMode::Immutable => {
                    if from_local.is_none() {
                        self.name_value(&value, *name);
                    }
                    let updates = self.scopes.register_variable(*name, value, from_local)?;
                    self.emit_updates(updates)
                }
                BindMode::Mutable => self.new_mutable(*name, value, from_local),
                BindMode::Assign => self.assign_mutable(*name, value, from_local, span),
            },
            SymbolTuple::Tuple(patterns) => {
                let items = self.destructure(&value, patterns.len(), span)?;
                for (pattern, item) in patterns.iter().zip(items) {
                    self.bind_value(mode, pattern, item, from_local, span)?;
                }
                Ok(())
            }
        }
    }

    fn destructure(
        &mut self,
        value: &LoweredValue,
        count: usize,
        span: Span,
    ) -> Result<Vec<LoweredValue>> {
        match value.ty() {
            Type::Unit if count == 0 => Ok(Vec::new()),
            Type::Tuple(items) if items.len() == count => self.tuple_elements(value),
            _ => Err(GenError::unsupported(
                UnsupportedKind::DestructuringShape,
                span,
            )),
        }
    }

    fn new_mutable(
        &mut self,
        name: Name,
        initial: LoweredValue,
        from_local: Option<Name>,
    ) -> Result<()> {
        let ty = initial.ty().clone();
        let cell = self.builder.alloca(lower_type(&ty));
        if let Some(var) = cell.as_var() {
            self.builder.set_var_name(var, self.interner.lookup(name));
        }
        self.builder.store(initial.ir().clone(), cell.clone());
        let cell = LoweredValue::Pointer { cell, ty };
        let updates = self
            .scopes
            .register_mutable(name, cell, &initial, from_local)?;
        self.emit_updates(updates)
    }

    /// Cell and content type of a mutable variable.
    fn mutable_cell(&self, name: Name, span: Span) -> Result<(Value, Type)> {
        match self.scopes.variable(name) {
            Some(LoweredValue::Pointer { cell, ty }) => Ok((cell.clone(), ty.clone())),
            Some(_) => Err(GenError::unsupported(
                UnsupportedKind::AssignmentTarget,
                span,
            )),
            None => Err(GenError::unsupported(
                UnsupportedKind::UnknownVariable,
                span,
            )),
        }
    }

    fn assign_mutable(
        &mut self,
        name: Name,
        value: LoweredValue,
        from_local: Option<Name>,
        span: Span,
    ) -> Result<()> {
        let (cell, ty) = self.mutable_cell(name, span)?;
        let updates = self
            .scopes
            .assign_to_mutable(&value, from_local.is_some(), false)?;
        self.emit_updates(updates)?;
        let old = self.load_cell(&cell, &ty);
        let updates = self.scopes.unassign_from_mutable(&old, false)?;
        self.emit_updates(updates)?;
        self.builder.store(value.into_ir(), cell);
        Ok(())
    }

    /// `set name = name w/ accessor <- item;`
    ///
    /// The old content is unaliased before the copy so that the runtime
    /// can skip copying it.
    fn update_in_place(
        &mut self,
        name: Name,
        accessor: &Accessor,
        item: &TypedExpr,
        span: Span,
    ) -> Result<()> {
        let (cell, ty) = self.mutable_cell(name, span)?;
        let old = self.load_cell(&cell, &ty);
        let updates = self.scopes.unassign_from_mutable(&old, true)?;
        self.emit_updates(updates)?;
        let updated = self.copy_and_update(&old, accessor, item, true, span)?;
        let updates = self.scopes.assign_to_mutable(&updated, false, true)?;
        self.emit_updates(updates)?;
        self.builder.store(updated.into_ir(), cell);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn assignment_targets() {
        let a = Name::from_raw(1);
        let b = Name::from_raw(2);
        let target = TypedExpr::tuple(vec![
            TypedExpr::local(a, Type::Int),
            TypedExpr::missing(Type::Int),
            TypedExpr::local(b, Type::Bool),
        ]);
        assert_eq!(
            assignment_symbols(&target),
            Ok(SymbolTuple::Tuple(vec![
                SymbolTuple::Variable(a),
                SymbolTuple::Discard,
                SymbolTuple::Variable(b),
            ]))
        );
        assert!(matches!(
            assignment_symbols(&TypedExpr::int(3)),
            Err(GenError::Unsupported {
                kind: UnsupportedKind::AssignmentTarget,
                ..
            })
        ));
    }
}
