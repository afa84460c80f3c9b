//! Scope-based reference counting.
//!
//! The [`ScopeManager`] keeps a stack of lexical scopes for the function
//! being generated. Each scope records the variables bound in it, the heap
//! values it owns (to be unreferenced when it closes), the qubits it must
//! release, and reference count increases that are deferred until the
//! scope closes.
//!
//! # Deferred counts
//!
//! Values are created with a reference count of one and registered with
//! the scope that created them. Handing a value to a longer-lived owner
//! (returning it from a block, storing it in a tuple) queues a reference
//! count increase instead of emitting it. When the scope closes, every
//! queued increase that matches a queued decrease of the same value is
//! dropped together with it, so that ownership transfers emit no calls.
//!
//! # Emission
//!
//! The manager is pure bookkeeping: operations that need IR return
//! [`CountUpdate`]s in the order they must be emitted, and the
//! generation context turns them into runtime calls.

use std::mem;

use qir_ast::{Name, Type};
use smallvec::SmallVec;

use crate::types::{count_class, has_count, CountClass, CountKind};
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// A count change or release to emit.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CountUpdate {
    /// Change a count of `value`; `recurse` extends the change to the
    /// items the value contains.
    Modify {
        kind: CountKind,
        change: i32,
        value: LoweredValue,
        recurse: bool,
    },
    /// Release a qubit or a qubit array.
    Release(LoweredValue),
}

impl CountUpdate {
    /// Build a count change, or nothing if values of this type carry no such count.
    fn modify(kind: CountKind, change: i32, value: &LoweredValue, recurse: bool) -> Option<Self> {
        has_count(value.ty(), kind).then(|| CountUpdate::Modify {
            kind,
            change,
            value: value.clone(),
            recurse,
        })
    }
}

/// A value with the depth to which a count change applies.
type Tracked = (LoweredValue, bool);

fn same(a: &Tracked, b: &Tracked) -> bool {
    a.0.ir() == b.0.ir() && a.1 == b.1
}

fn try_remove(values: &mut Vec<Tracked>, expected: &Tracked) -> bool {
    match values.iter().position(|tracked| same(tracked, expected)) {
        Some(index) => {
            values.remove(index);
            true
        }
        None => false,
    }
}

fn requires_reference_count(ty: &Type) -> bool {
    count_class(ty) != CountClass::None
}

#[derive(Default)]
struct Scope {
    variables: Vec<(Name, LoweredValue)>,
    pending_references: Vec<Tracked>,
    required_unreferences: Vec<Tracked>,
    releases: Vec<LoweredValue>,
}

impl Scope {
    fn variable(&self, name: Name) -> Option<&LoweredValue> {
        self.variables
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value)
    }

    /// Emit everything owed when control leaves this scope and, for an
    /// early exit from the function, all `parents` (innermost first).
    ///
    /// Pending increases of this scope are consumed. Everything else is
    /// left in place: other paths may still leave the scopes normally.
    fn execute(&mut self, parents: &[&Scope]) -> Vec<CountUpdate> {
        let mut refs: Vec<Tracked> = mem::take(&mut self.pending_references);
        for parent in parents {
            refs.extend(parent.pending_references.iter().cloned());
        }

        let this: &Scope = self;
        let all: SmallVec<[&Scope; 8]> = std::iter::once(this).chain(parents.iter().copied()).collect();

        let mut alias_decreases = Vec::new();
        let mut unrefs: Vec<Tracked> = Vec::new();
        for scope in &all {
            unrefs.extend(scope.required_unreferences.iter().rev().cloned());
            for (_, value) in scope.variables.iter().rev() {
                if value.is_pointer() {
                    unrefs.push((value.clone(), true));
                }
            }
            for (_, value) in &scope.variables {
                alias_decreases.push(value.clone());
            }
        }

        // An increase matched by a decrease of the same value is an ownership transfer.
        refs.retain(|r| !try_remove(&mut unrefs, r));

        let mut updates = Vec::new();
        updates.extend(
            refs.iter()
                .filter_map(|(v, recurse)| CountUpdate::modify(CountKind::Reference, 1, v, *recurse)),
        );
        updates.extend(
            alias_decreases
                .iter()
                .filter_map(|v| CountUpdate::modify(CountKind::Alias, -1, v, true)),
        );
        updates.extend(
            unrefs
                .iter()
                .filter_map(|(v, recurse)| CountUpdate::modify(CountKind::Reference, -1, v, *recurse)),
        );
        for scope in &all {
            updates.extend(scope.releases.iter().rev().cloned().map(CountUpdate::Release));
        }
        updates
    }
}

/// Stack of lexical scopes of the function being generated.
#[derive(Default)]
pub(crate) struct ScopeManager {
    scopes: Vec<Scope>,
}

impl ScopeManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of open scopes.
    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    fn top(&mut self) -> Result<&mut Scope> {
        self.scopes
            .last_mut()
            .ok_or_else(|| GenError::invariant("no open scope"))
    }

    // ── Scope lifetime ─────────────────────────────────────────

    pub(crate) fn open_scope(&mut self) {
        self.scopes.push(Scope::default());
        tracing::trace!(depth = self.scopes.len(), "open scope");
    }

    /// Close the innermost scope.
    ///
    /// A terminated scope emits nothing: every path out of it already
    /// unwound through a return or fail.
    pub(crate) fn close_scope(&mut self, terminated: bool) -> Result<Vec<CountUpdate>> {
        let mut scope = self
            .scopes
            .pop()
            .ok_or_else(|| GenError::invariant("closing a scope that is not open"))?;
        tracing::trace!(
            depth = self.scopes.len() + 1,
            terminated,
            owned = scope.required_unreferences.len(),
            pending = scope.pending_references.len(),
            "close scope"
        );
        if terminated {
            return Ok(Vec::new());
        }
        Ok(scope.execute(&[]))
    }

    /// Close the innermost scope, handing `returned` to the enclosing one.
    pub(crate) fn close_scope_returning(
        &mut self,
        returned: &LoweredValue,
    ) -> Result<Vec<CountUpdate>> {
        self.increase_reference_count(returned, false)?;
        self.close_scope(false)
    }

    /// Emit what leaving the innermost scope owes, but keep it open.
    ///
    /// Used where one path leaves a scope that other paths continue in.
    pub(crate) fn exit_scope(&mut self) -> Result<Vec<CountUpdate>> {
        let scope = self.top()?;
        if !scope.pending_references.is_empty() {
            return Err(GenError::invariant(
                "exiting a scope with pending reference count increases",
            ));
        }
        Ok(scope.execute(&[]))
    }

    /// Emit what returning `returned` from the function owes, for every open scope.
    ///
    /// The scopes stay open; the caller terminates the block.
    pub(crate) fn exit_function(&mut self, returned: &LoweredValue) -> Result<Vec<CountUpdate>> {
        self.increase_reference_count(returned, false)?;
        let Some((top, rest)) = self.scopes.split_last_mut() else {
            return Err(GenError::invariant("exiting a function without an open scope"));
        };
        let parents: SmallVec<[&Scope; 8]> = rest.iter().rev().collect();
        Ok(top.execute(&parents))
    }

    // ── Reference counts ───────────────────────────────────────

    /// Emit the deferred increases of the innermost scope now.
    pub(crate) fn apply_pending_references(&mut self) -> Result<Vec<CountUpdate>> {
        let pending = mem::take(&mut self.top()?.pending_references);
        Ok(pending
            .iter()
            .filter_map(|(v, recurse)| CountUpdate::modify(CountKind::Reference, 1, v, *recurse))
            .collect())
    }

    /// Queue a reference count increase until the innermost scope closes.
    pub(crate) fn increase_reference_count(
        &mut self,
        value: &LoweredValue,
        shallow: bool,
    ) -> Result<()> {
        debug_assert!(!value.is_pointer(), "reference counts apply to loaded values");
        if requires_reference_count(value.ty()) {
            self.top()?.pending_references.push((value.clone(), !shallow));
        }
        Ok(())
    }

    /// Queue a reference count decrease until the innermost scope closes.
    pub(crate) fn decrease_reference_count(
        &mut self,
        value: &LoweredValue,
        shallow: bool,
    ) -> Result<()> {
        self.register_value(value, shallow)
    }

    /// Change a reference count now, after the deferred increases.
    pub(crate) fn update_reference_count(
        &mut self,
        change: i32,
        value: &LoweredValue,
        shallow: bool,
    ) -> Result<Vec<CountUpdate>> {
        let mut updates = self.apply_pending_references()?;
        updates.extend(CountUpdate::modify(CountKind::Reference, change, value, !shallow));
        Ok(updates)
    }

    /// Change an alias count now.
    pub(crate) fn update_alias_count(
        change: i32,
        value: &LoweredValue,
        shallow: bool,
    ) -> Vec<CountUpdate> {
        CountUpdate::modify(CountKind::Alias, change, value, !shallow)
            .into_iter()
            .collect()
    }

    // ── Mutable variables ──────────────────────────────────────

    /// Account for `value` being stored into a mutable variable.
    ///
    /// `from_local` marks a value reached through a local variable, which
    /// needs its own reference: the source may be rebound before the
    /// target goes out of scope.
    pub(crate) fn assign_to_mutable(
        &mut self,
        value: &LoweredValue,
        from_local: bool,
        shallow: bool,
    ) -> Result<Vec<CountUpdate>> {
        let mut updates: Vec<CountUpdate> =
            CountUpdate::modify(CountKind::Alias, 1, value, !shallow).into_iter().collect();
        let scope = self.top()?;
        if from_local || !try_remove(&mut scope.required_unreferences, &(value.clone(), !shallow))
        {
            updates.extend(CountUpdate::modify(CountKind::Reference, 1, value, !shallow));
        }
        Ok(updates)
    }

    /// Account for `old` being removed from a mutable variable.
    ///
    /// A shallow unassignment only concerns the outer container, so its
    /// reference is released when the scope closes; this lets a
    /// copy-and-update of the same variable see the container unaliased.
    pub(crate) fn unassign_from_mutable(
        &mut self,
        old: &LoweredValue,
        shallow: bool,
    ) -> Result<Vec<CountUpdate>> {
        let mut updates: Vec<CountUpdate> =
            CountUpdate::modify(CountKind::Alias, -1, old, !shallow).into_iter().collect();
        if shallow {
            self.register_value(old, true)?;
        } else {
            let scope = self.top()?;
            if !try_remove(&mut scope.pending_references, &(old.clone(), true)) {
                updates.extend(CountUpdate::modify(CountKind::Reference, -1, old, true));
            }
        }
        Ok(updates)
    }

    // ── Bindings ───────────────────────────────────────────────

    /// Bind an immutable variable.
    ///
    /// A value read out of a mutable variable gets its own reference,
    /// released with this scope.
    pub(crate) fn register_variable(
        &mut self,
        name: Name,
        value: LoweredValue,
        from_local: Option<Name>,
    ) -> Result<Vec<CountUpdate>> {
        debug_assert!(!value.is_pointer(), "use register_mutable for cells");
        let source_is_mutable = from_local
            .and_then(|local| self.variable(local))
            .is_some_and(LoweredValue::is_pointer);
        let mut updates: Vec<CountUpdate> =
            CountUpdate::modify(CountKind::Alias, 1, &value, true).into_iter().collect();
        if source_is_mutable {
            updates.extend(CountUpdate::modify(CountKind::Reference, 1, &value, true));
            self.register_value(&value, false)?;
        }
        self.top()?.variables.push((name, value));
        Ok(updates)
    }

    /// Bind a mutable variable stored in `cell`, initialized to `initial`.
    ///
    /// The cell owns one reference to its content. A fresh value transfers
    /// the reference it was created with; a value reached through a local
    /// variable is referenced again.
    pub(crate) fn register_mutable(
        &mut self,
        name: Name,
        cell: LoweredValue,
        initial: &LoweredValue,
        from_local: Option<Name>,
    ) -> Result<Vec<CountUpdate>> {
        debug_assert!(cell.is_pointer(), "mutable variables live in cells");
        let mut updates: Vec<CountUpdate> =
            CountUpdate::modify(CountKind::Alias, 1, initial, true).into_iter().collect();
        let scope = self.top()?;
        if from_local.is_some()
            || !try_remove(&mut scope.required_unreferences, &(initial.clone(), true))
        {
            updates.extend(CountUpdate::modify(CountKind::Reference, 1, initial, true));
        }
        scope.variables.push((name, cell));
        Ok(updates)
    }

    /// Innermost binding of a local variable.
    pub(crate) fn variable(&self, name: Name) -> Option<&LoweredValue> {
        self.scopes.iter().rev().find_map(|scope| scope.variable(name))
    }

    /// Make the innermost scope the owner of a freshly created value.
    pub(crate) fn register_value(&mut self, value: &LoweredValue, shallow: bool) -> Result<()> {
        debug_assert!(!value.is_pointer(), "register loaded values, not cells");
        if requires_reference_count(value.ty()) {
            self.top()?.required_unreferences.push((value.clone(), !shallow));
        }
        Ok(())
    }

    /// Release qubits (a qubit or a qubit array) when the innermost scope closes.
    pub(crate) fn register_allocated_qubits(&mut self, value: &LoweredValue) -> Result<()> {
        self.top()?.releases.push(value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests;
