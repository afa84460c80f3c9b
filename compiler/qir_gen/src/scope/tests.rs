#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use qir_ir::{Value, VarId};

use super::*;

fn var(n: u32, ty: Type) -> LoweredValue {
    LoweredValue::from_ir(Value::Var(VarId::new(n)), ty)
}

fn int_array(n: u32) -> LoweredValue {
    var(n, Type::array(Type::Int))
}

fn unref(value: &LoweredValue) -> CountUpdate {
    CountUpdate::Modify {
        kind: CountKind::Reference,
        change: -1,
        value: value.clone(),
        recurse: true,
    }
}

fn reference(value: &LoweredValue, change: i32) -> CountUpdate {
    CountUpdate::Modify {
        kind: CountKind::Reference,
        change,
        value: value.clone(),
        recurse: true,
    }
}

fn alias(value: &LoweredValue, change: i32) -> CountUpdate {
    CountUpdate::Modify {
        kind: CountKind::Alias,
        change,
        value: value.clone(),
        recurse: true,
    }
}

#[test]
fn owned_values_are_unreferenced_in_reverse_order() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let a = int_array(1);
    let b = var(2, Type::String);
    let c = int_array(3);
    for v in [&a, &b, &c] {
        scopes.register_value(v, false).unwrap();
    }
    let updates = scopes.close_scope(false).unwrap();
    assert_eq!(updates, vec![unref(&c), unref(&b), unref(&a)]);
    assert!(scopes.is_empty());
}

#[test]
fn scalars_are_not_tracked() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    scopes.register_value(&var(1, Type::Int), false).unwrap();
    scopes.register_value(&var(2, Type::Result), false).unwrap();
    scopes.increase_reference_count(&var(3, Type::Qubit), false).unwrap();
    assert_eq!(scopes.close_scope(false).unwrap(), vec![]);
}

#[test]
fn terminated_scope_emits_nothing() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    scopes.register_value(&int_array(1), false).unwrap();
    assert_eq!(scopes.close_scope(true).unwrap(), vec![]);
}

#[test]
fn returned_value_transfers_ownership() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    scopes.open_scope();
    let inner = int_array(1);
    scopes.register_value(&inner, false).unwrap();
    let updates = scopes.close_scope_returning(&inner).unwrap();
    assert_eq!(updates, vec![]);
    // the enclosing scope did not take ownership; the caller registers it there
    assert_eq!(scopes.depth(), 1);
}

#[test]
fn returning_a_borrowed_value_references_it() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let outer = int_array(1);
    scopes.register_value(&outer, false).unwrap();
    scopes.open_scope();
    let updates = scopes.close_scope_returning(&outer).unwrap();
    assert_eq!(updates, vec![reference(&outer, 1)]);
}

#[test]
fn variables_are_alias_counted() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let a = int_array(1);
    let name = Name::from_raw(10);
    scopes.register_value(&a, false).unwrap();
    let bind = scopes.register_variable(name, a.clone(), None).unwrap();
    assert_eq!(bind, vec![alias(&a, 1)]);
    assert_eq!(scopes.variable(name), Some(&a));
    let updates = scopes.close_scope(false).unwrap();
    assert_eq!(updates, vec![alias(&a, -1), unref(&a)]);
    assert_eq!(scopes.variable(name), None);
}

#[test]
fn inner_bindings_shadow_outer_ones() {
    let mut scopes = ScopeManager::new();
    let name = Name::from_raw(4);
    scopes.open_scope();
    scopes.register_variable(name, var(1, Type::Int), None).unwrap();
    scopes.open_scope();
    scopes.register_variable(name, var(2, Type::Int), None).unwrap();
    assert_eq!(scopes.variable(name), Some(&var(2, Type::Int)));
    scopes.close_scope(false).unwrap();
    assert_eq!(scopes.variable(name), Some(&var(1, Type::Int)));
}

#[test]
fn mutable_binding_takes_over_fresh_value() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let a = int_array(1);
    let cell = LoweredValue::Pointer {
        cell: Value::Var(VarId::new(2)),
        ty: Type::array(Type::Int),
    };
    scopes.register_value(&a, false).unwrap();
    let bind = scopes
        .register_mutable(Name::from_raw(1), cell.clone(), &a, None)
        .unwrap();
    assert_eq!(bind, vec![alias(&a, 1)]);
    let updates = scopes.close_scope(false).unwrap();
    assert_eq!(updates, vec![alias(&cell, -1), unref(&cell)]);
}

#[test]
fn mutable_binding_from_local_references_again() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let a = int_array(1);
    let source = Name::from_raw(1);
    scopes.register_value(&a, false).unwrap();
    scopes.register_variable(source, a.clone(), None).unwrap();
    let cell = LoweredValue::Pointer {
        cell: Value::Var(VarId::new(2)),
        ty: Type::array(Type::Int),
    };
    let bind = scopes
        .register_mutable(Name::from_raw(2), cell, &a, Some(source))
        .unwrap();
    assert_eq!(bind, vec![alias(&a, 1), reference(&a, 1)]);
}

#[test]
fn reading_a_mutable_into_an_immutable_takes_a_reference() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let cell = LoweredValue::Pointer {
        cell: Value::Var(VarId::new(1)),
        ty: Type::array(Type::Int),
    };
    let initial = int_array(2);
    let source = Name::from_raw(1);
    scopes.register_mutable(source, cell, &initial, None).unwrap();
    let loaded = int_array(3);
    let bind = scopes
        .register_variable(Name::from_raw(2), loaded.clone(), Some(source))
        .unwrap();
    assert_eq!(bind, vec![alias(&loaded, 1), reference(&loaded, 1)]);
    let updates = scopes.close_scope(false).unwrap();
    assert!(updates.contains(&unref(&loaded)));
}

#[test]
fn shallow_unassignment_defers_the_unreference() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let old = int_array(1);
    let updates = scopes.unassign_from_mutable(&old, true).unwrap();
    assert_eq!(
        updates,
        vec![CountUpdate::Modify {
            kind: CountKind::Alias,
            change: -1,
            value: old.clone(),
            recurse: false,
        }]
    );
    let closing = scopes.close_scope(false).unwrap();
    assert_eq!(
        closing,
        vec![CountUpdate::Modify {
            kind: CountKind::Reference,
            change: -1,
            value: old,
            recurse: false,
        }]
    );
}

#[test]
fn deep_unassignment_is_immediate() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let old = int_array(1);
    let updates = scopes.unassign_from_mutable(&old, false).unwrap();
    assert_eq!(updates, vec![alias(&old, -1), unref(&old)]);
    assert_eq!(scopes.close_scope(false).unwrap(), vec![]);
}

#[test]
fn assignment_of_fresh_value_moves_ownership() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let new = int_array(1);
    scopes.register_value(&new, false).unwrap();
    let updates = scopes.assign_to_mutable(&new, false, false).unwrap();
    assert_eq!(updates, vec![alias(&new, 1)]);
    assert_eq!(scopes.close_scope(false).unwrap(), vec![]);
}

#[test]
fn assignment_from_local_references_again() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let new = int_array(1);
    scopes.register_value(&new, false).unwrap();
    let updates = scopes.assign_to_mutable(&new, true, false).unwrap();
    assert_eq!(updates, vec![alias(&new, 1), reference(&new, 1)]);
    assert_eq!(scopes.close_scope(false).unwrap(), vec![unref(&new)]);
}

#[test]
fn qubits_are_released_after_unreferences() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let q1 = var(1, Type::Qubit);
    let qs = var(2, Type::array(Type::Qubit));
    let a = int_array(3);
    scopes.register_allocated_qubits(&q1).unwrap();
    scopes.register_allocated_qubits(&qs).unwrap();
    scopes.register_value(&a, false).unwrap();
    let updates = scopes.close_scope(false).unwrap();
    assert_eq!(
        updates,
        vec![
            unref(&a),
            CountUpdate::Release(qs),
            CountUpdate::Release(q1)
        ]
    );
}

#[test]
fn exit_function_unwinds_all_scopes_and_keeps_them() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let outer = int_array(1);
    scopes.register_value(&outer, false).unwrap();
    scopes.open_scope();
    let inner = int_array(2);
    scopes.register_value(&inner, false).unwrap();
    let ret = scopes.exit_function(&inner).unwrap();
    assert_eq!(ret, vec![unref(&outer)]);
    assert_eq!(scopes.depth(), 2);
    // the fall-through path still owns both
    let closing = scopes.close_scope(false).unwrap();
    assert_eq!(closing, vec![unref(&inner)]);
}

#[test]
fn exit_scope_rejects_pending_increases() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    scopes.increase_reference_count(&int_array(1), false).unwrap();
    let err = scopes.exit_scope().unwrap_err();
    assert!(err.is_invariant_violation());
}

#[test]
fn pending_increases_applied_before_immediate_changes() {
    let mut scopes = ScopeManager::new();
    scopes.open_scope();
    let a = int_array(1);
    let s = var(2, Type::String);
    scopes.increase_reference_count(&a, true).unwrap();
    let updates = scopes.update_reference_count(1, &s, false).unwrap();
    assert_eq!(
        updates,
        vec![
            CountUpdate::Modify {
                kind: CountKind::Reference,
                change: 1,
                value: a,
                recurse: false,
            },
            reference(&s, 1)
        ]
    );
    assert_eq!(ScopeManager::update_alias_count(1, &s, false), vec![]);
}

#[test]
fn closing_without_a_scope_is_an_invariant_violation() {
    let mut scopes = ScopeManager::new();
    assert!(scopes.close_scope(false).unwrap_err().is_invariant_violation());
    assert!(scopes.register_value(&int_array(1), false).is_err());
}
