#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use qir_ast::{
    Accessor, BinaryOp, Block, CallableAttrs, CallableKind, Functors, Param, QubitInit, SpecKind,
    Stmt, StmtKind, SymbolTuple, Type, TypeItems, TypedExpr,
};
use qir_ir::{RuntimeFn, Terminator, Value};

use crate::test_helpers::{
    block_names, direct_calls, function, provided, runtime_calls, Fixture,
};
use crate::{generate, GenConfig, UnsupportedKind};

fn ret(value: i64) -> Block {
    Block::new(vec![Stmt::ret(TypedExpr::int(value))])
}

fn generate_error(fx: &Fixture) -> UnsupportedKind {
    generate(&fx.program(), &fx.interner, &GenConfig::default())
        .unwrap_err()
        .unsupported_kind()
        .unwrap()
}

// ── Control flow ────────────────────────────────────────────────────

#[test]
fn if_without_else_falls_through_to_continue() {
    let mut fx = Fixture::new();
    let b = fx.name("b");
    fx.function(
        "F",
        vec![Param::named(b, Type::Bool)],
        Type::Int,
        vec![
            Stmt::if_else(TypedExpr::local(b, Type::Bool), ret(1), None),
            Stmt::ret(TypedExpr::int(2)),
        ],
    );
    let module = fx.generate();
    assert_eq!(block_names(&module, "Test__F__body"), ["entry", "then0", "continue"]);
}

#[test]
fn elif_chain_tests_each_condition() {
    let mut fx = Fixture::new();
    let b = fx.name("b");
    let c = fx.name("c");
    fx.function(
        "F",
        vec![Param::named(b, Type::Bool), Param::named(c, Type::Bool)],
        Type::Int,
        vec![Stmt::new(StmtKind::If {
            arms: vec![
                (TypedExpr::local(b, Type::Bool), ret(1)),
                (TypedExpr::local(c, Type::Bool), ret(2)),
            ],
            otherwise: Some(ret(3)),
        })],
    );
    let module = fx.generate();
    assert_eq!(
        block_names(&module, "Test__F__body"),
        ["entry", "then0", "test1", "then1", "else", "continue"]
    );
    let body = function(&module, "Test__F__body").body.as_ref().unwrap();
    assert_eq!(
        body.block_named("continue").unwrap().terminator,
        Terminator::Unreachable
    );
}

#[test]
fn constant_conditions_prune_arms() {
    let mut fx = Fixture::new();
    fx.function(
        "F",
        Vec::new(),
        Type::Int,
        vec![Stmt::new(StmtKind::If {
            arms: vec![
                (TypedExpr::bool(false), ret(1)),
                (TypedExpr::bool(true), ret(2)),
            ],
            otherwise: Some(ret(3)),
        })],
    );
    let module = fx.generate();
    assert_eq!(block_names(&module, "Test__F__body"), ["entry", "continue"]);
    let body = function(&module, "Test__F__body").body.as_ref().unwrap();
    assert_eq!(
        body.block_named("entry").unwrap().terminator,
        Terminator::Return(Some(Value::int(2)))
    );
    assert_eq!(
        body.block_named("continue").unwrap().terminator,
        Terminator::Unreachable
    );
}

#[test]
fn while_loop_layout() {
    let mut fx = Fixture::new();
    let i = fx.name("i");
    let local = || TypedExpr::local(i, Type::Int);
    fx.function(
        "Count",
        Vec::new(),
        Type::Int,
        vec![
            Stmt::mutable_var(i, TypedExpr::int(0)),
            Stmt::while_loop(
                TypedExpr::binary(BinaryOp::Lt, local(), TypedExpr::int(3)),
                Block::new(vec![Stmt::set(
                    local(),
                    TypedExpr::binary(BinaryOp::Add, local(), TypedExpr::int(1)),
                )]),
            ),
            Stmt::ret(local()),
        ],
    );
    let module = fx.generate();
    assert_eq!(
        block_names(&module, "Test__Count__body"),
        ["entry", "while", "do", "wend"]
    );
    assert!(runtime_calls(&module, "Test__Count__body").is_empty());
}

#[test]
fn repeat_loop_layout() {
    let mut fx = Fixture::new();
    let done = fx.name("done");
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![
            Stmt::mutable_var(done, TypedExpr::bool(false)),
            Stmt::repeat(
                Block::empty(),
                TypedExpr::local(done, Type::Bool),
                Block::new(vec![Stmt::set(
                    TypedExpr::local(done, Type::Bool),
                    TypedExpr::bool(true),
                )]),
            ),
        ],
    );
    let module = fx.generate();
    assert_eq!(
        block_names(&module, "Test__F__body"),
        ["entry", "repeat", "until", "fixup", "rend"]
    );
}

#[test]
fn range_loop_layout() {
    let mut fx = Fixture::new();
    let k = fx.name("k");
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![Stmt::for_each(
            SymbolTuple::Variable(k),
            TypedExpr::range(TypedExpr::int(0), None, TypedExpr::int(2)),
            Block::empty(),
        )],
    );
    let module = fx.generate();
    assert_eq!(
        block_names(&module, "Test__F__body"),
        ["entry", "header", "body", "exiting", "exit"]
    );
}

#[test]
fn iterating_an_int_is_rejected() {
    let mut fx = Fixture::new();
    let k = fx.name("k");
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![Stmt::for_each(
            SymbolTuple::Variable(k),
            TypedExpr::int(3),
            Block::empty(),
        )],
    );
    assert_eq!(generate_error(&fx), UnsupportedKind::IterationTarget);
}

// ── Bindings ────────────────────────────────────────────────────────

#[test]
fn tuple_pattern_must_match_literal_shape() {
    let mut fx = Fixture::new();
    let a = fx.name("a");
    let b = fx.name("b");
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![Stmt::new(StmtKind::Let {
            symbols: SymbolTuple::variables(&[a, b]),
            init: TypedExpr::tuple(vec![
                TypedExpr::int(1),
                TypedExpr::int(2),
                TypedExpr::int(3),
            ]),
        })],
    );
    assert_eq!(generate_error(&fx), UnsupportedKind::DestructuringShape);
}

#[test]
fn set_of_a_literal_is_rejected() {
    let mut fx = Fixture::new();
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![Stmt::set(TypedExpr::int(1), TypedExpr::int(2))],
    );
    assert_eq!(generate_error(&fx), UnsupportedKind::AssignmentTarget);
}

#[test]
fn self_update_copies_only_when_shared() {
    let mut fx = Fixture::new();
    let a = fx.name("a");
    let local = || TypedExpr::local(a, Type::array(Type::Int));
    fx.function(
        "F",
        Vec::new(),
        Type::array(Type::Int),
        vec![
            Stmt::mutable_var(
                a,
                TypedExpr::array(
                    Type::Int,
                    vec![TypedExpr::int(1), TypedExpr::int(2), TypedExpr::int(3)],
                ),
            ),
            Stmt::set(
                local(),
                TypedExpr::copy_and_update(
                    local(),
                    Accessor::Index(Box::new(TypedExpr::int(0))),
                    TypedExpr::int(9),
                ),
            ),
            Stmt::ret(local()),
        ],
    );
    let calls = runtime_calls(&fx.generate(), "Test__F__body");
    let creates = calls
        .iter()
        .filter(|call| **call == RuntimeFn::ArrayCreate1d)
        .count();
    let copies = calls
        .iter()
        .filter(|call| **call == RuntimeFn::ArrayCopy)
        .count();
    assert_eq!((creates, copies), (1, 1));
}

#[test]
fn fail_keeps_its_message_alive() {
    let mut fx = Fixture::new();
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![Stmt::fail(TypedExpr::string("boom"))],
    );
    let module = fx.generate();
    assert_eq!(
        runtime_calls(&module, "Test__F__body"),
        [RuntimeFn::StringCreate, RuntimeFn::Fail]
    );
    let body = function(&module, "Test__F__body").body.as_ref().unwrap();
    assert_eq!(
        body.block_named("entry").unwrap().terminator,
        Terminator::Unreachable
    );
}

// ── Qubits ──────────────────────────────────────────────────────────

#[test]
fn qubits_are_released_in_reverse_order() {
    let mut fx = Fixture::new();
    let q = fx.name("q");
    let r = fx.name("r");
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![Stmt::qubits(
            SymbolTuple::variables(&[q, r]),
            QubitInit::Tuple(vec![
                QubitInit::Single,
                QubitInit::Register(Box::new(TypedExpr::int(2))),
            ]),
            Block::empty(),
        )],
    );
    assert_eq!(
        runtime_calls(&fx.generate(), "Test__F__body"),
        [
            RuntimeFn::QubitAllocate,
            RuntimeFn::QubitAllocateArray,
            RuntimeFn::ArrayUpdateAliasCount,
            RuntimeFn::ArrayUpdateAliasCount,
            RuntimeFn::QubitReleaseArray,
            RuntimeFn::QubitRelease,
        ]
    );
}

#[test]
fn qubit_pattern_must_match_initializer() {
    let mut fx = Fixture::new();
    let q = fx.name("q");
    let r = fx.name("r");
    fx.function(
        "F",
        Vec::new(),
        Type::Unit,
        vec![Stmt::qubits(
            SymbolTuple::variables(&[q, r]),
            QubitInit::Single,
            Block::empty(),
        )],
    );
    assert_eq!(generate_error(&fx), UnsupportedKind::DestructuringShape);
}

// ── Declarations ────────────────────────────────────────────────────

#[test]
fn user_defined_types_get_constructors() {
    let mut fx = Fixture::new();
    let first = fx.name("First");
    let second = fx.name("Second");
    let pair = fx.udt(
        "Pair",
        TypeItems::Tuple(vec![
            TypeItems::Named(first, Type::Int),
            TypeItems::Named(second, Type::Int),
        ]),
    );
    let pair_ty = Type::Udt(pair);
    fx.function(
        "Make",
        Vec::new(),
        pair_ty.clone(),
        vec![Stmt::ret(TypedExpr::call(
            TypedExpr::global(
                pair,
                Type::function(Type::Tuple(vec![Type::Int, Type::Int]), pair_ty),
            ),
            TypedExpr::tuple(vec![TypedExpr::int(1), TypedExpr::int(2)]),
        ))],
    );
    let module = fx.generate();
    assert_eq!(direct_calls(&module, "Test__Make__body"), ["Test__Pair__body"]);
    assert_eq!(
        runtime_calls(&module, "Test__Pair__body").first(),
        Some(&RuntimeFn::TupleCreate)
    );
}

#[test]
fn controlled_intrinsic_calls_its_controlled_specialization() {
    let mut fx = Fixture::new();
    let q = fx.name("q");
    let cs = fx.name("cs");
    let functors = Functors::ADJOINT | Functors::CONTROLLED;
    let x = fx.intrinsic_operation("X", vec![Param::named(q, Type::Qubit)], Type::Unit, functors);
    let x_ty = Type::operation(Type::Qubit, Type::Unit, functors);
    fx.function(
        "F",
        vec![
            Param::named(cs, Type::array(Type::Qubit)),
            Param::named(q, Type::Qubit),
        ],
        Type::Unit,
        vec![Stmt::expr(TypedExpr::call(
            TypedExpr::controlled(TypedExpr::global(x, x_ty)),
            TypedExpr::tuple(vec![
                TypedExpr::local(cs, Type::array(Type::Qubit)),
                TypedExpr::local(q, Type::Qubit),
            ]),
        ))],
    );
    let module = fx.generate();
    assert_eq!(direct_calls(&module, "Test__F__body"), ["Test__X__ctl"]);
    assert!(function(&module, "Test__X__ctladj").is_declaration());
}

#[test]
fn wrappers_for_every_callable_on_request() {
    let mut fx = Fixture::new();
    fx.function("F", Vec::new(), Type::Unit, Vec::new());

    let module = fx.generate();
    assert!(module.function_named("Test__F__body__wrapper").is_none());

    let module = fx.generate_with(&GenConfig::default().with_wrappers_for_all(true));
    assert!(module.function_named("Test__F__body__wrapper").is_some());
    assert!(module.global_id("Test__F__FunctionTable").is_some());
}

// ── Inlining ────────────────────────────────────────────────────────

/// `F(b)` returning `Pick(b)`, where `Pick` is marked inline.
fn inline_pick(fx: &mut Fixture, body: Vec<Stmt>) {
    let b = fx.name("b");
    let inline = CallableAttrs {
        inline: true,
        ..CallableAttrs::default()
    };
    let pick = fx.callable(
        "Pick",
        CallableKind::Function,
        vec![Param::named(b, Type::Bool)],
        Type::Int,
        Functors::empty(),
        inline,
        vec![provided(SpecKind::Body, body)],
    );
    fx.function(
        "F",
        vec![Param::named(b, Type::Bool)],
        Type::Int,
        vec![Stmt::ret(TypedExpr::call(
            TypedExpr::global(pick, Type::function(Type::Bool, Type::Int)),
            TypedExpr::local(b, Type::Bool),
        ))],
    );
}

#[test]
fn inline_callables_are_substituted_at_the_call() {
    let mut fx = Fixture::new();
    let b = fx.name("b");
    inline_pick(
        &mut fx,
        vec![Stmt::ret(TypedExpr::conditional(
            TypedExpr::local(b, Type::Bool),
            TypedExpr::int(1),
            TypedExpr::int(2),
        ))],
    );

    let module = fx.generate();
    assert!(direct_calls(&module, "Test__F__body").is_empty());

    let module = fx.generate_with(&GenConfig::default().with_inlining(false));
    assert_eq!(direct_calls(&module, "Test__F__body"), ["Test__Pick__body"]);
}

#[test]
fn second_return_in_an_inlined_body_is_an_invariant_violation() {
    let mut fx = Fixture::new();
    let b = fx.name("b");
    inline_pick(
        &mut fx,
        vec![
            Stmt::if_else(TypedExpr::local(b, Type::Bool), ret(1), None),
            Stmt::ret(TypedExpr::int(2)),
        ],
    );
    let error = generate(&fx.program(), &fx.interner, &GenConfig::default()).unwrap_err();
    assert!(error.is_invariant_violation(), "{error}");
}
