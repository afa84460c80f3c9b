//! Property tests: generated operators agree with Rust's semantics for
//! every operand type.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

mod common;

use common::{interpreter, run, Fixture};
use proptest::prelude::*;
use qir_ast::{BigInt, BinaryOp, Param, Stmt, Type, TypedExpr};
use qir_eval::{Interpreter, ObjectKind, RtValue};
use qir_ir::Module;

const INT_OPS: [(&str, BinaryOp); 9] = [
    ("Add", BinaryOp::Add),
    ("Sub", BinaryOp::Sub),
    ("Mul", BinaryOp::Mul),
    ("Div", BinaryOp::Div),
    ("Mod", BinaryOp::Mod),
    ("And", BinaryOp::BitAnd),
    ("Or", BinaryOp::BitOr),
    ("Xor", BinaryOp::BitXor),
    ("Shr", BinaryOp::Shr),
];

const DOUBLE_OPS: [(&str, BinaryOp); 5] = [
    ("Add", BinaryOp::Add),
    ("Sub", BinaryOp::Sub),
    ("Mul", BinaryOp::Mul),
    ("Div", BinaryOp::Div),
    ("Pow", BinaryOp::Pow),
];

const COMPARISONS: [(&str, BinaryOp); 6] = [
    ("Lt", BinaryOp::Lt),
    ("LtEq", BinaryOp::LtEq),
    ("Gt", BinaryOp::Gt),
    ("GtEq", BinaryOp::GtEq),
    ("Eq", BinaryOp::Eq),
    ("NotEq", BinaryOp::NotEq),
];

const EQUALITY: [(&str, BinaryOp); 2] = [("Eq", BinaryOp::Eq), ("NotEq", BinaryOp::NotEq)];

/// One two-parameter function per operator, named after it.
fn operators(lhs: &Type, rhs: &Type, ops: &[(&str, BinaryOp)]) -> Module {
    let mut fx = Fixture::new();
    let a = fx.name("a");
    let b = fx.name("b");
    for (name, op) in ops {
        let output = if op.is_comparison() {
            Type::Bool
        } else {
            lhs.clone()
        };
        fx.function(
            name,
            vec![Param::named(a, lhs.clone()), Param::named(b, rhs.clone())],
            output,
            vec![Stmt::ret(TypedExpr::binary(
                *op,
                TypedExpr::local(a, lhs.clone()),
                TypedExpr::local(b, rhs.clone()),
            ))],
        );
    }
    fx.generate()
}

fn int_op(interp: &mut Interpreter<'_>, name: &str, a: i64, b: i64) -> i64 {
    run(interp, name, vec![RtValue::Int(a), RtValue::Int(b)])
        .unwrap()
        .as_int()
        .unwrap()
}

fn double_op(interp: &mut Interpreter<'_>, name: &str, a: f64, b: f64) -> f64 {
    run(interp, name, vec![RtValue::Double(a), RtValue::Double(b)])
        .unwrap()
        .as_double()
        .unwrap()
}

fn holds(interp: &mut Interpreter<'_>, name: &str, a: RtValue, b: RtValue) -> bool {
    run(interp, name, vec![a, b]).unwrap().as_bool().unwrap()
}

fn big(interp: &mut Interpreter<'_>, n: i64) -> RtValue {
    RtValue::Object(interp.heap_mut().allocate(ObjectKind::BigInt(n.into())))
}

fn text(interp: &mut Interpreter<'_>, s: &str) -> RtValue {
    RtValue::Object(interp.heap_mut().allocate(ObjectKind::String(s.to_owned())))
}

/// Run `name` on a big integer and `rhs`, and read the big integer result.
fn big_int_op(interp: &mut Interpreter<'_>, name: &str, a: i64, rhs: RtValue) -> BigInt {
    let lhs = big(interp, a);
    let id = run(interp, name, vec![lhs, rhs])
        .unwrap()
        .as_object()
        .unwrap()
        .unwrap();
    interp.heap().big_int(id).unwrap().clone()
}

fn big_pair_op(interp: &mut Interpreter<'_>, name: &str, a: i64, b: i64) -> BigInt {
    let rhs = big(interp, b);
    big_int_op(interp, name, a, rhs)
}

/// Every comparison of the operands `args` makes, in `COMPARISONS` order.
fn compare_all<F>(interp: &mut Interpreter<'_>, args: F) -> Vec<bool>
where
    F: Fn(&mut Interpreter<'_>) -> (RtValue, RtValue),
{
    COMPARISONS
        .iter()
        .map(|(name, _)| {
            let (lhs, rhs) = args(interp);
            holds(interp, name, lhs, rhs)
        })
        .collect()
}

fn expected<T: PartialOrd>(a: &T, b: &T) -> Vec<bool> {
    vec![a < b, a <= b, a > b, a >= b, a == b, a != b]
}

proptest! {
    #[test]
    fn int_operators_wrap(a in any::<i64>(), b in any::<i64>()) {
        let module = operators(&Type::Int, &Type::Int, &INT_OPS);
        let mut interp = interpreter(&module);
        prop_assert_eq!(int_op(&mut interp, "Add", a, b), a.wrapping_add(b));
        prop_assert_eq!(int_op(&mut interp, "Sub", a, b), a.wrapping_sub(b));
        prop_assert_eq!(int_op(&mut interp, "Mul", a, b), a.wrapping_mul(b));
        prop_assert_eq!(int_op(&mut interp, "And", a, b), a & b);
        prop_assert_eq!(int_op(&mut interp, "Or", a, b), a | b);
        prop_assert_eq!(int_op(&mut interp, "Xor", a, b), a ^ b);
        if b != 0 {
            prop_assert_eq!(int_op(&mut interp, "Div", a, b), a.wrapping_div(b));
            prop_assert_eq!(int_op(&mut interp, "Mod", a, b), a.wrapping_rem(b));
        }
    }

    #[test]
    fn arithmetic_shift_keeps_the_sign(a in any::<i64>(), shift in 0i64..64) {
        let module = operators(&Type::Int, &Type::Int, &INT_OPS);
        let mut interp = interpreter(&module);
        prop_assert_eq!(int_op(&mut interp, "Shr", a, shift), a >> shift);
    }

    #[test]
    fn double_arithmetic_matches_f64(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let module = operators(&Type::Double, &Type::Double, &DOUBLE_OPS);
        let mut interp = interpreter(&module);
        prop_assert_eq!(double_op(&mut interp, "Add", a, b), a + b);
        prop_assert_eq!(double_op(&mut interp, "Sub", a, b), a - b);
        prop_assert_eq!(double_op(&mut interp, "Mul", a, b), a * b);
        if b != 0.0 {
            prop_assert_eq!(double_op(&mut interp, "Div", a, b), a / b);
        }
    }

    #[test]
    fn double_power_matches_powf(base in 0.0f64..10.0, exponent in -3.0f64..3.0) {
        let module = operators(&Type::Double, &Type::Double, &DOUBLE_OPS);
        let mut interp = interpreter(&module);
        prop_assert_eq!(double_op(&mut interp, "Pow", base, exponent), base.powf(exponent));
    }

    #[test]
    fn int_comparisons(a in any::<i64>(), b in any::<i64>()) {
        let module = operators(&Type::Int, &Type::Int, &COMPARISONS);
        let mut interp = interpreter(&module);
        for (lhs, rhs) in [(a, b), (a, a)] {
            let got = compare_all(&mut interp, |_| (RtValue::Int(lhs), RtValue::Int(rhs)));
            prop_assert_eq!(got, expected(&lhs, &rhs));
        }
    }

    #[test]
    fn double_comparisons(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let module = operators(&Type::Double, &Type::Double, &COMPARISONS);
        let mut interp = interpreter(&module);
        for (lhs, rhs) in [(a, b), (a, a)] {
            let got = compare_all(&mut interp, |_| (RtValue::Double(lhs), RtValue::Double(rhs)));
            prop_assert_eq!(got, expected(&lhs, &rhs));
        }
    }

    #[test]
    fn big_int_comparisons(a in any::<i64>(), b in any::<i64>()) {
        let module = operators(&Type::BigInt, &Type::BigInt, &COMPARISONS);
        let mut interp = interpreter(&module);
        for (lhs, rhs) in [(a, b), (a, a)] {
            let got = compare_all(&mut interp, |i| (big(i, lhs), big(i, rhs)));
            prop_assert_eq!(got, expected(&lhs, &rhs));
        }
    }

    #[test]
    fn equality_on_scalars(
        (a, b) in (any::<bool>(), any::<bool>()),
        (p, q) in (0u8..4, 0u8..4),
        (s, t) in ("[a-c]{0,3}", "[a-c]{0,3}")
    ) {
        let bools = operators(&Type::Bool, &Type::Bool, &EQUALITY);
        let mut interp = interpreter(&bools);
        prop_assert_eq!(holds(&mut interp, "Eq", RtValue::Bool(a), RtValue::Bool(b)), a == b);
        prop_assert_eq!(holds(&mut interp, "NotEq", RtValue::Bool(a), RtValue::Bool(b)), a != b);

        let results = operators(&Type::Result, &Type::Result, &EQUALITY);
        let mut interp = interpreter(&results);
        prop_assert_eq!(holds(&mut interp, "Eq", RtValue::Result(a), RtValue::Result(b)), a == b);
        prop_assert_eq!(holds(&mut interp, "NotEq", RtValue::Result(a), RtValue::Result(b)), a != b);

        let paulis = operators(&Type::Pauli, &Type::Pauli, &EQUALITY);
        let mut interp = interpreter(&paulis);
        prop_assert_eq!(holds(&mut interp, "Eq", RtValue::Pauli(p), RtValue::Pauli(q)), p == q);
        prop_assert_eq!(holds(&mut interp, "NotEq", RtValue::Pauli(p), RtValue::Pauli(q)), p != q);

        let strings = operators(&Type::String, &Type::String, &EQUALITY);
        let mut interp = interpreter(&strings);
        for name in ["Eq", "NotEq"] {
            let (lhs, rhs) = (text(&mut interp, &s), text(&mut interp, &t));
            prop_assert_eq!(holds(&mut interp, name, lhs, rhs), (s == t) == (name == "Eq"));
        }
    }

    #[test]
    fn big_integers_do_not_overflow(a in any::<i64>(), b in any::<i64>()) {
        let ops = [
            ("Add", BinaryOp::Add),
            ("Sub", BinaryOp::Sub),
            ("Mul", BinaryOp::Mul),
            ("Div", BinaryOp::Div),
            ("Mod", BinaryOp::Mod),
        ];
        let module = operators(&Type::BigInt, &Type::BigInt, &ops);
        let mut interp = interpreter(&module);
        let (wide_a, wide_b) = (i128::from(a), i128::from(b));
        prop_assert_eq!(big_pair_op(&mut interp, "Add", a, b), BigInt::from(wide_a + wide_b));
        prop_assert_eq!(big_pair_op(&mut interp, "Sub", a, b), BigInt::from(wide_a - wide_b));
        prop_assert_eq!(big_pair_op(&mut interp, "Mul", a, b), BigInt::from(wide_a * wide_b));
        if b != 0 {
            prop_assert_eq!(big_pair_op(&mut interp, "Div", a, b), BigInt::from(wide_a / wide_b));
            prop_assert_eq!(big_pair_op(&mut interp, "Mod", a, b), BigInt::from(wide_a % wide_b));
        }
    }

    #[test]
    fn big_int_shifts_and_power(a in any::<i64>(), shift in 0i64..64, exponent in 0u32..6) {
        let ops = [
            ("Shl", BinaryOp::Shl),
            ("Shr", BinaryOp::Shr),
            ("Pow", BinaryOp::Pow),
        ];
        let module = operators(&Type::BigInt, &Type::Int, &ops);
        let mut interp = interpreter(&module);
        prop_assert_eq!(
            big_int_op(&mut interp, "Shl", a, RtValue::Int(shift)),
            BigInt::from(i128::from(a) << shift)
        );
        prop_assert_eq!(
            big_int_op(&mut interp, "Shr", a, RtValue::Int(shift)),
            BigInt::from(a >> shift)
        );
        prop_assert_eq!(
            big_int_op(&mut interp, "Pow", a, RtValue::Int(i64::from(exponent))),
            BigInt::from(a).pow(exponent)
        );
    }
}
