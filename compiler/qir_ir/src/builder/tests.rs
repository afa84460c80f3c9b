use pretty_assertions::assert_eq;

use super::*;

#[test]
fn entry_block_and_params() {
    let b = FunctionBuilder::new(&[IrType::Int, IrType::Qubit]);
    assert_eq!(b.params(), &[VarId::new(0), VarId::new(1)]);
    assert_eq!(b.block_name(b.current_block()), "entry");
    assert!(!b.is_terminated());
}

#[test]
fn labels_are_made_unique() {
    let mut b = FunctionBuilder::new(&[]);
    let first = b.new_block("then0");
    let second = b.new_block("then0");
    let third = b.new_block("then0");
    assert_eq!(b.block_name(first), "then0");
    assert_eq!(b.block_name(second), "then0__1");
    assert_eq!(b.block_name(third), "then0__2");
}

#[test]
fn blocks_inserted_after_and_before() {
    let mut b = FunctionBuilder::new(&[]);
    let entry = b.current_block();
    let tail = b.new_block("tail");
    let cont = b.new_block_after(entry, "continue");
    let then = b.new_block_before(cont, "then");
    for block in [entry, then, cont, tail] {
        b.position_at(block);
        b.terminate_unreachable();
    }
    let body = b.finish();
    let order: Vec<&str> = body.blocks_in_order().map(|b| b.name.as_str()).collect();
    assert_eq!(order, vec!["entry", "then", "continue", "tail"]);
}

#[test]
fn emission_types() {
    let mut b = FunctionBuilder::new(&[IrType::Int]);
    let x = Value::Var(b.params()[0]);
    let sum = b.binary(BinOp::Add, x.clone(), Value::int(1));
    assert_eq!(b.value_type(&sum), IrType::Int);
    let cmp = b.icmp(IntPredicate::Slt, sum, x);
    assert_eq!(b.value_type(&cmp), IrType::Bool);
    let cell = b.alloca(IrType::Array);
    assert_eq!(b.value_type(&cell), IrType::ptr(IrType::Array));
    let arr = b.call_runtime(RuntimeFn::ArrayCreate1d, vec![Value::i32(8), Value::int(3)]);
    assert_eq!(arr.map(|v| b.value_type(&v)), Some(IrType::Array));
    let none = b.call_runtime(
        RuntimeFn::ArrayUpdateReferenceCount,
        vec![Value::null(IrType::Array), Value::i32(-1)],
    );
    assert_eq!(none, None);
}

#[test]
fn element_ptr_yields_item_pointer() {
    let mut b = FunctionBuilder::new(&[IrType::Tuple]);
    let tuple = Value::Var(b.params()[0]);
    let typed = b.bitcast(tuple, IrType::typed_tuple(vec![IrType::Int, IrType::Bool]));
    let item = b.element_ptr(typed, 1);
    assert_eq!(b.value_type(&item), IrType::ptr(IrType::Bool));
}

#[test]
fn bitcast_of_same_type_is_elided() {
    let mut b = FunctionBuilder::new(&[IrType::Tuple]);
    let tuple = Value::Var(b.params()[0]);
    let same = b.bitcast(tuple.clone(), IrType::Tuple);
    assert_eq!(same, tuple);
    let null = b.bitcast(Value::null(IrType::Tuple), IrType::typed_tuple(vec![IrType::Int]));
    assert!(null.is_null());
}

#[test]
fn phi_incoming_added_later() {
    let mut b = FunctionBuilder::new(&[]);
    let entry = b.current_block();
    let header = b.new_block("header");
    b.terminate_jump(header);
    b.position_at(header);
    let phi = b.phi(IrType::Int, vec![(Value::int(0), entry)]);
    let next = b.binary(BinOp::Add, phi.clone(), Value::int(1));
    b.add_phi_incoming(&phi, next, header);
    b.terminate_jump(header);
    let body = b.finish();
    let incoming = body
        .instrs()
        .find_map(|i| match i {
            Instr::Phi { incoming, .. } => Some(incoming.len()),
            _ => None,
        });
    assert_eq!(incoming, Some(2));
}

#[test]
fn unused_block_detection() {
    let mut b = FunctionBuilder::new(&[]);
    let cont = b.new_block("continue");
    assert!(!b.is_used(cont));
    b.terminate_jump(cont);
    assert!(b.is_used(cont));
}

#[test]
fn finish_fills_missing_terminators() {
    let mut b = FunctionBuilder::new(&[]);
    b.new_block("dangling");
    b.terminate_return(None);
    let body = b.finish();
    assert_eq!(body.blocks[1].terminator, Terminator::Unreachable);
    assert_eq!(body.blocks[0].terminator, Terminator::Return(None));
}
