//! Builder for function bodies.
//!
//! Follows the "position at a block, emit instructions, terminate" pattern
//! of LLVM's `IRBuilder`. Blocks carry labels and a layout position, so
//! that structured lowering can place a new block right after the current
//! one (or right before a continuation block) instead of at the end.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    BinOp, Block, BlockId, Callee, CastOp, Constant, FloatPredicate, FunctionBody, Instr,
    IntPredicate, Intrinsic, IrType, RuntimeFn, Terminator, Value, VarId,
};

/// In-progress basic block.
struct BlockBuilder {
    name: String,
    instrs: Vec<Instr>,
    terminator: Option<Terminator>,
}

/// Builder for an in-progress function body.
///
/// Consumed by [`finish`](FunctionBuilder::finish) to produce the final
/// [`FunctionBody`].
pub struct FunctionBuilder {
    blocks: Vec<BlockBuilder>,
    layout: Vec<BlockId>,
    current_block: BlockId,
    params: Vec<VarId>,
    var_types: Vec<IrType>,
    var_names: Vec<Option<String>>,
    /// Next suffix per label or variable name, for uniquing.
    name_counts: FxHashMap<String, u32>,
}

impl FunctionBuilder {
    /// Create a builder with an `entry` block and one variable per parameter.
    pub fn new(params: &[IrType]) -> Self {
        let mut builder = FunctionBuilder {
            blocks: Vec::new(),
            layout: Vec::new(),
            current_block: BlockId::new(0),
            params: Vec::with_capacity(params.len()),
            var_types: Vec::new(),
            var_names: Vec::new(),
            name_counts: FxHashMap::default(),
        };
        for ty in params {
            let var = builder.fresh_var(ty.clone());
            builder.params.push(var);
        }
        let entry = builder.new_block("entry");
        builder.current_block = entry;
        builder
    }

    /// Variables bound to the parameters.
    pub fn params(&self) -> &[VarId] {
        &self.params
    }

    // ── Block management ───────────────────────────────────────

    /// Make a label unique within the function: `name`, then `name__1`, ...
    fn unique_name(&mut self, name: &str) -> String {
        let count = self.name_counts.entry(name.to_owned()).or_insert(0);
        let unique = if *count == 0 {
            name.to_owned()
        } else {
            format!("{name}__{count}")
        };
        *count += 1;
        unique
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "block indices never exceed u32"
    )]
    fn alloc_block(&mut self, name: &str) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        let name = self.unique_name(name);
        self.blocks.push(BlockBuilder {
            name,
            instrs: Vec::new(),
            terminator: None,
        });
        id
    }

    /// Allocate a block at the end of the layout.
    pub fn new_block(&mut self, name: &str) -> BlockId {
        let id = self.alloc_block(name);
        self.layout.push(id);
        id
    }

    /// Allocate a block placed directly after `after` in the layout.
    pub fn new_block_after(&mut self, after: BlockId, name: &str) -> BlockId {
        let id = self.alloc_block(name);
        let pos = self
            .layout
            .iter()
            .position(|&b| b == after)
            .map_or(self.layout.len(), |p| p + 1);
        self.layout.insert(pos, id);
        id
    }

    /// Allocate a block placed directly before `before` in the layout.
    pub fn new_block_before(&mut self, before: BlockId, name: &str) -> BlockId {
        let id = self.alloc_block(name);
        let pos = self
            .layout
            .iter()
            .position(|&b| b == before)
            .unwrap_or(self.layout.len());
        self.layout.insert(pos, id);
        id
    }

    /// Set the current insertion point to the given block.
    pub fn position_at(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len(),
        );
        self.current_block = block;
    }

    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    /// Check whether the current block already has a terminator.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.blocks[self.current_block.index()].terminator.is_some()
    }

    /// Check whether any instruction or terminator targets `block`, or any
    /// instruction has been emitted into it.
    pub fn is_used(&self, block: BlockId) -> bool {
        let b = &self.blocks[block.index()];
        if !b.instrs.is_empty() || b.terminator.is_some() {
            return true;
        }
        self.blocks.iter().any(|other| {
            other
                .terminator
                .as_ref()
                .is_some_and(|t| t.successors().contains(&block))
        })
    }

    pub fn block_name(&self, block: BlockId) -> &str {
        &self.blocks[block.index()].name
    }

    // ── Variables ──────────────────────────────────────────────

    /// Allocate a fresh unnamed variable with the given type.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "variable indices never exceed u32"
    )]
    pub fn fresh_var(&mut self, ty: IrType) -> VarId {
        let id = VarId::new(self.var_types.len() as u32);
        self.var_types.push(ty);
        self.var_names.push(None);
        id
    }

    /// Attach a name hint to a variable; the name is made unique.
    pub fn set_var_name(&mut self, var: VarId, name: &str) {
        let unique = self.unique_name(name);
        self.var_names[var.index()] = Some(unique);
    }

    /// Type of an operand.
    pub fn value_type(&self, value: &Value) -> IrType {
        match value {
            Value::Var(var) => self.var_types[var.index()].clone(),
            Value::Const(constant) => constant.ty(),
        }
    }

    fn push(&mut self, instr: Instr) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "emitting into terminated block {}",
            block.name
        );
        block.instrs.push(instr);
    }

    // ── Instruction emission ───────────────────────────────────

    /// Binary operation; the result has the type of `lhs`.
    pub fn binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> Value {
        let dst = self.fresh_var(self.value_type(&lhs));
        self.push(Instr::Binary { dst, op, lhs, rhs });
        dst.into()
    }

    pub fn fneg(&mut self, value: Value) -> Value {
        let dst = self.fresh_var(IrType::Double);
        self.push(Instr::FNeg { dst, value });
        dst.into()
    }

    pub fn icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value) -> Value {
        let dst = self.fresh_var(IrType::Bool);
        self.push(Instr::ICmp {
            dst,
            pred,
            lhs,
            rhs,
        });
        dst.into()
    }

    pub fn fcmp(&mut self, pred: FloatPredicate, lhs: Value, rhs: Value) -> Value {
        let dst = self.fresh_var(IrType::Bool);
        self.push(Instr::FCmp {
            dst,
            pred,
            lhs,
            rhs,
        });
        dst.into()
    }

    pub fn select(&mut self, cond: Value, if_true: Value, if_false: Value) -> Value {
        let dst = self.fresh_var(self.value_type(&if_true));
        self.push(Instr::Select {
            dst,
            cond,
            if_true,
            if_false,
        });
        dst.into()
    }

    pub fn cast(&mut self, op: CastOp, value: Value, ty: IrType) -> Value {
        let dst = self.fresh_var(ty.clone());
        self.push(Instr::Cast { dst, op, value, ty });
        dst.into()
    }

    /// Bitcast, skipped when the operand already has the target type.
    pub fn bitcast(&mut self, value: Value, ty: IrType) -> Value {
        if self.value_type(&value) == ty {
            return value;
        }
        match value {
            Value::Const(Constant::Null(_)) => Value::null(ty),
            other => self.cast(CastOp::BitCast, other, ty),
        }
    }

    /// Call returning `ret`; yields `None` for void.
    pub fn call(&mut self, callee: Callee, ret: IrType, args: Vec<Value>) -> Option<Value> {
        let dst = if ret.is_void() {
            None
        } else {
            Some(self.fresh_var(ret))
        };
        self.push(Instr::Call { dst, callee, args });
        dst.map(Value::Var)
    }

    /// Call of a runtime function.
    pub fn call_runtime(&mut self, function: RuntimeFn, args: Vec<Value>) -> Option<Value> {
        debug_assert_eq!(
            function.params().len(),
            args.len(),
            "argument count mismatch for {}",
            function.name()
        );
        self.call(Callee::Runtime(function), function.ret(), args)
    }

    /// Call of a runtime function that returns a value.
    pub fn call_runtime_value(&mut self, function: RuntimeFn, args: Vec<Value>) -> Value {
        self.call_runtime(function, args)
            .unwrap_or_else(|| Value::undef(function.ret()))
    }

    pub fn call_intrinsic(&mut self, intrinsic: Intrinsic, args: Vec<Value>) -> Value {
        self.call(Callee::Intrinsic(intrinsic), intrinsic.ret(), args)
            .unwrap_or_else(|| Value::undef(intrinsic.ret()))
    }

    /// Stack cell holding a value of type `ty`.
    pub fn alloca(&mut self, ty: IrType) -> Value {
        let dst = self.fresh_var(IrType::ptr(ty.clone()));
        self.push(Instr::Alloca { dst, ty });
        dst.into()
    }

    pub fn load(&mut self, ty: IrType, ptr: Value) -> Value {
        let dst = self.fresh_var(ty.clone());
        self.push(Instr::Load { dst, ty, ptr });
        dst.into()
    }

    pub fn store(&mut self, value: Value, ptr: Value) {
        self.push(Instr::Store { value, ptr });
    }

    /// Pointer to payload item `index` of a typed tuple pointer.
    pub fn element_ptr(&mut self, ptr: Value, index: u32) -> Value {
        let item = self
            .value_type(&ptr)
            .tuple_items()
            .and_then(|items| items.get(index as usize).cloned());
        debug_assert!(item.is_some(), "element_ptr on a non-tuple pointer");
        let dst = self.fresh_var(IrType::ptr(item.unwrap_or(IrType::I8)));
        self.push(Instr::ElementPtr { dst, ptr, index });
        dst.into()
    }

    /// Field of a by-value aggregate (only ranges are aggregates).
    pub fn extract_value(&mut self, aggregate: Value, index: u32) -> Value {
        let dst = self.fresh_var(IrType::Int);
        self.push(Instr::ExtractValue {
            dst,
            aggregate,
            index,
        });
        dst.into()
    }

    pub fn insert_value(&mut self, aggregate: Value, value: Value, index: u32) -> Value {
        let dst = self.fresh_var(self.value_type(&aggregate));
        self.push(Instr::InsertValue {
            dst,
            aggregate,
            value,
            index,
        });
        dst.into()
    }

    pub fn phi(&mut self, ty: IrType, incoming: Vec<(Value, BlockId)>) -> Value {
        let dst = self.fresh_var(ty.clone());
        self.push(Instr::Phi { dst, ty, incoming });
        dst.into()
    }

    /// Add an incoming edge to an already emitted phi.
    pub fn add_phi_incoming(&mut self, phi: &Value, value: Value, from: BlockId) {
        let Some(var) = phi.as_var() else {
            debug_assert!(false, "phi operand is not a variable");
            return;
        };
        let found = self
            .blocks
            .iter_mut()
            .flat_map(|b| b.instrs.iter_mut())
            .find_map(|instr| match instr {
                Instr::Phi { dst, incoming, .. } if *dst == var => Some(incoming),
                _ => None,
            });
        debug_assert!(found.is_some(), "no phi defines {var:?}");
        if let Some(incoming) = found {
            incoming.push((value, from));
        }
    }

    // ── Terminators ────────────────────────────────────────────

    fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "block {} already terminated",
            block.name
        );
        block.terminator = Some(terminator);
    }

    pub fn terminate_return(&mut self, value: Option<Value>) {
        self.terminate(Terminator::Return(value));
    }

    pub fn terminate_jump(&mut self, target: BlockId) {
        self.terminate(Terminator::Jump(target));
    }

    pub fn terminate_branch(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::Branch {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn terminate_unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }

    // ── Finalization ───────────────────────────────────────────

    /// Consume the builder and produce a finished [`FunctionBody`].
    ///
    /// Unterminated blocks get `Unreachable` as a fallback (with a tracing warning).
    pub fn finish(self) -> FunctionBody {
        {
            let mut unterminated: SmallVec<[&str; 4]> = SmallVec::new();
            for block in &self.blocks {
                if block.terminator.is_none() {
                    unterminated.push(&block.name);
                }
            }
            if !unterminated.is_empty() {
                tracing::warn!(
                    blocks = ?unterminated,
                    "unterminated blocks in function body, adding unreachable"
                );
            }
        }

        let blocks = self
            .blocks
            .into_iter()
            .enumerate()
            .map(|(i, b)| {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "block indices never exceed u32"
                )]
                let id = BlockId::new(i as u32);
                Block {
                    id,
                    name: b.name,
                    instrs: b.instrs,
                    terminator: b.terminator.unwrap_or(Terminator::Unreachable),
                }
            })
            .collect();

        FunctionBody {
            params: self.params,
            blocks,
            layout: self.layout,
            var_types: self.var_types,
            var_names: self.var_names,
        }
    }
}

#[cfg(test)]
mod tests;
