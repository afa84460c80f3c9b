//! Instructions and terminators.

use crate::{BlockId, FuncId, Intrinsic, IrType, RuntimeFn, Value, VarId};

// ── Operators ───────────────────────────────────────────────────────

/// Arithmetic and bitwise binary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    Shl,
    AShr,
    And,
    Or,
    Xor,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl BinOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::SRem => "srem",
            BinOp::Shl => "shl",
            BinOp::AShr => "ashr",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::FAdd => "fadd",
            BinOp::FSub => "fsub",
            BinOp::FMul => "fmul",
            BinOp::FDiv => "fdiv",
        }
    }
}

/// Integer comparison predicate (signed).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl IntPredicate {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
        }
    }
}

/// Ordered floating-point comparison predicate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl FloatPredicate {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        }
    }
}

/// Conversion operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CastOp {
    /// Signed integer to double.
    SiToFp,
    /// Double to signed integer, truncating toward zero.
    FpToSi,
    /// Zero-extend a narrower integer.
    ZExt,
    /// Truncate to a narrower integer.
    Trunc,
    BitCast,
}

impl CastOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            CastOp::SiToFp => "sitofp",
            CastOp::FpToSi => "fptosi",
            CastOp::ZExt => "zext",
            CastOp::Trunc => "trunc",
            CastOp::BitCast => "bitcast",
        }
    }
}

/// Target of a call instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Callee {
    Runtime(RuntimeFn),
    Function(FuncId),
    Intrinsic(Intrinsic),
}

// ── Instructions ────────────────────────────────────────────────────

/// A single non-terminating instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instr {
    Binary {
        dst: VarId,
        op: BinOp,
        lhs: Value,
        rhs: Value,
    },
    /// `fneg`
    FNeg {
        dst: VarId,
        value: Value,
    },
    ICmp {
        dst: VarId,
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
    },
    FCmp {
        dst: VarId,
        pred: FloatPredicate,
        lhs: Value,
        rhs: Value,
    },
    Select {
        dst: VarId,
        cond: Value,
        if_true: Value,
        if_false: Value,
    },
    Cast {
        dst: VarId,
        op: CastOp,
        value: Value,
        ty: IrType,
    },
    /// Call; `dst` is `None` for void callees.
    Call {
        dst: Option<VarId>,
        callee: Callee,
        args: Vec<Value>,
    },
    /// Stack slot for a value of type `ty`; `dst` has type `ty*`.
    Alloca {
        dst: VarId,
        ty: IrType,
    },
    Load {
        dst: VarId,
        ty: IrType,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    /// Address of item `index` of the struct `ptr` points to.
    ElementPtr {
        dst: VarId,
        ptr: Value,
        index: u32,
    },
    ExtractValue {
        dst: VarId,
        aggregate: Value,
        index: u32,
    },
    InsertValue {
        dst: VarId,
        aggregate: Value,
        value: Value,
        index: u32,
    },
    Phi {
        dst: VarId,
        ty: IrType,
        incoming: Vec<(Value, BlockId)>,
    },
}

impl Instr {
    /// Variable defined by this instruction, if any.
    pub fn defined_var(&self) -> Option<VarId> {
        match self {
            Instr::Binary { dst, .. }
            | Instr::FNeg { dst, .. }
            | Instr::ICmp { dst, .. }
            | Instr::FCmp { dst, .. }
            | Instr::Select { dst, .. }
            | Instr::Cast { dst, .. }
            | Instr::Alloca { dst, .. }
            | Instr::Load { dst, .. }
            | Instr::ElementPtr { dst, .. }
            | Instr::ExtractValue { dst, .. }
            | Instr::InsertValue { dst, .. }
            | Instr::Phi { dst, .. } => Some(*dst),
            Instr::Call { dst, .. } => *dst,
            Instr::Store { .. } => None,
        }
    }

    /// Runtime function called by this instruction, if any.
    pub fn runtime_callee(&self) -> Option<RuntimeFn> {
        match self {
            Instr::Call {
                callee: Callee::Runtime(f),
                ..
            } => Some(*f),
            _ => None,
        }
    }
}

// ── Terminators ─────────────────────────────────────────────────────

/// Block terminator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Terminator {
    /// Return, with a value unless the function returns void.
    Return(Option<Value>),
    Jump(BlockId),
    Branch {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Unreachable,
}

impl Terminator {
    /// Successor blocks, in branch order.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump(target) => vec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Unreachable => vec![],
        }
    }
}
