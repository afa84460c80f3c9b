//! Basic-block IR for QIR modules.
//!
//! The generator lowers the typed syntax tree into this IR; the reference
//! interpreter executes it; the printer renders it as LLVM-flavoured text.
//!
//! # Architecture
//!
//! - **[`Module`]**: functions and globals, addressed by [`FuncId`] / [`GlobalId`]
//! - **[`Function`]**: signature plus an optional [`FunctionBody`] (declarations have none)
//! - **[`Block`]**: labelled basic block, instructions, one [`Terminator`]
//! - **[`Instr`]**: a single instruction over [`Value`] operands
//! - **[`RuntimeFn`]**: the fixed runtime library catalogue
//!
//! Bodies are built with [`FunctionBuilder`]. Variables are SSA values
//! named by [`VarId`]; mutable source variables live in `alloca` cells.

mod builder;
mod ids;
mod instr;
mod module;
mod print;
mod runtime;
mod types;
mod value;

pub use builder::FunctionBuilder;
pub use ids::{BlockId, FuncId, GlobalId, VarId};
pub use instr::{BinOp, Callee, CastOp, FloatPredicate, Instr, IntPredicate, Terminator};
pub use module::{Block, Function, FunctionBody, Global, GlobalKind, Linkage, Module};
pub use print::print_module;
pub use runtime::{Intrinsic, RuntimeFn, RUNTIME_PREFIX, TARGET_PREFIX};
pub use types::{IrType, TUPLE_HEADER_SIZE};
pub use value::{Constant, Value};
