//! Typed syntax tree for QIR generation.
//!
//! This crate holds the input of the code generator: a fully type-checked,
//! monomorphized syntax tree. Every expression carries its resolved
//! [`Type`]; callables carry their specializations and attributes; user-defined
//! types carry their named item structure.
//!
//! # Layout
//!
//! - [`Name`] / [`StringInterner`]: interned identifiers
//! - [`Type`], [`Functors`]: semantic types
//! - [`TypedExpr`], [`ExprKind`]: expressions
//! - [`Stmt`], [`StmtKind`], [`Block`]: statements
//! - [`Callable`], [`UdtDecl`], [`Namespace`], [`Program`]: declarations
//!
//! Construction helpers on [`TypedExpr`] and [`Stmt`] keep hand-built trees
//! (tests, synthesized code) short.

mod decl;
mod expr;
mod interner;
mod name;
mod span;
mod stmt;
mod ty;

pub use decl::{
    Callable, CallableAttrs, CallableKind, Namespace, NamespaceElement, Param, Program,
    SpecImpl, SpecKind, Specialization, TypeItems, UdtDecl,
};
pub use expr::{Accessor, BinaryOp, ExprKind, Identifier, Pauli, ResultValue, TypedExpr, UnaryOp};
pub use interner::StringInterner;
pub use name::{Name, QualifiedName};
pub use span::Span;
pub use stmt::{Block, QubitInit, Stmt, StmtKind, SymbolTuple};
pub use ty::{Functors, Type};

/// Re-exported so that callers building literals do not need a direct dependency.
pub use num_bigint::BigInt;
