//! Statements and blocks.

use crate::{Name, Span, TypedExpr};

/// Binding pattern of a declaration, loop, or qubit allocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolTuple {
    Variable(Name),
    Tuple(Vec<SymbolTuple>),
    /// `_`: the value is evaluated but not bound.
    Discard,
}

impl SymbolTuple {
    /// Shorthand for a tuple pattern of plain variables.
    pub fn variables(names: &[Name]) -> SymbolTuple {
        SymbolTuple::Tuple(names.iter().copied().map(SymbolTuple::Variable).collect())
    }
}

/// Initializer of a qubit allocation.
#[derive(Clone, Debug, PartialEq)]
pub enum QubitInit {
    /// `Qubit()`
    Single,
    /// `Qubit[n]`
    Register(Box<TypedExpr>),
    Tuple(Vec<QubitInit>),
}

/// Sequence of statements forming a scope.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }

    /// Empty block.
    pub fn empty() -> Self {
        Block::default()
    }
}

/// Statement kind.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// Expression evaluated for its effects.
    Expr(TypedExpr),
    Return(TypedExpr),
    Fail(TypedExpr),
    /// Immutable binding.
    Let {
        symbols: SymbolTuple,
        init: TypedExpr,
    },
    /// Mutable binding.
    Mutable {
        symbols: SymbolTuple,
        init: TypedExpr,
    },
    /// Update of mutable variables; `target` is an identifier or a tuple of them.
    Set {
        target: TypedExpr,
        value: TypedExpr,
    },
    /// `if`/`elif` arms followed by an optional `else` block.
    If {
        arms: Vec<(TypedExpr, Block)>,
        otherwise: Option<Block>,
    },
    For {
        binding: SymbolTuple,
        iterable: TypedExpr,
        body: Block,
    },
    While {
        cond: TypedExpr,
        body: Block,
    },
    /// `repeat {body} until (until) fixup {fixup}`
    Repeat {
        body: Block,
        until: TypedExpr,
        fixup: Block,
    },
    /// Scoped qubit allocation; the qubits are released when `body` exits.
    Qubits {
        symbols: SymbolTuple,
        init: QubitInit,
        body: Block,
    },
}

/// Statement with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            span: Span::DUMMY,
        }
    }

    pub fn expr(expr: TypedExpr) -> Self {
        Stmt::new(StmtKind::Expr(expr))
    }

    pub fn ret(expr: TypedExpr) -> Self {
        Stmt::new(StmtKind::Return(expr))
    }

    pub fn fail(message: TypedExpr) -> Self {
        Stmt::new(StmtKind::Fail(message))
    }

    /// `let name = init;`
    pub fn let_var(name: Name, init: TypedExpr) -> Self {
        Stmt::new(StmtKind::Let {
            symbols: SymbolTuple::Variable(name),
            init,
        })
    }

    /// `mutable name = init;`
    pub fn mutable_var(name: Name, init: TypedExpr) -> Self {
        Stmt::new(StmtKind::Mutable {
            symbols: SymbolTuple::Variable(name),
            init,
        })
    }

    pub fn set(target: TypedExpr, value: TypedExpr) -> Self {
        Stmt::new(StmtKind::Set { target, value })
    }

    pub fn if_else(cond: TypedExpr, then: Block, otherwise: Option<Block>) -> Self {
        Stmt::new(StmtKind::If {
            arms: vec![(cond, then)],
            otherwise,
        })
    }

    pub fn for_each(binding: SymbolTuple, iterable: TypedExpr, body: Block) -> Self {
        Stmt::new(StmtKind::For {
            binding,
            iterable,
            body,
        })
    }

    pub fn while_loop(cond: TypedExpr, body: Block) -> Self {
        Stmt::new(StmtKind::While { cond, body })
    }

    pub fn repeat(body: Block, until: TypedExpr, fixup: Block) -> Self {
        Stmt::new(StmtKind::Repeat { body, until, fixup })
    }

    pub fn qubits(symbols: SymbolTuple, init: QubitInit, body: Block) -> Self {
        Stmt::new(StmtKind::Qubits {
            symbols,
            init,
            body,
        })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}
