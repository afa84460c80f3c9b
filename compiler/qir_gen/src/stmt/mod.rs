//! Statement lowering.
//!
//! Every block is a scope: values created by its statements are owned by
//! the scope and released when control leaves it. A block whose last
//! statement returns or fails is terminated, and closing its scope emits
//! nothing since the exit already unwound every open scope.
//!
//! # Layout
//!
//! - `bindings`: `let`, `mutable`, `set`, and destructuring
//! - `control_flow`: `if`, `for`, `while`, `repeat`
//! - `qubits`: scoped qubit allocation

mod bindings;
mod control_flow;
mod qubits;

use qir_ast::{Block, Stmt, StmtKind};
use qir_stack::ensure_sufficient_stack;

use crate::context::GenerationContext;
use crate::Result;

impl GenerationContext<'_> {
    /// Lower a block in a scope of its own.
    pub(crate) fn lower_block(&mut self, block: &Block) -> Result<()> {
        self.scopes.open_scope();
        self.lower_statements(&block.stmts)?;
        self.close_scope()
    }

    /// Lower statements into the innermost scope.
    ///
    /// Statements following a `return` or `fail` are never reached and are dropped.
    pub(crate) fn lower_statements(&mut self, stmts: &[Stmt]) -> Result<()> {
        for (index, stmt) in stmts.iter().enumerate() {
            if self.builder.is_terminated() {
                tracing::debug!(dropped = stmts.len() - index, "unreachable statements");
                break;
            }
            ensure_sufficient_stack(|| self.lower_statement(stmt))?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.lower_expr(expr)?;
                Ok(())
            }
            StmtKind::Return(expr) => {
                let value = self.lower_expr(expr)?;
                self.add_return(value)
            }
            StmtKind::Fail(message) => {
                let message = self.lower_expr(message)?;
                self.add_fail(message)
            }
            StmtKind::Let { symbols, init } => self.bind_immutable(symbols, init, stmt.span),
            StmtKind::Mutable { symbols, init } => self.bind_mutable(symbols, init, stmt.span),
            StmtKind::Set { target, value } => self.lower_set(target, value, stmt.span),
            StmtKind::If { arms, otherwise } => self.lower_if(arms, otherwise.as_ref()),
            StmtKind::For {
                binding,
                iterable,
                body,
            } => self.lower_for(binding, iterable, body, stmt.span),
            StmtKind::While { cond, body } => self.lower_while(cond, body),
            StmtKind::Repeat { body, until, fixup } => self.lower_repeat(body, until, fixup),
            StmtKind::Qubits {
                symbols,
                init,
                body,
            } => self.lower_qubits(symbols, init, body, stmt.span),
        }
    }
}

#[cfg(test)]
mod tests;
