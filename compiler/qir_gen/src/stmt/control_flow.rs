//! Conditionals and loops.
//!
//! # Block layout
//!
//! ```text
//!   if:      test0 -> then0 | test1 -> then1 | else -> continue
//!   while:   while -> do | wend;  do -> while
//!   repeat:  repeat -> until -> rend | fixup;  fixup -> repeat
//! ```
//!
//! Conditions are evaluated in a scope of their own, closed before the
//! branch, so temporaries of the test never outlive it.

use qir_ast::{Block, ExprKind, Name, Span, SymbolTuple, Type, TypedExpr};
use qir_ir::{BlockId, Value};

use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::value::LoweredValue;
use crate::{GenError, Result};

impl GenerationContext<'_> {
    /// Evaluate a Bool condition in a scope of its own.
    fn lower_condition(&mut self, cond: &TypedExpr) -> Result<Value> {
        self.scopes.open_scope();
        let value = self.lower_expr(cond)?.into_ir();
        self.close_scope()?;
        Ok(value)
    }

    /// Lower one arm in a scope of its own; returns whether it jumped to `cont`.
    fn lower_arm(&mut self, block: &Block, cont: BlockId) -> Result<bool> {
        self.lower_block(block)?;
        if self.builder.is_terminated() {
            return Ok(false);
        }
        self.builder.terminate_jump(cont);
        Ok(true)
    }

    // ── Conditionals ───────────────────────────────────────────

    /// `if`/`elif`/`else`.
    ///
    /// Constant conditions prune their arms. When no arm falls through,
    /// the continuation is unreachable and closes the enclosing block.
    pub(super) fn lower_if(
        &mut self,
        arms: &[(TypedExpr, Block)],
        otherwise: Option<&Block>,
    ) -> Result<()> {
        let current = self.builder.current_block();
        let cont = self.builder.new_block_after(current, "continue");
        let mut cont_used = false;
        let mut taken = false;

        for (index, (cond, block)) in arms.iter().enumerate() {
            let test = self.lower_condition(cond)?;
            match test.as_const_bool() {
                Some(false) => continue,
                Some(true) => {
                    cont_used |= self.lower_arm(block, cont)?;
                    taken = true;
                    break;
                }
                None => {}
            }

            let then_block = self.builder.new_block_before(cont, &format!("then{index}"));
            let else_block = if index + 1 < arms.len() {
                self.builder
                    .new_block_before(cont, &format!("test{}", index + 1))
            } else if otherwise.is_some() {
                self.builder.new_block_before(cont, "else")
            } else {
                cont_used = true;
                cont
            };
            self.builder.terminate_branch(test, then_block, else_block);
            self.builder.position_at(then_block);
            cont_used |= self.lower_arm(block, cont)?;
            self.builder.position_at(else_block);
        }

        if !taken && self.builder.current_block() != cont {
            match otherwise {
                Some(block) => cont_used |= self.lower_arm(block, cont)?,
                None => {
                    self.builder.terminate_jump(cont);
                    cont_used = true;
                }
            }
        }

        self.builder.position_at(cont);
        if !cont_used {
            tracing::trace!("no arm falls through");
            self.builder.terminate_unreachable();
        }
        Ok(())
    }

    // ── Loops ──────────────────────────────────────────────────

    /// `for binding in iterable { body }` over a Range or an array.
    ///
    /// Each iteration runs in a scope of its own.
    pub(super) fn lower_for(
        &mut self,
        binding: &SymbolTuple,
        iterable: &TypedExpr,
        body: &Block,
        span: Span,
    ) -> Result<()> {
        match &iterable.ty {
            Type::Range => {
                let unit_step = matches!(&iterable.kind, ExprKind::RangeLiteral { step: None, .. });
                let range = self.lower_expr(iterable)?.into_ir();
                let (start, step, end) = self.range_parts(&range);
                let step = (!unit_step).then_some(step);
                self.for_range_loop(start, step, end, |ctx, index| {
                    let index = LoweredValue::from_ir(index, Type::Int);
                    ctx.lower_iteration(binding, index, None, body, span)
                })
            }
            Type::Array(_) => {
                let from_local = iterable.accessed_via_local();
                let array = self.lower_expr(iterable)?;
                self.for_array_loop(&array, |ctx, item| {
                    ctx.lower_iteration(binding, item, from_local, body, span)
                })
            }
            _ => Err(GenError::unsupported(
                UnsupportedKind::IterationTarget,
                iterable.span,
            )),
        }
    }

    fn lower_iteration(
        &mut self,
        binding: &SymbolTuple,
        item: LoweredValue,
        from_local: Option<Name>,
        body: &Block,
        span: Span,
    ) -> Result<()> {
        self.scopes.open_scope();
        self.bind_produced(binding, item, from_local, span)?;
        self.lower_statements(&body.stmts)?;
        self.close_scope()
    }

    /// `while cond { body }`.
    pub(super) fn lower_while(&mut self, cond: &TypedExpr, body: &Block) -> Result<()> {
        let current = self.builder.current_block();
        let test = self.builder.new_block_after(current, "while");
        let body_block = self.builder.new_block_after(test, "do");
        let exit = self.builder.new_block_after(body_block, "wend");

        self.builder.terminate_jump(test);
        self.builder.position_at(test);
        let cond = self.lower_condition(cond)?;
        self.builder.terminate_branch(cond, body_block, exit);

        self.builder.position_at(body_block);
        self.lower_arm(body, test)?;

        self.builder.position_at(exit);
        Ok(())
    }

    /// `repeat { body } until cond fixup { fixup }`.
    ///
    /// Body, condition, and fixup share one scope. Leaving through `rend`
    /// emits what the scope owes without closing it; the fixup path then
    /// closes it before jumping back.
    pub(super) fn lower_repeat(
        &mut self,
        body: &Block,
        until: &TypedExpr,
        fixup: &Block,
    ) -> Result<()> {
        let current = self.builder.current_block();
        let repeat = self.builder.new_block_after(current, "repeat");
        let until_block = self.builder.new_block_after(repeat, "until");
        let fixup_block = self.builder.new_block_after(until_block, "fixup");
        let exit = self.builder.new_block_after(fixup_block, "rend");

        self.builder.terminate_jump(repeat);
        self.builder.position_at(repeat);
        self.scopes.open_scope();
        self.lower_statements(&body.stmts)?;
        if !self.builder.is_terminated() {
            self.builder.terminate_jump(until_block);
        }

        self.builder.position_at(until_block);
        let cond = self.lower_expr(until)?.into_ir();
        let updates = self.scopes.apply_pending_references()?;
        self.emit_updates(updates)?;
        self.builder.terminate_branch(cond, exit, fixup_block);

        self.builder.position_at(exit);
        let updates = self.scopes.exit_scope()?;
        self.emit_updates(updates)?;
        let exit_end = self.builder.current_block();

        self.builder.position_at(fixup_block);
        self.lower_statements(&fixup.stmts)?;
        self.close_scope()?;
        if !self.builder.is_terminated() {
            self.builder.terminate_jump(repeat);
        }

        self.builder.position_at(exit_end);
        Ok(())
    }
}
