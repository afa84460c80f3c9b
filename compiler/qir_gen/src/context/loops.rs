//! Counting loops.
//!
//! A loop over `start..step..end` is laid out as
//!
//! ```text
//!   current:  jump header
//!   header:   %i = phi [start, current], [%next, exiting]
//!             br (step > 0 ? %i <= end : %i >= end), body, exit
//!   body:     ...; jump exiting
//!   exiting:  %next = add %i, step; jump header
//!   exit:
//! ```
//!
//! With a constant step of one the direction test is left out.

use qir_ir::{BinOp, IntPredicate, IrType, Value};

use super::GenerationContext;
use crate::value::LoweredValue;
use crate::Result;

impl GenerationContext<'_> {
    /// Run `body` for each value of the range; `body` receives the loop variable.
    pub(crate) fn for_range_loop(
        &mut self,
        start: Value,
        step: Option<Value>,
        end: Value,
        mut body: impl FnMut(&mut Self, Value) -> Result<()>,
    ) -> Result<()> {
        let increasing = step
            .as_ref()
            .map(|step| self.builder.icmp(IntPredicate::Sgt, step.clone(), Value::int(0)));
        let step = step.unwrap_or_else(|| Value::int(1));

        let preheader = self.builder.current_block();
        let header = self.builder.new_block_after(preheader, "header");
        let body_block = self.builder.new_block_after(header, "body");
        let exiting = self.builder.new_block_after(body_block, "exiting");
        let exit = self.builder.new_block_after(exiting, "exit");
        self.builder.terminate_jump(header);

        self.builder.position_at(header);
        let index = self.builder.phi(IrType::Int, vec![(start, preheader)]);
        let upwards = self
            .builder
            .icmp(IntPredicate::Sle, index.clone(), end.clone());
        let cond = match increasing {
            Some(increasing) => {
                let downwards = self.builder.icmp(IntPredicate::Sge, index.clone(), end);
                self.builder.select(increasing, upwards, downwards)
            }
            None => upwards,
        };
        self.builder.terminate_branch(cond, body_block, exit);

        self.builder.position_at(body_block);
        body(self, index.clone())?;
        if !self.builder.is_terminated() {
            self.builder.terminate_jump(exiting);
        }

        self.builder.position_at(exiting);
        let next = self.builder.binary(BinOp::Add, index.clone(), step);
        self.builder.add_phi_incoming(&index, next, exiting);
        self.builder.terminate_jump(header);

        self.builder.position_at(exit);
        Ok(())
    }

    /// Run `body` for each item of an array, first to last.
    pub(crate) fn for_array_loop(
        &mut self,
        array: &LoweredValue,
        mut body: impl FnMut(&mut Self, LoweredValue) -> Result<()>,
    ) -> Result<()> {
        let length = self.array_length(array);
        let end = self.builder.binary(BinOp::Sub, length, Value::int(1));
        self.for_range_loop(Value::int(0), None, end, |ctx, index| {
            let item = ctx.array_element(array, index)?;
            body(ctx, item)
        })
    }
}
