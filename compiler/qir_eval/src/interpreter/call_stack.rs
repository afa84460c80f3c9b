//! Call frame tracking with a depth limit.

use qir_ir::{FuncId, Module};

use crate::{EvalError, EvalResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct CallFrame {
    pub(crate) function: FuncId,
    /// Length of the cell stack when the call began.
    pub(crate) cell_base: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame; the frame is not pushed when the limit is reached.
    pub(crate) fn push(&mut self, frame: CallFrame) -> EvalResult<()> {
        if self.frames.len() >= self.max_depth {
            return Err(EvalError::CallDepth {
                limit: self.max_depth,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<CallFrame> {
        debug_assert!(!self.frames.is_empty(), "pop on an empty call stack");
        self.frames.pop()
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Function names, most recent call first.
    pub(crate) fn backtrace(&self, module: &Module) -> Vec<String> {
        self.frames
            .iter()
            .rev()
            .map(|frame| module.function(frame.function).name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use qir_ir::{IrType, Linkage};

    use super::*;

    #[test]
    fn depth_limit_rejects_the_extra_frame() {
        let mut module = Module::new();
        let f = module.declare_function("F", Vec::new(), IrType::Void, Linkage::Internal);
        let g = module.declare_function("G", Vec::new(), IrType::Void, Linkage::Internal);
        let mut stack = CallStack::new(2);
        let frame = |function| CallFrame {
            function,
            cell_base: 0,
        };
        stack.push(frame(f)).ok();
        stack.push(frame(g)).ok();
        assert_eq!(
            stack.push(frame(f)),
            Err(EvalError::CallDepth { limit: 2 })
        );
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.backtrace(&module), ["G", "F"]);
        assert_eq!(stack.pop().map(|frame| frame.function), Some(g));
    }
}
