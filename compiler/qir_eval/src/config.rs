//! Interpreter limits and options.

/// Options controlling a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Instructions executed before the run is aborted.
    pub max_steps: u64,
    /// Nested calls before the run is aborted.
    pub max_call_depth: usize,
    /// Record calls of declared functions (target instructions, intrinsic
    /// and external specializations) instead of rejecting them.
    pub record_target_calls: bool,
    /// Echo messages to stdout as well as recording them.
    pub print_messages: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_steps: 10_000_000,
            max_call_depth: 1_000,
            record_target_calls: true,
            print_messages: false,
        }
    }
}

impl EvalConfig {
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    #[must_use]
    pub fn with_target_calls(mut self, record_target_calls: bool) -> Self {
        self.record_target_calls = record_target_calls;
        self
    }

    #[must_use]
    pub fn with_printed_messages(mut self, print_messages: bool) -> Self {
        self.print_messages = print_messages;
        self
    }
}
