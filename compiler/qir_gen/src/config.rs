//! Generation options.

/// Options controlling module generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenConfig {
    /// Give specialization functions external linkage (a library) instead
    /// of internal linkage (an executable).
    pub is_library: bool,
    /// Substitute the bodies of callables marked inline at their call sites.
    pub inline_callables: bool,
    /// Emit callable tables and wrappers for every callable, not only for
    /// those used as values.
    pub emit_wrappers_for_all: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            is_library: false,
            inline_callables: true,
            emit_wrappers_for_all: false,
        }
    }
}

impl GenConfig {
    #[must_use]
    pub fn with_library(mut self, is_library: bool) -> Self {
        self.is_library = is_library;
        self
    }

    #[must_use]
    pub fn with_inlining(mut self, inline_callables: bool) -> Self {
        self.inline_callables = inline_callables;
        self
    }

    #[must_use]
    pub fn with_wrappers_for_all(mut self, emit_wrappers_for_all: bool) -> Self {
        self.emit_wrappers_for_all = emit_wrappers_for_all;
        self
    }
}
