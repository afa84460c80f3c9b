//! Stack growth for recursive tree walks.
//!
//! Expression and statement lowering recurse once per nesting level of the
//! input tree, and the interpreter recurses once per call. Both wrap their
//! recursive entry points in [`ensure_sufficient_stack`] so that generated
//! or adversarial inputs with deep nesting do not overflow the thread stack.
//!
//! On native targets the stack is grown on demand with `stacker`; on WASM
//! the closure runs directly.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a fresh stack segment if the remaining
/// stack is below the red zone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Run `f` directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests;
