//! Evaluation errors.
//!
//! A runtime `fail` is reported as [`EvalError::Fail`]; everything else
//! means the module broke a runtime contract (a count went negative, an
//! object was used after its last reference was dropped) or the
//! interpreter's limits were hit.

use thiserror::Error;

/// Error raised while running a module.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The program called `fail`.
    #[error("program failed: {message}")]
    Fail { message: String },

    #[error("index {index} out of range for an array of length {length}")]
    IndexOutOfRange { index: i64, length: usize },

    #[error("object #{object} used after its last reference was released")]
    UseAfterRelease { object: u32 },

    #[error("{count} count of object #{object} dropped to {value}")]
    NegativeCount {
        object: u32,
        count: &'static str,
        value: i64,
    },

    #[error("qubit {qubit} used after release")]
    ReleasedQubitInUse { qubit: u32 },

    #[error("no function named {name}")]
    UnknownFunction { name: String },

    #[error("callable has no {kind} specialization")]
    UnsupportedSpecialization { kind: &'static str },

    #[error("step limit of {limit} instructions exceeded")]
    StepLimit { limit: u64 },

    #[error("call depth limit of {limit} exceeded")]
    CallDepth { limit: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("reached unreachable code in {function}")]
    Unreachable { function: String },

    #[error("use of an undefined value")]
    UndefinedValue,
}

impl EvalError {
    pub fn fail(message: impl Into<String>) -> Self {
        EvalError::Fail {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: &impl std::fmt::Debug) -> Self {
        EvalError::TypeMismatch {
            expected,
            found: format!("{found:?}"),
        }
    }
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;
