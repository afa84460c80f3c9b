//! Generation errors.

use std::fmt;

use qir_ast::Span;
use thiserror::Error;

/// Kind of input the generator cannot lower.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnsupportedKind {
    /// An operator applied to operands of a type it does not accept.
    OperandType { op: &'static str },
    /// `for` over something that is neither a Range nor an array.
    IterationTarget,
    /// A binding pattern whose shape does not match the bound value.
    DestructuringShape,
    /// A named item that the user-defined type does not declare.
    UnknownItem,
    /// A local variable that is not bound in any enclosing scope.
    UnknownVariable,
    /// A reference to a callable or type that the program does not declare.
    UnknownGlobal,
    /// An interpolated string with an unterminated `{` placeholder or a bad index.
    MalformedTemplate,
    /// A target instruction requested for a specialization other than the body.
    NonBodyTargetInstruction,
    /// An inline callable without a provided body.
    MissingInlineBody,
    /// A controlled call whose argument is not a `(controls, arg)` tuple literal.
    ControlledArgument,
    /// A `set` whose target is not an identifier or a tuple of identifiers.
    AssignmentTarget,
    /// A value of the given type used where a callable is required.
    NotCallable,
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedKind::OperandType { op } => write!(f, "invalid operand type for `{op}`"),
            UnsupportedKind::IterationTarget => f.write_str("iteration over a non-array value"),
            UnsupportedKind::DestructuringShape => f.write_str("destructuring shape mismatch"),
            UnsupportedKind::UnknownItem => f.write_str("unknown named item"),
            UnsupportedKind::UnknownVariable => f.write_str("unknown local variable"),
            UnsupportedKind::UnknownGlobal => f.write_str("unknown global declaration"),
            UnsupportedKind::MalformedTemplate => f.write_str("malformed interpolation template"),
            UnsupportedKind::NonBodyTargetInstruction => {
                f.write_str("target instruction for a non-body specialization")
            }
            UnsupportedKind::MissingInlineBody => f.write_str("inline callable without a body"),
            UnsupportedKind::ControlledArgument => {
                f.write_str("controlled argument is not a (controls, arg) tuple")
            }
            UnsupportedKind::AssignmentTarget => f.write_str("invalid assignment target"),
            UnsupportedKind::NotCallable => f.write_str("value is not callable"),
        }
    }
}

/// Error raised while generating a module.
///
/// Unsupported input is reported with the span of the offending node.
/// Invariant violations are bugs in the generator (or a caller driving it
/// out of order) and abort the compilation unit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenError {
    #[error("unsupported input at {span:?}: {kind}")]
    Unsupported { kind: UnsupportedKind, span: Span },

    #[error("generator invariant violated: {message}")]
    Invariant { message: String },
}

impl GenError {
    pub fn unsupported(kind: UnsupportedKind, span: Span) -> Self {
        GenError::Unsupported { kind, span }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        GenError::Invariant {
            message: message.into(),
        }
    }

    /// Whether this error indicates a generator bug rather than bad input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, GenError::Invariant { .. })
    }

    /// Kind of unsupported input, if this is not an invariant violation.
    pub fn unsupported_kind(&self) -> Option<UnsupportedKind> {
        match self {
            GenError::Unsupported { kind, .. } => Some(*kind),
            GenError::Invariant { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenError>;
