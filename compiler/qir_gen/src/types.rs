//! Type lowering.
//!
//! Maps semantic types to IR types and classifies them for memory
//! management. Tuples and user-defined types share one representation: an
//! opaque `%Tuple*` that is bitcast to a typed layout pointer for item
//! access. The layout of a user-defined type needs the declaration, so it
//! is computed by [`GenerationContext::tuple_items`](crate::context::GenerationContext::tuple_items).

use qir_ast::Type;
use qir_ir::{IrType, RuntimeFn};

/// IR type of a value of the given semantic type.
///
/// Unit values are null tuple pointers.
pub(crate) fn lower_type(ty: &Type) -> IrType {
    match ty {
        Type::Int => IrType::Int,
        Type::BigInt => IrType::BigInt,
        Type::Double => IrType::Double,
        Type::Bool => IrType::Bool,
        Type::String => IrType::String,
        Type::Qubit => IrType::Qubit,
        Type::Result => IrType::Result,
        Type::Pauli => IrType::Pauli,
        Type::Range => IrType::Range,
        Type::Array(_) => IrType::Array,
        Type::Unit | Type::Tuple(_) | Type::Udt(_) => IrType::Tuple,
        Type::Function { .. } | Type::Operation { .. } => IrType::Callable,
    }
}

/// IR return type of a specialization with the given output.
pub(crate) fn lower_return_type(output: &Type) -> IrType {
    match output {
        Type::Unit => IrType::Void,
        other => lower_type(other),
    }
}

/// Parameter types of a specialization taking the given input.
pub(crate) fn lower_params(input: &Type) -> Vec<IrType> {
    input.flattened().iter().map(lower_type).collect()
}

// ── Memory management classes ──────────────────────────────────────

/// Which counts the runtime keeps for values of a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CountClass {
    /// Stack values and qubits.
    None,
    /// Strings and big integers: reference counted, immutable.
    ReferenceOnly,
    /// Arrays, tuples, and callables: reference and alias counted.
    Aliased,
}

/// Kind of count to change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum CountKind {
    Alias,
    Reference,
}

pub(crate) fn count_class(ty: &Type) -> CountClass {
    match ty {
        Type::String | Type::BigInt => CountClass::ReferenceOnly,
        Type::Array(_)
        | Type::Tuple(_)
        | Type::Udt(_)
        | Type::Function { .. }
        | Type::Operation { .. } => CountClass::Aliased,
        Type::Unit
        | Type::Int
        | Type::Double
        | Type::Bool
        | Type::Qubit
        | Type::Result
        | Type::Pauli
        | Type::Range => CountClass::None,
    }
}

/// Whether values of `ty` carry a count of the given kind.
pub(crate) fn has_count(ty: &Type, kind: CountKind) -> bool {
    match (count_class(ty), kind) {
        (CountClass::None, _) | (CountClass::ReferenceOnly, CountKind::Alias) => false,
        (CountClass::ReferenceOnly | CountClass::Aliased, CountKind::Reference)
        | (CountClass::Aliased, CountKind::Alias) => true,
    }
}

/// Runtime function changing a count of the given kind for values of `ty`.
pub(crate) fn count_function(ty: &Type, kind: CountKind) -> Option<RuntimeFn> {
    let function = match (ty, kind) {
        (Type::String, CountKind::Reference) => RuntimeFn::StringUpdateReferenceCount,
        (Type::BigInt, CountKind::Reference) => RuntimeFn::BigIntUpdateReferenceCount,
        (Type::Array(_), CountKind::Reference) => RuntimeFn::ArrayUpdateReferenceCount,
        (Type::Array(_), CountKind::Alias) => RuntimeFn::ArrayUpdateAliasCount,
        (Type::Tuple(_) | Type::Udt(_), CountKind::Reference) => {
            RuntimeFn::TupleUpdateReferenceCount
        }
        (Type::Tuple(_) | Type::Udt(_), CountKind::Alias) => RuntimeFn::TupleUpdateAliasCount,
        (Type::Function { .. } | Type::Operation { .. }, CountKind::Reference) => {
            RuntimeFn::CallableUpdateReferenceCount
        }
        (Type::Function { .. } | Type::Operation { .. }, CountKind::Alias) => {
            RuntimeFn::CallableUpdateAliasCount
        }
        _ => return None,
    };
    Some(function)
}

/// Runtime function changing the counts of a callable's capture tuple.
pub(crate) fn capture_count_function(kind: CountKind) -> RuntimeFn {
    match kind {
        CountKind::Reference => RuntimeFn::CaptureUpdateReferenceCount,
        CountKind::Alias => RuntimeFn::CaptureUpdateAliasCount,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use qir_ast::Functors;

    use super::*;

    #[test]
    fn scalars_lower_to_native_types() {
        assert_eq!(lower_type(&Type::Int), IrType::Int);
        assert_eq!(lower_type(&Type::Bool), IrType::Bool);
        assert_eq!(lower_type(&Type::Pauli), IrType::Pauli);
        assert_eq!(lower_type(&Type::Result), IrType::Result);
        assert_eq!(lower_type(&Type::Range), IrType::Range);
    }

    #[test]
    fn aggregates_lower_to_opaque_pointers() {
        assert_eq!(lower_type(&Type::array(Type::Int)), IrType::Array);
        assert_eq!(lower_type(&Type::Tuple(vec![Type::Int, Type::Bool])), IrType::Tuple);
        assert_eq!(
            lower_type(&Type::operation(Type::Qubit, Type::Unit, Functors::ADJOINT)),
            IrType::Callable
        );
    }

    #[test]
    fn signatures_flatten_arguments() {
        assert_eq!(lower_return_type(&Type::Unit), IrType::Void);
        assert!(lower_params(&Type::Unit).is_empty());
        assert_eq!(
            lower_params(&Type::Tuple(vec![Type::Qubit, Type::Double])),
            vec![IrType::Qubit, IrType::Double]
        );
    }

    #[test]
    fn count_classes() {
        assert!(!has_count(&Type::Result, CountKind::Reference));
        assert!(has_count(&Type::String, CountKind::Reference));
        assert!(!has_count(&Type::String, CountKind::Alias));
        assert!(has_count(&Type::array(Type::Qubit), CountKind::Alias));
        assert_eq!(count_function(&Type::Qubit, CountKind::Reference), None);
        assert_eq!(
            count_function(&Type::Tuple(vec![Type::Int, Type::Int]), CountKind::Alias),
            Some(RuntimeFn::TupleUpdateAliasCount)
        );
    }
}
