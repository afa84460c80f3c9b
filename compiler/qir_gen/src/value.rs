//! Lowered values.

use qir_ast::Type;
use qir_ir::{IrType, Value};

use crate::types::lower_type;

/// Result of lowering an expression, or the binding of a local variable.
///
/// Every variant carries the semantic type, which decides how the value is
/// reference counted and how its items are reached.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum LoweredValue {
    /// A bare IR value: numbers, handles, ranges, strings, callables.
    Scalar { value: Value, ty: Type },
    /// Stack cell of a mutable variable; `ty` is the type of the content.
    Pointer { cell: Value, ty: Type },
    /// Opaque `%Tuple*` of a tuple or user-defined type.
    Tuple { value: Value, ty: Type },
    /// `%Array*`; `ty` is the array type.
    Array { value: Value, ty: Type },
}

impl LoweredValue {
    /// Wrap an IR value of the given semantic type.
    pub(crate) fn from_ir(value: Value, ty: Type) -> Self {
        match ty {
            Type::Array(_) => LoweredValue::Array { value, ty },
            Type::Tuple(_) | Type::Udt(_) => LoweredValue::Tuple { value, ty },
            ty => LoweredValue::Scalar { value, ty },
        }
    }

    /// The Unit value, a null tuple pointer.
    pub(crate) fn unit() -> Self {
        LoweredValue::Scalar {
            value: Value::null(IrType::Tuple),
            ty: Type::Unit,
        }
    }

    /// Placeholder for an expression that is not lowered.
    pub(crate) fn undef(ty: Type) -> Self {
        LoweredValue::from_ir(Value::undef(lower_type(&ty)), ty)
    }

    pub(crate) fn ty(&self) -> &Type {
        match self {
            LoweredValue::Scalar { ty, .. }
            | LoweredValue::Pointer { ty, .. }
            | LoweredValue::Tuple { ty, .. }
            | LoweredValue::Array { ty, .. } => ty,
        }
    }

    /// The IR operand: the cell for pointers, the value otherwise.
    ///
    /// Two lowered values are the same runtime object exactly when their
    /// operands are equal.
    pub(crate) fn ir(&self) -> &Value {
        match self {
            LoweredValue::Scalar { value, .. }
            | LoweredValue::Tuple { value, .. }
            | LoweredValue::Array { value, .. } => value,
            LoweredValue::Pointer { cell, .. } => cell,
        }
    }

    pub(crate) fn into_ir(self) -> Value {
        match self {
            LoweredValue::Scalar { value, .. }
            | LoweredValue::Tuple { value, .. }
            | LoweredValue::Array { value, .. } => value,
            LoweredValue::Pointer { cell, .. } => cell,
        }
    }

    pub(crate) fn is_pointer(&self) -> bool {
        matches!(self, LoweredValue::Pointer { .. })
    }

    pub(crate) fn is_unit(&self) -> bool {
        matches!(self.ty(), Type::Unit)
    }

    /// Item type of an array value.
    pub(crate) fn array_item(&self) -> Option<&Type> {
        match self {
            LoweredValue::Array { ty, .. } => ty.array_item(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use qir_ir::VarId;

    use super::*;

    #[test]
    fn wrapping_follows_the_type() {
        let v = Value::Var(VarId::new(3));
        assert!(matches!(
            LoweredValue::from_ir(v.clone(), Type::array(Type::Int)),
            LoweredValue::Array { .. }
        ));
        assert!(matches!(
            LoweredValue::from_ir(v.clone(), Type::Tuple(vec![Type::Int, Type::Int])),
            LoweredValue::Tuple { .. }
        ));
        let s = LoweredValue::from_ir(v.clone(), Type::String);
        assert_eq!(s.ir(), &v);
        assert_eq!(s.ty(), &Type::String);
    }

    #[test]
    fn unit_is_a_null_tuple() {
        let unit = LoweredValue::unit();
        assert!(unit.is_unit());
        assert!(unit.ir().is_null());
    }
}
