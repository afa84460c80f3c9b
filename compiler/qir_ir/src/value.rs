//! Operands: variables and constants.

use crate::{GlobalId, IrType, VarId};

/// Constant operand.
///
/// Doubles are stored as raw bits so that constants can be hashed and
/// compared structurally.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Bool(bool),
    I32(i32),
    Int(i64),
    Double(u64),
    /// Two-bit Pauli encoding.
    Pauli(u8),
    /// `true` for One.
    Result(bool),
    Null(IrType),
    Undef(IrType),
    /// Address of a module global, typed as the given pointer type.
    Global(GlobalId, IrType),
    /// Allocation size of a type, as `i64`.
    SizeOf(IrType),
}

impl Constant {
    pub fn ty(&self) -> IrType {
        match self {
            Constant::Bool(_) => IrType::Bool,
            Constant::I32(_) => IrType::I32,
            Constant::Int(_) | Constant::SizeOf(_) => IrType::Int,
            Constant::Double(_) => IrType::Double,
            Constant::Pauli(_) => IrType::Pauli,
            Constant::Result(_) => IrType::Result,
            Constant::Null(ty) | Constant::Undef(ty) | Constant::Global(_, ty) => ty.clone(),
        }
    }
}

/// Instruction operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Var(VarId),
    Const(Constant),
}

impl Value {
    #[inline]
    pub fn int(value: i64) -> Value {
        Value::Const(Constant::Int(value))
    }

    #[inline]
    pub fn i32(value: i32) -> Value {
        Value::Const(Constant::I32(value))
    }

    #[inline]
    pub fn bool(value: bool) -> Value {
        Value::Const(Constant::Bool(value))
    }

    #[inline]
    pub fn double(value: f64) -> Value {
        Value::Const(Constant::Double(value.to_bits()))
    }

    #[inline]
    pub fn null(ty: IrType) -> Value {
        Value::Const(Constant::Null(ty))
    }

    #[inline]
    pub fn undef(ty: IrType) -> Value {
        Value::Const(Constant::Undef(ty))
    }

    /// The variable, if this operand is one.
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Value::Var(var) => Some(*var),
            Value::Const(_) => None,
        }
    }

    /// The constant boolean, if this operand is one.
    pub fn as_const_bool(&self) -> Option<bool> {
        match self {
            Value::Const(Constant::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Const(Constant::Null(_)))
    }
}

impl From<VarId> for Value {
    fn from(var: VarId) -> Self {
        Value::Var(var)
    }
}

impl From<Constant> for Value {
    fn from(constant: Constant) -> Self {
        Value::Const(constant)
    }
}
