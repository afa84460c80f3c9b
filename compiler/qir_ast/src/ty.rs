//! Semantic types of the source language.

use bitflags::bitflags;

use crate::QualifiedName;

bitflags! {
    /// Functors supported by an operation value.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Functors: u8 {
        const ADJOINT = 0b01;
        const CONTROLLED = 0b10;
    }
}

/// Resolved, monomorphic type of an expression or declaration.
///
/// Type parameters never appear: the tree is monomorphized before it
/// reaches the generator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Unit,
    Int,
    BigInt,
    Double,
    Bool,
    String,
    Qubit,
    Result,
    Pauli,
    Range,
    Array(Box<Type>),
    /// Tuple with at least two items; single-item tuples collapse to the item.
    Tuple(Vec<Type>),
    Udt(QualifiedName),
    Function {
        input: Box<Type>,
        output: Box<Type>,
    },
    Operation {
        input: Box<Type>,
        output: Box<Type>,
        functors: Functors,
    },
}

impl Type {
    /// Shorthand for `Type::Array(Box::new(item))`.
    pub fn array(item: Type) -> Type {
        Type::Array(Box::new(item))
    }

    /// Shorthand for a function type.
    pub fn function(input: Type, output: Type) -> Type {
        Type::Function {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    /// Shorthand for an operation type.
    pub fn operation(input: Type, output: Type, functors: Functors) -> Type {
        Type::Operation {
            input: Box::new(input),
            output: Box::new(output),
            functors,
        }
    }

    /// Build the type of an argument or return tuple from its items,
    /// collapsing the empty tuple to Unit and single items to the item.
    pub fn tuple_of(mut items: Vec<Type>) -> Type {
        match items.len() {
            0 => Type::Unit,
            1 => items.pop().unwrap_or(Type::Unit),
            _ => Type::Tuple(items),
        }
    }

    /// Whether values of this type are represented as header-prefixed tuples.
    pub fn is_tuple_like(&self) -> bool {
        matches!(self, Type::Tuple(_) | Type::Udt(_))
    }

    /// Whether this is a function or operation type.
    pub fn is_callable(&self) -> bool {
        matches!(self, Type::Function { .. } | Type::Operation { .. })
    }

    /// Input type of a callable type.
    pub fn callable_input(&self) -> Option<&Type> {
        match self {
            Type::Function { input, .. } | Type::Operation { input, .. } => Some(input),
            _ => None,
        }
    }

    /// Output type of a callable type.
    pub fn callable_output(&self) -> Option<&Type> {
        match self {
            Type::Function { output, .. } | Type::Operation { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Functors supported by a callable type; functions support none.
    pub fn functors(&self) -> Functors {
        match self {
            Type::Operation { functors, .. } => *functors,
            _ => Functors::empty(),
        }
    }

    /// Item type of an array type.
    pub fn array_item(&self) -> Option<&Type> {
        match self {
            Type::Array(item) => Some(item),
            _ => None,
        }
    }

    /// Items of a flattened argument or result: empty for Unit, the tuple
    /// items for a tuple, and the type itself otherwise.
    pub fn flattened(&self) -> Vec<Type> {
        match self {
            Type::Unit => Vec::new(),
            Type::Tuple(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// The type of a controlled specialization's argument: `(Qubit[], input)`.
    pub fn controlled_input(input: &Type) -> Type {
        Type::Tuple(vec![Type::array(Type::Qubit), input.clone()])
    }
}
