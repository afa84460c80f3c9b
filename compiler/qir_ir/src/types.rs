//! IR types.
//!
//! Runtime-managed values (arrays, tuples, callables, strings, big integers,
//! qubits) are opaque pointers. Tuple items are reached by bitcasting the
//! opaque `%Tuple*` to a pointer to the tuple's layout: a runtime header
//! followed by the payload items.

use std::fmt;

/// Size of the runtime header at the start of every tuple.
pub const TUPLE_HEADER_SIZE: u32 = 8;

/// Type of an IR value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    /// `i1`
    Bool,
    /// `i8`
    I8,
    /// `i32`: count changes and element sizes
    I32,
    /// `i64`
    Int,
    Double,
    /// `i2`: I=0, X=1, Z=2, Y=3
    Pauli,
    /// `%Result`: one byte, Zero=0, One=1
    Result,
    /// `%Range = type { i64, i64, i64 }`, passed by value
    Range,
    Array,
    Callable,
    Qubit,
    String,
    BigInt,
    Tuple,
    /// `i8*`: raw bytes (string literals, big integer bytes, element pointers)
    Bytes,
    /// Tuple layout `{ %TupleHeader, items... }`; only used as the pointee
    /// of typed tuple pointers. Item indices exclude the header.
    TupleLayout(Vec<IrType>),
    Ptr(Box<IrType>),
    /// Pointer to a four-entry table of specialization entry points.
    CallableTable,
    /// Pointer to a two-entry table of capture count functions.
    MemoryTable,
}

impl IrType {
    /// Shorthand for `IrType::Ptr(Box::new(pointee))`.
    pub fn ptr(pointee: IrType) -> IrType {
        IrType::Ptr(Box::new(pointee))
    }

    /// Pointer to a tuple layout with the given payload items.
    pub fn typed_tuple(items: Vec<IrType>) -> IrType {
        IrType::ptr(IrType::TupleLayout(items))
    }

    /// Pointee of a pointer type.
    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    /// Payload items of a typed tuple pointer.
    pub fn tuple_items(&self) -> Option<&[IrType]> {
        match self.pointee() {
            Some(IrType::TupleLayout(items)) => Some(items),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }

    /// Whether values of this type are pointers (and thus nullable).
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            IrType::Array
                | IrType::Callable
                | IrType::Qubit
                | IrType::String
                | IrType::BigInt
                | IrType::Tuple
                | IrType::Bytes
                | IrType::Ptr(_)
                | IrType::CallableTable
                | IrType::MemoryTable
        )
    }

    /// Allocation size in bytes on a 64-bit target.
    pub fn byte_size(&self) -> u32 {
        match self {
            IrType::Void => 0,
            IrType::Bool | IrType::I8 | IrType::Pauli | IrType::Result => 1,
            IrType::I32 => 4,
            IrType::Range => 24,
            IrType::TupleLayout(items) => {
                TUPLE_HEADER_SIZE + items.iter().map(IrType::byte_size).sum::<u32>()
            }
            IrType::Int
            | IrType::Double
            | IrType::Array
            | IrType::Callable
            | IrType::Qubit
            | IrType::String
            | IrType::BigInt
            | IrType::Tuple
            | IrType::Bytes
            | IrType::Ptr(_)
            | IrType::CallableTable
            | IrType::MemoryTable => 8,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => f.write_str("void"),
            IrType::Bool => f.write_str("i1"),
            IrType::I8 => f.write_str("i8"),
            IrType::I32 => f.write_str("i32"),
            IrType::Int => f.write_str("i64"),
            IrType::Double => f.write_str("double"),
            IrType::Pauli => f.write_str("i2"),
            IrType::Result => f.write_str("%Result"),
            IrType::Range => f.write_str("%Range"),
            IrType::Array => f.write_str("%Array*"),
            IrType::Callable => f.write_str("%Callable*"),
            IrType::Qubit => f.write_str("%Qubit*"),
            IrType::String => f.write_str("%String*"),
            IrType::BigInt => f.write_str("%BigInt*"),
            IrType::Tuple => f.write_str("%Tuple*"),
            IrType::Bytes => f.write_str("i8*"),
            IrType::TupleLayout(items) => {
                f.write_str("{ %TupleHeader")?;
                for item in items {
                    write!(f, ", {item}")?;
                }
                f.write_str(" }")
            }
            IrType::Ptr(inner) => write!(f, "{inner}*"),
            IrType::CallableTable => f.write_str("[4 x void (%Tuple*, %Tuple*, %Tuple*)*]*"),
            IrType::MemoryTable => f.write_str("[2 x void (%Tuple*, i32)*]*"),
        }
    }
}
