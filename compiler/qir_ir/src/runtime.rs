//! Catalogue of runtime library functions.
//!
//! Every function the generated code may call in the runtime is listed
//! here with its signature. The printer declares exactly the functions a
//! module uses, as `__quantum__rt__{name}`.

use crate::IrType;

/// Name prefix of runtime library functions.
pub const RUNTIME_PREFIX: &str = "__quantum__rt__";

/// Name prefix of target instructions.
pub const TARGET_PREFIX: &str = "__quantum__qis__";

macro_rules! runtime_functions {
    ($($variant:ident => $name:literal ( $($param:expr),* ) -> $ret:expr;)*) => {
        /// Runtime library function.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RuntimeFn {
            $($variant,)*
        }

        impl RuntimeFn {
            /// All runtime functions, in catalogue order.
            pub const ALL: &'static [RuntimeFn] = &[$(RuntimeFn::$variant,)*];

            /// Unprefixed name, e.g. `array_copy`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(RuntimeFn::$variant => $name,)*
                }
            }

            /// Parameter types.
            pub fn params(self) -> Vec<IrType> {
                match self {
                    $(RuntimeFn::$variant => vec![$($param),*],)*
                }
            }

            /// Return type.
            pub fn ret(self) -> IrType {
                match self {
                    $(RuntimeFn::$variant => $ret,)*
                }
            }
        }
    };
}

runtime_functions! {
    // Results
    ResultEqual => "result_equal"(IrType::Result, IrType::Result) -> IrType::Bool;

    // Strings
    StringCreate => "string_create"(IrType::Bytes) -> IrType::String;
    StringUpdateReferenceCount => "string_update_reference_count"(IrType::String, IrType::I32) -> IrType::Void;
    StringConcatenate => "string_concatenate"(IrType::String, IrType::String) -> IrType::String;
    StringEqual => "string_equal"(IrType::String, IrType::String) -> IrType::Bool;

    // Conversions to string
    BigIntToString => "bigint_to_string"(IrType::BigInt) -> IrType::String;
    BoolToString => "bool_to_string"(IrType::Bool) -> IrType::String;
    DoubleToString => "double_to_string"(IrType::Double) -> IrType::String;
    IntToString => "int_to_string"(IrType::Int) -> IrType::String;
    PauliToString => "pauli_to_string"(IrType::Pauli) -> IrType::String;
    QubitToString => "qubit_to_string"(IrType::Qubit) -> IrType::String;
    RangeToString => "range_to_string"(IrType::Range) -> IrType::String;
    ResultToString => "result_to_string"(IrType::Result) -> IrType::String;

    // Big integers
    BigIntCreateI64 => "bigint_create_i64"(IrType::Int) -> IrType::BigInt;
    BigIntCreateArray => "bigint_create_array"(IrType::I32, IrType::Bytes) -> IrType::BigInt;
    BigIntUpdateReferenceCount => "bigint_update_reference_count"(IrType::BigInt, IrType::I32) -> IrType::Void;
    BigIntNegate => "bigint_negate"(IrType::BigInt) -> IrType::BigInt;
    BigIntAdd => "bigint_add"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntSubtract => "bigint_subtract"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntMultiply => "bigint_multiply"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntDivide => "bigint_divide"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntModulus => "bigint_modulus"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntPower => "bigint_power"(IrType::BigInt, IrType::I32) -> IrType::BigInt;
    BigIntBitAnd => "bigint_bitand"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntBitOr => "bigint_bitor"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntBitXor => "bigint_bitxor"(IrType::BigInt, IrType::BigInt) -> IrType::BigInt;
    BigIntBitNot => "bigint_bitnot"(IrType::BigInt) -> IrType::BigInt;
    BigIntShiftLeft => "bigint_shiftleft"(IrType::BigInt, IrType::Int) -> IrType::BigInt;
    BigIntShiftRight => "bigint_shiftright"(IrType::BigInt, IrType::Int) -> IrType::BigInt;
    BigIntEqual => "bigint_equal"(IrType::BigInt, IrType::BigInt) -> IrType::Bool;
    BigIntGreater => "bigint_greater"(IrType::BigInt, IrType::BigInt) -> IrType::Bool;
    BigIntGreaterEq => "bigint_greater_eq"(IrType::BigInt, IrType::BigInt) -> IrType::Bool;

    // Tuples
    TupleCreate => "tuple_create"(IrType::Int) -> IrType::Tuple;
    TupleUpdateAliasCount => "tuple_update_alias_count"(IrType::Tuple, IrType::I32) -> IrType::Void;
    TupleUpdateReferenceCount => "tuple_update_reference_count"(IrType::Tuple, IrType::I32) -> IrType::Void;
    TupleCopy => "tuple_copy"(IrType::Tuple, IrType::Bool) -> IrType::Tuple;

    // Arrays
    ArrayCreate1d => "array_create_1d"(IrType::I32, IrType::Int) -> IrType::Array;
    ArrayGetElementPtr1d => "array_get_element_ptr_1d"(IrType::Array, IrType::Int) -> IrType::Bytes;
    ArrayUpdateAliasCount => "array_update_alias_count"(IrType::Array, IrType::I32) -> IrType::Void;
    ArrayUpdateReferenceCount => "array_update_reference_count"(IrType::Array, IrType::I32) -> IrType::Void;
    ArrayCopy => "array_copy"(IrType::Array, IrType::Bool) -> IrType::Array;
    ArrayConcatenate => "array_concatenate"(IrType::Array, IrType::Array) -> IrType::Array;
    ArraySlice1d => "array_slice_1d"(IrType::Array, IrType::Range, IrType::Bool) -> IrType::Array;
    ArrayGetSize1d => "array_get_size_1d"(IrType::Array) -> IrType::Int;

    // Callables
    CallableCreate => "callable_create"(IrType::CallableTable, IrType::MemoryTable, IrType::Tuple) -> IrType::Callable;
    CallableInvoke => "callable_invoke"(IrType::Callable, IrType::Tuple, IrType::Tuple) -> IrType::Void;
    CallableCopy => "callable_copy"(IrType::Callable, IrType::Bool) -> IrType::Callable;
    CallableMakeAdjoint => "callable_make_adjoint"(IrType::Callable) -> IrType::Void;
    CallableMakeControlled => "callable_make_controlled"(IrType::Callable) -> IrType::Void;
    CallableUpdateAliasCount => "callable_update_alias_count"(IrType::Callable, IrType::I32) -> IrType::Void;
    CallableUpdateReferenceCount => "callable_update_reference_count"(IrType::Callable, IrType::I32) -> IrType::Void;
    CaptureUpdateAliasCount => "capture_update_alias_count"(IrType::Callable, IrType::I32) -> IrType::Void;
    CaptureUpdateReferenceCount => "capture_update_reference_count"(IrType::Callable, IrType::I32) -> IrType::Void;

    // Qubits
    QubitAllocate => "qubit_allocate"() -> IrType::Qubit;
    QubitAllocateArray => "qubit_allocate_array"(IrType::Int) -> IrType::Array;
    QubitRelease => "qubit_release"(IrType::Qubit) -> IrType::Void;
    QubitReleaseArray => "qubit_release_array"(IrType::Array) -> IrType::Void;

    // Other
    IntPower => "int_power"(IrType::Int, IrType::I32) -> IrType::Int;
    Fail => "fail"(IrType::String) -> IrType::Void;
    Message => "message"(IrType::String) -> IrType::Void;
}

impl RuntimeFn {
    /// Fully prefixed symbol name.
    pub fn symbol(self) -> String {
        format!("{RUNTIME_PREFIX}{}", self.name())
    }

    /// Look up a runtime function by its unprefixed name.
    pub fn from_name(name: &str) -> Option<RuntimeFn> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// LLVM intrinsics used by generated code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intrinsic {
    /// `llvm.pow.f64`
    PowF64,
}

impl Intrinsic {
    pub const fn symbol(self) -> &'static str {
        match self {
            Intrinsic::PowF64 => "llvm.pow.f64",
        }
    }

    pub fn params(self) -> Vec<IrType> {
        match self {
            Intrinsic::PowF64 => vec![IrType::Double, IrType::Double],
        }
    }

    pub fn ret(self) -> IrType {
        match self {
            Intrinsic::PowF64 => IrType::Double,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn symbols_are_prefixed() {
        assert_eq!(RuntimeFn::ArrayCopy.symbol(), "__quantum__rt__array_copy");
        assert_eq!(RuntimeFn::from_name("qubit_release_array"), Some(RuntimeFn::QubitReleaseArray));
        assert_eq!(RuntimeFn::from_name("no_such_function"), None);
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = RuntimeFn::ALL.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        let len = names.len();
        names.dedup();
        assert_eq!(names.len(), len);
    }

    #[test]
    fn count_updates_take_i32() {
        for f in RuntimeFn::ALL {
            if f.name().contains("update_") {
                assert_eq!(f.params().last(), Some(&IrType::I32), "{}", f.name());
                assert_eq!(f.ret(), IrType::Void);
            }
        }
    }
}
