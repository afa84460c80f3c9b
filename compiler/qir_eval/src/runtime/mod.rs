//! The runtime library behind `__quantum__rt__*` calls.
//!
//! # Copies
//!
//! `array_copy`, `tuple_copy`, and `callable_copy` create a new object only
//! when forced or when the original is aliased; otherwise they add a
//! reference and return the original. Copies are shallow: the generated
//! code adjusts the counts of shared items itself.
//!
//! # Counts
//!
//! Count updates on null are no-ops. Dropping the last reference frees an
//! object; a count going negative is an error.

mod big_int;
mod callables;
mod text;

use qir_ir::RuntimeFn;

use crate::heap::ObjectKind;
use crate::interpreter::Interpreter;
use crate::value::{Location, ObjectId, RtValue};
use crate::{EvalError, EvalResult};

/// Which count an update changes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Count {
    Reference,
    Alias,
}

/// Argument `index` of a runtime call.
fn arg(args: &[RtValue], index: usize) -> EvalResult<&RtValue> {
    args.get(index)
        .ok_or_else(|| EvalError::mismatch("runtime argument", &index))
}

/// Object argument that must not be null.
fn object_arg(args: &[RtValue], index: usize) -> EvalResult<ObjectId> {
    arg(args, index)?
        .as_object()?
        .ok_or_else(|| EvalError::mismatch("non-null object", &RtValue::Null))
}

impl Interpreter<'_> {
    pub(crate) fn call_runtime(
        &mut self,
        function: RuntimeFn,
        args: &[RtValue],
    ) -> EvalResult<Option<RtValue>> {
        tracing::trace!(function = function.name(), "runtime");
        let value = match function {
            RuntimeFn::ResultEqual => {
                let lhs = result_arg(args, 0)?;
                RtValue::Bool(lhs == result_arg(args, 1)?)
            }

            // Counts
            RuntimeFn::StringUpdateReferenceCount => {
                return self.update_count(args, "string", Count::Reference);
            }
            RuntimeFn::BigIntUpdateReferenceCount => {
                return self.update_count(args, "big integer", Count::Reference);
            }
            RuntimeFn::TupleUpdateReferenceCount => {
                return self.update_count(args, "tuple", Count::Reference);
            }
            RuntimeFn::TupleUpdateAliasCount => return self.update_count(args, "tuple", Count::Alias),
            RuntimeFn::ArrayUpdateReferenceCount => {
                return self.update_count(args, "array", Count::Reference);
            }
            RuntimeFn::ArrayUpdateAliasCount => return self.update_count(args, "array", Count::Alias),
            RuntimeFn::CallableUpdateReferenceCount => {
                return self.update_count(args, "callable", Count::Reference);
            }
            RuntimeFn::CallableUpdateAliasCount => {
                return self.update_count(args, "callable", Count::Alias);
            }
            RuntimeFn::CaptureUpdateReferenceCount => {
                return self.update_capture_count(args, Count::Reference);
            }
            RuntimeFn::CaptureUpdateAliasCount => return self.update_capture_count(args, Count::Alias),

            // Strings
            RuntimeFn::StringCreate => self.string_create(args)?,
            RuntimeFn::StringConcatenate => self.string_concatenate(args)?,
            RuntimeFn::StringEqual => self.string_equal(args)?,
            RuntimeFn::BigIntToString
            | RuntimeFn::BoolToString
            | RuntimeFn::DoubleToString
            | RuntimeFn::IntToString
            | RuntimeFn::PauliToString
            | RuntimeFn::QubitToString
            | RuntimeFn::RangeToString
            | RuntimeFn::ResultToString => self.render_string(arg(args, 0)?)?,

            // Big integers
            RuntimeFn::BigIntCreateI64
            | RuntimeFn::BigIntCreateArray
            | RuntimeFn::BigIntNegate
            | RuntimeFn::BigIntAdd
            | RuntimeFn::BigIntSubtract
            | RuntimeFn::BigIntMultiply
            | RuntimeFn::BigIntDivide
            | RuntimeFn::BigIntModulus
            | RuntimeFn::BigIntPower
            | RuntimeFn::BigIntBitAnd
            | RuntimeFn::BigIntBitOr
            | RuntimeFn::BigIntBitXor
            | RuntimeFn::BigIntBitNot
            | RuntimeFn::BigIntShiftLeft
            | RuntimeFn::BigIntShiftRight
            | RuntimeFn::BigIntEqual
            | RuntimeFn::BigIntGreater
            | RuntimeFn::BigIntGreaterEq => self.big_int_op(function, args)?,

            // Tuples
            RuntimeFn::TupleCreate => {
                RtValue::Object(self.heap.allocate(ObjectKind::Tuple(Vec::new())))
            }
            RuntimeFn::TupleCopy => self.copy_object(args, "tuple")?,

            // Arrays
            RuntimeFn::ArrayCreate1d => {
                let length = arg(args, 1)?.as_int()?;
                let length = usize::try_from(length).map_err(|_| EvalError::IndexOutOfRange {
                    index: length,
                    length: 0,
                })?;
                let items = vec![RtValue::Undef; length];
                RtValue::Object(self.heap.allocate(ObjectKind::Array(items)))
            }
            RuntimeFn::ArrayGetElementPtr1d => {
                let array = object_arg(args, 0)?;
                let index = arg(args, 1)?.as_int()?;
                let length = self.heap.array(array)?.len();
                let position = usize::try_from(index)
                    .ok()
                    .filter(|position| *position < length)
                    .ok_or(EvalError::IndexOutOfRange { index, length })?;
                RtValue::Ptr(Location::ArrayItem(array, position))
            }
            RuntimeFn::ArrayGetSize1d => {
                let length = self.heap.array(object_arg(args, 0)?)?.len();
                RtValue::Int(i64::try_from(length).unwrap_or(i64::MAX))
            }
            RuntimeFn::ArrayCopy => self.copy_object(args, "array")?,
            RuntimeFn::ArrayConcatenate => {
                let mut items = self.heap.array(object_arg(args, 0)?)?.to_vec();
                items.extend_from_slice(self.heap.array(object_arg(args, 1)?)?);
                RtValue::Object(self.heap.allocate(ObjectKind::Array(items)))
            }
            RuntimeFn::ArraySlice1d => {
                let array = object_arg(args, 0)?;
                let range = arg(args, 1)?.as_range()?;
                let source = self.heap.array(array)?;
                let items = range
                    .values()
                    .map(|index| {
                        usize::try_from(index)
                            .ok()
                            .and_then(|position| source.get(position))
                            .cloned()
                            .ok_or(EvalError::IndexOutOfRange {
                                index,
                                length: source.len(),
                            })
                    })
                    .collect::<EvalResult<Vec<_>>>()?;
                RtValue::Object(self.heap.allocate(ObjectKind::Array(items)))
            }

            // Callables
            RuntimeFn::CallableCreate => self.callable_create(args)?,
            RuntimeFn::CallableInvoke => return self.callable_invoke(args).map(|()| None),
            RuntimeFn::CallableCopy => self.callable_copy(args)?,
            RuntimeFn::CallableMakeAdjoint => {
                let callable = self.heap.callable_mut(object_arg(args, 0)?)?;
                callable.adjoint = !callable.adjoint;
                return Ok(None);
            }
            RuntimeFn::CallableMakeControlled => {
                self.heap.callable_mut(object_arg(args, 0)?)?.controlled += 1;
                return Ok(None);
            }

            // Qubits
            RuntimeFn::QubitAllocate => RtValue::Qubit(self.heap.allocate_qubit()),
            RuntimeFn::QubitAllocateArray => {
                let count = arg(args, 0)?.as_int()?;
                let count = usize::try_from(count).map_err(|_| EvalError::IndexOutOfRange {
                    index: count,
                    length: 0,
                })?;
                let qubits = (0..count)
                    .map(|_| RtValue::Qubit(self.heap.allocate_qubit()))
                    .collect();
                RtValue::Object(self.heap.allocate(ObjectKind::Array(qubits)))
            }
            RuntimeFn::QubitRelease => {
                self.heap.release_qubit(arg(args, 0)?.as_qubit()?)?;
                return Ok(None);
            }
            RuntimeFn::QubitReleaseArray => {
                let array = object_arg(args, 0)?;
                let qubits = self.heap.array(array)?.to_vec();
                for qubit in &qubits {
                    self.heap.release_qubit(qubit.as_qubit()?)?;
                }
                self.heap.update_reference_count(array, -1)?;
                return Ok(None);
            }

            // Other
            RuntimeFn::IntPower => {
                let base = arg(args, 0)?.as_int()?;
                let exponent = arg(args, 1)?.as_i32()?;
                let exponent = u32::try_from(exponent)
                    .map_err(|_| EvalError::fail("negative exponent in integer power"))?;
                RtValue::Int(base.wrapping_pow(exponent))
            }
            RuntimeFn::Fail => {
                let message = self.string_arg(args, 0)?.to_owned();
                tracing::debug!(%message, "fail");
                return Err(EvalError::fail(message));
            }
            RuntimeFn::Message => {
                let message = self.string_arg(args, 0)?.to_owned();
                self.output.message(&message);
                return Ok(None);
            }
        };
        Ok(Some(value))
    }

    fn update_count(
        &mut self,
        args: &[RtValue],
        expected: &'static str,
        count: Count,
    ) -> EvalResult<Option<RtValue>> {
        let Some(id) = arg(args, 0)?.as_object()? else {
            return Ok(None);
        };
        let change = i64::from(arg(args, 1)?.as_i32()?);
        let kind = self.heap.get(id)?.kind_name();
        if kind != expected {
            return Err(EvalError::mismatch(expected, &kind));
        }
        match count {
            Count::Reference => self.heap.update_reference_count(id, change)?,
            Count::Alias => self.heap.update_alias_count(id, change)?,
        }
        Ok(None)
    }

    /// `array_copy` and `tuple_copy`.
    fn copy_object(&mut self, args: &[RtValue], expected: &'static str) -> EvalResult<RtValue> {
        let Some(id) = arg(args, 0)?.as_object()? else {
            return Ok(RtValue::Null);
        };
        let force = arg(args, 1)?.as_bool()?;
        let kind = self.heap.get(id)?;
        if kind.kind_name() != expected {
            return Err(EvalError::mismatch(expected, &kind.kind_name()));
        }
        if force || self.heap.alias_count(id)? > 0 {
            let copy = kind.clone();
            return Ok(RtValue::Object(self.heap.allocate_copy(copy)));
        }
        self.heap.update_reference_count(id, 1)?;
        Ok(RtValue::Object(id))
    }
}

fn result_arg(args: &[RtValue], index: usize) -> EvalResult<bool> {
    match arg(args, index)? {
        RtValue::Result(one) => Ok(*one),
        other => Err(EvalError::mismatch("Result", other)),
    }
}
