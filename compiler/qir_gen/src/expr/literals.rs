//! Literals, aggregates, and default values.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use qir_ast::{Pauli, Type, TypedExpr};
use qir_ir::{BinOp, Constant, GlobalKind, IrType, RuntimeFn, Value};

use crate::context::GenerationContext;
use crate::types::lower_type;
use crate::value::LoweredValue;
use crate::{GenError, Result};

impl GenerationContext<'_> {
    /// Big integer literal: from an `i64` when it fits, from bytes otherwise.
    pub(super) fn lower_big_int(&mut self, value: &BigInt) -> Result<LoweredValue> {
        let raw = match value.to_i64() {
            Some(small) => self
                .builder
                .call_runtime_value(RuntimeFn::BigIntCreateI64, vec![Value::int(small)]),
            None => {
                let bytes = value.to_signed_bytes_le();
                let length = i32::try_from(bytes.len())
                    .map_err(|_| GenError::invariant("big integer literal too large"))?;
                let name = self.global_name("bigint");
                let global = self.module.add_global(&name, GlobalKind::Bytes(bytes));
                let ptr = Value::Const(Constant::Global(global, IrType::Bytes));
                self.builder.call_runtime_value(
                    RuntimeFn::BigIntCreateArray,
                    vec![Value::i32(length), ptr],
                )
            }
        };
        let value = LoweredValue::from_ir(raw, Type::BigInt);
        self.scopes.register_value(&value, false)?;
        Ok(value)
    }

    /// `start..end` or `start..step..end`.
    pub(super) fn lower_range(
        &mut self,
        start: &TypedExpr,
        step: Option<&TypedExpr>,
        end: &TypedExpr,
    ) -> Result<LoweredValue> {
        let start = self.lower_expr(start)?.into_ir();
        let step = match step {
            Some(step) => self.lower_expr(step)?.into_ir(),
            None => Value::int(1),
        };
        let end = self.lower_expr(end)?.into_ir();
        Ok(self.build_range(start, step, end))
    }

    pub(crate) fn build_range(&mut self, start: Value, step: Value, end: Value) -> LoweredValue {
        let range = Value::undef(IrType::Range);
        let range = self.builder.insert_value(range, start, 0);
        let range = self.builder.insert_value(range, step, 1);
        let range = self.builder.insert_value(range, end, 2);
        LoweredValue::Scalar {
            value: range,
            ty: Type::Range,
        }
    }

    /// Start, step, and end of a range value.
    pub(crate) fn range_parts(&mut self, range: &Value) -> (Value, Value, Value) {
        let start = self.builder.extract_value(range.clone(), 0);
        let step = self.builder.extract_value(range.clone(), 1);
        let end = self.builder.extract_value(range.clone(), 2);
        (start, step, end)
    }

    pub(super) fn lower_value_tuple(
        &mut self,
        ty: &Type,
        items: &[TypedExpr],
    ) -> Result<LoweredValue> {
        let values = items
            .iter()
            .map(|item| self.build_subitem(item))
            .collect::<Result<Vec<_>>>()?;
        self.tuple_from_owned(ty, &values)
    }

    pub(super) fn lower_value_array(
        &mut self,
        ty: &Type,
        items: &[TypedExpr],
    ) -> Result<LoweredValue> {
        let item_ty = ty
            .array_item()
            .ok_or_else(|| GenError::invariant("array literal without an array type"))?;
        let values = items
            .iter()
            .map(|item| self.build_subitem(item))
            .collect::<Result<Vec<_>>>()?;
        self.array_from_owned(item_ty, &values)
    }

    /// `new T[length]`, filled with the default value of `T`.
    pub(super) fn lower_new_array(
        &mut self,
        ty: &Type,
        length: &TypedExpr,
    ) -> Result<LoweredValue> {
        let item_ty = ty
            .array_item()
            .ok_or_else(|| GenError::invariant("new array without an array type"))?;
        let length = self.lower_expr(length)?.into_ir();
        let array = self.allocate_array(item_ty, length.clone());
        self.scopes.register_value(&array, false)?;
        if length == Value::int(0) {
            return Ok(array);
        }
        let end = self.builder.binary(BinOp::Sub, length, Value::int(1));
        self.for_range_loop(Value::int(0), None, end, |ctx, index| {
            let item = ctx.build_owned(|ctx| ctx.default_value(item_ty))?;
            let (ptr, _) = ctx.array_element_ptr(&array, index)?;
            ctx.builder.store(item.into_ir(), ptr);
            Ok(())
        })?;
        Ok(array)
    }

    /// Default value of a type, owned by the innermost scope.
    pub(crate) fn default_value(&mut self, ty: &Type) -> Result<LoweredValue> {
        let scalar = |value: Value| LoweredValue::Scalar {
            value,
            ty: ty.clone(),
        };
        match ty {
            Type::Unit => Ok(LoweredValue::unit()),
            Type::Int => Ok(scalar(Value::int(0))),
            Type::Double => Ok(scalar(Value::double(0.0))),
            Type::Bool => Ok(scalar(Value::bool(false))),
            Type::Pauli => Ok(scalar(Value::Const(Constant::Pauli(Pauli::I as u8)))),
            Type::Result => Ok(scalar(Value::Const(Constant::Result(false)))),
            Type::Qubit | Type::Function { .. } | Type::Operation { .. } => {
                Ok(scalar(Value::null(lower_type(ty))))
            }
            Type::Range => Ok(self.build_range(Value::int(0), Value::int(1), Value::int(-1))),
            Type::BigInt => self.lower_big_int(&BigInt::from(0)),
            Type::String => {
                let value = self.create_string("");
                self.scopes.register_value(&value, false)?;
                Ok(value)
            }
            Type::Array(item) => {
                let array = self.allocate_array(item, Value::int(0));
                self.scopes.register_value(&array, false)?;
                Ok(array)
            }
            Type::Tuple(_) | Type::Udt(_) => {
                let items = self.tuple_items(ty)?;
                let values = items
                    .iter()
                    .map(|item| self.build_owned(|ctx| ctx.default_value(item)))
                    .collect::<Result<Vec<_>>>()?;
                self.tuple_from_owned(ty, &values)
            }
        }
    }
}
