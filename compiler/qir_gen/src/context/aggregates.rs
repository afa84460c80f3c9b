//! Tuple and array access.
//!
//! Tuples are handled through their opaque `%Tuple*`: item access bitcasts
//! it to a pointer to the tuple's layout first. Array items are reached
//! through the runtime's element pointer entry point.

use qir_ast::Type;
use qir_ir::{Constant, IrType, RuntimeFn, Value};

use super::GenerationContext;
use crate::types::lower_type;
use crate::value::LoweredValue;
use crate::{GenError, Result};

impl GenerationContext<'_> {
    // ── Tuples ─────────────────────────────────────────────────

    /// Typed layout pointer of a tuple-like type.
    pub(crate) fn tuple_layout(&self, ty: &Type) -> Result<IrType> {
        let items = self.tuple_items(ty)?;
        Ok(IrType::typed_tuple(items.iter().map(lower_type).collect()))
    }

    /// Pointer to payload item `index` and the item's type.
    pub(crate) fn tuple_element_ptr(
        &mut self,
        tuple: &LoweredValue,
        index: usize,
    ) -> Result<(Value, Type)> {
        let items = self.tuple_items(tuple.ty())?;
        let item_ty = items.get(index).cloned().ok_or_else(|| {
            GenError::invariant(format!(
                "tuple item {index} out of range for {:?}",
                tuple.ty()
            ))
        })?;
        let layout = self.tuple_layout(tuple.ty())?;
        let typed = self.builder.bitcast(tuple.ir().clone(), layout);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "tuple arity never exceeds u32"
        )]
        let ptr = self.builder.element_ptr(typed, index as u32);
        Ok((ptr, item_ty))
    }

    /// Load payload item `index` of a tuple.
    pub(crate) fn tuple_element(
        &mut self,
        tuple: &LoweredValue,
        index: usize,
    ) -> Result<LoweredValue> {
        let (ptr, item_ty) = self.tuple_element_ptr(tuple, index)?;
        let value = self.builder.load(lower_type(&item_ty), ptr);
        Ok(LoweredValue::from_ir(value, item_ty))
    }

    /// Load every payload item of a tuple.
    pub(crate) fn tuple_elements(&mut self, tuple: &LoweredValue) -> Result<Vec<LoweredValue>> {
        let count = self.tuple_items(tuple.ty())?.len();
        (0..count)
            .map(|index| self.tuple_element(tuple, index))
            .collect()
    }

    /// Allocate an unregistered tuple of type `ty` with uninitialized items.
    pub(crate) fn allocate_tuple(&mut self, ty: &Type) -> Result<LoweredValue> {
        let items = self.tuple_items(ty)?;
        let size = Value::Const(Constant::SizeOf(IrType::TupleLayout(
            items.iter().map(lower_type).collect(),
        )));
        let raw = self.builder.call_runtime_value(RuntimeFn::TupleCreate, vec![size]);
        Ok(LoweredValue::Tuple {
            value: raw,
            ty: ty.clone(),
        })
    }

    /// Allocate a tuple of type `ty` holding `values`.
    ///
    /// Neither the tuple nor its items are registered; see
    /// [`tuple_from_values`](Self::tuple_from_values) and
    /// [`tuple_from_owned`](Self::tuple_from_owned).
    pub(crate) fn fill_tuple(&mut self, ty: &Type, values: &[LoweredValue]) -> Result<LoweredValue> {
        let items = self.tuple_items(ty)?;
        if items.len() != values.len() {
            return Err(GenError::invariant(format!(
                "{} values for a tuple of {} items",
                values.len(),
                items.len()
            )));
        }
        let tuple = self.allocate_tuple(ty)?;
        for (index, value) in values.iter().enumerate() {
            let (ptr, _) = self.tuple_element_ptr(&tuple, index)?;
            self.builder.store(value.ir().clone(), ptr);
        }
        Ok(tuple)
    }

    /// New tuple referencing borrowed `values`; owned by the innermost scope.
    pub(crate) fn tuple_from_values(
        &mut self,
        ty: &Type,
        values: &[LoweredValue],
    ) -> Result<LoweredValue> {
        let tuple = self.fill_tuple(ty, values)?;
        for value in values {
            self.scopes.increase_reference_count(value, false)?;
        }
        self.scopes.register_value(&tuple, false)?;
        Ok(tuple)
    }

    /// New tuple taking over the references of `values`; owned by the innermost scope.
    pub(crate) fn tuple_from_owned(
        &mut self,
        ty: &Type,
        values: &[LoweredValue],
    ) -> Result<LoweredValue> {
        let tuple = self.fill_tuple(ty, values)?;
        self.scopes.register_value(&tuple, false)?;
        Ok(tuple)
    }

    // ── Arrays ─────────────────────────────────────────────────

    /// Typed pointer to the item at `index` and the item's type.
    pub(crate) fn array_element_ptr(
        &mut self,
        array: &LoweredValue,
        index: Value,
    ) -> Result<(Value, Type)> {
        let item_ty = array
            .array_item()
            .cloned()
            .ok_or_else(|| GenError::invariant(format!("item access on {:?}", array.ty())))?;
        let raw = self.builder.call_runtime_value(
            RuntimeFn::ArrayGetElementPtr1d,
            vec![array.ir().clone(), index],
        );
        let ptr = self.builder.bitcast(raw, IrType::ptr(lower_type(&item_ty)));
        Ok((ptr, item_ty))
    }

    pub(crate) fn array_element(
        &mut self,
        array: &LoweredValue,
        index: Value,
    ) -> Result<LoweredValue> {
        let (ptr, item_ty) = self.array_element_ptr(array, index)?;
        let value = self.builder.load(lower_type(&item_ty), ptr);
        Ok(LoweredValue::from_ir(value, item_ty))
    }

    pub(crate) fn array_length(&mut self, array: &LoweredValue) -> Value {
        self.builder
            .call_runtime_value(RuntimeFn::ArrayGetSize1d, vec![array.ir().clone()])
    }

    /// Allocate an unregistered array of `length` items of type `item_ty`.
    pub(crate) fn allocate_array(&mut self, item_ty: &Type, length: Value) -> LoweredValue {
        #[expect(
            clippy::cast_possible_wrap,
            reason = "item sizes are at most 24 bytes"
        )]
        let size = lower_type(item_ty).byte_size() as i32;
        let raw = self
            .builder
            .call_runtime_value(RuntimeFn::ArrayCreate1d, vec![Value::i32(size), length]);
        LoweredValue::Array {
            value: raw,
            ty: Type::array(item_ty.clone()),
        }
    }

    /// New array taking over the references of `values`; owned by the innermost scope.
    pub(crate) fn array_from_owned(
        &mut self,
        item_ty: &Type,
        values: &[LoweredValue],
    ) -> Result<LoweredValue> {
        let length = i64::try_from(values.len())
            .map_err(|_| GenError::invariant("array literal too long"))?;
        let array = self.allocate_array(item_ty, Value::int(length));
        for (index, value) in (0_i64..).zip(values) {
            let (ptr, _) = self.array_element_ptr(&array, Value::int(index))?;
            self.builder.store(value.ir().clone(), ptr);
        }
        self.scopes.register_value(&array, false)?;
        Ok(array)
    }
}
