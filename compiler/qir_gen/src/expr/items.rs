//! Item access and copy-and-update.
//!
//! # Copy-on-write
//!
//! An update first asks the runtime for a copy of the container. The
//! runtime copies only when the container is aliased; otherwise it hands
//! back the same object with one more reference, and the update happens
//! in place. Which of the two happened is only known at run time, so the
//! generated code compares the pointers:
//!
//! - in place: the container owns its items, so the new item is
//!   referenced and the replaced one unreferenced right away
//! - copied: the copy shares its items with the original without owning
//!   them; nothing is emitted at the store
//!
//! Either way, a deferred recursive increase of the result plus a shallow
//! decrease of each copy make the result own all of its items when the
//! scope closes.

use qir_ast::{Accessor, Name, QualifiedName, Span, Type, TypeItems, TypedExpr};
use qir_ir::{BinOp, IntPredicate, RuntimeFn, Value};

use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::types::{has_count, lower_type, CountKind};
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// Drop path steps through single-item tuples; those collapse into their item.
fn normalize_path(items: &TypeItems, path: &[usize]) -> Vec<usize> {
    let mut normalized = Vec::with_capacity(path.len());
    let mut current = items;
    for &index in path {
        let TypeItems::Tuple(children) = current else {
            break;
        };
        if children.len() > 1 {
            normalized.push(index);
        }
        match children.get(index) {
            Some(child) => current = child,
            None => break,
        }
    }
    normalized
}

impl GenerationContext<'_> {
    /// `array[index]` for an Int index, `array[range]` for a slice.
    pub(super) fn lower_array_item(
        &mut self,
        array: &TypedExpr,
        index: &TypedExpr,
    ) -> Result<LoweredValue> {
        let array = self.lower_expr(array)?;
        let index_value = self.lower_expr(index)?.into_ir();
        if index.ty == Type::Range {
            let raw = self.builder.call_runtime_value(
                RuntimeFn::ArraySlice1d,
                vec![array.ir().clone(), index_value, Value::bool(false)],
            );
            let slice = LoweredValue::from_ir(raw, array.ty().clone());
            self.own_items(&slice)?;
            self.scopes.register_value(&slice, false)?;
            return Ok(slice);
        }
        self.array_element(&array, index_value)
    }

    /// Tuple index path of a named item of a user-defined type.
    fn udt_item_path(&self, udt: QualifiedName, item: Name, span: Span) -> Result<Vec<usize>> {
        let decl = self.udt(udt)?;
        let path = decl
            .items
            .find_named_item(item)
            .ok_or_else(|| GenError::unsupported(UnsupportedKind::UnknownItem, span))?;
        Ok(normalize_path(&decl.items, &path))
    }

    fn udt_of(value: &LoweredValue, span: Span) -> Result<QualifiedName> {
        match value.ty() {
            Type::Udt(name) => Ok(*name),
            _ => Err(GenError::unsupported(UnsupportedKind::UnknownItem, span)),
        }
    }

    /// `target::item`.
    pub(super) fn lower_named_item(
        &mut self,
        target: &TypedExpr,
        item: Name,
        span: Span,
    ) -> Result<LoweredValue> {
        let value = self.lower_expr(target)?;
        let udt = Self::udt_of(&value, span)?;
        let path = self.udt_item_path(udt, item, span)?;
        if path.is_empty() {
            return self.unwrap_value(&value);
        }
        let mut current = value;
        for index in path {
            current = self.tuple_element(&current, index)?;
        }
        Ok(current)
    }

    /// `target!`.
    pub(super) fn lower_unwrap(&mut self, target: &TypedExpr, ty: &Type) -> Result<LoweredValue> {
        let value = self.lower_expr(target)?;
        let unwrapped = self.unwrap_value(&value)?;
        debug_assert_eq!(unwrapped.ty(), ty, "unwrap result type");
        Ok(unwrapped)
    }

    /// Underlying value of a user-defined type value.
    ///
    /// A tuple-typed underlying value shares the object; a single item is
    /// loaded from slot 0.
    fn unwrap_value(&mut self, value: &LoweredValue) -> Result<LoweredValue> {
        let Type::Udt(name) = value.ty() else {
            return Err(GenError::invariant(format!("unwrap of {:?}", value.ty())));
        };
        match self.udt(*name)?.underlying() {
            ty @ Type::Tuple(_) => Ok(LoweredValue::from_ir(value.ir().clone(), ty)),
            _ => self.tuple_element(value, 0),
        }
    }

    // ── Copy-and-update ────────────────────────────────────────

    /// `original w/ accessor <- value`.
    ///
    /// `update_item_alias_count` is set when the result replaces the
    /// content of a mutable variable, whose items are aliased by it.
    pub(crate) fn copy_and_update(
        &mut self,
        original: &LoweredValue,
        accessor: &Accessor,
        value: &TypedExpr,
        update_item_alias_count: bool,
        span: Span,
    ) -> Result<LoweredValue> {
        match accessor {
            Accessor::Index(index) => {
                self.update_array(original, index, value, update_item_alias_count)
            }
            Accessor::Item(item) => {
                self.update_udt(original, *item, value, update_item_alias_count, span)
            }
        }
    }

    /// Runtime copy of a container and whether a new object was made.
    fn copy_container(&mut self, original: &LoweredValue) -> (LoweredValue, Value) {
        let function = if matches!(original.ty(), Type::Array(_)) {
            RuntimeFn::ArrayCopy
        } else {
            RuntimeFn::TupleCopy
        };
        let raw = self
            .builder
            .call_runtime_value(function, vec![original.ir().clone(), Value::bool(false)]);
        let was_copied = self
            .builder
            .icmp(IntPredicate::Ne, original.ir().clone(), raw.clone());
        (LoweredValue::from_ir(raw, original.ty().clone()), was_copied)
    }

    fn update_array(
        &mut self,
        original: &LoweredValue,
        index: &TypedExpr,
        value: &TypedExpr,
        update_item_alias_count: bool,
    ) -> Result<LoweredValue> {
        let (copy, was_copied) = self.copy_container(original);
        self.scopes.register_value(&copy, false)?;

        if index.ty == Type::Range {
            let new_items = self.lower_expr(value)?;
            let range = self.lower_expr(index)?.into_ir();
            let (start, step, end) = self.range_parts(&range);
            self.for_range_loop(start.clone(), Some(step.clone()), end, |ctx, position| {
                let offset = ctx.builder.binary(BinOp::Sub, position.clone(), start.clone());
                let source = ctx.builder.binary(BinOp::SDiv, offset, step.clone());
                let item = ctx.array_element(&new_items, source)?;
                let (ptr, _) = ctx.array_element_ptr(&copy, position)?;
                ctx.store_element(&ptr, item, &was_copied, false, update_item_alias_count)
            })?;
        } else {
            let new_item = self.lower_expr(value)?;
            let position = self.lower_expr(index)?.into_ir();
            let (ptr, _) = self.array_element_ptr(&copy, position)?;
            self.store_element(&ptr, new_item, &was_copied, false, update_item_alias_count)?;
        }

        self.scopes.increase_reference_count(&copy, false)?;
        self.scopes.decrease_reference_count(&copy, true)?;
        Ok(copy)
    }

    fn update_udt(
        &mut self,
        original: &LoweredValue,
        item: Name,
        value: &TypedExpr,
        update_item_alias_count: bool,
        span: Span,
    ) -> Result<LoweredValue> {
        let udt = Self::udt_of(original, span)?;
        let mut path = self.udt_item_path(udt, item, span)?;
        if path.is_empty() {
            if let Type::Tuple(_) = self.udt(udt)?.underlying() {
                // The item is the whole underlying tuple.
                let replacement = self.lower_expr(value)?;
                return Ok(LoweredValue::from_ir(
                    replacement.into_ir(),
                    original.ty().clone(),
                ));
            }
            path.push(0);
        }

        let (copy, was_copied) = self.copy_container(original);
        self.scopes.register_value(&copy, false)?;

        let mut copies = vec![copy.clone()];
        let mut container = copy.clone();
        let mut container_copied = was_copied;
        let (last, inner_steps) = path
            .split_last()
            .ok_or_else(|| GenError::invariant("empty item path"))?;
        for &index in inner_steps {
            let (ptr, item_ty) = self.tuple_element_ptr(&container, index)?;
            let loaded = self.builder.load(lower_type(&item_ty), ptr.clone());
            let inner = LoweredValue::from_ir(loaded, item_ty);
            let (inner_copy, inner_copied) = self.copy_container(&inner);
            self.store_element(
                &ptr,
                inner_copy.clone(),
                &inner_copied,
                true,
                update_item_alias_count,
            )?;
            copies.push(inner_copy.clone());
            container = inner_copy;
            container_copied = inner_copied;
        }

        let new_value = self.lower_expr(value)?;
        let (ptr, _) = self.tuple_element_ptr(&container, *last)?;
        self.store_element(
            &ptr,
            new_value,
            &container_copied,
            false,
            update_item_alias_count,
        )?;

        self.scopes.increase_reference_count(&copy, false)?;
        for copy in copies.iter().rev() {
            self.scopes.decrease_reference_count(copy, true)?;
        }
        Ok(copy)
    }

    /// Store `value` into an item slot of a container that may have been copied.
    ///
    /// Counts are adjusted only on the in-place path; see the module docs.
    fn store_element(
        &mut self,
        ptr: &Value,
        value: LoweredValue,
        was_copied: &Value,
        shallow: bool,
        update_item_alias_count: bool,
    ) -> Result<()> {
        let item_ty = value.ty().clone();
        if update_item_alias_count {
            self.update_alias_count(1, &value, shallow)?;
            let old = self.load_cell(ptr, &item_ty);
            self.update_alias_count(-1, &old, shallow)?;
        }
        if has_count(&item_ty, CountKind::Reference) {
            let current = self.builder.current_block();
            let cont = self.builder.new_block_after(current, "condContinue");
            let in_place = self.builder.new_block_before(cont, "condFalse");
            self.builder
                .terminate_branch(was_copied.clone(), cont, in_place);

            self.builder.position_at(in_place);
            self.scopes.open_scope();
            self.scopes.increase_reference_count(&value, shallow)?;
            let old = self.load_cell(ptr, &item_ty);
            self.scopes.decrease_reference_count(&old, shallow)?;
            self.close_scope()?;
            self.builder.terminate_jump(cont);

            self.builder.position_at(cont);
        }
        self.builder.store(value.into_ir(), ptr.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn single_item_tuples_are_skipped() {
        let a = Name::from_raw(1);
        let b = Name::from_raw(2);
        let items = TypeItems::Tuple(vec![
            TypeItems::Named(a, Type::Int),
            TypeItems::Tuple(vec![TypeItems::Named(b, Type::Bool)]),
        ]);
        let path = items.find_named_item(b).unwrap_or_default();
        assert_eq!(path, vec![1, 0]);
        assert_eq!(normalize_path(&items, &path), vec![1]);
    }

    #[test]
    fn top_level_single_item_has_empty_path() {
        let a = Name::from_raw(1);
        let items = TypeItems::Tuple(vec![TypeItems::Named(a, Type::Int)]);
        let path = items.find_named_item(a).unwrap_or_default();
        assert_eq!(normalize_path(&items, &path), Vec::<usize>::new());
    }
}
