//! Callable values: creation, invocation, functors, and capture counts.
//!
//! A callable points at a four-entry table of `(capture, args, result)`
//! entry points indexed body, adjoint, controlled, controlled adjoint. The
//! applied functors select the entry. Applying `Controlled` more than once
//! nests the control registers in the argument tuple; invocation merges
//! them into a single register before calling the controlled entry.

use qir_ir::{FuncId, GlobalId, GlobalKind};

use super::{arg, object_arg, Count};
use crate::heap::{CallableObject, ObjectKind};
use crate::interpreter::Interpreter;
use crate::value::{ObjectId, RtValue};
use crate::{EvalError, EvalResult};

const SPECIALIZATIONS: [&str; 4] = ["body", "adjoint", "controlled", "controlled adjoint"];

impl Interpreter<'_> {
    pub(super) fn callable_create(&mut self, args: &[RtValue]) -> EvalResult<RtValue> {
        let table = arg(args, 0)?
            .as_global()?
            .ok_or_else(|| EvalError::mismatch("function table", &RtValue::Null))?;
        let memory = arg(args, 1)?.as_global()?;
        let capture = arg(args, 2)?.as_object()?;
        let callable = CallableObject {
            table,
            memory,
            capture,
            adjoint: false,
            controlled: 0,
        };
        Ok(RtValue::Object(
            self.heap.allocate(ObjectKind::Callable(callable)),
        ))
    }

    pub(super) fn callable_invoke(&mut self, args: &[RtValue]) -> EvalResult<()> {
        let callable = self.heap.callable(object_arg(args, 0)?)?.clone();
        let slot = usize::from(callable.adjoint) + 2 * usize::from(callable.controlled > 0);
        let entry = self.table_entry(callable.table, slot)?;

        let mut arg_tuple = arg(args, 1)?.clone();
        let mut temporaries = Vec::new();
        for _ in 1..callable.controlled {
            arg_tuple = self.merge_controls(&arg_tuple, &mut temporaries)?;
        }

        let capture = callable.capture.map_or(RtValue::Null, RtValue::Object);
        let result = arg(args, 2)?.clone();
        self.call_function(entry, vec![capture, arg_tuple, result])?;

        for temporary in temporaries {
            self.heap.update_reference_count(temporary, -1)?;
        }
        Ok(())
    }

    fn table_entry(&self, table: GlobalId, slot: usize) -> EvalResult<FuncId> {
        match &self.module().global(table).kind {
            GlobalKind::FunctionTable(entries) => {
                entries
                    .get(slot)
                    .copied()
                    .flatten()
                    .ok_or(EvalError::UnsupportedSpecialization {
                        kind: SPECIALIZATIONS[slot % 4],
                    })
            }
            other => Err(EvalError::mismatch("function table", other)),
        }
    }

    /// `(outer, (inner, args))` becomes `(outer ++ inner, args)`.
    ///
    /// The new array and tuple are pushed onto `temporaries`; their items
    /// are borrowed from the original argument tuple.
    fn merge_controls(
        &mut self,
        args: &RtValue,
        temporaries: &mut Vec<ObjectId>,
    ) -> EvalResult<RtValue> {
        let outer = pair(self.heap.tuple(object_id(args)?)?)?;
        let inner = pair(self.heap.tuple(object_id(&outer.1)?)?)?;

        let mut controls = self.heap.array(object_id(&outer.0)?)?.to_vec();
        controls.extend_from_slice(self.heap.array(object_id(&inner.0)?)?);
        let controls = self.heap.allocate(ObjectKind::Array(controls));
        let merged = self
            .heap
            .allocate(ObjectKind::Tuple(vec![RtValue::Object(controls), inner.1]));
        temporaries.push(controls);
        temporaries.push(merged);
        Ok(RtValue::Object(merged))
    }

    pub(super) fn callable_copy(&mut self, args: &[RtValue]) -> EvalResult<RtValue> {
        let Some(id) = arg(args, 0)?.as_object()? else {
            return Ok(RtValue::Null);
        };
        let force = arg(args, 1)?.as_bool()?;
        let callable = self.heap.callable(id)?.clone();
        let result = if !force && self.heap.alias_count(id)? == 0 {
            self.heap.update_reference_count(id, 1)?;
            id
        } else {
            self.heap
                .allocate_copy(ObjectKind::Callable(callable.clone()))
        };
        // The result holds its own reference to the capture.
        self.change_capture_count(&callable, Count::Reference, 1)?;
        Ok(RtValue::Object(result))
    }

    pub(super) fn update_capture_count(
        &mut self,
        args: &[RtValue],
        count: Count,
    ) -> EvalResult<Option<RtValue>> {
        let Some(id) = arg(args, 0)?.as_object()? else {
            return Ok(None);
        };
        let change = arg(args, 1)?.as_i32()?;
        let callable = self.heap.callable(id)?.clone();
        self.change_capture_count(&callable, count, change)?;
        Ok(None)
    }

    /// Run the memory table function of `count` on the capture.
    fn change_capture_count(
        &mut self,
        callable: &CallableObject,
        count: Count,
        change: i32,
    ) -> EvalResult<()> {
        let (Some(memory), Some(capture)) = (callable.memory, callable.capture) else {
            return Ok(());
        };
        let slot = match count {
            Count::Reference => 0,
            Count::Alias => 1,
        };
        let function = match &self.module().global(memory).kind {
            GlobalKind::MemoryTable(entries) => entries[slot],
            other => return Err(EvalError::mismatch("memory table", other)),
        };
        if let Some(function) = function {
            self.call_function(function, vec![RtValue::Object(capture), RtValue::I32(change)])?;
        }
        Ok(())
    }
}

fn object_id(value: &RtValue) -> EvalResult<ObjectId> {
    value
        .as_object()?
        .ok_or_else(|| EvalError::mismatch("non-null object", &RtValue::Null))
}

fn pair(items: &[RtValue]) -> EvalResult<(RtValue, RtValue)> {
    match items {
        [first, second] => Ok((first.clone(), second.clone())),
        other => Err(EvalError::mismatch("pair", &other)),
    }
}
