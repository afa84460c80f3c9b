//! Reference-counted object store and qubit registry.
//!
//! Every runtime-managed value (array, tuple, string, big integer, callable)
//! lives here behind an [`ObjectId`] with a reference count and an alias
//! count. Objects start with one reference and no aliases. When the
//! reference count reaches zero the object is freed; its slot is kept so
//! that later uses are reported instead of silently reading stale data.
//!
//! Freeing never cascades: the generated code releases items itself
//! before it releases their container.

use num_bigint::BigInt;
use qir_ir::GlobalId;

use crate::value::{ObjectId, QubitId, RtValue};
use crate::{EvalError, EvalResult};

// ── Objects ─────────────────────────────────────────────────────────

/// A callable value: table pointers, capture, and applied functors.
#[derive(Clone, Debug, PartialEq)]
pub struct CallableObject {
    pub table: GlobalId,
    pub memory: Option<GlobalId>,
    pub capture: Option<ObjectId>,
    pub adjoint: bool,
    pub controlled: u32,
}

/// Payload of a live object.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Array(Vec<RtValue>),
    /// Payload items, header excluded.
    Tuple(Vec<RtValue>),
    String(String),
    BigInt(BigInt),
    Callable(CallableObject),
}

impl ObjectKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjectKind::Array(_) => "array",
            ObjectKind::Tuple(_) => "tuple",
            ObjectKind::String(_) => "string",
            ObjectKind::BigInt(_) => "big integer",
            ObjectKind::Callable(_) => "callable",
        }
    }
}

#[derive(Debug)]
struct Slot {
    /// `None` once freed.
    kind: Option<ObjectKind>,
    ref_count: i64,
    alias_count: i64,
}

/// Allocation counters of a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects created, copies included.
    pub allocations: usize,
    /// Objects created by `array_copy`, `tuple_copy`, or `callable_copy`.
    pub copies: usize,
    /// Objects not yet freed.
    pub live_objects: usize,
    pub qubits_allocated: usize,
    pub qubits_released: usize,
    /// Qubits not yet released.
    pub live_qubits: usize,
}

// ── Heap ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    /// Liveness of every qubit ever allocated, indexed by [`QubitId`].
    qubits: Vec<bool>,
    copies: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new object with one reference.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "object count never exceeds u32"
    )]
    pub fn allocate(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId::new(self.slots.len() as u32);
        tracing::trace!(object = id.raw(), kind = kind.kind_name(), "allocate");
        self.slots.push(Slot {
            kind: Some(kind),
            ref_count: 1,
            alias_count: 0,
        });
        id
    }

    /// Store a new object created as a copy of another.
    pub fn allocate_copy(&mut self, kind: ObjectKind) -> ObjectId {
        self.copies += 1;
        self.allocate(kind)
    }

    fn slot(&self, id: ObjectId) -> EvalResult<&Slot> {
        match self.slots.get(id.index()) {
            Some(slot) if slot.kind.is_some() => Ok(slot),
            _ => Err(EvalError::UseAfterRelease { object: id.raw() }),
        }
    }

    fn slot_mut(&mut self, id: ObjectId) -> EvalResult<&mut Slot> {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.kind.is_some() => Ok(slot),
            _ => Err(EvalError::UseAfterRelease { object: id.raw() }),
        }
    }

    pub fn get(&self, id: ObjectId) -> EvalResult<&ObjectKind> {
        self.slot(id)?
            .kind
            .as_ref()
            .ok_or(EvalError::UseAfterRelease { object: id.raw() })
    }

    pub fn get_mut(&mut self, id: ObjectId) -> EvalResult<&mut ObjectKind> {
        self.slot_mut(id)?
            .kind
            .as_mut()
            .ok_or(EvalError::UseAfterRelease { object: id.raw() })
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.slot(id).is_ok()
    }

    pub fn ref_count(&self, id: ObjectId) -> EvalResult<i64> {
        Ok(self.slot(id)?.ref_count)
    }

    pub fn alias_count(&self, id: ObjectId) -> EvalResult<i64> {
        Ok(self.slot(id)?.alias_count)
    }

    /// Change the reference count, freeing the object when it reaches zero.
    pub fn update_reference_count(&mut self, id: ObjectId, change: i64) -> EvalResult<()> {
        let slot = self.slot_mut(id)?;
        let value = slot.ref_count + change;
        if value < 0 {
            return Err(EvalError::NegativeCount {
                object: id.raw(),
                count: "reference",
                value,
            });
        }
        slot.ref_count = value;
        if value == 0 {
            tracing::trace!(object = id.raw(), "free");
            slot.kind = None;
        }
        Ok(())
    }

    pub fn update_alias_count(&mut self, id: ObjectId, change: i64) -> EvalResult<()> {
        let slot = self.slot_mut(id)?;
        let value = slot.alias_count + change;
        if value < 0 {
            return Err(EvalError::NegativeCount {
                object: id.raw(),
                count: "alias",
                value,
            });
        }
        slot.alias_count = value;
        Ok(())
    }

    // ── Typed access ───────────────────────────────────────────

    pub fn array(&self, id: ObjectId) -> EvalResult<&[RtValue]> {
        match self.get(id)? {
            ObjectKind::Array(items) => Ok(items),
            other => Err(EvalError::mismatch("array", &other.kind_name())),
        }
    }

    pub fn array_mut(&mut self, id: ObjectId) -> EvalResult<&mut Vec<RtValue>> {
        match self.get_mut(id)? {
            ObjectKind::Array(items) => Ok(items),
            other => Err(EvalError::mismatch("array", &other.kind_name())),
        }
    }

    pub fn tuple(&self, id: ObjectId) -> EvalResult<&[RtValue]> {
        match self.get(id)? {
            ObjectKind::Tuple(items) => Ok(items),
            other => Err(EvalError::mismatch("tuple", &other.kind_name())),
        }
    }

    pub fn tuple_mut(&mut self, id: ObjectId) -> EvalResult<&mut Vec<RtValue>> {
        match self.get_mut(id)? {
            ObjectKind::Tuple(items) => Ok(items),
            other => Err(EvalError::mismatch("tuple", &other.kind_name())),
        }
    }

    pub fn string(&self, id: ObjectId) -> EvalResult<&str> {
        match self.get(id)? {
            ObjectKind::String(text) => Ok(text),
            other => Err(EvalError::mismatch("string", &other.kind_name())),
        }
    }

    pub fn big_int(&self, id: ObjectId) -> EvalResult<&BigInt> {
        match self.get(id)? {
            ObjectKind::BigInt(value) => Ok(value),
            other => Err(EvalError::mismatch("big integer", &other.kind_name())),
        }
    }

    pub fn callable(&self, id: ObjectId) -> EvalResult<&CallableObject> {
        match self.get(id)? {
            ObjectKind::Callable(callable) => Ok(callable),
            other => Err(EvalError::mismatch("callable", &other.kind_name())),
        }
    }

    pub fn callable_mut(&mut self, id: ObjectId) -> EvalResult<&mut CallableObject> {
        match self.get_mut(id)? {
            ObjectKind::Callable(callable) => Ok(callable),
            other => Err(EvalError::mismatch("callable", &other.kind_name())),
        }
    }

    // ── Qubits ─────────────────────────────────────────────────

    #[expect(
        clippy::cast_possible_truncation,
        reason = "qubit count never exceeds u32"
    )]
    pub fn allocate_qubit(&mut self) -> QubitId {
        let id = QubitId::new(self.qubits.len() as u32);
        self.qubits.push(true);
        id
    }

    /// Fail unless `qubit` is allocated and not yet released.
    pub fn check_qubit(&self, qubit: QubitId) -> EvalResult<()> {
        match self.qubits.get(qubit.raw() as usize) {
            Some(true) => Ok(()),
            _ => Err(EvalError::ReleasedQubitInUse { qubit: qubit.raw() }),
        }
    }

    pub fn release_qubit(&mut self, qubit: QubitId) -> EvalResult<()> {
        self.check_qubit(qubit)?;
        self.qubits[qubit.raw() as usize] = false;
        Ok(())
    }

    // ── Statistics ─────────────────────────────────────────────

    /// Objects not yet freed, in allocation order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "object count never exceeds u32"
    )]
    pub fn live_objects(&self) -> Vec<ObjectId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.kind.is_some())
            .map(|(index, _)| ObjectId::new(index as u32))
            .collect()
    }

    pub fn stats(&self) -> HeapStats {
        let live_qubits = self.qubits.iter().filter(|live| **live).count();
        HeapStats {
            allocations: self.slots.len(),
            copies: self.copies,
            live_objects: self.slots.iter().filter(|slot| slot.kind.is_some()).count(),
            qubits_allocated: self.qubits.len(),
            qubits_released: self.qubits.len() - live_qubits,
            live_qubits,
        }
    }
}
