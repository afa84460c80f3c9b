//! Runtime values.

use std::fmt;

use qir_ir::GlobalId;

use crate::{EvalError, EvalResult};

/// Handle of a heap object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of an allocated qubit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(u32);

impl QubitId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// `start..step..end`, both ends inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct RangeValue {
    pub start: i64,
    pub step: i64,
    pub end: i64,
}

impl RangeValue {
    pub const fn new(start: i64, step: i64, end: i64) -> Self {
        RangeValue { start, step, end }
    }

    /// Values of the range in iteration order.
    pub fn values(self) -> impl Iterator<Item = i64> {
        let RangeValue { start, step, end } = self;
        let mut next = Some(start);
        std::iter::from_fn(move || {
            let current = next?;
            let inside = match step.signum() {
                1 => current <= end,
                -1 => current >= end,
                _ => false,
            };
            if !inside {
                next = None;
                return None;
            }
            next = current.checked_add(step);
            Some(current)
        })
    }

    pub(crate) fn component(self, index: u32) -> EvalResult<i64> {
        match index {
            0 => Ok(self.start),
            1 => Ok(self.step),
            2 => Ok(self.end),
            _ => Err(EvalError::mismatch("range component", &index)),
        }
    }

    pub(crate) fn with_component(mut self, index: u32, value: i64) -> EvalResult<Self> {
        match index {
            0 => self.start = value,
            1 => self.step = value,
            2 => self.end = value,
            _ => return Err(EvalError::mismatch("range component", &index)),
        }
        Ok(self)
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.step == 1 {
            write!(f, "{}..{}", self.start, self.end)
        } else {
            write!(f, "{}..{}..{}", self.start, self.step, self.end)
        }
    }
}

/// Memory location a pointer refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// Stack slot created by `alloca`.
    Cell(usize),
    /// Payload item of a tuple.
    TupleItem(ObjectId, usize),
    /// Item of an array.
    ArrayItem(ObjectId, usize),
}

/// A value held in a variable or a memory location.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum RtValue {
    /// Not yet written.
    #[default]
    Undef,
    /// Null pointer of any pointer type.
    Null,
    Bool(bool),
    I32(i32),
    Int(i64),
    Double(f64),
    /// Two-bit Pauli encoding: I=0, X=1, Z=2, Y=3.
    Pauli(u8),
    /// `true` for One.
    Result(bool),
    Range(RangeValue),
    /// Array, tuple, string, big integer, or callable.
    Object(ObjectId),
    Qubit(QubitId),
    Ptr(Location),
    /// Address of a module global.
    Global(GlobalId),
}

impl RtValue {
    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            RtValue::Bool(b) => Ok(*b),
            other => Err(expected("Bool", other)),
        }
    }

    pub fn as_int(&self) -> EvalResult<i64> {
        match self {
            RtValue::Int(n) => Ok(*n),
            other => Err(expected("Int", other)),
        }
    }

    pub fn as_i32(&self) -> EvalResult<i32> {
        match self {
            RtValue::I32(n) => Ok(*n),
            other => Err(expected("i32", other)),
        }
    }

    pub fn as_double(&self) -> EvalResult<f64> {
        match self {
            RtValue::Double(d) => Ok(*d),
            other => Err(expected("Double", other)),
        }
    }

    pub fn as_range(&self) -> EvalResult<RangeValue> {
        match self {
            RtValue::Range(range) => Ok(*range),
            other => Err(expected("Range", other)),
        }
    }

    /// The object handle; `None` for null.
    pub fn as_object(&self) -> EvalResult<Option<ObjectId>> {
        match self {
            RtValue::Object(id) => Ok(Some(*id)),
            RtValue::Null => Ok(None),
            other => Err(expected("object", other)),
        }
    }

    pub fn as_qubit(&self) -> EvalResult<QubitId> {
        match self {
            RtValue::Qubit(id) => Ok(*id),
            other => Err(expected("Qubit", other)),
        }
    }

    pub fn as_ptr(&self) -> EvalResult<Location> {
        match self {
            RtValue::Ptr(location) => Ok(*location),
            other => Err(expected("pointer", other)),
        }
    }

    /// The global address; `None` for null.
    pub fn as_global(&self) -> EvalResult<Option<GlobalId>> {
        match self {
            RtValue::Global(id) => Ok(Some(*id)),
            RtValue::Null => Ok(None),
            other => Err(expected("global address", other)),
        }
    }
}

fn expected(what: &'static str, found: &RtValue) -> EvalError {
    match found {
        RtValue::Undef => EvalError::UndefinedValue,
        other => EvalError::mismatch(what, other),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn ranges_iterate_in_both_directions() {
        let up: Vec<i64> = RangeValue::new(1, 2, 6).values().collect();
        assert_eq!(up, [1, 3, 5]);
        let down: Vec<i64> = RangeValue::new(3, -1, 1).values().collect();
        assert_eq!(down, [3, 2, 1]);
        assert_eq!(RangeValue::new(0, 1, -1).values().count(), 0);
    }

    #[test]
    fn ranges_print_their_step_only_when_needed() {
        assert_eq!(RangeValue::new(0, 1, 4).to_string(), "0..4");
        assert_eq!(RangeValue::new(4, -2, 0).to_string(), "4..-2..0");
    }

    #[test]
    fn undefined_values_are_reported_as_such() {
        assert_eq!(RtValue::Undef.as_int(), Err(EvalError::UndefinedValue));
        assert!(matches!(
            RtValue::Bool(true).as_int(),
            Err(EvalError::TypeMismatch { expected: "Int", .. })
        ));
    }
}
