//! Strings and conversions to string.

use qir_ir::GlobalKind;

use super::{arg, object_arg};
use crate::heap::ObjectKind;
use crate::interpreter::Interpreter;
use crate::value::RtValue;
use crate::{EvalError, EvalResult};

impl Interpreter<'_> {
    /// Text of string argument `index`.
    pub(super) fn string_arg(&self, args: &[RtValue], index: usize) -> EvalResult<&str> {
        self.heap.string(object_arg(args, index)?)
    }

    fn new_string(&mut self, text: String) -> RtValue {
        RtValue::Object(self.heap.allocate(ObjectKind::String(text)))
    }

    /// `string_create` from a string literal global.
    pub(super) fn string_create(&mut self, args: &[RtValue]) -> EvalResult<RtValue> {
        let global = arg(args, 0)?
            .as_global()?
            .ok_or_else(|| EvalError::mismatch("string literal", &RtValue::Null))?;
        match &self.module().global(global).kind {
            GlobalKind::CString(text) => {
                let text = text.clone();
                Ok(self.new_string(text))
            }
            other => Err(EvalError::mismatch("string literal", other)),
        }
    }

    pub(super) fn string_concatenate(&mut self, args: &[RtValue]) -> EvalResult<RtValue> {
        let mut text = self.string_arg(args, 0)?.to_owned();
        text.push_str(self.string_arg(args, 1)?);
        Ok(self.new_string(text))
    }

    pub(super) fn string_equal(&self, args: &[RtValue]) -> EvalResult<RtValue> {
        Ok(RtValue::Bool(
            self.string_arg(args, 0)? == self.string_arg(args, 1)?,
        ))
    }

    /// All `*_to_string` functions: a new string rendering `value`.
    pub(super) fn render_string(&mut self, value: &RtValue) -> EvalResult<RtValue> {
        let text = match value {
            RtValue::Object(id) => self.heap.big_int(*id)?.to_string(),
            other => format_scalar(other)?,
        };
        Ok(self.new_string(text))
    }
}

/// Rendering of a non-object value, as string interpolation shows it.
fn format_scalar(value: &RtValue) -> EvalResult<String> {
    Ok(match value {
        RtValue::Bool(b) => b.to_string(),
        RtValue::Int(n) => n.to_string(),
        RtValue::Double(d) => format_double(*d),
        RtValue::Pauli(bits) => match bits & 0b11 {
            0 => "PauliI",
            1 => "PauliX",
            2 => "PauliZ",
            _ => "PauliY",
        }
        .to_owned(),
        RtValue::Result(one) => if *one { "One" } else { "Zero" }.to_owned(),
        RtValue::Range(range) => range.to_string(),
        RtValue::Qubit(qubit) => format!("q{}", qubit.raw()),
        RtValue::Undef => return Err(EvalError::UndefinedValue),
        other => return Err(EvalError::mismatch("printable value", other)),
    })
}

/// Integral doubles keep one decimal place: `3.0`, not `3`.
fn format_double(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::{QubitId, RangeValue};

    #[test]
    fn scalars_render_like_the_source_language() {
        let render = |value: RtValue| format_scalar(&value).unwrap_or_default();
        assert_eq!(render(RtValue::Double(3.0)), "3.0");
        assert_eq!(render(RtValue::Double(0.25)), "0.25");
        assert_eq!(render(RtValue::Pauli(3)), "PauliY");
        assert_eq!(render(RtValue::Result(true)), "One");
        assert_eq!(render(RtValue::Range(RangeValue::new(0, 2, 6))), "0..2..6");
        assert_eq!(render(RtValue::Qubit(QubitId::new(4))), "q4");
    }
}
