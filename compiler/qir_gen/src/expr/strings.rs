//! String literals and interpolation.
//!
//! A template such as `"{0} and {1}"` is split into text pieces and item
//! references. Every piece is turned into a fresh string, and the pieces
//! are folded left to right with `string_concatenate`. An item is
//! evaluated where the template refers to it. After each step
//! both inputs are released, so only the final string survives.

use qir_ast::{Span, Type, TypedExpr};
use qir_ir::{IrType, RuntimeFn, Value};

use crate::context::GenerationContext;
use crate::error::UnsupportedKind;
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// Piece of an interpolation template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Piece {
    Text(String),
    Item(usize),
}

/// Split a template into pieces.
///
/// `\{` is a literal brace; the usual escapes are resolved and any other
/// escape is kept as written. `{n}` must be closed and refer to one of
/// the `item_count` items.
pub(crate) fn parse_template(template: &str, item_count: usize) -> Option<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('{') => text.push('{'),
                Some('\\') => text.push('\\'),
                Some('"') => text.push('"'),
                Some('n') => text.push('\n'),
                Some('r') => text.push('\r'),
                Some('t') => text.push('\t'),
                Some(other) => {
                    text.push('\\');
                    text.push(other);
                }
                None => text.push('\\'),
            },
            '{' => {
                let mut digits = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        d => digits.push(d),
                    }
                }
                let index: usize = digits.trim().parse().ok()?;
                if index >= item_count {
                    return None;
                }
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Item(index));
            }
            c => text.push(c),
        }
    }
    if !text.is_empty() || pieces.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Some(pieces)
}

impl GenerationContext<'_> {
    /// Fresh, unregistered string with the given content.
    pub(crate) fn create_string(&mut self, text: &str) -> LoweredValue {
        let bytes = if text.is_empty() {
            Value::null(IrType::Bytes)
        } else {
            self.string_constant(text)
        };
        let raw = self
            .builder
            .call_runtime_value(RuntimeFn::StringCreate, vec![bytes]);
        LoweredValue::from_ir(raw, Type::String)
    }

    pub(super) fn lower_interpolated(
        &mut self,
        template: &str,
        items: &[TypedExpr],
        span: Span,
    ) -> Result<LoweredValue> {
        let pieces = parse_template(template, items.len())
            .ok_or_else(|| GenError::unsupported(UnsupportedKind::MalformedTemplate, span))?;

        let mut result: Option<LoweredValue> = None;
        for piece in &pieces {
            let next = match piece {
                Piece::Text(text) => self.create_string(text),
                Piece::Item(index) => {
                    let value = self.lower_expr(&items[*index])?;
                    self.value_to_string(&value)?
                }
            };
            result = Some(match result {
                None => next,
                Some(acc) => {
                    let raw = self.builder.call_runtime_value(
                        RuntimeFn::StringConcatenate,
                        vec![acc.ir().clone(), next.ir().clone()],
                    );
                    self.update_reference_count(-1, &acc, true)?;
                    self.update_reference_count(-1, &next, true)?;
                    LoweredValue::from_ir(raw, Type::String)
                }
            });
        }
        let result = match result {
            Some(result) => result,
            None => self.create_string(""),
        };
        self.scopes.register_value(&result, false)?;
        Ok(result)
    }

    /// String representation of a value; the caller owns one reference to it.
    fn value_to_string(&mut self, value: &LoweredValue) -> Result<LoweredValue> {
        let convert = match value.ty() {
            Type::String => {
                self.update_reference_count(1, value, true)?;
                return Ok(value.clone());
            }
            Type::Int => RuntimeFn::IntToString,
            Type::BigInt => RuntimeFn::BigIntToString,
            Type::Double => RuntimeFn::DoubleToString,
            Type::Bool => RuntimeFn::BoolToString,
            Type::Pauli => RuntimeFn::PauliToString,
            Type::Result => RuntimeFn::ResultToString,
            Type::Qubit => RuntimeFn::QubitToString,
            Type::Range => RuntimeFn::RangeToString,
            Type::Unit => return Ok(self.create_string("()")),
            Type::Array(_) => return Ok(self.create_string("[...]")),
            Type::Tuple(_) => return Ok(self.create_string("(...)")),
            Type::Function { .. } => return Ok(self.create_string("<function>")),
            Type::Operation { .. } => return Ok(self.create_string("<operation>")),
            Type::Udt(name) => {
                let text = format!("{}(...)", self.interner.lookup(name.name));
                return Ok(self.create_string(&text));
            }
        };
        let raw = self
            .builder
            .call_runtime_value(convert, vec![value.ir().clone()]);
        Ok(LoweredValue::from_ir(raw, Type::String))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn text(s: &str) -> Piece {
        Piece::Text(s.to_owned())
    }

    #[test]
    fn placeholders_split_the_template() {
        assert_eq!(
            parse_template("{0} and {1}", 2),
            Some(vec![Piece::Item(0), text(" and "), Piece::Item(1)])
        );
    }

    #[test]
    fn escaped_braces_are_text() {
        assert_eq!(
            parse_template(r"\{0} is {0}", 1),
            Some(vec![text("{0} is "), Piece::Item(0)])
        );
        assert_eq!(parse_template(r"a\tb\q", 0), Some(vec![text("a\tb\\q")]));
    }

    #[test]
    fn empty_template_is_one_empty_piece() {
        assert_eq!(parse_template("", 0), Some(vec![text("")]));
    }

    #[test]
    fn malformed_placeholders_are_rejected() {
        assert_eq!(parse_template("{0", 1), None);
        assert_eq!(parse_template("{x}", 1), None);
        assert_eq!(parse_template("{1}", 1), None);
    }
}
