//! Functions lowered to instructions instead of calls.

use qir_ast::{QualifiedName, StringInterner, Type};
use qir_ir::{BinOp, CastOp, IrType, RuntimeFn, Value};

use crate::context::GenerationContext;
use crate::value::LoweredValue;
use crate::{GenError, Result};

/// A built-in function, recognized by its qualified name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Builtin {
    Length,
    IntAsDouble,
    DoubleAsInt,
    Truncate,
    IntAsBigInt,
    RangeStart,
    RangeStep,
    RangeEnd,
    RangeReverse,
    Message,
}

const BUILTINS: &[(&str, &str, Builtin)] = &[
    ("Microsoft.Quantum.Core", "Length", Builtin::Length),
    ("Microsoft.Quantum.Core", "RangeStart", Builtin::RangeStart),
    ("Microsoft.Quantum.Core", "RangeStep", Builtin::RangeStep),
    ("Microsoft.Quantum.Core", "RangeEnd", Builtin::RangeEnd),
    ("Microsoft.Quantum.Core", "RangeReverse", Builtin::RangeReverse),
    ("Microsoft.Quantum.Convert", "IntAsDouble", Builtin::IntAsDouble),
    ("Microsoft.Quantum.Convert", "DoubleAsInt", Builtin::DoubleAsInt),
    ("Microsoft.Quantum.Convert", "IntAsBigInt", Builtin::IntAsBigInt),
    ("Microsoft.Quantum.Math", "Truncate", Builtin::Truncate),
    ("Microsoft.Quantum.Intrinsic", "Message", Builtin::Message),
];

impl Builtin {
    pub(crate) fn lookup(interner: &StringInterner, name: QualifiedName) -> Option<Builtin> {
        let namespace = interner.lookup(name.namespace);
        let local = interner.lookup(name.name);
        BUILTINS
            .iter()
            .find(|(ns, n, _)| *ns == namespace && *n == local)
            .map(|(_, _, builtin)| *builtin)
    }
}

impl GenerationContext<'_> {
    /// Apply a built-in to its flattened arguments.
    pub(crate) fn apply_builtin(
        &mut self,
        builtin: Builtin,
        args: &[LoweredValue],
    ) -> Result<LoweredValue> {
        let [arg] = args else {
            return Err(GenError::invariant(format!(
                "{builtin:?} takes one argument, got {}",
                args.len()
            )));
        };
        let value = arg.ir().clone();
        let result = match builtin {
            Builtin::Length => LoweredValue::from_ir(
                self.builder
                    .call_runtime_value(RuntimeFn::ArrayGetSize1d, vec![value]),
                Type::Int,
            ),
            Builtin::IntAsDouble => LoweredValue::from_ir(
                self.builder.cast(CastOp::SiToFp, value, IrType::Double),
                Type::Double,
            ),
            Builtin::DoubleAsInt | Builtin::Truncate => LoweredValue::from_ir(
                self.builder.cast(CastOp::FpToSi, value, IrType::Int),
                Type::Int,
            ),
            Builtin::IntAsBigInt => {
                let raw = self
                    .builder
                    .call_runtime_value(RuntimeFn::BigIntCreateI64, vec![value]);
                let big = LoweredValue::from_ir(raw, Type::BigInt);
                self.scopes.register_value(&big, false)?;
                big
            }
            Builtin::RangeStart => self.range_component(&value, 0),
            Builtin::RangeStep => self.range_component(&value, 1),
            Builtin::RangeEnd => self.range_component(&value, 2),
            Builtin::RangeReverse => {
                // start + step * ((end - start) / step) .. -step .. start
                let (start, step, end) = self.range_parts(&value);
                let span = self.builder.binary(BinOp::Sub, end, start.clone());
                let steps = self.builder.binary(BinOp::SDiv, span, step.clone());
                let distance = self.builder.binary(BinOp::Mul, step.clone(), steps);
                let new_start = self.builder.binary(BinOp::Add, start.clone(), distance);
                let new_step = self.builder.binary(BinOp::Sub, Value::int(0), step);
                self.build_range(new_start, new_step, start)
            }
            Builtin::Message => {
                self.builder.call_runtime(RuntimeFn::Message, vec![value]);
                LoweredValue::unit()
            }
        };
        Ok(result)
    }

    fn range_component(&mut self, range: &Value, index: u32) -> LoweredValue {
        LoweredValue::from_ir(self.builder.extract_value(range.clone(), index), Type::Int)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builtins_are_found_by_qualified_name() {
        let interner = StringInterner::new();
        let length = QualifiedName::new(
            interner.intern("Microsoft.Quantum.Core"),
            interner.intern("Length"),
        );
        assert_eq!(Builtin::lookup(&interner, length), Some(Builtin::Length));

        let other = QualifiedName::new(interner.intern("My.Code"), interner.intern("Length"));
        assert_eq!(Builtin::lookup(&interner, other), None);
    }
}
