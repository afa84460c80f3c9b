//! Symbol names of generated functions and globals.
//!
//! A callable `Microsoft.Quantum.Intrinsic.H` becomes the base name
//! `Microsoft__Quantum__Intrinsic__H`; its specializations append
//! `__body`, `__adj`, `__ctl`, or `__ctladj`.

use qir_ast::{QualifiedName, SpecKind, StringInterner};
use qir_ir::TARGET_PREFIX;

/// Base symbol name of a global callable: namespace and name joined by `__`.
pub(crate) fn callable_base_name(interner: &StringInterner, name: QualifiedName) -> String {
    let namespace = interner.lookup(name.namespace).replace('.', "__");
    let local = interner.lookup(name.name);
    if namespace.is_empty() {
        local.to_owned()
    } else {
        format!("{namespace}__{local}")
    }
}

/// Symbol of the function implementing one specialization.
pub(crate) fn specialization_name(base: &str, kind: SpecKind) -> String {
    format!("{base}__{}", kind.suffix())
}

/// Symbol of the `(capture, args, result)` entry point wrapping a function.
pub(crate) fn wrapper_name(function: &str) -> String {
    format!("{function}__wrapper")
}

/// Symbol of the four-entry table of a callable or partial application.
pub(crate) fn table_name(base: &str) -> String {
    format!("{base}__FunctionTable")
}

/// Symbol of a target instruction.
pub(crate) fn target_instruction_name(instruction: &str) -> String {
    format!("{TARGET_PREFIX}{instruction}__body")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn namespaces_are_flattened() {
        let interner = StringInterner::new();
        let name = QualifiedName::new(
            interner.intern("Microsoft.Quantum.Intrinsic"),
            interner.intern("H"),
        );
        let base = callable_base_name(&interner, name);
        assert_eq!(base, "Microsoft__Quantum__Intrinsic__H");
        assert_eq!(
            specialization_name(&base, SpecKind::ControlledAdjoint),
            "Microsoft__Quantum__Intrinsic__H__ctladj"
        );
        assert_eq!(
            wrapper_name(&specialization_name(&base, SpecKind::Body)),
            "Microsoft__Quantum__Intrinsic__H__body__wrapper"
        );
        assert_eq!(table_name(&base), "Microsoft__Quantum__Intrinsic__H__FunctionTable");
    }

    #[test]
    fn target_instructions_are_prefixed() {
        assert_eq!(target_instruction_name("h"), "__quantum__qis__h__body");
    }
}
