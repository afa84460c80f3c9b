//! Shared helpers for building programs in tests.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use qir_ast::{
    Block, Callable, CallableAttrs, CallableKind, Functors, Name, Namespace, NamespaceElement,
    Param, Program, QualifiedName, SpecImpl, SpecKind, Specialization, Span, Stmt,
    StringInterner, Type, TypeItems, UdtDecl,
};
use qir_ir::{Callee, Function, Instr, Module, RuntimeFn};

use crate::{generate, GenConfig};

/// A single-namespace program under construction.
pub(crate) struct Fixture {
    pub(crate) interner: StringInterner,
    namespace: Name,
    elements: Vec<NamespaceElement>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let interner = StringInterner::new();
        let namespace = interner.intern("Test");
        Fixture {
            interner,
            namespace,
            elements: Vec::new(),
        }
    }

    pub(crate) fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub(crate) fn qualified(&self, text: &str) -> QualifiedName {
        QualifiedName::new(self.namespace, self.name(text))
    }

    /// Add a callable whose specializations are given explicitly.
    #[expect(clippy::too_many_arguments, reason = "mirrors the callable's fields")]
    pub(crate) fn callable(
        &mut self,
        name: &str,
        kind: CallableKind,
        params: Vec<Param>,
        output: Type,
        functors: Functors,
        attrs: CallableAttrs,
        specializations: Vec<Specialization>,
    ) -> QualifiedName {
        let name = self.qualified(name);
        let input = Type::tuple_of(params.iter().map(Param::ty).collect());
        self.elements.push(NamespaceElement::Callable(Callable {
            name,
            kind,
            input,
            output,
            functors,
            params,
            attrs,
            specializations,
            span: Span::DUMMY,
        }));
        name
    }

    /// Add a function with a provided body.
    pub(crate) fn function(
        &mut self,
        name: &str,
        params: Vec<Param>,
        output: Type,
        body: Vec<Stmt>,
    ) -> QualifiedName {
        self.callable(
            name,
            CallableKind::Function,
            params,
            output,
            Functors::empty(),
            CallableAttrs::default(),
            vec![provided(SpecKind::Body, body)],
        )
    }

    /// Add an intrinsic operation with every specialization its functors allow.
    pub(crate) fn intrinsic_operation(
        &mut self,
        name: &str,
        params: Vec<Param>,
        output: Type,
        functors: Functors,
    ) -> QualifiedName {
        let specializations = SpecKind::ALL
            .into_iter()
            .filter(|kind| functors.contains(kind.required_functors()))
            .map(|kind| Specialization {
                kind,
                implementation: SpecImpl::Intrinsic,
            })
            .collect();
        self.callable(
            name,
            CallableKind::Operation,
            params,
            output,
            functors,
            CallableAttrs::default(),
            specializations,
        )
    }

    pub(crate) fn udt(&mut self, name: &str, items: TypeItems) -> QualifiedName {
        let name = self.qualified(name);
        self.elements.push(NamespaceElement::Type(UdtDecl {
            name,
            items,
            span: Span::DUMMY,
        }));
        name
    }

    pub(crate) fn program(&self) -> Program {
        Program {
            namespaces: vec![Namespace {
                name: self.namespace,
                elements: self.elements.clone(),
            }],
        }
    }

    pub(crate) fn generate(&self) -> Module {
        self.generate_with(&GenConfig::default())
    }

    pub(crate) fn generate_with(&self, config: &GenConfig) -> Module {
        generate(&self.program(), &self.interner, config).unwrap()
    }
}

pub(crate) fn provided(kind: SpecKind, body: Vec<Stmt>) -> Specialization {
    Specialization {
        kind,
        implementation: SpecImpl::Provided {
            controls: None,
            body: Block::new(body),
        },
    }
}

pub(crate) fn function<'m>(module: &'m Module, name: &str) -> &'m Function {
    module
        .function_named(name)
        .unwrap_or_else(|| panic!("no function named {name}"))
}

/// Runtime functions called by a function, in emission order.
pub(crate) fn runtime_calls(module: &Module, name: &str) -> Vec<RuntimeFn> {
    function(module, name)
        .body
        .as_ref()
        .unwrap()
        .instrs()
        .filter_map(|instr| match instr {
            Instr::Call {
                callee: Callee::Runtime(runtime),
                ..
            } => Some(*runtime),
            _ => None,
        })
        .collect()
}

/// Names of the module functions called by a function, in emission order.
pub(crate) fn direct_calls(module: &Module, name: &str) -> Vec<String> {
    function(module, name)
        .body
        .as_ref()
        .unwrap()
        .instrs()
        .filter_map(|instr| match instr {
            Instr::Call {
                callee: Callee::Function(id),
                ..
            } => Some(module.function(*id).name.clone()),
            _ => None,
        })
        .collect()
}

/// Block labels of a function in layout order.
pub(crate) fn block_names(module: &Module, name: &str) -> Vec<String> {
    function(module, name)
        .body
        .as_ref()
        .unwrap()
        .blocks_in_order()
        .map(|block| block.name.clone())
        .collect()
}
