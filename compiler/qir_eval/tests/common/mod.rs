//! Programs built in memory, generated, and run.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]
#![allow(dead_code, reason = "each test target uses a subset")]

use qir_ast::{
    Block, Callable, CallableAttrs, CallableKind, Functors, Name, Namespace, NamespaceElement,
    Param, Program, QualifiedName, SpecImpl, SpecKind, Specialization, Span, Stmt,
    StringInterner, Type, TypeItems, UdtDecl,
};
use qir_eval::{EvalConfig, Interpreter, RtValue};
use qir_ir::{Callee, Instr, Module};

/// A single-namespace program under construction.
pub struct Fixture {
    pub interner: StringInterner,
    namespace: Name,
    elements: Vec<NamespaceElement>,
}

impl Fixture {
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let namespace = interner.intern("Test");
        Fixture {
            interner,
            namespace,
            elements: Vec::new(),
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn qualified(&self, text: &str) -> QualifiedName {
        QualifiedName::new(self.namespace, self.name(text))
    }

    /// Name in another namespace, such as a built-in.
    pub fn qualified_in(&self, namespace: &str, text: &str) -> QualifiedName {
        QualifiedName::new(self.name(namespace), self.name(text))
    }

    #[expect(clippy::too_many_arguments, reason = "mirrors the callable's fields")]
    fn callable(
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

    pub fn function(
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
            vec![provided(body)],
        )
    }

    /// Function whose body is substituted at its call sites.
    pub fn inline_function(
        &mut self,
        name: &str,
        params: Vec<Param>,
        output: Type,
        body: Vec<Stmt>,
    ) -> QualifiedName {
        let attrs = CallableAttrs {
            inline: true,
            ..CallableAttrs::default()
        };
        self.callable(
            name,
            CallableKind::Function,
            params,
            output,
            Functors::empty(),
            attrs,
            vec![provided(body)],
        )
    }

    pub fn operation(
        &mut self,
        name: &str,
        params: Vec<Param>,
        output: Type,
        body: Vec<Stmt>,
    ) -> QualifiedName {
        self.callable(
            name,
            CallableKind::Operation,
            params,
            output,
            Functors::empty(),
            CallableAttrs::default(),
            vec![provided(body)],
        )
    }

    /// Intrinsic operation with every specialization its functors allow.
    pub fn intrinsic(
        &mut self,
        name: &str,
        params: Vec<Param>,
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
            Type::Unit,
            functors,
            CallableAttrs::default(),
            specializations,
        )
    }

    /// Operation lowered to a call of the target instruction `instruction`.
    pub fn instruction(&mut self, name: &str, params: Vec<Param>, instruction: &str) -> QualifiedName {
        let attrs = CallableAttrs {
            target_instruction: Some(instruction.to_owned()),
            ..CallableAttrs::default()
        };
        self.callable(
            name,
            CallableKind::Operation,
            params,
            Type::Unit,
            Functors::empty(),
            attrs,
            vec![Specialization {
                kind: SpecKind::Body,
                implementation: SpecImpl::Intrinsic,
            }],
        )
    }

    pub fn udt(&mut self, name: &str, items: TypeItems) -> QualifiedName {
        let name = self.qualified(name);
        self.elements.push(NamespaceElement::Type(UdtDecl {
            name,
            items,
            span: Span::DUMMY,
        }));
        name
    }

    fn program(&self) -> Program {
        Program {
            namespaces: vec![Namespace {
                name: self.namespace,
                elements: self.elements.clone(),
            }],
        }
    }

    pub fn generate(&self) -> Module {
        self.generate_with(&qir_gen::GenConfig::default())
    }

    pub fn generate_with(&self, config: &qir_gen::GenConfig) -> Module {
        qir_gen::generate(&self.program(), &self.interner, config).unwrap()
    }
}

fn provided(body: Vec<Stmt>) -> Specialization {
    Specialization {
        kind: SpecKind::Body,
        implementation: SpecImpl::Provided {
            controls: None,
            body: Block::new(body),
        },
    }
}

pub fn interpreter(module: &Module) -> Interpreter<'_> {
    Interpreter::new(module, EvalConfig::default())
}

/// Run the body of `Test.<name>` to completion.
pub fn run(interpreter: &mut Interpreter<'_>, name: &str, args: Vec<RtValue>) -> Option<RtValue> {
    interpreter
        .call(&format!("Test__{name}__body"), args)
        .unwrap()
}

/// Names of the module functions `caller` calls directly.
pub fn direct_calls(module: &Module, caller: &str) -> Vec<String> {
    module
        .function_named(caller)
        .unwrap()
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

/// Text of a returned string.
pub fn text(interpreter: &Interpreter<'_>, value: Option<RtValue>) -> String {
    let id = value.unwrap().as_object().unwrap().unwrap();
    interpreter.heap().string(id).unwrap().to_owned()
}
