//! Global declarations: callables, user-defined types, namespaces.

use rustc_hash::FxHashMap;

use crate::{Block, Functors, Name, QualifiedName, Span, Type};

// ── Callables ───────────────────────────────────────────────────────

/// Kind of a global callable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Function,
    Operation,
    /// Implicit constructor of a user-defined type.
    TypeConstructor,
}

/// Specialization kind of a callable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecKind {
    Body,
    Adjoint,
    Controlled,
    ControlledAdjoint,
}

impl SpecKind {
    /// All kinds, in callable-table order.
    pub const ALL: [SpecKind; 4] = [
        SpecKind::Body,
        SpecKind::Adjoint,
        SpecKind::Controlled,
        SpecKind::ControlledAdjoint,
    ];

    /// Slot of this kind in a callable table.
    #[inline]
    pub const fn table_index(self) -> usize {
        self as usize
    }

    /// Whether this specialization takes a control array.
    pub const fn is_controlled(self) -> bool {
        matches!(self, SpecKind::Controlled | SpecKind::ControlledAdjoint)
    }

    /// Whether this specialization is adjointed.
    pub const fn is_adjoint(self) -> bool {
        matches!(self, SpecKind::Adjoint | SpecKind::ControlledAdjoint)
    }

    /// Kind from adjoint and controlled flags.
    pub const fn from_flags(adjoint: bool, controlled: bool) -> SpecKind {
        match (adjoint, controlled) {
            (false, false) => SpecKind::Body,
            (true, false) => SpecKind::Adjoint,
            (false, true) => SpecKind::Controlled,
            (true, true) => SpecKind::ControlledAdjoint,
        }
    }

    /// Functors a callable must support for this kind to exist.
    pub fn required_functors(self) -> Functors {
        let mut functors = Functors::empty();
        if self.is_adjoint() {
            functors |= Functors::ADJOINT;
        }
        if self.is_controlled() {
            functors |= Functors::CONTROLLED;
        }
        functors
    }

    /// Suffix used in generated names.
    pub const fn suffix(self) -> &'static str {
        match self {
            SpecKind::Body => "body",
            SpecKind::Adjoint => "adj",
            SpecKind::Controlled => "ctl",
            SpecKind::ControlledAdjoint => "ctladj",
        }
    }
}

/// Implementation of a specialization.
#[derive(Clone, Debug, PartialEq)]
pub enum SpecImpl {
    /// Body provided in source. Controlled kinds name their control array.
    Provided {
        controls: Option<Name>,
        body: Block,
    },
    /// Implemented by the target; calls become target instructions.
    Intrinsic,
    /// Implemented outside the compilation unit; only declared.
    External,
}

/// One specialization of a callable.
#[derive(Clone, Debug, PartialEq)]
pub struct Specialization {
    pub kind: SpecKind,
    pub implementation: SpecImpl,
}

/// Declared parameter pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    /// A single parameter; anonymous parameters are not bound.
    Item { name: Option<Name>, ty: Type },
    Tuple(Vec<Param>),
}

impl Param {
    pub fn named(name: Name, ty: Type) -> Param {
        Param::Item {
            name: Some(name),
            ty,
        }
    }

    /// Type of the value this pattern binds.
    pub fn ty(&self) -> Type {
        match self {
            Param::Item { ty, .. } => ty.clone(),
            Param::Tuple(items) => Type::tuple_of(items.iter().map(Param::ty).collect()),
        }
    }
}

/// Attributes that change how a callable is lowered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallableAttrs {
    /// Body is substituted at call sites instead of called.
    pub inline: bool,
    /// Calls lower to the named target instruction.
    pub target_instruction: Option<String>,
}

/// Global function, operation, or type constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct Callable {
    pub name: QualifiedName,
    pub kind: CallableKind,
    pub input: Type,
    pub output: Type,
    pub functors: Functors,
    /// Parameter patterns; their combined type is `input`.
    pub params: Vec<Param>,
    pub attrs: CallableAttrs,
    pub specializations: Vec<Specialization>,
    pub span: Span,
}

impl Callable {
    /// Type of a value referring to this callable.
    pub fn signature(&self) -> Type {
        match self.kind {
            CallableKind::Operation => {
                Type::operation(self.input.clone(), self.output.clone(), self.functors)
            }
            CallableKind::Function | CallableKind::TypeConstructor => {
                Type::function(self.input.clone(), self.output.clone())
            }
        }
    }

    pub fn specialization(&self, kind: SpecKind) -> Option<&Specialization> {
        self.specializations.iter().find(|spec| spec.kind == kind)
    }

    /// Whether the body is intrinsic.
    pub fn is_intrinsic(&self) -> bool {
        self.specialization(SpecKind::Body)
            .is_some_and(|spec| spec.implementation == SpecImpl::Intrinsic)
    }
}

// ── User-defined types ──────────────────────────────────────────────

/// Item structure of a user-defined type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeItems {
    Anonymous(Type),
    Named(Name, Type),
    Tuple(Vec<TypeItems>),
}

impl TypeItems {
    /// Path of tuple indices leading to the named item.
    ///
    /// A single-item type (not a tuple) is its own item and yields an empty path.
    pub fn find_named_item(&self, item: Name) -> Option<Vec<usize>> {
        match self {
            TypeItems::Named(name, _) if *name == item => Some(Vec::new()),
            TypeItems::Named(..) | TypeItems::Anonymous(_) => None,
            TypeItems::Tuple(items) => items.iter().enumerate().find_map(|(i, sub)| {
                sub.find_named_item(item).map(|mut rest| {
                    rest.insert(0, i);
                    rest
                })
            }),
        }
    }

    /// Underlying type described by these items.
    pub fn ty(&self) -> Type {
        match self {
            TypeItems::Anonymous(ty) | TypeItems::Named(_, ty) => ty.clone(),
            TypeItems::Tuple(items) => Type::tuple_of(items.iter().map(TypeItems::ty).collect()),
        }
    }
}

/// User-defined type declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct UdtDecl {
    pub name: QualifiedName,
    pub items: TypeItems,
    pub span: Span,
}

impl UdtDecl {
    /// Underlying type of the UDT.
    pub fn underlying(&self) -> Type {
        self.items.ty()
    }
}

// ── Namespaces ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum NamespaceElement {
    Callable(Callable),
    Type(UdtDecl),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Namespace {
    pub name: Name,
    pub elements: Vec<NamespaceElement>,
}

/// Whole compilation unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub namespaces: Vec<Namespace>,
}

impl Program {
    pub fn callables(&self) -> impl Iterator<Item = &Callable> {
        self.namespaces
            .iter()
            .flat_map(|ns| ns.elements.iter())
            .filter_map(|element| match element {
                NamespaceElement::Callable(callable) => Some(callable),
                NamespaceElement::Type(_) => None,
            })
    }

    pub fn types(&self) -> impl Iterator<Item = &UdtDecl> {
        self.namespaces
            .iter()
            .flat_map(|ns| ns.elements.iter())
            .filter_map(|element| match element {
                NamespaceElement::Type(udt) => Some(udt),
                NamespaceElement::Callable(_) => None,
            })
    }

    /// Index of callables by qualified name.
    pub fn callable_index(&self) -> FxHashMap<QualifiedName, &Callable> {
        self.callables().map(|c| (c.name, c)).collect()
    }

    /// Index of user-defined types by qualified name.
    pub fn type_index(&self) -> FxHashMap<QualifiedName, &UdtDecl> {
        self.types().map(|t| (t.name, t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn named_item_paths() {
        let re = Name::from_raw(1);
        let im = Name::from_raw(2);
        let tag = Name::from_raw(3);
        let items = TypeItems::Tuple(vec![
            TypeItems::Tuple(vec![
                TypeItems::Named(re, Type::Double),
                TypeItems::Named(im, Type::Double),
            ]),
            TypeItems::Named(tag, Type::String),
        ]);
        assert_eq!(items.find_named_item(im), Some(vec![0, 1]));
        assert_eq!(items.find_named_item(tag), Some(vec![1]));
        assert_eq!(items.find_named_item(Name::from_raw(9)), None);
        assert_eq!(
            items.ty(),
            Type::Tuple(vec![
                Type::Tuple(vec![Type::Double, Type::Double]),
                Type::String
            ])
        );
    }

    #[test]
    fn spec_kind_flags() {
        for kind in SpecKind::ALL {
            assert_eq!(SpecKind::from_flags(kind.is_adjoint(), kind.is_controlled()), kind);
        }
        assert_eq!(SpecKind::ControlledAdjoint.table_index(), 3);
        assert_eq!(SpecKind::Controlled.suffix(), "ctl");
        assert_eq!(
            SpecKind::ControlledAdjoint.required_functors(),
            Functors::ADJOINT | Functors::CONTROLLED
        );
    }

    #[test]
    fn param_types_combine() {
        let p = Param::Tuple(vec![
            Param::named(Name::from_raw(1), Type::Qubit),
            Param::Item {
                name: None,
                ty: Type::Int,
            },
        ]);
        assert_eq!(p.ty(), Type::Tuple(vec![Type::Qubit, Type::Int]));
    }
}
