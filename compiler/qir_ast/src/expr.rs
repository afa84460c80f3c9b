//! Typed expressions.
//!
//! Every [`TypedExpr`] carries its resolved [`Type`]. The constructors at the
//! bottom of this file compute result types for the common cases so that
//! trees can be built by hand without repeating type information.

use num_bigint::BigInt;

use crate::{Name, QualifiedName, Span, Type};

// ── Literal payloads ────────────────────────────────────────────────

/// Single-qubit Pauli operator.
///
/// Discriminants match the two-bit runtime encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pauli {
    I = 0,
    X = 1,
    Z = 2,
    Y = 3,
}

impl Pauli {
    /// Decode the two-bit runtime encoding.
    pub fn from_bits(bits: u8) -> Pauli {
        match bits & 0b11 {
            0 => Pauli::I,
            1 => Pauli::X,
            2 => Pauli::Z,
            _ => Pauli::Y,
        }
    }

    /// Name used by string conversion.
    pub fn as_str(self) -> &'static str {
        match self {
            Pauli::I => "PauliI",
            Pauli::X => "PauliX",
            Pauli::Z => "PauliZ",
            Pauli::Y => "PauliY",
        }
    }
}

/// Measurement result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResultValue {
    Zero,
    One,
}

impl ResultValue {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultValue::Zero => "Zero",
            ResultValue::One => "One",
        }
    }
}

// ── Operators ───────────────────────────────────────────────────────

/// Binary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOp {
    /// Whether the operator produces a Bool regardless of its operand types.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

/// Unary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

// ── Expressions ─────────────────────────────────────────────────────

/// Reference to a named value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identifier {
    Local(Name),
    Global(QualifiedName),
}

/// Item selector of a copy-and-update expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Accessor {
    /// Array index: an Int or a Range.
    Index(Box<TypedExpr>),
    /// Named item of a user-defined type.
    Item(Name),
}

/// Expression kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    UnitValue,
    IntLiteral(i64),
    BigIntLiteral(BigInt),
    DoubleLiteral(f64),
    BoolLiteral(bool),
    PauliLiteral(Pauli),
    ResultLiteral(ResultValue),
    /// String literal; `{n}` placeholders in the template refer to `items[n]`.
    StringLiteral {
        template: String,
        items: Vec<TypedExpr>,
    },
    RangeLiteral {
        start: Box<TypedExpr>,
        step: Option<Box<TypedExpr>>,
        end: Box<TypedExpr>,
    },
    ValueTuple(Vec<TypedExpr>),
    ValueArray(Vec<TypedExpr>),
    /// `new T[length]`; the item type is the item type of the expression type.
    NewArray {
        length: Box<TypedExpr>,
    },
    Identifier(Identifier),
    ArrayItem {
        array: Box<TypedExpr>,
        index: Box<TypedExpr>,
    },
    NamedItem {
        target: Box<TypedExpr>,
        item: Name,
    },
    Unwrap(Box<TypedExpr>),
    CopyAndUpdate {
        target: Box<TypedExpr>,
        accessor: Accessor,
        value: Box<TypedExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TypedExpr>,
    },
    Conditional {
        cond: Box<TypedExpr>,
        if_true: Box<TypedExpr>,
        if_false: Box<TypedExpr>,
    },
    AdjointApplication(Box<TypedExpr>),
    ControlledApplication(Box<TypedExpr>),
    /// Call of a function or operation. An argument containing [`ExprKind::Missing`]
    /// items makes this a partial application.
    Call {
        callee: Box<TypedExpr>,
        arg: Box<TypedExpr>,
    },
    /// Placeholder argument (`_`) of a partial application.
    Missing,
    /// An expression kind the generator does not lower; evaluates to `undef`.
    Unsupported(&'static str),
}

/// Expression with its resolved type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Span,
}

impl TypedExpr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        TypedExpr {
            kind,
            ty,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // ── Queries ────────────────────────────────────────────────

    /// Name of the global callable this expression refers to, if any.
    pub fn as_global_callable(&self) -> Option<QualifiedName> {
        match &self.kind {
            ExprKind::Identifier(Identifier::Global(name)) => Some(*name),
            _ => None,
        }
    }

    /// Whether this expression or any of its tuple items is a placeholder.
    pub fn contains_missing(&self) -> bool {
        match &self.kind {
            ExprKind::Missing => true,
            ExprKind::ValueTuple(items) => items.iter().any(TypedExpr::contains_missing),
            _ => false,
        }
    }

    /// Whether this is a call with placeholder arguments.
    pub fn is_partial_application(&self) -> bool {
        matches!(&self.kind, ExprKind::Call { arg, .. } if arg.contains_missing())
    }

    /// The local variable through which this value is accessed, if any.
    ///
    /// Item accesses are followed to their root, so `a[i]::Re` reports `a`.
    pub fn accessed_via_local(&self) -> Option<Name> {
        match &self.kind {
            ExprKind::Identifier(Identifier::Local(name)) => Some(*name),
            ExprKind::ArrayItem { array: inner, .. }
            | ExprKind::NamedItem { target: inner, .. }
            | ExprKind::Unwrap(inner) => inner.accessed_via_local(),
            _ => None,
        }
    }

    // ── Constructors ───────────────────────────────────────────

    pub fn unit() -> Self {
        Self::new(ExprKind::UnitValue, Type::Unit)
    }

    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::IntLiteral(value), Type::Int)
    }

    pub fn big_int(value: impl Into<BigInt>) -> Self {
        Self::new(ExprKind::BigIntLiteral(value.into()), Type::BigInt)
    }

    pub fn double(value: f64) -> Self {
        Self::new(ExprKind::DoubleLiteral(value), Type::Double)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::BoolLiteral(value), Type::Bool)
    }

    pub fn pauli(value: Pauli) -> Self {
        Self::new(ExprKind::PauliLiteral(value), Type::Pauli)
    }

    pub fn result(value: ResultValue) -> Self {
        Self::new(ExprKind::ResultLiteral(value), Type::Result)
    }

    /// Plain string literal without placeholders.
    pub fn string(text: &str) -> Self {
        Self::interpolated(text, Vec::new())
    }

    pub fn interpolated(template: &str, items: Vec<TypedExpr>) -> Self {
        Self::new(
            ExprKind::StringLiteral {
                template: template.to_owned(),
                items,
            },
            Type::String,
        )
    }

    pub fn range(start: TypedExpr, step: Option<TypedExpr>, end: TypedExpr) -> Self {
        Self::new(
            ExprKind::RangeLiteral {
                start: Box::new(start),
                step: step.map(Box::new),
                end: Box::new(end),
            },
            Type::Range,
        )
    }

    pub fn local(name: Name, ty: Type) -> Self {
        Self::new(ExprKind::Identifier(Identifier::Local(name)), ty)
    }

    pub fn global(name: QualifiedName, ty: Type) -> Self {
        Self::new(ExprKind::Identifier(Identifier::Global(name)), ty)
    }

    /// Tuple literal; a single item is returned unchanged and no items give Unit.
    pub fn tuple(mut items: Vec<TypedExpr>) -> Self {
        match items.len() {
            0 => Self::unit(),
            1 => items.pop().unwrap_or_else(Self::unit),
            _ => {
                let ty = Type::Tuple(items.iter().map(|item| item.ty.clone()).collect());
                Self::new(ExprKind::ValueTuple(items), ty)
            }
        }
    }

    pub fn array(item_ty: Type, items: Vec<TypedExpr>) -> Self {
        Self::new(ExprKind::ValueArray(items), Type::array(item_ty))
    }

    pub fn new_array(item_ty: Type, length: TypedExpr) -> Self {
        Self::new(
            ExprKind::NewArray {
                length: Box::new(length),
            },
            Type::array(item_ty),
        )
    }

    /// Array item (Int index) or slice (Range index).
    pub fn index(array: TypedExpr, index: TypedExpr) -> Self {
        let ty = if index.ty == Type::Range {
            array.ty.clone()
        } else {
            array.ty.array_item().cloned().unwrap_or(Type::Unit)
        };
        Self::new(
            ExprKind::ArrayItem {
                array: Box::new(array),
                index: Box::new(index),
            },
            ty,
        )
    }

    pub fn named_item(target: TypedExpr, item: Name, ty: Type) -> Self {
        Self::new(
            ExprKind::NamedItem {
                target: Box::new(target),
                item,
            },
            ty,
        )
    }

    pub fn unwrap(target: TypedExpr, ty: Type) -> Self {
        Self::new(ExprKind::Unwrap(Box::new(target)), ty)
    }

    pub fn copy_and_update(target: TypedExpr, accessor: Accessor, value: TypedExpr) -> Self {
        let ty = target.ty.clone();
        Self::new(
            ExprKind::CopyAndUpdate {
                target: Box::new(target),
                accessor,
                value: Box::new(value),
            },
            ty,
        )
    }

    /// Binary operation; comparisons are Bool, everything else takes the left operand's type.
    pub fn binary(op: BinaryOp, lhs: TypedExpr, rhs: TypedExpr) -> Self {
        let ty = if op.is_comparison() {
            Type::Bool
        } else {
            lhs.ty.clone()
        };
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        )
    }

    pub fn unary(op: UnaryOp, operand: TypedExpr) -> Self {
        let ty = operand.ty.clone();
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    pub fn conditional(cond: TypedExpr, if_true: TypedExpr, if_false: TypedExpr) -> Self {
        let ty = if_true.ty.clone();
        Self::new(
            ExprKind::Conditional {
                cond: Box::new(cond),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            },
            ty,
        )
    }

    pub fn adjoint(callable: TypedExpr) -> Self {
        let ty = callable.ty.clone();
        Self::new(ExprKind::AdjointApplication(Box::new(callable)), ty)
    }

    /// Controlled application; the result takes `(Qubit[], input)`.
    pub fn controlled(callable: TypedExpr) -> Self {
        let ty = match &callable.ty {
            Type::Operation {
                input,
                output,
                functors,
            } => Type::operation(Type::controlled_input(input), (**output).clone(), *functors),
            other => other.clone(),
        };
        Self::new(ExprKind::ControlledApplication(Box::new(callable)), ty)
    }

    /// Call with a result type taken from the callee's type.
    pub fn call(callee: TypedExpr, arg: TypedExpr) -> Self {
        let ty = callee.ty.callable_output().cloned().unwrap_or(Type::Unit);
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                arg: Box::new(arg),
            },
            ty,
        )
    }

    /// Partial application; `ty` is the type of the resulting callable.
    pub fn partial(callee: TypedExpr, arg: TypedExpr, ty: Type) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                arg: Box::new(arg),
            },
            ty,
        )
    }

    /// Placeholder argument of the given type.
    pub fn missing(ty: Type) -> Self {
        Self::new(ExprKind::Missing, ty)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn comparison_yields_bool() {
        let e = TypedExpr::binary(BinaryOp::Lt, TypedExpr::int(1), TypedExpr::int(2));
        assert_eq!(e.ty, Type::Bool);
        let e = TypedExpr::binary(BinaryOp::Mod, TypedExpr::int(7), TypedExpr::int(3));
        assert_eq!(e.ty, Type::Int);
    }

    #[test]
    fn slicing_keeps_array_type() {
        let arr = TypedExpr::array(Type::Int, vec![TypedExpr::int(1), TypedExpr::int(2)]);
        let item = TypedExpr::index(arr.clone(), TypedExpr::int(0));
        assert_eq!(item.ty, Type::Int);
        let slice = TypedExpr::index(
            arr,
            TypedExpr::range(TypedExpr::int(0), None, TypedExpr::int(1)),
        );
        assert_eq!(slice.ty, Type::array(Type::Int));
    }

    #[test]
    fn missing_items_mark_partial_application() {
        let f = TypedExpr::global(
            QualifiedName::new(Name::from_raw(1), Name::from_raw(2)),
            Type::function(Type::Tuple(vec![Type::Int, Type::Int]), Type::Int),
        );
        let arg = TypedExpr::tuple(vec![TypedExpr::int(1), TypedExpr::missing(Type::Int)]);
        let call = TypedExpr::partial(f.clone(), arg, Type::function(Type::Int, Type::Int));
        assert!(call.is_partial_application());
        let full = TypedExpr::call(f, TypedExpr::tuple(vec![TypedExpr::int(1), TypedExpr::int(2)]));
        assert!(!full.is_partial_application());
    }

    #[test]
    fn local_access_follows_item_chains() {
        let a = Name::from_raw(7);
        let arr = TypedExpr::local(a, Type::array(Type::Int));
        let item = TypedExpr::index(arr, TypedExpr::int(0));
        assert_eq!(item.accessed_via_local(), Some(a));
        assert_eq!(TypedExpr::int(3).accessed_via_local(), None);
    }

    #[test]
    fn controlled_type_prepends_control_array() {
        let op = TypedExpr::global(
            QualifiedName::new(Name::from_raw(1), Name::from_raw(3)),
            Type::operation(Type::Qubit, Type::Unit, crate::Functors::CONTROLLED),
        );
        let ctl = TypedExpr::controlled(op);
        assert_eq!(
            ctl.ty.callable_input(),
            Some(&Type::Tuple(vec![Type::array(Type::Qubit), Type::Qubit]))
        );
    }

    #[test]
    fn pauli_bits_round_trip() {
        for p in [Pauli::I, Pauli::X, Pauli::Z, Pauli::Y] {
            assert_eq!(Pauli::from_bits(p as u8), p);
        }
    }
}
