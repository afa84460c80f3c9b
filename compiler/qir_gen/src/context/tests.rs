#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use qir_ast::TypeItems;
use qir_ir::{IrType, Linkage, Terminator};

use super::*;

fn context<'a>(
    interner: &'a StringInterner,
    config: &'a GenConfig,
    udts: FxHashMap<QualifiedName, &'a UdtDecl>,
) -> GenerationContext<'a> {
    GenerationContext::new(interner, config, FxHashMap::default(), udts)
}

fn declare(ctx: &mut GenerationContext<'_>, name: &str, ret: IrType) -> FuncId {
    ctx.module
        .declare_function(name, Vec::new(), ret, Linkage::Internal)
}

#[test]
fn global_names_are_numbered_per_prefix() {
    let interner = StringInterner::new();
    let config = GenConfig::default();
    let mut ctx = context(&interner, &config, FxHashMap::default());
    assert_eq!(ctx.global_name("cstr"), "cstr__1");
    assert_eq!(ctx.global_name("bigint"), "bigint__1");
    assert_eq!(ctx.global_name("cstr"), "cstr__2");
}

#[test]
fn string_constants_are_shared() {
    let interner = StringInterner::new();
    let config = GenConfig::default();
    let mut ctx = context(&interner, &config, FxHashMap::default());
    let first = ctx.string_constant("hello");
    let again = ctx.string_constant("hello");
    let other = ctx.string_constant("world");
    assert_eq!(first, again);
    assert_ne!(first, other);

    let module = ctx.into_module();
    let strings: Vec<&GlobalKind> = module.globals().iter().map(|global| &global.kind).collect();
    assert_eq!(
        strings,
        [
            &GlobalKind::CString("hello".to_owned()),
            &GlobalKind::CString("world".to_owned()),
        ]
    );
}

#[test]
fn open_paths_fall_back_by_return_type() {
    let interner = StringInterner::new();
    let config = GenConfig::default();
    let mut ctx = context(&interner, &config, FxHashMap::default());
    let void = declare(&mut ctx, "Void", IrType::Void);
    let int = declare(&mut ctx, "Int", IrType::Int);
    ctx.generate_function(void, |_, _| Ok(())).unwrap();
    ctx.generate_function(int, |_, _| Ok(())).unwrap();

    let module = ctx.into_module();
    let terminator = |name: &str| {
        let body = module.function_named(name).unwrap().body.as_ref().unwrap();
        body.block_named("entry").unwrap().terminator.clone()
    };
    assert_eq!(terminator("Void"), Terminator::Return(None));
    assert_eq!(terminator("Int"), Terminator::Unreachable);
}

#[test]
fn functions_cannot_nest() {
    let interner = StringInterner::new();
    let config = GenConfig::default();
    let mut ctx = context(&interner, &config, FxHashMap::default());
    let outer = declare(&mut ctx, "Outer", IrType::Void);
    let inner = declare(&mut ctx, "Inner", IrType::Void);
    let err = ctx
        .generate_function(outer, |ctx, _| ctx.generate_function(inner, |_, _| Ok(())))
        .unwrap_err();
    assert!(err.is_invariant_violation());
}

#[test]
fn single_item_types_have_one_item() {
    let interner = StringInterner::new();
    let config = GenConfig::default();
    let name = QualifiedName::new(interner.intern("Test"), interner.intern("Wrapped"));
    let udt = UdtDecl {
        name,
        items: TypeItems::Anonymous(Type::Int),
        span: Span::DUMMY,
    };
    let mut udts = FxHashMap::default();
    udts.insert(name, &udt);
    let ctx = context(&interner, &config, udts);
    assert_eq!(ctx.tuple_items(&Type::Udt(name)).unwrap(), [Type::Int]);
    assert_eq!(
        ctx.tuple_items(&Type::Tuple(vec![Type::Int, Type::Bool]))
            .unwrap(),
        [Type::Int, Type::Bool]
    );
    assert!(ctx.tuple_items(&Type::Int).unwrap_err().is_invariant_violation());
}
