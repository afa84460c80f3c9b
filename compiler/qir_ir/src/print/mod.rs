//! LLVM-flavoured text output.
//!
//! The output lists, in order: opaque and named type definitions, globals,
//! defined functions, declarations of external functions and target
//! instructions, and finally declarations of every runtime function and
//! intrinsic the module calls.

use std::collections::BTreeSet;
use std::fmt::{self, Write};

use crate::{
    Block, Callee, Constant, Function, FunctionBody, GlobalKind, Instr, Intrinsic, IrType,
    Linkage, Module, RuntimeFn, Terminator, Value,
};

/// Render a module as text.
pub fn print_module(module: &Module) -> String {
    DisplayModule(module).to_string()
}

struct DisplayModule<'a>(&'a Module);

impl fmt::Display for DisplayModule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = self.0;
        write_type_definitions(f)?;

        if !module.globals().is_empty() {
            f.write_char('\n')?;
        }
        for global in module.globals() {
            write!(f, "@{} = internal constant ", global.name)?;
            write_global_contents(f, module, &global.kind)?;
            f.write_char('\n')?;
        }

        for function in module.functions() {
            if let Some(body) = &function.body {
                f.write_char('\n')?;
                FunctionPrinter {
                    module,
                    function,
                    body,
                }
                .write(f)?;
            }
        }

        let declarations: Vec<&Function> = module
            .functions()
            .iter()
            .filter(|func| func.is_declaration())
            .collect();
        if !declarations.is_empty() {
            f.write_char('\n')?;
        }
        for function in declarations {
            write_declaration(f, &function.name, &function.params, &function.ret)?;
        }

        let (runtime, intrinsics) = used_externals(module);
        if !runtime.is_empty() || !intrinsics.is_empty() {
            f.write_char('\n')?;
        }
        for function in runtime {
            write_declaration(f, &function.symbol(), &function.params(), &function.ret())?;
        }
        for intrinsic in intrinsics {
            write_declaration(f, intrinsic.symbol(), &intrinsic.params(), &intrinsic.ret())?;
        }
        Ok(())
    }
}

fn write_type_definitions(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("%Range = type { i64, i64, i64 }\n")?;
    f.write_str("%TupleHeader = type { i32, i32 }\n")?;
    f.write_str("%Result = type i8\n")?;
    for opaque in ["Tuple", "Array", "Callable", "Qubit", "String", "BigInt"] {
        writeln!(f, "%{opaque} = type opaque")?;
    }
    Ok(())
}

fn write_global_contents(f: &mut fmt::Formatter<'_>, module: &Module, kind: &GlobalKind) -> fmt::Result {
    match kind {
        GlobalKind::CString(text) => {
            write!(f, "[{} x i8] c\"", text.len() + 1)?;
            write_escaped(f, text.as_bytes())?;
            f.write_str("\\00\"")
        }
        GlobalKind::Bytes(bytes) => {
            write!(f, "[{} x i8] c\"", bytes.len())?;
            write_escaped(f, bytes)?;
            f.write_char('"')
        }
        GlobalKind::FunctionTable(entries) => {
            let entry_ty = "void (%Tuple*, %Tuple*, %Tuple*)*";
            write!(f, "[4 x {entry_ty}] [")?;
            write_table_entries(f, module, entry_ty, entries)?;
            f.write_char(']')
        }
        GlobalKind::MemoryTable(entries) => {
            let entry_ty = "void (%Tuple*, i32)*";
            write!(f, "[2 x {entry_ty}] [")?;
            write_table_entries(f, module, entry_ty, entries)?;
            f.write_char(']')
        }
    }
}

fn write_table_entries(
    f: &mut fmt::Formatter<'_>,
    module: &Module,
    entry_ty: &str,
    entries: &[Option<crate::FuncId>],
) -> fmt::Result {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match entry {
            Some(id) => write!(f, "{entry_ty} @{}", module.function(*id).name)?,
            None => write!(f, "{entry_ty} null")?,
        }
    }
    Ok(())
}

fn write_escaped(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for &byte in bytes {
        if (byte.is_ascii_graphic() || byte == b' ') && byte != b'"' && byte != b'\\' {
            f.write_char(char::from(byte))?;
        } else {
            write!(f, "\\{byte:02X}")?;
        }
    }
    Ok(())
}

fn write_declaration(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    params: &[IrType],
    ret: &IrType,
) -> fmt::Result {
    write!(f, "declare {ret} @{name}(")?;
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{param}")?;
    }
    f.write_str(")\n")
}

/// Runtime functions and intrinsics called anywhere in the module.
fn used_externals(module: &Module) -> (BTreeSet<RuntimeFn>, BTreeSet<Intrinsic>) {
    let mut runtime = BTreeSet::new();
    let mut intrinsics = BTreeSet::new();
    for body in module.functions().iter().filter_map(|f| f.body.as_ref()) {
        for instr in body.instrs() {
            match instr {
                Instr::Call {
                    callee: Callee::Runtime(function),
                    ..
                } => {
                    runtime.insert(*function);
                }
                Instr::Call {
                    callee: Callee::Intrinsic(intrinsic),
                    ..
                } => {
                    intrinsics.insert(*intrinsic);
                }
                _ => {}
            }
        }
    }
    (runtime, intrinsics)
}

// ── Function bodies ─────────────────────────────────────────────────

struct FunctionPrinter<'a> {
    module: &'a Module,
    function: &'a Function,
    body: &'a FunctionBody,
}

impl FunctionPrinter<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let linkage = match self.function.linkage {
            Linkage::Internal => "internal ",
            Linkage::External => "",
        };
        write!(f, "define {linkage}{} @{}(", self.function.ret, self.function.name)?;
        for (i, (param, ty)) in self.body.params.iter().zip(&self.function.params).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty} ")?;
            self.write_value(f, &Value::Var(*param))?;
        }
        f.write_str(") {\n")?;
        for (i, block) in self.body.blocks_in_order().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            self.write_block(f, block)?;
        }
        f.write_str("}\n")
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, block: &Block) -> fmt::Result {
        writeln!(f, "{}:", block.name)?;
        for instr in &block.instrs {
            f.write_str("  ")?;
            self.write_instr(f, instr)?;
            f.write_char('\n')?;
        }
        f.write_str("  ")?;
        self.write_terminator(f, &block.terminator)?;
        f.write_char('\n')
    }

    fn ty(&self, value: &Value) -> IrType {
        match value {
            Value::Var(var) => self.body.var_type(*var).clone(),
            Value::Const(constant) => constant.ty(),
        }
    }

    fn write_value(&self, f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
        match value {
            Value::Var(var) => match &self.body.var_names[var.index()] {
                Some(name) => write!(f, "%{name}"),
                None => write!(f, "%{}", var.raw()),
            },
            Value::Const(constant) => self.write_constant(f, constant),
        }
    }

    fn write_typed(&self, f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
        write!(f, "{} ", self.ty(value))?;
        self.write_value(f, value)
    }

    fn write_constant(&self, f: &mut fmt::Formatter<'_>, constant: &Constant) -> fmt::Result {
        match constant {
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::I32(n) => write!(f, "{n}"),
            Constant::Int(n) => write!(f, "{n}"),
            Constant::Double(bits) => write!(f, "0x{bits:016X}"),
            Constant::Pauli(bits) => write!(f, "{bits}"),
            Constant::Result(one) => write!(f, "{}", u8::from(*one)),
            Constant::Null(_) => f.write_str("null"),
            Constant::Undef(_) => f.write_str("undef"),
            Constant::Global(id, _) => {
                let global = self.module.global(*id);
                match &global.kind {
                    GlobalKind::CString(text) => {
                        let len = text.len() + 1;
                        write!(
                            f,
                            "getelementptr inbounds ([{len} x i8], [{len} x i8]* @{}, i32 0, i32 0)",
                            global.name
                        )
                    }
                    GlobalKind::Bytes(bytes) => {
                        let len = bytes.len();
                        write!(
                            f,
                            "getelementptr inbounds ([{len} x i8], [{len} x i8]* @{}, i32 0, i32 0)",
                            global.name
                        )
                    }
                    GlobalKind::FunctionTable(_) | GlobalKind::MemoryTable(_) => {
                        write!(f, "@{}", global.name)
                    }
                }
            }
            Constant::SizeOf(ty) => write!(
                f,
                "ptrtoint ({ty}* getelementptr ({ty}, {ty}* null, i32 1) to i64)"
            ),
        }
    }

    fn write_dst(&self, f: &mut fmt::Formatter<'_>, dst: crate::VarId) -> fmt::Result {
        self.write_value(f, &Value::Var(dst))?;
        f.write_str(" = ")
    }

    fn write_instr(&self, f: &mut fmt::Formatter<'_>, instr: &Instr) -> fmt::Result {
        match instr {
            Instr::Binary { dst, op, lhs, rhs } => {
                self.write_dst(f, *dst)?;
                write!(f, "{} ", op.mnemonic())?;
                self.write_typed(f, lhs)?;
                f.write_str(", ")?;
                self.write_value(f, rhs)
            }
            Instr::FNeg { dst, value } => {
                self.write_dst(f, *dst)?;
                f.write_str("fneg ")?;
                self.write_typed(f, value)
            }
            Instr::ICmp {
                dst,
                pred,
                lhs,
                rhs,
            } => {
                self.write_dst(f, *dst)?;
                write!(f, "icmp {} ", pred.mnemonic())?;
                self.write_typed(f, lhs)?;
                f.write_str(", ")?;
                self.write_value(f, rhs)
            }
            Instr::FCmp {
                dst,
                pred,
                lhs,
                rhs,
            } => {
                self.write_dst(f, *dst)?;
                write!(f, "fcmp {} ", pred.mnemonic())?;
                self.write_typed(f, lhs)?;
                f.write_str(", ")?;
                self.write_value(f, rhs)
            }
            Instr::Select {
                dst,
                cond,
                if_true,
                if_false,
            } => {
                self.write_dst(f, *dst)?;
                f.write_str("select ")?;
                self.write_typed(f, cond)?;
                f.write_str(", ")?;
                self.write_typed(f, if_true)?;
                f.write_str(", ")?;
                self.write_typed(f, if_false)
            }
            Instr::Cast { dst, op, value, ty } => {
                self.write_dst(f, *dst)?;
                write!(f, "{} ", op.mnemonic())?;
                self.write_typed(f, value)?;
                write!(f, " to {ty}")
            }
            Instr::Call { dst, callee, args } => {
                if let Some(dst) = dst {
                    self.write_dst(f, *dst)?;
                }
                let (name, ret) = match callee {
                    Callee::Runtime(function) => (function.symbol(), function.ret()),
                    Callee::Intrinsic(intrinsic) => (intrinsic.symbol().to_owned(), intrinsic.ret()),
                    Callee::Function(id) => {
                        let function = self.module.function(*id);
                        (function.name.clone(), function.ret.clone())
                    }
                };
                write!(f, "call {ret} @{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.write_typed(f, arg)?;
                }
                f.write_char(')')
            }
            Instr::Alloca { dst, ty } => {
                self.write_dst(f, *dst)?;
                write!(f, "alloca {ty}")
            }
            Instr::Load { dst, ty, ptr } => {
                self.write_dst(f, *dst)?;
                write!(f, "load {ty}, ")?;
                self.write_typed(f, ptr)
            }
            Instr::Store { value, ptr } => {
                f.write_str("store ")?;
                self.write_typed(f, value)?;
                f.write_str(", ")?;
                self.write_typed(f, ptr)
            }
            Instr::ElementPtr { dst, ptr, index } => {
                self.write_dst(f, *dst)?;
                let ptr_ty = self.ty(ptr);
                let layout = ptr_ty.pointee().cloned().unwrap_or(IrType::I8);
                write!(f, "getelementptr inbounds {layout}, ")?;
                self.write_typed(f, ptr)?;
                // Item 0 of the layout is the runtime header.
                write!(f, ", i32 0, i32 {}", index + 1)
            }
            Instr::ExtractValue {
                dst,
                aggregate,
                index,
            } => {
                self.write_dst(f, *dst)?;
                f.write_str("extractvalue ")?;
                self.write_typed(f, aggregate)?;
                write!(f, ", {index}")
            }
            Instr::InsertValue {
                dst,
                aggregate,
                value,
                index,
            } => {
                self.write_dst(f, *dst)?;
                f.write_str("insertvalue ")?;
                self.write_typed(f, aggregate)?;
                f.write_str(", ")?;
                self.write_typed(f, value)?;
                write!(f, ", {index}")
            }
            Instr::Phi { dst, ty, incoming } => {
                self.write_dst(f, *dst)?;
                write!(f, "phi {ty} ")?;
                for (i, (value, block)) in incoming.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("[ ")?;
                    self.write_value(f, value)?;
                    write!(f, ", %{} ]", self.body.block(*block).name)?;
                }
                Ok(())
            }
        }
    }

    fn write_terminator(&self, f: &mut fmt::Formatter<'_>, terminator: &Terminator) -> fmt::Result {
        match terminator {
            Terminator::Return(None) => f.write_str("ret void"),
            Terminator::Return(Some(value)) => {
                f.write_str("ret ")?;
                self.write_typed(f, value)
            }
            Terminator::Jump(target) => write!(f, "br label %{}", self.body.block(*target).name),
            Terminator::Branch {
                cond,
                then_block,
                else_block,
            } => {
                f.write_str("br ")?;
                self.write_typed(f, cond)?;
                write!(
                    f,
                    ", label %{}, label %{}",
                    self.body.block(*then_block).name,
                    self.body.block(*else_block).name
                )
            }
            Terminator::Unreachable => f.write_str("unreachable"),
        }
    }
}
