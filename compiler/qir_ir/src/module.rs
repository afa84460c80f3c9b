//! Functions, globals, and modules.

use rustc_hash::FxHashMap;

use crate::{BlockId, FuncId, GlobalId, Instr, IrType, Terminator, VarId};

// ── Blocks ──────────────────────────────────────────────────────────

/// A finished basic block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    /// Label, unique within the function.
    pub name: String,
    pub instrs: Vec<Instr>,
    pub terminator: Terminator,
}

// ── Functions ───────────────────────────────────────────────────────

/// Body of a defined function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionBody {
    /// Variables bound to the parameters, in order.
    pub params: Vec<VarId>,
    /// Blocks indexed by [`BlockId`].
    pub blocks: Vec<Block>,
    /// Emission order; the first block is the entry.
    pub layout: Vec<BlockId>,
    /// Type of every variable, indexed by [`VarId`].
    pub var_types: Vec<IrType>,
    /// Source-level name hints, unique within the function.
    pub var_names: Vec<Option<String>>,
}

impl FunctionBody {
    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Entry block.
    pub fn entry(&self) -> BlockId {
        self.layout.first().copied().unwrap_or(BlockId::new(0))
    }

    #[inline]
    pub fn var_type(&self, var: VarId) -> &IrType {
        &self.var_types[var.index()]
    }

    /// Blocks in emission order.
    pub fn blocks_in_order(&self) -> impl Iterator<Item = &Block> {
        self.layout.iter().map(|id| &self.blocks[id.index()])
    }

    /// All instructions in emission order.
    pub fn instrs(&self) -> impl Iterator<Item = &Instr> {
        self.blocks_in_order().flat_map(|block| block.instrs.iter())
    }

    /// Find a block by label.
    pub fn block_named(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.name == name)
    }
}

/// Visibility of a defined function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Linkage {
    Internal,
    External,
}

/// A function: a declaration when `body` is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    pub linkage: Linkage,
    pub body: Option<FunctionBody>,
}

impl Function {
    pub fn is_declaration(&self) -> bool {
        self.body.is_none()
    }
}

// ── Globals ─────────────────────────────────────────────────────────

/// Contents of a module-level constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlobalKind {
    /// NUL-terminated string literal.
    CString(String),
    /// Raw bytes (big integer literals, little-endian two's complement).
    Bytes(Vec<u8>),
    /// Specialization entry points indexed by body/adj/ctl/ctladj.
    FunctionTable([Option<FuncId>; 4]),
    /// Capture count functions: reference count, alias count.
    MemoryTable([Option<FuncId>; 2]),
}

impl GlobalKind {
    /// Pointer type through which the global is used.
    pub fn pointer_type(&self) -> IrType {
        match self {
            GlobalKind::CString(_) | GlobalKind::Bytes(_) => IrType::Bytes,
            GlobalKind::FunctionTable(_) => IrType::CallableTable,
            GlobalKind::MemoryTable(_) => IrType::MemoryTable,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub kind: GlobalKind,
}

// ── Modules ─────────────────────────────────────────────────────────

/// A compilation unit's emitted IR.
///
/// Functions are declared first and defined later, so that calls and
/// tables can refer to functions whose bodies are generated afterwards.
#[derive(Clone, Debug, Default)]
pub struct Module {
    functions: Vec<Function>,
    globals: Vec<Global>,
    function_index: FxHashMap<String, FuncId>,
    global_index: FxHashMap<String, GlobalId>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a function, or return the existing one with the same name.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "function count never exceeds u32"
    )]
    pub fn declare_function(
        &mut self,
        name: &str,
        params: Vec<IrType>,
        ret: IrType,
        linkage: Linkage,
    ) -> FuncId {
        if let Some(&id) = self.function_index.get(name) {
            return id;
        }
        let id = FuncId::new(self.functions.len() as u32);
        self.functions.push(Function {
            name: name.to_owned(),
            params,
            ret,
            linkage,
            body: None,
        });
        self.function_index.insert(name.to_owned(), id);
        id
    }

    /// Attach a body to a declared function.
    pub fn define_function(&mut self, id: FuncId, body: FunctionBody) {
        let function = &mut self.functions[id.index()];
        debug_assert!(
            function.body.is_none(),
            "function {} defined twice",
            function.name
        );
        debug_assert_eq!(
            body.params.len(),
            function.params.len(),
            "parameter count mismatch for {}",
            function.name
        );
        function.body = Some(body);
    }

    /// Add a global, or return the existing one with the same name.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "global count never exceeds u32"
    )]
    pub fn add_global(&mut self, name: &str, kind: GlobalKind) -> GlobalId {
        if let Some(&id) = self.global_index.get(name) {
            return id;
        }
        let id = GlobalId::new(self.globals.len() as u32);
        self.globals.push(Global {
            name: name.to_owned(),
            kind,
        });
        self.global_index.insert(name.to_owned(), id);
        id
    }

    /// Replace the contents of an existing global.
    pub fn set_global(&mut self, id: GlobalId, kind: GlobalKind) {
        self.globals[id.index()].kind = kind;
    }

    #[inline]
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.index()]
    }

    pub fn function_id(&self, name: &str) -> Option<FuncId> {
        self.function_index.get(name).copied()
    }

    pub fn function_named(&self, name: &str) -> Option<&Function> {
        self.function_id(name).map(|id| self.function(id))
    }

    pub fn global_id(&self, name: &str) -> Option<GlobalId> {
        self.global_index.get(name).copied()
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }
}
