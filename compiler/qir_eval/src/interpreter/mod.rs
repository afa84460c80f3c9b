//! Block-by-block execution of function bodies.
//!
//! Each call runs in its own frame of SSA variables. Mutable cells created
//! by `alloca` live on a shared cell stack that is cut back when the call
//! returns. Phi nodes are resolved on block entry against the block control
//! came from, reading every incoming value before assigning any.
//!
//! Calls to runtime functions are dispatched to [`crate::runtime`]; calls to
//! declared functions without a body are recorded as target calls.

mod call_stack;
mod ops;

use qir_ir::{
    BlockId, Callee, Constant, FuncId, Function, FunctionBody, Instr, Intrinsic, IrType, Module,
    Terminator, Value,
};
use qir_stack::ensure_sufficient_stack;

use crate::heap::{Heap, HeapStats};
use crate::output::{MessageSink, Output};
use crate::value::{Location, RangeValue, RtValue};
use crate::{EvalConfig, EvalError, EvalResult};

use call_stack::{CallFrame, CallStack};

/// Runs functions of one module against a fresh runtime.
pub struct Interpreter<'m> {
    module: &'m Module,
    config: EvalConfig,
    pub(crate) heap: Heap,
    pub(crate) output: Output,
    cells: Vec<RtValue>,
    call_stack: CallStack,
    steps: u64,
    backtrace: Vec<String>,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module, config: EvalConfig) -> Self {
        let sink = if config.print_messages {
            MessageSink::Stdout
        } else {
            MessageSink::Buffer
        };
        Interpreter {
            module,
            call_stack: CallStack::new(config.max_call_depth),
            config,
            heap: Heap::new(),
            output: Output::new(sink),
            cells: Vec::new(),
            steps: 0,
            backtrace: Vec::new(),
        }
    }

    /// Call the function named `name` with `args`.
    ///
    /// Returns the function's value, `None` for void functions.
    pub fn call(&mut self, name: &str, args: Vec<RtValue>) -> EvalResult<Option<RtValue>> {
        let id = self
            .module
            .function_id(name)
            .ok_or_else(|| EvalError::UnknownFunction {
                name: name.to_owned(),
            })?;
        tracing::debug!(function = name, "run");
        self.backtrace.clear();
        self.call_function(id, args)
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The heap, for building arguments before a call.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Functions active when the last error was raised, innermost first.
    pub fn backtrace(&self) -> &[String] {
        &self.backtrace
    }

    // ── Calls ──────────────────────────────────────────────────

    pub(crate) fn call_function(
        &mut self,
        id: FuncId,
        args: Vec<RtValue>,
    ) -> EvalResult<Option<RtValue>> {
        let module = self.module;
        let function = module.function(id);
        let Some(body) = &function.body else {
            return self.call_declared(function, args);
        };
        if args.len() != body.params.len() {
            return Err(EvalError::TypeMismatch {
                expected: "one argument per parameter",
                found: format!("{} arguments for {}", args.len(), function.name),
            });
        }

        self.call_stack.push(CallFrame {
            function: id,
            cell_base: self.cells.len(),
        })?;
        tracing::trace!(function = %function.name, depth = self.call_stack.depth(), "call");
        let result = ensure_sufficient_stack(|| self.run_body(function, body, args));
        if result.is_err() && self.backtrace.is_empty() {
            self.backtrace = self.call_stack.backtrace(module);
        }
        if let Some(frame) = self.call_stack.pop() {
            self.cells.truncate(frame.cell_base);
        }
        result
    }

    /// A function without a body: a target instruction, or a specialization
    /// provided elsewhere.
    fn call_declared(
        &mut self,
        function: &Function,
        args: Vec<RtValue>,
    ) -> EvalResult<Option<RtValue>> {
        if !self.config.record_target_calls {
            return Err(EvalError::UnknownFunction {
                name: function.name.clone(),
            });
        }
        for arg in &args {
            if let RtValue::Qubit(qubit) = arg {
                self.heap.check_qubit(*qubit)?;
            }
        }
        self.output.target_call(&function.name, args);
        Ok(default_value(&function.ret))
    }

    fn run_body(
        &mut self,
        function: &Function,
        body: &FunctionBody,
        args: Vec<RtValue>,
    ) -> EvalResult<Option<RtValue>> {
        let mut vars = vec![RtValue::Undef; body.var_types.len()];
        for (param, arg) in body.params.iter().zip(args) {
            vars[param.index()] = arg;
        }

        let mut current = body.entry();
        let mut previous: Option<BlockId> = None;
        loop {
            let block = body.block(current);
            if let Some(from) = previous {
                resolve_phis(&mut vars, &block.instrs, from, &block.name)?;
            }
            for instr in &block.instrs {
                if matches!(instr, Instr::Phi { .. }) {
                    continue;
                }
                self.step()?;
                self.execute(&mut vars, instr)?;
            }

            self.step()?;
            let next = match &block.terminator {
                Terminator::Return(value) => {
                    return value.as_ref().map(|value| operand(&vars, value)).transpose();
                }
                Terminator::Jump(target) => *target,
                Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                } => {
                    if operand(&vars, cond)?.as_bool()? {
                        *then_block
                    } else {
                        *else_block
                    }
                }
                Terminator::Unreachable => {
                    return Err(EvalError::Unreachable {
                        function: function.name.clone(),
                    });
                }
            };
            previous = Some(current);
            current = next;
        }
    }

    fn step(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if self.steps > self.config.max_steps {
            return Err(EvalError::StepLimit {
                limit: self.config.max_steps,
            });
        }
        Ok(())
    }

    // ── Instructions ───────────────────────────────────────────

    fn execute(&mut self, vars: &mut [RtValue], instr: &Instr) -> EvalResult<()> {
        let value = match instr {
            Instr::Binary { op, lhs, rhs, .. } => {
                ops::binary(*op, &operand(vars, lhs)?, &operand(vars, rhs)?)?
            }
            Instr::FNeg { value, .. } => ops::fneg(&operand(vars, value)?)?,
            Instr::ICmp { pred, lhs, rhs, .. } => {
                RtValue::Bool(ops::icmp(*pred, &operand(vars, lhs)?, &operand(vars, rhs)?)?)
            }
            Instr::FCmp { pred, lhs, rhs, .. } => {
                RtValue::Bool(ops::fcmp(*pred, &operand(vars, lhs)?, &operand(vars, rhs)?)?)
            }
            Instr::Select {
                cond,
                if_true,
                if_false,
                ..
            } => {
                if operand(vars, cond)?.as_bool()? {
                    operand(vars, if_true)?
                } else {
                    operand(vars, if_false)?
                }
            }
            Instr::Cast { op, value, ty, .. } => ops::cast(*op, &operand(vars, value)?, ty)?,
            Instr::Call { dst, callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| operand(vars, arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                let result = match callee {
                    Callee::Runtime(function) => self.call_runtime(*function, &args)?,
                    Callee::Function(id) => self.call_function(*id, args)?,
                    Callee::Intrinsic(intrinsic) => Some(call_intrinsic(*intrinsic, &args)?),
                };
                match (dst, result) {
                    (Some(dst), Some(value)) => vars[dst.index()] = value,
                    (Some(_), None) => {
                        return Err(EvalError::mismatch("call with a value", callee));
                    }
                    (None, _) => {}
                }
                return Ok(());
            }
            Instr::Alloca { .. } => {
                self.cells.push(RtValue::Undef);
                RtValue::Ptr(Location::Cell(self.cells.len() - 1))
            }
            Instr::Load { ptr, .. } => self.load(operand(vars, ptr)?.as_ptr()?)?,
            Instr::Store { value, ptr } => {
                let location = operand(vars, ptr)?.as_ptr()?;
                let value = operand(vars, value)?;
                return self.store(location, value);
            }
            Instr::ElementPtr { ptr, index, .. } => match operand(vars, ptr)? {
                RtValue::Object(tuple) => RtValue::Ptr(Location::TupleItem(tuple, *index as usize)),
                other => return Err(EvalError::mismatch("tuple pointer", &other)),
            },
            Instr::ExtractValue {
                aggregate, index, ..
            } => RtValue::Int(operand(vars, aggregate)?.as_range()?.component(*index)?),
            Instr::InsertValue {
                aggregate,
                value,
                index,
                ..
            } => {
                let range = operand(vars, aggregate)?.as_range()?;
                let value = operand(vars, value)?.as_int()?;
                RtValue::Range(range.with_component(*index, value)?)
            }
            Instr::Phi { .. } => return Ok(()),
        };
        if let Some(dst) = instr.defined_var() {
            vars[dst.index()] = value;
        }
        Ok(())
    }

    // ── Memory ─────────────────────────────────────────────────

    fn load(&self, location: Location) -> EvalResult<RtValue> {
        match location {
            Location::Cell(cell) => self
                .cells
                .get(cell)
                .cloned()
                .ok_or_else(|| EvalError::mismatch("live cell", &location)),
            Location::TupleItem(tuple, index) => Ok(self
                .heap
                .tuple(tuple)?
                .get(index)
                .cloned()
                .unwrap_or_default()),
            Location::ArrayItem(array, index) => {
                let items = self.heap.array(array)?;
                items
                    .get(index)
                    .cloned()
                    .ok_or_else(|| index_out_of_range(index, items.len()))
            }
        }
    }

    fn store(&mut self, location: Location, value: RtValue) -> EvalResult<()> {
        match location {
            Location::Cell(cell) => match self.cells.get_mut(cell) {
                Some(slot) => *slot = value,
                None => return Err(EvalError::mismatch("live cell", &location)),
            },
            Location::TupleItem(tuple, index) => {
                // Tuples are created from a byte size, so items appear as they are written.
                let items = self.heap.tuple_mut(tuple)?;
                if items.len() <= index {
                    items.resize(index + 1, RtValue::Undef);
                }
                items[index] = value;
            }
            Location::ArrayItem(array, index) => {
                let items = self.heap.array_mut(array)?;
                let length = items.len();
                match items.get_mut(index) {
                    Some(slot) => *slot = value,
                    None => return Err(index_out_of_range(index, length)),
                }
            }
        }
        Ok(())
    }
}

// ── Operands ────────────────────────────────────────────────────────

fn operand(vars: &[RtValue], value: &Value) -> EvalResult<RtValue> {
    match value {
        Value::Var(var) => vars
            .get(var.index())
            .cloned()
            .ok_or(EvalError::UndefinedValue),
        Value::Const(constant) => Ok(constant_value(constant)),
    }
}

fn constant_value(constant: &Constant) -> RtValue {
    match constant {
        Constant::Bool(b) => RtValue::Bool(*b),
        Constant::I32(n) => RtValue::I32(*n),
        Constant::Int(n) => RtValue::Int(*n),
        Constant::Double(bits) => RtValue::Double(f64::from_bits(*bits)),
        Constant::Pauli(bits) => RtValue::Pauli(*bits),
        Constant::Result(one) => RtValue::Result(*one),
        Constant::Null(_) => RtValue::Null,
        // Ranges are assembled item by item from an undefined aggregate.
        Constant::Undef(IrType::Range) => RtValue::Range(RangeValue::default()),
        Constant::Undef(_) => RtValue::Undef,
        Constant::Global(id, _) => RtValue::Global(*id),
        Constant::SizeOf(ty) => RtValue::Int(i64::from(ty.byte_size())),
    }
}

/// Assign every phi of a block entered from `from`.
fn resolve_phis(vars: &mut [RtValue], instrs: &[Instr], from: BlockId, block: &str) -> EvalResult<()> {
    let mut assignments = Vec::new();
    for instr in instrs {
        let Instr::Phi { dst, incoming, .. } = instr else {
            continue;
        };
        let (value, _) = incoming
            .iter()
            .find(|(_, pred)| *pred == from)
            .ok_or_else(|| EvalError::mismatch("phi edge", &(block, from)))?;
        assignments.push((*dst, operand(vars, value)?));
    }
    for (dst, value) in assignments {
        vars[dst.index()] = value;
    }
    Ok(())
}

fn call_intrinsic(intrinsic: Intrinsic, args: &[RtValue]) -> EvalResult<RtValue> {
    match intrinsic {
        Intrinsic::PowF64 => {
            let [base, exponent] = args else {
                return Err(EvalError::mismatch("two arguments", &args));
            };
            Ok(RtValue::Double(base.as_double()?.powf(exponent.as_double()?)))
        }
    }
}

/// Value returned by a declared function: zero, `Zero`, or null.
fn default_value(ty: &IrType) -> Option<RtValue> {
    Some(match ty {
        IrType::Void => return None,
        IrType::Bool => RtValue::Bool(false),
        IrType::I8 | IrType::I32 => RtValue::I32(0),
        IrType::Int => RtValue::Int(0),
        IrType::Double => RtValue::Double(0.0),
        IrType::Pauli => RtValue::Pauli(0),
        IrType::Result => RtValue::Result(false),
        IrType::Range => RtValue::Range(RangeValue::default()),
        _ => RtValue::Null,
    })
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "indices come from non-negative i64 values"
)]
fn index_out_of_range(index: usize, length: usize) -> EvalError {
    EvalError::IndexOutOfRange {
        index: index as i64,
        length,
    }
}
