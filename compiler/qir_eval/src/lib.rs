//! Reference interpreter for generated QIR modules.
//!
//! Executes a [`qir_ir::Module`] directly, implementing every runtime
//! library function the generator may call. Used to check generated code
//! end to end: results, messages, target instruction calls, and the
//! balance of reference counts and qubit allocations.
//!
//! # Architecture
//!
//! - **Interpreter** (`interpreter`): frames, blocks, phis, instructions, calls
//! - **Runtime** (`runtime`): the `__quantum__rt__*` catalogue
//! - **Heap** (`heap`): reference and alias counted objects, qubit registry
//! - **Output** (`output`): recorded messages and target calls
//!
//! Declared functions without a body (target instructions, intrinsic and
//! external specializations) are not executed; their calls are recorded and
//! return a zero value of their return type.
//!
//! # Debugging
//!
//! - `RUST_LOG=qir_eval=debug`: runs, target calls, failures
//! - `RUST_LOG=qir_eval=trace`: every call, runtime call, allocation, and free

mod config;
mod errors;
mod heap;
mod interpreter;
mod output;
mod runtime;
mod value;

pub use config::EvalConfig;
pub use errors::{EvalError, EvalResult};
pub use heap::{CallableObject, Heap, HeapStats, ObjectKind};
pub use interpreter::Interpreter;
pub use output::{MessageSink, Output, TargetCall};
pub use value::{Location, ObjectId, QubitId, RangeValue, RtValue};
