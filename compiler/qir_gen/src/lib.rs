//! QIR generation.
//!
//! Lowers a typed, monomorphized syntax tree ([`qir_ast`]) into a QIR
//! module ([`qir_ir`]): one function per callable specialization, plus the
//! wrappers, closures, and memory management functions that callable
//! values need.
//!
//! # Architecture
//!
//! - **Context** (`context`): module under construction, current function
//!   builder, scopes, deferred work
//! - **Scopes** (`scope`): reference and alias count bookkeeping
//! - **Expressions** (`expr`) and **statements** (`stmt`): the lowering proper
//! - **Tables** (`tables`): callable tables, wrappers, memory management tables
//! - **Driver** (`driver`): walks the program, one function per specialization
//!
//! # Memory management
//!
//! Heap values (strings, big integers, arrays, tuples, callables) carry a
//! reference count and, except for strings and big integers, an alias
//! count. References are released by the scope that owns them; alias
//! counts track variable bindings so that copy-and-update copies only
//! what is shared.
//!
//! # Debugging
//!
//! - `RUST_LOG=qir_gen=debug`: one event per generated function
//! - `RUST_LOG=qir_gen=trace`: scopes, calls, and synthesized functions
//! - `QIR_LOG_TREE=1`: render spans as an indented tree

mod config;
mod context;
mod driver;
mod error;
mod expr;
mod names;
mod scope;
mod stmt;
mod tables;
mod types;
mod value;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

use qir_ast::{Program, StringInterner};
use qir_ir::Module;

pub use config::GenConfig;
pub use error::{GenError, Result, UnsupportedKind};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var_os("QIR_LOG_TREE").is_some() {
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Generate the QIR module for a program.
///
/// Every callable is generated, used or not. Fails on input the generator
/// does not support and on violated invariants.
pub fn generate(program: &Program, interner: &StringInterner, config: &GenConfig) -> Result<Module> {
    driver::generate_program(program, interner, config)
}
