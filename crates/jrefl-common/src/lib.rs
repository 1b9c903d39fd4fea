//! Shared building blocks for the jrefl crates:
//! - Name interning (`Atom`, `ShardedInterner`)
//! - Recursion and hierarchy limits
//! - Tracing subscriber setup

pub mod interner;
pub use interner::{Atom, ShardedInterner};

pub mod limits;

pub mod tracing_config;
pub use tracing_config::{LogFormat, init_tracing};
