// src/resolve/mod.rs

//! Reference tokens and variable substitution.

pub mod reference;
pub mod variables;

pub use reference::{Command, Reference, DAEMON_MARKER};
pub use variables::VariableResolver;
