// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands defined in
//! the tasks, using `tokio::process::Command`.
//!
//! - [`backend`] provides the `ProcessBackend` trait and the concrete
//!   `ShellBackend` used in production, which tests replace with a fake.
//! - [`output`] forwards child stdout/stderr lines to an `OutputSink`.
//! - [`runner`] spawns single command lines and tracks daemon instances.
//! - [`executor`] resolves tasks to command lists and runs them in order.

pub mod backend;
pub mod executor;
pub mod output;
pub mod runner;

pub use backend::{ProcessBackend, ShellBackend, SpawnedProcess};
pub use executor::TaskExecutor;
pub use output::{ConsoleSink, OutputSink};
pub use runner::ProcessRunner;
