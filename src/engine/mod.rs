// src/engine/mod.rs

//! Orchestration engine for buildwatch.
//!
//! This module ties together:
//! - the variable resolver and task executor
//! - the watch registry and change dispatcher
//! - the main flow: initial task run, then (optionally) watching forever
//!
//! Construction and validation live in [`core`]; the async flow is
//! implemented in [`runtime`].

pub mod core;
pub mod runtime;

pub use core::Engine;
