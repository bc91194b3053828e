// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! This module is responsible for:
//! - Compiling watch patterns into [`WatchRule`]s.
//! - Registering the directories behind them, once each, with a
//!   filesystem watcher (`notify` in production).
//! - Turning write events into task / command runs ([`ChangeDispatcher`]).

pub mod backend;
pub mod dispatcher;
pub mod path_utils;
pub mod patterns;
pub mod registry;

pub use backend::{ChangeEvent, ChangeKind, NotifyBackend, WatchBackend, WatchMessage};
pub use dispatcher::{ChangeDispatcher, DEFAULT_DEBOUNCE};
pub use patterns::{compile_rules, WatchRule};
pub use registry::WatchRegistry;
