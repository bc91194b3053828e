// src/config/mod.rs

//! Configuration loading and validation for buildwatch.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a JSON / YAML / TOML config file from disk (`loader.rs`).
//! - Validate basic invariants like reference cycles (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str, ConfigFormat};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskTarget, WatchTarget};
