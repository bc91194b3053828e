// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Cycle detected in task references: {0}")]
    TaskCycle(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Command `{command}` failed{}", exit_suffix(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Failed to spawn `{command}`: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("Lost track of `{command}` while waiting for it: {reason}")]
    WaitFailed { command: String, reason: String },

    #[error("Invalid watch pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Cannot watch {path:?}: {reason}")]
    WatchRegistration { path: PathBuf, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildwatchError {
    /// Errors that end the whole run when they surface from one-shot startup
    /// work. Command failures never are: they only end the current task.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BuildwatchError::CommandFailed { .. }
                | BuildwatchError::SpawnFailed { .. }
                | BuildwatchError::WaitFailed { .. }
                | BuildwatchError::WatchRegistration { .. }
        )
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BuildwatchError>;
