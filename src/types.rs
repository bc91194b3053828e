use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What to do when a `${name}` reference names no variable.
///
/// - `Strict`: report `UndefinedVariable` and fail the run (default).
/// - `Permissive`: leave the token untouched and keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedVariablePolicy {
    #[default]
    Strict,
    Permissive,
}

impl FromStr for UndefinedVariablePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(UndefinedVariablePolicy::Strict),
            "permissive" => Ok(UndefinedVariablePolicy::Permissive),
            other => Err(format!(
                "invalid undefined_variable policy: {other} (expected \"strict\" or \"permissive\")"
            )),
        }
    }
}

/// Behaviour when a command inside a task fails.
///
/// - `Abort`: skip the remaining commands of the task (default).
/// - `Continue`: log the failure and run the next command anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandFailurePolicy {
    #[default]
    Abort,
    Continue,
}

impl FromStr for CommandFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(CommandFailurePolicy::Abort),
            "continue" => Ok(CommandFailurePolicy::Continue),
            other => Err(format!(
                "invalid on_command_failure policy: {other} (expected \"abort\" or \"continue\")"
            )),
        }
    }
}

/// Behaviour when a watch-triggered run hits a fatal error such as an
/// unknown task name.
///
/// - `Log`: log it; the watch loop keeps running (default).
/// - `Exit`: stop the whole process with a non-zero status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingWatchTaskPolicy {
    #[default]
    Log,
    Exit,
}

impl FromStr for MissingWatchTaskPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(MissingWatchTaskPolicy::Log),
            "exit" => Ok(MissingWatchTaskPolicy::Exit),
            other => Err(format!(
                "invalid missing_watch_task policy: {other} (expected \"log\" or \"exit\")"
            )),
        }
    }
}

/// Which stream of a child process a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Exit outcome of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    /// Non-zero exit; `None` when the process was terminated by a signal.
    Failed(Option<i32>),
}
