// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::{CommandFailurePolicy, MissingWatchTaskPolicy, UndefinedVariablePolicy};

/// Command-line arguments for `buildwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildwatch",
    version,
    about = "Run named command lists and re-run them when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run at startup. A leading `#` runs it in daemon mode.
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Path to the config file (JSON, YAML or TOML, by extension).
    #[arg(long, value_name = "PATH", default_value = "build.json")]
    pub config: String,

    /// Run the task once and exit, even if watch rules are configured.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print variables, tasks and watch rules, but don't
    /// execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// What to do after a failed command: `abort` or `continue`.
    #[arg(long, value_name = "POLICY")]
    pub on_failure: Option<CommandFailurePolicy>,

    /// Undefined `${name}` references: `strict` or `permissive`.
    #[arg(long, value_name = "POLICY")]
    pub undefined_variables: Option<UndefinedVariablePolicy>,

    /// Unknown task triggered by a file change: `log` or `exit`.
    #[arg(long, value_name = "POLICY")]
    pub missing_watch_task: Option<MissingWatchTaskPolicy>,
}

impl CliArgs {
    /// Arguments for running `task` from `config` with everything else at its
    /// default.
    pub fn for_task(config: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            config: config.into(),
            once: false,
            log_level: None,
            dry_run: false,
            on_failure: None,
            undefined_variables: None,
            missing_watch_task: None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
