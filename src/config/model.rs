// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::resolve::reference::{extract_reference, strip_daemon_marker};
use crate::types::{CommandFailurePolicy, MissingWatchTaskPolicy, UndefinedVariablePolicy};

/// Raw configuration as deserialized from JSON, YAML or TOML.
///
/// This is the direct shape of a `build.json`:
///
/// ```json
/// {
///   "config":   { "on_command_failure": "abort" },
///   "variable": { "name": "app", "out": "bin/${name}" },
///   "task":     { "default": ["go build -o ${out}", "${serve}"],
///                 "serve":   ["#./${out}"] },
///   "watch":    { "src/*.go": "#${default}",
///                 "assets/*.css": ["echo css changed"] }
/// }
/// ```
///
/// All sections are optional. It is **not** validated; use
/// [`ConfigFile::try_from`] (or `load_and_validate`) to obtain a
/// [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Policy settings from the `config` section.
    #[serde(default)]
    pub config: ConfigSection,

    /// Variable table: name -> raw value (may reference other variables).
    #[serde(default)]
    pub variable: BTreeMap<String, String>,

    /// Task table: name -> ordered command list.
    #[serde(default)]
    pub task: BTreeMap<String, Vec<String>>,

    /// Watch rules: glob pattern -> bound target.
    #[serde(default)]
    pub watch: BTreeMap<String, WatchTarget>,
}

/// Validated configuration.
///
/// Fields are private so a `ConfigFile` can only be produced through
/// validation; policies stay adjustable for CLI overrides.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    variable: BTreeMap<String, String>,
    task: BTreeMap<String, Vec<String>>,
    watch: BTreeMap<String, WatchTarget>,
}

impl ConfigFile {
    /// Create a `ConfigFile` without running validation.
    ///
    /// Prefer `ConfigFile::try_from(raw)`.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            variable: raw.variable,
            task: raw.task,
            watch: raw.watch,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn settings_mut(&mut self) -> &mut ConfigSection {
        &mut self.config
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variable
    }

    pub fn tasks(&self) -> &BTreeMap<String, Vec<String>> {
        &self.task
    }

    pub fn watch_rules(&self) -> &BTreeMap<String, WatchTarget> {
        &self.watch
    }
}

/// `config` section: how the engine reacts to the failure modes that have
/// more than one reasonable answer.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct ConfigSection {
    #[serde(default)]
    pub undefined_variable: UndefinedVariablePolicy,

    #[serde(default)]
    pub on_command_failure: CommandFailurePolicy,

    #[serde(default)]
    pub missing_watch_task: MissingWatchTaskPolicy,
}

/// What a watch rule triggers.
///
/// In the config file a plain string is a task reference and a list is a
/// literal command list:
///
/// ```json
/// "watch": {
///   "src/*.go": "#${build}",
///   "README.md": ["echo docs changed"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawWatchTarget")]
pub enum WatchTarget {
    Task(TaskTarget),
    Commands(Vec<String>),
}

/// Task referenced by a watch rule. `daemon` is set by a leading `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTarget {
    pub name: String,
    pub daemon: bool,
}

impl TaskTarget {
    /// Parse `build`, `#build`, `${build}` or `#${build}`.
    pub fn parse(raw: &str) -> Self {
        let (rest, daemon) = strip_daemon_marker(raw.trim());
        let name = extract_reference(rest).unwrap_or(rest);
        Self {
            name: name.to_string(),
            daemon,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWatchTarget {
    Task(String),
    Commands(Vec<String>),
}

impl From<RawWatchTarget> for WatchTarget {
    fn from(raw: RawWatchTarget) -> Self {
        match raw {
            RawWatchTarget::Task(s) => WatchTarget::Task(TaskTarget::parse(&s)),
            RawWatchTarget::Commands(cmds) => WatchTarget::Commands(cmds),
        }
    }
}
