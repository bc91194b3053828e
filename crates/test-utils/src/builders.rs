#![allow(dead_code)]

use buildwatch::config::{ConfigFile, RawConfigFile, TaskTarget, WatchTarget};
use buildwatch::types::{CommandFailurePolicy, MissingWatchTaskPolicy, UndefinedVariablePolicy};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.config
            .variable
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_task(mut self, name: &str, commands: &[&str]) -> Self {
        self.config.task.insert(
            name.to_string(),
            commands.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Bind `pattern` to a task reference such as `build`, `#build` or `${build}`.
    pub fn watch_task(mut self, pattern: &str, task: &str) -> Self {
        self.config
            .watch
            .insert(pattern.to_string(), WatchTarget::Task(TaskTarget::parse(task)));
        self
    }

    pub fn watch_commands(mut self, pattern: &str, commands: &[&str]) -> Self {
        self.config.watch.insert(
            pattern.to_string(),
            WatchTarget::Commands(commands.iter().map(|c| c.to_string()).collect()),
        );
        self
    }

    pub fn on_command_failure(mut self, policy: CommandFailurePolicy) -> Self {
        self.config.config.on_command_failure = policy;
        self
    }

    pub fn undefined_variable(mut self, policy: UndefinedVariablePolicy) -> Self {
        self.config.config.undefined_variable = policy;
        self
    }

    pub fn missing_watch_task(mut self, policy: MissingWatchTaskPolicy) -> Self {
        self.config.config.missing_watch_task = policy;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
