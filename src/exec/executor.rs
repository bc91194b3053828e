// src/exec/executor.rs

//! Task execution: resolves task names to command lists and runs them in
//! declared order.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::errors::{BuildwatchError, Result};
use crate::exec::runner::ProcessRunner;
use crate::resolve::reference::{strip_daemon_marker, Command};
use crate::resolve::VariableResolver;
use crate::types::CommandFailurePolicy;

/// Boxed future returned by the recursive entry points.
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Runs tasks and commands.
///
/// Commands of one task always run sequentially in declared order; in daemon
/// mode "sequentially" means each spawn returns before the next starts.
/// Separate `run_task` calls (e.g. from concurrent watch triggers) are not
/// serialised against each other.
#[derive(Debug)]
pub struct TaskExecutor {
    tasks: BTreeMap<String, Vec<String>>,
    resolver: Arc<VariableResolver>,
    runner: ProcessRunner,
    failure_policy: CommandFailurePolicy,
}

impl TaskExecutor {
    pub fn new(
        tasks: BTreeMap<String, Vec<String>>,
        resolver: Arc<VariableResolver>,
        runner: ProcessRunner,
        failure_policy: CommandFailurePolicy,
    ) -> Self {
        Self {
            tasks,
            resolver,
            runner,
            failure_policy,
        }
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Run the task `name`.
    ///
    /// A leading `#` on `name` runs the whole task in daemon mode, as does
    /// `force_daemon` (propagated from a daemon caller). An unknown name is
    /// `TaskNotFound`, which callers treat as fatal.
    pub fn run_task<'a>(&'a self, name: &'a str, force_daemon: bool) -> TaskFuture<'a> {
        Box::pin(async move {
            let (name, marked) = strip_daemon_marker(name);
            let daemon = marked || force_daemon;

            let Some(commands) = self.tasks.get(name) else {
                error!(task = %name, "task not found");
                return Err(BuildwatchError::TaskNotFound(name.to_string()));
            };

            info!(task = %name, daemon, commands = commands.len(), "running task");
            self.run_commands(name, commands, daemon).await
        })
    }

    /// Run `commands` one after another, applying the failure policy.
    ///
    /// `label` only names the list in logs (a task name, or a watch pattern
    /// for literal command lists).
    pub async fn run_commands(&self, label: &str, commands: &[String], daemon: bool) -> Result<()> {
        for (idx, raw) in commands.iter().enumerate() {
            debug!(task = %label, index = idx, command = %raw, daemon, "running command");

            match self.run_command(raw, daemon).await {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!(task = %label, index = idx, error = %err, "command failed");
                    match self.failure_policy {
                        CommandFailurePolicy::Abort => {
                            warn!(
                                task = %label,
                                skipped = commands.len() - idx - 1,
                                "aborting remaining commands"
                            );
                            return Err(err);
                        }
                        CommandFailurePolicy::Continue => continue,
                    }
                }
            }
        }
        Ok(())
    }

    /// Single dispatch point for one command: a bare `${task}` recurses into
    /// [`run_task`](Self::run_task) with the daemon flag propagated; anything
    /// else is resolved and handed to the [`ProcessRunner`].
    pub fn run_command<'a>(&'a self, raw: &'a str, daemon: bool) -> TaskFuture<'a> {
        Box::pin(async move {
            match Command::parse(raw) {
                Command::RunTask { name, daemon: marked } => {
                    self.run_task(name, daemon || marked).await
                }
                Command::Shell { line, daemon: marked } => {
                    let line = self.resolver.resolve(line)?;
                    self.runner.run(&line, daemon || marked).await
                }
            }
        })
    }
}
