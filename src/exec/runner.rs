// src/exec/runner.rs

//! Spawns individual command lines and tracks daemon instances.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::errors::{BuildwatchError, Result};
use crate::exec::backend::{ProcessBackend, SpawnedProcess};
use crate::exec::output::{forward_lines, OutputSink};
use crate::types::{OutputStream, ProcessOutcome};

/// Command string -> pid of the most recent daemon instance of it.
type TrackedProcesses = Arc<Mutex<HashMap<String, u32>>>;

/// Runs single (already variable-resolved) command lines.
///
/// **Per command string there is never more than one tracked daemon
/// process**: starting a command that has a tracked instance first kills that
/// instance. Kill, spawn and record happen under one lock so two concurrent
/// restarts of the same command cannot both survive.
pub struct ProcessRunner {
    backend: Arc<dyn ProcessBackend>,
    sink: Arc<dyn OutputSink>,
    tracked: TrackedProcesses,
}

impl std::fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("tracked", &self.tracked)
            .finish_non_exhaustive()
    }
}

impl ProcessRunner {
    pub fn new(backend: Arc<dyn ProcessBackend>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            backend,
            sink,
            tracked: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Pid of the tracked daemon instance of `command`, if any.
    pub fn tracked_pid(&self, command: &str) -> Option<u32> {
        lock(&self.tracked).get(command).copied()
    }

    /// Run `command`.
    ///
    /// - `daemon = false`: wait for the process; a non-zero exit is
    ///   `CommandFailed`.
    /// - `daemon = true`: return as soon as the process is started. Its exit
    ///   is only visible in the logs.
    pub async fn run(&self, command: &str, daemon: bool) -> Result<()> {
        let SpawnedProcess {
            pid,
            stdout,
            stderr,
            exit,
        } = self.start(command, daemon)?;

        info!(command = %command, pid, daemon, "started process");

        // Both streams are drained for the lifetime of the child, whatever
        // the mode.
        if let Some(stdout) = stdout {
            forward_lines(stdout, OutputStream::Stdout, command.to_string(), Arc::clone(&self.sink));
        }
        if let Some(stderr) = stderr {
            forward_lines(stderr, OutputStream::Stderr, command.to_string(), Arc::clone(&self.sink));
        }

        if daemon {
            let tracked = Arc::clone(&self.tracked);
            let command = command.to_string();
            tokio::spawn(async move {
                let outcome = exit.await;

                // Forget the instance unless a restart already replaced it.
                {
                    let mut table = lock(&tracked);
                    if table.get(&command) == Some(&pid) {
                        table.remove(&command);
                    }
                }

                match outcome {
                    Ok(ProcessOutcome::Success) => {
                        info!(command = %command, pid, "daemon process exited");
                    }
                    Ok(ProcessOutcome::Failed(code)) => {
                        warn!(command = %command, pid, exit_code = ?code, "daemon process exited with failure");
                    }
                    Err(err) => {
                        warn!(command = %command, pid, error = %err, "waiting for daemon process failed");
                    }
                }
            });
            return Ok(());
        }

        let outcome = exit.await.map_err(|err| BuildwatchError::WaitFailed {
            command: command.to_string(),
            reason: err.to_string(),
        })?;

        match outcome {
            ProcessOutcome::Success => {
                debug!(command = %command, pid, "process exited successfully");
                Ok(())
            }
            ProcessOutcome::Failed(code) => Err(BuildwatchError::CommandFailed {
                command: command.to_string(),
                code,
            }),
        }
    }

    /// Kill any tracked instance of `command`, spawn a new one and, in daemon
    /// mode, track it.
    fn start(&self, command: &str, daemon: bool) -> Result<SpawnedProcess> {
        let mut table = lock(&self.tracked);

        if let Some(old_pid) = table.remove(command) {
            info!(command = %command, pid = old_pid, "stopping previous instance");
            if let Err(err) = self.backend.kill(old_pid) {
                warn!(command = %command, pid = old_pid, error = %err, "failed to stop previous instance");
            }
        }

        let spawned = self.backend.spawn(command)?;
        if daemon {
            table.insert(command.to_string(), spawned.pid);
        }

        Ok(spawned)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
