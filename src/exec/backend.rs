// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The [`ProcessRunner`](super::runner::ProcessRunner) talks to a
//! `ProcessBackend` instead of `tokio::process` directly. This makes it easy
//! to swap in a fake backend in tests while keeping the production
//! implementation here.
//!
//! - [`ShellBackend`] is the default implementation used by `buildwatch`. It
//!   hands each command line to `sh -c` (`cmd /C` on Windows).
//! - Tests can provide their own `ProcessBackend` that records spawned
//!   commands and reports scripted exit codes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::anyhow;
use tokio::io::AsyncRead;
use tokio::process::Command;

use crate::errors::{BuildwatchError, Result};
use crate::types::ProcessOutcome;

/// Boxed output stream of a child process.
pub type OutputReader = Box<dyn AsyncRead + Send + Unpin>;

/// Resolves once the child process has exited.
pub type ExitFuture = Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send>>;

/// A freshly started child process.
pub struct SpawnedProcess {
    pub pid: u32,
    pub stdout: Option<OutputReader>,
    pub stderr: Option<OutputReader>,
    pub exit: ExitFuture,
}

impl std::fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

/// Trait abstracting how command lines become OS processes.
///
/// `spawn` must not block: it starts the process and returns. Waiting is done
/// by awaiting [`SpawnedProcess::exit`].
pub trait ProcessBackend: Send + Sync {
    fn spawn(&self, command: &str) -> Result<SpawnedProcess>;

    /// Terminate the process with the given id and everything it started.
    fn kill(&self, pid: u32) -> Result<()>;
}

/// Real backend used in production.
#[derive(Debug, Clone, Default)]
pub struct ShellBackend {
    working_dir: Option<PathBuf>,
}

impl ShellBackend {
    /// Commands run in `working_dir` (the config root in production).
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(working_dir.into()),
        }
    }
}

impl ProcessBackend for ShellBackend {
    fn spawn(&self, command: &str) -> Result<SpawnedProcess> {
        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        // Daemons must outlive the future that started them.
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        // Each command leads its own process group so a restart reaches the
        // whole tree behind `sh -c`, not just the shell.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| BuildwatchError::SpawnFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        let pid = child.id().ok_or_else(|| BuildwatchError::SpawnFailed {
            command: command.to_string(),
            reason: "process exited before its id could be read".to_string(),
        })?;

        let stdout = child.stdout.take().map(|s| Box::new(s) as OutputReader);
        let stderr = child.stderr.take().map(|s| Box::new(s) as OutputReader);

        let exit: ExitFuture = Box::pin(async move {
            let status = child.wait().await?;
            Ok(if status.success() {
                ProcessOutcome::Success
            } else {
                ProcessOutcome::Failed(status.code())
            })
        });

        Ok(SpawnedProcess {
            pid,
            stdout,
            stderr,
            exit,
        })
    }

    #[cfg(unix)]
    fn kill(&self, pid: u32) -> Result<()> {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        // The pid is also the group id, see `process_group(0)` in `spawn`.
        let raw = i32::try_from(pid).map_err(|_| anyhow!("pid {pid} out of range"))?;
        killpg(Pid::from_raw(raw), Signal::SIGKILL)
            .map_err(|e| anyhow!("failed to kill process group {pid}: {e}"))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn kill(&self, pid: u32) -> Result<()> {
        Err(anyhow!("killing pid {pid} is not supported on this platform").into())
    }
}
