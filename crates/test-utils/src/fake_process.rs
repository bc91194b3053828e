use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use buildwatch::errors::{BuildwatchError, Result};
use buildwatch::exec::backend::{ExitFuture, OutputReader, ProcessBackend, SpawnedProcess};
use buildwatch::types::ProcessOutcome;

#[derive(Default)]
struct State {
    next_pid: u32,
    /// Every spawn, in order.
    spawned: Vec<(u32, String)>,
    killed: Vec<u32>,
    /// Processes that have not exited, pid -> (command, kill switch).
    live: HashMap<u32, (String, oneshot::Sender<()>)>,
    exit_codes: HashMap<String, i32>,
    hanging: Vec<String>,
    failing_spawns: Vec<String>,
    failing_waits: Vec<String>,
    output: HashMap<String, (String, String)>,
}

/// A process backend that spawns nothing.
///
/// - records every spawned command line and every kill
/// - exits immediately with 0, or with the code set via `exit_with`
/// - commands marked with `hang` stay "running" until killed
#[derive(Clone, Default)]
pub struct FakeProcessBackend {
    state: Arc<Mutex<State>>,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().next_pid = 1000;
        backend
    }

    pub fn exit_with(self, command: &str, code: i32) -> Self {
        self.state
            .lock()
            .unwrap()
            .exit_codes
            .insert(command.to_string(), code);
        self
    }

    pub fn hang(self, command: &str) -> Self {
        self.state.lock().unwrap().hanging.push(command.to_string());
        self
    }

    pub fn fail_spawn(self, command: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_spawns
            .push(command.to_string());
        self
    }

    /// Spawn `command` normally but make waiting for its exit fail.
    pub fn fail_wait(self, command: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_waits
            .push(command.to_string());
        self
    }

    pub fn with_output(self, command: &str, stdout: &str, stderr: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .output
            .insert(command.to_string(), (stdout.to_string(), stderr.to_string()));
        self
    }

    /// Spawned command lines, in spawn order.
    pub fn spawned(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.spawned.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn spawn_count(&self, command: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.spawned.iter().filter(|(_, c)| c == command).count()
    }

    pub fn pids_of(&self, command: &str) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state
            .spawned
            .iter()
            .filter(|(_, c)| c == command)
            .map(|(pid, _)| *pid)
            .collect()
    }

    pub fn killed(&self) -> Vec<u32> {
        self.state.lock().unwrap().killed.clone()
    }

    /// Number of not-yet-exited processes running `command`.
    pub fn live_count(&self, command: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.live.values().filter(|(c, _)| c == command).count()
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&self, command: &str) -> Result<SpawnedProcess> {
        let mut state = self.state.lock().unwrap();

        if state.failing_spawns.iter().any(|c| c == command) {
            return Err(BuildwatchError::SpawnFailed {
                command: command.to_string(),
                reason: "scripted spawn failure".to_string(),
            });
        }

        state.next_pid += 1;
        let pid = state.next_pid;
        state.spawned.push((pid, command.to_string()));

        let (out, err) = state.output.get(command).cloned().unwrap_or_default();
        let stdout: OutputReader = Box::new(Cursor::new(out.into_bytes()));
        let stderr: OutputReader = Box::new(Cursor::new(err.into_bytes()));

        let exit: ExitFuture = if state.hanging.iter().any(|c| c == command) {
            let (kill_tx, kill_rx) = oneshot::channel();
            state.live.insert(pid, (command.to_string(), kill_tx));
            Box::pin(async move {
                let _ = kill_rx.await;
                Ok::<_, BuildwatchError>(ProcessOutcome::Failed(None))
            })
        } else if state.failing_waits.iter().any(|c| c == command) {
            Box::pin(async move {
                Err::<ProcessOutcome, _>(BuildwatchError::IoError(std::io::Error::other(
                    "wait interrupted",
                )))
            })
        } else {
            let outcome = match state.exit_codes.get(command) {
                Some(0) | None => ProcessOutcome::Success,
                Some(code) => ProcessOutcome::Failed(Some(*code)),
            };
            Box::pin(async move { Ok::<_, BuildwatchError>(outcome) })
        };

        Ok(SpawnedProcess {
            pid,
            stdout: Some(stdout),
            stderr: Some(stderr),
            exit,
        })
    }

    fn kill(&self, pid: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.killed.push(pid);
        match state.live.remove(&pid) {
            Some((_, kill_tx)) => {
                let _ = kill_tx.send(());
                Ok(())
            }
            None => Err(anyhow::anyhow!("no such process: {pid}").into()),
        }
    }
}
