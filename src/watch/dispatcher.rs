// src/watch/dispatcher.rs

//! Turns filesystem change events into task / command runs.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::model::WatchTarget;
use crate::errors::{BuildwatchError, Result};
use crate::exec::TaskExecutor;
use crate::types::MissingWatchTaskPolicy;
use crate::watch::backend::{ChangeEvent, ChangeKind, WatchMessage};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchRule;

/// Quiet period after the last write before pending paths are dispatched.
///
/// One editor save often arrives as several write events (truncate, then
/// data); they collapse into a single trigger.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Consumes [`WatchMessage`]s and triggers the targets of every matching rule.
///
/// Each trigger runs in its own Tokio task, so a slow task never delays the
/// next event, and overlapping triggers are not serialised.
pub struct ChangeDispatcher {
    root: PathBuf,
    debounce: Duration,
    rules: Arc<Vec<WatchRule>>,
    executor: Arc<TaskExecutor>,
    fatal_policy: MissingWatchTaskPolicy,
    fatal_tx: mpsc::UnboundedSender<BuildwatchError>,
}

impl std::fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("root", &self.root)
            .field("debounce", &self.debounce)
            .field("rules", &self.rules)
            .field("fatal_policy", &self.fatal_policy)
            .finish_non_exhaustive()
    }
}

impl ChangeDispatcher {
    /// `fatal_tx` receives fatal errors of triggered runs when
    /// `fatal_policy` is `Exit`.
    pub fn new(
        root: impl Into<PathBuf>,
        rules: Arc<Vec<WatchRule>>,
        executor: Arc<TaskExecutor>,
        fatal_policy: MissingWatchTaskPolicy,
        fatal_tx: mpsc::UnboundedSender<BuildwatchError>,
    ) -> Self {
        Self {
            root: root.into(),
            debounce: DEFAULT_DEBOUNCE,
            rules,
            executor,
            fatal_policy,
            fatal_tx,
        }
    }

    /// Replace [`DEFAULT_DEBOUNCE`].
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start the dispatch loop. It runs until `events` is closed.
    pub fn spawn(self, events: mpsc::UnboundedReceiver<WatchMessage>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Collect written paths until no write has arrived for the debounce
    /// period, then dispatch each distinct path once.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<WatchMessage>) {
        info!(
            rules = self.rules.len(),
            debounce_ms = self.debounce.as_millis() as u64,
            "change dispatcher started"
        );

        let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
        let quiet = sleep(self.debounce);
        tokio::pin!(quiet);

        loop {
            tokio::select! {
                message = events.recv() => match message {
                    Some(WatchMessage::Change(event)) => {
                        if event.kind == ChangeKind::Write {
                            pending.insert(event.path);
                            quiet.as_mut().reset(Instant::now() + self.debounce);
                        }
                    }
                    Some(WatchMessage::Error(err)) => {
                        error!(error = %err, "file watch error");
                    }
                    None => break,
                },
                () = &mut quiet, if !pending.is_empty() => {
                    self.flush(&mut pending);
                }
            }
        }

        self.flush(&mut pending);
        debug!("change dispatcher finished (channel closed)");
    }

    fn flush(&self, pending: &mut BTreeSet<PathBuf>) {
        for path in std::mem::take(pending) {
            self.dispatch(&ChangeEvent::write(path));
        }
    }

    /// Trigger every rule matching a write event. Returns the handles of the
    /// spawned runs; non-write events trigger nothing.
    pub fn dispatch(&self, event: &ChangeEvent) -> Vec<JoinHandle<()>> {
        if event.kind != ChangeKind::Write {
            return Vec::new();
        }

        let rel = relative_str(&self.root, &event.path)
            .unwrap_or_else(|| event.path.to_string_lossy().into_owned());

        self.rules
            .iter()
            .filter(|rule| rule.matches(&event.path))
            .map(|rule| {
                info!(path = %rel, pattern = %rule.pattern(), "watch match -> triggering");
                self.trigger(rule)
            })
            .collect()
    }

    fn trigger(&self, rule: &WatchRule) -> JoinHandle<()> {
        let executor = Arc::clone(&self.executor);
        let fatal_tx = self.fatal_tx.clone();
        let fatal_policy = self.fatal_policy;
        let pattern = rule.pattern().to_string();
        let target = rule.target().clone();

        tokio::spawn(async move {
            let result = match &target {
                WatchTarget::Task(task) => executor.run_task(&task.name, task.daemon).await,
                WatchTarget::Commands(commands) => {
                    executor.run_commands(&pattern, commands, false).await
                }
            };
            report(result, &pattern, fatal_policy, &fatal_tx);
        })
    }
}

/// Failures of triggered runs never stop the dispatcher. Fatal ones are
/// escalated only under `MissingWatchTaskPolicy::Exit`.
fn report(
    result: Result<()>,
    pattern: &str,
    policy: MissingWatchTaskPolicy,
    fatal_tx: &mpsc::UnboundedSender<BuildwatchError>,
) {
    let err = match result {
        Ok(()) => return,
        Err(err) => err,
    };

    if !err.is_fatal() {
        warn!(pattern = %pattern, error = %err, "triggered run failed");
        return;
    }

    match policy {
        MissingWatchTaskPolicy::Log => {
            error!(pattern = %pattern, error = %err, "triggered run failed; still watching");
        }
        MissingWatchTaskPolicy::Exit => {
            error!(pattern = %pattern, error = %err, "triggered run failed; exiting");
            if fatal_tx.send(err).is_err() {
                debug!("engine no longer listening for fatal errors");
            }
        }
    }
}
