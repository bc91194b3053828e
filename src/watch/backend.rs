// src/watch/backend.rs

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::errors::{BuildwatchError, Result};

/// Kind of filesystem change, reduced to what the dispatcher cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File contents were written.
    Write,
    /// Creation, removal, rename, metadata, access.
    Other,
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                ChangeKind::Write
            }
            _ => ChangeKind::Other,
        }
    }
}

/// A change to a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn write(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Write,
        }
    }
}

/// What a watch backend delivers to the dispatcher.
#[derive(Debug, Clone)]
pub enum WatchMessage {
    Change(ChangeEvent),
    /// Error reported by the watch primitive itself (not a file event).
    Error(String),
}

/// Trait abstracting the filesystem-watch primitive.
///
/// Registration is per directory and non-recursive; deduplication is the
/// caller's job ([`WatchRegistry`](super::registry::WatchRegistry)).
pub trait WatchBackend: Send {
    fn add_directory(&mut self, dir: &Path) -> Result<()>;
}

/// Production backend on top of `notify`.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping this stops all
/// watching.
pub struct NotifyBackend {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend").finish()
    }
}

impl NotifyBackend {
    /// Create a watcher that forwards every event path and every watch error
    /// into `tx`.
    pub fn new(tx: mpsc::UnboundedSender<WatchMessage>) -> Result<Self> {
        // Closure called synchronously by notify whenever an event arrives.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let kind = ChangeKind::from(&event.kind);
                    for path in event.paths {
                        // Receiver gone means the dispatcher stopped; nothing to do.
                        let _ = tx.send(WatchMessage::Change(ChangeEvent { path, kind }));
                    }
                }
                Err(err) => {
                    let _ = tx.send(WatchMessage::Error(err.to_string()));
                }
            },
            Config::default(),
        )
        .map_err(|e| BuildwatchError::Other(e.into()))?;

        Ok(Self { inner })
    }
}

impl WatchBackend for NotifyBackend {
    fn add_directory(&mut self, dir: &Path) -> Result<()> {
        self.inner
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| BuildwatchError::WatchRegistration {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
