// src/watch/registry.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::watch::backend::WatchBackend;
use crate::watch::patterns::WatchRule;

struct RegistryState<B> {
    backend: B,
    watched: HashSet<PathBuf>,
}

/// Registers the directories behind watch rules with a [`WatchBackend`],
/// **each directory exactly once** no matter how many rules reach it.
///
/// The set only grows. Dropping the registry drops the backend, which stops
/// watching.
pub struct WatchRegistry<B: WatchBackend> {
    state: Mutex<RegistryState<B>>,
}

impl<B: WatchBackend> std::fmt::Debug for WatchRegistry<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("watched", &self.watched_directories())
            .finish_non_exhaustive()
    }
}

impl<B: WatchBackend> WatchRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                backend,
                watched: HashSet::new(),
            }),
        }
    }

    /// Expand every rule and register the containing directory of each match.
    ///
    /// Returns the number of newly registered directories. An invalid pattern
    /// is an error; a directory the backend refuses is logged and skipped.
    pub fn register_rules(&self, rules: &[WatchRule]) -> Result<usize> {
        let mut added = 0;

        for rule in rules {
            let matches = rule.expand()?;
            if matches.is_empty() {
                warn!(pattern = %rule.pattern(), "watch pattern matches no files");
                continue;
            }

            for path in matches {
                let Some(dir) = path.parent() else {
                    continue;
                };
                match self.register_directory(dir) {
                    Ok(true) => added += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!(dir = ?dir, error = %err, "skipping directory that cannot be watched");
                    }
                }
            }
        }

        info!(directories = added, "registered watch directories");
        Ok(added)
    }

    /// Register `dir` unless it already is. Returns whether it was new.
    pub fn register_directory(&self, dir: &Path) -> Result<bool> {
        let mut state = self.lock();

        if state.watched.contains(dir) {
            return Ok(false);
        }

        state.backend.add_directory(dir)?;
        state.watched.insert(dir.to_path_buf());
        debug!(dir = ?dir, "watching directory");
        Ok(true)
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.lock().watched.contains(dir)
    }

    /// Currently watched directories, sorted.
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.lock().watched.iter().cloned().collect();
        dirs.sort();
        dirs
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<B>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
