use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use buildwatch::errors::{BuildwatchError, Result};
use buildwatch::watch::WatchBackend;

/// A watch backend that records `add_directory` calls instead of watching.
#[derive(Clone, Default)]
pub struct FakeWatchBackend {
    registered: Arc<Mutex<Vec<PathBuf>>>,
    refused: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `add_directory(dir)` fail.
    pub fn refuse(self, dir: impl Into<PathBuf>) -> Self {
        self.refused.lock().unwrap().push(dir.into());
        self
    }

    /// Every successful registration, duplicates included.
    pub fn registered(&self) -> Vec<PathBuf> {
        self.registered.lock().unwrap().clone()
    }
}

impl WatchBackend for FakeWatchBackend {
    fn add_directory(&mut self, dir: &Path) -> Result<()> {
        if self.refused.lock().unwrap().iter().any(|d| d == dir) {
            return Err(BuildwatchError::WatchRegistration {
                path: dir.to_path_buf(),
                reason: "permission denied".to_string(),
            });
        }
        self.registered.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}
