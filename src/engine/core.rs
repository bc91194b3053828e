// src/engine/core.rs

//! Construction of the engine from a validated config.
//!
//! Everything that can fail before any process is started happens here:
//! variable pre-resolution and watch rule compilation. The async side lives
//! in [`runtime`](super::runtime).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{ConfigFile, ConfigSection};
use crate::errors::Result;
use crate::exec::{OutputSink, ProcessBackend, ProcessRunner, TaskExecutor};
use crate::resolve::VariableResolver;
use crate::watch::{compile_rules, WatchRule};

/// Composition root: owns the resolved variables, the executor and the
/// compiled watch rules for the lifetime of the process.
#[derive(Debug)]
pub struct Engine {
    pub(crate) root: PathBuf,
    pub(crate) settings: ConfigSection,
    pub(crate) executor: Arc<TaskExecutor>,
    pub(crate) rules: Arc<Vec<WatchRule>>,
}

impl Engine {
    /// Wire up an engine.
    ///
    /// - `root` anchors relative watch patterns.
    /// - `backend` spawns processes, `sink` receives their output.
    pub fn new(
        cfg: &ConfigFile,
        root: impl Into<PathBuf>,
        backend: Arc<dyn ProcessBackend>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self> {
        let root = root.into();
        let settings = *cfg.settings();

        let resolver = Arc::new(VariableResolver::new(
            cfg.variables().clone(),
            settings.undefined_variable,
        )?);

        let rules = compile_rules(cfg.watch_rules(), &resolver, &root)?;
        debug!(rules = rules.len(), root = ?root, "compiled watch rules");

        let runner = ProcessRunner::new(backend, sink);
        let executor = TaskExecutor::new(
            cfg.tasks().clone(),
            resolver,
            runner,
            settings.on_command_failure,
        );

        Ok(Self {
            root,
            settings,
            executor: Arc::new(executor),
            rules: Arc::new(rules),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn executor(&self) -> &Arc<TaskExecutor> {
        &self.executor
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    pub fn has_watch_rules(&self) -> bool {
        !self.rules.is_empty()
    }
}
