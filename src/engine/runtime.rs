// src/engine/runtime.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::errors::{BuildwatchError, Result};
use crate::watch::{ChangeDispatcher, NotifyBackend, WatchBackend, WatchMessage, WatchRegistry};

use super::core::Engine;

impl Engine {
    /// Run `initial_task`, then keep watching if there are watch rules and
    /// `watch` is set.
    ///
    /// Without watching this returns once the task is done; any task error
    /// (including a failed command) is returned. With watching it only
    /// returns on a fatal error or Ctrl-C.
    pub async fn run(self, initial_task: &str, watch: bool) -> Result<()> {
        if !watch || !self.has_watch_rules() {
            return self.executor.run_task(initial_task, false).await;
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel::<WatchMessage>();
        let backend = NotifyBackend::new(event_tx)?;
        self.run_watching(initial_task, backend, event_rx).await
    }

    /// Watch-mode main flow with an explicit backend and event stream.
    ///
    /// 1. register watch directories (invalid pattern -> error)
    /// 2. start the dispatcher loop
    /// 3. run the initial task (fatal errors end the run, command failures
    ///    are logged)
    /// 4. park until a fatal error is escalated or Ctrl-C
    pub async fn run_watching<B: WatchBackend>(
        self,
        initial_task: &str,
        backend: B,
        events: mpsc::UnboundedReceiver<WatchMessage>,
    ) -> Result<()> {
        // Lives until we return; dropping it stops the watcher.
        let registry = WatchRegistry::new(backend);
        registry.register_rules(&self.rules)?;

        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<BuildwatchError>();
        let dispatcher = ChangeDispatcher::new(
            self.root.clone(),
            Arc::clone(&self.rules),
            Arc::clone(&self.executor),
            self.settings.missing_watch_task,
            fatal_tx,
        );
        let _dispatch_loop = dispatcher.spawn(events);

        match self.executor.run_task(initial_task, false).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(task = %initial_task, error = %err, "initial task failed; still watching");
            }
        }

        info!(
            directories = registry.watched_directories().len(),
            "watching for changes (Ctrl-C to stop)"
        );

        tokio::select! {
            Some(err) = fatal_rx.recv() => {
                error!(error = %err, "fatal error in triggered run");
                Err(err)
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("interrupted; exiting");
                Ok(())
            }
        }
    }
}
