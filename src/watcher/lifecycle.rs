//! Watcher lifecycle controller
//!
//! Owns the watcher task's start/cancel/drain sequence, bridging it into the
//! host process's startup and shutdown. The host constructs one controller
//! and registers it explicitly; `start` is guarded so a second registration
//! is a no-op rather than a second task.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::endpoint_watcher::{EndpointUrlWatcher, WatchError};
use crate::notify::ResourceNotifier;

/// Controls the background endpoint watcher task
#[derive(Default)]
pub struct WatcherLifecycle {
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<Result<(), WatchError>>>,
}

impl WatcherLifecycle {
    /// Create a controller with no task running
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `start` has been called and `stop` has not
    pub fn is_started(&self) -> bool {
        self.task.is_some()
    }

    /// Start the watcher task against the given hub.
    ///
    /// Subscribes before returning, so no event published after this call is
    /// missed. Returns immediately; the task runs until `stop` or failure.
    /// Calling `start` on an already-started controller does nothing.
    pub fn start(&mut self, notifier: Arc<ResourceNotifier>) {
        if self.task.is_some() {
            warn!("Endpoint watcher already started, ignoring");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let events = notifier.subscribe();
        let watcher = EndpointUrlWatcher::new(notifier);

        self.task = Some(tokio::spawn(
            async move { watcher.run(events, shutdown_rx).await },
        ));
        self.shutdown = Some(shutdown_tx);
    }

    /// Signal cancellation and wait for the watcher task to unwind.
    ///
    /// A cancellation-triggered exit is a clean stop; a watcher failure or a
    /// panic is logged but never propagated. Safe to call if `start` was
    /// never called or the task already finished.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // Send fails only if the task already exited, which is fine.
            let _ = shutdown.send(true);
        }

        let Some(task) = self.task.take() else {
            return;
        };

        match task.await {
            Ok(Ok(())) => info!("Endpoint watcher stopped"),
            Ok(Err(e)) => error!("Endpoint watcher failed: {}", e),
            Err(e) => error!("Endpoint watcher task aborted: {}", e),
        }
    }
}
