//! Endpoint URL watcher
//!
//! Background loop that consumes the resource-state-change stream and, when
//! a resource with proxy endpoint annotations reaches the running state,
//! merges the annotated URLs into its published snapshot. One merge per
//! event; re-observing an already-enriched resource publishes nothing.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::notify::{NotifyError, ResourceEvent, SnapshotPublisher};
use crate::topology::{ProxyEndpoint, ResourceState, UrlSnapshot};

/// Errors that stop the watcher
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Event stream lagged, {0} events were dropped")]
    Lagged(u64),

    #[error("Failed to publish URL update for '{resource}': {source}")]
    Publish {
        resource: String,
        #[source]
        source: NotifyError,
    },
}

/// Watcher that enriches running resources with their annotated URLs
pub struct EndpointUrlWatcher<P: SnapshotPublisher> {
    publisher: Arc<P>,
}

impl<P: SnapshotPublisher> EndpointUrlWatcher<P> {
    /// Create a watcher publishing through the given authority
    pub fn new(publisher: Arc<P>) -> Self {
        Self { publisher }
    }

    /// Run the subscription loop until shutdown is signalled, the stream
    /// closes, or an error stops the watcher.
    ///
    /// Shutdown and a closed stream are clean exits. Any other failure is
    /// returned for the lifecycle controller to log; the watcher does not
    /// retry or restart itself.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<ResourceEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), WatchError> {
        info!("Starting endpoint URL watcher");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender counts as a shutdown signal.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Endpoint URL watcher shutting down");
                        return Ok(());
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(event).await?,
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Resource event stream closed, endpoint URL watcher exiting");
                        return Ok(());
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        return Err(WatchError::Lagged(missed));
                    }
                },
            }
        }
    }

    async fn handle_event(&self, event: ResourceEvent) -> Result<(), WatchError> {
        // Only running resources expose derived URLs; earlier states are not
        // stable enough to publish against.
        if event.snapshot.state != ResourceState::Running {
            return Ok(());
        }

        let missing = missing_urls(event.resource.proxy_endpoints(), &event.snapshot.urls);
        if missing.is_empty() {
            return Ok(());
        }

        debug!(
            "Publishing {} proxy URL(s) for resource '{}'",
            missing.len(),
            event.resource.name()
        );

        self.publisher
            .append_urls(event.resource.name(), missing)
            .await
            .map_err(|source| WatchError::Publish {
                resource: event.resource.name().to_string(),
                source,
            })
    }
}

// ============================================================================
// Pure event logic (no I/O)
// ============================================================================

/// Compute the annotated URLs not yet present on a snapshot.
///
/// Name comparison is case-insensitive; output order follows annotation
/// order so repeated computation is stable.
pub fn missing_urls(endpoints: &[ProxyEndpoint], existing: &[UrlSnapshot]) -> Vec<UrlSnapshot> {
    endpoints
        .iter()
        .filter(|endpoint| {
            !existing
                .iter()
                .any(|url| url.name.eq_ignore_ascii_case(endpoint.name()))
        })
        .map(|endpoint| UrlSnapshot {
            name: endpoint.name().to_string(),
            url: endpoint.url().to_string(),
            is_internal: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use super::*;
    use crate::topology::{ResourceDef, ResourceSnapshot};

    /// Publisher mock that records every append call
    #[derive(Default)]
    struct RecordingPublisher {
        calls: AtomicUsize,
        last_urls: Mutex<Vec<UrlSnapshot>>,
    }

    #[async_trait]
    impl SnapshotPublisher for RecordingPublisher {
        async fn append_urls(
            &self,
            _resource: &str,
            urls: Vec<UrlSnapshot>,
        ) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_urls.lock().await = urls;
            Ok(())
        }
    }

    fn gateway_def() -> Arc<ResourceDef> {
        Arc::new(
            ResourceDef::new("gateway")
                .with_proxy_endpoint("app-dev", "https://app-dev.myapp.com")
                .unwrap(),
        )
    }

    fn event(def: &Arc<ResourceDef>, snapshot: ResourceSnapshot) -> ResourceEvent {
        ResourceEvent {
            resource: def.clone(),
            snapshot,
            timestamp: Utc::now(),
        }
    }

    fn url(name: &str) -> UrlSnapshot {
        UrlSnapshot {
            name: name.to_string(),
            url: format!("https://{}.myapp.com", name),
            is_internal: false,
        }
    }

    #[test]
    fn test_missing_urls_case_insensitive() {
        let def = gateway_def();
        let existing = vec![UrlSnapshot {
            name: "APP-DEV".to_string(),
            url: "https://app-dev.myapp.com".to_string(),
            is_internal: false,
        }];
        assert!(missing_urls(def.proxy_endpoints(), &existing).is_empty());
        assert_eq!(missing_urls(def.proxy_endpoints(), &[]).len(), 1);
    }

    #[tokio::test]
    async fn test_non_running_events_ignored() {
        let publisher = Arc::new(RecordingPublisher::default());
        let watcher = EndpointUrlWatcher::new(publisher.clone());
        let def = gateway_def();

        for state in [
            ResourceState::NotStarted,
            ResourceState::Starting,
            ResourceState::Stopped,
            ResourceState::Failed,
        ] {
            let snapshot = ResourceSnapshot {
                state,
                urls: vec![],
            };
            watcher.handle_event(event(&def, snapshot)).await.unwrap();
        }

        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_running_event_publishes_once() {
        let publisher = Arc::new(RecordingPublisher::default());
        let watcher = EndpointUrlWatcher::new(publisher.clone());
        let def = gateway_def();

        let snapshot = ResourceSnapshot {
            state: ResourceState::Running,
            urls: vec![],
        };
        watcher.handle_event(event(&def, snapshot)).await.unwrap();

        // Second running event where the URL is already present: no publish.
        let snapshot = ResourceSnapshot {
            state: ResourceState::Running,
            urls: vec![url("app-dev")],
        };
        watcher.handle_event(event(&def, snapshot)).await.unwrap();

        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_urls_merge_in_one_call() {
        let publisher = Arc::new(RecordingPublisher::default());
        let watcher = EndpointUrlWatcher::new(publisher.clone());
        let def = Arc::new(
            ResourceDef::new("gateway")
                .with_proxy_endpoint("a", "https://a.myapp.com")
                .unwrap()
                .with_proxy_endpoint("b", "https://b.myapp.com")
                .unwrap()
                .with_proxy_endpoint("c", "https://c.myapp.com")
                .unwrap(),
        );

        let snapshot = ResourceSnapshot {
            state: ResourceState::Running,
            urls: vec![url("a")],
        };
        watcher.handle_event(event(&def, snapshot)).await.unwrap();

        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
        let appended = publisher.last_urls.lock().await;
        let names: Vec<_> = appended.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[tokio::test]
    async fn test_shutdown_exits_cleanly_without_publishing() {
        let publisher = Arc::new(RecordingPublisher::default());
        let watcher = EndpointUrlWatcher::new(publisher.clone());

        let (event_tx, event_rx) = broadcast::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(watcher.run(event_rx, shutdown_rx));
        shutdown_tx.send(true).unwrap();

        let result = task.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
        drop(event_tx);
    }

    #[tokio::test]
    async fn test_closed_stream_is_a_clean_exit() {
        let publisher = Arc::new(RecordingPublisher::default());
        let watcher = EndpointUrlWatcher::new(publisher);

        let (event_tx, event_rx) = broadcast::channel::<ResourceEvent>(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(event_tx);

        let result = watcher.run(event_rx, shutdown_rx).await;
        assert!(result.is_ok());
    }
}
