//! Resource notification hub
//!
//! In-memory stand-in for the platform's notification/publication authority.
//! It owns the per-resource published snapshots, applies snapshot updates
//! atomically, and broadcasts one [`ResourceEvent`] per observed change to
//! every subscriber.
//!
//! The watcher never touches snapshots directly; it goes through the
//! [`SnapshotPublisher`] seam, which keeps the merge atomic and lets tests
//! substitute a mock to count publish calls.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::topology::{ResourceDef, ResourceSnapshot, ResourceState, UrlSnapshot};

/// Capacity of the broadcast event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Errors that can occur in the notification hub
#[derive(Error, Debug, PartialEq)]
pub enum NotifyError {
    #[error("Resource '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Resource '{0}' not found")]
    NotFound(String),
}

/// One observed state transition of a resource.
///
/// Ephemeral: one event per change, carrying the definition (with its
/// annotations) and the snapshot as of the change.
#[derive(Debug, Clone)]
pub struct ResourceEvent {
    /// The resource definition the event belongs to
    pub resource: Arc<ResourceDef>,
    /// Published snapshot at the time of the event
    pub snapshot: ResourceSnapshot,
    /// When the change was observed
    pub timestamp: DateTime<Utc>,
}

struct ResourceEntry {
    def: Arc<ResourceDef>,
    snapshot: ResourceSnapshot,
}

/// The notification hub: resource registry, snapshot store, and event stream
pub struct ResourceNotifier {
    entries: DashMap<String, ResourceEntry>,
    events: broadcast::Sender<ResourceEvent>,
}

impl ResourceNotifier {
    /// Create an empty hub
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: DashMap::new(),
            events,
        }
    }

    /// Register a resource definition with a default (not-started) snapshot
    pub fn register(&self, def: ResourceDef) -> Result<(), NotifyError> {
        match self.entries.entry(def.name().to_string()) {
            dashmap::Entry::Occupied(entry) => {
                Err(NotifyError::AlreadyRegistered(entry.key().clone()))
            }
            dashmap::Entry::Vacant(slot) => {
                slot.insert(ResourceEntry {
                    def: Arc::new(def),
                    snapshot: ResourceSnapshot::default(),
                });
                Ok(())
            }
        }
    }

    /// Subscribe to the resource-state-change stream.
    ///
    /// Every snapshot update published after this call is delivered, in
    /// order, to the returned receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.events.subscribe()
    }

    /// Current published snapshot of a resource
    pub fn snapshot(&self, name: &str) -> Option<ResourceSnapshot> {
        self.entries.get(name).map(|e| e.snapshot.clone())
    }

    /// Set the lifecycle state of a resource and publish the change
    pub fn set_state(&self, name: &str, state: ResourceState) -> Result<(), NotifyError> {
        self.update_snapshot(name, |snapshot| snapshot.state = state)
    }

    /// Atomically apply a transformation to a resource's snapshot and
    /// publish the result as one event.
    pub fn update_snapshot(
        &self,
        name: &str,
        update: impl FnOnce(&mut ResourceSnapshot),
    ) -> Result<(), NotifyError> {
        let mut entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| NotifyError::NotFound(name.to_string()))?;
        update(&mut entry.snapshot);
        let event = ResourceEvent {
            resource: entry.def.clone(),
            snapshot: entry.snapshot.clone(),
            timestamp: Utc::now(),
        };
        // Send while still holding the entry guard so per-resource event
        // order matches the order updates were applied. A send error only
        // means there are no subscribers right now.
        let _ = self.events.send(event);
        Ok(())
    }
}

impl Default for ResourceNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Seam through which the watcher publishes URL enrichments.
///
/// The hub implements it with an atomic append; tests implement it with a
/// call-counting mock.
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    /// Append URL entries to a resource's published sequence, preserving
    /// existing entries and their order, as a single atomic update.
    async fn append_urls(&self, resource: &str, urls: Vec<UrlSnapshot>)
        -> Result<(), NotifyError>;
}

#[async_trait]
impl SnapshotPublisher for ResourceNotifier {
    async fn append_urls(
        &self,
        resource: &str,
        urls: Vec<UrlSnapshot>,
    ) -> Result<(), NotifyError> {
        self.update_snapshot(resource, |snapshot| snapshot.urls.extend(urls))
    }
}
