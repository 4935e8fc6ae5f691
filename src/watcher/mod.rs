//! Endpoint annotation watcher
//!
//! A single background task per process consumes the resource-state-change
//! stream and enriches running resources with the URLs declared by their
//! proxy endpoint annotations. Enrichment is best-effort developer-experience
//! metadata: a watcher failure is logged and the watcher stops, without
//! touching the host process or any resource.

pub mod endpoint_watcher;
pub mod lifecycle;

pub use endpoint_watcher::{missing_urls, EndpointUrlWatcher, WatchError};
pub use lifecycle::WatcherLifecycle;
