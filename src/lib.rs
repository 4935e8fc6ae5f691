//! # gatelink
//!
//! Reverse-proxy wiring and endpoint URL enrichment for service topologies.
//!
//! Two capabilities on top of a multi-service orchestration model:
//!
//! 1. **Proxy config synthesis** ([`proxy`]): a pure, deterministic mapping
//!    from logical backend descriptors to route/cluster/destination records
//!    consumable by a reverse-proxy engine.
//! 2. **Endpoint URL enrichment** ([`watcher`]): a background task that
//!    observes resource state changes and, once a resource is running,
//!    merges the external URLs declared by its proxy endpoint annotations
//!    into the resource's published snapshot.
//!
//! [`topology`] holds the declarative side (resources, annotations, topology
//! files) and [`notify`] the in-memory notification hub that connects the
//! two at runtime.

pub mod cli;
pub mod notify;
pub mod proxy;
pub mod topology;
pub mod watcher;
