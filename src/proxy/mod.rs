//! Reverse-proxy configuration synthesis
//!
//! Maps a small logical description of backend services into the
//! route/cluster/destination records a proxy engine consumes. Synthesis is a
//! pure function of its input; see [`synth::synthesize`].

pub mod config;
pub mod synth;

pub use config::{
    ClusterConfig, DestinationConfig, ProxyBackend, ProxyRouting, RouteConfig, RouteMatch,
    RouteTransform, SynthesisError,
};
pub use synth::{cluster, cluster_id, destination_id, route, route_id, synthesize};
