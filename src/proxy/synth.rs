//! Reverse-proxy configuration synthesis
//!
//! Pure projection of [`ProxyBackend`] descriptors into routes and clusters.
//! Identifiers are deterministic (`route-`, `cluster-`, `dest-` plus the
//! client name) because downstream consumers join the two sequences on them.
//! Calling [`synthesize`] twice with the same input yields identical output;
//! no I/O happens here.

use std::collections::BTreeMap;

use super::config::{
    ClusterConfig, DestinationConfig, ProxyBackend, ProxyRouting, RouteConfig, RouteMatch,
    RouteTransform,
};

const CATCHALL_SEGMENT: &str = "{**catchall}";

/// Route identifier for a backend
pub fn route_id(backend: &ProxyBackend) -> String {
    format!("route-{}", backend.client_name())
}

/// Cluster identifier for a backend
pub fn cluster_id(backend: &ProxyBackend) -> String {
    format!("cluster-{}", backend.client_name())
}

/// Destination identifier for a backend
pub fn destination_id(backend: &ProxyBackend) -> String {
    format!("dest-{}", backend.client_name())
}

/// Normalize a public path prefix for matching: trailing `/` trimmed, leading
/// `/` ensured. The root path normalizes to the empty prefix.
fn match_prefix(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Build the route for one backend
pub fn route(backend: &ProxyBackend) -> RouteConfig {
    let prefix = match_prefix(backend.path());
    RouteConfig {
        route_id: route_id(backend),
        cluster_id: cluster_id(backend),
        route_match: RouteMatch {
            path: format!("{}/{}", prefix, CATCHALL_SEGMENT),
        },
        transforms: vec![RouteTransform::PathRemovePrefix(prefix)],
    }
}

/// Build the cluster for one backend, with its single destination
pub fn cluster(backend: &ProxyBackend) -> ClusterConfig {
    let mut destinations = BTreeMap::new();
    destinations.insert(
        destination_id(backend),
        DestinationConfig {
            address: backend.backend_url().to_string(),
        },
    );
    ClusterConfig {
        cluster_id: cluster_id(backend),
        destinations,
    }
}

/// Synthesize the full routing table from an ordered list of backends.
///
/// One route and one cluster per descriptor, in input order. An empty input
/// produces empty sequences. Duplicate client names produce colliding ids;
/// uniqueness is the caller's responsibility.
pub fn synthesize(backends: &[ProxyBackend]) -> ProxyRouting {
    ProxyRouting {
        routes: backends.iter().map(route).collect(),
        clusters: backends.iter().map(cluster).collect(),
    }
}

impl RouteConfig {
    /// Whether a request path matches this route's prefix + catch-all pattern
    pub fn matches(&self, request_path: &str) -> bool {
        let prefix = self
            .route_match
            .path
            .strip_suffix(CATCHALL_SEGMENT)
            .map(|p| p.trim_end_matches('/'))
            .unwrap_or(&self.route_match.path);

        prefix.is_empty()
            || request_path == prefix
            || request_path.starts_with(&format!("{}/", prefix))
    }

    /// Apply this route's transforms to a matched request path, yielding the
    /// outbound path the backend sees. Returns `None` if the path does not
    /// match the route.
    pub fn rewrite(&self, request_path: &str) -> Option<String> {
        if !self.matches(request_path) {
            return None;
        }
        let mut path = request_path.to_string();
        for transform in &self.transforms {
            path = transform.apply(&path);
        }
        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }
}

impl RouteTransform {
    fn apply(&self, path: &str) -> String {
        match self {
            RouteTransform::PathRemovePrefix(prefix) => {
                if prefix.is_empty() {
                    path.to_string()
                } else {
                    path.strip_prefix(prefix.as_str())
                        .unwrap_or(path)
                        .to_string()
                }
            }
        }
    }
}
