//! Reverse-proxy record types
//!
//! These are the stateless projections consumed by a proxy engine: routes
//! (match + transforms), clusters, and destinations. They are regenerated on
//! every synthesis call and never mutated independently.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while describing proxy backends
#[derive(Error, Debug, PartialEq)]
pub enum SynthesisError {
    #[error("Backend client name cannot be empty")]
    EmptyClientName,
}

/// Logical descriptor of one backend fronted by the proxy.
///
/// The backend address is derived from the client name, which doubles as the
/// service discovery name, so the same descriptor works wherever the backend
/// is actually resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyBackend {
    client_name: String,
    backend_url: String,
    path: String,
}

impl ProxyBackend {
    /// Create a backend descriptor for a discovery name and public path prefix
    pub fn new(
        client_name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, SynthesisError> {
        let client_name = client_name.into();
        if client_name.is_empty() {
            return Err(SynthesisError::EmptyClientName);
        }
        Ok(Self {
            backend_url: format!("http://{}", client_name),
            client_name,
            path: path.into(),
        })
    }

    /// Service discovery name of the backend
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Canonical backend address
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// Public path prefix routed to this backend
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Path match for a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    /// Match pattern: normalized prefix plus a catch-all segment
    pub path: String,
}

/// A request transform applied before forwarding to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RouteTransform {
    /// Strip the given prefix from the request path, so the backend sees
    /// requests rooted at `/`
    PathRemovePrefix(String),
}

/// One routing rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// Deterministic route identifier (`route-{client}`)
    pub route_id: String,
    /// Cluster this route forwards to (`cluster-{client}`)
    pub cluster_id: String,
    /// Request match
    #[serde(rename = "match")]
    pub route_match: RouteMatch,
    /// Transforms applied to matched requests
    pub transforms: Vec<RouteTransform>,
}

/// A concrete backend address inside a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationConfig {
    /// Backend address
    pub address: String,
}

/// A backend group with its destinations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Deterministic cluster identifier (`cluster-{client}`)
    pub cluster_id: String,
    /// Destinations keyed by destination id (`dest-{client}`)
    pub destinations: BTreeMap<String, DestinationConfig>,
}

/// The full synthesized routing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyRouting {
    /// Routes, one per backend, in input order
    pub routes: Vec<RouteConfig>,
    /// Clusters, one per backend, in input order
    pub clusters: Vec<ClusterConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_derives_address() {
        let backend = ProxyBackend::new("apiService", "api").unwrap();
        assert_eq!(backend.client_name(), "apiService");
        assert_eq!(backend.backend_url(), "http://apiService");
        assert_eq!(backend.path(), "api");
    }

    #[test]
    fn test_empty_client_name_rejected() {
        assert_eq!(
            ProxyBackend::new("", "api").unwrap_err(),
            SynthesisError::EmptyClientName
        );
    }

    #[test]
    fn test_transform_serialization_shape() {
        let transform = RouteTransform::PathRemovePrefix("/api".to_string());
        assert_eq!(
            serde_json::to_string(&transform).unwrap(),
            r#"{"PathRemovePrefix":"/api"}"#
        );
    }
}
