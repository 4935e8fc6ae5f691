//! Resource definitions and published snapshots
//!
//! A [`ResourceDef`] describes one unit of the orchestration model: its name,
//! its native endpoints, and any proxy endpoint annotations attached to it.
//! The published side is a [`ResourceSnapshot`]: the current lifecycle state
//! plus the ordered list of URLs exposed to downstream consumers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::endpoint::{validate_endpoint_name, EndpointError, ProxyEndpoint};

/// Lifecycle state of a resource as reported by the orchestrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceState {
    /// Resource is declared but has not been started
    #[default]
    NotStarted,
    /// Resource is starting up
    Starting,
    /// Resource is running and considered stable
    Running,
    /// Resource has stopped
    Stopped,
    /// Resource failed to start or crashed
    Failed,
}

/// One published URL on a resource snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSnapshot {
    /// Endpoint name the URL belongs to
    pub name: String,
    /// The address itself
    pub url: String,
    /// Internal URLs are hidden from external consumers
    pub is_internal: bool,
}

/// The current observable published state of a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Current lifecycle state
    pub state: ResourceState,
    /// Exposed URLs, in publication order
    pub urls: Vec<UrlSnapshot>,
}

/// A resource definition with its endpoint registrations.
///
/// Native endpoints and proxy endpoint annotations share one per-resource
/// namespace: every registration is checked case-insensitively against a
/// single reserved-name index, so a collision between the two kinds is
/// caught at definition time.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    name: String,
    endpoints: Vec<String>,
    proxy_endpoints: Vec<ProxyEndpoint>,
    reserved_names: HashSet<String>,
}

impl ResourceDef {
    /// Create a resource definition with no endpoints
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoints: Vec::new(),
            proxy_endpoints: Vec::new(),
            reserved_names: HashSet::new(),
        }
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native endpoint names registered on this resource
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Proxy endpoint annotations attached to this resource
    pub fn proxy_endpoints(&self) -> &[ProxyEndpoint] {
        &self.proxy_endpoints
    }

    /// Register a native endpoint name
    pub fn with_endpoint(mut self, name: impl Into<String>) -> Result<Self, EndpointError> {
        let name = name.into();
        validate_endpoint_name(&name)?;
        self.reserve(&name)?;
        self.endpoints.push(name);
        Ok(self)
    }

    /// Attach a proxy endpoint annotation.
    ///
    /// Fails if the name or URL is invalid, or if the name collides
    /// (case-insensitively) with any endpoint already on this resource.
    pub fn with_proxy_endpoint(
        mut self,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, EndpointError> {
        let endpoint = ProxyEndpoint::new(name, url)?;
        self.reserve(endpoint.name())?;
        self.proxy_endpoints.push(endpoint);
        Ok(self)
    }

    fn reserve(&mut self, name: &str) -> Result<(), EndpointError> {
        if !self.reserved_names.insert(name.to_ascii_lowercase()) {
            return Err(EndpointError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_builder() {
        let resource = ResourceDef::new("gateway")
            .with_endpoint("https")
            .unwrap()
            .with_proxy_endpoint("app-dev", "https://app-dev.myapp.com")
            .unwrap();

        assert_eq!(resource.name(), "gateway");
        assert_eq!(resource.endpoints(), ["https"]);
        assert_eq!(resource.proxy_endpoints().len(), 1);
        assert_eq!(resource.proxy_endpoints()[0].name(), "app-dev");
    }

    #[test]
    fn test_duplicate_annotation_rejected() {
        let err = ResourceDef::new("gateway")
            .with_proxy_endpoint("api", "http://one.example.com")
            .unwrap()
            .with_proxy_endpoint("api", "http://two.example.com")
            .unwrap_err();

        assert_eq!(err, EndpointError::DuplicateName("api".to_string()));
    }

    #[test]
    fn test_annotation_collides_with_native_endpoint() {
        let err = ResourceDef::new("gateway")
            .with_endpoint("https")
            .unwrap()
            .with_proxy_endpoint("https", "https://app.myapp.com")
            .unwrap_err();

        assert_eq!(err, EndpointError::DuplicateName("https".to_string()));
    }

    #[test]
    fn test_duplicate_check_is_case_insensitive() {
        let err = ResourceDef::new("gateway")
            .with_proxy_endpoint("App-Dev", "https://one.myapp.com")
            .unwrap()
            .with_proxy_endpoint("app-dev", "https://two.myapp.com")
            .unwrap_err();

        assert_eq!(err, EndpointError::DuplicateName("app-dev".to_string()));
    }

    #[test]
    fn test_invalid_registration_leaves_nothing_behind() {
        let resource = ResourceDef::new("gateway");
        assert!(resource
            .clone()
            .with_proxy_endpoint("bad name", "http://x.example.com")
            .is_err());
        assert!(resource.proxy_endpoints().is_empty());
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot = ResourceSnapshot::default();
        assert_eq!(snapshot.state, ResourceState::NotStarted);
        assert!(snapshot.urls.is_empty());
    }

    #[test]
    fn test_state_serialization_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ResourceState::NotStarted).unwrap(),
            "\"not-started\""
        );
        assert_eq!(
            serde_json::to_string(&ResourceState::Running).unwrap(),
            "\"running\""
        );
    }
}
