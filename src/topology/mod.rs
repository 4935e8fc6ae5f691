//! Declarative topology files
//!
//! A topology file lists the resources the host process should register and
//! the logical proxy backends the gateway should front:
//!
//! ```json
//! {
//!   "resources": [
//!     { "name": "apiservice" },
//!     { "name": "webfrontend" },
//!     {
//!       "name": "gateway",
//!       "endpoints": ["https"],
//!       "proxyEndpoints": [
//!         { "name": "app-dev", "url": "https://app-dev.myapp.com" }
//!       ]
//!     }
//!   ],
//!   "backends": [
//!     { "clientName": "apiService", "path": "api" },
//!     { "clientName": "webFrontend", "path": "web" }
//!   ]
//! }
//! ```
//!
//! Files can be JSON or YAML, selected by extension. Parsing and validation
//! are pure; only [`load_topology_file`] touches the filesystem.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod endpoint;
pub mod resource;

pub use endpoint::{validate_endpoint_name, EndpointError, ProxyEndpoint, MAX_ENDPOINT_NAME_LEN};
pub use resource::{ResourceDef, ResourceSnapshot, ResourceState, UrlSnapshot};

/// Errors that can occur while loading or validating a topology
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Failed to parse topology: {0}")]
    ParseError(String),

    #[error("Unsupported topology file extension: {0}")]
    UnsupportedFormat(String),

    #[error("Duplicate resource name: '{0}'")]
    DuplicateResource(String),

    #[error("Invalid endpoint on resource '{resource}': {source}")]
    Endpoint {
        resource: String,
        #[source]
        source: EndpointError,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The complete topology file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    /// Resources to register with the notification hub
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,

    /// Logical backends the reverse proxy should front
    #[serde(default)]
    pub backends: Vec<BackendSpec>,
}

/// Declaration of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource name
    pub name: String,

    /// Native endpoint names
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Proxy endpoint annotations
    #[serde(default)]
    #[serde(rename = "proxyEndpoints")]
    pub proxy_endpoints: Vec<ProxyEndpointSpec>,
}

/// Declaration of one proxy endpoint annotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyEndpointSpec {
    /// Endpoint name
    pub name: String,
    /// Absolute external URL
    pub url: String,
}

/// Declaration of one reverse-proxy backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Service discovery name of the backend
    #[serde(rename = "clientName")]
    pub client_name: String,
    /// Public path prefix routed to this backend
    pub path: String,
}

// ============================================================================
// Pure parsing and validation (no I/O)
// ============================================================================

/// Parse a JSON topology string
pub fn parse_topology_json(content: &str) -> Result<Topology, TopologyError> {
    serde_json::from_str(content).map_err(|e| TopologyError::ParseError(e.to_string()))
}

/// Parse a YAML topology string
pub fn parse_topology_yaml(content: &str) -> Result<Topology, TopologyError> {
    serde_yaml::from_str(content).map_err(|e| TopologyError::ParseError(e.to_string()))
}

/// Validate a topology for consistency.
///
/// Endpoint-level validation (names, URLs, duplicates) happens in
/// [`Topology::build_resources`]; this pass only catches problems visible at
/// the file level.
pub fn validate_topology(topology: &Topology) -> Result<(), TopologyError> {
    let mut seen = std::collections::HashSet::new();
    for resource in &topology.resources {
        if !seen.insert(resource.name.to_ascii_lowercase()) {
            return Err(TopologyError::DuplicateResource(resource.name.clone()));
        }
    }
    Ok(())
}

impl Topology {
    /// Build validated resource definitions from the declarations.
    ///
    /// Runs every endpoint registration through the fail-fast builders, so a
    /// bad name, a malformed URL, or a duplicate endpoint surfaces here,
    /// before anything is registered or started.
    pub fn build_resources(&self) -> Result<Vec<ResourceDef>, TopologyError> {
        validate_topology(self)?;

        let mut defs = Vec::with_capacity(self.resources.len());
        for spec in &self.resources {
            let mut def = ResourceDef::new(&spec.name);
            for endpoint in &spec.endpoints {
                def = def
                    .with_endpoint(endpoint)
                    .map_err(|source| TopologyError::Endpoint {
                        resource: spec.name.clone(),
                        source,
                    })?;
            }
            for proxy in &spec.proxy_endpoints {
                def = def
                    .with_proxy_endpoint(&proxy.name, &proxy.url)
                    .map_err(|source| TopologyError::Endpoint {
                        resource: spec.name.clone(),
                        source,
                    })?;
            }
            defs.push(def);
        }
        Ok(defs)
    }
}

/// Load a topology from a JSON or YAML file
pub fn load_topology_file(path: &Path) -> Result<Topology, TopologyError> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_topology_json(&content),
        Some("yaml") | Some("yml") => parse_topology_yaml(&content),
        other => Err(TopologyError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}
