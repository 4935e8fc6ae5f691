//! Proxy endpoint annotations
//!
//! A [`ProxyEndpoint`] attaches a named, externally-reachable URL alias to a
//! resource definition. Validation happens at construction time so a bad
//! name or URL is rejected before the topology ever starts.

use regex::Regex;
use thiserror::Error;
use url::Url;

/// Maximum length of an endpoint name.
pub const MAX_ENDPOINT_NAME_LEN: usize = 63;

/// Errors raised while registering endpoints on a resource
#[derive(Error, Debug, PartialEq)]
pub enum EndpointError {
    #[error("Invalid endpoint name '{0}': must be non-empty, at most 63 characters, and contain only letters, digits, and '-'")]
    InvalidName(String),

    #[error("'{0}' is not an absolute URL")]
    InvalidUrl(String),

    #[error("Endpoint with name '{0}' already exists")]
    DuplicateName(String),
}

/// A named external URL alias for a resource.
///
/// Immutable once constructed; both fields are validated by [`ProxyEndpoint::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    name: String,
    url: String,
}

impl ProxyEndpoint {
    /// Create a new proxy endpoint, validating the name and URL.
    ///
    /// The name must satisfy the same syntax rules as native endpoint names
    /// so annotations can share the per-resource endpoint namespace. The URL
    /// must be absolute (scheme and host present).
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self, EndpointError> {
        let name = name.into();
        let url = url.into();

        validate_endpoint_name(&name)?;

        let parsed = Url::parse(&url).map_err(|_| EndpointError::InvalidUrl(url.clone()))?;
        if !parsed.has_host() {
            return Err(EndpointError::InvalidUrl(url));
        }

        Ok(Self { name, url })
    }

    /// The logical endpoint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The absolute URL this endpoint resolves to
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Validate an endpoint name against the platform naming rules.
///
/// Used for native endpoints and proxy endpoint annotations alike, since
/// both live in the same per-resource namespace.
pub fn validate_endpoint_name(name: &str) -> Result<(), EndpointError> {
    let pattern = Regex::new(r"^[A-Za-z0-9-]+$").unwrap();
    if name.is_empty() || name.len() > MAX_ENDPOINT_NAME_LEN || !pattern.is_match(name) {
        return Err(EndpointError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_endpoint() {
        let ep = ProxyEndpoint::new("app-dev", "https://app-dev.myapp.com").unwrap();
        assert_eq!(ep.name(), "app-dev");
        assert_eq!(ep.url(), "https://app-dev.myapp.com");
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ProxyEndpoint::new("", "http://x").unwrap_err();
        assert_eq!(err, EndpointError::InvalidName(String::new()));
    }

    #[test]
    fn test_bad_characters_rejected() {
        assert!(ProxyEndpoint::new("app_dev", "http://x").is_err());
        assert!(ProxyEndpoint::new("app dev", "http://x").is_err());
        assert!(ProxyEndpoint::new("app.dev", "http://x").is_err());
    }

    #[test]
    fn test_overlong_name_rejected() {
        let name = "a".repeat(MAX_ENDPOINT_NAME_LEN + 1);
        assert_eq!(
            validate_endpoint_name(&name),
            Err(EndpointError::InvalidName(name))
        );
        assert!(validate_endpoint_name(&"a".repeat(MAX_ENDPOINT_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_relative_url_rejected() {
        let err = ProxyEndpoint::new("api", "not-a-url").unwrap_err();
        assert_eq!(err, EndpointError::InvalidUrl("not-a-url".to_string()));

        assert!(ProxyEndpoint::new("api", "/relative/path").is_err());
    }

    #[test]
    fn test_hostless_url_rejected() {
        // Parses as a URL but carries no host, so it is not reachable.
        assert!(ProxyEndpoint::new("api", "mailto:dev@myapp.com").is_err());
    }
}
