//! Endpoint configuration for Microsoft Graph.
//!
//! This module provides the tenant and endpoint settings used to reach the
//! directory, including validation of URLs and timeouts.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default Microsoft Graph endpoint (global cloud).
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com";

/// Default Microsoft identity platform endpoint (global cloud).
pub const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com";

/// Default Graph API version.
pub const DEFAULT_API_VERSION: &str = "v1.0";

/// Configuration for reaching a tenant's directory.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GraphEndpointConfig {
    /// Directory tenant identifier
    #[validate(length(min = 1))]
    pub tenant_id: String,

    /// Graph base URL, without the API version
    #[validate(url)]
    #[serde(default = "default_graph_url")]
    pub graph_url: String,

    /// Identity platform base URL used for token requests
    #[validate(url)]
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Graph API version segment
    #[validate(length(min = 1))]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_tls_verify() -> bool {
    true
}

impl GraphEndpointConfig {
    /// Create a configuration for the given tenant using global-cloud endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant id is empty.
    pub fn new(tenant_id: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            tenant_id: tenant_id.into(),
            graph_url: default_graph_url(),
            login_url: default_login_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
        };

        config.check()?;
        Ok(config)
    }

    /// Set the Graph base URL.
    #[must_use]
    pub fn with_graph_url(mut self, url: impl Into<String>) -> Self {
        self.graph_url = url.into();
        self
    }

    /// Set the identity platform base URL.
    #[must_use]
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Set the Graph API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Validate the configuration after builder overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] listing the invalid fields.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()?;
        Ok(())
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Versioned Graph base URL, always ending in `/` so relative paths join
    /// beneath it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn graph_base_url(&self) -> Result<Url, Error> {
        let base = format!(
            "{}/{}/",
            self.graph_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        );
        Ok(Url::parse(&base)?)
    }

    /// OAuth2 token endpoint for the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn token_url(&self) -> Result<Url, Error> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_url.trim_end_matches('/'),
            self.tenant_id
        );
        Ok(Url::parse(&url)?)
    }

    /// OAuth2 scope requesting the application's Graph permissions.
    #[must_use]
    pub fn default_scope(&self) -> String {
        format!("{}/.default", self.graph_url.trim_end_matches('/'))
    }
}
