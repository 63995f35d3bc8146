//! Access token sources for Microsoft Graph.
//!
//! The client only needs a bearer token per request; where the token comes
//! from is pluggable through [`TokenProvider`].

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use graphprobe_core::client::TOKEN_DEFAULT_TIMEOUT;
use graphprobe_core::config::GraphEndpointConfig;
use graphprobe_core::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

/// Lifetime assumed for CLI tokens that do not report an expiry.
const CLI_FALLBACK_LIFETIME_MINS: i64 = 10;

/// Source of bearer tokens for Graph requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token valid for at least the next request.
    async fn access_token(&self) -> Result<SecretString>;
}

/// A pre-acquired bearer token.
pub struct StaticToken {
    token: SecretString,
}

impl StaticToken {
    /// Wraps an existing token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<SecretString> {
        Ok(SecretString::from(self.token.expose_secret().to_owned()))
    }
}

struct CachedToken {
    access_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Cached token with refresh-before-expiry.
struct TokenSlot {
    cached: RwLock<Option<CachedToken>>,
    grace_period: Duration,
}

impl TokenSlot {
    fn new() -> Self {
        Self {
            cached: RwLock::new(None),
            grace_period: Duration::minutes(5),
        }
    }

    async fn fresh(&self) -> Option<SecretString> {
        let cache = self.cached.read().await;
        cache
            .as_ref()
            .filter(|token| !token.is_expired(self.grace_period))
            .map(|token| SecretString::from(token.access_token.expose_secret().to_owned()))
    }

    async fn store(&self, token: CachedToken) -> SecretString {
        let exposed = SecretString::from(token.access_token.expose_secret().to_owned());
        *self.cached.write().await = Some(token);
        exposed
    }

    async fn clear(&self) {
        *self.cached.write().await = None;
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// OAuth2 client-credentials flow against the identity platform.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: SecretString,
    scope: String,
    slot: TokenSlot,
}

impl ClientCredentials {
    /// Creates a token source for an application registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(
        endpoint: &GraphEndpointConfig,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TOKEN_DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build token HTTP client: {e}")))?;

        Ok(Self {
            http,
            token_url: endpoint.token_url()?,
            client_id: client_id.into(),
            client_secret,
            scope: endpoint.default_scope(),
            slot: TokenSlot::new(),
        })
    }

    /// Drops the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        self.slot.clear().await;
    }

    #[instrument(skip(self), fields(client_id = %self.client_id))]
    async fn acquire(&self) -> Result<CachedToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::AuthError(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AuthError(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::AuthError(format!("Failed to parse token response: {e}")))?;

        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        debug!(%expires_at, "acquired client credentials token");

        Ok(CachedToken {
            access_token: SecretString::from(token.access_token),
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn access_token(&self) -> Result<SecretString> {
        if let Some(token) = self.slot.fresh().await {
            return Ok(token);
        }
        let token = self.acquire().await?;
        Ok(self.slot.store(token).await)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

/// Token source backed by a signed-in Azure CLI (`az account get-access-token`).
pub struct AzureCliToken {
    tenant_id: Option<String>,
    slot: TokenSlot,
}

impl AzureCliToken {
    /// Uses the CLI's current account, scoped to `tenant_id` when given.
    #[must_use]
    pub fn new(tenant_id: Option<String>) -> Self {
        Self {
            tenant_id,
            slot: TokenSlot::new(),
        }
    }

    #[instrument(skip(self))]
    async fn acquire(&self) -> Result<CachedToken> {
        let mut command = Command::new("az");
        command.args([
            "account",
            "get-access-token",
            "--resource-type",
            "ms-graph",
            "--output",
            "json",
        ]);
        if let Some(tenant_id) = &self.tenant_id {
            command.args(["--tenant", tenant_id]);
        }

        let output = command
            .output()
            .await
            .map_err(|e| Error::AuthError(format!("Failed to run Azure CLI: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::AuthError(format!(
                "Azure CLI exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let token = parse_cli_token(&output.stdout)?;
        debug!(expires_at = %token.expires_at, "acquired Azure CLI token");
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for AzureCliToken {
    async fn access_token(&self) -> Result<SecretString> {
        if let Some(token) = self.slot.fresh().await {
            return Ok(token);
        }
        let token = self.acquire().await?;
        Ok(self.slot.store(token).await)
    }
}

fn parse_cli_token(stdout: &[u8]) -> Result<CachedToken> {
    let response: CliTokenResponse = serde_json::from_slice(stdout)
        .map_err(|e| Error::AuthError(format!("Failed to parse Azure CLI token: {e}")))?;

    let expires_at = response
        .expires_on
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(|| Utc::now() + Duration::minutes(CLI_FALLBACK_LIFETIME_MINS));

    Ok(CachedToken {
        access_token: SecretString::from(response.access_token),
        expires_at,
    })
}
