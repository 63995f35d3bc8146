//! Asynchronous Microsoft Graph client implementation.

use crate::auth::{StaticToken, TokenProvider};
use crate::directory::Directory;
use crate::models::{
    AdministrativeUnit, DirectoryResponse, Group, GroupSnapshot, NewAdministrativeUnit, NewGroup,
    Projection, ScopedNewGroup,
};
use crate::Result;
use async_trait::async_trait;
use graphprobe_core::client::ClientConfig;
use graphprobe_core::config::GraphEndpointConfig;
use graphprobe_core::ids::{AdministrativeUnitId, GroupId};
use graphprobe_core::query::ODataQuery;
use graphprobe_core::Error;
use reqwest::{Client, ClientBuilder, Method};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};
use url::Url;

const USER_AGENT: &str = concat!("graphprobe-directory/", env!("CARGO_PKG_VERSION"));

/// `OData` error envelope returned by Graph.
#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    code: String,
    message: String,
}

/// Builder for [`GraphClient`].
#[derive(Clone)]
pub struct GraphClientBuilder {
    endpoint: GraphEndpointConfig,
    http_config: ClientConfig,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl GraphClientBuilder {
    /// Create a builder for the given endpoint configuration.
    #[must_use]
    pub fn new(endpoint: GraphEndpointConfig) -> Self {
        let http_config = ClientConfig::new().with_timeout(endpoint.timeout());
        Self {
            endpoint,
            http_config,
            tokens: None,
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Use the given token source for every request.
    #[must_use]
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Use a fixed bearer token.
    #[must_use]
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        self.with_token_provider(Arc::new(StaticToken::new(token)))
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if no token source was configured, the
    /// endpoint is invalid or the HTTP client cannot be built.
    pub fn build(self) -> Result<GraphClient> {
        self.endpoint.check()?;
        let base_url = self.endpoint.graph_base_url()?;
        let tokens = self
            .tokens
            .ok_or_else(|| Error::ConfigError("No Graph token source configured".to_string()))?;

        let config = self.http_config;
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.idle_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .gzip(config.gzip);

        if !self.endpoint.tls_verify {
            warn!("TLS verification disabled for Graph client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build Graph HTTP client: {err}"))
        })?;

        Ok(GraphClient {
            http,
            base_url,
            tokens,
            log_exchanges: config.log_exchanges,
        })
    }
}

/// Asynchronous Microsoft Graph client.
#[derive(Clone)]
pub struct GraphClient {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
    log_exchanges: bool,
}

impl GraphClient {
    /// Start a builder for the given endpoint configuration.
    #[must_use]
    pub fn builder(endpoint: GraphEndpointConfig) -> GraphClientBuilder {
        GraphClientBuilder::new(endpoint)
    }

    /// Return the versioned base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create an administrative unit.
    pub async fn create_administrative_unit(
        &self,
        unit: &NewAdministrativeUnit,
    ) -> Result<DirectoryResponse<AdministrativeUnit>> {
        self.send_json(Method::POST, "directory/administrativeUnits", Some(unit), &[])
            .await
    }

    /// Create a top-level group.
    pub async fn create_group(&self, group: &NewGroup) -> Result<DirectoryResponse<Group>> {
        self.send_json(Method::POST, "groups", Some(group), &[])
            .await
    }

    /// Create a group as a member of an administrative unit.
    pub async fn create_group_in_administrative_unit(
        &self,
        unit: AdministrativeUnitId,
        group: &NewGroup,
    ) -> Result<DirectoryResponse<Group>> {
        let path = format!("directory/administrativeUnits/{unit}/members");
        self.send_json(Method::POST, &path, Some(&ScopedNewGroup::new(group)), &[])
            .await
    }

    /// Fetch a group restricted to the projection's properties.
    pub async fn get_group(
        &self,
        id: GroupId,
        projection: Projection,
    ) -> Result<DirectoryResponse<GroupSnapshot>> {
        let path = format!("groups/{id}");
        let query = ODataQuery::new().select(projection.fields());
        self.send_json::<(), GroupSnapshot>(Method::GET, &path, None, &query.into_pairs())
            .await
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid Graph path `{path}`: {err}")))
    }

    async fn send_json<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        params: &[(&'static str, String)],
    ) -> Result<DirectoryResponse<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.build_url(path)?;
        let token = self.tokens.access_token().await?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token.expose_secret())
            .header("Accept", "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(Error::from)?;
        let status = response.status();

        if self.log_exchanges {
            debug!(
                %method,
                url = %response.url(),
                status = status.as_u16(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Graph exchange"
            );
        }

        let text = response.text().await.map_err(Error::from)?;
        if self.log_exchanges {
            trace!(body = %text, "Graph response body");
        }

        if !status.is_success() {
            return Err(Error::from_status(status, odata_message(&text)));
        }

        let resource = serde_json::from_str::<R>(&text).map_err(|err| {
            Error::ParseError(format!("Failed to parse Graph response for `{path}`: {err}"))
        })?;

        Ok(DirectoryResponse::new(status, resource))
    }
}

#[async_trait]
impl Directory for GraphClient {
    async fn create_administrative_unit(
        &self,
        unit: &NewAdministrativeUnit,
    ) -> Result<DirectoryResponse<AdministrativeUnit>> {
        GraphClient::create_administrative_unit(self, unit).await
    }

    async fn create_group(
        &self,
        group: &NewGroup,
        container: Option<AdministrativeUnitId>,
    ) -> Result<DirectoryResponse<Group>> {
        match container {
            Some(unit) => self.create_group_in_administrative_unit(unit, group).await,
            None => GraphClient::create_group(self, group).await,
        }
    }

    async fn get_group(
        &self,
        id: GroupId,
        projection: Projection,
    ) -> Result<DirectoryResponse<GroupSnapshot>> {
        GraphClient::get_group(self, id, projection).await
    }
}

/// Extracts `code: message` from an `OData` error body, falling back to the raw
/// text when the body is not an `OData` envelope.
fn odata_message(body: &str) -> String {
    match serde_json::from_str::<ODataError>(body) {
        Ok(odata) => format!("{}: {}", odata.error.code, odata.error.message),
        Err(_) if body.is_empty() => "empty response body".to_string(),
        Err(_) => body.to_string(),
    }
}
