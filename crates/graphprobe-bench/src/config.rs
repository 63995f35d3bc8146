//! Run configuration read from the environment.

use crate::provisioner::GroupSpec;
use crate::scenario::{
    RunPlan, DEFAULT_CONTAINER_NAME, DEFAULT_NESTED_GROUP, DEFAULT_UNSCOPED_GROUP,
};
use graphprobe_core::client::{
    ClientConfig, PollPolicy, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_MAX_WAIT_SECS,
};
use graphprobe_core::config::GraphEndpointConfig;
use graphprobe_directory::{
    AzureCliToken, ClientCredentials, GraphClient, StaticToken, TokenProvider,
};
use secrecy::{ExposeSecret, SecretString};
use std::env::VarError;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// How the run obtains Graph access tokens.
#[derive(Debug)]
pub enum CredentialSource {
    /// `GRAPH_ACCESS_TOKEN`
    AccessToken(SecretString),
    /// `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`
    ClientSecret {
        /// Application (client) id.
        client_id: String,
        /// Client secret.
        client_secret: SecretString,
    },
    /// Signed-in Azure CLI.
    AzureCli,
}

/// Everything the `graphprobe` binary needs to run.
#[derive(Debug)]
pub struct BenchConfig {
    /// Graph and login endpoints for the tenant.
    pub endpoint: GraphEndpointConfig,
    /// Token source.
    pub credentials: CredentialSource,
    /// Names of the objects to create.
    pub plan: RunPlan,
    /// Probe cadence and bounds.
    pub poll: PollPolicy,
    /// Log each HTTP exchange.
    pub log_exchanges: bool,
}

impl BenchConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`BenchConfig::from_reader`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// # Errors
    ///
    /// Returns an error if `AZURE_TENANT_ID` is missing, a variable is not
    /// unicode or fails to parse, the poll interval is zero or longer than the
    /// wait bound, or the resulting endpoint is invalid.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let tenant_id = optional(&reader, "AZURE_TENANT_ID")?
            .ok_or_else(|| ConfigError::MissingVar("AZURE_TENANT_ID".into()))?;

        let mut endpoint = GraphEndpointConfig::new(tenant_id)?;
        if let Some(url) = optional(&reader, "GRAPH_BASE_URL")? {
            endpoint = endpoint.with_graph_url(url);
        }
        if let Some(url) = optional(&reader, "AZURE_AUTHORITY_HOST")? {
            endpoint = endpoint.with_login_url(url);
        }
        if let Some(version) = optional(&reader, "GRAPH_API_VERSION")? {
            endpoint = endpoint.with_api_version(version);
        }
        endpoint = endpoint.with_tls_verify(parse_or(&reader, "GRAPHPROBE_TLS_VERIFY", true)?);
        endpoint.check()?;

        let credentials = if let Some(token) = optional(&reader, "GRAPH_ACCESS_TOKEN")? {
            CredentialSource::AccessToken(SecretString::from(token))
        } else if let Some(client_id) = optional(&reader, "AZURE_CLIENT_ID")? {
            let client_secret = optional(&reader, "AZURE_CLIENT_SECRET")?
                .ok_or_else(|| ConfigError::MissingVar("AZURE_CLIENT_SECRET".into()))?;
            CredentialSource::ClientSecret {
                client_id,
                client_secret: SecretString::from(client_secret),
            }
        } else {
            CredentialSource::AzureCli
        };

        let plan = RunPlan {
            container_name: optional(&reader, "GRAPHPROBE_CONTAINER_NAME")?
                .unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string()),
            unscoped_group: GroupSpec::mail_enabled_security(
                optional(&reader, "GRAPHPROBE_UNSCOPED_GROUP")?
                    .unwrap_or_else(|| DEFAULT_UNSCOPED_GROUP.to_string()),
            ),
            nested_group: GroupSpec::mail_enabled_security(
                optional(&reader, "GRAPHPROBE_NESTED_GROUP")?
                    .unwrap_or_else(|| DEFAULT_NESTED_GROUP.to_string()),
            ),
        };

        let interval: u64 = parse_or(
            &reader,
            "GRAPHPROBE_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        if interval == 0 {
            return Err(ConfigError::InvalidValue(
                "GRAPHPROBE_POLL_INTERVAL_SECS".into(),
                "must be at least 1".into(),
            ));
        }
        let max_attempts: u32 = parse_or(&reader, "GRAPHPROBE_MAX_ATTEMPTS", 0)?;
        let max_wait: u64 = parse_or(
            &reader,
            "GRAPHPROBE_MAX_WAIT_SECS",
            DEFAULT_POLL_MAX_WAIT_SECS,
        )?;
        if max_wait > 0 && interval > max_wait {
            return Err(ConfigError::InvalidValue(
                "GRAPHPROBE_POLL_INTERVAL_SECS".into(),
                format!("{interval} exceeds GRAPHPROBE_MAX_WAIT_SECS ({max_wait})"),
            ));
        }

        let mut poll = PollPolicy::unbounded().with_interval(Duration::from_secs(interval));
        if max_attempts > 0 {
            poll = poll.with_max_attempts(max_attempts);
        }
        if max_wait > 0 {
            poll = poll.with_max_wait(Duration::from_secs(max_wait));
        }

        let log_exchanges = parse_or(&reader, "GRAPHPROBE_LOG_EXCHANGES", true)?;

        Ok(Self {
            endpoint,
            credentials,
            plan,
            poll,
            log_exchanges,
        })
    }

    /// Builds the token provider selected by [`BenchConfig::credentials`].
    ///
    /// # Errors
    ///
    /// Returns an error if the client-credentials provider cannot be built.
    pub fn token_provider(&self) -> graphprobe_core::Result<Arc<dyn TokenProvider>> {
        let provider: Arc<dyn TokenProvider> = match &self.credentials {
            CredentialSource::AccessToken(token) => {
                Arc::new(StaticToken::new(token.expose_secret()))
            }
            CredentialSource::ClientSecret {
                client_id,
                client_secret,
            } => Arc::new(ClientCredentials::new(
                &self.endpoint,
                client_id.clone(),
                SecretString::from(client_secret.expose_secret().to_owned()),
            )?),
            CredentialSource::AzureCli => {
                Arc::new(AzureCliToken::new(Some(self.endpoint.tenant_id.clone())))
            }
        };
        Ok(provider)
    }

    /// Builds a Graph client for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token provider or HTTP client cannot be built.
    pub fn build_client(&self) -> graphprobe_core::Result<GraphClient> {
        GraphClient::builder(self.endpoint.clone())
            .with_http_config(
                ClientConfig::new()
                    .with_timeout(self.endpoint.timeout())
                    .with_exchange_logging(self.log_exchanges),
            )
            .with_token_provider(self.token_provider()?)
            .build()
    }
}

/// Reads a variable, treating unset and blank values alike.
fn optional<F>(reader: &F, key: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match reader(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue(
            key.into(),
            "not valid unicode".into(),
        )),
    }
}

fn parse_or<F, T>(reader: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(reader, key)? {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.into(), e.to_string())),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    /// A variable is set but unusable.
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// The Graph endpoint settings are invalid.
    #[error(transparent)]
    Endpoint(#[from] graphprobe_core::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_reader(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let owned: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| owned.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_missing_tenant_is_reported() {
        let err = BenchConfig::from_reader(make_reader(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref var) if var == "AZURE_TENANT_ID"));
    }

    #[test]
    fn test_defaults_match_reference_run() {
        let config = BenchConfig::from_reader(make_reader(&[("AZURE_TENANT_ID", "tenant-1")]))
            .unwrap();

        assert_eq!(config.plan, RunPlan::default());
        assert_eq!(config.plan.container_name, "Test AU");
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert_eq!(config.poll.max_attempts, None);
        assert_eq!(config.poll.max_wait, Some(Duration::from_secs(1800)));
        assert!(matches!(config.credentials, CredentialSource::AzureCli));
        assert!(config.log_exchanges);
        assert!(config.endpoint.tls_verify);
    }

    #[test]
    fn test_zero_disables_bounds() {
        let config = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("GRAPHPROBE_MAX_ATTEMPTS", "0"),
            ("GRAPHPROBE_MAX_WAIT_SECS", "0"),
        ]))
        .unwrap();
        assert!(!config.poll.is_bounded());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("GRAPH_BASE_URL", "http://127.0.0.1:8080"),
            ("AZURE_AUTHORITY_HOST", "http://127.0.0.1:8081"),
            ("GRAPH_API_VERSION", "beta"),
            ("GRAPHPROBE_TLS_VERIFY", "false"),
            ("GRAPHPROBE_CONTAINER_NAME", "Staging AU"),
            ("GRAPHPROBE_NESTED_GROUP", "StagingNested"),
            ("GRAPHPROBE_POLL_INTERVAL_SECS", "2"),
            ("GRAPHPROBE_MAX_ATTEMPTS", "10"),
            ("GRAPHPROBE_LOG_EXCHANGES", "false"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.graph_url, "http://127.0.0.1:8080");
        assert_eq!(config.endpoint.login_url, "http://127.0.0.1:8081");
        assert_eq!(config.endpoint.api_version, "beta");
        assert!(!config.endpoint.tls_verify);
        assert_eq!(config.plan.container_name, "Staging AU");
        assert_eq!(config.plan.nested_group.display_name(), "StagingNested");
        assert_eq!(config.plan.unscoped_group.display_name(), DEFAULT_UNSCOPED_GROUP);
        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.poll.max_attempts, Some(10));
        assert!(!config.log_exchanges);
    }

    #[test]
    fn test_invalid_interval_is_rejected() {
        for raw in ["soon", "0"] {
            let err = BenchConfig::from_reader(make_reader(&[
                ("AZURE_TENANT_ID", "tenant-1"),
                ("GRAPHPROBE_POLL_INTERVAL_SECS", raw),
            ]))
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue(ref var, _) if var == "GRAPHPROBE_POLL_INTERVAL_SECS"
            ));
        }
    }

    #[test]
    fn test_interval_longer_than_wait_bound_is_rejected() {
        let err = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("GRAPHPROBE_POLL_INTERVAL_SECS", "18446744073709551615"),
            ("GRAPHPROBE_MAX_WAIT_SECS", "60"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue(ref var, _) if var == "GRAPHPROBE_POLL_INTERVAL_SECS"
        ));

        let config = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("GRAPHPROBE_POLL_INTERVAL_SECS", "600"),
            ("GRAPHPROBE_MAX_WAIT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.poll.interval, Duration::from_secs(600));
    }

    #[test]
    fn test_non_unicode_value_is_invalid() {
        let reader = |key: &str| match key {
            "AZURE_TENANT_ID" => Ok("tenant-1".to_string()),
            "GRAPH_ACCESS_TOKEN" => Err(VarError::NotUnicode(std::ffi::OsString::from("tok"))),
            _ => Err(VarError::NotPresent),
        };
        let err = BenchConfig::from_reader(reader).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "GRAPH_ACCESS_TOKEN"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("GRAPH_ACCESS_TOKEN", ""),
            ("AZURE_CLIENT_ID", "  "),
            ("GRAPHPROBE_CONTAINER_NAME", ""),
            ("GRAPHPROBE_POLL_INTERVAL_SECS", " "),
        ]))
        .unwrap();
        assert!(matches!(config.credentials, CredentialSource::AzureCli));
        assert_eq!(config.plan.container_name, DEFAULT_CONTAINER_NAME);
        assert_eq!(config.poll.interval, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));

        let err = BenchConfig::from_reader(make_reader(&[("AZURE_TENANT_ID", " ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref var) if var == "AZURE_TENANT_ID"));
    }

    #[test]
    fn test_access_token_takes_precedence() {
        let config = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("GRAPH_ACCESS_TOKEN", "eyJ0eXAi"),
            ("AZURE_CLIENT_ID", "app-1"),
        ]))
        .unwrap();
        match config.credentials {
            CredentialSource::AccessToken(token) => assert_eq!(token.expose_secret(), "eyJ0eXAi"),
            other => panic!("unexpected credentials: {other:?}"),
        }
    }

    #[test]
    fn test_client_id_requires_secret() {
        let err = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("AZURE_CLIENT_ID", "app-1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref var) if var == "AZURE_CLIENT_SECRET"));
    }

    #[test]
    fn test_client_builds_for_static_token() {
        let config = BenchConfig::from_reader(make_reader(&[
            ("AZURE_TENANT_ID", "tenant-1"),
            ("GRAPH_ACCESS_TOKEN", "token"),
        ]))
        .unwrap();
        let client = config.build_client().unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://graph.microsoft.com/v1.0/"
        );
    }
}
