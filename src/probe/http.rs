//! HTTP reachability probe.
//!
//! Issues a GET to the configured URI and passes when the response status is
//! 2xx. The outcome message is the status reason phrase, so the debug report
//! reads e.g. `Upstream: Service Unavailable`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::{ConfigError, ProbeError};

use super::{validate_name, Probe, ProbeOutcome};

/// User agent sent with every HTTP check
pub const USER_AGENT: &str = concat!("vigil-healthcheck/", env!("CARGO_PKG_VERSION"));

/// Basic auth credentials for an HTTP check.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

pub struct HttpProbe {
    name: String,
    uri: Url,
    credentials: Option<Credentials>,
    client: Client,
}

impl HttpProbe {
    pub fn new(
        name: impl Into<String>,
        uri: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, ConfigError> {
        let name = validate_name(name)?;
        let uri = Url::parse(uri).map_err(|e| ConfigError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let client = Self::client_builder()
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            name,
            uri,
            credentials,
            client,
        })
    }

    /// Bound each request by `timeout`, independent of the aggregate timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::Validation(format!(
                "HTTP check '{}' timeout must be greater than zero",
                self.name
            )));
        }
        self.client = Self::client_builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(self)
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    fn client_builder() -> reqwest::ClientBuilder {
        Client::builder().user_agent(USER_AGENT)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let mut request = self.client.get(self.uri.clone());
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or(status.as_str());

        tracing::trace!(probe = %self.name, uri = %self.uri, status = status.as_u16(), "HTTP check response");

        Ok(ProbeOutcome::new(reason, !status.is_success()))
    }
}
