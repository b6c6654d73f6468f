//! Probes: named units of work that report pass/fail plus a message.
//!
//! Every probe implements [`Probe`]. Concrete probes cover HTTP reachability,
//! ICMP ping, SQL connectivity and arbitrary async closures. [`CachedProbe`]
//! is itself a probe that decorates another one with a TTL cache, attached
//! through [`ProbeExt::with_cache`].

mod cached;
mod delegate;
mod http;
mod ping;
mod sql;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{CacheSettings, ProbeConfig};
use crate::error::{ConfigError, ProbeError};

pub use self::cached::CachedProbe;
pub use self::delegate::DelegateProbe;
pub use self::http::{Credentials, HttpProbe, USER_AGENT};
pub use self::ping::PingProbe;
pub use self::sql::SqlProbe;

/// Message used when a passing outcome is created without one
pub const DEFAULT_PASSED_MESSAGE: &str = "Success";

/// Message used when a failing outcome is created without one
pub const DEFAULT_FAILED_MESSAGE: &str = "Failed";

/// The result of a single check: a message and whether it failed.
///
/// The message is never empty; constructors substitute
/// [`DEFAULT_PASSED_MESSAGE`] or [`DEFAULT_FAILED_MESSAGE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    message: String,
    failed: bool,
}

impl ProbeOutcome {
    pub fn new(message: impl Into<String>, failed: bool) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            Self::default_message(failed).to_string()
        } else {
            message
        };
        Self { message, failed }
    }

    pub fn passed() -> Self {
        Self::new(DEFAULT_PASSED_MESSAGE, false)
    }

    pub fn passed_with(message: impl Into<String>) -> Self {
        Self::new(message, false)
    }

    pub fn failed() -> Self {
        Self::new(DEFAULT_FAILED_MESSAGE, true)
    }

    pub fn failed_with(message: impl Into<String>) -> Self {
        Self::new(message, true)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    fn default_message(failed: bool) -> &'static str {
        if failed {
            DEFAULT_FAILED_MESSAGE
        } else {
            DEFAULT_PASSED_MESSAGE
        }
    }
}

impl From<ProbeError> for ProbeOutcome {
    fn from(error: ProbeError) -> Self {
        ProbeOutcome::failed_with(error.to_string())
    }
}

/// A named liveness check.
///
/// `check` may perform network I/O and may fail; the engine turns failures
/// into failed outcomes so one broken probe never aborts the others.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> Result<ProbeOutcome, ProbeError>;
}

/// Combinators available on every probe.
pub trait ProbeExt: Probe + Sized + 'static {
    /// Cache this probe's outcome for `ttl`.
    ///
    /// Failed outcomes are re-checked on the next call unless
    /// `cache_failures` is set.
    fn with_cache(self, ttl: Duration, cache_failures: bool) -> CachedProbe {
        CachedProbe::new(Box::new(self), ttl, cache_failures)
    }
}

impl<P: Probe + 'static> ProbeExt for P {}

/// Validate a probe name at construction time.
pub(crate) fn validate_name(name: impl Into<String>) -> Result<String, ConfigError> {
    let name = name.into();
    if name.is_empty() {
        return Err(ConfigError::EmptyName);
    }
    Ok(name)
}

/// Build a probe from its config entry, wrapping it in a cache if configured.
pub fn from_config(config: &ProbeConfig) -> Result<Arc<dyn Probe>, ConfigError> {
    let probe = match config {
        ProbeConfig::Http(http) => {
            let credentials = http.username.as_ref().map(|username| Credentials {
                username: username.clone(),
                password: http.password.clone(),
            });
            let mut probe = HttpProbe::new(http.name.clone(), &http.uri, credentials)?;
            if let Some(secs) = http.timeout_seconds {
                probe = probe.with_timeout(Duration::from_secs(secs))?;
            }
            finish(probe, http.cache.as_ref())
        }
        ProbeConfig::Ping(ping) => {
            let probe = PingProbe::new(
                ping.name.clone(),
                ping.host.clone(),
                Duration::from_secs(ping.timeout_seconds),
            )?;
            finish(probe, ping.cache.as_ref())
        }
        ProbeConfig::Sql(sql) => {
            let probe = SqlProbe::new(sql.name.clone(), sql.connection_string.clone())?;
            finish(probe, sql.cache.as_ref())
        }
    };

    tracing::debug!(
        probe = %probe.name(),
        kind = config.kind(),
        cached = config.cache().is_some(),
        "Probe configured"
    );

    Ok(probe)
}

fn finish<P: Probe + 'static>(probe: P, cache: Option<&CacheSettings>) -> Arc<dyn Probe> {
    match cache {
        Some(cache) => Arc::new(probe.with_cache(cache.ttl(), cache.cache_failures)),
        None => Arc::new(probe),
    }
}
