//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file. `AppConfig` is the root
//! configuration struct: the HTTP listener, the health endpoint (mount path,
//! aggregate timeout, report format), the ordered list of probes with their
//! optional cache policy, and logging.
//!
//! ```toml
//! [http]
//! host = "0.0.0.0"
//! port = 3333
//!
//! [health]
//! mount_path = "/healthcheck"
//! timeout_seconds = 30
//! format = "text"
//!
//! [[probe]]
//! kind = "http"
//! name = "Google Check"
//! uri = "https://www.google.com"
//!
//! [probe.cache]
//! ttl_seconds = 60
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub use crate::error::ConfigError;

// =============================================================================
// Health Endpoint Defaults
// =============================================================================

/// Path the health endpoint is mounted at
pub const DEFAULT_MOUNT_PATH: &str = "/healthcheck";

/// Aggregate timeout for one run of all probes (seconds)
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 30;

/// Per-echo timeout for ping probes (seconds)
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 5;

/// Longest cache duration a probe may configure (one year)
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "vigil=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// Health endpoint settings
    #[serde(default)]
    pub health: HealthConfig,
    /// Probes, run in this order and reported in this order
    #[serde(default, rename = "probe")]
    pub probes: Vec<ProbeConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

/// Health endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Exact path the endpoint answers on; everything else is passed on
    #[serde(default = "HealthConfig::default_mount_path")]
    pub mount_path: String,
    /// Time before the whole run is deemed timed out
    #[serde(default = "HealthConfig::default_timeout")]
    pub timeout_seconds: u64,
    /// Body format for `?debug=true` responses
    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            mount_path: Self::default_mount_path(),
            timeout_seconds: Self::default_timeout(),
            format: ReportFormat::default(),
        }
    }
}

impl HealthConfig {
    fn default_mount_path() -> String {
        DEFAULT_MOUNT_PATH.to_string()
    }

    fn default_timeout() -> u64 {
        DEFAULT_HEALTH_TIMEOUT_SECS
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Debug report body format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// One `[[probe]]` entry, tagged by `kind`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeConfig {
    Http(HttpProbeConfig),
    Ping(PingProbeConfig),
    Sql(SqlProbeConfig),
}

impl ProbeConfig {
    pub fn name(&self) -> &str {
        match self {
            ProbeConfig::Http(c) => &c.name,
            ProbeConfig::Ping(c) => &c.name,
            ProbeConfig::Sql(c) => &c.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProbeConfig::Http(_) => "http",
            ProbeConfig::Ping(_) => "ping",
            ProbeConfig::Sql(_) => "sql",
        }
    }

    pub fn cache(&self) -> Option<&CacheSettings> {
        match self {
            ProbeConfig::Http(c) => c.cache.as_ref(),
            ProbeConfig::Ping(c) => c.cache.as_ref(),
            ProbeConfig::Sql(c) => c.cache.as_ref(),
        }
    }
}

/// GET a URI; passes on 2xx
#[derive(Debug, Clone, Deserialize)]
pub struct HttpProbeConfig {
    pub name: String,
    pub uri: String,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password (requires username)
    pub password: Option<String>,
    /// Request timeout, independent of the aggregate timeout
    pub timeout_seconds: Option<u64>,
    pub cache: Option<CacheSettings>,
}

/// ICMP echo to a host
#[derive(Debug, Clone, Deserialize)]
pub struct PingProbeConfig {
    pub name: String,
    pub host: String,
    #[serde(default = "PingProbeConfig::default_timeout")]
    pub timeout_seconds: u64,
    pub cache: Option<CacheSettings>,
}

impl PingProbeConfig {
    fn default_timeout() -> u64 {
        DEFAULT_PING_TIMEOUT_SECS
    }
}

/// `select 1` against a database URL
#[derive(Debug, Clone, Deserialize)]
pub struct SqlProbeConfig {
    pub name: String,
    pub connection_string: String,
    pub cache: Option<CacheSettings>,
}

/// Per-probe outcome cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
    /// Also serve cached failures until they expire (default: re-check failures)
    #[serde(default)]
    pub cache_failures: bool,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.health.mount_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "health.mount_path must start with '/', got '{}'",
                self.health.mount_path
            )));
        }

        if self.health.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "health.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got '{}'",
                self.logging.format
            )));
        }

        for probe in &self.probes {
            if probe.name().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if let Some(cache) = probe.cache() {
                if cache.ttl_seconds > MAX_CACHE_TTL_SECS {
                    return Err(ConfigError::Validation(format!(
                        "probe '{}': cache.ttl_seconds may not exceed {}",
                        probe.name(),
                        MAX_CACHE_TTL_SECS
                    )));
                }
            }
            if let ProbeConfig::Http(http) = probe {
                if http.password.is_some() && http.username.is_none() {
                    return Err(ConfigError::Validation(format!(
                        "probe '{}': password requires a username",
                        http.name
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FULL_CONFIG: &str = r#"
        [http]
        host = "127.0.0.1"
        port = 3333

        [health]
        mount_path = "/status"
        timeout_seconds = 5
        format = "json"

        [logging]
        format = "json"

        [[probe]]
        kind = "http"
        name = "Google Check"
        uri = "https://www.google.com"
        username = "monitor"
        password = "hunter2"
        timeout_seconds = 3

        [probe.cache]
        ttl_seconds = 60

        [[probe]]
        kind = "ping"
        name = "Local Ping"
        host = "localhost"
        timeout_seconds = 10

        [probe.cache]
        ttl_seconds = 60
        cache_failures = true

        [[probe]]
        kind = "sql"
        name = "Orders DB"
        connection_string = "postgres://app@db/orders"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::parse(FULL_CONFIG).unwrap();

        assert_eq!(config.http.port, 3333);
        assert_eq!(config.health.mount_path, "/status");
        assert_eq!(config.health.timeout(), Duration::from_secs(5));
        assert_eq!(config.health.format, ReportFormat::Json);
        assert_eq!(config.logging.format, "json");

        let names: Vec<_> = config.probes.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["Google Check", "Local Ping", "Orders DB"]);
        let kinds: Vec<_> = config.probes.iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, ["http", "ping", "sql"]);

        match &config.probes[0] {
            ProbeConfig::Http(http) => {
                assert_eq!(http.uri, "https://www.google.com");
                assert_eq!(http.username.as_deref(), Some("monitor"));
                assert_eq!(http.timeout_seconds, Some(3));
                let cache = http.cache.as_ref().unwrap();
                assert_eq!(cache.ttl(), Duration::from_secs(60));
                assert!(!cache.cache_failures);
            }
            other => panic!("expected http probe, got {:?}", other),
        }

        match &config.probes[1] {
            ProbeConfig::Ping(ping) => {
                assert_eq!(ping.timeout_seconds, 10);
                assert!(ping.cache.as_ref().unwrap().cache_failures);
            }
            other => panic!("expected ping probe, got {:?}", other),
        }

        assert!(config.probes[2].cache().is_none());
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::parse(
            r#"
            [http]
            host = "0.0.0.0"
            port = 8080

            [[probe]]
            kind = "ping"
            name = "gateway"
            host = "10.0.0.1"
            "#,
        )
        .unwrap();

        assert_eq!(config.health.mount_path, DEFAULT_MOUNT_PATH);
        assert_eq!(config.health.timeout(), Duration::from_secs(30));
        assert_eq!(config.health.format, ReportFormat::Text);
        assert_eq!(config.logging.format, DEFAULT_LOG_FORMAT);
        match &config.probes[0] {
            ProbeConfig::Ping(ping) => assert_eq!(ping.timeout_seconds, DEFAULT_PING_TIMEOUT_SECS),
            other => panic!("expected ping probe, got {:?}", other),
        }
    }

    #[test]
    fn test_no_probes_is_valid() {
        let config = AppConfig::parse("[http]\nhost = \"0.0.0.0\"\nport = 80\n").unwrap();
        assert!(config.probes.is_empty());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = AppConfig::parse(
            r#"
            [http]
            host = "0.0.0.0"
            port = 80

            [[probe]]
            kind = "smtp"
            name = "mail"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_relative_mount_path_rejected() {
        let result = AppConfig::parse(
            r#"
            [http]
            host = "0.0.0.0"
            port = 80

            [health]
            mount_path = "healthcheck"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = AppConfig::parse(
            r#"
            [http]
            host = "0.0.0.0"
            port = 80

            [health]
            timeout_seconds = 0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_probe_name_rejected() {
        let result = AppConfig::parse(
            r#"
            [http]
            host = "0.0.0.0"
            port = 80

            [[probe]]
            kind = "sql"
            name = ""
            connection_string = "sqlite::memory:"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::EmptyName)));
    }

    #[test]
    fn test_password_without_username_rejected() {
        let result = AppConfig::parse(
            r#"
            [http]
            host = "0.0.0.0"
            port = 80

            [[probe]]
            kind = "http"
            name = "api"
            uri = "http://localhost/"
            password = "secret"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.probes.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load("/nonexistent/vigil.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
