//! Aggregation engine: runs every probe concurrently under one deadline.
//!
//! Each probe runs in its own spawned task that times itself and converts
//! errors (and panics) into failed outcomes, so a broken probe can only
//! degrade the verdict, never abort it. The joined tasks race a timer:
//!
//! - all tasks finish first: `Degraded` if any outcome failed, else `Ok`
//! - the timer fires first: `TimedOut`, and no per-probe results are returned
//!
//! Timed-out probe tasks are not cancelled. Dropping their join handles
//! detaches them, so slow probes keep running in the background (a cached
//! probe still gets to store its outcome); their results are discarded for
//! the run that timed out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{instrument, Instrument};

use crate::config::{HealthConfig, ProbeConfig, ReportFormat};
use crate::error::ConfigError;
use crate::probe::{self, Probe, ProbeOutcome};
use crate::report::{JsonFormatter, PlainTextFormatter, ReportFormatter};

/// Default aggregate timeout for one run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one probe within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub name: String,
    pub outcome: ProbeOutcome,
    /// Time from invoking the probe to its outcome or error
    pub duration: Duration,
}

/// Verdict of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    /// Every probe passed before the deadline
    Ok,
    /// Every probe finished before the deadline, at least one failed
    Degraded,
    /// The deadline passed before every probe finished
    TimedOut,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Ok => write!(f, "ok"),
            OverallStatus::Degraded => write!(f, "degraded"),
            OverallStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Status plus per-probe results; `results` is `None` exactly when timed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub status: OverallStatus,
    pub results: Option<Vec<ProbeResult>>,
}

impl Aggregation {
    fn completed(results: Vec<ProbeResult>) -> Self {
        let status = if results.iter().any(|r| r.outcome.has_failed()) {
            OverallStatus::Degraded
        } else {
            OverallStatus::Ok
        };
        Self {
            status,
            results: Some(results),
        }
    }

    fn timed_out() -> Self {
        Self {
            status: OverallStatus::TimedOut,
            results: None,
        }
    }
}

/// A rendered debug report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub content_type: String,
    pub body: String,
}

/// What the endpoint sends back: a status and, in debug mode, a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub body: Option<RenderedReport>,
}

/// Run all probes concurrently and aggregate their outcomes.
///
/// Results keep the order of `probes`, not completion order.
#[instrument(
    name = "health.run_all",
    skip(probes),
    fields(probe_count = probes.len(), status, duration_ms)
)]
pub async fn run_all(probes: &[Arc<dyn Probe>], timeout: Duration) -> Aggregation {
    let start = Instant::now();

    if probes.is_empty() {
        tracing::Span::current().record("status", tracing::field::display(OverallStatus::Ok));
        return Aggregation::completed(Vec::new());
    }

    let names: Vec<String> = probes.iter().map(|p| p.name().to_string()).collect();
    let tasks: Vec<_> = probes
        .iter()
        .map(|probe| tokio::spawn(run_probe(Arc::clone(probe)).in_current_span()))
        .collect();

    let aggregation = match tokio::time::timeout(timeout, join_all(tasks)).await {
        Ok(joined) => {
            let results = joined
                .into_iter()
                .zip(names)
                .map(|(joined, name)| {
                    joined.unwrap_or_else(|e| ProbeResult {
                        outcome: ProbeOutcome::failed_with(task_failure_message(&name, e)),
                        name,
                        duration: start.elapsed(),
                    })
                })
                .collect();
            Aggregation::completed(results)
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Health checks did not finish before the timeout"
            );
            Aggregation::timed_out()
        }
    };

    let span = tracing::Span::current();
    span.record("status", tracing::field::display(aggregation.status));
    span.record("duration_ms", start.elapsed().as_millis() as u64);

    aggregation
}

/// Run one probe, timing it and capturing any error as a failed outcome.
async fn run_probe(probe: Arc<dyn Probe>) -> ProbeResult {
    let start = Instant::now();
    let outcome = match probe.check().await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(probe = %probe.name(), error = %e, "Health check raised an error");
            ProbeOutcome::from(e)
        }
    };
    let duration = start.elapsed();

    tracing::debug!(
        probe = %probe.name(),
        failed = outcome.has_failed(),
        duration_ms = duration.as_millis() as u64,
        "Health check finished"
    );

    ProbeResult {
        name: probe.name().to_string(),
        outcome,
        duration,
    }
}

fn task_failure_message(name: &str, error: JoinError) -> String {
    if !error.is_panic() {
        return "Health check was cancelled".to_string();
    }

    let payload = error.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Health check panicked".to_string());

    tracing::error!(probe = %name, panic = %message, "Health check panicked");
    message
}

/// Everything one engine instance needs; fixed for the engine's lifetime.
pub struct EngineConfig {
    pub probes: Vec<Arc<dyn Probe>>,
    pub timeout: Duration,
    pub formatter: Arc<dyn ReportFormatter>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probes: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            formatter: Arc::new(PlainTextFormatter),
        }
    }
}

/// A configured set of probes, evaluated on demand.
pub struct HealthCheckEngine {
    config: EngineConfig,
}

impl HealthCheckEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Build the engine from the `[health]` section and `[[probe]]` entries.
    ///
    /// Fails on the first invalid probe.
    pub fn from_config(health: &HealthConfig, probes: &[ProbeConfig]) -> Result<Self, ConfigError> {
        let probes = probes
            .iter()
            .map(probe::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        let formatter: Arc<dyn ReportFormatter> = match health.format {
            ReportFormat::Text => Arc::new(PlainTextFormatter),
            ReportFormat::Json => Arc::new(JsonFormatter),
        };

        Ok(Self::new(EngineConfig {
            probes,
            timeout: health.timeout(),
            formatter,
        }))
    }

    pub fn probe_names(&self) -> Vec<&str> {
        self.config.probes.iter().map(|p| p.name()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub async fn run_all(&self) -> Aggregation {
        run_all(&self.config.probes, self.config.timeout).await
    }

    /// Run all probes; render a body only if `debug` and the run completed.
    pub async fn evaluate(&self, debug: bool) -> HealthReport {
        let aggregation = self.run_all().await;

        let body = match (&aggregation.results, debug) {
            (Some(results), true) => Some(RenderedReport {
                content_type: self.config.formatter.content_type().to_string(),
                body: self.config.formatter.write(results),
            }),
            _ => None,
        };

        HealthReport {
            status: aggregation.status,
            body,
        }
    }
}
