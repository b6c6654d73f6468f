//! Vigil - aggregating health-check endpoint
//!
//! Runs a set of liveness probes (HTTP, ICMP ping, SQL, or any async
//! closure) concurrently under one deadline and reduces them to a single
//! verdict for a load balancer or orchestrator: 200 when everything passes,
//! 503 when something failed, 504 when the checks did not finish in time.
//!
//! The engine can be used without the HTTP layer:
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use vigil::engine::{run_all, OverallStatus};
//! use vigil::probe::{DelegateProbe, Probe, ProbeExt, ProbeOutcome};
//!
//! # async fn example() -> Result<(), vigil::ConfigError> {
//! let probe = DelegateProbe::new("queue", || async { Ok(ProbeOutcome::passed()) })?
//!     .with_cache(Duration::from_secs(60), false);
//! let probes: Vec<Arc<dyn Probe>> = vec![Arc::new(probe)];
//!
//! let aggregation = run_all(&probes, Duration::from_secs(5)).await;
//! assert_eq!(aggregation.status, OverallStatus::Ok);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod middleware;
pub mod probe;
pub mod report;
pub mod routes;
pub mod state;

pub use engine::{Aggregation, HealthCheckEngine, HealthReport, OverallStatus, ProbeResult};
pub use error::{ConfigError, ProbeError};
pub use probe::{Probe, ProbeExt, ProbeOutcome};
