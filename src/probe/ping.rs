//! ICMP echo probe.
//!
//! Resolves the host on every check, sends a single echo request and waits up
//! to the configured timeout for the reply. A reply passes with `Success`; a
//! missing reply fails with `TimedOut`. Anything else (no permission to open
//! an ICMP socket, unresolvable host) is an execution error.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};

use crate::error::{ConfigError, ProbeError};

use super::{validate_name, Probe, ProbeOutcome};

/// Payload carried by each echo request
const ECHO_PAYLOAD: [u8; 32] = [0; 32];

/// Reply status reported in the outcome message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingStatus {
    Success,
    TimedOut,
}

impl PingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PingStatus::Success => "Success",
            PingStatus::TimedOut => "TimedOut",
        }
    }

    fn into_outcome(self) -> ProbeOutcome {
        ProbeOutcome::new(self.as_str(), self != PingStatus::Success)
    }
}

pub struct PingProbe {
    name: String,
    host: String,
    timeout: Duration,
}

impl PingProbe {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let name = validate_name(name)?;
        let host = host.into();
        if host.is_empty() {
            return Err(ConfigError::Validation(format!(
                "ping check '{name}': host cannot be empty"
            )));
        }
        if timeout.is_zero() {
            return Err(ConfigError::Validation(format!(
                "ping check '{name}': timeout must be greater than zero"
            )));
        }

        Ok(Self {
            name,
            host,
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn resolve(&self) -> Result<IpAddr, ProbeError> {
        if let Ok(addr) = self.host.parse::<IpAddr>() {
            return Ok(addr);
        }

        tokio::net::lookup_host((self.host.as_str(), 0))
            .await?
            .map(|addr| addr.ip())
            .next()
            .ok_or_else(|| ProbeError::Resolve(self.host.clone()))
    }
}

#[async_trait]
impl Probe for PingProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let addr = self.resolve().await?;

        let config = match addr {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config)?;
        // ICMP identifiers are 16 bits; truncating the pid is intended
        let identifier = PingIdentifier(std::process::id() as u16);

        let mut pinger = client.pinger(addr, identifier).await;
        pinger.timeout(self.timeout);

        let status = match pinger.ping(PingSequence(0), &ECHO_PAYLOAD).await {
            Ok((_packet, rtt)) => {
                tracing::trace!(probe = %self.name, %addr, rtt_ms = rtt.as_millis() as u64, "Echo reply");
                PingStatus::Success
            }
            Err(SurgeError::Timeout { .. }) => PingStatus::TimedOut,
            Err(e) => return Err(e.into()),
        };

        Ok(status.into_outcome())
    }
}
