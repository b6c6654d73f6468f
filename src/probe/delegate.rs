//! Probe backed by an arbitrary async closure.

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{ConfigError, ProbeError};

use super::{validate_name, Probe, ProbeOutcome};

type CheckFn = dyn Fn() -> BoxFuture<'static, Result<ProbeOutcome, ProbeError>> + Send + Sync;

/// Runs a caller-supplied async function as the check.
///
/// Useful for ad hoc checks that don't warrant their own type, and in tests.
pub struct DelegateProbe {
    name: String,
    check_fn: Box<CheckFn>,
}

impl DelegateProbe {
    pub fn new<F, Fut>(name: impl Into<String>, check_fn: F) -> Result<Self, ConfigError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ProbeOutcome, ProbeError>> + Send + 'static,
    {
        Ok(Self {
            name: validate_name(name)?,
            check_fn: Box::new(move || check_fn().boxed()),
        })
    }
}

#[async_trait]
impl Probe for DelegateProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        (self.check_fn)().await
    }
}
