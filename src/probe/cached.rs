//! TTL cache decorator for probes.
//!
//! Keeps the last outcome of the wrapped probe in a single-slot moka cache.
//! An outcome is fresh until `ttl` after the check that produced it
//! *started*, so a slow check does not extend its own lifetime. A cached
//! failure is only served when `cache_failures` is set; otherwise the next
//! call goes straight back to the wrapped probe.
//!
//! Refreshes are serialized per instance: a caller that finds the cache stale
//! takes the refresh lock, re-checks the cache, and only then invokes the
//! wrapped probe. Concurrent callers on an expired entry therefore trigger one
//! check instead of one each.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use tokio::sync::Mutex;

use crate::config::MAX_CACHE_TTL_SECS;
use crate::error::ProbeError;

use super::{Probe, ProbeOutcome};

/// An outcome and the instant its check was started.
#[derive(Debug, Clone)]
struct Checked {
    started_at: Instant,
    outcome: ProbeOutcome,
}

/// Expires an entry `ttl` after its check started, not after insertion.
struct FromCheckStart {
    ttl: Duration,
}

impl Expiry<(), Checked> for FromCheckStart {
    fn expire_after_create(&self, _key: &(), value: &Checked, created_at: Instant) -> Option<Duration> {
        let spent = created_at.saturating_duration_since(value.started_at);
        Some(self.ttl.saturating_sub(spent))
    }
}

/// A probe whose outcome is reused for a fixed duration.
pub struct CachedProbe {
    inner: Box<dyn Probe>,
    ttl: Duration,
    cache_failures: bool,
    last_outcome: Cache<(), Checked>,
    refresh: Mutex<()>,
}

impl CachedProbe {
    pub fn new(inner: Box<dyn Probe>, ttl: Duration, cache_failures: bool) -> Self {
        let ttl = ttl.min(Duration::from_secs(MAX_CACHE_TTL_SECS));
        let last_outcome = Cache::builder()
            .expire_after(FromCheckStart { ttl })
            .build();

        Self {
            inner,
            ttl,
            cache_failures,
            last_outcome,
            refresh: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn caches_failures(&self) -> bool {
        self.cache_failures
    }

    /// The stored outcome, if it is still fresh and may be served.
    async fn fresh_outcome(&self) -> Option<ProbeOutcome> {
        let checked = self.last_outcome.get(&()).await?;
        if checked.started_at.elapsed() >= self.ttl {
            return None;
        }
        if checked.outcome.has_failed() && !self.cache_failures {
            return None;
        }
        Some(checked.outcome)
    }
}

#[async_trait]
impl Probe for CachedProbe {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        if let Some(outcome) = self.fresh_outcome().await {
            tracing::trace!(probe = %self.name(), "Serving cached outcome");
            return Ok(outcome);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(outcome) = self.fresh_outcome().await {
            return Ok(outcome);
        }

        let started_at = Instant::now();
        let outcome = self.inner.check().await?;
        self.last_outcome
            .insert(
                (),
                Checked {
                    started_at,
                    outcome: outcome.clone(),
                },
            )
            .await;
        tracing::debug!(
            probe = %self.name(),
            failed = outcome.has_failed(),
            ttl_ms = self.ttl.as_millis() as u64,
            "Cached probe refreshed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::probe::{DelegateProbe, ProbeExt};

    fn counting_probe(
        name: &str,
        outcome: ProbeOutcome,
    ) -> (DelegateProbe, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe = DelegateProbe::new(name, move || {
            let counter = counter.clone();
            let outcome = outcome.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(outcome)
            }
        })
        .unwrap();
        (probe, calls)
    }

    #[tokio::test]
    async fn test_passing_outcome_served_from_cache_within_ttl() {
        let (probe, calls) = counting_probe("api", ProbeOutcome::passed());
        let cached = probe.with_cache(Duration::from_secs(60), false);

        let first = cached.check().await.unwrap();
        let second = cached.check().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_outcome_triggers_one_recheck() {
        let (probe, calls) = counting_probe("api", ProbeOutcome::passed());
        let cached = probe.with_cache(Duration::from_millis(50), false);

        cached.check().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        cached.check().await.unwrap();
        cached.check().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ttl_counts_from_check_start() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe = DelegateProbe::new("slow", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(400)).await;
                Ok(ProbeOutcome::passed())
            }
        })
        .unwrap();
        let cached = probe.with_cache(Duration::from_millis(500), false);

        // First check finishes at ~400ms; its outcome is stale from ~500ms
        cached.check().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        cached.check().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_rechecks() {
        let (probe, calls) = counting_probe("api", ProbeOutcome::passed());
        let cached = probe.with_cache(Duration::ZERO, true);

        cached.check().await.unwrap();
        cached.check().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_not_cached_by_default() {
        let (probe, calls) = counting_probe("api", ProbeOutcome::failed_with("down"));
        let cached = probe.with_cache(Duration::from_secs(60), false);

        assert!(cached.check().await.unwrap().has_failed());
        assert!(cached.check().await.unwrap().has_failed());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_cached_when_enabled() {
        let (probe, calls) = counting_probe("api", ProbeOutcome::failed_with("down"));
        let cached = probe.with_cache(Duration::from_secs(60), true);

        cached.check().await.unwrap();
        let second = cached.check().await.unwrap();

        assert_eq!(second.message(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_propagates_and_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe = DelegateProbe::new("flaky", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProbeError::failed("boom"))
            }
        })
        .unwrap();
        let cached = probe.with_cache(Duration::from_secs(60), true);

        assert!(cached.check().await.is_err());
        assert!(cached.check().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe = DelegateProbe::new("slow", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(ProbeOutcome::passed())
            }
        })
        .unwrap();
        let cached = Arc::new(probe.with_cache(Duration::from_secs(60), false));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cached = cached.clone();
                tokio::spawn(async move { cached.check().await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_name_passes_through() {
        let (probe, _) = counting_probe("database", ProbeOutcome::passed());
        let cached = probe.with_cache(Duration::from_secs(1), false);
        assert_eq!(cached.name(), "database");
        assert!(!cached.caches_failures());
    }
}
