//! Provider chain execution
//!
//! Each domain is served by an ordered chain of providers. A provider gets
//! its full retry budget (with per-attempt timeout and configurable
//! backoff) before the chain moves on: a slow-but-working provider beats
//! rapidly cycling through flaky ones. Exhausting the whole chain yields
//! `ChainExhausted`, which the service layer converts into synthesis
//! instead of surfacing a hard failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::config::ProviderSpec;
use crate::error::RiskwatchError;
use crate::models::{Coordinate, Domain, DomainPayload, DomainResult, Provenance};

/// One upstream data source
///
/// Implementations perform the only I/O in the fetch path; everything else
/// is pure coordination.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn invoke(&self, coordinate: Coordinate) -> Result<DomainPayload>;
}

/// A provider paired with its configured retry policy
pub struct ProviderSlot {
    pub spec: ProviderSpec,
    pub provider: Arc<dyn Provider>,
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Delay before the 1-indexed `retry`: flat, or doubling per retry
fn delay_before_retry(spec: &ProviderSpec, retry: u32) -> Duration {
    if spec.exponential {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        spec.base_delay().saturating_mul(factor)
    } else {
        spec.base_delay()
    }
}

/// Ordered provider chain for a single domain
#[derive(Debug)]
pub struct ProviderChain {
    domain: Domain,
    slots: Vec<ProviderSlot>,
}

impl ProviderChain {
    #[must_use]
    pub fn new(domain: Domain, slots: Vec<ProviderSlot>) -> Self {
        Self { domain, slots }
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Try providers strictly in configured order, each up to its full
    /// attempt budget
    ///
    /// # Errors
    /// `ChainExhausted` when every provider's budget is spent.
    #[instrument(skip(self, coordinate), fields(domain = %self.domain))]
    pub async fn fetch(&self, coordinate: Coordinate) -> Result<DomainResult> {
        for slot in &self.slots {
            match self.try_provider(slot, coordinate).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    warn!(
                        provider = %slot.spec.name,
                        %err,
                        "Provider budget exhausted, moving to next in chain"
                    );
                }
            }
        }
        Err(RiskwatchError::ChainExhausted {
            domain: self.domain,
        })
    }

    async fn try_provider(
        &self,
        slot: &ProviderSlot,
        coordinate: Coordinate,
    ) -> Result<DomainResult> {
        let attempts = slot.spec.max_retries + 1;
        let mut last_error = RiskwatchError::provider(&slot.spec.name, "no attempts made");

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = delay_before_retry(&slot.spec, attempt - 1);
                debug!(provider = %slot.spec.name, attempt, ?delay, "Backing off before retry");
                sleep(delay).await;
            }

            match timeout(slot.spec.timeout(), slot.provider.invoke(coordinate)).await {
                Ok(Ok(payload)) => {
                    if attempt > 1 {
                        info!(
                            provider = %slot.spec.name,
                            retries = attempt - 1,
                            "Provider succeeded after retries"
                        );
                    }
                    return Ok(DomainResult {
                        domain: self.domain,
                        payload,
                        provenance: Provenance::Real,
                        provider_name: slot.spec.name.clone(),
                        retries_used: attempt - 1,
                        fetched_at: Utc::now(),
                    });
                }
                Ok(Err(err)) => {
                    warn!(
                        provider = %slot.spec.name,
                        attempt,
                        of = attempts,
                        %err,
                        "Provider attempt failed"
                    );
                    last_error = err;
                }
                // A timeout is just a failed attempt, not a separate class
                Err(_) => {
                    warn!(
                        provider = %slot.spec.name,
                        attempt,
                        of = attempts,
                        timeout = ?slot.spec.timeout(),
                        "Provider attempt timed out"
                    );
                    last_error = RiskwatchError::provider_timeout(&slot.spec.name);
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertBulletin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    type Trace = Arc<Mutex<Vec<(String, Instant)>>>;

    /// Scripted provider: optionally sleeps, fails a set number of times,
    /// and records every invocation in a shared trace
    struct ScriptedProvider {
        name: String,
        delay: Option<Duration>,
        succeed_after_failures: Option<u32>,
        calls: AtomicU32,
        trace: Trace,
    }

    impl ScriptedProvider {
        fn new(name: &str, succeed_after_failures: Option<u32>, trace: Trace) -> Self {
            Self {
                name: name.to_string(),
                delay: None,
                succeed_after_failures,
                calls: AtomicU32::new(0),
                trace,
            }
        }

        fn slow(name: &str, delay: Duration, trace: Trace) -> Self {
            Self {
                name: name.to_string(),
                delay: Some(delay),
                succeed_after_failures: Some(0),
                calls: AtomicU32::new(0),
                trace,
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn invoke(&self, _coordinate: Coordinate) -> Result<DomainPayload> {
            self.trace
                .lock()
                .unwrap()
                .push((self.name.clone(), Instant::now()));
            if let Some(delay) = self.delay {
                sleep(delay).await;
            }
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.succeed_after_failures {
                Some(failures) if call >= failures => {
                    Ok(DomainPayload::Alerts(AlertBulletin::empty()))
                }
                _ => Err(RiskwatchError::provider(&self.name, "scripted failure")),
            }
        }
    }

    fn spec(name: &str, timeout_seconds: u64, max_retries: u32, base_delay_ms: u64, exponential: bool) -> ProviderSpec {
        ProviderSpec {
            name: name.to_string(),
            timeout_seconds,
            max_retries,
            base_delay_ms,
            exponential,
        }
    }

    fn slot(spec: ProviderSpec, provider: ScriptedProvider) -> ProviderSlot {
        ProviderSlot {
            spec,
            provider: Arc::new(provider),
        }
    }

    fn coordinate() -> Coordinate {
        Coordinate::new(26.9124, 75.7873).unwrap()
    }

    fn gaps_ms(trace: &Trace) -> Vec<u128> {
        let calls = trace.lock().unwrap();
        calls
            .windows(2)
            .map(|w| w[1].1.duration_since(w[0].1).as_millis())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_schedule() {
        let trace: Trace = Arc::default();
        let chain = ProviderChain::new(
            Domain::Weather,
            vec![slot(
                spec("backend", 8, 3, 1000, true),
                ScriptedProvider::new("backend", None, trace.clone()),
            )],
        );

        let err = chain.fetch(coordinate()).await.unwrap_err();
        assert!(matches!(err, RiskwatchError::ChainExhausted { .. }));

        // 4 attempts, separated by 1s, 2s, 4s
        assert_eq!(trace.lock().unwrap().len(), 4);
        assert_eq!(gaps_ms(&trace), vec![1000, 2000, 4000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flat_backoff_schedule() {
        let trace: Trace = Arc::default();
        let chain = ProviderChain::new(
            Domain::Alerts,
            vec![slot(
                spec("backend", 5, 2, 500, false),
                ScriptedProvider::new("backend", None, trace.clone()),
            )],
        );

        let _ = chain.fetch(coordinate()).await;
        assert_eq!(gaps_ms(&trace), vec![500, 500]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_order_preserved_under_retries() {
        let trace: Trace = Arc::default();
        let chain = ProviderChain::new(
            Domain::Weather,
            vec![
                slot(
                    spec("backend", 8, 2, 100, true),
                    ScriptedProvider::new("backend", None, trace.clone()),
                ),
                slot(
                    spec("open-meteo", 8, 2, 100, true),
                    ScriptedProvider::new("open-meteo", Some(0), trace.clone()),
                ),
            ],
        );

        let result = chain.fetch(coordinate()).await.unwrap();
        assert_eq!(result.provider_name, "open-meteo");
        assert_eq!(result.retries_used, 0);
        assert_eq!(result.provenance, Provenance::Real);

        // Every backend attempt precedes the first open-meteo attempt
        let names: Vec<String> = trace.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["backend", "backend", "backend", "open-meteo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_used_counts_failed_attempts() {
        let trace: Trace = Arc::default();
        let chain = ProviderChain::new(
            Domain::Risk,
            vec![slot(
                spec("backend", 8, 3, 100, true),
                ScriptedProvider::new("backend", Some(2), trace.clone()),
            )],
        );

        let result = chain.fetch(coordinate()).await.unwrap();
        assert_eq!(result.provider_name, "backend");
        assert_eq!(result.retries_used, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_against_attempt_budget() {
        let trace: Trace = Arc::default();
        let chain = ProviderChain::new(
            Domain::Seismic,
            vec![slot(
                spec("usgs", 1, 1, 100, true),
                ScriptedProvider::slow("usgs", Duration::from_secs(30), trace.clone()),
            )],
        );

        let err = chain.fetch(coordinate()).await.unwrap_err();
        assert!(matches!(err, RiskwatchError::ChainExhausted { .. }));
        // Initial attempt plus exactly one retry, both started and timed out
        assert_eq!(trace.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_within_timeout_succeeds() {
        let trace: Trace = Arc::default();
        let chain = ProviderChain::new(
            Domain::Weather,
            vec![slot(
                spec("backend", 8, 0, 100, true),
                ScriptedProvider::slow("backend", Duration::from_secs(5), trace.clone()),
            )],
        );

        let result = chain.fetch(coordinate()).await.unwrap();
        assert_eq!(result.retries_used, 0);
    }

    #[test]
    fn test_delay_schedule_math() {
        let exponential = spec("a", 8, 5, 1000, true);
        assert_eq!(delay_before_retry(&exponential, 1), Duration::from_millis(1000));
        assert_eq!(delay_before_retry(&exponential, 2), Duration::from_millis(2000));
        assert_eq!(delay_before_retry(&exponential, 3), Duration::from_millis(4000));

        let flat = spec("b", 8, 5, 700, false);
        assert_eq!(delay_before_retry(&flat, 1), Duration::from_millis(700));
        assert_eq!(delay_before_retry(&flat, 3), Duration::from_millis(700));
    }
}
