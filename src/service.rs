//! Domain data service
//!
//! The facade the presentation layer talks to: location resolution with
//! persistence, cached domain fetches with synthesis on chain exhaustion,
//! and refresh scheduling. Owns the cache and scheduler explicitly; nothing
//! here is a process-wide singleton.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::RngExt;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::cache::{CacheKey, TtlCache};
use crate::chain::ProviderChain;
use crate::config::RiskwatchConfig;
use crate::error::RiskwatchError;
use crate::location_resolver::{CoordinateResolver, LocationWatch};
use crate::location_store::LocationStore;
use crate::models::{Domain, DomainResult, LocationReading, ResolvedLocation};
use crate::scheduler::{CycleFn, RefreshScheduler, RefreshSnapshot};
use crate::synth;

struct ServiceInner {
    config: RiskwatchConfig,
    cache: TtlCache,
    chains: HashMap<Domain, ProviderChain>,
    location_watch: LocationWatch,
    store: Option<LocationStore>,
}

/// The resilient data-resolution layer behind the dashboard
#[derive(Clone)]
pub struct DomainDataService {
    inner: Arc<ServiceInner>,
    scheduler: RefreshScheduler,
}

impl DomainDataService {
    /// Build the service from configuration and pre-assembled chains
    ///
    /// # Errors
    /// Fails when the configured location store cannot be opened.
    pub fn new(
        config: RiskwatchConfig,
        chains: HashMap<Domain, ProviderChain>,
    ) -> Result<Self> {
        let store = match &config.location.persist_path {
            Some(path) => Some(
                LocationStore::open(path)
                    .map_err(|err| RiskwatchError::cache(err.to_string()))?,
            ),
            None => None,
        };

        let inner = Arc::new(ServiceInner {
            config,
            cache: TtlCache::new(),
            chains,
            location_watch: LocationWatch::new(),
            store,
        });

        let cycle_inner = inner.clone();
        let cycle: CycleFn = Arc::new(move || {
            let inner = cycle_inner.clone();
            Box::pin(async move { run_refresh_cycle(inner).await })
        });

        Ok(Self {
            inner,
            scheduler: RefreshScheduler::new(cycle),
        })
    }

    /// Seed the current location from the persistent store, if fresh
    pub async fn restore_persisted_location(&self) -> Option<ResolvedLocation> {
        let store = self.inner.store.as_ref()?;
        let location = store
            .restore(self.inner.config.location.freshness())
            .await?;
        info!(location = %location.summary(), "Restored persisted location");
        self.inner.location_watch.publish(location.clone());
        Some(location)
    }

    /// Resolve the authoritative location from competing readings
    ///
    /// The result is persisted (when a store is configured) and published
    /// to location subscribers.
    ///
    /// # Errors
    /// `NoLocationAvailable` when nothing is usable and fallback is
    /// disallowed.
    pub async fn resolve_location(
        &self,
        device: Option<LocationReading>,
        manual: Option<LocationReading>,
    ) -> Result<ResolvedLocation> {
        let fallback = self.inner.config.location.fallback_reading();
        let resolved = CoordinateResolver::resolve(
            device.as_ref(),
            manual.as_ref(),
            self.inner.config.location.allow_fallback,
            &fallback,
        )?;

        if let Some(store) = &self.inner.store {
            if let Err(err) = store.save(&resolved).await {
                warn!(%err, "Failed to persist resolved location");
            }
        }

        self.inner.location_watch.publish(resolved.clone());
        Ok(resolved)
    }

    /// The current location, resolving one if none is known yet
    pub async fn current_location(&self) -> Result<ResolvedLocation> {
        if let Some(location) = self.inner.location_watch.current() {
            return Ok(location);
        }
        self.resolve_location(None, None).await
    }

    /// Subscribe to location changes
    #[must_use]
    pub fn subscribe_location(&self) -> watch::Receiver<Option<ResolvedLocation>> {
        self.inner.location_watch.subscribe()
    }

    /// Fetch one domain's data, consulting the cache unless forced
    ///
    /// A domain whose chain is exhausted degrades to a `Simulated` result;
    /// only `NoLocationAvailable` propagates.
    #[instrument(skip(self), fields(%domain))]
    pub async fn get_domain_data(
        &self,
        domain: Domain,
        force_refresh: bool,
    ) -> Result<DomainResult> {
        let location = self.current_location().await?;
        fetch_domain(&self.inner, domain, location, force_refresh).await
    }

    /// Drop every cached result; in-flight fetches complete and repopulate
    pub async fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all().await;
    }

    /// Number of live cache entries
    pub async fn cache_entries(&self) -> usize {
        self.inner.cache.len().await
    }

    /// Arm the periodic refresh timer; `interval` defaults to configuration
    pub async fn start_auto_refresh(&self, interval: Option<Duration>) {
        let interval = interval.unwrap_or_else(|| self.inner.config.refresh.interval());
        self.scheduler.start(interval).await;
    }

    /// Disarm the periodic refresh timer
    pub async fn stop_auto_refresh(&self) {
        self.scheduler.stop().await;
    }

    /// Trigger a refresh cycle now; returns false when one was already
    /// running and the trigger was absorbed
    pub async fn manual_refresh(&self) -> bool {
        self.scheduler.manual_refresh().await
    }

    /// Current refresh bookkeeping
    pub async fn refresh_snapshot(&self) -> RefreshSnapshot {
        self.scheduler.snapshot().await
    }

    /// Observe completed refresh cycles
    #[must_use]
    pub fn subscribe_cycles(&self) -> watch::Receiver<u64> {
        self.scheduler.subscribe_cycles()
    }
}

/// Cache-then-chain-then-synthesis fetch for one domain
async fn fetch_domain(
    inner: &Arc<ServiceInner>,
    domain: Domain,
    location: ResolvedLocation,
    force_refresh: bool,
) -> Result<DomainResult> {
    let coordinate = location.coordinate;
    let key = CacheKey::new(
        domain,
        &coordinate,
        inner.config.cache.coordinate_precision,
    );

    if !force_refresh {
        if let Some(hit) = inner.cache.get(&key).await {
            return Ok(hit);
        }
    }

    let fetched = match inner.chains.get(&domain) {
        Some(chain) => chain.fetch(coordinate).await,
        None => Err(RiskwatchError::ChainExhausted { domain }),
    };

    let result = match fetched {
        Ok(result) => result,
        Err(RiskwatchError::ChainExhausted { .. }) => {
            info!(%domain, "Chain exhausted, synthesizing fallback data");
            synth::synthesize(domain, &coordinate)
        }
        Err(other) => return Err(other),
    };

    let ttl = jittered_ttl(inner, domain);
    inner.cache.put(key, result.clone(), ttl).await;
    Ok(result)
}

/// Domain TTL with a little jitter so entries do not expire in lockstep
fn jittered_ttl(inner: &Arc<ServiceInner>, domain: Domain) -> Duration {
    let ttl = inner.config.domains.for_domain(domain).ttl();
    let jitter: f32 = rand::rng().random_range(0.95..1.05);
    Duration::from_secs_f32(ttl.as_secs_f32() * jitter)
}

/// One refresh cycle: every domain fetched concurrently, failures isolated
async fn run_refresh_cycle(inner: Arc<ServiceInner>) {
    let location = match inner.location_watch.current() {
        Some(location) => location,
        None => {
            let fallback = inner.config.location.fallback_reading();
            match CoordinateResolver::resolve(
                None,
                None,
                inner.config.location.allow_fallback,
                &fallback,
            ) {
                Ok(location) => {
                    inner.location_watch.publish(location.clone());
                    location
                }
                Err(err) => {
                    warn!(%err, "Refresh cycle skipped: no location to refresh against");
                    return;
                }
            }
        }
    };

    debug!(location = %location.summary(), "Refresh cycle starting");
    let fetches = Domain::ALL.map(|domain| {
        let inner = inner.clone();
        let location = location.clone();
        async move { (domain, fetch_domain(&inner, domain, location, true).await) }
    });

    for (domain, outcome) in futures::future::join_all(fetches).await {
        match outcome {
            Ok(result) => {
                debug!(%domain, provenance = ?result.provenance, "Domain refreshed");
            }
            Err(err) => warn!(%domain, %err, "Domain refresh failed"),
        }
    }
}
