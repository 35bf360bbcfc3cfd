//! TTL cache for domain results
//!
//! Keys combine the domain with a rounded coordinate so that GPS jitter of
//! a few meters does not defeat caching. The cache is an explicit owned
//! value shared behind the service handle; there is no process-wide
//! singleton.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::models::{Coordinate, Domain, DomainResult};

/// Cache key: domain plus integer-scaled rounded coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    domain: Domain,
    lat_scaled: i64,
    lon_scaled: i64,
}

impl CacheKey {
    /// Build a key by rounding the coordinate to `precision` decimals
    #[must_use]
    pub fn new(domain: Domain, coordinate: &Coordinate, precision: u32) -> Self {
        let (lat, lon) = coordinate.rounded(precision);
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(2));
        Self {
            domain,
            lat_scaled: (lat * multiplier).round() as i64,
            lon_scaled: (lon * multiplier).round() as i64,
        }
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }
}

struct CacheEntry {
    value: DomainResult,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

/// In-process TTL cache, safe under concurrent per-domain fetches
#[derive(Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl TtlCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a fresh value; an expired entry is silently evicted and
    /// reported as a miss
    pub async fn get(&self, key: &CacheKey) -> Option<DomainResult> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    debug!(domain = %key.domain(), "Cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    debug!(domain = %key.domain(), "Cache miss");
                    return None;
                }
            }
        }

        // Expired: upgrade to a write lock and evict, re-checking since
        // another task may have replaced the entry meanwhile
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_expired(now) {
                debug!(domain = %key.domain(), "Cache entry expired, evicting");
                entries.remove(key);
                return None;
            }
            return Some(entry.value.clone());
        }
        None
    }

    /// Store a value under the given TTL
    pub async fn put(&self, key: CacheKey, value: DomainResult, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drop every entry. In-flight fetches are unaffected and will
    /// repopulate the cache when they complete.
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "Cache invalidated");
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DomainPayload, Provenance, RiskAssessment};
    use chrono::Utc;

    fn result(domain: Domain) -> DomainResult {
        DomainResult {
            domain,
            payload: DomainPayload::Risk(RiskAssessment::clamped(4.0, 4.0, 4.0, 4.0, 4.0, 0.8)),
            provenance: Provenance::Real,
            provider_name: "backend".to_string(),
            retries_used: 0,
            fetched_at: Utc::now(),
        }
    }

    fn coordinate(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = TtlCache::new();
        let key = CacheKey::new(Domain::Risk, &coordinate(26.9124, 75.7873), 2);
        cache
            .put(key, result(Domain::Risk), Duration::from_secs(300))
            .await;
        assert!(cache.get(&key).await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_on_get() {
        let cache = TtlCache::new();
        let key = CacheKey::new(Domain::Alerts, &coordinate(26.9124, 75.7873), 2);
        cache
            .put(key, result(Domain::Alerts), Duration::from_secs(300))
            .await;

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.get(&key).await.is_none());
        // Eviction happened, not just a miss
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_within_ttl() {
        let cache = TtlCache::new();
        let key = CacheKey::new(Domain::Alerts, &coordinate(26.9124, 75.7873), 2);
        cache
            .put(key, result(Domain::Alerts), Duration::from_secs(300))
            .await;

        // 2 minutes into a 5-minute TTL
        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_gps_jitter_maps_to_same_key() {
        let a = CacheKey::new(Domain::Weather, &coordinate(26.9124, 75.7873), 2);
        let b = CacheKey::new(Domain::Weather, &coordinate(26.9131, 75.7869), 2);
        assert_eq!(a, b);

        let far = CacheKey::new(Domain::Weather, &coordinate(27.0124, 75.7873), 2);
        assert_ne!(a, far);
    }

    #[tokio::test]
    async fn test_same_coordinate_different_domain_distinct_keys() {
        let c = coordinate(26.9124, 75.7873);
        let weather = CacheKey::new(Domain::Weather, &c, 2);
        let alerts = CacheKey::new(Domain::Alerts, &c, 2);
        assert_ne!(weather, alerts);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = TtlCache::new();
        let c = coordinate(26.9124, 75.7873);
        for domain in Domain::ALL {
            cache
                .put(
                    CacheKey::new(domain, &c, 2),
                    result(domain),
                    Duration::from_secs(300),
                )
                .await;
        }
        assert_eq!(cache.len().await, 5);
        cache.invalidate_all().await;
        assert!(cache.is_empty().await);
    }
}
