//! Persistent resolved-location store
//!
//! Hosts that keep the dashboard's location across sessions persist it
//! here. A stored location older than the configured freshness window is
//! treated as absent on load, which forces a re-resolution instead of
//! trusting stale state. The store is an owned handle, not a global.

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;
use tracing::debug;

use crate::models::ResolvedLocation;

const LOCATION_KEY: &[u8] = b"resolved_location";

#[derive(Serialize, Deserialize)]
struct PersistedLocation {
    location: ResolvedLocation,
    saved_at: u64, // Unix timestamp (seconds)
}

pub struct LocationStore {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl LocationStore {
    /// Open (or create) the store at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("location", fjall::KeyspaceCreateOptions::default)?;
        Ok(LocationStore { store: items })
    }

    /// Persist the resolved location with the current timestamp
    #[tracing::instrument(name = "save_location", level = "debug", skip(self, location))]
    pub async fn save(&self, location: &ResolvedLocation) -> Result<()> {
        let store = self.store.clone();
        let saved_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let entry = PersistedLocation {
            location: location.clone(),
            saved_at,
        };
        let bytes = postcard::to_stdvec(&entry)?;

        let _ = task::spawn_blocking(move || store.insert(LOCATION_KEY.to_vec(), bytes)).await?;
        Ok(())
    }

    /// Load the persisted location if it is younger than `freshness`
    ///
    /// A stale entry is removed and reported as absent.
    #[tracing::instrument(name = "load_location", level = "debug", skip(self))]
    pub async fn load(&self, freshness: Duration) -> Result<Option<ResolvedLocation>> {
        let store = self.store.clone();
        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, LOCATION_KEY.to_vec())).await??;

        let Some(bytes) = maybe_bytes else {
            debug!("No persisted location");
            return Ok(None);
        };

        let entry: PersistedLocation = postcard::from_bytes(&bytes)?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let age = now.saturating_sub(entry.saved_at);

        if age > freshness.as_secs() {
            debug!(age_seconds = age, "Persisted location is stale, discarding");
            self.clear().await?;
            return Ok(None);
        }

        debug!(location = %entry.location.summary(), "Restored persisted location");
        Ok(Some(entry.location))
    }

    /// Remove any persisted location
    pub async fn clear(&self) -> Result<()> {
        let store = self.store.clone();
        let _ = task::spawn_blocking(move || store.remove(LOCATION_KEY.to_vec())).await?;
        Ok(())
    }

    /// Age check helper for hosts that inspect the raw entry
    pub async fn saved_at(&self) -> Result<Option<u64>> {
        let store = self.store.clone();
        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, LOCATION_KEY.to_vec())).await??;
        match maybe_bytes {
            Some(bytes) => {
                let entry: PersistedLocation = postcard::from_bytes(&bytes)?;
                Ok(Some(entry.saved_at))
            }
            None => Ok(None),
        }
    }

    /// Load variant that swallows errors; used by the service on startup
    /// where a broken store should not block boot
    pub async fn restore(&self, freshness: Duration) -> Option<ResolvedLocation> {
        match self.load(freshness).await {
            Ok(location) => location,
            Err(err) => {
                tracing::warn!(%err, "Failed to load persisted location");
                None
            }
        }
    }

    /// Overwrite the stored timestamp; test hook for staleness scenarios
    #[cfg(test)]
    async fn save_with_timestamp(&self, location: &ResolvedLocation, saved_at: u64) -> Result<()> {
        let store = self.store.clone();
        let entry = PersistedLocation {
            location: location.clone(),
            saved_at,
        };
        let bytes = postcard::to_stdvec(&entry)?;
        let _ = task::spawn_blocking(move || store.insert(LOCATION_KEY.to_vec(), bytes)).await?;
        Ok(())
    }
}
