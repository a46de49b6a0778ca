//! Persisted copy of the image registry.
//!
//! The envelope is spread over four store keys so that a reader which only
//! knows the registry and expiry keys still finds them where it expects.
//! Anything that does not check out (wrong version, expired, corrupt) is
//! dropped on read; callers then fall back to defaults.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mechgenz_core::registry::Registry;
use mechgenz_core::storage::KeyValueStore;
use mechgenz_core::types::{epoch_millis, Timestamp};

pub const IMAGES_KEY: &str = "mechgenz_website_images";
pub const EXPIRY_KEY: &str = "mechgenz_images_cache_expiry";
pub const VERSION_KEY: &str = "mechgenz_images_cache_version";
pub const LAST_FETCH_KEY: &str = "mechgenz_images_last_fetch";

/// Envelope format written by this build.
pub const CACHE_VERSION: &str = "1";

/// A registry read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRegistry {
    pub registry: Registry,
    pub expires_at: Timestamp,
    /// Last successful backend fetch, when one was recorded.
    pub last_fetch: Option<Timestamp>,
}

/// Reads and writes the registry envelope in a [`KeyValueStore`].
#[derive(Clone)]
pub struct RegistryCache {
    store: Arc<dyn KeyValueStore>,
    version: String,
    ttl: Duration,
}

impl std::fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCache")
            .field("version", &self.version)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn parse_millis(raw: &str) -> Option<Timestamp> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

impl RegistryCache {
    pub fn new(store: Arc<dyn KeyValueStore>, version: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            version: version.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read image cache");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %e, "Failed to write image cache");
        }
    }

    fn expiry_from(&self, now: Timestamp) -> i64 {
        let ttl = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        epoch_millis(now).saturating_add(ttl)
    }

    /// Read the envelope. Returns `None`, and removes every cache key, when
    /// the version tag, expiry or registry does not check out.
    pub fn load(&self, now: Timestamp) -> Option<CachedRegistry> {
        let raw_images = self.read(IMAGES_KEY)?;

        match self.read(VERSION_KEY) {
            Some(version) if version == self.version => {}
            other => {
                tracing::info!(
                    found = other.as_deref().unwrap_or("<none>"),
                    expected = %self.version,
                    "Discarding image cache with a different version"
                );
                self.clear();
                return None;
            }
        }

        let Some(expires_at) = self.read(EXPIRY_KEY).as_deref().and_then(parse_millis) else {
            tracing::info!("Discarding image cache without a usable expiry");
            self.clear();
            return None;
        };
        if expires_at <= now {
            tracing::debug!(%expires_at, "Image cache expired");
            self.clear();
            return None;
        }

        let registry: Registry = match serde_json::from_str(&raw_images) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt image cache");
                self.clear();
                return None;
            }
        };

        // Missing stamp is fine: older envelopes never wrote one.
        let last_fetch = self.read(LAST_FETCH_KEY).as_deref().and_then(parse_millis);

        Some(CachedRegistry {
            registry,
            expires_at,
            last_fetch,
        })
    }

    /// Persist a freshly fetched registry with a new expiry and fetch stamp.
    pub fn store(&self, registry: &Registry, now: Timestamp) {
        let json = match serde_json::to_string(registry) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize image registry");
                return;
            }
        };
        self.write(IMAGES_KEY, &json);
        self.write(VERSION_KEY, &self.version);
        self.write(EXPIRY_KEY, &self.expiry_from(now).to_string());
        self.write(LAST_FETCH_KEY, &epoch_millis(now).to_string());
    }

    /// Persist a locally edited registry.
    ///
    /// The current expiry is kept while it is still in the future, so a local
    /// edit does not extend the lifetime of data fetched earlier. The fetch
    /// stamp is left alone.
    pub fn update_entry(&self, registry: &Registry, now: Timestamp) {
        let json = match serde_json::to_string(registry) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize image registry");
                return;
            }
        };

        let same_version = self.read(VERSION_KEY).as_deref() == Some(self.version.as_str());
        let expiry = self
            .read(EXPIRY_KEY)
            .as_deref()
            .and_then(parse_millis)
            .filter(|at| same_version && *at > now)
            .map(epoch_millis)
            .unwrap_or_else(|| self.expiry_from(now));

        self.write(IMAGES_KEY, &json);
        self.write(VERSION_KEY, &self.version);
        self.write(EXPIRY_KEY, &expiry.to_string());
    }

    /// Remove every cache key.
    pub fn clear(&self) {
        for key in [IMAGES_KEY, EXPIRY_KEY, VERSION_KEY, LAST_FETCH_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear image cache");
            }
        }
    }
}
