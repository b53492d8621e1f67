//! Session weather cache with persistence, staleness and fallback handling.
//!
//! The cache owns one `WeatherSnapshot`. It is seeded from the key-value
//! store at construction, replaced on every successful fetch, and never left
//! empty after a fetch attempt: a failed fetch keeps the previous snapshot,
//! reloads the persisted one, or synthesizes the hardcoded default, always
//! tagged as fallback data.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use wardrobe_core::WeatherConfig;

use crate::error::{GeolocationError, WeatherError};
use crate::location::{Geolocator, PositionOptions};
use crate::provider::WeatherProvider;
use crate::store::KeyValueStore;
use crate::types::{Coordinates, WeatherSnapshot};

/// Store key for the serialized snapshot.
pub const SNAPSHOT_KEY: &str = "wardrobe.weather.snapshot.v1";
/// Store key for the last successful fetch, in Unix milliseconds.
pub const FETCHED_AT_KEY: &str = "wardrobe.weather.fetched_at.v1";
/// Snapshots older than this are stale.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Location and geolocation settings for a cache.
#[derive(Debug, Clone, Default)]
pub struct CacheSettings {
    pub default_location: Option<String>,
    pub fallback_location: Option<String>,
    pub position_options: PositionOptions,
}

impl CacheSettings {
    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            default_location: non_blank(config.default_location.as_deref()),
            fallback_location: non_blank(Some(&config.fallback_location)),
            position_options: PositionOptions::default(),
        }
    }
}

fn freshness_window() -> chrono::Duration {
    chrono::Duration::seconds(FRESHNESS_WINDOW.as_secs() as i64)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct WeatherCache {
    provider: WeatherProvider,
    store: Arc<dyn KeyValueStore>,
    settings: CacheSettings,
    current: Option<WeatherSnapshot>,
    last_fetched: Option<DateTime<Utc>>,
    error: Option<String>,
    last_fix: Option<(Coordinates, Instant)>,
}

impl WeatherCache {
    /// Create a cache, seeding it from whatever the store holds.
    pub fn new(
        provider: WeatherProvider,
        store: Arc<dyn KeyValueStore>,
        settings: CacheSettings,
    ) -> Self {
        let current = load_persisted_snapshot(store.as_ref());
        let last_fetched = load_persisted_timestamp(store.as_ref());

        if let Some(snapshot) = &current {
            tracing::debug!(
                "Restored weather for {} (fetched at {:?})",
                snapshot.location,
                last_fetched
            );
        }

        Self {
            provider,
            store,
            settings,
            current,
            last_fetched,
            error: None,
            last_fix: None,
        }
    }

    pub fn current(&self) -> Option<&WeatherSnapshot> {
        self.current.as_ref()
    }

    /// User-readable message from the last failed operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.last_fetched
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    /// Staleness relative to `now`. Exactly `FRESHNESS_WINDOW` old is still fresh.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        if self.current.is_none() {
            return true;
        }
        match self.last_fetched {
            Some(fetched_at) => now.signed_duration_since(fetched_at) > freshness_window(),
            None => true,
        }
    }

    /// Fetch only when the cached snapshot is stale. Returns whether a fetch ran.
    ///
    /// # Errors
    /// Returns `WeatherError::NoLocation` when no location can be resolved.
    pub async fn ensure_fresh(
        &mut self,
        location_hint: Option<&str>,
    ) -> Result<bool, WeatherError> {
        if !self.is_stale() {
            tracing::debug!("Weather is fresh, skipping fetch");
            return Ok(false);
        }
        self.fetch(location_hint).await?;
        Ok(true)
    }

    /// Fetch weather for the hint, the default location, or the fallback location.
    ///
    /// Network and parse failures are absorbed: the error field is set and a
    /// fallback snapshot is installed.
    ///
    /// # Errors
    /// Returns `WeatherError::NoLocation` when no location can be resolved.
    pub async fn fetch(&mut self, location_hint: Option<&str>) -> Result<(), WeatherError> {
        let Some(location) = self.resolve_location(location_hint) else {
            let err = WeatherError::NoLocation;
            tracing::warn!("{}", err);
            self.error = Some(err.user_message());
            return Err(err);
        };

        match self.provider.fetch(&location).await {
            Ok(snapshot) => self.apply_success(snapshot, Utc::now()),
            Err(e) => self.apply_failure(&location, e, Utc::now()),
        }
        Ok(())
    }

    /// Fetch weather for the device position, falling back to the configured
    /// fallback location when the position can't be determined.
    ///
    /// # Errors
    /// Returns `WeatherError::NoLocation` when geolocation fails and no
    /// fallback or default location is configured.
    pub async fn fetch_by_geolocation<G: Geolocator>(
        &mut self,
        geolocator: &G,
    ) -> Result<(), WeatherError> {
        match self.locate(geolocator).await {
            Ok(coords) => {
                let location = coords.to_location_string();
                tracing::info!("Using device location {}", location);
                self.fetch(Some(&location)).await
            }
            Err(e) => {
                let fallback = self.settings.fallback_location.clone();
                tracing::warn!(
                    "Geolocation failed ({}), using fallback location {:?}",
                    e,
                    fallback
                );
                self.fetch(fallback.as_deref()).await
            }
        }
    }

    async fn locate<G: Geolocator>(
        &mut self,
        geolocator: &G,
    ) -> Result<Coordinates, GeolocationError> {
        let options = self.settings.position_options;

        if let Some((coords, obtained_at)) = self.last_fix {
            if obtained_at.elapsed() <= options.maximum_age {
                tracing::debug!("Reusing device fix from {:?} ago", obtained_at.elapsed());
                return Ok(coords);
            }
        }

        let coords = tokio::time::timeout(options.timeout, geolocator.current_position(&options))
            .await
            .map_err(|_| GeolocationError::Timeout)??;

        self.last_fix = Some((coords, Instant::now()));
        Ok(coords)
    }

    fn resolve_location(&self, hint: Option<&str>) -> Option<String> {
        non_blank(hint)
            .or_else(|| self.settings.default_location.clone())
            .or_else(|| self.settings.fallback_location.clone())
    }

    fn apply_success(&mut self, mut snapshot: WeatherSnapshot, now: DateTime<Utc>) {
        snapshot.is_fallback = false;
        self.persist(&snapshot, now);
        self.current = Some(snapshot);
        self.last_fetched = Some(now);
        self.error = None;
    }

    fn apply_failure(&mut self, location: &str, err: WeatherError, now: DateTime<Utc>) {
        tracing::warn!(
            transient = err.is_transient(),
            "Weather fetch for {} failed: {}",
            location,
            err
        );
        self.error = Some(err.user_message());

        let fallback = match self.current.take() {
            Some(previous) => previous.into_fallback(),
            None => match load_persisted_snapshot(self.store.as_ref()) {
                Some(persisted) => persisted.into_fallback(),
                None => {
                    tracing::info!("No saved weather, using default snapshot");
                    WeatherSnapshot::fallback_default()
                }
            },
        };
        self.current = Some(fallback);

        if self.last_fetched.is_none() {
            self.last_fetched = Some(now);
        }
    }

    fn persist(&self, snapshot: &WeatherSnapshot, fetched_at: DateTime<Utc>) {
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize weather snapshot: {}", e);
                return;
            }
        };

        // The timestamp must never outlive a failed snapshot write, or the
        // previous snapshot would be restored as fresh.
        if let Err(e) = self.store.set(SNAPSHOT_KEY, &json) {
            tracing::warn!("Failed to persist weather snapshot: {}", e);
            return;
        }
        if let Err(e) = self
            .store
            .set(FETCHED_AT_KEY, &fetched_at.timestamp_millis().to_string())
        {
            tracing::warn!("Failed to persist weather timestamp: {}", e);
        }
    }
}

fn load_persisted_snapshot(store: &dyn KeyValueStore) -> Option<WeatherSnapshot> {
    match store.get(SNAPSHOT_KEY) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Ignoring corrupt saved weather: {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Failed to read saved weather: {}", e);
            None
        }
    }
}

fn load_persisted_timestamp(store: &dyn KeyValueStore) -> Option<DateTime<Utc>> {
    let raw = match store.get(FETCHED_AT_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!("Failed to read saved weather timestamp: {}", e);
            return None;
        }
    };

    let parsed = raw
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis);
    if parsed.is_none() {
        tracing::warn!("Ignoring corrupt saved weather timestamp: {:?}", raw);
    }
    parsed
}
