//! Weather cache for the wardrobe app
//!
//! Fetches the current weather from the wardrobe weather API, persists it in
//! a key-value store, and keeps a usable snapshot available through network
//! and geolocation failures.

pub mod cache;
pub mod error;
pub mod location;
pub mod provider;
pub mod store;
pub mod types;

pub use cache::{CacheSettings, WeatherCache, FRESHNESS_WINDOW};
pub use error::{GeolocationError, StoreError, WeatherError};
pub use location::{FixedGeolocator, Geolocator, PositionOptions, UnsupportedGeolocator};
pub use provider::WeatherProvider;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::*;
