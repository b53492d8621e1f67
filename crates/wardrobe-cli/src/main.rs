use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use wardrobe_core::Config;
use wardrobe_weather::{
    CacheSettings, Coordinates, FixedGeolocator, SqliteStore, UnsupportedGeolocator, WeatherCache,
    WeatherProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    wardrobe_core::init()?;

    let (config, _warnings) = Config::load_validated().context("Failed to load configuration")?;
    let weather = &config.weather;

    std::fs::create_dir_all(&config.config_dir).context("Failed to create config directory")?;
    let store = SqliteStore::new(config.database_path()).context("Failed to open weather store")?;

    let provider = WeatherProvider::new(
        &weather.api_base_url,
        Duration::from_secs(weather.request_timeout_secs),
    )
    .context("Failed to create weather client")?;

    let mut cache = WeatherCache::new(provider, Arc::new(store), CacheSettings::from_config(weather));

    // An explicit location on the command line always forces a fetch
    let location_arg = std::env::args().nth(1);
    match location_arg.as_deref() {
        Some(location) => cache.fetch(Some(location)).await?,
        None if cache.is_stale() && weather.use_geolocation => {
            match weather.pinned_coordinates() {
                Some((lat, lon)) => {
                    let geolocator = FixedGeolocator::new(Coordinates::new(lat, lon));
                    cache.fetch_by_geolocation(&geolocator).await?;
                }
                None => cache.fetch_by_geolocation(&UnsupportedGeolocator).await?,
            }
        }
        None => {
            cache.ensure_fresh(None).await?;
        }
    }

    if let Some(snapshot) = cache.current() {
        println!("{}", snapshot.location);
        println!(
            "  {} {}°, humidity {}%, wind {}, precipitation {}",
            snapshot.condition,
            snapshot.temperature,
            snapshot.humidity,
            snapshot.wind_speed,
            snapshot.precipitation
        );
        if snapshot.is_fallback {
            println!("  (showing saved or default weather)");
        }
    }

    if let Some(message) = cache.error() {
        eprintln!("{}", message);
    }

    tracing::info!("Wardrobe weather check finished");
    Ok(())
}
