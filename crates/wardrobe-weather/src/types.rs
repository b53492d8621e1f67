use serde::{Deserialize, Serialize};

/// Weather condition categories reported by the weather API.
///
/// Serialized as the human-readable description (`"Partly Cloudy"`).
/// Strings that don't match a known category are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
    Other(String),
}

impl WeatherCondition {
    /// Parse a condition label, ignoring case, spaces, `_` and `-`.
    pub fn parse(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "clear" | "sunny" => Self::Clear,
            "partlycloudy" => Self::PartlyCloudy,
            "cloudy" | "overcast" => Self::Cloudy,
            "fog" | "foggy" | "mist" => Self::Fog,
            "drizzle" => Self::Drizzle,
            "rain" | "rainy" => Self::Rain,
            "heavyrain" => Self::HeavyRain,
            "snow" | "snowy" => Self::Snow,
            "sleet" => Self::Sleet,
            "thunderstorm" | "storm" => Self::Thunderstorm,
            _ => Self::Other(label.to_string()),
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
            Self::Other(label) => label,
        }
    }

    /// Icon name for the UI layer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy | Self::Other(_) => "cloud",
            Self::Fog => "cloud_fog",
            Self::Drizzle | Self::Rain | Self::HeavyRain => "cloud_rain",
            Self::Snow | Self::Sleet => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

impl From<String> for WeatherCondition {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<WeatherCondition> for String {
    fn from(condition: WeatherCondition) -> Self {
        match condition {
            WeatherCondition::Other(label) => label,
            known => known.description().to_string(),
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Device position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
        }
    }

    /// Location string understood by the weather API: `"lat,long"`.
    pub fn to_location_string(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// The single weather reading held by the cache.
///
/// Field names match the weather API's JSON (`windSpeed`, `isFallback`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub condition: WeatherCondition,
    pub humidity: f64,
    pub wind_speed: f64,
    pub location: String,
    #[serde(default)]
    pub precipitation: f64,
    /// True only for synthesized data or data held over after a failed fetch
    #[serde(default)]
    pub is_fallback: bool,
}

/// Location reported by the hardcoded default snapshot.
pub const DEFAULT_SNAPSHOT_LOCATION: &str = "Unknown location";

impl WeatherSnapshot {
    /// Hardcoded snapshot used when nothing better is available.
    pub fn fallback_default() -> Self {
        Self {
            temperature: 20.0,
            condition: WeatherCondition::PartlyCloudy,
            humidity: 50.0,
            wind_speed: 10.0,
            location: DEFAULT_SNAPSHOT_LOCATION.to_string(),
            precipitation: 0.0,
            is_fallback: true,
        }
    }

    /// Consume and return the snapshot tagged as fallback data.
    pub fn into_fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }
}
