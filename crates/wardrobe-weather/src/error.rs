//! Weather-specific error types.

use thiserror::Error;
use wardrobe_core::{DatabaseError, NetworkError};

/// Device geolocation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
}

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Store serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("No location available to fetch weather for")]
    NoLocation,

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Weather API returned status {status}")]
    Http { status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoLocation => "Set a location to see the weather.".to_string(),
            Self::Network(e) => format!("Weather unavailable. {}", e.user_message()),
            Self::Http { status } if *status >= 500 => {
                "Weather service is having trouble. Showing saved weather.".to_string()
            }
            Self::Http { .. } => "Weather request failed. Showing saved weather.".to_string(),
            Self::Parse(_) => "Received unexpected weather data. Showing saved weather.".to_string(),
        }
    }

    /// Whether a later retry could succeed without user action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status } => *status >= 500 || *status == 429 || *status == 408,
            _ => false,
        }
    }
}
