//! Weather fetch errors.
//!
//! Every variant renders a message that can be shown next to the place it
//! concerns; raw transport errors never leave this crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("City \"{0}\" not found. Please check the spelling or try another city.")]
    PlaceNotFound(String),

    #[error("Invalid API key. Please check your OpenWeatherMap API configuration.")]
    InvalidCredential,

    #[error("Weather service error: {0}")]
    Provider(String),

    #[error("Failed to connect to weather service. Please check your internet connection.")]
    Connectivity,

    #[error("Weather client could not be created: {0}")]
    Client(String),
}

impl WeatherError {
    /// Map a transport error from reqwest.
    ///
    /// Anything without a response (connect, timeout, body read) is a
    /// connectivity failure.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return WeatherError::Provider(status.to_string());
        }
        if err.is_decode() {
            return WeatherError::Provider(format!("malformed response: {}", err));
        }
        WeatherError::Connectivity
    }
}
