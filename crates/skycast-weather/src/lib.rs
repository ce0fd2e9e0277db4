//! Weather data for SkyCast
//!
//! Fetches current conditions, forecasts and air quality from OpenWeatherMap,
//! normalizes them, and offers city autocomplete and unit conversion.

mod api;
pub mod error;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;
pub mod units;

pub use error::WeatherError;
pub use geocode::{CityLookup, GeocodingClient, MIN_QUERY_CHARS};
pub use location::{LocationSource, StaticLocation};
pub use provider::{WeatherClient, WeatherSource, DEFAULT_BASE_URL};
pub use types::*;
pub use units::{format_temperature, TemperatureUnit};
