use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Place key for a geolocated position: `"lat,lon"`.
    pub fn key(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// How a place is located when asking the provider for weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceQuery {
    /// Free-text city name, e.g. "London" or "Paris,FR"
    Name(String),
    /// A coordinate pair, typically from geolocation
    Coordinates(Coordinates),
    /// Postal code with an optional ISO 3166 country code
    PostalCode {
        code: String,
        country: Option<String>,
    },
}

impl PlaceQuery {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn postal_code(code: impl Into<String>, country: Option<&str>) -> Self {
        Self::PostalCode {
            code: code.into(),
            country: country.map(str::to_string),
        }
    }

    /// Interpret user input: a `"lat,lon"` pair becomes coordinates, anything
    /// else is a city name.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Some((lat, lon)) = input.split_once(',') {
            if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                let coords = Coordinates::new(lat, lon);
                if coords.is_valid() {
                    return Self::Coordinates(coords);
                }
            }
        }
        Self::Name(input.to_string())
    }

    /// The place key this query is stored under.
    pub fn key(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Coordinates(coords) => coords.key(),
            Self::PostalCode {
                code,
                country: Some(cc),
            } => format!("{},{}", code, cc),
            Self::PostalCode { code, country: None } => code.clone(),
        }
    }

    /// Known coordinates, if the query already carries them.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Coordinates(coords) => Some(*coords),
            _ => None,
        }
    }
}

impl From<Coordinates> for PlaceQuery {
    fn from(coords: Coordinates) -> Self {
        Self::Coordinates(coords)
    }
}

impl std::fmt::Display for PlaceQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Air quality reading for a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub aqi: u32,
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub so2: f64,
}

impl AirQuality {
    pub fn category(&self) -> AqiCategory {
        AqiCategory::from_index(self.aqi)
    }
}

/// Air quality band on the provider's 1 to 5 index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AqiCategory {
    /// Out-of-range indices clamp to the nearest band.
    pub fn from_index(aqi: u32) -> Self {
        match aqi {
            0 | 1 => Self::Good,
            2 => Self::Fair,
            3 => Self::Moderate,
            4 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Normalized current conditions for one place.
///
/// Temperatures are always Celsius; conversion happens at display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub id: u64,
    pub city: String,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: String,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_direction: u16,
    pub pressure: f64,
    pub dew_point: f64,
    pub precipitation: f64,
    /// Always 0: the provider's UV endpoint is not wired up.
    pub uv_index: f64,
    pub icon: String,
    pub air_quality: Option<AirQuality>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

impl WeatherRecord {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }

    pub fn sunrise_at(&self) -> Option<DateTime<Utc>> {
        self.sunrise.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    pub fn sunset_at(&self) -> Option<DateTime<Utc>> {
        self.sunset.and_then(|s| DateTime::from_timestamp(s, 0))
    }
}

/// One point of the daily forecast (one sample per 24h)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Date label, `YYYY-MM-DD`
    pub date: String,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
}

/// One point of the "hourly" forecast.
///
/// The provider feed is 3-hourly, so consecutive points are 3 hours apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Time label, `HH:MM:SS`
    pub time: String,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
}

/// Everything one place fetch produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub current: WeatherRecord,
    pub daily: Vec<ForecastPoint>,
    pub hourly: Vec<HourlyPoint>,
}

/// A geocoding candidate for city autocomplete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

impl CitySuggestion {
    /// Display label, e.g. "Springfield, Illinois, US"
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) if !state.is_empty() => {
                format!("{}, {}, {}", self.name, state, self.country)
            }
            _ => format!("{}, {}", self.name, self.country),
        }
    }

    pub fn query(&self) -> PlaceQuery {
        PlaceQuery::Name(self.name.clone())
    }
}

/// Provider icon URL for an icon code such as `"10d"`
pub fn icon_url(icon: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, icon)
}

/// The current position could not be determined
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location unavailable")]
    Unavailable,
}
