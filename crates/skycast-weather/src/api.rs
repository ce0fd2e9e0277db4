//! OpenWeatherMap response shapes.
//!
//! Only the fields the dashboard uses are modelled; everything optional on
//! the provider side is optional here so partial payloads still decode.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCondition {
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMain {
    pub temp: f64,
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiWind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: u16,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiPrecipitation {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiSys {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// `GET /data/2.5/weather`
#[derive(Debug, Deserialize)]
pub(crate) struct CurrentResponse {
    pub id: u64,
    pub name: String,
    pub coord: ApiCoord,
    #[serde(default)]
    pub weather: Vec<ApiCondition>,
    pub main: ApiMain,
    #[serde(default)]
    pub wind: ApiWind,
    pub rain: Option<ApiPrecipitation>,
    #[serde(default)]
    pub sys: ApiSys,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastEntry {
    pub dt_txt: String,
    pub main: ApiMain,
    #[serde(default)]
    pub weather: Vec<ApiCondition>,
}

/// `GET /data/2.5/forecast` (5 days, 3-hour steps)
#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AirMain {
    pub aqi: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AirComponents {
    #[serde(default)]
    pub co: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub o3: f64,
    #[serde(default)]
    pub pm2_5: f64,
    #[serde(default)]
    pub pm10: f64,
    #[serde(default)]
    pub so2: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AirEntry {
    pub main: AirMain,
    #[serde(default)]
    pub components: AirComponents,
}

/// `GET /data/2.5/air_pollution`
#[derive(Debug, Deserialize)]
pub(crate) struct AirPollutionResponse {
    #[serde(default)]
    pub list: Vec<AirEntry>,
}

/// One element of `GET /geo/1.0/direct`
#[derive(Debug, Deserialize)]
pub(crate) struct GeoEntry {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: Option<String>,
}

impl ApiCondition {
    pub(crate) fn unknown() -> Self {
        Self {
            main: "Unknown".to_string(),
            description: String::new(),
            icon: String::new(),
        }
    }
}

/// First condition of a provider list, or a placeholder when the list is empty
pub(crate) fn primary_condition(conditions: &[ApiCondition]) -> ApiCondition {
    conditions.first().cloned().unwrap_or_else(ApiCondition::unknown)
}
