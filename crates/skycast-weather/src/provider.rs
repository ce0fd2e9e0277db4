//! OpenWeatherMap client: current conditions, forecast and air quality,
//! normalized into one `WeatherBundle`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::api::{
    primary_condition, AirPollutionResponse, ApiErrorBody, CurrentResponse, ForecastEntry,
    ForecastResponse,
};
use crate::error::WeatherError;
use crate::types::{
    AirQuality, Coordinates, ForecastPoint, HourlyPoint, PlaceQuery, WeatherBundle, WeatherRecord,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The forecast feed has one sample every 3 hours.
const SAMPLES_PER_DAY: usize = 8;
const HOURLY_SAMPLES: usize = 24;

/// Anything that can produce weather for a place.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, query: &PlaceQuery) -> Result<WeatherBundle, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::with_options(
            api_key,
            DEFAULT_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch and normalize everything shown for one place.
    ///
    /// Only a current-conditions failure fails the call; forecast and air
    /// quality degrade to empty/absent.
    #[instrument(skip(self, query), fields(place = %query), level = "info")]
    pub async fn fetch(&self, query: &PlaceQuery) -> Result<WeatherBundle, WeatherError> {
        let (current, forecast, air_quality) = match query.coordinates() {
            Some(coords) => {
                let (current, forecast, air_quality) = tokio::join!(
                    self.current(query),
                    self.forecast(coords),
                    self.air_quality(coords),
                );
                (current?, forecast, air_quality)
            }
            None => {
                let current = self.current(query).await?;
                let coords = Coordinates::new(current.coord.lat, current.coord.lon);
                let (forecast, air_quality) =
                    tokio::join!(self.forecast(coords), self.air_quality(coords));
                (current, forecast, air_quality)
            }
        };

        let entries = match forecast {
            Ok(forecast) => forecast.list,
            Err(e) => {
                tracing::warn!("Forecast unavailable for {}: {}", query, e);
                Vec::new()
            }
        };

        let air_quality = air_quality.unwrap_or_else(|e| {
            tracing::warn!("Air quality unavailable for {}: {}", query, e);
            None
        });

        Ok(WeatherBundle {
            current: normalize_current(current, air_quality),
            daily: daily_points(&entries),
            hourly: hourly_points(&entries),
        })
    }

    async fn current(&self, query: &PlaceQuery) -> Result<CurrentResponse, WeatherError> {
        let mut params = locator_params(query);
        params.push(("units", "metric".to_string()));
        self.get_json("/data/2.5/weather", &params, query).await
    }

    async fn forecast(&self, coords: Coordinates) -> Result<ForecastResponse, WeatherError> {
        let query = PlaceQuery::Coordinates(coords);
        let mut params = locator_params(&query);
        params.push(("units", "metric".to_string()));
        self.get_json("/data/2.5/forecast", &params, &query).await
    }

    async fn air_quality(&self, coords: Coordinates) -> Result<Option<AirQuality>, WeatherError> {
        let query = PlaceQuery::Coordinates(coords);
        let response: AirPollutionResponse = self
            .get_json("/data/2.5/air_pollution", &locator_params(&query), &query)
            .await?;

        Ok(response.list.into_iter().next().map(|entry| AirQuality {
            aqi: entry.main.aqi,
            co: entry.components.co,
            no2: entry.components.no2,
            o3: entry.components.o3,
            pm2_5: entry.components.pm2_5,
            pm10: entry.components.pm10,
            so2: entry.components.so2,
        }))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
        query: &PlaceQuery,
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Request to {} failed: {}", path, e);
                WeatherError::from_transport(&e)
            })?;

        handle_response(response, query).await
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch(&self, query: &PlaceQuery) -> Result<WeatherBundle, WeatherError> {
        WeatherClient::fetch(self, query).await
    }
}

/// Map a provider response to a decoded body or one of the displayable errors.
async fn handle_response<T: DeserializeOwned>(
    response: Response,
    query: &PlaceQuery,
) -> Result<T, WeatherError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| WeatherError::from_transport(&e));
    }

    match status {
        StatusCode::NOT_FOUND => Err(WeatherError::PlaceNotFound(query.key())),
        StatusCode::UNAUTHORIZED => Err(WeatherError::InvalidCredential),
        _ => {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::debug!("Provider returned {}: {}", status, message);
            Err(WeatherError::Provider(message))
        }
    }
}

fn locator_params(query: &PlaceQuery) -> Vec<(&'static str, String)> {
    match query {
        PlaceQuery::Name(name) => vec![("q", name.clone())],
        PlaceQuery::Coordinates(coords) => vec![
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
        ],
        PlaceQuery::PostalCode { code, country } => {
            let zip = match country {
                Some(cc) => format!("{},{}", code, cc),
                None => code.clone(),
            };
            vec![("zip", zip)]
        }
    }
}

fn normalize_current(current: CurrentResponse, air_quality: Option<AirQuality>) -> WeatherRecord {
    let condition = primary_condition(&current.weather);
    let temperature = current.main.temp;
    let humidity = current.main.humidity;

    WeatherRecord {
        id: current.id,
        city: current.name,
        coordinates: Coordinates::new(current.coord.lat, current.coord.lon),
        temperature,
        feels_like: current.main.feels_like.unwrap_or(temperature),
        condition: condition.main,
        description: condition.description,
        humidity,
        wind_speed: current.wind.speed,
        wind_direction: current.wind.deg,
        pressure: current.main.pressure,
        dew_point: dew_point(temperature, humidity),
        precipitation: current.rain.and_then(|r| r.one_hour).unwrap_or(0.0),
        uv_index: 0.0,
        icon: condition.icon,
        air_quality,
        sunrise: current.sys.sunrise,
        sunset: current.sys.sunset,
    }
}

/// One sample per day: every 8th entry of the 3-hour feed.
fn daily_points(entries: &[ForecastEntry]) -> Vec<ForecastPoint> {
    entries
        .iter()
        .step_by(SAMPLES_PER_DAY)
        .map(|entry| {
            let condition = primary_condition(&entry.weather);
            ForecastPoint {
                date: split_dt_txt(&entry.dt_txt).0.to_string(),
                temperature: entry.main.temp,
                condition: condition.main,
                icon: condition.icon,
            }
        })
        .collect()
}

/// The first 24 entries of the 3-hour feed, labelled by time of day.
fn hourly_points(entries: &[ForecastEntry]) -> Vec<HourlyPoint> {
    entries
        .iter()
        .take(HOURLY_SAMPLES)
        .map(|entry| {
            let condition = primary_condition(&entry.weather);
            HourlyPoint {
                time: split_dt_txt(&entry.dt_txt).1.to_string(),
                temperature: entry.main.temp,
                condition: condition.main,
                icon: condition.icon,
            }
        })
        .collect()
}

/// `"2024-06-01 12:00:00"` → `("2024-06-01", "12:00:00")`
fn split_dt_txt(dt_txt: &str) -> (&str, &str) {
    dt_txt.split_once(' ').unwrap_or((dt_txt, ""))
}

/// Magnus approximation of the dew point in °C.
pub fn dew_point(temperature: f64, humidity: u8) -> f64 {
    const A: f64 = 17.62;
    const B: f64 = 243.12;
    let rh = f64::from(humidity.clamp(1, 100)) / 100.0;
    let gamma = rh.ln() + A * temperature / (B + temperature);
    B * gamma / (A - gamma)
}
