//! City autocomplete via the OpenWeatherMap direct geocoding endpoint.
//!
//! Suggestions are best-effort: every failure yields an empty list.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::api::GeoEntry;
use crate::error::WeatherError;
use crate::provider::DEFAULT_BASE_URL;
use crate::types::{CitySuggestion, Coordinates};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const SUGGESTION_LIMIT: u32 = 5;

/// Queries shorter than this never reach the network.
pub const MIN_QUERY_CHARS: usize = 3;

/// Anything that can turn free text into candidate cities.
#[async_trait]
pub trait CityLookup: Send + Sync {
    async fn search(&self, query: &str) -> Vec<CitySuggestion>;
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::with_options(
            api_key,
            DEFAULT_BASE_URL,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
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

    /// Up to five candidate cities for `query`.
    pub async fn search(&self, query: &str) -> Vec<CitySuggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let url = format!("{}/geo/1.0/direct", self.base_url);
        let limit = SUGGESTION_LIMIT.to_string();

        let response = match self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("City search request failed: {}", e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!("City search returned status {}", response.status());
            return Vec::new();
        }

        let entries: Vec<GeoEntry> = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("City search parse error: {}", e);
                return Vec::new();
            }
        };

        tracing::debug!("City search for {:?} returned {} results", query, entries.len());

        entries
            .into_iter()
            .take(SUGGESTION_LIMIT as usize)
            .map(|entry| CitySuggestion {
                name: entry.name,
                country: entry.country,
                state: entry.state,
                coordinates: Coordinates::new(entry.lat, entry.lon),
            })
            .collect()
    }
}

#[async_trait]
impl CityLookup for GeocodingClient {
    async fn search(&self, query: &str) -> Vec<CitySuggestion> {
        GeocodingClient::search(self, query).await
    }
}
