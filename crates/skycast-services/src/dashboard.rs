//! Composition root: wires the stores, clients and background refresh
//! together for one dashboard session.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use skycast_auth::{AuthSession, AuthorizationRequest, GoogleSignIn};
use skycast_core::App;
use skycast_weather::{
    format_temperature, CityLookup, Coordinates, GeocodingClient, LocationSource, PlaceQuery,
    StaticLocation, WeatherClient, WeatherError, WeatherSource,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::city_store::CityWeatherStore;
use crate::preferences::PreferenceStore;
use crate::refresh::RefreshScheduler;
use crate::search::CitySearch;

pub struct Dashboard {
    weather: Arc<CityWeatherStore>,
    preferences: Arc<PreferenceStore>,
    auth: Arc<AuthSession>,
    search: CitySearch,
    refresh: Arc<RefreshScheduler>,
    sign_in: GoogleSignIn,
    cancel: CancellationToken,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Dashboard {
    /// Build a dashboard talking to the configured weather provider.
    pub fn from_app(app: &App) -> Result<Self, WeatherError> {
        let config = app.config();
        let api_key = &app.secrets().weather_api_key;
        let base_url = &config.weather.api_base_url;
        let timeout = Duration::from_secs(config.weather.request_timeout_secs);

        let source = Arc::new(WeatherClient::with_options(api_key.clone(), base_url, timeout)?);
        let lookup = Arc::new(GeocodingClient::with_options(api_key.clone(), base_url, timeout)?);
        let location = config.location.map(|l| {
            Arc::new(StaticLocation::new(Coordinates::new(l.latitude, l.longitude)))
                as Arc<dyn LocationSource>
        });

        Ok(Self::with_sources(app, source, lookup, location))
    }

    /// Build a dashboard over arbitrary sources.
    pub fn with_sources(
        app: &App,
        source: Arc<dyn WeatherSource>,
        lookup: Arc<dyn CityLookup>,
        location: Option<Arc<dyn LocationSource>>,
    ) -> Self {
        let config = app.config();
        let storage = app.storage();

        let weather = Arc::new(CityWeatherStore::new(source));
        let preferences = Arc::new(PreferenceStore::load(storage.clone()));
        let auth = Arc::new(AuthSession::load(storage));
        let search = CitySearch::new(
            lookup,
            Duration::from_millis(config.search.debounce_ms),
        );
        let refresh = Arc::new(RefreshScheduler::new(
            weather.clone(),
            preferences.clone(),
            location,
            Some(Duration::from_secs(
                u64::from(config.weather.refresh_minutes) * 60,
            )),
        ));

        Self {
            weather,
            preferences,
            auth,
            search,
            refresh,
            sign_in: GoogleSignIn::new(app.secrets().google_client_id.clone()),
            cancel: CancellationToken::new(),
            refresh_task: Mutex::new(None),
        }
    }

    /// Start background refresh. Calling it again has no effect.
    pub fn start(&self) {
        let mut task = self.refresh_task.lock();
        if task.is_some() {
            return;
        }
        *task = Some(Arc::clone(&self.refresh).spawn(self.cancel.child_token()));
        tracing::info!("Dashboard started");
    }

    /// Stop background work. Fetches already in flight still complete.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self.refresh_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("Refresh task ended abnormally: {}", e);
            }
        }
        tracing::info!("Dashboard stopped");
    }

    pub fn weather(&self) -> &Arc<CityWeatherStore> {
        &self.weather
    }

    pub fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.preferences
    }

    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.auth
    }

    pub fn search(&self) -> &CitySearch {
        &self.search
    }

    /// Add a place to the dashboard (or refresh it) in the background.
    pub fn show_place(&self, query: PlaceQuery) -> JoinHandle<()> {
        self.weather.spawn_fetch(query)
    }

    pub fn dismiss_place(&self, key: &str) {
        self.weather.dismiss(key);
    }

    /// Returns whether `city` is a favorite afterwards.
    pub fn toggle_favorite(&self, city: &str) -> bool {
        if self.preferences.is_favorite(city) {
            self.preferences.remove_favorite(city);
            false
        } else {
            self.preferences.add_favorite(city);
            true
        }
    }

    /// A stored Celsius value in the user's unit, e.g. "71°F".
    pub fn display_temperature(&self, celsius: f64) -> String {
        format_temperature(celsius, self.preferences.temperature_unit())
    }

    pub fn sign_in_request(&self, redirect_uri: &str) -> AuthorizationRequest {
        self.sign_in.authorization_url(redirect_uri)
    }
}
