//! Periodic background refresh of favorites and the current location.

use std::sync::Arc;
use std::time::Duration;

use skycast_weather::{LocationSource, PlaceQuery};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::city_store::CityWeatherStore;
use crate::preferences::PreferenceStore;

pub struct RefreshScheduler {
    store: Arc<CityWeatherStore>,
    preferences: Arc<PreferenceStore>,
    location: Option<Arc<dyn LocationSource>>,
    /// `None` refreshes once at start only.
    interval: Option<Duration>,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<CityWeatherStore>,
        preferences: Arc<PreferenceStore>,
        location: Option<Arc<dyn LocationSource>>,
        interval: Option<Duration>,
    ) -> Self {
        Self {
            store,
            preferences,
            location,
            interval: interval.filter(|d| !d.is_zero()),
        }
    }

    /// Favorites in order, then the current position when it is known and
    /// not already a favorite.
    pub async fn places(&self) -> Vec<PlaceQuery> {
        let mut places: Vec<PlaceQuery> = self
            .preferences
            .favorites()
            .iter()
            .map(|name| PlaceQuery::parse(name))
            .collect();

        if let Some(location) = &self.location {
            match location.current_position().await {
                Ok(coords) => {
                    let here = PlaceQuery::Coordinates(coords);
                    if !places.iter().any(|p| p.key() == here.key()) {
                        places.push(here);
                    }
                }
                Err(e) => tracing::debug!("No current position for refresh: {}", e),
            }
        }

        places
    }

    /// Start one refresh round without waiting for it. Rounds may overlap.
    pub async fn run_round(&self) -> JoinHandle<()> {
        let places = self.places().await;
        tracing::info!("Refreshing {} places", places.len());

        let store = Arc::clone(&self.store);
        tokio::spawn(async move { store.refresh_all(places).await })
    }

    /// Refresh now, then every interval, until `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let Some(period) = self.interval else {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = self.run_round() => {}
                }
                tracing::debug!("Periodic refresh disabled");
                return;
            };

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Refresh scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_round().await;
                    }
                }
            }
        })
    }
}
