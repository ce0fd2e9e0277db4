//! Per-place weather state for the dashboard.
//!
//! Every collection is keyed by the Place Key of the query that was
//! requested. Each fetch takes a generation number when it starts; a result
//! is only committed if its generation is still the latest for that key, so
//! a slow response can never overwrite a newer one or resurrect a dismissed
//! place.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use skycast_weather::{
    ForecastPoint, HourlyPoint, PlaceQuery, WeatherBundle, WeatherError, WeatherRecord,
    WeatherSource,
};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

/// Snapshot of everything the dashboard shows, keyed by Place Key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    pub records: HashMap<String, WeatherRecord>,
    pub forecasts: HashMap<String, Vec<ForecastPoint>>,
    pub hourly: HashMap<String, Vec<HourlyPoint>>,
    pub loading: HashMap<String, bool>,
    pub errors: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl WeatherState {
    pub fn status(&self, key: &str) -> PlaceStatus {
        if self.loading.get(key).copied().unwrap_or(false) {
            PlaceStatus::Loading
        } else if self.errors.contains_key(key) {
            PlaceStatus::Failed
        } else if self.records.contains_key(key) {
            PlaceStatus::Ready
        } else {
            PlaceStatus::Idle
        }
    }

    pub fn record(&self, key: &str) -> Option<&WeatherRecord> {
        self.records.get(key)
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.status(key) == PlaceStatus::Loading
    }

    /// Whether any per-key entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
            || self.forecasts.contains_key(key)
            || self.hourly.contains_key(key)
            || self.loading.contains_key(key)
            || self.errors.contains_key(key)
    }

    fn remove(&mut self, key: &str) {
        self.records.remove(key);
        self.forecasts.remove(key);
        self.hourly.remove(key);
        self.loading.remove(key);
        self.errors.remove(key);
    }
}

/// Handle for one started fetch, passed back to [`CityWeatherStore::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: String,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Default)]
struct Generations {
    next: u64,
    latest: HashMap<String, u64>,
}

pub struct CityWeatherStore {
    source: Arc<dyn WeatherSource>,
    state: watch::Sender<WeatherState>,
    generations: Mutex<Generations>,
}

impl CityWeatherStore {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self {
            source,
            state,
            generations: Mutex::new(Generations::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    pub fn status(&self, key: &str) -> PlaceStatus {
        self.state.borrow().status(key)
    }

    /// Mark `query` as loading and clear its previous error.
    pub fn begin(&self, query: &PlaceQuery) -> FetchTicket {
        let key = query.key();
        let mut generations = self.generations.lock();
        generations.next += 1;
        let generation = generations.next;
        generations.latest.insert(key.clone(), generation);

        self.state.send_modify(|state| {
            state.loading.insert(key.clone(), true);
            state.errors.remove(&key);
        });

        FetchTicket { key, generation }
    }

    /// Commit a fetch result. Returns `false` when the ticket is stale and
    /// the result was dropped.
    pub fn complete(
        &self,
        ticket: FetchTicket,
        result: Result<WeatherBundle, WeatherError>,
    ) -> bool {
        let generations = self.generations.lock();
        if generations.latest.get(&ticket.key) != Some(&ticket.generation) {
            tracing::debug!(
                "Dropping stale result for {} (generation {})",
                ticket.key,
                ticket.generation
            );
            return false;
        }

        let key = ticket.key;
        self.state.send_modify(|state| {
            state.loading.insert(key.clone(), false);
            match result {
                Ok(bundle) => {
                    state.records.insert(key.clone(), bundle.current);
                    state.forecasts.insert(key.clone(), bundle.daily);
                    state.hourly.insert(key.clone(), bundle.hourly);
                    state.errors.remove(&key);
                }
                Err(e) => {
                    tracing::warn!("Weather fetch for {} failed: {}", key, e);
                    state.errors.insert(key.clone(), e.to_string());
                }
            }
        });

        true
    }

    /// Fetch `query` and commit the result. The provider outcome is returned
    /// even if a newer fetch superseded this one.
    pub async fn fetch(&self, query: &PlaceQuery) -> Result<(), WeatherError> {
        let ticket = self.begin(query);
        let result = self.source.fetch(query).await;
        let outcome = match &result {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone()),
        };
        self.complete(ticket, result);
        outcome
    }

    /// Run [`fetch`](Self::fetch) on the runtime without waiting for it.
    pub fn spawn_fetch(self: &Arc<Self>, query: PlaceQuery) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let _ = store.fetch(&query).await;
        })
    }

    /// Remove every trace of `key`. An in-flight fetch for it is dropped on
    /// completion.
    pub fn dismiss(&self, key: &str) {
        let mut generations = self.generations.lock();
        generations.latest.remove(key);
        self.state.send_modify(|state| state.remove(key));
        tracing::debug!("Dismissed {}", key);
    }

    /// Fetch every query concurrently and wait for all of them.
    pub async fn refresh_all(self: &Arc<Self>, queries: Vec<PlaceQuery>) {
        if queries.is_empty() {
            return;
        }

        let total = queries.len();
        let mut tasks = JoinSet::new();
        for query in queries {
            let store = Arc::clone(self);
            tasks.spawn(async move { store.fetch(&query).await.is_ok() });
        }

        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::warn!("Refresh task aborted: {}", e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            tracing::warn!("Refreshed {} places, {} failed", total, failed);
        } else {
            tracing::info!("Refreshed {} places", total);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use async_trait::async_trait;
    use skycast_weather::Coordinates;
    use tokio::sync::oneshot;

    fn bundle(city: &str, temperature: f64) -> WeatherBundle {
        WeatherBundle {
            current: WeatherRecord {
                id: 1,
                city: city.to_string(),
                coordinates: Coordinates::new(0.0, 0.0),
                temperature,
                feels_like: temperature,
                condition: "Clear".into(),
                description: "clear sky".into(),
                humidity: 50,
                wind_speed: 1.0,
                wind_direction: 90,
                pressure: 1013.0,
                dew_point: 9.0,
                precipitation: 0.0,
                uv_index: 0.0,
                icon: "01d".into(),
                air_quality: None,
                sunrise: None,
                sunset: None,
            },
            daily: vec![],
            hourly: vec![],
        }
    }

    /// Answers from a fixed table; unknown names are not found.
    struct TableSource(HashMap<String, f64>);

    #[async_trait]
    impl WeatherSource for TableSource {
        async fn fetch(&self, query: &PlaceQuery) -> Result<WeatherBundle, WeatherError> {
            let key = query.key();
            match self.0.get(&key) {
                Some(t) => Ok(bundle(&key, *t)),
                None => Err(WeatherError::PlaceNotFound(key)),
            }
        }
    }

    /// Blocks each fetch until the test releases it.
    struct GatedSource {
        gates: Mutex<Vec<oneshot::Receiver<Result<WeatherBundle, WeatherError>>>>,
    }

    #[async_trait]
    impl WeatherSource for GatedSource {
        async fn fetch(&self, _query: &PlaceQuery) -> Result<WeatherBundle, WeatherError> {
            let gate = self.gates.lock().remove(0);
            gate.await.unwrap()
        }
    }

    fn table(entries: &[(&str, f64)]) -> Arc<CityWeatherStore> {
        let map = entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Arc::new(CityWeatherStore::new(Arc::new(TableSource(map))))
    }

    #[tokio::test]
    async fn test_fetch_success_is_ready() {
        let store = table(&[("London", 12.0)]);
        store.fetch(&PlaceQuery::name("London")).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.status("London"), PlaceStatus::Ready);
        assert_eq!(state.record("London").unwrap().temperature, 12.0);
        assert_eq!(state.loading.get("London"), Some(&false));
        assert!(state.error("London").is_none());
    }

    #[tokio::test]
    async fn test_not_found_is_failed_never_ready() {
        let store = table(&[]);
        let err = store.fetch(&PlaceQuery::name("Atlantis")).await.unwrap_err();
        assert!(err.to_string().contains("Atlantis"));

        let state = store.snapshot();
        assert_eq!(state.status("Atlantis"), PlaceStatus::Failed);
        assert!(state.record("Atlantis").is_none());
        let msg = state.error("Atlantis").unwrap();
        assert!(msg.contains("Atlantis") && msg.contains("not found"));
    }

    #[tokio::test]
    async fn test_failure_keeps_stale_record() {
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let source = GatedSource {
            gates: Mutex::new(vec![rx1, rx2]),
        };
        let store = Arc::new(CityWeatherStore::new(Arc::new(source)));
        let query = PlaceQuery::name("Paris");

        tx1.send(Ok(bundle("Paris", 20.0))).unwrap();
        store.fetch(&query).await.unwrap();

        tx2.send(Err(WeatherError::Connectivity)).unwrap();
        assert!(store.fetch(&query).await.is_err());

        let state = store.snapshot();
        assert_eq!(state.status("Paris"), PlaceStatus::Failed);
        assert_eq!(state.record("Paris").unwrap().temperature, 20.0);
    }

    #[tokio::test]
    async fn test_begin_clears_previous_error() {
        let store = table(&[]);
        let query = PlaceQuery::name("Nowhere");
        let _ = store.fetch(&query).await;
        assert!(store.snapshot().error("Nowhere").is_some());

        let _ticket = store.begin(&query);
        let state = store.snapshot();
        assert!(state.error("Nowhere").is_none());
        assert_eq!(state.status("Nowhere"), PlaceStatus::Loading);
    }

    #[tokio::test]
    async fn test_fetch_then_dismiss_leaves_no_trace() {
        let store = table(&[("Rome", 25.0)]);
        store.fetch(&PlaceQuery::name("Rome")).await.unwrap();
        store.dismiss("Rome");

        let state = store.snapshot();
        assert!(!state.contains("Rome"));
        assert_eq!(state.status("Rome"), PlaceStatus::Idle);
    }

    #[tokio::test]
    async fn test_dismiss_during_flight_drops_result() {
        let store = table(&[("Rome", 25.0)]);
        let query = PlaceQuery::name("Rome");

        let ticket = store.begin(&query);
        store.dismiss("Rome");
        let committed = store.complete(ticket, Ok(bundle("Rome", 25.0)));

        assert!(!committed);
        assert!(!store.snapshot().contains("Rome"));
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let store = table(&[]);
        let query = PlaceQuery::name("Oslo");

        let first = store.begin(&query);
        let second = store.begin(&query);

        // the newer request resolves first
        assert!(store.complete(second, Ok(bundle("Oslo", 3.0))));
        assert!(!store.complete(first, Ok(bundle("Oslo", -7.0))));

        let state = store.snapshot();
        assert_eq!(state.record("Oslo").unwrap().temperature, 3.0);
        assert_eq!(state.status("Oslo"), PlaceStatus::Ready);
    }

    #[tokio::test]
    async fn test_older_completion_keeps_loading() {
        let store = table(&[]);
        let query = PlaceQuery::name("Oslo");

        let first = store.begin(&query);
        let _second = store.begin(&query);
        store.complete(first, Ok(bundle("Oslo", -7.0)));

        assert_eq!(store.status("Oslo"), PlaceStatus::Loading);
        assert!(store.snapshot().record("Oslo").is_none());
    }

    #[tokio::test]
    async fn test_keyed_by_requested_key() {
        let store = table(&[("48.85,2.35", 18.0)]);
        let query = PlaceQuery::Coordinates(Coordinates::new(48.85, 2.35));
        store.fetch(&query).await.unwrap();
        assert!(store.snapshot().record("48.85,2.35").is_some());
    }

    #[tokio::test]
    async fn test_refresh_all_fans_out() {
        let store = table(&[("Paris", 20.0), ("Tokyo", 28.0)]);
        store
            .refresh_all(vec![
                PlaceQuery::name("Paris"),
                PlaceQuery::name("Tokyo"),
                PlaceQuery::name("Atlantis"),
            ])
            .await;

        let state = store.snapshot();
        assert_eq!(state.status("Paris"), PlaceStatus::Ready);
        assert_eq!(state.status("Tokyo"), PlaceStatus::Ready);
        assert_eq!(state.status("Atlantis"), PlaceStatus::Failed);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let store = table(&[("Lima", 19.0)]);
        let mut rx = store.subscribe();

        store.spawn_fetch(PlaceQuery::name("Lima")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status("Lima"), PlaceStatus::Ready);
    }
}
