//! Dashboard services for SkyCast
//!
//! Observable stores for per-place weather and user preferences, debounced
//! city search, background refresh, and the `Dashboard` that wires them up.

pub mod city_store;
pub mod dashboard;
pub mod preferences;
pub mod refresh;
pub mod search;

pub use city_store::{CityWeatherStore, FetchTicket, PlaceStatus, WeatherState};
pub use dashboard::Dashboard;
pub use preferences::{PreferenceStore, Preferences, Theme};
pub use refresh::RefreshScheduler;
pub use search::{CitySearch, Debouncer, DEFAULT_DEBOUNCE};
