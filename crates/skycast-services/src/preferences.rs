//! User preferences: temperature unit, favorite cities and theme.
//!
//! Loaded once from durable storage; every mutation writes its own slice
//! back immediately. Storage problems are logged and never reach callers.

use std::str::FromStr;
use std::sync::Arc;

use skycast_core::KeyValueStore;
use skycast_weather::TemperatureUnit;
use tokio::sync::watch;

pub const FAVORITES_KEY: &str = "favoriteCities";
pub const TEMPERATURE_UNIT_KEY: &str = "temperatureUnit";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub temperature_unit: TemperatureUnit,
    /// Insertion-ordered, no duplicates
    pub favorite_cities: Vec<String>,
    pub theme: Theme,
}

pub struct PreferenceStore {
    state: watch::Sender<Preferences>,
    storage: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let preferences = Preferences {
            temperature_unit: read_scalar(storage.as_ref(), TEMPERATURE_UNIT_KEY)
                .unwrap_or_default(),
            favorite_cities: read_favorites(storage.as_ref()),
            theme: read_scalar(storage.as_ref(), THEME_KEY).unwrap_or_default(),
        };

        tracing::debug!(
            "Loaded preferences: unit={}, theme={}, {} favorites",
            preferences.temperature_unit.as_str(),
            preferences.theme.as_str(),
            preferences.favorite_cities.len()
        );

        let (state, _) = watch::channel(preferences);
        Self { state, storage }
    }

    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Preferences {
        self.state.borrow().clone()
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.state.borrow().temperature_unit
    }

    pub fn theme(&self) -> Theme {
        self.state.borrow().theme
    }

    pub fn favorites(&self) -> Vec<String> {
        self.state.borrow().favorite_cities.clone()
    }

    pub fn is_favorite(&self, city: &str) -> bool {
        self.state.borrow().favorite_cities.iter().any(|c| c == city)
    }

    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        self.state.send_modify(|p| p.temperature_unit = unit);
        self.write(TEMPERATURE_UNIT_KEY, unit.as_str());
    }

    pub fn set_theme(&self, theme: Theme) {
        self.state.send_modify(|p| p.theme = theme);
        self.write(THEME_KEY, theme.as_str());
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = self.theme().toggled();
        self.set_theme(theme);
        theme
    }

    /// Append `city` unless it is already a favorite.
    pub fn add_favorite(&self, city: &str) {
        let added = self.state.send_if_modified(|p| {
            if p.favorite_cities.iter().any(|c| c == city) {
                false
            } else {
                p.favorite_cities.push(city.to_string());
                true
            }
        });

        if added {
            self.write_favorites();
        }
    }

    pub fn remove_favorite(&self, city: &str) {
        self.state.send_modify(|p| p.favorite_cities.retain(|c| c != city));
        self.write_favorites();
    }

    fn write_favorites(&self) {
        let favorites = self.favorites();
        match serde_json::to_string(&favorites) {
            Ok(json) => self.write(FAVORITES_KEY, &json),
            Err(e) => tracing::warn!("Failed to serialize favorites: {}", e),
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }
}

fn read_raw(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", key, e);
            None
        }
    }
}

fn read_scalar<T>(storage: &dyn KeyValueStore, key: &str) -> Option<T>
where
    T: FromStr<Err = String>,
{
    let raw = read_raw(storage, key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring stored {}: {}", key, e);
            None
        }
    }
}

fn read_favorites(storage: &dyn KeyValueStore) -> Vec<String> {
    let Some(raw) = read_raw(storage, FAVORITES_KEY) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(list) => {
            let mut favorites: Vec<String> = Vec::with_capacity(list.len());
            for city in list {
                if !favorites.contains(&city) {
                    favorites.push(city);
                }
            }
            favorites
        }
        Err(e) => {
            tracing::warn!("Ignoring stored {}: {}", FAVORITES_KEY, e);
            Vec::new()
        }
    }
}
