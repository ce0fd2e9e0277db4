pub mod app;
pub mod config;
pub mod error;
pub mod storage;

pub use app::App;
pub use config::{
    Config, LocationConfig, SearchConfig, Secrets, StorageConfig, ValidationResult,
    WeatherConfig, GOOGLE_CLIENT_ID_VAR, WEATHER_API_KEY_VAR,
};
pub use error::{AppError, ConfigError, StorageError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("SkyCast core initialized");
    Ok(())
}
