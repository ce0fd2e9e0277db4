use std::sync::Arc;

use anyhow::Result;

use crate::config::{Config, Secrets};
use crate::error::AppError;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

/// Application bootstrap: validated configuration, secrets and durable storage.
///
/// Construction fails when configuration is invalid or a required secret is
/// missing; both abort startup.
pub struct App {
    config: Arc<Config>,
    secrets: Secrets,
    storage: Arc<dyn KeyValueStore>,
}

impl App {
    /// Create a new application instance from the default config location and
    /// the process environment.
    pub fn new() -> Result<Self, AppError> {
        let secrets = Secrets::from_env()?;
        let (config, _warnings) = Config::load_validated()?;
        Ok(Self::with_parts(config, secrets))
    }

    /// Assemble an application from already-loaded parts.
    pub fn with_parts(config: Config, secrets: Secrets) -> Self {
        let storage = open_storage(&config);
        Self {
            config: Arc::new(config),
            secrets,
            storage,
        }
    }

    /// Replace the storage backend.
    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = storage;
        self
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        self.storage.clone()
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down SkyCast");
        Ok(())
    }
}

/// Open the on-disk store, falling back to memory when it is unusable.
fn open_storage(config: &Config) -> Arc<dyn KeyValueStore> {
    let path = config.storage_path();
    match FileStore::open(&path) {
        Ok(store) => {
            tracing::info!("Using storage file {:?}", path);
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "Storage at {:?} unavailable ({}); preferences will not survive restart",
                path,
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
