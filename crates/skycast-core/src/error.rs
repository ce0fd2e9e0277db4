//! Centralized error types for the SkyCast core.
//!
//! Weather, location and auth errors live next to the code that raises them
//! (see `skycast-weather` and `skycast-auth`); this module covers the errors
//! every crate shares: startup configuration and durable storage.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    /// Recover the typed error when one is wrapped, so `user_message()`
    /// stays specific.
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ConfigError>() {
            Ok(e) => return AppError::Config(e),
            Err(err) => err,
        };
        let err = match err.downcast::<StorageError>() {
            Ok(e) => return AppError::Storage(e),
            Err(err) => err,
        };
        match err.downcast::<std::io::Error>() {
            Ok(e) => AppError::Io(e),
            Err(err) => AppError::Other(err),
        }
    }
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration errors. `MissingSecrets` and `Invalid` abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing required environment variables:\n{}\n\n\
         Please check that:\n\
         1. The variables are exported in the shell that starts SkyCast\n\
         2. The variable names are spelled exactly as listed above\n\
         3. SkyCast was restarted after setting them",
        .0.join("\n")
    )]
    MissingSecrets(Vec<String>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration directory unavailable")]
    NoConfigDir,
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::MissingSecrets(_) => {
                "Required credentials are missing. Check your environment."
            }
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::NoConfigDir => "Could not locate a configuration directory.",
        }
    }
}

/// Durable key/value storage errors.
///
/// These never reach the user: callers log them and fall back to defaults.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage read failed: {0}")]
    Read(String),

    #[error("Storage write failed: {0}")]
    Write(String),

    #[error("Stored value is corrupt for key {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl StorageError {
    pub fn corrupt(key: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Corrupt {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Read(_) | StorageError::Corrupt { .. } => {
                "Saved settings could not be read. Defaults are in use."
            }
            StorageError::Write(_) => "Settings could not be saved.",
        }
    }
}
