//! Device position lookup.

use async_trait::async_trait;

use crate::types::{Coordinates, LocationError};

/// Something that can report where the user is.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A fixed position, e.g. from configuration. `None` reports the service as
/// unavailable.
#[derive(Debug, Clone, Default)]
pub struct StaticLocation {
    position: Option<Coordinates>,
}

impl StaticLocation {
    pub fn new(position: Coordinates) -> Self {
        Self {
            position: Some(position),
        }
    }

    pub fn unavailable() -> Self {
        Self { position: None }
    }
}

#[async_trait]
impl LocationSource for StaticLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.position.ok_or(LocationError::Unavailable)
    }
}
