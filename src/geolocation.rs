use crate::config::GeolocationConfig;
use crate::error::GeolocationError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const LOCATION_UNAVAILABLE: &str = "Location unavailable";
pub const GEOLOCATION_NOT_SUPPORTED: &str = "Geolocation not supported";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

#[async_trait]
pub trait Geolocation: Send + Sync {
    async fn current_position(&self) -> Result<Position, GeolocationError>;
}

/// Reports the configured kiosk position
pub struct FixedGeolocation {
    position: Position,
}

impl FixedGeolocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position {
                latitude,
                longitude,
            },
        }
    }

    /// `None` when the kiosk has no configured position
    pub fn from_config(config: &GeolocationConfig) -> Option<Self> {
        config
            .position()
            .map(|(latitude, longitude)| Self::new(latitude, longitude))
    }
}

#[async_trait]
impl Geolocation for FixedGeolocation {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        Ok(self.position)
    }
}

/// Resolve the form's location string.
///
/// Never fails: a missing provider, an error or a timeout each map to a
/// placeholder string.
pub async fn resolve_location(provider: Option<Arc<dyn Geolocation>>, timeout: Duration) -> String {
    let Some(provider) = provider else {
        debug!("No geolocation provider configured");
        return GEOLOCATION_NOT_SUPPORTED.to_string();
    };

    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Ok(position)) => position.to_string(),
        Ok(Err(e)) => {
            warn!("Geolocation failed: {}", e);
            LOCATION_UNAVAILABLE.to_string()
        }
        Err(_) => {
            warn!("Geolocation timed out after {:?}", timeout);
            LOCATION_UNAVAILABLE.to_string()
        }
    }
}
