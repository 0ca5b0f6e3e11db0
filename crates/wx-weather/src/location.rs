//! Device location sources.

use std::future::Future;

use crate::types::{Coordinates, LocationError};

/// Something that can tell where the user is.
pub trait LocationSource {
    fn current_location(&self) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// Location taken from configuration or command-line flags.
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    enabled: bool,
    coordinates: Option<Coordinates>,
}

impl ConfiguredLocation {
    pub fn new(enabled: bool, coordinates: Option<(f64, f64)>) -> Self {
        Self {
            enabled,
            coordinates: coordinates.map(|(latitude, longitude)| Coordinates {
                latitude,
                longitude,
            }),
        }
    }
}

impl Default for ConfiguredLocation {
    /// Enabled with no coordinates, matching the default `[location]` section.
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl LocationSource for ConfiguredLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        if !self.enabled {
            return Err(LocationError::PermissionDenied);
        }
        self.coordinates.ok_or(LocationError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_configured_location() {
        let loc = ConfiguredLocation::new(true, Some((47.6062, -122.3321)));
        let coords = loc.current_location().await.unwrap();
        assert_eq!(coords.latitude, 47.6062);
        assert_eq!(coords.longitude, -122.3321);
    }

    #[tokio::test]
    async fn test_missing_coordinates_unsupported() {
        let loc = ConfiguredLocation::new(true, None);
        assert!(matches!(
            loc.current_location().await,
            Err(LocationError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn test_default_is_enabled_without_coordinates() {
        let defaults = wx_core::LocationConfig::default();
        let loc = ConfiguredLocation::default();
        assert!(defaults.enabled);
        assert!(matches!(
            loc.current_location().await,
            Err(LocationError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn test_disabled_is_permission_denied() {
        let loc = ConfiguredLocation::new(false, Some((1.0, 2.0)));
        assert!(matches!(
            loc.current_location().await,
            Err(LocationError::PermissionDenied)
        ));
    }
}
