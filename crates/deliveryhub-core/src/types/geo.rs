//! Geographic position reported by delivery agents.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
///
/// No range or projection checks are applied; the hub only relays what the
/// agent reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

impl Position {
    /// Creates a new position.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}
