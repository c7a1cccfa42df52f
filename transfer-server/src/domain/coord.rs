//! Geographic coordinates.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Create a coordinate from latitude and longitude in degrees.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true if both components are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    fn to_point(self) -> Point<f64> {
        // geo points are (x = lon, y = lat)
        Point::new(self.lon, self.lat)
    }
}

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_m(a: Coord, b: Coord) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}
