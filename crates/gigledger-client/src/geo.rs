//! Coordinates and routes shown alongside a service on the map.

use serde::{Deserialize, Serialize};

use gigledger_types::constants::EARTH_RADIUS_M;

/// A WGS-84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Returns `None` if either component is out of range or not finite.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    /// Parse a literal `"lat, lon"` pair.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lon) = text.split_once(',')?;
        Self::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?)
    }

    /// Great-circle distance in metres.
    #[must_use]
    pub fn haversine_m(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// A drawable path between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Polyline vertices, first is the start and last is the end.
    pub points: Vec<Coordinates>,
    pub distance_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
        assert!(Coordinates::new(45.0, 120.0).is_some());
    }

    #[test]
    fn parses_literal_pairs() {
        let c = Coordinates::parse(" 51.5074 , -0.1278 ").unwrap();
        assert!((c.lat - 51.5074).abs() < 1e-9);
        assert!((c.lon + 0.1278).abs() < 1e-9);
        assert!(Coordinates::parse("Baker Street").is_none());
        assert!(Coordinates::parse("1,2,3").is_none());
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let a = Coordinates::new(0.0, 0.0).unwrap();
        let b = Coordinates::new(1.0, 0.0).unwrap();
        let d = a.haversine_m(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
        assert!(a.haversine_m(&a).abs() < f64::EPSILON);
    }
}
