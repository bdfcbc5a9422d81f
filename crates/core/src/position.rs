//! Coordinates and distance calculations.
//!
//! Distances use the haversine formula over the mean Earth radius.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::identifiers::ObjectiveId;

/// Decimal places kept in an objective key (~0.1 m of latitude).
pub const OBJECTIVE_KEY_PRECISION: usize = 6;

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<Coordinate> for Point {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lon, c.lat)
    }
}

impl From<Point> for Coordinate {
    fn from(p: Point) -> Self {
        Coordinate::new(p.y(), p.x())
    }
}

/// Great-circle distance between two coordinates in meters
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Stable identity for an objective at `position`.
///
/// Two loads of the same feature round to the same key. Jitter that straddles a rounding
/// boundary still produces distinct keys.
pub fn objective_key(position: Coordinate) -> ObjectiveId {
    ObjectiveId::new(format!(
        "{:.prec$},{:.prec$}",
        position.lat,
        position.lon,
        prec = OBJECTIVE_KEY_PRECISION
    ))
}
