//! Coordinates and positioning fixes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub longitude: f64,
    pub latitude: f64,
}

impl Point {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(p: Point) -> Self {
        Self::new(p.longitude, p.latitude)
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

impl From<geo::Point<f64>> for Point {
    fn from(p: geo::Point<f64>) -> Self {
        Self::new(p.x(), p.y())
    }
}

/// One positioning sample from the host's location provider.
///
/// Snapped display locations reuse this type: the position fields are replaced
/// while bearing, speed, accuracy and timestamp are carried over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Course over ground in degrees, when the provider reports one
    #[serde(default)]
    pub bearing: Option<f64>,
    /// Ground speed in m/s
    #[serde(default)]
    pub speed: Option<f64>,
    /// Horizontal accuracy radius in meters
    #[serde(default)]
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl Location {
    /// A fix at the given coordinate with zero accuracy radius and no course.
    pub fn new(longitude: f64, latitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            bearing: None,
            speed: None,
            accuracy: 0.0,
            timestamp,
        }
    }

    pub fn at_point(point: Point, timestamp: DateTime<Utc>) -> Self {
        Self::new(point.longitude, point.latitude, timestamp)
    }

    #[must_use]
    pub const fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    #[must_use]
    pub const fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub const fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    /// Copy of this fix moved to `point`, keeping every other field.
    #[must_use]
    pub fn relocated(&self, point: Point) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            ..self.clone()
        }
    }
}
