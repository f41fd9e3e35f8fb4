use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::distance::haversine_distance;

/// A recorded position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great circle distance in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

// geo-types uses x = longitude, y = latitude
impl From<Point> for GeoPoint {
    fn from(point: Point) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<GeoPoint> for Point {
    fn from(point: GeoPoint) -> Self {
        Point::new(point.longitude, point.latitude)
    }
}

/// A position as delivered by a sample source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimestampedGeoPoint {
    pub position: GeoPoint,
    /// Milliseconds since the unix epoch.
    pub timestamp_ms: i64,
}

impl TimestampedGeoPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            position: GeoPoint::new(latitude, longitude),
            timestamp_ms,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.position.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.position.longitude
    }
}

/// Bounding box of a route. Never stored, always derived from the points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Scans the points. Returns `None` for an empty route.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;

        let mut bounds = GeoBounds {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };

        for point in &points[1..] {
            bounds.min_lat = bounds.min_lat.min(point.latitude);
            bounds.max_lat = bounds.max_lat.max(point.latitude);
            bounds.min_lon = bounds.min_lon.min(point.longitude);
            bounds.max_lon = bounds.max_lon.max(point.longitude);
        }

        Some(bounds)
    }

    /// Widens every collapsed axis symmetrically by `buffer_deg`.
    pub fn with_degenerate_buffer(mut self, buffer_deg: f64) -> Self {
        if self.min_lat == self.max_lat {
            self.min_lat -= buffer_deg;
            self.max_lat += buffer_deg;
        }
        if self.min_lon == self.max_lon {
            self.min_lon -= buffer_deg;
            self.max_lon += buffer_deg;
        }
        self
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.min_lat + self.max_lat) / 2., (self.min_lon + self.max_lon) / 2.)
    }

    pub fn lat_extent_deg(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_extent_deg(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}
