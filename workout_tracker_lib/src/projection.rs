//! Maps a route onto a canvas.
//!
//! The projection is a local equirectangular approximation around the center of
//! the route's bounding box. It is only accurate for routes that do not span a
//! large range of latitudes, which holds for any single workout.

use crate::geo_point::{GeoBounds, GeoPoint};

/// Meters per degree of latitude, taken at the equator.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.;
/// Below this extent on both axes the route is drawn at a fixed zoom.
pub const MIN_VISIBLE_EXTENT_M: f64 = 50.;
/// Roughly 22 meters. Applied to an axis where all points share one value.
pub const DEGENERATE_BUFFER_DEG: f64 = 0.0002;

/// A position on the canvas in pixels. Y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub meters_per_degree_lat: f64,
    pub min_visible_extent_m: f64,
    pub degenerate_buffer_deg: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            meters_per_degree_lat: METERS_PER_DEGREE_LAT,
            min_visible_extent_m: MIN_VISIBLE_EXTENT_M,
            degenerate_buffer_deg: DEGENERATE_BUFFER_DEG,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Projects every point onto a `width` x `height` canvas, keeping order and length.
    ///
    /// The whole route fits the canvas with its aspect ratio preserved and north up.
    pub fn project(&self, points: &[GeoPoint], width: f64, height: f64) -> Vec<PixelPoint> {
        let Some(bounds) = GeoBounds::from_points(points) else {
            return Vec::new();
        };
        let bounds = bounds.with_degenerate_buffer(self.config.degenerate_buffer_deg);

        let center = bounds.center();
        let meters_per_degree_lat = self.config.meters_per_degree_lat;
        let meters_per_degree_lon = meters_per_degree_lat * center.latitude.to_radians().cos();

        let width_m = bounds.lon_extent_deg() * meters_per_degree_lon;
        let height_m = bounds.lat_extent_deg() * meters_per_degree_lat;

        let (scale_x, scale_y) = if width_m < self.config.min_visible_extent_m && height_m < self.config.min_visible_extent_m {
            (width / self.config.min_visible_extent_m, height / self.config.min_visible_extent_m)
        } else {
            (width / width_m, height / height_m)
        };

        let mut scale = scale_x.min(scale_y);
        if !scale.is_finite() || scale == 0. {
            scale = 1.;
        }

        let (origin_x, origin_y) = (width / 2., height / 2.);

        points
            .iter()
            .map(|point| {
                let offset_x = (point.longitude - center.longitude) * meters_per_degree_lon * scale;
                let offset_y = (point.latitude - center.latitude) * meters_per_degree_lat * scale;
                PixelPoint::new(origin_x + offset_x, origin_y - offset_y)
            })
            .collect()
    }
}

/// Projects with the default tuning constants.
pub fn project(points: &[GeoPoint], width: f64, height: f64) -> Vec<PixelPoint> {
    ProjectionEngine::default().project(points, width, height)
}
