use std::fmt;

use crate::{
    geo_point::GeoPoint,
    projection::{PixelPoint, ProjectionEngine},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GREEN: Color = Color::rgb(0x4C, 0xAF, 0x50);
    pub const RED: Color = Color::rgb(0xF4, 0x43, 0x36);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    pub round: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub radius: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStyle {
    pub line: StrokeStyle,
    pub start_marker: Marker,
    pub current_marker: Marker,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            line: StrokeStyle {
                color: Color::GREEN,
                width: 3.,
                round: true,
            },
            start_marker: Marker {
                radius: 6.,
                color: Color::GREEN,
            },
            current_marker: Marker {
                radius: 4.,
                color: Color::RED,
            },
        }
    }
}

/// Anything that can draw lines and dots in pixel space.
pub trait DrawingSurface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    /// Called when the viewport changes size. The next draw uses the new size.
    fn resize(&mut self, width: f64, height: f64);
    fn clear(&mut self);
    fn draw_polyline(&mut self, points: &[PixelPoint], stroke: &StrokeStyle);
    fn fill_circle(&mut self, center: PixelPoint, radius: f64, color: Color);
}

/// Draws an already projected route: the line, a start marker and a current position marker.
pub fn draw_route(surface: &mut impl DrawingSurface, points: &[PixelPoint], style: &RouteStyle) {
    surface.clear();

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };

    if points.len() > 1 {
        surface.draw_polyline(points, &style.line);
    }

    surface.fill_circle(*first, style.start_marker.radius, style.start_marker.color);
    surface.fill_circle(*last, style.current_marker.radius, style.current_marker.color);
}

/// Projects the route at the surface's current size and draws it.
pub fn render_route(surface: &mut impl DrawingSurface, route: &[GeoPoint], engine: &ProjectionEngine, style: &RouteStyle) {
    let points = engine.project(route, surface.width(), surface.height());
    draw_route(surface, &points, style);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Polyline(Vec<PixelPoint>, StrokeStyle),
    Circle(PixelPoint, f64, Color),
}

/// Remembers every draw call since the last clear.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
    pub clear_count: usize,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            clear_count: 0,
        }
    }
}

impl DrawingSurface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.clear_count += 1;
    }

    fn draw_polyline(&mut self, points: &[PixelPoint], stroke: &StrokeStyle) {
        self.commands.push(DrawCommand::Polyline(points.to_vec(), *stroke));
    }

    fn fill_circle(&mut self, center: PixelPoint, radius: f64, color: Color) {
        self.commands.push(DrawCommand::Circle(center, radius, color));
    }
}
