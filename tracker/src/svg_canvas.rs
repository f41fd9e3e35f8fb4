use plotters::prelude::{Circle, Color as _, IntoDrawingArea, PathElement, RGBColor, SVGBackend};
use workout_tracker_lib::{
    projection::PixelPoint,
    render::{Color, DrawingSurface, StrokeStyle},
};

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Polyline(Vec<PixelPoint>, StrokeStyle),
    Circle(PixelPoint, f64, Color),
}

/// A drawing surface that keeps the current frame and renders it to SVG on demand.
///
/// Coordinates are rounded to whole pixels. Line caps are left to the backend.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: f64,
    height: f64,
    shapes: Vec<Shape>,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn to_svg(&self) -> anyhow::Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (to_pixels(self.width), to_pixels(self.height))).into_drawing_area();

            for shape in &self.shapes {
                match shape {
                    Shape::Polyline(points, stroke) => {
                        let path: Vec<(i32, i32)> = points.iter().map(to_coord).collect();
                        let style = to_rgb(stroke.color).stroke_width(to_pixels(stroke.width));
                        root.draw(&PathElement::new(path, style))
                            .map_err(|err| anyhow::anyhow!("Failed to draw route: {}", err))?;
                    },
                    Shape::Circle(center, radius, color) => {
                        root.draw(&Circle::new(to_coord(center), to_pixels(*radius), to_rgb(*color).filled()))
                            .map_err(|err| anyhow::anyhow!("Failed to draw marker: {}", err))?;
                    },
                }
            }

            root.present().map_err(|err| anyhow::anyhow!("Failed to write SVG: {}", err))?;
        }
        Ok(svg)
    }
}

fn to_rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn to_coord(point: &PixelPoint) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

fn to_pixels(length: f64) -> u32 {
    length.round().max(0.) as u32
}

impl DrawingSurface for SvgCanvas {
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
        self.shapes.clear();
    }

    fn draw_polyline(&mut self, points: &[PixelPoint], stroke: &StrokeStyle) {
        self.shapes.push(Shape::Polyline(points.to_vec(), *stroke));
    }

    fn fill_circle(&mut self, center: PixelPoint, radius: f64, color: Color) {
        self.shapes.push(Shape::Circle(center, radius, color));
    }
}
