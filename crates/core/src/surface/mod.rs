//! Drawing targets for the renderers.
//!
//! Renderers only talk to the [`Surface`] trait. [`PixelSurface`] rasterises
//! into an RGBA buffer; [`RecordingSurface`] keeps the issued commands, which
//! is what headless hosts and the tests inspect.

mod raster;

pub use raster::PixelSurface;

use crate::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis aligned rectangle. `width` and `height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Rgb),
    /// Linear gradient along the y axis: `start` at `from_y`, `end` at `to_y`.
    VerticalGradient {
        from_y: f32,
        to_y: f32,
        start: Rgb,
        end: Rgb,
    },
}

impl Fill {
    /// Colour of the fill at the given y coordinate.
    pub fn color_at(&self, y: f32) -> Rgb {
        match *self {
            Fill::Solid(color) => color,
            Fill::VerticalGradient {
                from_y,
                to_y,
                start,
                end,
            } => {
                let span = to_y - from_y;
                if span.abs() <= f32::EPSILON {
                    start
                } else {
                    start.lerp(end, (y - from_y) / span)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
    pub join: LineJoin,
}

impl Stroke {
    pub fn new(color: Rgb, width: f32) -> Self {
        Self {
            color,
            width,
            join: LineJoin::Miter,
        }
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }
}

/// Raster drawing target with fixed dimensions.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Resets every pixel to the background.
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, fill: Fill);

    /// Strokes straight segments between consecutive points.
    fn stroke_polyline(&mut self, points: &[Point], stroke: Stroke);

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke);
}

/// A single call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, fill: Fill },
    StrokePolyline { points: Vec<Point>, stroke: Stroke },
    StrokeCircle { center: Point, radius: f32, stroke: Stroke },
}

/// Surface that records commands instead of drawing them.
///
/// `clear` drops the recorded commands, so [`commands`](Self::commands) always
/// describes what is visible since the last clear.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    clears: usize,
    draws: usize,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            clears: 0,
            draws: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// True when nothing has been drawn since the last clear.
    pub fn is_blank(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of `clear` calls over the surface's lifetime.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Number of draw calls over the surface's lifetime.
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    fn record(&mut self, command: DrawCommand) {
        self.draws += 1;
        self.commands.push(command);
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.commands.clear();
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        self.record(DrawCommand::FillRect { rect, fill });
    }

    fn stroke_polyline(&mut self, points: &[Point], stroke: Stroke) {
        self.record(DrawCommand::StrokePolyline {
            points: points.to_vec(),
            stroke,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke) {
        self.record(DrawCommand::StrokeCircle {
            center,
            radius,
            stroke,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_interpolates_between_stops() {
        let fill = Fill::VerticalGradient {
            from_y: 100.0,
            to_y: 0.0,
            start: Rgb::new(200, 100, 0),
            end: Rgb::BLACK,
        };

        assert_eq!(fill.color_at(100.0), Rgb::new(200, 100, 0));
        assert_eq!(fill.color_at(50.0), Rgb::new(100, 50, 0));
        assert_eq!(fill.color_at(-10.0), Rgb::BLACK);
    }

    #[test]
    fn zero_span_gradient_uses_start_colour() {
        let fill = Fill::VerticalGradient {
            from_y: 10.0,
            to_y: 10.0,
            start: Rgb::new(1, 2, 3),
            end: Rgb::BLACK,
        };
        assert_eq!(fill.color_at(10.0), Rgb::new(1, 2, 3));
    }

    #[test]
    fn recording_surface_forgets_commands_on_clear() {
        let mut surface = RecordingSurface::new(10, 10);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Fill::Solid(Rgb::BLACK));
        assert!(!surface.is_blank());

        surface.clear();
        assert!(surface.is_blank());
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(surface.draw_count(), 1);
    }

    #[test]
    fn rect_clamps_negative_extent() {
        let rect = Rect::new(0.0, 0.0, -5.0, 3.0);
        assert_eq!(rect.width, 0.0);
        assert!(rect.is_empty());
    }
}
