use std::path::Path;

use tiny_skia::{
    Color, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Shader, SpreadMode,
    Transform,
};

use super::{Fill, LineJoin, Point, Rect, Stroke, Surface};
use crate::{Result, Rgb, VisualiserError};

/// Anti-aliased raster surface backed by a [`tiny_skia::Pixmap`].
#[derive(Debug, Clone)]
pub struct PixelSurface {
    pixmap: Pixmap,
    background: Rgb,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32, background: Rgb) -> Result<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            VisualiserError::InvalidConfig(format!(
                "cannot allocate a {width}x{height} pixel surface"
            ))
        })?;
        pixmap.fill(to_color(background));
        Ok(Self { pixmap, background })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let pixel = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgb::new(pixel.red(), pixel.green(), pixel.blue()))
    }

    /// Counts pixels that differ from the background.
    pub fn painted_pixels(&self) -> usize {
        self.pixmap
            .pixels()
            .iter()
            .map(|pixel| pixel.demultiply())
            .filter(|pixel| Rgb::new(pixel.red(), pixel.green(), pixel.blue()) != self.background)
            .count()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.pixmap.save_png(path).map_err(|err| {
            VisualiserError::msg(format!("failed to write {}: {err}", path.display()))
        })
    }

    fn stroke_path(&mut self, path: &tiny_skia::Path, stroke: Stroke) {
        if stroke.width <= 0.0 {
            return;
        }

        let mut paint = Paint {
            anti_alias: true,
            ..Default::default()
        };
        paint.set_color(to_color(stroke.color));

        let outline = tiny_skia::Stroke {
            width: stroke.width,
            line_join: match stroke.join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
            },
            ..Default::default()
        };
        self.pixmap.stroke_path(path, &paint, &outline, Transform::identity(), None);
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self) {
        self.pixmap.fill(to_color(self.background));
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        let Some(bounds) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
        else {
            return;
        };

        let mut paint = Paint {
            anti_alias: true,
            ..Default::default()
        };
        paint.shader = shader_for(fill, rect.x);
        self.pixmap.fill_rect(bounds, &paint, Transform::identity(), None);
    }

    fn stroke_polyline(&mut self, points: &[Point], stroke: Stroke) {
        let mut builder = PathBuilder::new();
        let mut last: Option<Point> = None;
        let mut segments = 0;

        for &point in points {
            match last {
                None => builder.move_to(point.x, point.y),
                Some(previous) if previous == point => continue,
                Some(_) => {
                    builder.line_to(point.x, point.y);
                    segments += 1;
                }
            }
            last = Some(point);
        }

        if segments == 0 {
            return;
        }
        if let Some(path) = builder.finish() {
            self.stroke_path(&path, stroke);
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke) {
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.stroke_path(&path, stroke);
        }
    }
}

/// Vertical gradients become a two-stop linear shader down the column at `x`.
fn shader_for(fill: Fill, x: f32) -> Shader<'static> {
    match fill {
        Fill::Solid(color) => Shader::SolidColor(to_color(color)),
        Fill::VerticalGradient {
            from_y,
            to_y,
            start,
            end,
        } => {
            if (to_y - from_y).abs() <= f32::EPSILON {
                return Shader::SolidColor(to_color(start));
            }
            LinearGradient::new(
                tiny_skia::Point::from_xy(x, from_y),
                tiny_skia::Point::from_xy(x, to_y),
                vec![
                    GradientStop::new(0.0, to_color(start)),
                    GradientStop::new(1.0, to_color(end)),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            )
            .unwrap_or(Shader::SolidColor(to_color(start)))
        }
    }
}

fn to_color(color: Rgb) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn surface(width: u32, height: u32) -> PixelSurface {
        PixelSurface::new(width, height, Rgb::BLACK).unwrap()
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        assert!(PixelSurface::new(0, 10, Rgb::BLACK).is_err());
    }

    #[test]
    fn fills_pixel_aligned_rect_exactly() {
        let mut surface = surface(10, 10);
        surface.fill_rect(Rect::new(2.0, 3.0, 4.0, 2.0), Fill::Solid(RED));

        assert_eq!(surface.painted_pixels(), 8);
        assert_eq!(surface.pixel(2, 3), Some(RED));
        assert_eq!(surface.pixel(5, 4), Some(RED));
        assert_eq!(surface.pixel(6, 4), Some(Rgb::BLACK));
    }

    #[test]
    fn empty_rect_paints_nothing() {
        let mut surface = surface(10, 10);
        surface.fill_rect(Rect::new(2.0, 5.0, 4.0, 0.0), Fill::Solid(RED));
        assert_eq!(surface.painted_pixels(), 0);
    }

    #[test]
    fn gradient_darkens_towards_the_far_edge() {
        let mut surface = surface(4, 20);
        surface.fill_rect(
            Rect::new(0.0, 0.0, 4.0, 20.0),
            Fill::VerticalGradient {
                from_y: 20.0,
                to_y: 0.0,
                start: RED,
                end: Rgb::BLACK,
            },
        );

        let near = surface.pixel(0, 19).unwrap();
        let far = surface.pixel(0, 0).unwrap();
        assert!(near.r > far.r);
        assert!(near.r > 200);
        assert!(far.r < 20);
    }

    #[test]
    fn clips_shapes_outside_the_surface() {
        let mut surface = surface(8, 8);
        surface.fill_rect(Rect::new(-20.0, -20.0, 10.0, 10.0), Fill::Solid(RED));
        surface.stroke_polyline(
            &[Point::new(-5.0, 50.0), Point::new(50.0, 50.0)],
            Stroke::new(RED, 2.0),
        );
        assert_eq!(surface.painted_pixels(), 0);
    }

    #[test]
    fn strokes_horizontal_line_with_its_width() {
        let mut surface = surface(20, 20);
        surface.stroke_polyline(
            &[Point::new(2.0, 10.0), Point::new(12.0, 10.0)],
            Stroke::new(RED, 2.0),
        );

        assert_eq!(surface.pixel(5, 9), Some(RED));
        assert_eq!(surface.pixel(5, 10), Some(RED));
        assert_eq!(surface.pixel(5, 8), Some(Rgb::BLACK));
        assert_eq!(surface.pixel(5, 11), Some(Rgb::BLACK));
    }

    #[test]
    fn zero_length_polyline_paints_nothing() {
        let mut surface = surface(20, 20);
        let point = Point::new(10.0, 10.0);
        surface.stroke_polyline(&[point, point], Stroke::new(RED, 2.0));
        surface.stroke_polyline(&[point], Stroke::new(RED, 2.0));
        assert_eq!(surface.painted_pixels(), 0);
    }

    #[test]
    fn round_join_trims_the_miter_tip() {
        let apex = [
            Point::new(5.0, 20.0),
            Point::new(15.0, 5.0),
            Point::new(25.0, 20.0),
        ];

        let mut miter = surface(30, 30);
        miter.stroke_polyline(&apex, Stroke::new(RED, 6.0));

        let mut round = surface(30, 30);
        round.stroke_polyline(&apex, Stroke::new(RED, 6.0).with_join(LineJoin::Round));

        assert!(round.painted_pixels() < miter.painted_pixels());
        assert_ne!(miter.pixel(15, 1), Some(Rgb::BLACK));
        assert_eq!(round.pixel(15, 1), Some(Rgb::BLACK));
    }

    #[test]
    fn circle_outline_leaves_centre_empty() {
        let mut surface = surface(40, 40);
        surface.stroke_circle(Point::new(20.0, 20.0), 10.0, Stroke::new(RED, 2.0));

        assert_eq!(surface.pixel(20, 20), Some(Rgb::BLACK));
        assert_ne!(surface.pixel(29, 19), Some(Rgb::BLACK));
        assert!(surface.painted_pixels() > 0);
    }

    #[test]
    fn clear_restores_background() {
        let mut surface = PixelSurface::new(10, 10, Rgb::new(1, 2, 3)).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Fill::Solid(RED));
        surface.clear();

        assert_eq!(surface.painted_pixels(), 0);
        assert_eq!(surface.pixel(0, 0), Some(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn writes_png_snapshots() {
        let mut surface = surface(16, 16);
        surface.fill_rect(Rect::new(4.0, 4.0, 8.0, 8.0), Fill::Solid(RED));

        let path = std::env::temp_dir().join(format!("pixel-surface-{}.png", std::process::id()));
        surface.save_png(&path).unwrap();
        let written = std::fs::metadata(&path).unwrap().len();
        let _ = std::fs::remove_file(&path);

        assert!(written > 0);
    }
}
