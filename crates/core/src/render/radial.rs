use std::f32::consts::TAU;

use super::StyleRenderer;
use crate::{FrequencySampleFrame, Point, RenderParameters, Stroke, Surface};

const SPOKE_SCALE: f32 = 0.1;
const LINE_WIDTH: f32 = 2.0;
const RADIUS_DIVISOR: f32 = 8.0;
/// Only one bin in this many contributes a spoke.
const BIN_DIVISOR: usize = 10;

/// A centred circle with one outward spoke per retained bin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Radial;

impl Radial {
    pub fn spoke_count(frame_len: usize) -> usize {
        frame_len / BIN_DIVISOR
    }

    pub fn radius(width: f32, height: f32) -> f32 {
        width.min(height) / RADIUS_DIVISOR
    }

    /// Start and end point of every spoke, starting at angle zero and
    /// proceeding clockwise in screen coordinates.
    pub fn spokes(
        frame: &FrequencySampleFrame,
        sensitivity: f32,
        width: f32,
        height: f32,
    ) -> Vec<(Point, Point)> {
        let count = Self::spoke_count(frame.len());
        let centre = Point::new(width * 0.5, height * 0.5);
        let radius = Self::radius(width, height);

        frame.bins()[..count]
            .iter()
            .enumerate()
            .map(|(i, &magnitude)| {
                let angle = i as f32 / count as f32 * TAU;
                let (sin, cos) = angle.sin_cos();
                let outer = radius + magnitude as f32 * sensitivity * SPOKE_SCALE;
                (
                    Point::new(centre.x + cos * radius, centre.y + sin * radius),
                    Point::new(centre.x + cos * outer, centre.y + sin * outer),
                )
            })
            .collect()
    }
}

impl StyleRenderer for Radial {
    fn render(
        &self,
        frame: &FrequencySampleFrame,
        params: &RenderParameters,
        surface: &mut dyn Surface,
    ) {
        if Self::spoke_count(frame.len()) == 0 {
            return;
        }

        let (width, height) = (surface.width() as f32, surface.height() as f32);
        let stroke = Stroke::new(params.color(), LINE_WIDTH);

        surface.stroke_circle(
            Point::new(width * 0.5, height * 0.5),
            Self::radius(width, height),
            stroke,
        );

        for (inner, outer) in Self::spokes(frame, params.sensitivity(), width, height) {
            surface.stroke_polyline(&[inner, outer], stroke);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DrawCommand, RecordingSurface};

    fn count_kinds(surface: &RecordingSurface) -> (usize, usize) {
        surface
            .commands()
            .iter()
            .fold((0, 0), |(circles, spokes), command| match command {
                DrawCommand::StrokeCircle { .. } => (circles + 1, spokes),
                DrawCommand::StrokePolyline { .. } => (circles, spokes + 1),
                DrawCommand::FillRect { .. } => (circles, spokes),
            })
    }

    #[test]
    fn draws_circle_and_a_tenth_of_the_bins() {
        for len in [10, 19, 100, 1024] {
            let mut surface = RecordingSurface::new(400, 300);
            let frame = FrequencySampleFrame::new(vec![50; len]);
            Radial.render(&frame, &RenderParameters::default(), &mut surface);
            assert_eq!(count_kinds(&surface), (1, len / 10), "frame length {len}");
        }
    }

    #[test]
    fn short_frames_draw_nothing() {
        let mut surface = RecordingSurface::new(400, 300);
        let frame = FrequencySampleFrame::new(vec![255; 9]);
        Radial.render(&frame, &RenderParameters::default(), &mut surface);
        assert!(surface.is_blank());
    }

    #[test]
    fn circle_uses_an_eighth_of_the_short_side() {
        let mut surface = RecordingSurface::new(800, 400);
        let frame = FrequencySampleFrame::silent(40);
        Radial.render(&frame, &RenderParameters::default(), &mut surface);

        let DrawCommand::StrokeCircle { center, radius, stroke } = &surface.commands()[0] else {
            panic!("circle must be drawn first");
        };
        assert_eq!(*center, Point::new(400.0, 200.0));
        assert_eq!(*radius, 50.0);
        assert_eq!(stroke.width, 2.0);
    }

    #[test]
    fn spokes_start_on_the_circle_and_scale_with_magnitude() {
        let mut bins = vec![0; 20];
        bins[0] = 100;
        bins[2] = 200;
        let frame = FrequencySampleFrame::new(bins);
        let spokes = Radial::spokes(&frame, 2.0, 400.0, 400.0);
        assert_eq!(spokes.len(), 2);

        let (inner, outer) = spokes[0];
        assert!((inner.x - 250.0).abs() < 1e-3);
        assert!((inner.y - 200.0).abs() < 1e-3);
        assert!((outer.x - (250.0 + 100.0 * 2.0 * 0.1)).abs() < 1e-3);

        // Second spoke points straight left (half a turn).
        let (inner, outer) = spokes[1];
        assert!((inner.x - 150.0).abs() < 1e-3);
        assert!((outer.x - 150.0).abs() < 1e-3);
    }
}
