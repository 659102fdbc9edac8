use super::StyleRenderer;
use crate::{FrequencySampleFrame, LineJoin, Point, RenderParameters, Stroke, Surface};

const AMPLITUDE_SCALE: f32 = 0.1;
const LINE_WIDTH: f32 = 2.0;

/// One connected trace across the full frame, rising above the centre line
/// in proportion to each magnitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct Waveform;

impl Waveform {
    /// Polyline vertices, one per bin.
    pub fn trace(
        frame: &FrequencySampleFrame,
        sensitivity: f32,
        width: f32,
        height: f32,
    ) -> Vec<Point> {
        let len = frame.len();
        if len == 0 {
            return Vec::new();
        }

        let spacing = width / len as f32;
        let start_x = width * 0.5 - len as f32 * spacing * 0.5;
        let centre_y = height * 0.5;
        let amplitude = sensitivity * AMPLITUDE_SCALE;

        frame
            .bins()
            .iter()
            .enumerate()
            .map(|(i, &magnitude)| {
                Point::new(
                    start_x + i as f32 * spacing,
                    centre_y - magnitude as f32 * amplitude,
                )
            })
            .collect()
    }
}

impl StyleRenderer for Waveform {
    fn render(
        &self,
        frame: &FrequencySampleFrame,
        params: &RenderParameters,
        surface: &mut dyn Surface,
    ) {
        let points = Self::trace(
            frame,
            params.sensitivity(),
            surface.width() as f32,
            surface.height() as f32,
        );
        if points.is_empty() {
            return;
        }

        let stroke = Stroke::new(params.color(), LINE_WIDTH).with_join(LineJoin::Round);
        surface.stroke_polyline(&points, stroke);
    }
}
