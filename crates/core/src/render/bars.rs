use super::StyleRenderer;
use crate::{Fill, FrequencySampleFrame, Rect, RenderParameters, Rgb, Surface};

const HEIGHT_SCALE: f32 = 0.2;
const BAR_GAP: f32 = 1.0;

/// Mirrored vertical bars around the horizontal centre line.
///
/// Only the low-frequency half of the frame is drawn. Each bin owns an equal
/// slot of the surface width; the bar leaves a gap of at most one pixel to its right
/// neighbour. Both halves fade from the configured colour at the centre line
/// to black at their tips.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bars;

impl Bars {
    /// Returns the (upper, lower) rectangles for every bar pair, left to right.
    pub fn layout(
        frame: &FrequencySampleFrame,
        sensitivity: f32,
        width: f32,
        height: f32,
    ) -> Vec<(Rect, Rect)> {
        let count = frame.len() / 2;
        if count == 0 || width <= 0.0 {
            return Vec::new();
        }

        let slot = width / count as f32;
        let gap = BAR_GAP.min(slot * 0.5);
        let bar_width = slot - gap;
        let group_width = slot * count as f32 - gap;
        let left = (width - group_width) * 0.5;
        let centre_y = height * 0.5;

        frame.bins()[..count]
            .iter()
            .enumerate()
            .map(|(i, &magnitude)| {
                let x = left + i as f32 * slot;
                let bar_height = magnitude as f32 * sensitivity * HEIGHT_SCALE;
                (
                    Rect::new(x, centre_y - bar_height, bar_width, bar_height),
                    Rect::new(x, centre_y, bar_width, bar_height),
                )
            })
            .collect()
    }
}

impl StyleRenderer for Bars {
    fn render(
        &self,
        frame: &FrequencySampleFrame,
        params: &RenderParameters,
        surface: &mut dyn Surface,
    ) {
        let (width, height) = (surface.width() as f32, surface.height() as f32);
        let centre_y = height * 0.5;
        let color = params.color();

        for (upper, lower) in Self::layout(frame, params.sensitivity(), width, height) {
            surface.fill_rect(
                upper,
                Fill::VerticalGradient {
                    from_y: centre_y,
                    to_y: upper.y,
                    start: color,
                    end: Rgb::BLACK,
                },
            );
            surface.fill_rect(
                lower,
                Fill::VerticalGradient {
                    from_y: centre_y,
                    to_y: lower.y + lower.height,
                    start: color,
                    end: Rgb::BLACK,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DrawCommand, RecordingSurface};

    fn ramp(len: usize) -> FrequencySampleFrame {
        FrequencySampleFrame::new((0..len).map(|i| (i % 256) as u8).collect())
    }

    #[test]
    fn draws_one_pair_per_bin_in_the_lower_half() {
        for len in [0, 1, 2, 3, 17, 1024] {
            let frame = ramp(len);
            let mut surface = RecordingSurface::new(800, 400);
            Bars.render(&frame, &RenderParameters::default(), &mut surface);
            assert_eq!(surface.commands().len(), 2 * (len / 2), "frame length {len}");
        }
    }

    #[test]
    fn group_fits_and_is_centred() {
        for (len, width) in [(1024, 800.0), (10, 800.0), (64, 33.0), (4096, 100.0)] {
            let layout = Bars::layout(&ramp(len), 1.0, width, 300.0);
            let first = layout.first().unwrap().0;
            let last = layout.last().unwrap().0;
            let right = last.x + last.width;

            assert!(first.x >= 0.0);
            assert!(right <= width + 1e-3, "{right} exceeds {width}");
            assert!((first.x - (width - right)).abs() < 1e-3);
        }
    }

    #[test]
    fn bar_height_is_linear_in_sensitivity() {
        let frame = ramp(64);
        let single = Bars::layout(&frame, 2.0, 640.0, 480.0);
        let double = Bars::layout(&frame, 4.0, 640.0, 480.0);

        for (i, ((upper, lower), (upper2, _))) in single.iter().zip(double.iter()).enumerate() {
            let expected = frame.bins()[i] as f32 * 2.0 * 0.2;
            assert!((upper.height - expected).abs() < 1e-4);
            assert_eq!(upper.height, lower.height);
            assert!((upper2.height - 2.0 * upper.height).abs() < 1e-4);
        }
    }

    #[test]
    fn bars_straddle_the_centre_and_fade_outwards() {
        let frame = FrequencySampleFrame::new(vec![100, 0]);
        let mut surface = RecordingSurface::new(200, 200);
        let params = RenderParameters::default();
        Bars.render(&frame, &params, &mut surface);

        let [DrawCommand::FillRect {
            rect: upper,
            fill: upper_fill,
        }, DrawCommand::FillRect {
            rect: lower,
            fill: lower_fill,
        }] = surface.commands()
        else {
            panic!("expected exactly one pair of rectangles");
        };

        assert_eq!(upper.y + upper.height, 100.0);
        assert_eq!(lower.y, 100.0);
        assert_eq!(upper_fill.color_at(100.0), params.color());
        assert_eq!(upper_fill.color_at(upper.y), Rgb::BLACK);
        assert_eq!(lower_fill.color_at(100.0), params.color());
        assert_eq!(lower_fill.color_at(lower.y + lower.height), Rgb::BLACK);
    }

    #[test]
    fn silent_frame_yields_zero_height_bars() {
        let layout = Bars::layout(&FrequencySampleFrame::silent(32), 5.0, 320.0, 200.0);
        assert_eq!(layout.len(), 16);
        assert!(layout.iter().all(|(upper, lower)| upper.is_empty() && lower.is_empty()));
    }
}
