//! Style renderers.
//!
//! Every renderer maps one [`FrequencySampleFrame`] onto the surface using
//! the current [`RenderParameters`]. The caller clears the surface once per
//! tick; renderers never clear. Frames too short to yield a single bar or
//! spoke draw nothing.

mod bars;
mod radial;
mod waveform;

pub use bars::Bars;
pub use radial::Radial;
pub use waveform::Waveform;

use crate::{FrequencySampleFrame, RenderParameters, RenderStyle, Surface};

pub trait StyleRenderer {
    fn render(
        &self,
        frame: &FrequencySampleFrame,
        params: &RenderParameters,
        surface: &mut dyn Surface,
    );
}

/// Returns the renderer for a style.
pub fn renderer_for(style: RenderStyle) -> &'static dyn StyleRenderer {
    match style {
        RenderStyle::Bars => &Bars,
        RenderStyle::Waveform => &Waveform,
        RenderStyle::Radial => &Radial,
    }
}

/// Draws `frame` with whichever style `params` currently selects.
pub fn render_frame(
    frame: &FrequencySampleFrame,
    params: &RenderParameters,
    surface: &mut dyn Surface,
) {
    tracing::trace!(style = %params.style(), bins = frame.len(), "rendering frame");
    renderer_for(params.style()).render(frame, params, surface);
}
