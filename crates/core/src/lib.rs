//! Spectral sampling and render pipeline for the Spectrum Visualiser.
//!
//! Audio from a live capture or a decoded file is turned into a sequence of
//! byte magnitudes per frequency bin, which one of several render styles then
//! draws onto a raster surface once per display refresh. Each module owns one
//! stage of that pipeline; [`Visualiser`] wires them together.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod params;
pub mod render;
pub mod sampler;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod visualiser;

pub use analysis::{FrequencySampleFrame, SpectrumAnalyser};
pub use audio::{
    decode_audio, AudibleOutput, AudioSource, DecodedBuffer, LiveCapture, LiveFeed, LiveSource,
    PlaybackSource, Pumped, SourceKind, SourceStatus,
};
pub use config::{
    AnalyserConfig, AppConfig, DisplayConfig, LiveConfig, PlaybackConfig, SurfaceConfig,
};
pub use error::{Result, VisualiserError};
pub use params::{RenderParameters, RenderStyle, Rgb};
pub use render::{render_frame, StyleRenderer};
pub use sampler::{FrequencySampler, Sample};
pub use scheduler::{FrameClock, FrameScheduler, IntervalClock, TickOutcome};
pub use session::{CaptureSession, SessionState};
pub use surface::{
    DrawCommand, Fill, LineJoin, PixelSurface, Point, Rect, RecordingSurface, Stroke, Surface,
};
pub use visualiser::Visualiser;
