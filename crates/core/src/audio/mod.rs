//! Audio sources that feed the spectral analyser.
//!
//! A source is bound to the sampler for the duration of one capture session.
//! Each tick the sampler asks it to [`pump`](AudioSource::pump) whatever audio
//! became available since the previous tick into the analyser.

mod decode;
mod live;
mod output;
mod playback;

use std::time::Duration;

pub use decode::{decode_audio, DecodedBuffer};
pub use live::{LiveFeed, LiveSource};
pub use output::AudibleOutput;
pub use playback::PlaybackSource;

use crate::{LiveConfig, Result, SpectrumAnalyser};

/// Mode enum describes where the bound audio comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Samples captured from a device as they are produced.
    Live,
    /// A decoded file played back in real time.
    Playback,
}

/// Whether a source can still produce new samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Streaming,
    /// No further samples will arrive.
    Exhausted,
}

/// What a single [`AudioSource::pump`] moved into the analyser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pumped {
    pub status: SourceStatus,
    /// Samples pushed during this call.
    pub delivered: usize,
}

pub trait AudioSource: Send {
    fn kind(&self) -> SourceKind;

    fn sample_rate(&self) -> u32;

    /// Moves the samples produced during `elapsed` into the analyser.
    fn pump(&mut self, elapsed: Duration, analyser: &mut SpectrumAnalyser) -> Result<Pumped>;

    /// Frees device or process handles immediately. Calling it twice is a
    /// no-op.
    fn release(&mut self);
}

/// Opens live capture devices.
///
/// Implementations report refusals and missing devices as
/// [`VisualiserError::SourceAcquisitionDenied`](crate::VisualiserError::SourceAcquisitionDenied).
pub trait LiveCapture {
    fn open(&mut self, config: &LiveConfig) -> Result<LiveSource>;
}

#[cfg(test)]
pub(crate) mod tests {
    pub(crate) use super::decode::tests::wav_bytes;
}
