use std::time::Duration;

use super::{AudibleOutput, AudioSource, DecodedBuffer, Pumped, SourceKind, SourceStatus};
use crate::{Result, SpectrumAnalyser};

/// Plays a decoded buffer at its native rate, advancing by the wall-clock
/// time that passed between ticks.
#[derive(Debug)]
pub struct PlaybackSource {
    buffer: DecodedBuffer,
    cursor: usize,
    /// Fractional samples carried over so that slow ticks do not drift.
    carry: f64,
    output: Option<AudibleOutput>,
    released: bool,
}

impl PlaybackSource {
    pub fn new(buffer: DecodedBuffer) -> Self {
        Self {
            buffer,
            cursor: 0,
            carry: 0.0,
            output: None,
            released: false,
        }
    }

    /// Plays the buffer out loud alongside the analysis. The output is
    /// stopped when the source is released.
    pub fn with_output(mut self, output: AudibleOutput) -> Self {
        self.output = Some(output);
        self
    }

    pub fn is_audible(&self) -> bool {
        self.output.is_some()
    }

    pub fn buffer(&self) -> &DecodedBuffer {
        &self.buffer
    }

    pub fn position(&self) -> Duration {
        Duration::from_secs_f64(self.cursor as f64 / self.buffer.sample_rate() as f64)
    }

    pub fn is_finished(&self) -> bool {
        self.released || self.cursor >= self.buffer.samples().len()
    }
}

impl AudioSource for PlaybackSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Playback
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    fn pump(&mut self, elapsed: Duration, analyser: &mut SpectrumAnalyser) -> Result<Pumped> {
        if self.is_finished() {
            return Ok(Pumped {
                status: SourceStatus::Exhausted,
                delivered: 0,
            });
        }

        let wanted = elapsed.as_secs_f64() * self.buffer.sample_rate() as f64 + self.carry;
        let advance = wanted.floor();
        self.carry = wanted - advance;

        let samples = self.buffer.samples();
        let end = (self.cursor + advance as usize).min(samples.len());
        let delivered = end - self.cursor;
        analyser.push_samples(&samples[self.cursor..end]);
        self.cursor = end;

        let status = if self.is_finished() {
            SourceStatus::Exhausted
        } else {
            SourceStatus::Streaming
        };
        Ok(Pumped { status, delivered })
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(mut output) = self.output.take() {
            output.stop();
        }
        tracing::debug!(position = ?self.position(), "playback source released");
    }
}
