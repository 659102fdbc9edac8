use std::time::Duration;

use crate::{
    AnalyserConfig, AudioSource, FrequencySampleFrame, Result, SourceKind, SourceStatus,
    SpectrumAnalyser,
};

/// Output of one sampling pass.
#[derive(Debug, Clone)]
pub struct Sample {
    pub frame: FrequencySampleFrame,
    pub status: SourceStatus,
}

/// Binds one audio source to a spectral analyser and produces a fresh
/// [`FrequencySampleFrame`] on demand.
pub struct FrequencySampler {
    analyser: SpectrumAnalyser,
    source: Box<dyn AudioSource>,
}

impl FrequencySampler {
    pub fn bind(config: &AnalyserConfig, source: Box<dyn AudioSource>) -> Result<Self> {
        Ok(Self {
            analyser: SpectrumAnalyser::new(config)?,
            source,
        })
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count()
    }

    pub fn analyser(&self) -> &SpectrumAnalyser {
        &self.analyser
    }

    /// Pulls the audio produced over `elapsed` and analyses the current
    /// window. Once the source is exhausted the rest of `elapsed` is filled
    /// with silence so the spectrum decays instead of freezing.
    pub fn sample(&mut self, elapsed: Duration) -> Result<Sample> {
        let pumped = self.source.pump(elapsed, &mut self.analyser)?;
        if pumped.status == SourceStatus::Exhausted {
            let span = (elapsed.as_secs_f64() * self.source.sample_rate() as f64) as usize;
            self.analyser.push_silence(span.saturating_sub(pumped.delivered));
        }

        Ok(Sample {
            frame: self.analyser.byte_frequency_data()?,
            status: pumped.status,
        })
    }

    /// Releases the bound source. The sampler is consumed so the source
    /// cannot be pumped again.
    pub fn release(mut self) {
        self.source.release();
    }
}

impl std::fmt::Debug for FrequencySampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrequencySampler")
            .field("analyser", &self.analyser)
            .field("source", &self.source.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecodedBuffer, PlaybackSource};

    #[test]
    fn produces_half_window_frames() {
        let buffer = DecodedBuffer::new(vec![0.0; 48_000], 48_000).unwrap();
        let source = Box::new(PlaybackSource::new(buffer));
        let mut sampler = FrequencySampler::bind(&AnalyserConfig::default(), source).unwrap();

        let sample = sampler.sample(Duration::from_millis(16)).unwrap();
        assert_eq!(sample.frame.len(), 1024);
        assert_eq!(sample.status, SourceStatus::Streaming);
        assert_eq!(sampler.source_kind(), SourceKind::Playback);
    }

    #[test]
    fn honours_configured_window() {
        let config = AnalyserConfig {
            fft_size: 256,
            ..Default::default()
        };
        let buffer = DecodedBuffer::new(vec![0.3; 1000], 8_000).unwrap();
        let source = Box::new(PlaybackSource::new(buffer));
        let mut sampler = FrequencySampler::bind(&config, source).unwrap();

        assert_eq!(sampler.frequency_bin_count(), 128);
        assert_eq!(sampler.sample(Duration::from_millis(10)).unwrap().frame.len(), 128);
    }

    #[test]
    fn exhausted_tick_advances_by_elapsed_only() {
        let buffer = DecodedBuffer::new(vec![0.4; 100], 1_000).unwrap();
        let source = Box::new(PlaybackSource::new(buffer));
        let mut sampler = FrequencySampler::bind(&AnalyserConfig::default(), source).unwrap();

        let sample = sampler.sample(Duration::from_secs(1)).unwrap();
        assert_eq!(sample.status, SourceStatus::Exhausted);
        assert_eq!(sampler.analyser().samples_received(), 1_000);

        sampler.sample(Duration::from_millis(500)).unwrap();
        assert_eq!(sampler.analyser().samples_received(), 1_500);
    }
}
