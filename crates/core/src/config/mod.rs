use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{RenderParameters, Result, Rgb, VisualiserError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analyser: AnalyserConfig,
    pub surface: SurfaceConfig,
    pub display: DisplayConfig,
    pub render: RenderParameters,
    pub playback: PlaybackConfig,
    pub live: LiveConfig,
}

impl AppConfig {
    /// Parses and validates a JSON document. Missing sections use defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.analyser.validate()?;
        self.surface.validate()?;
        self.display.validate()?;
        self.live.validate()?;
        self.render.validate()
    }
}

/// Settings for the spectral analyser. These are fixed for the lifetime of a
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Analysis window in samples. Larger windows resolve frequency more
    /// finely at the cost of latency.
    pub fft_size: usize,
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    pub const MIN_FFT_SIZE: usize = 32;
    pub const MAX_FFT_SIZE: usize = 32_768;

    /// Number of magnitude values produced per frame.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(Self::MIN_FFT_SIZE..=Self::MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(VisualiserError::InvalidConfig(format!(
                "analyser.fft_size must be a power of two between {} and {} (got {})",
                Self::MIN_FFT_SIZE,
                Self::MAX_FFT_SIZE,
                self.fft_size
            )));
        }

        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(VisualiserError::InvalidConfig(format!(
                "analyser.smoothing_time_constant must be within [0, 1] (got {})",
                self.smoothing_time_constant
            )));
        }

        if !(self.min_decibels < self.max_decibels) {
            return Err(VisualiserError::InvalidConfig(format!(
                "analyser.min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            background: Rgb::BLACK,
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VisualiserError::InvalidConfig(format!(
                "surface must have a non-zero size (got {}x{})",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub refresh_hz: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { refresh_hz: 60.0 }
    }
}

impl DisplayConfig {
    /// Slowest refresh rate a frame clock accepts.
    pub const MIN_REFRESH_HZ: f32 = 1.0;

    pub fn validate(&self) -> Result<()> {
        if !self.refresh_hz.is_finite() || self.refresh_hz < Self::MIN_REFRESH_HZ {
            return Err(VisualiserError::InvalidConfig(format!(
                "display.refresh_hz must be at least {} (got {})",
                Self::MIN_REFRESH_HZ,
                self.refresh_hz
            )));
        }
        Ok(())
    }
}

/// Behaviour of file-backed playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Stop the session once a decoded file has been played to the end.
    /// When false the display keeps running and decays against silence.
    pub stop_at_end: bool,
    /// Play decoded files on the default output device as well. Needs the
    /// `audio-output` feature; without it playback stays silent.
    pub audible: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            stop_at_end: true,
            audible: false,
        }
    }
}

/// Parameters handed to a live capture backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub sample_rate: u32,
    /// Samples buffered between the capture thread and the frame loop.
    pub queue_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            queue_capacity: 48_000,
        }
    }
}

impl LiveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 || self.queue_capacity == 0 {
            return Err(VisualiserError::InvalidConfig(
                "live.sample_rate and live.queue_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
