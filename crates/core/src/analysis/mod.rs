use std::{collections::VecDeque, f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{AnalyserConfig, Result};

/// Magnitude spectrum of one analysis window, one byte per frequency bin,
/// ordered low frequencies first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrequencySampleFrame {
    bins: Vec<u8>,
}

impl FrequencySampleFrame {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// A frame of `len` zero magnitudes.
    pub fn silent(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

impl From<Vec<u8>> for FrequencySampleFrame {
    fn from(bins: Vec<u8>) -> Self {
        Self::new(bins)
    }
}

/// Streaming spectral analyser.
///
/// Keeps the most recent `fft_size` mono samples, applies a Blackman window,
/// smooths magnitudes over successive reads and maps the decibel range
/// `[min_decibels, max_decibels]` onto `0..=255`.
pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    history: VecDeque<f32>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    fft: FftResources,
    received: u64,
}

impl SpectrumAnalyser {
    pub fn new(config: &AnalyserConfig) -> Result<Self> {
        config.validate()?;

        let size = config.fft_size;
        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);
        let fft = FftResources {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        };

        Ok(Self {
            config: config.clone(),
            history: std::iter::repeat(0.0).take(size).collect(),
            window: (0..size).map(|i| blackman_value(i, size)).collect(),
            smoothed: vec![0.0; config.frequency_bin_count()],
            fft,
            received: 0,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.config.frequency_bin_count()
    }

    /// Samples pushed since creation, silence included.
    pub fn samples_received(&self) -> u64 {
        self.received
    }

    /// Appends mono samples, discarding the oldest so that exactly one
    /// analysis window is retained.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let size = self.config.fft_size;
        self.received += samples.len() as u64;
        let tail = &samples[samples.len().saturating_sub(size)..];
        let overflow = (self.history.len() + tail.len()).saturating_sub(size);
        self.history.drain(..overflow);
        self.history.extend(tail.iter().copied());
    }

    /// Appends `count` zero samples.
    pub fn push_silence(&mut self, count: usize) {
        self.received += count as u64;
        let count = count.min(self.config.fft_size);
        self.history.drain(..count);
        self.history.extend(std::iter::repeat(0.0).take(count));
    }

    /// Clears the sample window and the smoothing state.
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|sample| *sample = 0.0);
        self.smoothed.iter_mut().for_each(|value| *value = 0.0);
    }

    /// Analyses the current window and returns its byte magnitude spectrum.
    pub fn byte_frequency_data(&mut self) -> Result<FrequencySampleFrame> {
        let size = self.config.fft_size;
        for ((slot, sample), weight) in self
            .fft
            .input
            .iter_mut()
            .zip(self.history.iter())
            .zip(self.window.iter())
        {
            *slot = sample * weight;
        }

        self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        )?;

        let tau = self.config.smoothing_time_constant;
        let scale = 1.0 / size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(self.fft.spectrum.iter()) {
            let magnitude = bin.norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }

        let min_db = self.config.min_decibels;
        let range = self.config.max_decibels - min_db;
        let bins = self
            .smoothed
            .iter()
            .map(|&magnitude| {
                let db = 20.0 * magnitude.log10();
                let scaled = 255.0 * (db - min_db) / range;
                // -inf (silence) and NaN both land on zero.
                if scaled.is_nan() {
                    0
                } else {
                    scaled.clamp(0.0, 255.0) as u8
                }
            })
            .collect();

        Ok(FrequencySampleFrame::new(bins))
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("config", &self.config)
            .field("history", &self.history.len())
            .field("received", &self.received)
            .finish()
    }
}

fn blackman_value(index: usize, len: usize) -> f32 {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    let phase = 2.0 * PI * index as f32 / len as f32;

    a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
}
