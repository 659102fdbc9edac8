use std::{thread, time::Duration};

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};

use crate::{
    decode_audio, AnalyserConfig, AudibleOutput, AudioSource, DecodedBuffer, FrameScheduler,
    FrequencySampler, LiveCapture, LiveConfig, PlaybackSource, Result, Sample, Surface,
    VisualiserError,
};

/// Lifecycle of the active audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// A file is being decoded on a worker thread.
    Decoding,
    Capturing,
}

struct DecodeTask {
    receiver: Receiver<Result<DecodedBuffer>>,
}

/// Owns the single active audio source.
///
/// The state is derived from what the session holds: it is `Capturing`
/// exactly while a sampler (and with it a source) is bound, and `Decoding`
/// exactly while a decode task is pending.
pub struct CaptureSession {
    analyser: AnalyserConfig,
    audible: bool,
    sampler: Option<FrequencySampler>,
    decode: Option<DecodeTask>,
}

impl CaptureSession {
    pub fn new(analyser: AnalyserConfig) -> Self {
        Self {
            analyser,
            audible: false,
            sampler: None,
            decode: None,
        }
    }

    /// Also plays decoded files on the default output device. Without a
    /// usable device the file is still visualised, silently.
    pub fn with_audible_playback(mut self, audible: bool) -> Self {
        self.audible = audible;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.sampler.is_some() {
            SessionState::Capturing
        } else if self.decode.is_some() {
            SessionState::Decoding
        } else {
            SessionState::Idle
        }
    }

    /// Opens a live source and starts the scheduler. Any active source is
    /// stopped first. On failure the session is left `Idle`.
    pub fn start_capture(
        &mut self,
        capture: &mut dyn LiveCapture,
        config: &LiveConfig,
        surface: &mut dyn Surface,
        scheduler: &mut FrameScheduler,
    ) -> Result<()> {
        self.stop_capture(surface, scheduler);

        let source = capture.open(config).map_err(|err| {
            tracing::warn!(%err, "live capture could not be started");
            err
        })?;
        self.bind(Box::new(source), scheduler)
    }

    /// Starts decoding `bytes` in the background. The session stays in
    /// `Decoding` until [`poll_decode`](Self::poll_decode) or
    /// [`wait_for_decode`](Self::wait_for_decode) observes the result.
    pub fn start_playback(
        &mut self,
        bytes: Vec<u8>,
        extension: Option<String>,
        surface: &mut dyn Surface,
        scheduler: &mut FrameScheduler,
    ) -> Result<()> {
        self.stop_capture(surface, scheduler);

        let (sender, receiver) = bounded(1);
        thread::Builder::new()
            .name("audio-decode".to_string())
            .spawn(move || {
                let result = decode_audio(bytes, extension.as_deref());
                // The receiver is gone when the decode was cancelled.
                let _ = sender.send(result);
            })?;

        tracing::info!("decoding audio file");
        self.decode = Some(DecodeTask { receiver });
        Ok(())
    }

    /// Completes a pending decode without blocking.
    pub fn poll_decode(&mut self, scheduler: &mut FrameScheduler) -> Result<SessionState> {
        let outcome = match &self.decode {
            Some(task) => match task.receiver.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return Ok(SessionState::Decoding),
                Err(TryRecvError::Disconnected) => Err(decoder_vanished()),
            },
            None => return Ok(self.state()),
        };

        self.finish_decode(outcome, scheduler)
    }

    /// Blocks until a pending decode finishes, up to `timeout`.
    pub fn wait_for_decode(
        &mut self,
        timeout: Duration,
        scheduler: &mut FrameScheduler,
    ) -> Result<SessionState> {
        let outcome = match &self.decode {
            Some(task) => match task.receiver.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => return Ok(SessionState::Decoding),
                Err(RecvTimeoutError::Disconnected) => Err(decoder_vanished()),
            },
            None => return Ok(self.state()),
        };

        self.finish_decode(outcome, scheduler)
    }

    /// Abandons a pending decode. Returns true if one was pending.
    pub fn cancel_decode(&mut self) -> bool {
        let cancelled = self.decode.take().is_some();
        if cancelled {
            tracing::info!("decode cancelled");
        }
        cancelled
    }

    /// Releases the active source, clears the surface once and stops frame
    /// scheduling. A no-op when nothing is active.
    pub fn stop_capture(&mut self, surface: &mut dyn Surface, scheduler: &mut FrameScheduler) {
        self.cancel_decode();

        if let Some(sampler) = self.sampler.take() {
            let kind = sampler.source_kind();
            sampler.release();
            scheduler.cancel();
            surface.clear();
            tracing::info!(?kind, "capture stopped");
        }
    }

    /// Samples the bound source.
    pub fn sample(&mut self, elapsed: Duration) -> Result<Sample> {
        self.sampler
            .as_mut()
            .ok_or(VisualiserError::NoActiveSource)?
            .sample(elapsed)
    }

    fn finish_decode(
        &mut self,
        outcome: Result<DecodedBuffer>,
        scheduler: &mut FrameScheduler,
    ) -> Result<SessionState> {
        self.decode = None;
        match outcome {
            Ok(buffer) => {
                let source = self.playback_source(buffer);
                self.bind(Box::new(source), scheduler)?;
                Ok(self.state())
            }
            Err(err) => {
                tracing::warn!(%err, "audio file could not be played");
                Err(err)
            }
        }
    }

    fn playback_source(&self, buffer: DecodedBuffer) -> PlaybackSource {
        if !self.audible {
            return PlaybackSource::new(buffer);
        }

        match AudibleOutput::start(&buffer) {
            Ok(output) => PlaybackSource::new(buffer).with_output(output),
            Err(err) => {
                tracing::warn!(%err, "playing without sound");
                PlaybackSource::new(buffer)
            }
        }
    }

    fn bind(&mut self, source: Box<dyn AudioSource>, scheduler: &mut FrameScheduler) -> Result<()> {
        let kind = source.kind();
        let sampler = FrequencySampler::bind(&self.analyser, source)?;
        tracing::info!(?kind, bins = sampler.frequency_bin_count(), "capture started");

        self.sampler = Some(sampler);
        scheduler.start();
        Ok(())
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &self.state())
            .field("audible", &self.audible)
            .field("sampler", &self.sampler)
            .finish()
    }
}

fn decoder_vanished() -> VisualiserError {
    VisualiserError::DecodeFailure("decoder thread stopped without a result".to_string())
}
