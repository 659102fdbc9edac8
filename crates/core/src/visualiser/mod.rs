use std::time::Duration;

use crate::{
    AppConfig, CaptureSession, FrameClock, FrameScheduler, LiveCapture, PixelSurface,
    RenderParameters, Result, SessionState, Surface, TickOutcome,
};

/// The single context object tying the pipeline together.
///
/// It owns the render parameters, the capture session, the frame scheduler
/// and the surface. Controls write parameters through
/// [`params_mut`](Self::params_mut) between ticks; the next tick picks the
/// change up.
#[derive(Debug)]
pub struct Visualiser<S: Surface> {
    config: AppConfig,
    params: RenderParameters,
    session: CaptureSession,
    scheduler: FrameScheduler,
    surface: S,
}

impl Visualiser<PixelSurface> {
    /// Builds a visualiser drawing into an RGBA raster sized from the config.
    pub fn with_pixel_surface(config: AppConfig) -> Result<Self> {
        config.surface.validate()?;
        let surface = PixelSurface::new(
            config.surface.width,
            config.surface.height,
            config.surface.background,
        )?;
        Self::new(config, surface)
    }
}

impl<S: Surface> Visualiser<S> {
    pub fn new(config: AppConfig, surface: S) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            width = surface.width(),
            height = surface.height(),
            fft_size = config.analyser.fft_size,
            "visualiser created"
        );

        Ok(Self {
            params: config.render.clone(),
            session: CaptureSession::new(config.analyser.clone())
                .with_audible_playback(config.playback.audible),
            scheduler: FrameScheduler::new(),
            config,
            surface,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut RenderParameters {
        &mut self.params
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn start_capture(&mut self, capture: &mut dyn LiveCapture) -> Result<()> {
        self.session.start_capture(
            capture,
            &self.config.live,
            &mut self.surface,
            &mut self.scheduler,
        )
    }

    /// Begins decoding an audio file; see [`CaptureSession::start_playback`].
    pub fn start_playback(&mut self, bytes: Vec<u8>, extension: Option<String>) -> Result<()> {
        self.session
            .start_playback(bytes, extension, &mut self.surface, &mut self.scheduler)
    }

    pub fn poll_decode(&mut self) -> Result<SessionState> {
        self.session.poll_decode(&mut self.scheduler)
    }

    pub fn wait_for_decode(&mut self, timeout: Duration) -> Result<SessionState> {
        self.session.wait_for_decode(timeout, &mut self.scheduler)
    }

    pub fn cancel_decode(&mut self) -> bool {
        self.session.cancel_decode()
    }

    pub fn stop_capture(&mut self) {
        self.session.stop_capture(&mut self.surface, &mut self.scheduler);
    }

    pub fn tick(&mut self, elapsed: Duration) -> Result<TickOutcome> {
        self.scheduler.tick(
            &mut self.session,
            &self.params,
            &self.config.playback,
            &mut self.surface,
            elapsed,
        )
    }

    /// Runs ticks at the clock's cadence until capture stops.
    ///
    /// `on_frame` runs after every rendered frame and may change parameters
    /// or stop the capture; a stop prevents any further tick. Returns the
    /// number of frames rendered.
    pub fn run<C, F>(&mut self, clock: &mut C, mut on_frame: F) -> Result<u64>
    where
        C: FrameClock + ?Sized,
        F: FnMut(&mut Self) -> Result<()>,
    {
        let first = self.scheduler.ticks();
        while self.scheduler.is_scheduled() {
            let elapsed = clock.wait_for_next_frame();
            match self.tick(elapsed)? {
                TickOutcome::Rendered => on_frame(self)?,
                TickOutcome::SourceEnded | TickOutcome::Stopped => break,
            }
        }

        let rendered = self.scheduler.ticks() - first;
        tracing::info!(frames = rendered, "frame loop finished");
        Ok(rendered)
    }
}
