use std::{
    thread,
    time::{Duration, Instant},
};

use crate::{
    render::render_frame, CaptureSession, DisplayConfig, PlaybackConfig, RenderParameters, Result,
    SessionState, SourceStatus, Surface,
};

/// Result of a single scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was drawn and the next tick has been requested.
    Rendered,
    /// A frame was drawn, then the source ran dry and the session stopped.
    SourceEnded,
    /// The session was not capturing; nothing was drawn.
    Stopped,
}

/// Drives the clear, sample, render cycle.
///
/// At most one tick is pending at a time. A tick that finds the session not
/// capturing ends the loop without drawing or asking for another tick.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    scheduled: bool,
    ticks: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while another tick has been requested.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Number of frames rendered so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn start(&mut self) {
        self.scheduled = true;
    }

    pub(crate) fn cancel(&mut self) {
        self.scheduled = false;
    }

    pub fn tick(
        &mut self,
        session: &mut CaptureSession,
        params: &RenderParameters,
        playback: &PlaybackConfig,
        surface: &mut dyn Surface,
        elapsed: Duration,
    ) -> Result<TickOutcome> {
        // Consume the pending request; it is renewed only after a full render.
        self.scheduled = false;
        if session.state() != SessionState::Capturing {
            return Ok(TickOutcome::Stopped);
        }

        surface.clear();
        let sample = match session.sample(elapsed) {
            Ok(sample) => sample,
            Err(err) => {
                tracing::warn!(%err, "sampling failed, stopping capture");
                session.stop_capture(surface, self);
                return Err(err);
            }
        };

        render_frame(&sample.frame, params, surface);
        self.ticks += 1;
        tracing::trace!(tick = self.ticks, ?elapsed, "frame rendered");

        if sample.status == SourceStatus::Exhausted && playback.stop_at_end {
            tracing::info!(ticks = self.ticks, "audio source ended");
            session.stop_capture(surface, self);
            return Ok(TickOutcome::SourceEnded);
        }

        self.scheduled = true;
        Ok(TickOutcome::Rendered)
    }
}

/// Source of display-refresh ticks.
pub trait FrameClock {
    /// Blocks until the next refresh and returns the time since the previous
    /// one.
    fn wait_for_next_frame(&mut self) -> Duration;
}

/// Paces frames at a fixed refresh rate using the wall clock.
///
/// Late frames are not made up for; the reported elapsed time simply grows.
#[derive(Debug)]
pub struct IntervalClock {
    interval: Duration,
    last: Option<Instant>,
}

impl IntervalClock {
    /// Accepts the same refresh rates as [`DisplayConfig::validate`].
    pub fn new(refresh_hz: f32) -> Result<Self> {
        DisplayConfig { refresh_hz }.validate()?;
        Ok(Self {
            interval: Duration::from_secs_f32(1.0 / refresh_hz),
            last: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameClock for IntervalClock {
    fn wait_for_next_frame(&mut self) -> Duration {
        let Some(last) = self.last else {
            self.last = Some(Instant::now());
            return Duration::ZERO;
        };

        let deadline = last + self.interval;
        let now = Instant::now();
        if now < deadline {
            thread::sleep(deadline - now);
        }

        let now = Instant::now();
        self.last = Some(now);
        now - last
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        audio::LiveFeed, AnalyserConfig, LiveCapture, LiveConfig, LiveSource, RecordingSurface,
    };

    /// Clock that returns a fixed step without sleeping.
    pub(crate) struct ManualClock {
        pub(crate) step: Duration,
        pub(crate) waits: usize,
    }

    impl ManualClock {
        pub(crate) fn new(step: Duration) -> Self {
            Self { step, waits: 0 }
        }
    }

    impl FrameClock for ManualClock {
        fn wait_for_next_frame(&mut self) -> Duration {
            self.waits += 1;
            self.step
        }
    }

    struct FeedCapture(LiveFeed);

    impl LiveCapture for FeedCapture {
        fn open(&mut self, config: &LiveConfig) -> Result<LiveSource> {
            Ok(LiveSource::new(self.0.clone(), config.sample_rate))
        }
    }

    fn capturing(feed: &LiveFeed) -> (CaptureSession, RecordingSurface, FrameScheduler) {
        let mut session = CaptureSession::new(AnalyserConfig::default());
        let mut surface = RecordingSurface::new(320, 200);
        let mut scheduler = FrameScheduler::new();
        let mut capture = FeedCapture(feed.clone());
        session
            .start_capture(&mut capture, &LiveConfig::default(), &mut surface, &mut scheduler)
            .unwrap();
        (session, surface, scheduler)
    }

    fn tick(
        scheduler: &mut FrameScheduler,
        session: &mut CaptureSession,
        surface: &mut RecordingSurface,
        elapsed: Duration,
    ) -> TickOutcome {
        let params = RenderParameters::default();
        scheduler
            .tick(session, &params, &PlaybackConfig::default(), surface, elapsed)
            .unwrap()
    }

    #[test]
    fn tick_clears_then_renders_and_reschedules() {
        let feed = LiveFeed::new(4096);
        let (mut session, mut surface, mut scheduler) = capturing(&feed);
        feed.push(&[0.2; 2048]).unwrap();

        let outcome = tick(&mut scheduler, &mut session, &mut surface, Duration::ZERO);

        assert_eq!(outcome, TickOutcome::Rendered);
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(surface.commands().len(), 1024);
        assert!(scheduler.is_scheduled());
        assert_eq!(scheduler.ticks(), 1);
    }

    #[test]
    fn idle_session_ends_the_loop() {
        let mut session = CaptureSession::new(AnalyserConfig::default());
        let mut surface = RecordingSurface::new(10, 10);
        let mut scheduler = FrameScheduler::new();

        let outcome = tick(&mut scheduler, &mut session, &mut surface, Duration::ZERO);

        assert_eq!(outcome, TickOutcome::Stopped);
        assert_eq!(surface.clear_count(), 0);
        assert_eq!(surface.draw_count(), 0);
        assert!(!scheduler.is_scheduled());
    }

    #[test]
    fn vanished_live_source_stops_after_rendering() {
        let feed = LiveFeed::new(4096);
        let (mut session, mut surface, mut scheduler) = capturing(&feed);
        feed.close();

        let outcome = tick(&mut scheduler, &mut session, &mut surface, Duration::from_millis(16));

        assert_eq!(outcome, TickOutcome::SourceEnded);
        assert_eq!(scheduler.ticks(), 1);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(surface.is_blank());
        assert!(!scheduler.is_scheduled());
    }

    #[test]
    fn interval_clock_paces_frames() {
        let mut clock = IntervalClock::new(200.0).unwrap();
        assert_eq!(clock.wait_for_next_frame(), Duration::ZERO);

        let elapsed = clock.wait_for_next_frame();
        assert!(elapsed >= clock.interval());
    }

    #[test]
    fn interval_clock_rejects_what_the_config_rejects() {
        assert!(IntervalClock::new(0.5).is_err());
        assert!(IntervalClock::new(f32::NAN).is_err());
        assert_eq!(IntervalClock::new(1.0).unwrap().interval(), Duration::from_secs(1));
    }
}
