use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crossbeam::atomic::AtomicCell;
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

use super::{AudioSource, Pumped, SourceKind, SourceStatus};
use crate::{Result, SpectrumAnalyser, VisualiserError};

type SampleProducer = Arc<Mutex<HeapProducer<f32>>>;
type SampleConsumer = Arc<Mutex<HeapConsumer<f32>>>;

/// Bounded ring buffer shared between a capture thread and the frame loop.
///
/// The capture thread writes through the producer half and the frame loop
/// drains the consumer half. When the ring is full the oldest samples are
/// discarded; the analyser only ever looks at the most recent window anyway.
#[derive(Clone)]
pub struct LiveFeed {
    producer: SampleProducer,
    consumer: SampleConsumer,
    capacity: usize,
    closed: Arc<AtomicCell<bool>>,
    dropped: Arc<AtomicCell<u64>>,
}

impl LiveFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (producer, consumer) = HeapRb::new(capacity).split();

        Self {
            producer: Mutex::new(producer).into(),
            consumer: Mutex::new(consumer).into(),
            capacity,
            closed: Default::default(),
            dropped: Default::default(),
        }
    }

    /// Appends mono samples. Returns false once the feed has been closed, at
    /// which point the writer should stop capturing.
    pub fn push(&self, samples: &[f32]) -> Result<bool> {
        if self.closed.load() {
            return Ok(false);
        }

        let mut producer = lock(&self.producer)?;
        let newest = &samples[samples.len().saturating_sub(self.capacity)..];
        let mut discarded = samples.len() - newest.len();

        let overflow = newest.len().saturating_sub(producer.free_len());
        if overflow > 0 {
            discarded += lock(&self.consumer)?.skip(overflow);
        }
        producer.push_slice(newest);

        if discarded > 0 {
            self.dropped.fetch_add(discarded as u64);
        }
        Ok(true)
    }

    /// Marks the feed as finished. Samples already queued can still be drained.
    pub fn close(&self) {
        self.closed.store(true);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load()
    }

    pub fn queued(&self) -> Result<usize> {
        Ok(lock(&self.consumer)?.len())
    }

    /// Total samples discarded because the reader fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped.load()
    }

    fn drain(&self) -> Result<Vec<f32>> {
        Ok(lock(&self.consumer)?.pop_iter().collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| VisualiserError::msg("live feed has been poisoned"))
}

impl fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveFeed")
            .field("capacity", &self.capacity)
            .field("closed", &self.closed.load())
            .field("dropped", &self.dropped.load())
            .finish()
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Live capture bound to a [`LiveFeed`].
///
/// The optional release hook runs synchronously on [`release`](AudioSource::release)
/// so that the underlying device is freed right away.
pub struct LiveSource {
    feed: LiveFeed,
    sample_rate: u32,
    on_release: Option<ReleaseHook>,
    released: bool,
}

impl LiveSource {
    pub fn new(feed: LiveFeed, sample_rate: u32) -> Self {
        Self {
            feed,
            sample_rate,
            on_release: None,
            released: false,
        }
    }

    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn feed(&self) -> &LiveFeed {
        &self.feed
    }
}

impl AudioSource for LiveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Live
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn pump(&mut self, _elapsed: Duration, analyser: &mut SpectrumAnalyser) -> Result<Pumped> {
        // Read the flag first so samples pushed just before closing are kept.
        let closed = self.feed.is_closed();
        let samples = self.feed.drain()?;
        analyser.push_samples(&samples);

        let status = if closed {
            SourceStatus::Exhausted
        } else {
            SourceStatus::Streaming
        };
        Ok(Pumped {
            status,
            delivered: samples.len(),
        })
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.feed.close();
        if let Some(hook) = self.on_release.take() {
            hook();
        }
        tracing::debug!(dropped = self.feed.dropped(), "live source released");
    }
}

impl Drop for LiveSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for LiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSource")
            .field("feed", &self.feed)
            .field("released", &self.released)
            .finish()
    }
}
