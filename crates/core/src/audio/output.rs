use std::{fmt, thread::JoinHandle};

use crossbeam::channel::Sender;

use super::DecodedBuffer;
use crate::Result;

/// Plays a decoded buffer on the default output device.
///
/// The device stream lives on its own `audio-output` thread, which parks
/// until [`stop`](Self::stop) is called or the handle is dropped.
pub struct AudibleOutput {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl AudibleOutput {
    /// Opens the default output device and starts playing `buffer` from its
    /// beginning. Fails when no device is available.
    pub fn start(buffer: &DecodedBuffer) -> Result<Self> {
        let (stop, worker) = device::spawn(buffer)?;
        tracing::info!(rate = buffer.sample_rate(), "audible playback started");
        Ok(Self {
            stop: Some(stop),
            worker: Some(worker),
        })
    }

    /// Silences the output and waits for the device to be closed.
    pub fn stop(&mut self) {
        // Dropping the sender wakes the worker as well.
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("audio output thread panicked");
            }
        }
    }
}

impl Drop for AudibleOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for AudibleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudibleOutput")
            .field("playing", &self.worker.is_some())
            .finish()
    }
}

#[cfg(feature = "audio-output")]
mod device {
    use std::thread::{self, JoinHandle};

    use crossbeam::channel::{bounded, Sender};
    use rodio::{buffer::SamplesBuffer, OutputStream, Sink};

    use super::DecodedBuffer;
    use crate::{Result, VisualiserError};

    pub(super) fn spawn(buffer: &DecodedBuffer) -> Result<(Sender<()>, JoinHandle<()>)> {
        let samples = buffer.samples().to_vec();
        let sample_rate = buffer.sample_rate();
        let (stop, stopped) = bounded::<()>(1);
        let (ready, opened) = bounded::<std::result::Result<(), String>>(1);

        let worker = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                // The stream handle is not `Send`, so it never leaves this thread.
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(err) => {
                        let _ = ready.send(Err(err.to_string()));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(err) => {
                        let _ = ready.send(Err(err.to_string()));
                        return;
                    }
                };

                sink.append(SamplesBuffer::new(1, sample_rate, samples));
                let _ = ready.send(Ok(()));
                let _ = stopped.recv();
                sink.stop();
            })?;

        match opened.recv() {
            Ok(Ok(())) => Ok((stop, worker)),
            Ok(Err(message)) => {
                let _ = worker.join();
                Err(VisualiserError::SourceAcquisitionDenied(format!(
                    "no audio output device: {message}"
                )))
            }
            Err(_) => Err(VisualiserError::msg("audio output thread exited early")),
        }
    }
}

#[cfg(not(feature = "audio-output"))]
mod device {
    use std::thread::JoinHandle;

    use crossbeam::channel::Sender;

    use super::DecodedBuffer;
    use crate::{Result, VisualiserError};

    pub(super) fn spawn(_buffer: &DecodedBuffer) -> Result<(Sender<()>, JoinHandle<()>)> {
        Err(VisualiserError::SourceAcquisitionDenied(
            "built without the `audio-output` feature".to_string(),
        ))
    }
}
