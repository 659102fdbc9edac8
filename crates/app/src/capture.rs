use std::{
    io::{BufReader, Read},
    process::{Child, ChildStdout, Command, Stdio},
    thread,
};

use spectrum_visualiser_core::{
    LiveCapture, LiveConfig, LiveFeed, LiveSource, Result, VisualiserError,
};

const READ_CHUNK_BYTES: usize = 4096;

/// Captures audio by spawning a recorder process that writes mono
/// little-endian `f32` samples to stdout, PulseAudio's `parec` by default.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    program: String,
    device: Option<String>,
}

impl CommandCapture {
    pub fn new(program: impl Into<String>, device: Option<String>) -> Self {
        Self {
            program: program.into(),
            device,
        }
    }

    fn command(&self, config: &LiveConfig) -> Command {
        let mut command = Command::new(&self.program);
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .arg("--format=float32le")
            .arg(format!("--rate={}", config.sample_rate))
            .arg("--channels=1")
            .arg("--latency-msec=10");
        if let Some(device) = &self.device {
            command.arg("--device").arg(device);
        }
        command
    }
}

impl LiveCapture for CommandCapture {
    fn open(&mut self, config: &LiveConfig) -> Result<LiveSource> {
        let mut child = self.command(config).spawn().map_err(|err| {
            VisualiserError::SourceAcquisitionDenied(format!(
                "could not start `{}`: {err}",
                self.program
            ))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            VisualiserError::SourceAcquisitionDenied(format!("`{}` has no stdout", self.program))
        })?;

        let feed = LiveFeed::new(config.queue_capacity);
        let reader_feed = feed.clone();
        if let Err(err) = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || read_samples(stdout, reader_feed))
        {
            stop_child(child);
            return Err(err.into());
        }

        tracing::info!(program = %self.program, device = ?self.device, "live capture running");
        Ok(LiveSource::new(feed, config.sample_rate).with_release_hook(move || stop_child(child)))
    }
}

fn read_samples(stdout: ChildStdout, feed: LiveFeed) {
    let mut reader = BufReader::new(stdout);
    let mut bytes = vec![0u8; READ_CHUNK_BYTES];
    let mut pending = Vec::with_capacity(4);
    let mut samples = Vec::with_capacity(READ_CHUNK_BYTES / 4);

    loop {
        let read = match reader.read(&mut bytes) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::warn!(%err, "capture stream failed");
                break;
            }
        };

        samples.clear();
        pending.extend_from_slice(&bytes[..read]);
        let whole = pending.len() / 4 * 4;
        samples.extend(
            pending[..whole]
                .chunks_exact(4)
                .map(|word| f32::from_le_bytes([word[0], word[1], word[2], word[3]])),
        );
        pending.drain(..whole);

        match feed.push(&samples) {
            Ok(true) => {}
            Ok(false) => return,
            Err(err) => {
                tracing::warn!(%err, "dropping capture stream");
                return;
            }
        }
    }

    // A closed feed means the source was released and the recorder killed on purpose.
    if feed.is_closed() {
        tracing::debug!("capture stream closed");
    } else {
        tracing::warn!("capture process ended");
        feed.close();
    }
}

fn stop_child(mut child: Child) {
    if let Err(err) = child.kill() {
        tracing::debug!(%err, "capture process already exited");
    }
    match child.wait() {
        Ok(status) => tracing::debug!(%status, "capture process stopped"),
        Err(err) => tracing::warn!(%err, "could not reap capture process"),
    }
}
