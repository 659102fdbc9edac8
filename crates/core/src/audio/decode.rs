use std::{io::Cursor, time::Duration};

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use crate::{Result, VisualiserError};

/// Mono time-domain samples decoded from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(VisualiserError::DecodeFailure(
                "sample rate must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Decodes an in-memory audio file into mono samples.
///
/// `extension` is an optional format hint such as `"wav"` or `"flac"`; the
/// container is probed from its contents either way. Channels are averaged.
pub fn decode_audio(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedBuffer> {
    if bytes.is_empty() {
        return Err(VisualiserError::DecodeFailure("file is empty".to_string()));
    }

    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_failure)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| VisualiserError::DecodeFailure("no audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_failure)?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(decode_failure(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::debug!(reason, "skipping corrupt packet");
                continue;
            }
            Err(err) => return Err(decode_failure(err)),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        let channels = spec.channels.count().max(1);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(
            buffer
                .samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    if samples.is_empty() {
        return Err(VisualiserError::DecodeFailure(
            "file contains no audio samples".to_string(),
        ));
    }

    let sample_rate = sample_rate
        .ok_or_else(|| VisualiserError::DecodeFailure("unknown sample rate".to_string()))?;
    let buffer = DecodedBuffer::new(samples, sample_rate)?;
    tracing::info!(
        sample_rate,
        seconds = buffer.duration().as_secs_f32(),
        "decoded audio file"
    );
    Ok(buffer)
}

fn decode_failure(err: SymphoniaError) -> VisualiserError {
    VisualiserError::DecodeFailure(err.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a 16-bit PCM WAV file in memory.
    pub(crate) fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for sample in samples {
                for _ in 0..channels {
                    writer
                        .write_sample((sample * i16::MAX as f32) as i16)
                        .unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn decodes_mono_wav() {
        let tone: Vec<f32> = (0..4800).map(|n| (n as f32 * 0.05).sin() * 0.5).collect();
        let buffer = decode_audio(wav_bytes(&tone, 48_000, 1), Some("wav")).unwrap();

        assert_eq!(buffer.sample_rate(), 48_000);
        assert_eq!(buffer.samples().len(), 4800);
        assert!((buffer.duration().as_secs_f32() - 0.1).abs() < 1e-3);
        assert!((buffer.samples()[100] - tone[100]).abs() < 1e-3);
    }

    #[test]
    fn mixes_stereo_down_to_mono() {
        let buffer = decode_audio(wav_bytes(&[0.25; 1000], 22_050, 2), None).unwrap();

        assert_eq!(buffer.samples().len(), 1000);
        assert!((buffer.samples()[10] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = decode_audio(b"definitely not audio".to_vec(), Some("mp3")).unwrap_err();
        assert!(matches!(err, VisualiserError::DecodeFailure(_)));
    }

    #[test]
    fn rejects_empty_input() {
        let err = decode_audio(Vec::new(), None).unwrap_err();
        assert!(matches!(err, VisualiserError::DecodeFailure(_)));
    }
}
