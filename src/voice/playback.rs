//! Audio output via `rodio`.
//!
//! The output stream is opened once in `main` and handed to the bevy app as a
//! non-send resource. `OutputStream` is `!Send` on some platforms, so the
//! handle never leaves the main thread.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::time::Duration;

use crate::error::SpeechError;

pub struct AudioSubsystem {
    /// Must stay alive for the handle to work.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    /// Sink of the request currently playing.
    sink: Option<Sink>,
}

impl AudioSubsystem {
    /// Open the default output device.
    pub fn open() -> Result<Self, SpeechError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| SpeechError::Playback(e.to_string()))?;

        tracing::info!("Audio output initialized on default device");

        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    /// Start playing `path` and return its decoded length.
    ///
    /// Returns as soon as playback has started; the caller decides when the
    /// audio is done based on the returned duration.
    pub fn play(&mut self, path: &Path) -> Result<Duration, SpeechError> {
        let duration = measure_duration(path)?;
        let source = open_decoder(path)?;

        self.stop();

        let sink = Sink::try_new(&self.handle).map_err(|e| SpeechError::Playback(e.to_string()))?;
        sink.append(source);
        self.sink = Some(sink);

        tracing::debug!(path = %path.display(), ?duration, "Playback started");
        Ok(duration)
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    pub fn shutdown(&mut self) {
        self.stop();
        tracing::info!("Audio output shut down");
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, SpeechError> {
    let file = File::open(path).map_err(|source| SpeechError::FileIo {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| SpeechError::Playback(e.to_string()))
}

/// Length of the decoded audio in `path`.
pub fn measure_duration(path: &Path) -> Result<Duration, SpeechError> {
    Ok(decoded_duration(open_decoder(path)?))
}

/// Use the container's reported length when there is one, otherwise decode
/// everything and count samples.
fn decoded_duration<R>(decoder: Decoder<R>) -> Duration
where
    R: Read + Seek + Send + Sync + 'static,
{
    if let Some(duration) = decoder.total_duration() {
        return duration;
    }

    let rate = u64::from(decoder.sample_rate()) * u64::from(decoder.channels());
    if rate == 0 {
        return Duration::ZERO;
    }
    let samples = decoder.count() as u64;
    Duration::from_secs_f64(samples as f64 / rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// 16-bit mono PCM WAV filled with silence.
    fn write_wav(path: &Path, sample_rate: u32, samples: u32) {
        let data_len = samples * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(44 + data_len as usize, 0);

        let mut file = File::create(path).unwrap();
        file.write_all(&bytes).unwrap();
    }

    #[test]
    fn duration_comes_from_decoded_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half-second.wav");
        write_wav(&path, 8000, 4000);

        let duration = measure_duration(&path).unwrap();
        assert!(
            (duration.as_secs_f64() - 0.5).abs() < 0.01,
            "unexpected duration {duration:?}"
        );
    }

    #[test]
    fn garbage_is_a_playback_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(matches!(
            measure_duration(&path),
            Err(SpeechError::Playback(_))
        ));
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            measure_duration(&dir.path().join("gone.mp3")),
            Err(SpeechError::FileIo { .. })
        ));
    }
}
