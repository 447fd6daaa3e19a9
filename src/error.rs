//! Error types for the speak pipeline.

use std::path::PathBuf;

/// Failures talking to the synthesis service.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("Request to speech service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Speech service returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The response had no audio payload for the request.
    #[error("Speech service response contained no audio")]
    MissingAudio,

    #[error("Speech service returned malformed audio: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Speech worker is not running")]
    WorkerUnavailable,
}

/// Everything that can go wrong between submit and playback start.
///
/// Empty input is not an error; `submit` just ignores it.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Audio playback failed: {0}")]
    Playback(String),

    #[error("Scratch file error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SpeechError {
    /// Short text for the status label.
    pub fn user_message(&self) -> &'static str {
        match self {
            SpeechError::Synthesis(_) => "⚠ Speech service unavailable",
            SpeechError::Playback(_) => "⚠ Audio playback failed",
            SpeechError::FileIo { .. } => "⚠ Could not save audio file",
        }
    }
}
