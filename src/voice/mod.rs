pub mod playback;
pub mod scratch;
pub mod tts;
