//! Voice processing: speech-to-text and text-to-speech

pub mod stt;
pub mod tts;

pub use stt::{SpeechTranscriber, SttFailure};
pub use tts::{SpeechSynthesizer, voice_token};
