//! Agrivoice Gateway - voice and text chat relay for an agriculture assistant
//!
//! This library provides the core request-processing flow:
//! - Chat dispatch: audio uploads are transcribed, text runs the full pipeline
//! - Answer generation via an OpenAI-compatible chat-completion API
//! - Speech-to-text via a Hugging Face inference endpoint
//! - Text-to-speech written to disk and served as static audio
//!
//! # Architecture
//!
//! ```text
//! client request
//!       │
//! ┌─────▼──────────────────────────────────────┐
//! │            Request Dispatcher               │
//! │  audio ──► Speech Transcriber ──► {text}   │
//! │  text  ──► Answer Generator                │
//! │              └──► Speech Synthesizer       │
//! │                     └──► {text, voice}     │
//! └────────────────────────────────────────────┘
//! ```
//!
//! The three external calls are strictly sequential, one attempt each, with
//! bounded timeouts. Expected failures become fixed sentinel strings in the
//! response body; nothing reaches the transport layer as a raw error.

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod voice;

pub use api::ApiServer;
pub use config::Config;
pub use credentials::CredentialStore;
pub use error::{Error, Result};
pub use llm::{AnswerGenerator, LlmFailure};
pub use voice::{SpeechSynthesizer, SpeechTranscriber, SttFailure};
