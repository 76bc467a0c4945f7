//! Speech-to-text (STT) processing

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::SttConfig;

/// Why a transcription attempt produced no text.
///
/// Like the completion failures, these are expected outcomes mapped to fixed
/// sentinels by the dispatcher; nothing escapes this component as a hard error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SttFailure {
    /// No API key configured; no network call was attempted
    NotConfigured,
    /// The response was 2xx but had no usable `text` field
    MalformedResponse,
    /// Transport failure, timeout, or non-2xx status (file read errors too)
    RequestFailed,
}

impl SttFailure {
    /// Human-readable sentinel returned to the client in place of a transcript
    #[must_use]
    pub const fn sentinel(self) -> &'static str {
        match self {
            Self::NotConfigured => "Transcription service not configured.",
            Self::MalformedResponse => "Could not transcribe audio.",
            Self::RequestFailed => "Audio transcription failed.",
        }
    }
}

/// Transcribes uploaded audio via a remote inference endpoint
#[derive(Clone, Debug)]
pub struct SpeechTranscriber {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<SecretString>,
}

impl SpeechTranscriber {
    /// Create a new transcriber; a missing key is allowed and reported per call
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &SttConfig, api_key: Option<String>) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        })
    }

    /// Transcribe the audio file at `path` with a single attempt.
    ///
    /// Reads the full file contents and POSTs them as a binary body with a
    /// bearer credential. Expects a JSON object with a `text` field.
    pub async fn transcribe_file(&self, path: &Path) -> Result<String, SttFailure> {
        let Some(api_key) = &self.api_key else {
            tracing::error!("no Hugging Face API key; cannot transcribe audio");
            return Err(SttFailure::NotConfigured);
        };

        let audio = tokio::fs::read(path).await.map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to read audio upload");
            SttFailure::RequestFailed
        })?;

        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let response = self
            .client
            .post(&self.api_url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .body(audio)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                SttFailure::RequestFailed
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(SttFailure::RequestFailed);
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            SttFailure::RequestFailed
        })?;

        // some models return a different structure; only {"text": ...} counts
        let text = payload
            .get("text")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .filter(|t| !t.is_empty());

        text.map_or_else(
            || {
                tracing::error!(payload = %payload, "unexpected transcription response shape");
                Err(SttFailure::MalformedResponse)
            },
            |t| {
                tracing::info!(transcript = %t, "transcription complete");
                Ok(t)
            },
        )
    }
}
