//! Text-to-speech (TTS) processing

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

use crate::config::TtsConfig;
use crate::{Error, Result};

const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const TOKEN_LEN: usize = 8;

/// Generate a random token naming a synthesized audio file.
///
/// Not guaranteed unique across all time; birthday collisions are possible at
/// high volume and are an accepted limitation (no check-and-retry).
#[must_use]
pub fn voice_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Synthesizes speech and writes it to the audio directory as `<token>.mp3`
#[derive(Clone, Debug)]
pub struct SpeechSynthesizer {
    client: reqwest::Client,
    api_base: String,
    language: String,
    audio_dir: PathBuf,
}

impl SpeechSynthesizer {
    /// Create a new synthesizer writing files under `audio_dir`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &TtsConfig, audio_dir: &Path) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            audio_dir: audio_dir.to_path_buf(),
        })
    }

    /// Synthesize `text` and write `<token>.mp3`, returning the file path.
    ///
    /// This is the one collaborator allowed to fail hard: the dispatcher
    /// catches any error here and degrades to a text-only response.
    ///
    /// # Errors
    ///
    /// Returns error if the TTS service fails or the file cannot be written
    pub async fn synthesize(&self, text: &str, token: &str) -> Result<PathBuf> {
        // TODO: chunk long answers; the endpoint caps the query length
        let response = self
            .client
            .get(format!("{}/translate_tts", self.api_base))
            .query(&[
                ("ie", "UTF-8"),
                ("q", text),
                ("tl", self.language.as_str()),
                ("client", "tw-ob"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(Error::Tts("TTS service returned no audio".to_string()));
        }

        let path = self.audio_dir.join(format!("{token}.mp3"));
        tokio::fs::write(&path, &audio).await?;

        tracing::info!(path = %path.display(), bytes = audio.len(), "synthesized speech");
        Ok(path)
    }
}
