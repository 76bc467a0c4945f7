//! TOML configuration file loading
//!
//! All fields are optional — the file is a partial overlay on top of the
//! built-in defaults. Environment variables still take precedence for the
//! API keys and admin token.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Chat completion configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech-to-text configuration
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Text-to-speech configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server and storage configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Directory for uploaded audio clips
    pub upload_dir: Option<PathBuf>,

    /// Directory for synthesized speech files
    pub audio_dir: Option<PathBuf>,

    /// Directory with the static client page, or absent to disable
    pub static_dir: Option<PathBuf>,

    /// Permitted upload extensions (e.g. ["webm"])
    pub allowed_extensions: Option<Vec<String>>,

    /// Env file the admin endpoint persists the key to
    pub env_file: Option<PathBuf>,
}

/// Chat completion configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// API base URL (OpenAI-compatible)
    pub api_base: Option<String>,

    /// Model identifier (e.g. "gpt-3.5-turbo")
    pub model: Option<String>,

    /// System persona prepended to every conversation
    pub system_prompt: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Speech-to-text configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Full inference endpoint URL
    pub api_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Text-to-speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// TTS service base URL
    pub api_base: Option<String>,

    /// Language code for synthesis (e.g. "en")
    pub language: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub hugging_face: Option<String>,

    /// Shared secret gating the admin endpoints
    pub admin_token: Option<String>,
}

impl GatewayConfigFile {
    /// Load and parse a TOML config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let parsed = toml::from_str(&contents)?;
        Ok(parsed)
    }
}
