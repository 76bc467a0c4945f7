//! Configuration management for the agrivoice gateway

pub mod file;

use std::path::{Path, PathBuf};

use file::GatewayConfigFile;

use crate::Result;

/// Default chat completion API base (OpenAI)
pub const DEFAULT_LLM_API_BASE: &str = "https://api.openai.com/v1";

/// Default chat completion model
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

/// System persona for every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "I want you to act like a helpful agriculture chatbot and help farmers with their query";

/// Default speech-to-text inference endpoint
pub const DEFAULT_STT_API_URL: &str =
    "https://api-inference.huggingface.co/models/jonatasgrosman/wav2vec2-large-xlsr-53-english";

/// Default text-to-speech service base URL
pub const DEFAULT_TTS_API_BASE: &str = "https://translate.google.com";

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for uploaded audio clips
    pub upload_dir: PathBuf,

    /// Directory for synthesized speech files, served under `/static/audio`
    pub audio_dir: PathBuf,

    /// Directory with the static client page, if any
    pub static_dir: Option<PathBuf>,

    /// Permitted upload extensions, matched case-insensitively
    pub allowed_extensions: Vec<String>,

    /// Env file the admin endpoint persists the key to, if any
    pub env_file: Option<PathBuf>,

    /// Shared secret gating the admin endpoints (from `ADMIN_TOKEN` env)
    pub admin_token: Option<String>,

    /// Initial OpenAI API key (from `OPENAI_API_KEY` env)
    pub openai_api_key: Option<String>,

    /// Hugging Face API key for transcription (from `HUGGING_FACE_API_KEY` env)
    pub hugging_face_api_key: Option<String>,

    /// Chat completion configuration
    pub llm: LlmConfig,

    /// Speech-to-text configuration
    pub stt: SttConfig,

    /// Text-to-speech configuration
    pub tts: TtsConfig,
}

/// Chat completion configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API base URL (OpenAI-compatible)
    pub api_base: String,

    /// Model identifier
    pub model: String,

    /// System persona prepended to every conversation
    pub system_prompt: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_LLM_API_BASE.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Speech-to-text configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Full inference endpoint URL
    pub api_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STT_API_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// TTS service base URL
    pub api_base: String,

    /// Language code for synthesis
    pub language: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_TTS_API_BASE.to_string(),
            language: "en".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            audio_dir: PathBuf::from("static/audio"),
            static_dir: Some(PathBuf::from("static")),
            allowed_extensions: vec!["webm".to_string()],
            env_file: Some(PathBuf::from(".env")),
            admin_token: None,
            openai_api_key: None,
            hugging_face_api_key: None,
            llm: LlmConfig::default(),
            stt: SttConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, overlaid with an optional TOML file,
    /// with API keys and the admin token taken from the environment last.
    ///
    /// # Errors
    ///
    /// Returns error if the config file cannot be read or parsed
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => GatewayConfigFile::load(path)?,
            None => GatewayConfigFile::default(),
        };
        Ok(Self::from_overlay(file))
    }

    fn from_overlay(file: GatewayConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(dir) = file.server.upload_dir {
            config.upload_dir = dir;
        }
        if let Some(dir) = file.server.audio_dir {
            config.audio_dir = dir;
        }
        if let Some(dir) = file.server.static_dir {
            config.static_dir = Some(dir);
        }
        if let Some(exts) = file.server.allowed_extensions {
            config.allowed_extensions = exts;
        }
        if let Some(path) = file.server.env_file {
            config.env_file = Some(path);
        }

        if let Some(base) = file.llm.api_base {
            config.llm.api_base = base;
        }
        if let Some(model) = file.llm.model {
            config.llm.model = model;
        }
        if let Some(prompt) = file.llm.system_prompt {
            config.llm.system_prompt = prompt;
        }
        if let Some(secs) = file.llm.timeout_secs {
            config.llm.timeout_secs = secs;
        }

        if let Some(url) = file.stt.api_url {
            config.stt.api_url = url;
        }
        if let Some(secs) = file.stt.timeout_secs {
            config.stt.timeout_secs = secs;
        }

        if let Some(base) = file.tts.api_base {
            config.tts.api_base = base;
        }
        if let Some(lang) = file.tts.language {
            config.tts.language = lang;
        }
        if let Some(secs) = file.tts.timeout_secs {
            config.tts.timeout_secs = secs;
        }

        config.openai_api_key = env_or(file.api_keys.openai, "OPENAI_API_KEY");
        config.hugging_face_api_key = env_or(file.api_keys.hugging_face, "HUGGING_FACE_API_KEY");
        config.admin_token = env_or(file.api_keys.admin_token, "ADMIN_TOKEN");

        config
    }

    /// Create the upload and audio directories if they do not exist
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be created
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.audio_dir)?;
        Ok(())
    }
}

/// Environment variable wins over the file value; blank values count as unset
fn env_or(file_value: Option<String>, var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .or(file_value)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_services() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.stt.timeout_secs, 60);
        assert_eq!(config.allowed_extensions, vec!["webm".to_string()]);
        assert!(config.stt.api_url.contains("wav2vec2"));
    }

    #[test]
    fn file_overlay_replaces_defaults() {
        let file: GatewayConfigFile = toml::from_str(
            r#"
            [llm]
            api_base = "http://localhost:9000/v1"
            timeout_secs = 5

            [tts]
            language = "hi"
            "#,
        )
        .unwrap();

        let config = Config::from_overlay(file);
        assert_eq!(config.llm.api_base, "http://localhost:9000/v1");
        assert_eq!(config.llm.timeout_secs, 5);
        assert_eq!(config.tts.language, "hi");
        // untouched sections keep their defaults
        assert_eq!(config.stt.api_url, DEFAULT_STT_API_URL);
    }
}
