//! Answer generation via an OpenAI-compatible chat-completion API

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::credentials::CredentialStore;

/// Why a completion attempt produced no answer.
///
/// Every failure mode here is expected and maps to a fixed user-facing
/// sentinel at the dispatch layer, so this is a value rather than an
/// [`Error`](crate::Error) that propagates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmFailure {
    /// No API key configured; no network call was attempted
    MissingKey,
    /// The API rejected the credential
    AuthRejected,
    /// Any other API-level failure (rate limit, bad request, outage)
    Api,
    /// Transport or response-shape failure
    Unexpected,
}

impl LlmFailure {
    /// Human-readable sentinel returned to the client in place of an answer
    #[must_use]
    pub const fn sentinel(self) -> &'static str {
        match self {
            Self::MissingKey => {
                "OpenAI API key missing on server. Set OPENAI_API_KEY and restart the app."
            }
            Self::AuthRejected => {
                "OpenAI authentication failed. Check OPENAI_API_KEY on the server."
            }
            Self::Api => "OpenAI API error. See server logs.",
            Self::Unexpected => "Unexpected server error while contacting OpenAI.",
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Generates answers with a fixed agriculture-assistant persona
#[derive(Clone, Debug)]
pub struct AnswerGenerator {
    client: reqwest::Client,
    api_base: String,
    model: String,
    system_prompt: String,
    credentials: CredentialStore,
}

impl AnswerGenerator {
    /// Create a new generator reading its key from `credentials` at call time
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &LlmConfig, credentials: CredentialStore) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            credentials,
        })
    }

    /// Answer a question with a single completion attempt.
    ///
    /// Exactly one network call; no retries. Returns the trimmed text of the
    /// first choice, or the failure kind for the caller to map to a sentinel.
    pub async fn answer(&self, question: &str) -> Result<String, LlmFailure> {
        let Some(authorization) = self.credentials.bearer_header().await else {
            tracing::error!("OpenAI API key missing when generating answer");
            return Err(LlmFailure::MissingKey);
        };

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", authorization)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion request failed");
                LlmFailure::Unexpected
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI rejected credential");
            return Err(LlmFailure::AuthRejected);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI API error");
            return Err(LlmFailure::Api);
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse completion response");
            LlmFailure::Unexpected
        })?;

        completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                tracing::error!("completion response had no message content");
                LlmFailure::Unexpected
            })
    }
}
