//! Chat dispatch: the single entry point for voice and text requests
//!
//! A multipart `audio` upload is transcribed and returned as-is (transcription
//! is terminal — it does not continue into the answer pipeline). A `text`
//! field (multipart, urlencoded form, or JSON) runs the full pipeline:
//! answer generation, then speech synthesis, degrading to text-only when
//! synthesis fails.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::voice::voice_token;

/// Sentinel body for requests carrying neither audio nor text
const INVALID_REQUEST: &str = "Invalid request";

/// Sentinel body for any failure escaping the pipeline
const INTERNAL_ERROR: &str = "Internal server error";

/// Build the chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(state)
}

/// Unit returned to the client for every successful or gracefully-failed
/// request. `text` is always present. `voice` is an empty string when the
/// text pipeline ran but synthesis failed, and omitted entirely for audio
/// transcriptions and error bodies, which carry only `text`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl ChatResponse {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TextBody {
    #[serde(default)]
    text: Option<String>,
}

/// `POST /chat`
///
/// Every internal failure is converted here; no error reaches the transport
/// layer as anything but a well-formed JSON body.
async fn chat(State(state): State<Arc<ApiState>>, req: Request) -> Response {
    match dispatch(&state, req).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "unhandled /chat error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse::text_only(INTERNAL_ERROR)),
            )
                .into_response()
        }
    }
}

/// Inspect the request and route to the audio or text pipeline
async fn dispatch(state: &ApiState, req: Request) -> crate::Result<Response> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        return dispatch_multipart(state, req).await;
    }

    let body = if content_type.starts_with("application/json") {
        match Json::<TextBody>::from_request(req, &()).await {
            Ok(Json(body)) => body,
            Err(_) => return Ok(invalid_request()),
        }
    } else {
        match Form::<TextBody>::from_request(req, &()).await {
            Ok(Form(body)) => body,
            Err(_) => return Ok(invalid_request()),
        }
    };

    match body.text.filter(|t| !t.is_empty()) {
        Some(text) => {
            let response = process_text(state, &text).await;
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        None => Ok(invalid_request()),
    }
}

/// Walk the multipart fields: a qualifying `audio` part wins immediately,
/// otherwise a `text` field falls through to the full pipeline
async fn dispatch_multipart(state: &ApiState, req: Request) -> crate::Result<Response> {
    let Ok(mut multipart) = Multipart::from_request(req, &()).await else {
        return Ok(invalid_request());
    };

    let mut text_field: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed multipart body");
                return Ok(invalid_request());
            }
        };

        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("audio") => {
                let Some(filename) = field.file_name().map(ToString::to_string) else {
                    continue;
                };
                if !allowed_file(&filename, &state.allowed_extensions) {
                    tracing::debug!(filename = %filename, "rejected upload extension");
                    continue;
                }
                let Ok(data) = field.bytes().await else {
                    return Ok(invalid_request());
                };
                return process_audio(state, &filename, &data).await;
            }
            Some("text") => {
                if let Ok(value) = field.text().await {
                    text_field = Some(value);
                }
            }
            _ => {}
        }
    }

    match text_field.filter(|t| !t.is_empty()) {
        Some(text) => {
            let response = process_text(state, &text).await;
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        None => Ok(invalid_request()),
    }
}

/// Persist the upload and transcribe it; the transcription is the terminal
/// response for audio requests
async fn process_audio(state: &ApiState, filename: &str, data: &[u8]) -> crate::Result<Response> {
    let mut safe_name = sanitize_filename(filename);
    if safe_name.is_empty() {
        safe_name = format!("upload-{}.bin", voice_token());
    }

    let path = state.upload_dir.join(safe_name);
    tokio::fs::write(&path, data).await?;
    tracing::info!(path = %path.display(), bytes = data.len(), "saved audio upload");

    let text = match state.transcriber.transcribe_file(&path).await {
        Ok(text) => text,
        Err(failure) => failure.sentinel().to_string(),
    };

    Ok((StatusCode::OK, Json(ChatResponse::text_only(text))).into_response())
}

/// Full text pipeline: answer, then synthesize the answer to speech.
/// Synthesis failure degrades to a text-only response.
async fn process_text(state: &ApiState, text: &str) -> ChatResponse {
    let answer = match state.generator.answer(text).await {
        Ok(answer) => answer,
        Err(failure) => failure.sentinel().to_string(),
    };

    let token = voice_token();
    let voice = match state.synthesizer.synthesize(&answer, &token).await {
        Ok(_) => format!("/static/audio/{token}.mp3"),
        Err(e) => {
            tracing::error!(error = %e, "speech synthesis failed, returning text only");
            String::new()
        }
    };

    ChatResponse {
        text: answer,
        voice: Some(voice),
    }
}

fn invalid_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ChatResponse::text_only(INVALID_REQUEST)),
    )
        .into_response()
}

/// Case-insensitive single-extension allow-list check
#[must_use]
pub fn allowed_file(filename: &str, allowed: &[String]) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Reduce an untrusted upload filename to a safe relative name: the final
/// path component with anything outside `[A-Za-z0-9._-]` replaced, and
/// leading dots stripped so it cannot hide or traverse
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webm_only() -> Vec<String> {
        vec!["webm".to_string()]
    }

    #[test]
    fn allowed_file_accepts_listed_extension() {
        assert!(allowed_file("clip.webm", &webm_only()));
        assert!(allowed_file("CLIP.WEBM", &webm_only()));
        assert!(allowed_file("a.b.webm", &webm_only()));
    }

    #[test]
    fn allowed_file_rejects_everything_else() {
        assert!(!allowed_file("clip.exe", &webm_only()));
        assert!(!allowed_file("noext", &webm_only()));
        assert!(!allowed_file("clip.webm.exe", &webm_only()));
        assert!(!allowed_file("", &webm_only()));
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_filename("dir/clip.webm"), "clip.webm");
    }

    #[test]
    fn sanitize_replaces_odd_characters() {
        assert_eq!(sanitize_filename("my clip!.webm"), "my_clip_.webm");
        assert_eq!(sanitize_filename("clip.webm"), "clip.webm");
    }

    #[test]
    fn sanitize_never_yields_hidden_names() {
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn voice_serialization_matches_response_kind() {
        // transcriptions and error bodies carry only `text`
        let body = serde_json::to_value(ChatResponse::text_only("hello")).unwrap();
        assert_eq!(body, serde_json::json!({"text": "hello"}));

        // the text pipeline always carries `voice`, empty on synthesis failure
        let degraded = serde_json::to_value(ChatResponse {
            text: "hello".to_string(),
            voice: Some(String::new()),
        })
        .unwrap();
        assert_eq!(degraded, serde_json::json!({"text": "hello", "voice": ""}));

        let with_voice = serde_json::to_value(ChatResponse {
            text: "hello".to_string(),
            voice: Some("/static/audio/ABCD1234.mp3".to_string()),
        })
        .unwrap();
        assert_eq!(with_voice["voice"], "/static/audio/ABCD1234.mp3");
    }
}
