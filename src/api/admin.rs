//! Admin endpoints for runtime credential mutation
//!
//! These are collaborators of the core chat flow: they swap or clear the
//! OpenAI key the answer generator reads at call time. When an admin token is
//! configured, requests must carry it in the `X-Admin-Token` header or a
//! `token` field; otherwise the endpoints are open (development mode).

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiState;

/// Build the admin router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/set_openai_key", post(set_openai_key))
        .route("/clear_openai_key", post(clear_openai_key))
        .with_state(state)
}

/// Fields accepted in the admin request body (form or JSON)
#[derive(Debug, Default, Deserialize)]
struct AdminPayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default, rename = "OPENAI_API_KEY")]
    openai_api_key: Option<String>,
}

#[derive(Serialize)]
struct AdminStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

#[derive(Serialize)]
struct AdminError {
    error: &'static str,
}

/// Set the OpenAI key at runtime, with best-effort persistence to the
/// configured env file
async fn set_openai_key(State(state): State<Arc<ApiState>>, req: Request) -> Response {
    let header_token = extract_header_token(&req);
    let payload = parse_payload(req).await;

    if !authorized(&state, header_token, payload.token.as_deref()) {
        return unauthorized();
    }

    let key = payload
        .key
        .or(payload.openai_api_key)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let Some(key) = key else {
        return (
            StatusCode::BAD_REQUEST,
            Json(AdminError {
                error: "no key provided",
            }),
        )
            .into_response();
    };

    state.credentials.set(key.clone()).await;

    // persistence is convenience only; the runtime key is already set
    if let Some(env_file) = &state.env_file {
        if let Err(e) = persist_key(env_file, &key) {
            tracing::error!(error = %e, path = %env_file.display(), "failed to write env file");
            return (
                StatusCode::OK,
                Json(AdminStatus {
                    status: "ok",
                    warning: Some("runtime key set but env file write failed"),
                }),
            )
                .into_response();
        }
        tracing::info!("OpenAI API key set via admin endpoint and saved to env file");
    } else {
        tracing::info!("OpenAI API key set via admin endpoint");
    }

    (
        StatusCode::OK,
        Json(AdminStatus {
            status: "ok",
            warning: None,
        }),
    )
        .into_response()
}

/// Clear the runtime OpenAI key
async fn clear_openai_key(State(state): State<Arc<ApiState>>, req: Request) -> Response {
    let header_token = extract_header_token(&req);
    let payload = parse_payload(req).await;

    if !authorized(&state, header_token, payload.token.as_deref()) {
        return unauthorized();
    }

    state.credentials.clear().await;
    tracing::info!("OpenAI API key cleared from runtime");

    (
        StatusCode::OK,
        Json(AdminStatus {
            status: "cleared",
            warning: None,
        }),
    )
        .into_response()
}

fn extract_header_token(req: &Request) -> Option<String> {
    req.headers()
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Best-effort body parse; a missing or malformed body is an empty payload,
/// not an error
async fn parse_payload(req: Request) -> AdminPayload {
    let is_json = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        Json::<AdminPayload>::from_request(req, &())
            .await
            .map(|Json(p)| p)
            .unwrap_or_default()
    } else {
        Form::<AdminPayload>::from_request(req, &())
            .await
            .map(|Form(p)| p)
            .unwrap_or_default()
    }
}

fn authorized(state: &ApiState, header_token: Option<String>, body_token: Option<&str>) -> bool {
    let Some(expected) = &state.admin_token else {
        return true;
    };
    let provided = header_token.as_deref().or(body_token);
    provided == Some(expected.as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(AdminError {
            error: "unauthorized",
        }),
    )
        .into_response()
}

/// Update the `OPENAI_API_KEY=` line in the env file, or append one
fn persist_key(path: &Path, key: &str) -> std::io::Result<()> {
    let line = format!("OPENAI_API_KEY={key}");

    let contents = match std::fs::read_to_string(path) {
        Ok(existing) => {
            let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();
            let mut replaced = false;
            for l in &mut lines {
                if l.trim_start().starts_with("OPENAI_API_KEY=") {
                    l.clone_from(&line);
                    replaced = true;
                    break;
                }
            }
            if !replaced {
                lines.push(line);
            }
            lines.join("\n") + "\n"
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => line + "\n",
        Err(e) => return Err(e),
    };

    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_key_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        persist_key(&path, "sk-new").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "OPENAI_API_KEY=sk-new\n"
        );
    }

    #[test]
    fn persist_key_replaces_existing_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "FOO=bar\nOPENAI_API_KEY=sk-old\nBAZ=qux\n").unwrap();

        persist_key(&path, "sk-new").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "FOO=bar\nOPENAI_API_KEY=sk-new\nBAZ=qux\n"
        );
    }

    #[test]
    fn persist_key_appends_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "FOO=bar\n").unwrap();

        persist_key(&path, "sk-new").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "FOO=bar\nOPENAI_API_KEY=sk-new\n"
        );
    }
}
