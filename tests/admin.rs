//! Admin credential endpoint integration tests

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
};
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use agrivoice_gateway::LlmFailure;

mod common;
use common::{completion_body, gateway_with, TestGateway};

async fn send(gateway: &TestGateway, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = gateway.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn form_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn set_key_is_open_when_no_token_configured() {
    let gateway = gateway_with(|config| config.openai_api_key = None);

    let (status, json) = send(&gateway, form_post("/admin/set_openai_key", "key=sk-new")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(gateway.state.credentials.is_set().await);
}

#[tokio::test]
async fn set_key_rejects_wrong_token() {
    let gateway = gateway_with(|config| {
        config.openai_api_key = None;
        config.admin_token = Some("secret".to_string());
    });

    let (status, json) = send(
        &gateway,
        form_post("/admin/set_openai_key", "key=sk-new&token=wrong"),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "unauthorized");
    assert!(!gateway.state.credentials.is_set().await);
}

#[tokio::test]
async fn set_key_accepts_header_token_with_json_body() {
    let gateway = gateway_with(|config| {
        config.openai_api_key = None;
        config.admin_token = Some("secret".to_string());
    });

    let request = Request::builder()
        .method("POST")
        .uri("/admin/set_openai_key")
        .header(CONTENT_TYPE, "application/json")
        .header("X-Admin-Token", "secret")
        .body(Body::from(r#"{"key": "sk-new"}"#))
        .unwrap();
    let (status, json) = send(&gateway, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(gateway.state.credentials.is_set().await);
}

#[tokio::test]
async fn set_key_accepts_body_token() {
    let gateway = gateway_with(|config| {
        config.openai_api_key = None;
        config.admin_token = Some("secret".to_string());
    });

    let (status, _) = send(
        &gateway,
        form_post("/admin/set_openai_key", "token=secret&OPENAI_API_KEY=sk-new"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(gateway.state.credentials.is_set().await);
}

#[tokio::test]
async fn set_key_requires_a_key() {
    let gateway = gateway_with(|config| config.openai_api_key = None);

    let (status, json) = send(&gateway, form_post("/admin/set_openai_key", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "no key provided");
}

#[tokio::test]
async fn clear_key_removes_the_runtime_credential() {
    let gateway = gateway_with(|_| {});
    assert!(gateway.state.credentials.is_set().await);

    let (status, json) = send(&gateway, form_post("/admin/clear_openai_key", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cleared");
    assert!(!gateway.state.credentials.is_set().await);
}

#[tokio::test]
async fn set_key_persists_to_env_file() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join(".env");
    std::fs::write(&env_path, "OPENAI_API_KEY=sk-old\n").unwrap();

    let env_file = env_path.clone();
    let gateway = gateway_with(move |config| config.env_file = Some(env_file));

    let (status, _) = send(&gateway, form_post("/admin/set_openai_key", "key=sk-new")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::fs::read_to_string(&env_path).unwrap(),
        "OPENAI_API_KEY=sk-new\n"
    );
}

#[tokio::test]
async fn chat_recovers_after_key_is_set_at_runtime() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Mulch well.")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3".to_vec()))
        .mount(&server)
        .await;

    let uri = server.uri();
    let gateway = gateway_with(move |config| {
        config.openai_api_key = None;
        config.llm.api_base = uri.clone();
        config.tts.api_base = uri;
    });

    // without a key the chat endpoint answers with the missing-key sentinel
    let (_, json) = send(&gateway, form_post("/chat", "text=hello")).await;
    assert_eq!(json["text"], LlmFailure::MissingKey.sentinel());

    let (status, _) = send(&gateway, form_post("/admin/set_openai_key", "key=sk-new")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&gateway, form_post("/chat", "text=hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "Mulch well.");
}
