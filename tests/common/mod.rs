//! Shared test utilities

use std::sync::Arc;

use agrivoice_gateway::api::{self, ApiState};
use agrivoice_gateway::Config;
use tempfile::TempDir;

/// A gateway router wired to test configuration, with temporary storage
pub struct TestGateway {
    pub router: axum::Router,
    pub state: Arc<ApiState>,
    _dirs: TempDir,
}

/// Build a gateway with temp upload/audio dirs and both API keys set,
/// then apply test-specific overrides (mock URLs, keys, admin token)
pub fn gateway_with(configure: impl FnOnce(&mut Config)) -> TestGateway {
    let dirs = TempDir::new().expect("failed to create temp dirs");

    let mut config = Config {
        upload_dir: dirs.path().join("uploads"),
        audio_dir: dirs.path().join("audio"),
        static_dir: None,
        env_file: None,
        openai_api_key: Some("sk-test".to_string()),
        hugging_face_api_key: Some("hf-test".to_string()),
        ..Config::default()
    };
    configure(&mut config);

    config.ensure_dirs().expect("failed to create storage dirs");

    let state = Arc::new(ApiState::from_config(&config).expect("failed to build state"));
    TestGateway {
        router: api::router(state.clone()),
        state,
        _dirs: dirs,
    }
}

/// Sample OpenAI chat completion body with the given answer text
#[must_use]
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}
