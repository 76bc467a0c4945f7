//! HTTP API server for the agrivoice gateway

pub mod admin;
pub mod chat;
pub mod health;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::llm::AnswerGenerator;
use crate::voice::{SpeechSynthesizer, SpeechTranscriber};
use crate::Result;

/// Shared state for API handlers
#[derive(Clone, Debug)]
pub struct ApiState {
    /// Runtime-mutable OpenAI key, read by the generator at call time
    pub credentials: CredentialStore,
    /// Shared secret gating the admin endpoints, if configured
    pub admin_token: Option<String>,
    /// Env file the admin endpoint persists the key to, if configured
    pub env_file: Option<PathBuf>,
    pub generator: AnswerGenerator,
    pub transcriber: SpeechTranscriber,
    pub synthesizer: SpeechSynthesizer,
    pub upload_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    /// Permitted upload extensions, matched case-insensitively
    pub allowed_extensions: Vec<String>,
}

impl ApiState {
    /// Build the shared state and collaborator clients from configuration
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = CredentialStore::new(config.openai_api_key.clone());
        let generator = AnswerGenerator::new(&config.llm, credentials.clone())?;
        let transcriber =
            SpeechTranscriber::new(&config.stt, config.hugging_face_api_key.clone())?;
        let synthesizer = SpeechSynthesizer::new(&config.tts, &config.audio_dir)?;

        Ok(Self {
            credentials,
            admin_token: config.admin_token.clone(),
            env_file: config.env_file.clone(),
            generator,
            transcriber,
            synthesizer,
            upload_dir: config.upload_dir.clone(),
            audio_dir: config.audio_dir.clone(),
            static_dir: config.static_dir.clone(),
            allowed_extensions: config.allowed_extensions.clone(),
        })
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let mut router = Router::new()
        .merge(chat::router(state.clone()))
        .nest("/admin", admin::router(state.clone()))
        .merge(health::router())
        .nest_service("/static/audio", ServeDir::new(&state.audio_dir));

    // Serve the static client page if configured
    if let Some(static_dir) = &state.static_dir {
        let index_file = static_dir.join("index.html");
        let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

        router = router.fallback_service(serve_dir);
        tracing::info!(path = %static_dir.display(), "serving static files");
    }

    // CORS layer for cross-origin requests from the client page
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a collaborator client cannot be built
    pub fn new(config: &Config, port: u16) -> Result<Self> {
        Ok(Self {
            state: Arc::new(ApiState::from_config(config)?),
            port,
        })
    }

    /// Shared handler state, for startup diagnostics
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
