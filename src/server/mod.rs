mod error;
pub mod handlers;
pub mod stream;
pub mod types;
pub mod validate;

pub use error::*;

use crate::{
    Result,
    config::{ChatMode, Config, GeminiConfig},
    gemini::{GeminiClient, GenerativeClient},
};
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Shared, read-only handler state. `client` is `None` when no credential is
/// configured; relay routes then answer `ServerMisconfigured`.
#[derive(Clone)]
pub struct AppState {
    pub client: Option<Arc<dyn GenerativeClient>>,
    pub gemini: Arc<GeminiConfig>,
    pub chat_mode: ChatMode,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client: Option<Arc<dyn GenerativeClient>> = match config.gemini.api_key() {
            Some(_) => Some(Arc::new(GeminiClient::new(
                &config.gemini,
                config.server.stream_buffer,
            )?)),
            None => {
                warn!("GEMINI_API_KEY is not configured; relay routes will answer 500");
                None
            }
        };

        Ok(Self {
            client,
            gemini: Arc::new(config.gemini.clone()),
            chat_mode: config.server.chat_mode,
        })
    }

    pub fn with_client(client: Arc<dyn GenerativeClient>, config: &Config) -> Self {
        Self {
            client: Some(client),
            gemini: Arc::new(config.gemini.clone()),
            chat_mode: config.server.chat_mode,
        }
    }

    pub fn client(&self) -> std::result::Result<&Arc<dyn GenerativeClient>, RelayError> {
        self.client.as_ref().ok_or(RelayError::ServerMisconfigured)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/chat",
            post(handlers::chat).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/chat/stream",
            post(handlers::chat_stream).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/recognize",
            post(handlers::recognize).fallback(handlers::method_not_allowed),
        )
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let app_state = AppState::from_config(&config)?;
    let app = router(app_state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!(
        "Starting relay on {} (chat mode: {:?})",
        addr, config.server.chat_mode
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
