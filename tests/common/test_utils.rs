use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use gemini_relay::{
    config::{ChatMode, Config},
    gemini::GenerativeClient,
    server::{AppState, router},
};
use serde_json::{Value, json};
use std::sync::Arc;

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "gemini-1.5-flash-latest";

/// Create a test configuration pointing at `base_url`
pub fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.logs.level = "debug".to_string();
    config.gemini.base_url = base_url.to_string();
    config.gemini.api_key = Some(TEST_API_KEY.to_string());
    config
}

/// Router backed by the given upstream client
pub fn create_test_app(client: Arc<dyn GenerativeClient>, chat_mode: ChatMode) -> Router {
    let mut config = create_test_config("http://unused.invalid");
    config.server.chat_mode = chat_mode;
    router(AppState::with_client(client, &config))
}

/// Router with no credential configured
pub fn create_misconfigured_app() -> Router {
    let mut config = create_test_config("http://unused.invalid");
    config.gemini.api_key = None;
    router(AppState::from_config(&config).unwrap())
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// A provider reply carrying `text` as its only candidate
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6 }
    })
}

/// One SSE event per chunk, as sent by `streamGenerateContent?alt=sse`
pub fn sse_body(chunks: &[&str]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "data: {}\r\n\r\n",
                json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": chunk }] } }] })
            )
        })
        .collect()
}

/// A 1x1 PNG as a data URI
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9090
  chat_mode: stream
  stream_buffer: 4
  logs:
    level: "debug"

gemini:
  base_url: "http://localhost:4000/v1beta"
  api_key: "file-key"
  chat_model: "gemini-2.5-flash"
  timeout_secs: 30
"#;

/// Invalid configuration YAML for testing error cases
pub const INVALID_CONFIG_YAML: &str = r#"
server:
  port: "not-a-number"
  chat_mode: "sideways"
"#;
