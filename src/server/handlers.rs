use super::{
    AppState,
    error::{CHAT_UNAVAILABLE, RECOGNIZE_FAILED, RelayError},
    stream::relay_stream,
    types::RecognizeResponse,
    validate,
};
use crate::{
    config::ChatMode,
    gemini::{GenerateContentRequest, GenerateContentResponse},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::Method,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{error, info, warn};

/// `POST /api/chat`: unary or streaming depending on `server.chat_mode`.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, RelayError> {
    state.client()?;
    let request = validate::chat_request(&validate::read_body(body)?)?;

    match state.chat_mode {
        ChatMode::Unary => relay_unary(&state, &request.message).await,
        ChatMode::Stream => relay_stream(&state, &request.message).await,
    }
}

/// `POST /api/chat/stream`: always the streaming relay.
pub async fn chat_stream(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, RelayError> {
    state.client()?;
    let request = validate::chat_request(&validate::read_body(body)?)?;

    relay_stream(&state, &request.message).await
}

/// Forwards the upstream status and JSON body unchanged.
async fn relay_unary(state: &AppState, message: &str) -> Result<Response, RelayError> {
    let client = state.client()?;
    let request = GenerateContentRequest::from_text(message);

    info!("Relaying chat message of {} bytes", message.len());

    let reply = client
        .generate_content(&state.gemini.chat_model, &request)
        .await
        .map_err(|e| {
            error!("Error proxying to Gemini API: {}", e);
            RelayError::UpstreamUnavailable(CHAT_UNAVAILABLE)
        })?;

    if !reply.status.is_success() {
        warn!("Gemini API answered with status {}", reply.status);
        return Err(RelayError::UpstreamRejected {
            status: reply.status,
            body: reply.body,
        });
    }

    Ok((reply.status, Json(reply.body)).into_response())
}

/// `POST /api/recognize`: transcribes the handwriting in an image.
pub async fn recognize(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecognizeResponse>, RelayError> {
    let request = validate::recognize_request(&validate::read_body(body)?)?;
    let client = state.client()?;
    let image = validate::parse_data_uri(&request.image_base64)?;

    info!("Recognizing {} image", image.mime_type);

    let upstream_request =
        GenerateContentRequest::for_recognition(state.gemini.recognize_prompt.as_str(), image);

    let reply = client
        .generate_content(&state.gemini.recognize_model, &upstream_request)
        .await
        .map_err(|e| {
            error!("Image recognition upstream error: {}", e);
            RelayError::UpstreamUnavailable(RECOGNIZE_FAILED)
        })?;

    if !reply.status.is_success() {
        error!(
            "Image recognition rejected with status {}: {}",
            reply.status, reply.body
        );
        return Err(RelayError::UpstreamUnavailable(RECOGNIZE_FAILED));
    }

    let text = serde_json::from_value::<GenerateContentResponse>(reply.body)
        .ok()
        .and_then(|response| response.text())
        .ok_or_else(|| {
            error!("Image recognition response carried no text");
            RelayError::UpstreamUnavailable(RECOGNIZE_FAILED)
        })?;

    Ok(Json(RecognizeResponse { text }))
}

/// Method fallback for every relay route.
pub async fn method_not_allowed(method: Method) -> RelayError {
    warn!("Rejected {} request on a POST-only route", method);
    RelayError::MethodNotAllowed
}
