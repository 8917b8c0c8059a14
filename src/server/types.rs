use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Body of `POST /api/recognize`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeRequest {
    pub image_base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizeResponse {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
