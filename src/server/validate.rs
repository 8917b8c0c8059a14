//! Request validation for the relay endpoints. Every check fails with a
//! `RelayError::BadRequest` instead of letting malformed input reach the
//! upstream request builder.

use super::error::RelayError;
use super::types::{ChatRequest, RecognizeRequest};
use crate::gemini::InlineData;
use axum::{Json, extract::rejection::JsonRejection};
use serde_json::Value;
use tracing::debug;

pub const MISSING_MESSAGE: &str = "No message provided in the request body.";
pub const MISSING_IMAGE: &str = "No image data provided.";
pub const MALFORMED_IMAGE: &str =
    "Image data must be a base64 data URI with an image MIME type.";

/// Unwraps the JSON extractor, turning a rejection into a 400.
pub fn read_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, RelayError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection);
        RelayError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })
}

pub fn chat_request(body: &Value) -> Result<ChatRequest, RelayError> {
    let message =
        required_string(body, "message").ok_or_else(|| RelayError::bad_request(MISSING_MESSAGE))?;

    Ok(ChatRequest { message })
}

pub fn recognize_request(body: &Value) -> Result<RecognizeRequest, RelayError> {
    let image_base64 =
        required_string(body, "imageBase64").ok_or_else(|| RelayError::bad_request(MISSING_IMAGE))?;

    Ok(RecognizeRequest { image_base64 })
}

/// Splits `data:image/<subtype>;base64,<payload>` into MIME type and payload.
/// The shape is checked in full before anything is extracted.
pub fn parse_data_uri(uri: &str) -> Result<InlineData, RelayError> {
    let malformed = || RelayError::bad_request(MALFORMED_IMAGE);

    let rest = uri.strip_prefix("data:").ok_or_else(malformed)?;
    let (mime_type, payload) = rest.split_once(";base64,").ok_or_else(malformed)?;
    let subtype = mime_type.strip_prefix("image/").ok_or_else(malformed)?;

    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(malformed());
    }
    if payload.is_empty() {
        return Err(malformed());
    }

    Ok(InlineData {
        mime_type: mime_type.to_string(),
        data: payload.to_string(),
    })
}

fn required_string(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_extracts_png_mime_type() {
        let image = parse_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[rstest]
    #[case("iVBORw0KGgo=")]
    #[case("image/png;base64,iVBORw0KGgo=")]
    #[case("data:text/plain;base64,aGVsbG8=")]
    #[case("data:image/png,iVBORw0KGgo=")]
    #[case("data:image/;base64,iVBORw0KGgo=")]
    #[case("data:image/svg+xml;base64,PHN2Zz4=")]
    #[case("data:image/jpeg;base64,")]
    fn test_rejects_malformed_data_uri(#[case] uri: &str) {
        let err = parse_data_uri(uri).unwrap_err();
        assert!(matches!(err, RelayError::BadRequest(ref msg) if msg == MALFORMED_IMAGE));
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({ "message": null }))]
    #[case(json!({ "message": "" }))]
    #[case(json!({ "message": "   " }))]
    #[case(json!({ "message": 42 }))]
    #[case(json!(["message"]))]
    fn test_chat_request_requires_message(#[case] body: Value) {
        let err = chat_request(&body).unwrap_err();
        assert!(matches!(err, RelayError::BadRequest(ref msg) if msg == MISSING_MESSAGE));
    }

    #[test]
    fn test_chat_request_keeps_message_verbatim() {
        let request = chat_request(&json!({ "message": " Hello " })).unwrap();
        assert_eq!(request.message, " Hello ");
    }

    #[test]
    fn test_recognize_request_requires_image() {
        let err = recognize_request(&json!({ "image": "data:image/png;base64,AA==" })).unwrap_err();
        assert!(matches!(err, RelayError::BadRequest(ref msg) if msg == MISSING_IMAGE));

        let request = recognize_request(&json!({ "imageBase64": "data:image/png;base64,AA==" }))
            .unwrap();
        assert_eq!(request.image_base64, "data:image/png;base64,AA==");
    }
}
