use super::{
    AppState,
    error::{RelayError, STREAM_UNAVAILABLE},
};
use crate::{
    Error,
    gemini::{GenerateContentRequest, TextStream},
};
use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::Stream;
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Opens the upstream stream and answers with a chunked `text/plain` body
/// that carries each chunk's text as it arrives.
pub async fn relay_stream(state: &AppState, message: &str) -> Result<Response, RelayError> {
    let client = state.client()?;
    let request_id = Uuid::new_v4();
    let cancel = CancellationToken::new();
    let request = GenerateContentRequest::from_text(message);

    info!(%request_id, "Opening streaming relay");

    let chunks = client
        .stream_generate_content(&state.gemini.chat_model, &request, cancel.clone())
        .await
        .map_err(|e| {
            error!(%request_id, "Error opening Gemini stream: {}", e);
            RelayError::UpstreamUnavailable(STREAM_UNAVAILABLE)
        })?;

    let body = RelayStream::new(chunks, cancel, request_id);

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}

/// Response body for the streaming relay. Dropping it (the downstream client
/// disconnected, or the body finished) cancels the upstream read loop.
pub struct RelayStream {
    chunks: TextStream,
    _cancel_on_drop: DropGuard,
    request_id: Uuid,
    forwarded: usize,
}

impl RelayStream {
    pub fn new(chunks: TextStream, cancel: CancellationToken, request_id: Uuid) -> Self {
        Self {
            chunks,
            _cancel_on_drop: cancel.drop_guard(),
            request_id,
            forwarded: 0,
        }
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.chunks.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(text))) => {
                this.forwarded += 1;
                Poll::Ready(Some(Ok(Bytes::from(text))))
            }
            Poll::Ready(Some(Err(e))) => {
                // Aborts the chunked body.
                error!(request_id = %this.request_id, forwarded = this.forwarded, "Upstream stream failed: {}", e);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                debug!(request_id = %this.request_id, forwarded = this.forwarded, "Streaming relay complete");
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
