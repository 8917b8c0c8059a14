use super::sse::SseDecoder;
use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::{Error, Result, config::GeminiConfig};
use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::{pin::Pin, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Incremental text chunks in generation order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Upstream status and JSON body, whatever the status was.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply>;

    /// Opens a streaming generation. The upstream read loop stops once
    /// `cancel` fires.
    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        cancel: CancellationToken,
    ) -> Result<TextStream>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    stream_buffer: usize,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, stream_buffer: usize) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| Error::config("Gemini API key is not configured"))?
            .to_string();
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            stream_buffer: stream_buffer.max(1),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply> {
        debug!("Calling generateContent on model {}", model);

        let response = self
            .client
            .post(self.endpoint(model, "generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| Error::upstream(format!("Invalid upstream status: {}", e)))?;
        let body: serde_json::Value = response.json().await?;

        debug!("generateContent answered with status {}", status);

        Ok(UpstreamReply { status, body })
    }

    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        cancel: CancellationToken,
    ) -> Result<TextStream> {
        debug!("Opening streamGenerateContent on model {}", model);

        let response = self
            .client
            .post(self.endpoint(model, "streamGenerateContent"))
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let (tx, rx) = mpsc::channel(self.stream_buffer);
        tokio::spawn(forward_events(response.bytes_stream(), tx, cancel));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Body of a non-2xx response for error reporting. A body that cannot be read
/// is reported as empty.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!("Could not read body of {} response: {}", status, e);
            String::new()
        }
    }
}

/// Reads the upstream SSE body and pushes each chunk's text into `tx` as soon
/// as its event is complete. Ends on upstream EOF, on the first error, when
/// the receiver is gone, or when `cancel` fires.
pub(crate) async fn forward_events<S>(
    bytes: S,
    tx: mpsc::Sender<Result<String>>,
    cancel: CancellationToken,
) where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    let mut bytes = std::pin::pin!(bytes);
    let mut decoder = SseDecoder::new();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Downstream went away, dropping upstream stream");
                return;
            }
            next = bytes.next() => next,
        };

        let done = next.is_none();
        let events = match next {
            Some(Ok(chunk)) => {
                trace!("Upstream chunk of {} bytes", chunk.len());
                decoder.push(&chunk)
            }
            Some(Err(e)) => {
                warn!("Error reading upstream stream: {}", e);
                let _ = tx.send(Err(e.into())).await;
                return;
            }
            None => decoder.finish().into_iter().collect(),
        };

        for data in events {
            match chunk_text(&data) {
                Ok(Some(text)) => {
                    if tx.send(Ok(text)).await.is_err() {
                        debug!("Receiver dropped, stopping upstream read");
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }

        if done {
            return;
        }
    }
}

/// Text carried by one streamed event; `None` for chunks without text.
fn chunk_text(data: &str) -> Result<Option<String>> {
    let response: GenerateContentResponse = serde_json::from_str(data)?;
    Ok(response.text().filter(|text| !text.is_empty()))
}
