use crate::{
    Error, Result,
    gemini::{GenerateContentResponse, error_body},
    server::types::ChatRequest,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error};

/// Where a chat turn gets its reply from. Implementations talk to the relay,
/// never to the provider, so no credential lives on this side.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: &str) -> Result<String>;
}

/// Calls `POST /api/chat` and reads the reply out of the relayed provider
/// JSON.
pub struct ProxyBackend {
    client: reqwest::Client,
    chat_url: String,
}

impl ProxyBackend {
    pub fn new(proxy_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            chat_url: format!("{}/api/chat", proxy_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ChatBackend for ProxyBackend {
    async fn send(&self, message: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            error!("Relay answered {}: {}", status, body);
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = response.json().await?;
        reply
            .text()
            .ok_or_else(|| Error::upstream("Reply contained no text"))
    }
}

/// Calls `POST /api/chat/stream` and joins the streamed chunks.
pub struct StreamingProxyBackend {
    client: reqwest::Client,
    stream_url: String,
}

impl StreamingProxyBackend {
    pub fn new(proxy_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            stream_url: format!("{}/api/chat/stream", proxy_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ChatBackend for StreamingProxyBackend {
    async fn send(&self, message: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.stream_url)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            error!("Relay answered {}: {}", status, body);
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        // Chunks may split a multi-byte character, so decode once at the end.
        let mut bytes = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            debug!("Received {} streamed bytes", chunk.len());
            bytes.extend_from_slice(&chunk);
        }

        String::from_utf8(bytes)
            .map_err(|e| Error::upstream(format!("Reply was not UTF-8: {}", e)))
    }
}
