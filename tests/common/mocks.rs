use async_trait::async_trait;
use axum::http::StatusCode;
use gemini_relay::{
    Error, Result,
    client::ChatBackend,
    gemini::{GenerateContentRequest, GenerativeClient, TextStream, UpstreamReply},
};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum StreamBehavior {
    Chunks { chunks: Vec<String>, fail_at_end: bool },
    Hang,
}

/// Mock upstream provider for router tests
#[derive(Debug)]
pub struct MockGenerativeClient {
    reply: Option<UpstreamReply>,
    stream: Option<StreamBehavior>,
    pub requests: Arc<Mutex<Vec<(String, GenerateContentRequest)>>>,
    pub cancel_tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl MockGenerativeClient {
    fn empty() -> Self {
        Self {
            reply: None,
            stream: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            cancel_tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every call fails as if the provider were unreachable.
    pub fn failing() -> Self {
        Self::empty()
    }

    pub fn replying(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            reply: Some(UpstreamReply { status, body }),
            ..Self::empty()
        }
    }

    pub fn streaming(chunks: &[&str]) -> Self {
        Self {
            stream: Some(StreamBehavior::Chunks {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                fail_at_end: false,
            }),
            ..Self::empty()
        }
    }

    pub fn streaming_then_failing(chunks: &[&str]) -> Self {
        Self {
            stream: Some(StreamBehavior::Chunks {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                fail_at_end: true,
            }),
            ..Self::empty()
        }
    }

    /// A stream that never yields, for disconnect tests.
    pub fn hanging() -> Self {
        Self {
            stream: Some(StreamBehavior::Hang),
            ..Self::empty()
        }
    }

    pub fn get_requests(&self) -> Vec<(String, GenerateContentRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn get_cancel_tokens(&self) -> Vec<CancellationToken> {
        self.cancel_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeClient for MockGenerativeClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));

        self.reply
            .clone()
            .ok_or_else(|| Error::upstream("connection refused"))
    }

    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        cancel: CancellationToken,
    ) -> Result<TextStream> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        self.cancel_tokens.lock().unwrap().push(cancel);

        match self.stream.clone() {
            Some(StreamBehavior::Chunks {
                chunks,
                fail_at_end,
            }) => {
                let mut items: Vec<Result<String>> = chunks.into_iter().map(Ok).collect();
                if fail_at_end {
                    items.push(Err(Error::upstream("stream reset by peer")));
                }
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(StreamBehavior::Hang) => {
                Ok(Box::pin(futures::stream::pending::<Result<String>>()))
            }
            None => Err(Error::upstream("connection refused")),
        }
    }
}

/// Mock chat backend that answers from a queue and records what was sent
#[derive(Debug, Default)]
pub struct MockChatBackend {
    pub replies: Mutex<Vec<std::result::Result<String, String>>>,
    pub sent: Mutex<Vec<String>>,
}

impl MockChatBackend {
    pub fn with_replies(replies: Vec<std::result::Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn get_sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn send(&self, message: &str) -> Result<String> {
        self.sent.lock().unwrap().push(message.to_string());

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(Error::upstream("No more mock replies available"));
        }
        replies.remove(0).map_err(Error::upstream)
    }
}
