use serde::{Deserialize, Serialize};

pub const DEFAULT_RECOGNIZE_PROMPT: &str = "這是一張含有手寫文字的圖片。請精確地辨識並提取圖片中的所有繁體中文字。請只回傳辨識出的文字內容，不要添加任何解釋、標題或額外的格式。";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub chat_mode: ChatMode,
    /// Chunks buffered between the upstream reader and the response body.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Unary,
    Stream,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub chat_model: String,
    #[serde(default = "default_model")]
    pub recognize_model: String,
    #[serde(default = "default_recognize_prompt")]
    pub recognize_prompt: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// The credential, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

// Keeps the credential out of logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("chat_model", &self.chat_model)
            .field("recognize_model", &self.recognize_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chat_mode: ChatMode::default(),
            stream_buffer: default_stream_buffer(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            chat_model: default_model(),
            recognize_model: default_model(),
            recognize_prompt: default_recognize_prompt(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_stream_buffer() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_recognize_prompt() -> String {
    DEFAULT_RECOGNIZE_PROMPT.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}
