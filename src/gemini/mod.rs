mod client;
mod sse;
mod types;

pub use client::*;
pub use sse::SseDecoder;
pub use types::*;
