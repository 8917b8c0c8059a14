//! Incremental decoder for the `text/event-stream` framing used by
//! `streamGenerateContent?alt=sse`.

/// Buffers raw bytes until a full event (terminated by a blank line) is
/// available, then yields its `data:` payload. Bytes are kept undecoded so
/// a multi-byte character split across network chunks survives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the payloads of every event it
    /// completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, separator_len)) = find_boundary(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + separator_len).collect();
            if let Some(data) = event_data(&raw[..end]) {
                events.push(data);
            }
        }
        events
    }

    /// Returns a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        event_data(&rest)
    }
}

fn find_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    (0..buffer.len()).find_map(|i| {
        let tail = &buffer[i..];
        if tail.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else if tail.starts_with(b"\n\n") {
            Some((i, 2))
        } else {
            None
        }
    })
}

fn event_data(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    if data.is_empty() {
        None
    } else {
        Some(data.join("\n"))
    }
}
