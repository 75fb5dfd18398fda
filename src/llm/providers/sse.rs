//! Incremental Server-Sent Events parser.
//!
//! Chat Completions streams arrive as
//!
//! ```text
//! data: {"choices":[...]}
//!
//! data: [DONE]
//! ```
//!
//! Chunks from the network respect neither line nor character boundaries,
//! so the parser buffers raw bytes and only decodes complete lines.

/// One complete SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event_type: Option<String>,
    /// All `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    /// Whether this is the OpenAI `[DONE]` sentinel.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Feeds bytes in, yields events out.
#[derive(Debug, Default)]
pub struct SseLineParser {
    partial: Vec<u8>,
    event_type: Option<String>,
    data_lines: Vec<String>,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a network chunk; returns every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.partial.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=newline).collect();
            let line = decode_line(&raw[..newline]);
            if let Some(event) = self.line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Emit whatever is left once the body ends without a blank line.
    pub fn flush(&mut self) -> Option<SseEvent> {
        if !self.partial.is_empty() {
            let raw = std::mem::take(&mut self.partial);
            let line = decode_line(&raw);
            // A trailing non-blank line can only add fields, never complete an event.
            let _ = self.line(&line);
        }
        self.take_event()
    }

    fn line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.take_event();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event_type = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() {
            self.event_type = None;
            return None;
        }
        Some(SseEvent {
            event_type: self.event_type.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        })
    }
}

/// Decode one line without its terminator. Invalid UTF-8 inside a complete
/// line is replaced rather than rejected.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
