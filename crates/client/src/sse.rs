// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login event-stream decoding.
//!
//! Counterpart of the relay's producer: buffers raw response-body chunks and
//! yields `(event, data)` pairs. Frames are separated by a blank line and
//! must consist of exactly an `event: ` line followed by a `data: ` line;
//! anything else is a protocol error.

/// Event names the relay emits.
pub const EVENT_AUTH_URI: &str = "auth-uri";
pub const EVENT_LOGGED_IN: &str = "logged-in";
pub const EVENT_ERROR: &str = "error";

/// Incremental decoder for the login event stream.
///
/// Handles events split across chunks and multiple events per chunk; an
/// incomplete frame stays buffered until the next `push` or `finish`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of the response body, returning all completed events.
    pub fn push(&mut self, bytes: &[u8]) -> anyhow::Result<Vec<(String, String)>> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let frame = self.buffer[..end].to_owned();
            self.buffer.drain(..end + 2);
            events.push(parse_event(&frame)?);
        }
        Ok(events)
    }

    /// Drain a trailing frame once the stream has ended.
    ///
    /// A producer that closes the connection right after the final frame may
    /// leave it without the blank-line terminator; non-empty leftover that
    /// does not parse is a protocol error.
    pub fn finish(&mut self) -> anyhow::Result<Option<(String, String)>> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(parse_event(rest.trim_end_matches('\n'))?))
    }
}

/// Parse one raw frame into its `(event, data)` fields.
fn parse_event(frame: &str) -> anyhow::Result<(String, String)> {
    let mut lines = frame.split('\n');
    let (Some(event_line), Some(data_line), None) = (lines.next(), lines.next(), lines.next())
    else {
        anyhow::bail!("event does not contain exactly the fields 'event' and 'data'");
    };
    let Some(event) = event_line.strip_prefix("event: ") else {
        anyhow::bail!("event field 'event' must start with 'event: '");
    };
    let Some(data) = data_line.strip_prefix("data: ") else {
        anyhow::bail!("event field 'data' must start with 'data: '");
    };
    Ok((event.to_owned(), data.to_owned()))
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
