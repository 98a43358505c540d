// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login event-stream framing.
//!
//! The begin-login endpoint pushes progress to the waiting client as a
//! `text/event-stream` body, one frame per event:
//!
//! ```text
//! event: <name>\ndata: <payload>\n\n
//! ```
//!
//! Event names the relay emits:
//!
//! - `auth-uri` — payload is the absolute IdP authorization URL
//! - `logged-in` — payload is the [`TokensEvent`] JSON, terminal
//! - `error` — payload is a human-readable reason, terminal

use serde::{Deserialize, Serialize};

pub const EVENT_AUTH_URI: &str = "auth-uri";
pub const EVENT_LOGGED_IN: &str = "logged-in";
pub const EVENT_ERROR: &str = "error";

/// JSON payload of the `logged-in` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensEvent {
    pub access_token: String,
    pub refresh_token: String,
    /// `expires_in` from the token endpoint, in seconds.
    pub expiration: u64,
}

/// Encode one event frame.
///
/// Frames are newline-delimited, so a newline inside either field would
/// corrupt the stream framing; such payloads are rejected here instead.
/// Callers that relay free-form text (error reasons) flatten it first, see
/// [`flatten_reason`].
pub fn encode_event(event: &str, data: &str) -> anyhow::Result<String> {
    if event.contains('\n') || data.contains('\n') {
        anyhow::bail!("event fields must not contain newlines");
    }
    Ok(format!("event: {event}\ndata: {data}\n\n"))
}

/// Collapse a free-form failure reason onto a single line.
pub fn flatten_reason(reason: &str) -> String {
    reason.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
