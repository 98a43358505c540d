// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay-brokered login (authorization-code flow).

use anyhow::Context;
use futures_util::StreamExt;
use serde::Deserialize;

use crate::sse::{SseDecoder, EVENT_AUTH_URI, EVENT_ERROR, EVENT_LOGGED_IN};
use crate::LoginResult;

/// JSON payload of the relay's `logged-in` event.
#[derive(Debug, Deserialize)]
struct TokensEvent {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expiration: u64,
}

/// Log in through an ssorelay instance.
///
/// Issues `GET login_uri` and consumes the event stream. `on_auth_uri` is
/// invoked with the IdP authorization URL as soon as it arrives (typically
/// to open a browser); it runs inline with stream consumption and must not
/// block indefinitely. Returns once the relay reports the terminal outcome.
pub async fn login_with_relay(
    login_uri: &str,
    mut on_auth_uri: impl FnMut(&str),
) -> anyhow::Result<LoginResult> {
    let client = reqwest::Client::new();
    let resp = client
        .get(login_uri)
        .send()
        .await
        .context("failed to execute HTTP login request")?;
    if resp.status() != reqwest::StatusCode::OK {
        anyhow::bail!("HTTP login response status was {}, expected 200", resp.status().as_u16());
    }

    let mut stream = resp.bytes_stream();
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("failed to read login event stream")?;
        for (event, data) in decoder.push(&chunk)? {
            if let Some(result) = handle_event(&event, &data, &mut on_auth_uri)? {
                return Ok(result);
            }
        }
    }
    if let Some((event, data)) = decoder.finish()? {
        if let Some(result) = handle_event(&event, &data, &mut on_auth_uri)? {
            return Ok(result);
        }
    }
    anyhow::bail!("event stream ended before a login result was received")
}

/// Dispatch one event; `Some` carries the terminal success result.
fn handle_event(
    event: &str,
    data: &str,
    on_auth_uri: &mut impl FnMut(&str),
) -> anyhow::Result<Option<LoginResult>> {
    tracing::debug!(event = %event, "received login event");
    match event {
        EVENT_AUTH_URI => {
            on_auth_uri(data);
            Ok(None)
        }
        EVENT_LOGGED_IN => {
            let tokens: TokensEvent = serde_json::from_str(data)
                .context("received access and refresh token in invalid format")?;
            Ok(Some(LoginResult {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expiration: tokens.expiration,
            }))
        }
        EVENT_ERROR => anyhow::bail!("received error '{data}'"),
        other => anyhow::bail!("encountered unknown login event '{other}'"),
    }
}
