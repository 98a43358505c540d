// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the login relay.
//!
//! `begin_login` opens the event stream a console client waits on;
//! `oidc_redirect` receives the browser coming back from the IdP and
//! resolves the matching pending login.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::error::RelayError;
use crate::oauth;
use crate::pending::{LoginOutcome, LoginTokens, WaitHandle};
use crate::sse::{self, EVENT_AUTH_URI, EVENT_ERROR, EVENT_LOGGED_IN};
use crate::state::RelayState;

const LOGIN_ID_BYTES: usize = 8;

/// `GET /login` — begin a login and stream its outcome.
///
/// Emits an `auth-uri` event, then exactly one terminal `logged-in` or
/// `error` event once the redirect arrives or the login times out.
pub async fn begin_login(State(s): State<Arc<RelayState>>) -> Response {
    let (tx, rx) = mpsc::channel::<String>(8);
    tokio::spawn(run_login(s, tx));

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    let headers = [
        (header::CONTENT_TYPE, "text/event-stream"),
        (header::CACHE_CONTROL, "no-cache"),
        (header::CONNECTION, "keep-alive"),
    ];
    (headers, Body::from_stream(stream)).into_response()
}

/// Drive one login attempt, feeding events into the response stream.
async fn run_login(s: Arc<RelayState>, tx: mpsc::Sender<String>) {
    // Validate the configured authorization URI up front: a malformed URI is
    // an error event before anything is registered.
    let auth_base = match url::Url::parse(&s.config.authorization_uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(uri = %s.config.authorization_uri, err = %e, "invalid OIDC authorization URI");
            send_event(&tx, EVENT_ERROR, "invalid authorization URI").await;
            return;
        }
    };

    // Register before advertising the URI so a fast redirect cannot beat the
    // table entry. Collisions are regenerated, not overwritten.
    let Some((login_id, handle)) = register_fresh_id(&s).await else {
        send_event(&tx, EVENT_ERROR, "failed to generate login id").await;
        return;
    };

    let auth_uri = {
        let mut uri = auth_base;
        uri.query_pairs_mut().append_pair("state", &login_id);
        uri.to_string()
    };
    tracing::info!(login_id = %login_id, "sending OIDC authorization URI to client");
    if !send_event(&tx, EVENT_AUTH_URI, &auth_uri).await {
        // Client went away before the URI was written; reap the entry so the
        // table does not hold it until the timeout.
        let _ = s
            .pending
            .deliver(&login_id, LoginOutcome::Failure("client disconnected".to_owned()))
            .await;
        return;
    }

    match s.pending.await_outcome(handle, s.config.login_timeout).await {
        LoginOutcome::Success(tokens) => send_tokens(&tx, &login_id, tokens).await,
        LoginOutcome::Failure(reason) => {
            tracing::warn!(login_id = %login_id, reason = %reason, "OIDC login failed");
            let data = sse::flatten_reason(&format!("OIDC login failed, reason: {reason}"));
            send_event(&tx, EVENT_ERROR, &data).await;
        }
    }
}

/// Register a freshly generated login id, retrying on collision.
async fn register_fresh_id(s: &RelayState) -> Option<(String, WaitHandle)> {
    for _ in 0..3 {
        let id = generate_login_id();
        match s.pending.register(&id).await {
            Ok(handle) => return Some((id, handle)),
            Err(e) => tracing::warn!(err = %e, "login id collision, regenerating"),
        }
    }
    None
}

async fn send_tokens(tx: &mpsc::Sender<String>, login_id: &str, tokens: LoginTokens) {
    let event = sse::TokensEvent {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expiration: tokens.expires_in,
    };
    match serde_json::to_string(&event) {
        Ok(json) => {
            tracing::info!(login_id = %login_id, "sending successful login result to client");
            send_event(tx, EVENT_LOGGED_IN, &json).await;
        }
        Err(e) => {
            tracing::error!(login_id = %login_id, err = %e, "could not serialize tokens event");
            send_event(tx, EVENT_ERROR, "failed to generate token event").await;
        }
    }
}

/// Encode and push one event frame. Returns `false` when the event could not
/// be framed or the client has disconnected.
async fn send_event(tx: &mpsc::Sender<String>, event: &str, data: &str) -> bool {
    let frame = match sse::encode_event(event, data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(event = %event, err = %e, "could not encode login event");
            return false;
        }
    };
    if tx.send(frame).await.is_err() {
        tracing::debug!(event = %event, "client disconnected before event was sent");
        return false;
    }
    true
}

/// Generate a random login id (8 bytes, hex-encoded).
fn generate_login_id() -> String {
    let mut bytes = [0u8; LOGIN_ID_BYTES];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// -- Redirect endpoint --------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// `GET /redirect` — handle the redirect from the IdP.
///
/// Exchanges the authorization code for tokens and delivers them to the
/// waiting login. Browsers are sent to the configured success/failure
/// redirect URI when one is set; otherwise the raw status is rendered.
pub async fn oidc_redirect(
    State(s): State<Arc<RelayState>>,
    Query(q): Query<RedirectQuery>,
) -> Response {
    let login_id = q.state.clone().unwrap_or_default();
    tracing::info!(login_id = %login_id, "received OIDC login redirect");

    match handle_redirect(&s, q).await {
        Ok(()) => {
            tracing::info!(login_id = %login_id, "successfully finished handling OIDC login redirect");
            match &s.config.success_redirect_uri {
                Some(uri) => Redirect::permanent(uri).into_response(),
                None => StatusCode::OK.into_response(),
            }
        }
        Err((kind, message)) => {
            if kind.http_status() >= 500 {
                tracing::error!(login_id = %login_id, code = %kind, "OIDC redirect failed: {message}");
            } else {
                tracing::warn!(login_id = %login_id, code = %kind, "OIDC redirect failed: {message}");
            }
            if let Some(uri) = &s.config.failed_redirect_uri {
                return Redirect::permanent(uri).into_response();
            }
            let status = StatusCode::from_u16(kind.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                // Exchange detail stays in the log.
                (status, "an error was encountered while serving the request").into_response()
            } else {
                (status, message).into_response()
            }
        }
    }
}

async fn handle_redirect(s: &RelayState, q: RedirectQuery) -> Result<(), (RelayError, String)> {
    // The login id comes back in `state` because that is what was sent to the IdP.
    let login_id = q.state.ok_or_else(|| {
        (RelayError::BadRequest, "URL query parameter 'state' was expected, but is missing".to_owned())
    })?;
    let code = q.code.ok_or_else(|| {
        (RelayError::BadRequest, "URL query parameter 'code' was expected, but is missing".to_owned())
    })?;

    match oauth::exchange_code(&s.http, &s.config, &code).await {
        Ok(token) => {
            let outcome = LoginOutcome::Success(LoginTokens {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                expires_in: token.expires_in,
            });
            if s.pending.deliver(&login_id, outcome).await {
                Ok(())
            } else {
                // Nobody received the tokens, so the browser must not be told
                // the login worked.
                Err((RelayError::SessionExpired, "login session expired or is unknown".to_owned()))
            }
        }
        Err(e) => {
            // Best effort: a still-waiting client learns the exchange failed.
            let _ = s
                .pending
                .deliver(
                    &login_id,
                    LoginOutcome::Failure(
                        "failed to retrieve tokens from authorization code".to_owned(),
                    ),
                )
                .await;
            Err((
                RelayError::ExchangeFailed,
                format!("failed to retrieve tokens from authorization code: {e}"),
            ))
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
