// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end login-flow tests.
//!
//! Spawns an in-process relay and a scripted mock identity provider on
//! ephemeral ports and drives them over real HTTP with the ssoclient
//! library.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Form, Json, Router};
use ssorelay::config::OidcConfig;
use ssorelay::state::RelayState;
use ssorelay::transport::build_router;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times — only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

// -- Relay harness ------------------------------------------------------------

/// An in-process relay serving on an ephemeral port; killed on drop.
pub struct RelayHarness {
    pub state: Arc<RelayState>,
    pub base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl RelayHarness {
    pub fn login_uri(&self) -> String {
        format!("{}/login", self.base_url)
    }

    pub fn redirect_uri(&self, state: &str, code: &str) -> String {
        format!("{}/redirect?state={state}&code={code}", self.base_url)
    }
}

impl Drop for RelayHarness {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn an in-process relay with the given OIDC configuration.
pub async fn spawn_relay(config: OidcConfig) -> anyhow::Result<RelayHarness> {
    ensure_crypto();
    let state = RelayState::new(config);
    let router = build_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(RelayHarness { state, base_url: format!("http://{addr}"), task })
}

/// Default OIDC config pointing at a mock IdP.
pub fn oidc_config(idp_base: &str) -> OidcConfig {
    OidcConfig {
        base_uri: idp_base.to_owned(),
        authorization_uri: format!("{idp_base}/auth"),
        redirect_uri: "http://localhost:9700/redirect".to_owned(),
        client_id: "mock-client-id".to_owned(),
        client_secret: "mock-client-secret".to_owned(),
        success_redirect_uri: None,
        failed_redirect_uri: None,
        login_timeout: Duration::from_secs(5),
    }
}

// -- Mock identity provider ---------------------------------------------------

/// Scripted reply for one device-grant token poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePoll {
    Pending,
    SlowDown,
    Denied,
    Expired,
    /// An error code outside the RFC 8628 set.
    Unknown,
    Success,
}

/// Behavior of a [`spawn_mock_idp`] instance.
#[derive(Debug, Clone)]
pub struct MockIdpConfig {
    /// Authorization code the `/token` endpoint accepts.
    pub expected_code: String,
    /// `interval` advertised by the device-authorization endpoint.
    pub device_interval: u64,
    /// `expires_in` advertised by the device-authorization endpoint.
    pub device_expires_in: u64,
    /// Reply sequence for device-grant polls; the last entry repeats.
    pub device_script: Vec<DevicePoll>,
}

impl Default for MockIdpConfig {
    fn default() -> Self {
        Self {
            expected_code: "mock-auth-code".to_owned(),
            device_interval: 1,
            device_expires_in: 600,
            device_script: vec![DevicePoll::Success],
        }
    }
}

struct IdpState {
    config: MockIdpConfig,
    polls: AtomicUsize,
}

/// A mock IdP serving on an ephemeral port; killed on drop.
pub struct MockIdp {
    pub base_url: String,
    state: Arc<IdpState>,
    task: tokio::task::JoinHandle<()>,
}

impl MockIdp {
    pub fn device_auth_uri(&self) -> String {
        format!("{}/auth/device", self.base_url)
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.base_url)
    }

    /// Number of device-grant polls received so far.
    pub fn poll_count(&self) -> usize {
        self.state.polls.load(Ordering::SeqCst)
    }
}

impl Drop for MockIdp {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a mock IdP with the given behavior.
pub async fn spawn_mock_idp(config: MockIdpConfig) -> anyhow::Result<MockIdp> {
    ensure_crypto();
    let state = Arc::new(IdpState { config, polls: AtomicUsize::new(0) });
    let router = Router::new()
        .route("/token", post(token))
        .route("/auth/device", post(device_auth))
        .with_state(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(MockIdp { base_url: format!("http://{addr}"), state, task })
}

fn oauth_error(code: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": code })))
}

fn tokens() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "access_token": "mock-access-token",
            "refresh_token": "mock-refresh-token",
            "expires_in": 600,
        })),
    )
}

/// `POST /token` — authorization-code exchange and device-grant polling.
async fn token(
    State(s): State<Arc<IdpState>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            if form.get("code") != Some(&s.config.expected_code) {
                return oauth_error("invalid_grant");
            }
            if form.get("client_id").map(String::as_str) != Some("mock-client-id")
                || form.get("client_secret").map(String::as_str) != Some("mock-client-secret")
            {
                return oauth_error("invalid_client");
            }
            if !form.contains_key("redirect_uri") {
                return oauth_error("invalid_request");
            }
            tokens()
        }
        Some("urn:ietf:params:oauth:grant-type:device_code") => {
            if form.get("device_code").map(String::as_str) != Some("mock-device-code")
                || form.get("client_id").map(String::as_str) != Some("mock-client-id")
            {
                return oauth_error("invalid_request");
            }
            let n = s.polls.fetch_add(1, Ordering::SeqCst);
            let step = s
                .config
                .device_script
                .get(n)
                .or(s.config.device_script.last())
                .copied()
                .unwrap_or(DevicePoll::Success);
            match step {
                DevicePoll::Pending => oauth_error("authorization_pending"),
                DevicePoll::SlowDown => oauth_error("slow_down"),
                DevicePoll::Denied => oauth_error("access_denied"),
                DevicePoll::Expired => oauth_error("expired_token"),
                DevicePoll::Unknown => oauth_error("server_error"),
                DevicePoll::Success => tokens(),
            }
        }
        _ => oauth_error("unsupported_grant_type"),
    }
}

/// `POST /auth/device` — RFC 8628 device authorization.
async fn device_auth(
    State(s): State<Arc<IdpState>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    if form.get("client_id").map(String::as_str) != Some("mock-client-id") {
        return oauth_error("invalid_client");
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "device_code": "mock-device-code",
            "user_code": "mock-user-code",
            "verification_uri": "https://idp.example.com/mock-auth",
            "expires_in": s.config.device_expires_in,
            "interval": s.config.device_interval,
        })),
    )
}
