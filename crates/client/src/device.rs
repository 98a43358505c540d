// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth 2.0 Device Authorization Grant (RFC 8628) login.
//!
//! Talks to the IdP directly: requests a device code, hands the
//! verification URI to the caller, then polls the token endpoint until the
//! user completes the login, the IdP denies it, or the code expires.

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::LoginResult;

const GRANT_TYPE_DEVICE_CODE: &str = "urn:ietf:params:oauth:grant-type:device_code";

const ERROR_AUTHORIZATION_PENDING: &str = "authorization_pending";
const ERROR_SLOW_DOWN: &str = "slow_down";
const ERROR_ACCESS_DENIED: &str = "access_denied";
const ERROR_EXPIRED_TOKEN: &str = "expired_token";

/// Endpoints and client identity for the device grant.
#[derive(Debug, Clone)]
pub struct DeviceGrantConfig {
    /// Device-authorization endpoint of the IdP.
    pub device_auth_uri: String,
    /// Token endpoint of the IdP.
    pub token_uri: String,
    pub client_id: String,
    /// Optional scope sent with the device-authorization request.
    pub scope: Option<String>,
}

/// RFC 8628 device authorization response.
#[derive(Debug, Clone, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    expires_in: u64,
    /// Poll interval is optional; 5 s when the IdP leaves it out.
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TokenSuccessResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Log in with the Device Authorization Grant.
///
/// `on_verification` receives `(verification_uri, user_code)` so the caller
/// can direct the user to authenticate; polling starts right after it
/// returns.
pub async fn login_with_device_grant(
    config: &DeviceGrantConfig,
    on_verification: impl FnOnce(&str, &str),
) -> anyhow::Result<LoginResult> {
    let client = reqwest::Client::new();

    let device = request_device_authorization(&client, config).await?;
    tracing::debug!(
        interval = device.interval,
        expires_in = device.expires_in,
        "device authorization received"
    );
    on_verification(&device.verification_uri, &device.user_code);

    let token =
        poll_token_endpoint(&client, config, &device.device_code, device.interval, device.expires_in)
            .await?;
    Ok(LoginResult {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expiration: token.expires_in,
    })
}

/// POST to the device-authorization endpoint.
async fn request_device_authorization(
    client: &reqwest::Client,
    config: &DeviceGrantConfig,
) -> anyhow::Result<DeviceCodeResponse> {
    let mut form = vec![("client_id", config.client_id.as_str())];
    if let Some(scope) = &config.scope {
        form.push(("scope", scope.as_str()));
    }

    let resp = client
        .post(&config.device_auth_uri)
        .form(&form)
        .send()
        .await
        .context("failed to execute device authorization request")?;
    if !resp.status().is_success() {
        anyhow::bail!(
            "device authorization request failed, response status was {}, expected 200",
            resp.status().as_u16()
        );
    }

    let device: DeviceCodeResponse = resp
        .json()
        .await
        .context("received device authorization response body in invalid format")?;
    Ok(device)
}

/// Poll the token endpoint until the user completes authorization, the IdP
/// reports a fatal error, or the device code expires.
async fn poll_token_endpoint(
    client: &reqwest::Client,
    config: &DeviceGrantConfig,
    device_code: &str,
    interval: u64,
    expires_in: u64,
) -> anyhow::Result<TokenSuccessResponse> {
    let mut poll_interval = Duration::from_secs(interval.max(1));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(expires_in);

    loop {
        tokio::time::sleep(poll_interval).await;

        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("authorization attempt expired");
        }

        let resp = client
            .post(&config.token_uri)
            .form(&[
                ("grant_type", GRANT_TYPE_DEVICE_CODE),
                ("device_code", device_code),
                ("client_id", config.client_id.as_str()),
            ])
            .send()
            .await
            .context("failed to poll token endpoint")?;
        let status = resp.status();

        if status == reqwest::StatusCode::OK {
            let token: TokenSuccessResponse = resp
                .json()
                .await
                .context("received invalid format of success poll response")?;
            return Ok(token);
        }
        if status != reqwest::StatusCode::BAD_REQUEST {
            // RFC 8628 defines only 200 and 400 responses for the poll.
            anyhow::bail!(
                "IdP responded with unexpected status code {} while polling token endpoint",
                status.as_u16()
            );
        }

        let err: TokenErrorResponse = resp
            .json()
            .await
            .context("received invalid format of error poll response")?;
        match err.error.as_str() {
            ERROR_AUTHORIZATION_PENDING => {}
            ERROR_SLOW_DOWN => {
                tracing::debug!("slow_down received, increasing poll interval");
                poll_interval += Duration::from_secs(5);
            }
            ERROR_ACCESS_DENIED => anyhow::bail!("cannot poll token endpoint, access was denied"),
            ERROR_EXPIRED_TOKEN => anyhow::bail!("authorization attempt expired"),
            other => {
                anyhow::bail!("received unknown error code '{other}' while polling for tokens")
            }
        }
    }
}
