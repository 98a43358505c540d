// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the ssorelay server binary.
#[derive(Debug, Clone, clap::Parser)]
pub struct RelayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "SSO_RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9700, env = "SSO_RELAY_PORT")]
    pub port: u16,

    /// Base URI of the IdP's OIDC endpoints; tokens are requested at `{base}/token`.
    #[arg(long, env = "SSO_RELAY_OIDC_BASE_URI")]
    pub oidc_base_uri: String,

    /// IdP authorization URI the user logs in at (the `state` parameter is appended).
    #[arg(long, env = "SSO_RELAY_AUTHORIZATION_URI")]
    pub authorization_uri: String,

    /// Redirect URI registered with the IdP, pointing at this relay's `/redirect`.
    #[arg(long, env = "SSO_RELAY_REDIRECT_URI")]
    pub redirect_uri: String,

    /// OAuth client id.
    #[arg(long, env = "SSO_RELAY_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret.
    #[arg(long, env = "SSO_RELAY_CLIENT_SECRET")]
    pub client_secret: String,

    /// If set, browsers are redirected here after a successful redirect handling.
    #[arg(long, env = "SSO_RELAY_SUCCESS_REDIRECT_URI")]
    pub success_redirect_uri: Option<String>,

    /// If set, browsers are redirected here after a failed redirect handling.
    #[arg(long, env = "SSO_RELAY_FAILED_REDIRECT_URI")]
    pub failed_redirect_uri: Option<String>,

    /// Time for the user to complete the IdP login, in seconds.
    #[arg(long, default_value_t = 300, env = "SSO_RELAY_LOGIN_TIMEOUT_SECS")]
    pub login_timeout_secs: u64,
}

impl RelayConfig {
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    /// Extract the OIDC part consumed by the relay library.
    pub fn oidc(&self) -> OidcConfig {
        OidcConfig {
            base_uri: self.oidc_base_uri.clone(),
            authorization_uri: self.authorization_uri.clone(),
            redirect_uri: self.redirect_uri.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            success_redirect_uri: self.success_redirect_uri.clone(),
            failed_redirect_uri: self.failed_redirect_uri.clone(),
            login_timeout: self.login_timeout(),
        }
    }
}

/// OIDC configuration for one relay instance.
///
/// Supplied at construction and read-only afterwards; handlers never
/// mutate it, so it needs no synchronization.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Base URI of the IdP's OIDC endpoints.
    pub base_uri: String,
    /// Authorization URI the user logs in at.
    pub authorization_uri: String,
    /// Redirect URI registered with the IdP.
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: String,
    /// Browser redirect target after successful redirect handling, if any.
    pub success_redirect_uri: Option<String>,
    /// Browser redirect target after failed redirect handling, if any.
    pub failed_redirect_uri: Option<String>,
    /// Time for the user to complete the IdP login. Default 5 minutes.
    pub login_timeout: Duration,
}

impl OidcConfig {
    pub fn token_uri(&self) -> String {
        format!("{}/token", self.base_uri.trim_end_matches('/'))
    }
}
