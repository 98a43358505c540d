// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ssoclient: console-side SSO login flows.
//!
//! Two ways for a console application to obtain OIDC tokens:
//!
//! - [`relay::login_with_relay`] — authorization-code flow brokered through
//!   an ssorelay instance; the relay streams the outcome back while the
//!   user logs in through a browser.
//! - [`device::login_with_device_grant`] — OAuth 2.0 Device Authorization
//!   Grant (RFC 8628), polling the IdP directly with no relay in between.

pub mod device;
pub mod relay;
pub mod sse;

pub use device::{login_with_device_grant, DeviceGrantConfig};
pub use relay::login_with_relay;

/// Tokens returned from every login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    /// `expires_in` from the token endpoint, in seconds.
    pub expiration: u64,
}
