// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use crate::config::OidcConfig;
use crate::pending::PendingLogins;

/// Shared state for one relay instance.
pub struct RelayState {
    /// Read-only OIDC configuration.
    pub config: OidcConfig,
    /// In-flight logins, the only shared mutable state.
    pub pending: PendingLogins,
    /// Client for server-to-server calls to the IdP.
    pub http: reqwest::Client,
}

impl RelayState {
    pub fn new(config: OidcConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            pending: PendingLogins::new(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        })
    }
}
