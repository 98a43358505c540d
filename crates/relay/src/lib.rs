// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ssorelay: OIDC login relay for console applications.
//!
//! Bridges a browser-based authorization-code login back to a waiting
//! console process. The console calls `GET /login` and holds the streamed
//! response open; the user logs in at the IdP; the IdP redirects the
//! browser to `GET /redirect`, where the code is exchanged for tokens and
//! the result is pushed down the still-open stream.

pub mod config;
pub mod error;
pub mod oauth;
pub mod pending;
pub mod sse;
pub mod state;
pub mod transport;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::state::RelayState;
use crate::transport::build_router;

/// Run the relay server until ctrl-c.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    let state = RelayState::new(config.oidc());
    let router = build_router(state);

    tracing::info!("ssorelay listening on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
