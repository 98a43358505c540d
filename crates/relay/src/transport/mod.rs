// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the login relay.

pub mod http;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::RelayState;

/// Build the axum `Router` with the relay routes.
///
/// `/redirect` must be reachable by the user's browser at the redirect URI
/// registered with the IdP.
pub fn build_router(state: Arc<RelayState>) -> Router {
    Router::new()
        // Console clients begin a login here and hold the stream open.
        .route("/login", get(http::begin_login))
        // The IdP sends the user's browser back here.
        .route("/redirect", get(http::oidc_redirect))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
