// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};
use tracing::error;

use ssoclient::{login_with_device_grant, login_with_relay, DeviceGrantConfig};

/// Console SSO login utility.
#[derive(Debug, Parser)]
#[command(name = "ssologin")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in through an ssorelay instance (authorization-code flow).
    Relay {
        /// Begin-login URI of the relay, e.g. http://localhost:9700/login.
        #[arg(long, env = "SSO_LOGIN_URI")]
        login_uri: String,
    },
    /// Log in with the OAuth 2.0 Device Authorization Grant, no relay needed.
    Device {
        /// Device-authorization endpoint of the IdP.
        #[arg(long, env = "SSO_DEVICE_AUTH_URI")]
        device_auth_uri: String,

        /// Token endpoint of the IdP.
        #[arg(long, env = "SSO_TOKEN_URI")]
        token_uri: String,

        /// OAuth client id.
        #[arg(long, env = "SSO_CLIENT_ID")]
        client_id: String,

        /// Optional scope for the device-authorization request.
        #[arg(long, env = "SSO_SCOPE")]
        scope: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let result = match cli.command {
        Command::Relay { login_uri } => {
            login_with_relay(&login_uri, |uri| {
                println!("Login at: {uri}");
            })
            .await
        }
        Command::Device { device_auth_uri, token_uri, client_id, scope } => {
            let config = DeviceGrantConfig { device_auth_uri, token_uri, client_id, scope };
            login_with_device_grant(&config, |uri, code| {
                println!("Login URL: {uri}");
                println!("User code: {code}");
            })
            .await
        }
    };

    match result {
        Ok(login) => {
            println!();
            println!("Access token:");
            println!("{}", login.access_token);
        }
        Err(e) => {
            error!("could not login: {e:#}");
            std::process::exit(1);
        }
    }
}
