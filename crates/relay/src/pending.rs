// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-login table: correlates an in-flight login with its eventual outcome.
//!
//! The begin-login handler registers a login id and waits; the redirect
//! handler delivers the outcome under the same id. Each entry is a one-shot
//! channel, so an outcome is handed over exactly once and the handoff never
//! holds the table lock.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{oneshot, RwLock};

/// Tokens produced by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// `expires_in` as reported by the token endpoint, in seconds.
    pub expires_in: u64,
}

/// Terminal state of one login attempt. Produced exactly once per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(LoginTokens),
    Failure(String),
}

/// Receiving side of one registered login, consumed by [`PendingLogins::await_outcome`].
pub struct WaitHandle {
    id: String,
    rx: oneshot::Receiver<LoginOutcome>,
}

/// Table of in-flight logins, keyed by login id (the OAuth `state` parameter).
///
/// Owned by the relay state and shared by handle. No globals, so multiple
/// relay instances can coexist in one process.
#[derive(Default)]
pub struct PendingLogins {
    entries: RwLock<HashMap<String, oneshot::Sender<LoginOutcome>>>,
}

impl PendingLogins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new login id and return the handle to wait on.
    ///
    /// Rejects an id that is already in flight. Ids carry 64 bits of entropy,
    /// so a collision is effectively unreachable; the caller regenerates and
    /// retries rather than overwriting a live waiter.
    pub async fn register(&self, id: &str) -> anyhow::Result<WaitHandle> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(id) {
            anyhow::bail!("login id already registered: {id}");
        }
        let (tx, rx) = oneshot::channel();
        entries.insert(id.to_owned(), tx);
        Ok(WaitHandle { id: id.to_owned(), rx })
    }

    /// Wait for the outcome of a registered login.
    ///
    /// Resolves with the delivered outcome, or a synthetic `Failure` once
    /// `timeout` elapses. The entry is removed on either path. Timeout and
    /// delivery race first-one-wins: whichever side removes the entry from
    /// the table decides, so a delivered outcome is never reported as a
    /// timeout and a timed-out login can no longer receive one.
    pub async fn await_outcome(&self, mut handle: WaitHandle, timeout: Duration) -> LoginOutcome {
        match tokio::time::timeout(timeout, &mut handle.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                // Sender dropped without delivering; reap the entry if it is
                // somehow still present.
                self.entries.write().await.remove(&handle.id);
                LoginOutcome::Failure("login result channel closed".to_owned())
            }
            Err(_) => {
                let timed_out = self.entries.write().await.remove(&handle.id).is_some();
                if timed_out {
                    tracing::warn!(login_id = %handle.id, "login session timed out");
                    LoginOutcome::Failure("user's login session timed out".to_owned())
                } else {
                    // Delivery won the race just as the timer fired; the send
                    // is already in flight, so wait for it rather than
                    // reporting a timeout for an outcome that was delivered.
                    match handle.rx.await {
                        Ok(outcome) => outcome,
                        Err(_) => LoginOutcome::Failure("login result channel closed".to_owned()),
                    }
                }
            }
        }
    }

    /// Deliver the outcome for a login id.
    ///
    /// Returns `false` when the id is unknown, already resolved, or expired;
    /// callers treat that as a session error, never a crash. No other entry
    /// is affected.
    pub async fn deliver(&self, id: &str, outcome: LoginOutcome) -> bool {
        let sender = self.entries.write().await.remove(id);
        match sender {
            // Send happens after the lock is released; a waiter that already
            // gave up shows up as a send error here.
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Number of in-flight logins.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
