// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Administrator sessions for announcement management.
//!
//! Mutating announcement operations take an [`AdminSession`], which can
//! only be obtained from [`AdminAuth::session`] with a live token. Tokens
//! are random, held only as BLAKE3 digests, and expire after the
//! configured TTL.

use crate::config::AdminConfig;
use argon2::Argon2;
use chrono::{DateTime, Utc};
use password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Proof that the caller holds a live admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    label: String,
    expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            label: "test".to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }
}

/// Short non-secret label for logs.
impl fmt::Display for AdminSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Token handed to the client after a successful login.
#[derive(Debug, Clone)]
pub struct AdminLogin {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

type TokenDigest = [u8; 32];

fn digest(token: &str) -> TokenDigest {
    *blake3::hash(token.as_bytes()).as_bytes()
}

fn label(digest: &TokenDigest) -> String {
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

/// Hash a password into an Argon2id PHC string for `admin.password_hash`.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Password check and session registry.
pub struct AdminAuth {
    password_hash: Option<Arc<str>>,
    ttl: Duration,
    sessions: Mutex<HashMap<TokenDigest, DateTime<Utc>>>,
}

impl AdminAuth {
    pub fn new(config: &AdminConfig) -> Self {
        let password_hash = config.password_hash.as_deref().and_then(|hash| {
            if PasswordHash::new(hash).is_ok() {
                Some(Arc::from(hash))
            } else {
                warn!("admin.password_hash is not a valid PHC string, admin login disabled");
                None
            }
        });

        Self {
            password_hash,
            ttl: config.session_ttl(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Verify `password` and open a session.
    pub async fn login(&self, password: &str) -> Option<AdminLogin> {
        let hash = self.password_hash.clone()?;
        let password = password.to_owned();

        // Argon2 verification blocks; run it off the async workers.
        let verified = tokio::task::spawn_blocking(move || {
            PasswordHash::new(&hash)
                .map(|parsed| {
                    Argon2::default()
                        .verify_password(password.as_bytes(), &parsed)
                        .is_ok()
                })
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false);

        if !verified {
            info!("Admin login rejected");
            return None;
        }

        let token = Uuid::new_v4().simple().to_string();
        let key = digest(&token);
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::hours(8));

        self.sessions.lock().await.insert(key, expires_at);
        info!(session = %label(&key), %expires_at, "Admin session opened");

        Some(AdminLogin { token, expires_at })
    }

    /// Resolve a bearer token into a session capability.
    pub async fn session(&self, token: &str) -> Option<AdminSession> {
        self.session_at(token, Utc::now()).await
    }

    pub async fn session_at(&self, token: &str, now: DateTime<Utc>) -> Option<AdminSession> {
        let key = digest(token);
        let mut sessions = self.sessions.lock().await;

        match sessions.get(&key).copied() {
            Some(expires_at) if now < expires_at => Some(AdminSession {
                label: label(&key),
                expires_at,
            }),
            Some(_) => {
                sessions.remove(&key);
                debug!(session = %label(&key), "Admin session expired");
                None
            }
            None => None,
        }
    }

    /// Revoke a token. Returns whether it was live.
    pub async fn logout(&self, token: &str) -> bool {
        let key = digest(token);
        let removed = self.sessions.lock().await.remove(&key).is_some();
        if removed {
            info!(session = %label(&key), "Admin session closed");
        }
        removed
    }

    /// Drop expired sessions (should be called periodically).
    pub async fn cleanup(&self) {
        let now = Utc::now();
        self.sessions.lock().await.retain(|_, expires_at| now < *expires_at);
    }
}
