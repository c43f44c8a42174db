// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-origin, per-form submission throttle.
//!
//! One record per `(form, origin)` pair, keyed by a BLAKE3 digest of both,
//! holding the time of the last attempt that got past the check. A new
//! attempt is allowed once at least the window has elapsed; the boundary
//! itself is allowed. Allowing an attempt records it immediately, even if
//! later stages fail.

use crate::config::RateLimitConfig;
use crate::form::FormKind;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Submission may proceed; its timestamp has been recorded
    Allowed,
    /// Origin submitted this form too recently
    Limited {
        /// Time until the window for this origin closes
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed)
    }
}

/// Opaque limiter key: BLAKE3 over form slug and origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateLimitKey([u8; 32]);

impl RateLimitKey {
    pub fn new(origin: IpAddr, kind: FormKind) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.slug().as_bytes());
        hasher.update(&[0]);
        hasher.update(origin.to_string().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

/// Last accepted-for-processing attempt for one key.
#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    last_attempt: DateTime<Utc>,
}

/// Thread-safe rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    records: Arc<Mutex<HashMap<RateLimitKey, RateLimitRecord>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn window(&self) -> Duration {
        self.config.window_duration()
    }

    /// Check and record an attempt at the current time.
    pub async fn check(&self, origin: IpAddr, kind: FormKind) -> RateLimitResult {
        self.check_at(origin, kind, Utc::now()).await
    }

    /// Check and record an attempt at `now`.
    ///
    /// The lookup and the write happen under one lock, so concurrent
    /// attempts from the same origin cannot both pass.
    pub async fn check_at(&self, origin: IpAddr, kind: FormKind, now: DateTime<Utc>) -> RateLimitResult {
        let key = RateLimitKey::new(origin, kind);
        let window = self.window();
        let mut records = self.records.lock().await;

        if let Some(record) = records.get(&key) {
            let elapsed = now.signed_duration_since(record.last_attempt);
            let elapsed = elapsed.to_std().unwrap_or(Duration::ZERO);
            if elapsed < window {
                let retry_after = window - elapsed;
                debug!(form = %kind, ?retry_after, "Origin rate limited");
                return RateLimitResult::Limited { retry_after };
            }
        }

        records.insert(key, RateLimitRecord { last_attempt: now });
        RateLimitResult::Allowed
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop records whose window has passed (should be called periodically).
    pub async fn cleanup(&self) {
        self.cleanup_at(Utc::now()).await;
    }

    pub async fn cleanup_at(&self, now: DateTime<Utc>) {
        let window = self.window();
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| {
            now.signed_duration_since(record.last_attempt)
                .to_std()
                .map(|elapsed| elapsed < window)
                .unwrap_or(true)
        });
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, remaining = records.len(), "Expired rate limit records swept");
        }
    }
}
