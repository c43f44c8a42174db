// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the intake service.

use std::time::Duration;
use thiserror::Error;

/// Everything that can stop a request short of acceptance.
///
/// Each variant maps to one fixed, user-facing envelope in
/// [`crate::response`]; the `Display` text is for logs only.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("submission rejected by honeypot")]
    SpamRejected,

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("notification failed and submission was not stored: {0}")]
    NotificationFailure(#[source] NotifyError),

    #[error("admin session required")]
    Unauthorized,

    #[error("announcement {0} not found")]
    NotFound(u64),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Failures reading or writing a JSON record file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures delivering an operator notification.
#[derive(Debug, Error, Clone)]
pub enum NotifyError {
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("relay rejected notification with status {0}")]
    Rejected(u16),

    #[error("mailer misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, IntakeError>;
