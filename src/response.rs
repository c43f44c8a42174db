// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Status-coded JSON envelopes.
//!
//! Callers only ever see the fixed messages below; error details stay in
//! the logs.

use crate::error::IntakeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed. Please use POST.";
pub const MSG_VALIDATION: &str = "Validation failed";
pub const MSG_SPAM: &str = "Spam detected";
pub const MSG_RATE_LIMITED: &str = "Please wait a few minutes before submitting again";
pub const MSG_UNAUTHORIZED: &str = "Authentication required";
pub const MSG_NOT_FOUND: &str = "Announcement not found";
pub const MSG_STORAGE: &str = "Sorry, the change could not be saved. Please try again.";
pub const MSG_INTERNAL: &str = "Sorry, something went wrong. Please try again later.";

/// `{ "success": bool, "message": string, "errors"?: [string] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// An envelope paired with its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeResponse {
    pub status: StatusCode,
    pub body: Envelope,
}

impl IntakeResponse {
    fn new(status: StatusCode, success: bool, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Envelope {
                success,
                message: message.into(),
                errors: None,
            },
        }
    }
}

impl IntoResponse for IntakeResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Maps pipeline outcomes onto envelopes.
pub struct ResponseBuilder;

impl ResponseBuilder {
    pub fn accepted(message: impl Into<String>) -> IntakeResponse {
        IntakeResponse::new(StatusCode::OK, true, message)
    }

    /// `failure_message` is the form-specific copy used when a submission
    /// could be neither stored nor delivered.
    pub fn rejected(err: &IntakeError, failure_message: &str) -> IntakeResponse {
        match err {
            IntakeError::MethodNotAllowed => {
                IntakeResponse::new(StatusCode::METHOD_NOT_ALLOWED, false, MSG_METHOD_NOT_ALLOWED)
            }
            IntakeError::Validation(errors) => IntakeResponse {
                status: StatusCode::BAD_REQUEST,
                body: Envelope {
                    success: false,
                    message: MSG_VALIDATION.to_string(),
                    errors: Some(errors.clone()),
                },
            },
            IntakeError::SpamRejected => IntakeResponse::new(StatusCode::BAD_REQUEST, false, MSG_SPAM),
            IntakeError::RateLimited { .. } => {
                IntakeResponse::new(StatusCode::TOO_MANY_REQUESTS, false, MSG_RATE_LIMITED)
            }
            IntakeError::NotificationFailure(_) => {
                IntakeResponse::new(StatusCode::INTERNAL_SERVER_ERROR, false, failure_message)
            }
            IntakeError::Unauthorized => {
                IntakeResponse::new(StatusCode::UNAUTHORIZED, false, MSG_UNAUTHORIZED)
            }
            IntakeError::NotFound(_) => IntakeResponse::new(StatusCode::NOT_FOUND, false, MSG_NOT_FOUND),
            IntakeError::Storage(_) => {
                IntakeResponse::new(StatusCode::INTERNAL_SERVER_ERROR, false, MSG_STORAGE)
            }
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        ResponseBuilder::rejected(&self, MSG_INTERNAL).into_response()
    }
}
