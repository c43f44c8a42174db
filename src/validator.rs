// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Schema validation for intake forms and announcement drafts.
//!
//! Validation never short-circuits: every violated rule is collected, in
//! field declaration order, so the submitter sees all problems at once.
//! Field length and encoding are not limited.

use crate::form::{FieldKind, FormKind};
use crate::models::{AnnouncementDraft, Category, Priority};
use crate::sanitize::{sanitize_value, Fields};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// local-part `@` domain-with-dot, no whitespace anywhere.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

/// Validation error types.
///
/// `Display` is the exact message returned to the submitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{message}")]
    Missing {
        field: &'static str,
        message: &'static str,
    },

    #[error("Invalid email format")]
    InvalidEmail { field: &'static str },

    #[error("Invalid date, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown priority: {0}")]
    UnknownPriority(String),
}

/// Result of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Submission is valid
    Valid,
    /// Every rule the submission broke, in field order
    Invalid(Vec<ValidationError>),
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }

    /// Submitter-facing messages, in order.
    pub fn messages(&self) -> Vec<String> {
        self.errors().iter().map(ToString::to_string).collect()
    }
}

/// Checks sanitized submissions against their form's declared fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Permissive e-mail shape check.
    pub fn is_email(&self, value: &str) -> bool {
        email_regex().is_match(value)
    }

    /// Validate the required fields of `kind`.
    ///
    /// An empty required field yields its "is required" message; a non-empty
    /// e-mail field that fails the shape check yields "Invalid email format".
    /// At most one message per field.
    pub fn validate(&self, kind: FormKind, fields: &Fields) -> ValidationResult {
        let mut errors = Vec::new();

        for spec in kind.required_fields() {
            let value = fields.get(spec.name).map(|v| v.trim()).unwrap_or("");

            if value.is_empty() {
                if let Some(message) = spec.required {
                    errors.push(ValidationError::Missing {
                        field: spec.name,
                        message,
                    });
                }
                continue;
            }

            if spec.kind == FieldKind::Email && !self.is_email(value) {
                errors.push(ValidationError::InvalidEmail { field: spec.name });
            }
        }

        if !errors.is_empty() {
            debug!(form = %kind, count = errors.len(), "Submission failed validation");
        }
        ValidationResult::from_errors(errors)
    }

    /// Parse an administrator's announcement form into a draft.
    ///
    /// Title and message are escaped like public submissions since the
    /// public site renders them as markup.
    pub fn parse_announcement(
        &self,
        raw: &HashMap<String, String>,
    ) -> Result<AnnouncementDraft, ValidationResult> {
        let get = |name: &str| raw.get(name).map(|v| v.trim()).unwrap_or("");
        let mut errors = Vec::new();

        let title = get("title");
        if title.is_empty() {
            errors.push(ValidationError::Missing {
                field: "title",
                message: "Title is required",
            });
        }

        let message = get("message");
        if message.is_empty() {
            errors.push(ValidationError::Missing {
                field: "message",
                message: "Message is required",
            });
        }

        let date_raw = get("date");
        let date = if date_raw.is_empty() {
            errors.push(ValidationError::Missing {
                field: "date",
                message: "Date is required",
            });
            None
        } else {
            match NaiveDate::parse_from_str(date_raw, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push(ValidationError::InvalidDate {
                        value: date_raw.to_string(),
                    });
                    None
                }
            }
        };

        let category = match get("category") {
            "" => Some(Category::General),
            other => match other.parse::<Category>() {
                Ok(c) => Some(c),
                Err(_) => {
                    errors.push(ValidationError::UnknownCategory(sanitize_value(other)));
                    None
                }
            },
        };

        let priority = match get("priority") {
            "" => Some(Priority::Normal),
            other => match other.parse::<Priority>() {
                Ok(p) => Some(p),
                Err(_) => {
                    errors.push(ValidationError::UnknownPriority(sanitize_value(other)));
                    None
                }
            },
        };

        match (date, category, priority) {
            (Some(date), Some(category), Some(priority)) if errors.is_empty() => {
                Ok(AnnouncementDraft {
                    title: sanitize_value(title),
                    date,
                    category,
                    message: sanitize_value(message),
                    priority,
                })
            }
            _ => Err(ValidationResult::from_errors(errors)),
        }
    }
}
