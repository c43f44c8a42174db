// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Parish Intake
//!
//! This crate accepts the parish website's public form submissions and
//! turns them into stored records and operator notifications:
//!
//! - Field sanitization and per-form required-field validation
//! - Honeypot spam rejection
//! - One submission per origin per form every five minutes
//! - Bounded newest-first JSON logs per form
//! - Operator e-mail notification with a bounded send time
//! - A curated announcement list behind an admin login

pub mod admin;
pub mod config;
pub mod error;
pub mod form;
pub mod handlers;
pub mod honeypot;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod response;
pub mod sanitize;
pub mod store;
pub mod validator;

pub use config::Config;
pub use error::{IntakeError, NotifyError, StoreError};
pub use form::FormKind;
pub use limiter::{RateLimitResult, RateLimiter};
pub use pipeline::IntakePipeline;
pub use store::{AnnouncementStore, SubmissionStore};
pub use validator::{SchemaValidator, ValidationResult};
