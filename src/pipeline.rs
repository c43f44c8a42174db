// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission intake pipeline.
//!
//! sanitize → validate → honeypot → rate limit → store → notify.
//!
//! The submission is written before the operator is notified, so a mail
//! outage cannot lose it; a failed send leaves the record flagged
//! `notified: false` for the dashboard. Only when both the write and the
//! send fail is the request reported as a server error.

use crate::config::Config;
use crate::error::{IntakeError, Result};
use crate::form::FormKind;
use crate::honeypot::{HoneypotGate, HoneypotResult};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::{Metrics, Outcome};
use crate::models::Submission;
use crate::notify::NotificationDispatcher;
use crate::sanitize::sanitize_fields;
use crate::store::SubmissionStore;
use crate::validator::{SchemaValidator, ValidationResult};
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A submission that made it through every gate.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub record: Submission,
    /// Whether the record reached the store
    pub stored: bool,
}

/// One pipeline instance serves all three forms.
pub struct IntakePipeline {
    validator: SchemaValidator,
    honeypot: HoneypotGate,
    limiter: RateLimiter,
    dispatcher: NotificationDispatcher,
    contact: SubmissionStore,
    booking: SubmissionStore,
    registration: SubmissionStore,
    metrics: Metrics,
}

impl IntakePipeline {
    pub fn new(config: &Config, dispatcher: NotificationDispatcher, metrics: Metrics) -> Self {
        let store = |kind| SubmissionStore::new(&config.data_dir, kind, config.store.max_records);
        Self {
            validator: SchemaValidator::new(),
            honeypot: HoneypotGate::default(),
            limiter: RateLimiter::new(config.rate_limit.clone()),
            dispatcher,
            contact: store(FormKind::Contact),
            booking: store(FormKind::Booking),
            registration: store(FormKind::Registration),
            metrics,
        }
    }

    pub fn store(&self, kind: FormKind) -> &SubmissionStore {
        match kind {
            FormKind::Contact => &self.contact,
            FormKind::Booking => &self.booking,
            FormKind::Registration => &self.registration,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// User-facing copy for a request that failed on the server side.
    pub fn failure_message(&self, kind: FormKind) -> String {
        kind.failure_message(self.dispatcher.operator())
    }

    /// Run a submission through the pipeline at the current time.
    pub async fn submit(
        &self,
        kind: FormKind,
        raw: &HashMap<String, String>,
        origin: IpAddr,
    ) -> Result<Accepted> {
        self.submit_at(kind, raw, origin, Utc::now()).await
    }

    pub async fn submit_at(
        &self,
        kind: FormKind,
        raw: &HashMap<String, String>,
        origin: IpAddr,
        now: DateTime<Utc>,
    ) -> Result<Accepted> {
        let fields = sanitize_fields(kind, raw);

        let validation = self.validator.validate(kind, &fields);
        if let ValidationResult::Invalid(_) = validation {
            let messages = validation.messages();
            info!(form = %kind, %origin, errors = ?messages, "Submission rejected by validation");
            self.metrics.record(kind, Outcome::Invalid);
            return Err(IntakeError::Validation(messages));
        }

        if self.honeypot.check(raw) == HoneypotResult::Tripped {
            info!(form = %kind, %origin, "Submission rejected as spam");
            self.metrics.record(kind, Outcome::Spam);
            return Err(IntakeError::SpamRejected);
        }

        if let RateLimitResult::Limited { retry_after } = self.limiter.check_at(origin, kind, now).await {
            info!(form = %kind, %origin, retry_after_secs = retry_after.as_secs(), "Submission rate limited");
            self.metrics.record(kind, Outcome::RateLimited);
            return Err(IntakeError::RateLimited { retry_after });
        }

        let mut record = Submission {
            id: Uuid::now_v7().to_string(),
            fields,
            extra: Default::default(),
            submitted_at: now.trunc_subsecs(0),
            origin_address: origin.to_string(),
            status: kind.initial_status(),
            read: false,
            notified: false,
        };

        let store = self.store(kind);
        let stored = match store.insert(record.clone()).await {
            Ok(len) => {
                info!(form = %kind, id = %record.id, stored = len, "Submission stored");
                true
            }
            Err(e) => {
                error!(form = %kind, id = %record.id, error = %e, "Submission could not be stored");
                self.metrics.store_failed(kind);
                false
            }
        };

        match self.dispatcher.dispatch(kind, &record).await {
            Ok(()) => {
                record.notified = true;
                if stored {
                    if let Err(e) = store.mark_notified(&record.id).await {
                        warn!(form = %kind, id = %record.id, error = %e, "Could not flag submission as notified");
                    }
                }
            }
            Err(e) => {
                self.metrics.notification_failed(kind);
                if !stored {
                    self.metrics.record(kind, Outcome::Failed);
                    return Err(IntakeError::NotificationFailure(e));
                }
                warn!(form = %kind, id = %record.id, "Submission kept without operator notification");
            }
        }

        self.metrics.record(kind, Outcome::Accepted);
        info!(form = %kind, id = %record.id, %origin, notified = record.notified, "Submission accepted");
        Ok(Accepted { record, stored })
    }
}
