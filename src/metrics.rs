// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for the intake pipeline.

use crate::form::FormKind;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Final classification of one intake request, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Invalid,
    Spam,
    RateLimited,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Invalid => "invalid",
            Self::Spam => "spam",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
        }
    }
}

/// Service metrics, registered on a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    notification_failures: IntCounterVec,
    store_failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("intake_submissions_total", "Intake requests by form and outcome"),
            &["form", "outcome"],
        )?;
        let notification_failures = IntCounterVec::new(
            Opts::new(
                "intake_notification_failures_total",
                "Operator notifications that could not be delivered",
            ),
            &["form"],
        )?;
        let store_failures = IntCounterVec::new(
            Opts::new(
                "intake_store_failures_total",
                "Accepted submissions that could not be written to disk",
            ),
            &["form"],
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(notification_failures.clone()))?;
        registry.register(Box::new(store_failures.clone()))?;

        Ok(Self {
            registry,
            submissions,
            notification_failures,
            store_failures,
        })
    }

    pub fn record(&self, kind: FormKind, outcome: Outcome) {
        self.submissions
            .with_label_values(&[kind.slug(), outcome.as_str()])
            .inc();
    }

    pub fn notification_failed(&self, kind: FormKind) {
        self.notification_failures
            .with_label_values(&[kind.slug()])
            .inc();
    }

    pub fn store_failed(&self, kind: FormKind) {
        self.store_failures.with_label_values(&[kind.slug()]).inc();
    }

    pub fn submissions(&self, kind: FormKind, outcome: Outcome) -> u64 {
        self.submissions
            .with_label_values(&[kind.slug(), outcome.as_str()])
            .get()
    }

    /// Prometheus text exposition.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
