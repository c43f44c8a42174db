// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Operator notifications.
//!
//! The dispatcher renders a plain-text summary of a stored submission and
//! hands it to a [`Mailer`]. Each send is bounded by the configured
//! timeout and never retried.

use crate::config::{NotifyConfig, Transport};
use crate::error::NotifyError;
use crate::form::{FieldKind, FormKind};
use crate::models::{record_time, Submission};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// A rendered message for the parish office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub to: String,
    pub from: String,
    /// Submitter's address, so the office can answer directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Delivery transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short transport name for logs.
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the service log. Used in development and when
/// no relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            reply_to = ?notification.reply_to,
            subject = %notification.subject,
            body = %notification.body,
            "Notification (log transport)"
        );
        Ok(())
    }
}

/// POSTs the notification as JSON to an HTTP mail relay; any non-2xx
/// status is a failure.
#[derive(Debug, Clone)]
pub struct RelayMailer {
    endpoint: Url,
    client: reqwest::Client,
}

impl RelayMailer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| NotifyError::Config(format!("invalid relay_url {endpoint:?}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(NotifyError::Config(format!(
                "relay_url must be http or https, got {}",
                endpoint.scheme()
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(notification)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(response.status().as_u16()))
        }
    }
}

/// Renders and sends operator notifications.
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    to: String,
    from: String,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(config: &NotifyConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            mailer,
            to: config.to.clone(),
            from: config.from.clone(),
            timeout: config.timeout(),
        }
    }

    /// Build the dispatcher with the transport named in `config`.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let mailer: Arc<dyn Mailer> = match config.transport {
            Transport::Log => Arc::new(LogMailer),
            Transport::Relay => {
                let url = config.relay_url.as_deref().ok_or_else(|| {
                    NotifyError::Config("transport is relay but relay_url is unset".to_string())
                })?;
                Arc::new(RelayMailer::new(url, config.timeout())?)
            }
        };
        Ok(Self::new(config, mailer))
    }

    /// Operator address, quoted in failure messages.
    pub fn operator(&self) -> &str {
        &self.to
    }

    pub fn transport(&self) -> &'static str {
        self.mailer.name()
    }

    /// Render the notification for `record`.
    pub fn compose(&self, kind: FormKind, record: &Submission) -> Notification {
        let reply_to = record
            .field(kind.reply_field())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        Notification {
            to: self.to.clone(),
            from: self.from.clone(),
            reply_to,
            subject: kind.email_subject().to_string(),
            body: render_body(kind, record),
        }
    }

    /// Send the notification for `record`, giving up after the timeout.
    pub async fn dispatch(&self, kind: FormKind, record: &Submission) -> Result<(), NotifyError> {
        let notification = self.compose(kind, record);
        debug!(form = %kind, id = %record.id, transport = self.mailer.name(), "Sending notification");

        match tokio::time::timeout(self.timeout, self.mailer.send(&notification)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(form = %kind, id = %record.id, error = %e, "Notification failed");
                Err(e)
            }
            Err(_) => {
                warn!(form = %kind, id = %record.id, timeout = ?self.timeout, "Notification timed out");
                Err(NotifyError::Timeout(self.timeout))
            }
        }
    }
}

fn render_body(kind: FormKind, record: &Submission) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "{}\n", kind.heading());

    for spec in kind.fields() {
        let value = record.field(spec.name).unwrap_or("");
        let shown = if value.is_empty() { spec.placeholder } else { value };
        if shown.is_empty() {
            continue;
        }

        match spec.kind {
            FieldKind::LongText => {
                let _ = writeln!(body, "\n{}:\n{}\n", spec.label, shown);
            }
            FieldKind::Date => {
                let _ = writeln!(body, "{}: {}", spec.label, display_date(shown));
            }
            FieldKind::Text | FieldKind::Email => {
                let _ = writeln!(body, "{}: {}", spec.label, shown);
            }
        }
    }

    let _ = writeln!(body, "\n---");
    let _ = writeln!(
        body,
        "Submitted: {}",
        record.submitted_at.format(record_time::FORMAT)
    );
    let _ = writeln!(body, "IP Address: {}", record.origin_address);
    body
}

/// `2025-03-17` reads as `March 17, 2025`; anything else is shown as typed.
fn display_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%B %d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubmissionStatus;
    use crate::sanitize::Fields;
    use std::sync::Mutex;

    struct SlowMailer;

    #[async_trait]
    impl Mailer for SlowMailer {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn send(&self, _: &Notification) -> Result<(), NotifyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Capture(Mutex<Vec<Notification>>);

    #[async_trait]
    impl Mailer for Capture {
        fn name(&self) -> &'static str {
            "capture"
        }

        async fn send(&self, n: &Notification) -> Result<(), NotifyError> {
            self.0.lock().unwrap().push(n.clone());
            Ok(())
        }
    }

    fn booking_record() -> Submission {
        let mut fields = Fields::new();
        for (k, v) in [
            ("requesterName", "Mary A."),
            ("email", "mary@example.com"),
            ("phone", "08012345678"),
            ("intentionFor", "Repose of John A."),
            ("intentionType", "thanksgiving"),
            ("preferredDate", "2025-03-17"),
            ("massTime", ""),
            ("additionalInfo", ""),
        ] {
            fields.insert(k.to_string(), v.to_string());
        }
        Submission {
            id: "id-1".to_string(),
            fields,
            extra: Default::default(),
            submitted_at: record_time::parse("2025-03-01 08:30:00").unwrap(),
            origin_address: "198.51.100.7".to_string(),
            status: SubmissionStatus::Pending,
            read: false,
            notified: false,
        }
    }

    #[test]
    fn test_compose_booking() {
        let dispatcher = NotificationDispatcher::new(&NotifyConfig::default(), Arc::new(LogMailer));
        let n = dispatcher.compose(FormKind::Booking, &booking_record());

        assert_eq!(n.reply_to.as_deref(), Some("mary@example.com"));
        assert_eq!(n.to, "Info@stpatrickigbogilaipaja.com");
        assert!(n.body.starts_with("New Mass Intention Booking"));
        assert!(n.body.contains("Requested By: Mary A.\n"));
        assert!(n.body.contains("Preferred Date: March 17, 2025\n"));
        assert!(n.body.contains("Preferred Mass Time: Not specified\n"));
        assert!(!n.body.contains("Additional Information"));
        assert!(n.body.contains("Submitted: 2025-03-01 08:30:00\n"));
        assert!(n.body.contains("IP Address: 198.51.100.7\n"));
    }

    #[tokio::test]
    async fn test_dispatch_delivers_to_mailer() {
        let capture = Arc::new(Capture::default());
        let dispatcher = NotificationDispatcher::new(&NotifyConfig::default(), capture.clone());

        dispatcher
            .dispatch(FormKind::Booking, &booking_record())
            .await
            .unwrap();
        assert_eq!(capture.0.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transport_times_out() {
        let config = NotifyConfig {
            timeout_secs: 2,
            ..Default::default()
        };
        let dispatcher = NotificationDispatcher::new(&config, Arc::new(SlowMailer));

        let err = dispatcher
            .dispatch(FormKind::Booking, &booking_record())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Timeout(d) if d == Duration::from_secs(2)));
    }

    #[test]
    fn test_relay_requires_url() {
        let config = NotifyConfig {
            transport: Transport::Relay,
            ..Default::default()
        };
        assert!(matches!(
            NotificationDispatcher::from_config(&config),
            Err(NotifyError::Config(_))
        ));
        assert!(RelayMailer::new("ftp://relay.example", Duration::from_secs(1)).is_err());
    }
}
