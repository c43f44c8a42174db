// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-memory mail transports.

use async_trait::async_trait;
use parish_intake::error::NotifyError;
use parish_intake::notify::{Mailer, Notification};
use std::sync::Mutex;
use std::time::Duration;

/// Keeps every notification it is handed.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Refuses every send.
#[derive(Debug, Default)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}

/// Never finishes within any sensible timeout.
#[derive(Debug)]
pub struct StalledMailer(pub Duration);

#[async_trait]
impl Mailer for StalledMailer {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}
