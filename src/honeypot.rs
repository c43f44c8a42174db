// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Decoy-field spam gate.

use crate::form::HONEYPOT_FIELD;
use std::collections::HashMap;
use tracing::info;

/// Outcome of the honeypot check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoneypotResult {
    Clean,
    Tripped,
}

/// Rejects any submission whose hidden decoy field carries a value.
#[derive(Debug, Clone)]
pub struct HoneypotGate {
    field: &'static str,
}

impl Default for HoneypotGate {
    fn default() -> Self {
        Self::new(HONEYPOT_FIELD)
    }
}

impl HoneypotGate {
    pub fn new(field: &'static str) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Any value at all trips the gate, whitespace included.
    pub fn check(&self, raw: &HashMap<String, String>) -> HoneypotResult {
        match raw.get(self.field) {
            Some(value) if !value.is_empty() => {
                info!(field = self.field, "Honeypot field populated");
                HoneypotResult::Tripped
            }
            _ => HoneypotResult::Clean,
        }
    }
}
