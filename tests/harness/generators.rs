// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form payload and origin generators.

use parish_intake::form::{FormKind, HONEYPOT_FIELD};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client addresses.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn contact_form() -> HashMap<String, String> {
    form(&[
        ("name", "John Okafor"),
        ("email", "john@example.com"),
        ("phone", ""),
        ("subject", "Parish hall booking"),
        ("message", "Is the hall free on Saturday?"),
        (HONEYPOT_FIELD, ""),
    ])
}

pub fn booking_form() -> HashMap<String, String> {
    form(&[
        ("requesterName", "Mary A."),
        ("email", "mary@example.com"),
        ("phone", "08012345678"),
        ("intentionFor", "Repose of John A."),
        ("intentionType", "thanksgiving"),
        ("preferredDate", "2025-03-17"),
        (HONEYPOT_FIELD, ""),
    ])
}

pub fn registration_form() -> HashMap<String, String> {
    form(&[
        ("fullName", "Grace Eze"),
        ("gender", "female"),
        ("address", "12 Church Road, Igbogila"),
        ("phone", "08098765432"),
        ("email", "grace@example.com"),
        ("society", "CWO"),
        (HONEYPOT_FIELD, ""),
    ])
}

/// A complete, valid payload for `kind`.
pub fn valid_form(kind: FormKind) -> HashMap<String, String> {
    match kind {
        FormKind::Contact => contact_form(),
        FormKind::Booking => booking_form(),
        FormKind::Registration => registration_form(),
    }
}

/// A valid payload with the honeypot filled, as a naive bot would send it.
pub fn bot_form(kind: FormKind) -> HashMap<String, String> {
    let mut raw = valid_form(kind);
    raw.insert(HONEYPOT_FIELD.to_string(), "https://cheap-pills.example".to_string());
    raw
}

/// URL-encode a payload for request bodies.
pub fn encode(raw: &HashMap<String, String>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in raw {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}
