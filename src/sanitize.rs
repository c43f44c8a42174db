// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Normalization and escaping of raw form values.

use crate::form::FormKind;
use std::collections::{BTreeMap, HashMap};

/// Sanitized field values keyed by field name.
pub type Fields = BTreeMap<String, String>;

/// Trim, drop backslash escapes, then HTML-escape a single value.
pub fn sanitize_value(raw: &str) -> String {
    escape_html(&strip_backslashes(raw.trim()))
}

/// Sanitize every declared field of `kind`; absent fields become `""` and
/// undeclared fields are dropped.
pub fn sanitize_fields(kind: FormKind, raw: &HashMap<String, String>) -> Fields {
    kind.fields()
        .iter()
        .map(|spec| {
            let value = raw.get(spec.name).map(|v| sanitize_value(v)).unwrap_or_default();
            (spec.name.to_string(), value)
        })
        .collect()
}

/// `\x` becomes `x`, `\\` becomes `\`, a trailing lone `\` is dropped.
fn strip_backslashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
