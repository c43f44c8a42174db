// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalogue of the public intake forms.
//!
//! Each [`FormKind`] fixes the declared fields (required ones first, in the
//! order their errors are reported), the copy shown to submitters, the
//! notification subject and the file its records are kept in.

use crate::models::SubmissionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hidden decoy field present on every form.
pub const HONEYPOT_FIELD: &str = "website";

/// How a field is checked and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Must look like an e-mail address
    Email,
    /// Free text rendered on its own lines in notifications
    LongText,
    /// Calendar date, `YYYY-MM-DD` from the date picker
    Date,
}

/// One declared form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Posted field name, also the key in stored records
    pub name: &'static str,
    /// Label used in operator notifications
    pub label: &'static str,
    pub kind: FieldKind,
    /// Error reported when the field is empty; `None` for optional fields
    pub required: Option<&'static str>,
    /// Text shown in notifications when an optional field is empty
    pub placeholder: &'static str,
}

impl FieldSpec {
    const fn required(name: &'static str, label: &'static str, kind: FieldKind, msg: &'static str) -> Self {
        Self {
            name,
            label,
            kind,
            required: Some(msg),
            placeholder: "",
        }
    }

    const fn optional(name: &'static str, label: &'static str, kind: FieldKind, placeholder: &'static str) -> Self {
        Self {
            name,
            label,
            kind,
            required: None,
            placeholder,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }
}

const CONTACT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name", "Name", FieldKind::Text, "Name is required"),
    FieldSpec::required("email", "Email", FieldKind::Email, "Email is required"),
    FieldSpec::optional("phone", "Phone", FieldKind::Text, "Not provided"),
    FieldSpec::optional("subject", "Subject", FieldKind::Text, "General Inquiry"),
    FieldSpec::required("message", "Message", FieldKind::LongText, "Message is required"),
];

const BOOKING_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("requesterName", "Requested By", FieldKind::Text, "Your name is required"),
    FieldSpec::required("email", "Email", FieldKind::Email, "Email is required"),
    FieldSpec::required("phone", "Phone", FieldKind::Text, "Phone number is required"),
    FieldSpec::required(
        "intentionFor",
        "Mass Intention For",
        FieldKind::Text,
        "Mass intention for is required",
    ),
    FieldSpec::required(
        "intentionType",
        "Type of Intention",
        FieldKind::Text,
        "Type of intention is required",
    ),
    FieldSpec::required(
        "preferredDate",
        "Preferred Date",
        FieldKind::Date,
        "Preferred date is required",
    ),
    FieldSpec::optional("massTime", "Preferred Mass Time", FieldKind::Text, "Not specified"),
    FieldSpec::optional("additionalInfo", "Additional Information", FieldKind::LongText, ""),
];

const REGISTRATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("fullName", "Full Name", FieldKind::Text, "Full name is required"),
    FieldSpec::required("gender", "Gender", FieldKind::Text, "Gender is required"),
    FieldSpec::required("address", "Address", FieldKind::Text, "Address is required"),
    FieldSpec::required("phone", "Phone", FieldKind::Text, "Phone number is required"),
    FieldSpec::required("email", "Email", FieldKind::Email, "Email is required"),
    FieldSpec::required(
        "society",
        "Society/Organisation",
        FieldKind::Text,
        "Society/Organisation selection is required",
    ),
];

/// The public intake forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Contact,
    Booking,
    Registration,
}

impl FormKind {
    pub const ALL: [FormKind; 3] = [FormKind::Contact, FormKind::Booking, FormKind::Registration];

    /// Stable short name used in logs, metrics and rate-limit keys.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Booking => "mass_booking",
            Self::Registration => "parish_register",
        }
    }

    /// Declared fields in notification order.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Contact => CONTACT_FIELDS,
            Self::Booking => BOOKING_FIELDS,
            Self::Registration => REGISTRATION_FIELDS,
        }
    }

    pub fn required_fields(self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields().iter().filter(|f| f.is_required())
    }

    /// Field holding the submitter's address, used as reply destination.
    pub fn reply_field(self) -> &'static str {
        "email"
    }

    pub fn store_file(self) -> &'static str {
        match self {
            Self::Contact => "contact-submissions.json",
            Self::Booking => "mass-bookings.json",
            Self::Registration => "parish-registrations.json",
        }
    }

    pub fn initial_status(self) -> SubmissionStatus {
        match self {
            Self::Booking => SubmissionStatus::Pending,
            Self::Contact | Self::Registration => SubmissionStatus::New,
        }
    }

    pub fn email_subject(self) -> &'static str {
        match self {
            Self::Contact => "New Contact Form Submission - St. Patrick's Website",
            Self::Booking => "New Mass Intention Booking - St. Patrick's Website",
            Self::Registration => "New Parish Registration - St. Patrick's Website",
        }
    }

    /// First line of the operator notification.
    pub fn heading(self) -> &'static str {
        match self {
            Self::Contact => "New contact form submission from St. Patrick's website",
            Self::Booking => "New Mass Intention Booking from St. Patrick's website",
            Self::Registration => "New Parish Registration from St. Patrick's website",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Contact => "Thank you for contacting us! We will get back to you soon.",
            Self::Booking => {
                "Thank you! Your Mass intention request has been received. The parish office \
                 will contact you to confirm the details and discuss the stipend."
            }
            Self::Registration => {
                "Thank you for registering! Welcome to St. Patrick's Parish. We will contact you soon."
            }
        }
    }

    /// Copy for the case where the submission could be neither stored nor sent.
    pub fn failure_message(self, operator: &str) -> String {
        let what = match self {
            Self::Contact => "sending your message",
            Self::Booking => "processing your request",
            Self::Registration => "processing your registration",
        };
        format!(
            "Sorry, there was an error {what}. Please try again or contact us directly at {operator}"
        )
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
