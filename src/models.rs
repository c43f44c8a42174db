// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Persisted record shapes.
//!
//! The JSON files have no schema version, so every field tolerates being
//! absent or carrying a legacy value.

use crate::sanitize::Fields;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Review state of a submission, set by the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionStatus {
    #[default]
    New,
    Pending,
    Read,
    /// Any other value written by the dashboard, kept verbatim
    Other(String),
}

impl From<String> for SubmissionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "new" => Self::New,
            "pending" => Self::Pending,
            "read" => Self::Read,
            _ => Self::Other(value),
        }
    }
}

impl From<SubmissionStatus> for String {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::New => "new".to_string(),
            SubmissionStatus::Pending => "pending".to_string(),
            SubmissionStatus::Read => "read".to_string(),
            SubmissionStatus::Other(s) => s,
        }
    }
}

/// One accepted form submission.
///
/// Form fields are stored flat alongside the metadata, as the dashboard
/// expects. Keys the dashboard adds with non-string values are carried in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredSubmission")]
pub struct Submission {
    /// UUIDv7 for new records; legacy numeric ids are kept as strings
    pub id: String,

    #[serde(flatten)]
    pub fields: Fields,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Creation time, second precision
    #[serde(rename = "date", serialize_with = "record_time::serialize")]
    pub submitted_at: DateTime<Utc>,

    /// Network origin, for audit only
    #[serde(rename = "ip")]
    pub origin_address: String,

    pub status: SubmissionStatus,

    pub read: bool,

    /// Whether the operator notification went out. Legacy records were only
    /// stored after a successful send.
    pub notified: bool,
}

/// On-disk shape; every key is optional and unknown keys may hold any JSON.
#[derive(Deserialize)]
struct StoredSubmission {
    #[serde(default, deserialize_with = "string_or_number")]
    id: String,

    #[serde(rename = "date", default, deserialize_with = "record_time::deserialize")]
    submitted_at: DateTime<Utc>,

    #[serde(rename = "ip", default)]
    origin_address: String,

    #[serde(default, deserialize_with = "or_default")]
    status: SubmissionStatus,

    #[serde(default, deserialize_with = "or_default")]
    read: bool,

    #[serde(default = "default_true")]
    notified: bool,

    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<StoredSubmission> for Submission {
    fn from(stored: StoredSubmission) -> Self {
        let mut fields = Fields::new();
        let mut extra = Map::new();
        for (key, value) in stored.rest {
            match value {
                Value::String(s) => {
                    fields.insert(key, s);
                }
                other => {
                    extra.insert(key, other);
                }
            }
        }
        Self {
            id: stored.id,
            fields,
            extra,
            submitted_at: stored.submitted_at,
            origin_address: stored.origin_address,
            status: stored.status,
            read: stored.read,
            notified: stored.notified,
        }
    }
}

impl Submission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn default_true() -> bool {
    true
}

/// Any value of the wrong type reads as the default.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// `YYYY-MM-DD HH:MM:SS` in UTC; RFC 3339 accepted on read.
pub mod record_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    /// Unreadable timestamps fall back to the epoch rather than failing the file.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_str().and_then(parse).unwrap_or_default())
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .map(|naive| naive.and_utc())
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|t| t.with_timezone(&Utc))
            })
    }
}

/// Announcement category, fixed by the admin form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    General,
    Liturgy,
    Information,
    Event,
    Important,
    Community,
    Education,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::General,
        Category::Liturgy,
        Category::Information,
        Category::Event,
        Category::Important,
        Category::Community,
        Category::Education,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Liturgy => "Liturgy",
            Self::Information => "Information",
            Self::Event => "Event",
            Self::Important => "Important",
            Self::Community => "Community",
            Self::Education => "Education",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Unknown legacy categories read as `General`.
impl From<String> for Category {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Normal => "normal".to_string(),
            Priority::High => "high".to_string(),
        }
    }
}

/// One admin-authored notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// `max(existing) + 1` at creation, never reused while higher ids exist
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Display date as entered, normally `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
}

impl Announcement {
    /// The display date, if it is readable.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| record_time::parse(self.date.trim()).map(|t| t.date_naive()))
            .or_else(|| {
                NaiveDateTime::parse_from_str(self.date.trim(), "%Y-%m-%dT%H:%M")
                    .ok()
                    .map(|t| t.date())
            })
    }
}

/// Validated admin input for a new announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementDraft {
    pub title: String,
    pub date: NaiveDate,
    pub category: Category,
    pub message: String,
    pub priority: Priority,
}
