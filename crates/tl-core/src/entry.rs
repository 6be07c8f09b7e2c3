//! Point-in-time log entries as exchanged with the remote store.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{EntryId, ValidationError};

/// Label used for entries whose tag is empty.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Naive formats accepted from the store, interpreted in local time.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A single logged event: what the user started doing at `timestamp`.
///
/// Entries carry no duration. How long an entry lasted depends on its
/// neighbours and is derived by [`crate::derive`] after sorting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Store-assigned identifier, absent until the entry has been created.
    #[serde(rename = "uuid", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    /// When the activity started.
    #[serde(with = "wire_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Free-text description of the activity.
    pub activity: String,
    /// Free-text category; empty means uncategorized.
    #[serde(default, deserialize_with = "nullable_string")]
    pub tag: String,
}

impl LogEntry {
    /// Creates an entry that has not been stored yet.
    pub fn new(
        timestamp: DateTime<Utc>,
        activity: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            timestamp,
            activity: activity.into(),
            tag: tag.into(),
        }
    }

    /// Attaches a store identifier.
    #[must_use]
    pub fn with_id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    /// The tag used for grouping, with empty tags mapped to [`UNCATEGORIZED`].
    pub fn tag_label(&self) -> &str {
        tag_label(&self.tag)
    }
}

/// Maps an empty or whitespace-only tag to [`UNCATEGORIZED`].
pub fn tag_label(tag: &str) -> &str {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        UNCATEGORIZED
    } else {
        trimmed
    }
}

/// A validated create/update payload for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDraft {
    #[serde(serialize_with = "wire_timestamp::serialize")]
    timestamp: DateTime<Utc>,
    activity: String,
    tag: String,
}

impl EntryDraft {
    /// Validates and normalizes a payload. Activity must be non-empty; the
    /// tag may be empty.
    pub fn new(
        timestamp: DateTime<Utc>,
        activity: impl Into<String>,
        tag: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let activity = activity.into().trim().to_string();
        if activity.is_empty() {
            return Err(ValidationError::Empty { field: "activity" });
        }
        Ok(Self {
            timestamp,
            activity,
            tag: tag.into().trim().to_string(),
        })
    }

    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl TryFrom<&LogEntry> for EntryDraft {
    type Error = ValidationError;

    fn try_from(entry: &LogEntry) -> Result<Self, Self::Error> {
        Self::new(entry.timestamp, entry.activity.clone(), entry.tag.clone())
    }
}

/// Parses a store timestamp, reading naive values as local time.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    parse_timestamp_in(value, &Local)
}

/// Parses a store timestamp, reading naive values in `tz`.
///
/// Accepts RFC 3339 (with `Z` or a numeric offset) and the naive forms
/// `YYYY-MM-DDTHH:MM:SS[.f]` and `YYYY-MM-DD HH:MM:SS[.f]`. Ambiguous local
/// times resolve to the earlier instant.
pub fn parse_timestamp_in<Tz: TimeZone>(
    value: &str,
    tz: &Tz,
) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::InvalidTimestamp {
            value: value.to_string(),
        })
}

/// Formats a timestamp the way the store expects it.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

mod wire_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(*timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
