//! Usage record definitions.
//!
//! Every field except `instance` is optional on the wire; the assertions
//! decide which ones must be present.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Record kinds, as named in the store's query paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Launch,
    Delete,
    Exists,
}

impl EventKind {
    /// Path segment used by the store API.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Launch => "launches",
            Self::Delete => "deletes",
            Self::Exists => "exists",
        }
    }

    /// Name used in assertion messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::Delete => "delete",
            Self::Exists => "exists",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Launch record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchEntry {
    #[serde(default)]
    pub id: Option<i64>,

    pub instance: String,

    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(default)]
    pub instance_type_id: Option<String>,

    #[serde(default)]
    pub instance_flavor_id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_event_time")]
    pub launched_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tenant: Option<String>,

    #[serde(default)]
    pub os_architecture: Option<String>,

    #[serde(default)]
    pub os_distro: Option<String>,

    #[serde(default)]
    pub os_version: Option<String>,

    #[serde(default)]
    pub rax_options: Option<String>,
}

/// Delete record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteEntry {
    #[serde(default)]
    pub id: Option<i64>,

    pub instance: String,

    #[serde(default, deserialize_with = "deserialize_event_time")]
    pub launched_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_event_time")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Exists (usage audit) record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistsEntry {
    #[serde(default)]
    pub id: Option<i64>,

    pub instance: String,

    #[serde(default)]
    pub instance_type_id: Option<String>,

    #[serde(default)]
    pub instance_flavor_id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "deserialize_event_time")]
    pub launched_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_event_time")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_event_time")]
    pub audit_period_beginning: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_event_time")]
    pub audit_period_ending: Option<DateTime<Utc>>,
}

/// All records for one server, fetched together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerEvents {
    pub instance: String,
    pub launches: Vec<LaunchEntry>,
    pub deletes: Vec<DeleteEntry>,
    pub exists: Vec<ExistsEntry>,
}

/// Timestamps arrive either as decimal epoch seconds (`1383945422.000000`,
/// as a number or a string) or as date-time strings.
fn deserialize_event_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .and_then(from_epoch_secs)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid epoch timestamp: {n}"))),
        Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => parse_event_time(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid timestamp: {other}"
        ))),
    }
}

/// Parse a timestamp in any of the formats the store emits.
pub fn parse_event_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = s.parse::<f64>() {
        return from_epoch_secs(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
    Utc.timestamp_opt(whole, nanos.min(999_999_999)).single()
}
