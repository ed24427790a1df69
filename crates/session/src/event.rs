//! Real-time account events.
//!
//! Only the handful of fields grouplock reads are modelled; everything else
//! on the wire is ignored during decoding.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Event category carrying thread log messages.
pub const LOG_EVENT_KIND: &str = "event";

/// A single event delivered on the account feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEvent {
    /// Event category (`"event"`, `"message"`, `"typ"`, ...).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Log message marker such as `log:thread-name`.
    #[serde(default)]
    pub log_message_type: Option<String>,

    /// Thread the event originated from.
    #[serde(
        rename = "threadID",
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub thread_id: Option<String>,

    /// Marker-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_message_data: Option<LogMessageData>,
}

/// Payload attached to log events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessageData {
    #[serde(
        rename = "threadID",
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub thread_id: Option<String>,

    /// Same identifier under the camel-case spelling some markers use.
    #[serde(
        rename = "threadId",
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub thread_id_alt: Option<String>,

    /// New thread name, when the marker is a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AccountEvent {
    /// Build a log event with the given marker, originating from `thread_id`.
    pub fn log(marker: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            kind: Some(LOG_EVENT_KIND.to_string()),
            log_message_type: Some(marker.into()),
            thread_id: Some(thread_id.into()),
            log_message_data: None,
        }
    }

    /// Build a log event whose thread id is only present in the payload.
    pub fn log_with_data(marker: impl Into<String>, data: LogMessageData) -> Self {
        Self {
            kind: Some(LOG_EVENT_KIND.to_string()),
            log_message_type: Some(marker.into()),
            thread_id: None,
            log_message_data: Some(data),
        }
    }

    /// The log marker, if this is a log event with a non-empty marker.
    #[must_use]
    pub fn log_marker(&self) -> Option<&str> {
        if self.kind.as_deref() != Some(LOG_EVENT_KIND) {
            return None;
        }
        self.log_message_type
            .as_deref()
            .filter(|marker| !marker.is_empty())
    }

    /// New name carried in the payload, if any.
    #[must_use]
    pub fn new_name(&self) -> Option<&str> {
        self.log_message_data
            .as_ref()
            .and_then(|data| data.name.as_deref())
    }
}

/// Accept thread ids encoded as strings or numbers.
pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}
