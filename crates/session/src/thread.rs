//! Group metadata returned by the session.

use serde::{Deserialize, Serialize};

use crate::event::deserialize_opt_id;

/// Title reported when the metadata carries no usable name.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Metadata for one group thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadInfo {
    #[serde(
        rename = "threadID",
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub thread_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Older payloads carry the title here instead of `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
}

impl ThreadInfo {
    /// Metadata for a thread with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The observed title: `name`, then `threadName`, then [`UNKNOWN_TITLE`].
    ///
    /// Empty strings count as absent.
    #[must_use]
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.thread_name.as_deref().filter(|name| !name.is_empty()))
            .unwrap_or(UNKNOWN_TITLE)
    }
}
