//! Rename detection on account events.

use grouplock_session::AccountEvent;

/// Log markers the platform is known to emit for thread renames.
pub const RENAME_MARKERS: [&str; 3] = [
    "log:thread-name",
    "log:thread-title",
    "log:thread-name-change",
];

/// Whether a log marker looks like a thread rename.
///
/// Exact matches against [`RENAME_MARKERS`] first, then a loose fallback:
/// any marker mentioning `thread` together with `name` or `title`. The
/// fallback also catches markers that are not renames (e.g. a hypothetical
/// `log:thread-nickname`); those only cause a redundant re-apply.
#[must_use]
pub fn is_rename_marker(marker: &str) -> bool {
    RENAME_MARKERS.contains(&marker)
        || (marker.contains("thread") && (marker.contains("name") || marker.contains("title")))
}

/// The group an event originated from.
///
/// Tries `threadID`, then `logMessageData.threadID`, then
/// `logMessageData.threadId`; the first non-empty value wins.
#[must_use]
pub fn extract_group_id(event: &AccountEvent) -> Option<&str> {
    let data = event.log_message_data.as_ref();

    event
        .thread_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .or_else(|| {
            data.and_then(|d| d.thread_id.as_deref())
                .filter(|id| !id.is_empty())
        })
        .or_else(|| {
            data.and_then(|d| d.thread_id_alt.as_deref())
                .filter(|id| !id.is_empty())
        })
}
