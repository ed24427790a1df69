//! Persisted session credential.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Opaque serialized session state handed to the session connector.
///
/// The contents are never inspected; `Debug` output is redacted so the blob
/// cannot leak into logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(serde_json::Value);

impl Credential {
    /// Wrap an already parsed credential value.
    #[must_use]
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the raw value.
    #[must_use]
    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Read and parse the credential file.
///
/// # Errors
///
/// Returns [`Error::FileReadFailed`] if the file is missing or unreadable and
/// [`Error::JsonParseFailed`] if it is not valid JSON.
pub fn load_credential(path: impl AsRef<Path>) -> Result<Credential> {
    let path = path.as_ref();
    let raw =
        std::fs::read_to_string(path).map_err(|e| Error::file_read_failed(path, e.to_string()))?;
    let value = serde_json::from_str(&raw).map_err(|e| Error::json_parse_failed(path, e.to_string()))?;
    debug!(path = %path.display(), "Loaded session credential");
    Ok(Credential(value))
}
