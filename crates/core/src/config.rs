//! Startup configuration.
//!
//! [`LockConfig`] is read once from a TOML file, validated, and then shared
//! immutably (behind an `Arc`) by every component. Nothing in it changes while
//! the process runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::GroupId;

/// Environment variable that overrides the liveness port.
pub const PORT_ENV: &str = "PORT";

/// Configuration for the title lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Group whose title is guarded.
    pub group_id: GroupId,

    /// Title the group must carry.
    pub locked_title: String,

    /// Poll loop timing.
    #[serde(default)]
    pub poll: PollIntervals,

    /// Delay between a rename event and re-applying the locked title.
    #[serde(
        rename = "debounce_ms",
        with = "duration_millis",
        default = "default_debounce"
    )]
    pub debounce: Duration,

    /// Path of the persisted session credential.
    #[serde(default = "default_credential_path")]
    pub credential_path: PathBuf,

    /// Port for the liveness endpoint.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Session gateway settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl LockConfig {
    /// Create a config for the given group and title with default timings.
    pub fn new(group_id: impl Into<GroupId>, locked_title: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            locked_title: locked_title.into(),
            poll: PollIntervals::default(),
            debounce: default_debounce(),
            credential_path: default_credential_path(),
            port: default_port(),
            bridge: BridgeConfig::default(),
        }
    }

    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| Error::toml_parse_failed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the group id or title is blank, or the poll
    /// intervals are inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.group_id.is_empty() {
            return Err(Error::invalid_config("group_id must not be empty"));
        }
        if self.locked_title.is_empty() {
            return Err(Error::invalid_config("locked_title must not be empty"));
        }
        self.poll.validate()
    }

    /// Apply the `PORT` override, if one was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid port number.
    pub fn with_port_env(mut self, value: Option<String>) -> Result<Self> {
        if let Some(raw) = value {
            self.port = raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::invalid_config(format!("{PORT_ENV}={raw}: {e}")))?;
        }
        Ok(self)
    }

    /// Set the credential path.
    #[must_use]
    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = path.into();
        self
    }

    /// Set the liveness port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// The three delays the poll loop chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollIntervals {
    /// Delay after a cycle that found the title correct.
    #[serde(rename = "steady_secs", with = "duration_secs", default = "default_steady")]
    pub steady: Duration,

    /// Delay after a cycle that attempted a correction.
    #[serde(rename = "fast_secs", with = "duration_secs", default = "default_fast")]
    pub fast: Duration,

    /// Delay after a cycle whose metadata fetch failed.
    #[serde(rename = "backoff_secs", with = "duration_secs", default = "default_backoff")]
    pub backoff: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            steady: default_steady(),
            fast: default_fast(),
            backoff: default_backoff(),
        }
    }
}

impl PollIntervals {
    /// Create intervals from explicit values.
    #[must_use]
    pub const fn new(steady: Duration, fast: Duration, backoff: Duration) -> Self {
        Self {
            steady,
            fast,
            backoff,
        }
    }

    /// Validate the intervals.
    ///
    /// # Errors
    ///
    /// Returns an error if any interval is zero or backoff is not longer than
    /// the steady interval.
    pub fn validate(&self) -> Result<()> {
        if self.steady.is_zero() || self.fast.is_zero() {
            return Err(Error::invalid_config(
                "poll steady and fast intervals must be greater than 0",
            ));
        }
        if self.backoff <= self.steady {
            return Err(Error::invalid_config(format!(
                "poll backoff ({}s) must be longer than steady ({}s)",
                self.backoff.as_secs(),
                self.steady.as_secs()
            )));
        }
        Ok(())
    }
}

/// Settings for the HTTP session gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the gateway.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(rename = "timeout_secs", with = "duration_secs", default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

const fn default_steady() -> Duration {
    Duration::from_secs(30)
}

const fn default_fast() -> Duration {
    Duration::from_secs(5)
}

const fn default_backoff() -> Duration {
    Duration::from_secs(60)
}

const fn default_debounce() -> Duration {
    Duration::from_millis(200)
}

fn default_credential_path() -> PathBuf {
    PathBuf::from("appstate.json")
}

const fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
