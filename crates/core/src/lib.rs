//! Core types, configuration, and errors for grouplock.
//!
//! Everything the rest of the workspace needs before a session exists lives
//! here: the immutable [`LockConfig`] built once at startup, the opaque
//! [`Credential`] blob handed to the session connector, and the shared
//! [`Error`] type for loading both.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod config;
pub mod credential;
pub mod error;
pub mod types;

pub use config::{BridgeConfig, LockConfig, PollIntervals};
pub use credential::{Credential, load_credential};
pub use error::{Error, Result};
pub use types::GroupId;
