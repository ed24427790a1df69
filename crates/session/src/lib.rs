#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # grouplock-session
//!
//! The seam between grouplock and the chat platform.
//!
//! Authentication, transport, and real-time delivery belong to an external
//! client. This crate only describes what grouplock needs from it:
//!
//! - [`SessionConnector`] turns a persisted [`Credential`] into a session
//! - [`ChatSession`] renames a group, fetches its metadata, and streams
//!   [`AccountEvent`]s
//!
//! Two implementations are provided: [`BridgeConnector`], which talks JSON
//! over HTTP to a session gateway, and [`InMemorySession`] for tests.
//!
//! [`Credential`]: grouplock_core::Credential

pub mod bridge;
pub mod error;
pub mod event;
pub mod memory;
pub mod session;
pub mod thread;

pub use bridge::{BridgeConnector, BridgeSession};
pub use error::{Error, Result};
pub use event::{AccountEvent, LogMessageData};
pub use memory::{InMemoryConnector, InMemorySession};
pub use session::{ChatSession, EventStream, SessionConnector};
pub use thread::{ThreadInfo, UNKNOWN_TITLE};
