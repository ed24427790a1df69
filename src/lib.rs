#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # grouplock
//!
//! Keeps a chat group's title locked to a configured value.
//!
//! The binary wires the workspace crates together; this library exposes the
//! wiring so it can be driven from tests with an in-memory session.

pub mod app;
pub mod cli;

pub use app::{Activation, activate, load_settings};
pub use cli::Cli;
