//! Keeps one group's title locked.
//!
//! Two independent flows drive the same correction:
//!
//! - **Poll loop**: fetches the group metadata on a timer and hands the
//!   observed title to the [`TitleReconciler`]. The next delay depends on
//!   what the cycle did (see [`next_delay`]).
//! - **Event reactor**: watches the account feed for rename markers on the
//!   target group and, after a short debounce, re-applies the locked title
//!   without comparing.
//!
//! Both flows may rename at the same time. There is no lock between them;
//! the platform keeps the last write.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use grouplock_core::LockConfig;
//! use grouplock_reconciler::{EventReactor, PollLoop};
//!
//! let config = Arc::new(LockConfig::new("1548468259676275", "Locked Name"));
//! let session = connector.login(&credential).await?;
//!
//! let reactor = EventReactor::new(config.clone(), session.clone()).spawn();
//! let (poll, stopper) = PollLoop::new(config, session).spawn();
//!
//! // later
//! stopper.stop();
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod classify;
pub mod error;
pub mod poll;
pub mod reactor;
pub mod reconciler;

#[cfg(test)]
mod test_support;

pub use classify::{RENAME_MARKERS, extract_group_id, is_rename_marker};
pub use error::{Error, Result};
pub use poll::{CycleOutcome, PollLoop, PollStopper, next_delay};
pub use reactor::EventReactor;
pub use reconciler::{ReconcileOutcome, TitleReconciler};
