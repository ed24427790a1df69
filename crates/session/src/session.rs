//! Session traits.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use grouplock_core::{Credential, GroupId};

use crate::error::Result;
use crate::event::AccountEvent;
use crate::thread::ThreadInfo;

/// Feed of account events. Each item is either an event or a delivery error.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AccountEvent>> + Send>>;

/// An authenticated handle to the chat platform.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Rename `group` to `title`.
    async fn set_title(&self, title: &str, group: &GroupId) -> Result<()>;

    /// Fetch the current metadata of `group`.
    async fn thread_info(&self, group: &GroupId) -> Result<ThreadInfo>;

    /// Subscribe to the account's real-time event feed.
    async fn listen(&self) -> Result<EventStream>;
}

/// Opens a session from a persisted credential.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Log in and return a session handle.
    async fn login(&self, credential: &Credential) -> Result<Arc<dyn ChatSession>>;
}
