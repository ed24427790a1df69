//! In-memory chat session.
//!
//! Keeps group titles in a map, records every rename request, and lets the
//! caller inject failures and push events onto the feed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use grouplock_core::{Credential, GroupId};
use tokio::sync::{RwLock, broadcast};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::error::{Error, Result};
use crate::event::AccountEvent;
use crate::session::{ChatSession, EventStream, SessionConnector};
use crate::thread::ThreadInfo;

/// Item carried on the in-memory feed: an event or a delivery error message.
type FeedItem = std::result::Result<AccountEvent, String>;

#[derive(Debug, Default)]
struct SessionState {
    titles: HashMap<GroupId, String>,
    renames: Vec<(String, GroupId)>,
    fetches: usize,
    fetch_failure: Option<String>,
    rename_failure: Option<String>,
    listen_failure: Option<String>,
}

/// Chat session backed by process memory.
pub struct InMemorySession {
    state: RwLock<SessionState>,
    feed: broadcast::Sender<FeedItem>,
}

impl InMemorySession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(256);
        Self {
            state: RwLock::new(SessionState::default()),
            feed,
        }
    }

    /// Create a session where `group` currently carries `title`.
    pub fn with_title(group: &GroupId, title: impl Into<String>) -> Self {
        let mut session = Self::new();
        session
            .state
            .get_mut()
            .titles
            .insert(group.clone(), title.into());
        session
    }

    /// Overwrite the current title of `group`, as another member would.
    pub async fn set_current_title(&self, group: &GroupId, title: impl Into<String>) {
        self.state
            .write()
            .await
            .titles
            .insert(group.clone(), title.into());
    }

    /// Current title of `group`.
    pub async fn current_title(&self, group: &GroupId) -> Option<String> {
        self.state.read().await.titles.get(group).cloned()
    }

    /// Every rename request received, in order.
    pub async fn renames(&self) -> Vec<(String, GroupId)> {
        self.state.read().await.renames.clone()
    }

    /// Number of metadata fetches received.
    pub async fn fetch_count(&self) -> usize {
        self.state.read().await.fetches
    }

    /// Make metadata fetches fail with `reason` until cleared.
    pub async fn fail_fetches(&self, reason: impl Into<String>) {
        self.state.write().await.fetch_failure = Some(reason.into());
    }

    /// Make rename requests fail with `reason` until cleared.
    pub async fn fail_renames(&self, reason: impl Into<String>) {
        self.state.write().await.rename_failure = Some(reason.into());
    }

    /// Make subscribing to the feed fail with `reason` until cleared.
    pub async fn fail_listen(&self, reason: impl Into<String>) {
        self.state.write().await.listen_failure = Some(reason.into());
    }

    /// Clear every injected failure.
    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.fetch_failure = None;
        state.rename_failure = None;
        state.listen_failure = None;
    }

    /// Deliver an event to every current listener.
    pub fn emit(&self, event: AccountEvent) {
        let _ = self.feed.send(Ok(event));
    }

    /// Deliver a feed error to every current listener.
    pub fn emit_error(&self, reason: impl Into<String>) {
        let _ = self.feed.send(Err(reason.into()));
    }

    /// Number of active feed subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.feed.receiver_count()
    }
}

impl Default for InMemorySession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSession for InMemorySession {
    async fn set_title(&self, title: &str, group: &GroupId) -> Result<()> {
        let mut state = self.state.write().await;
        state.renames.push((title.to_string(), group.clone()));

        if let Some(reason) = &state.rename_failure {
            return Err(Error::request_failed("setTitle", reason.clone()));
        }

        debug!(group_id = %group, title, "In-memory rename");
        state.titles.insert(group.clone(), title.to_string());
        Ok(())
    }

    async fn thread_info(&self, group: &GroupId) -> Result<ThreadInfo> {
        let mut state = self.state.write().await;
        state.fetches += 1;

        if let Some(reason) = &state.fetch_failure {
            return Err(Error::request_failed("getThreadInfo", reason.clone()));
        }

        Ok(ThreadInfo {
            thread_id: Some(group.to_string()),
            name: state.titles.get(group).cloned(),
            thread_name: None,
        })
    }

    async fn listen(&self) -> Result<EventStream> {
        if let Some(reason) = &self.state.read().await.listen_failure {
            return Err(Error::subscription_failed(reason.clone()));
        }

        let stream = BroadcastStream::new(self.feed.subscribe()).map(|item| match item {
            Ok(Ok(event)) => Ok(event),
            Ok(Err(reason)) => Err(Error::invalid_event(reason)),
            Err(lagged) => Err(Error::subscription_failed(lagged.to_string())),
        });
        Ok(Box::pin(stream))
    }
}

/// Connector that always hands out the same in-memory session.
pub struct InMemoryConnector {
    session: Arc<InMemorySession>,
    rejection: Option<String>,
}

impl InMemoryConnector {
    /// Create a connector for `session`.
    #[must_use]
    pub const fn new(session: Arc<InMemorySession>) -> Self {
        Self {
            session,
            rejection: None,
        }
    }

    /// Create a connector whose logins always fail with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            session: Arc::new(InMemorySession::new()),
            rejection: Some(reason.into()),
        }
    }
}

#[async_trait]
impl SessionConnector for InMemoryConnector {
    async fn login(&self, _credential: &Credential) -> Result<Arc<dyn ChatSession>> {
        match &self.rejection {
            Some(reason) => Err(Error::login_failed(reason.clone())),
            None => Ok(self.session.clone()),
        }
    }
}
