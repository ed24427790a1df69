//! Event reactor.
//!
//! Watches the account feed and re-applies the locked title whenever a rename
//! marker arrives for the target group. The current title is not compared:
//! the event itself is the signal.

use std::sync::Arc;

use futures::StreamExt;
use grouplock_core::LockConfig;
use grouplock_session::{AccountEvent, ChatSession};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::classify::{extract_group_id, is_rename_marker};
use crate::error::{Error, Result};
use crate::reconciler::{ReconcileOutcome, TitleReconciler};

/// Reacts to rename events on the target group.
pub struct EventReactor {
    config: Arc<LockConfig>,
    session: Arc<dyn ChatSession>,
    reconciler: TitleReconciler,
}

impl EventReactor {
    /// Create a reactor for the group in `config`.
    #[must_use]
    pub fn new(config: Arc<LockConfig>, session: Arc<dyn ChatSession>) -> Self {
        Self {
            reconciler: TitleReconciler::new(session.clone()),
            config,
            session,
        }
    }

    /// Subscribe to the feed and handle events until it ends.
    ///
    /// Feed errors are logged and skipped. The feed ending is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubscribeFailed`] if the subscription cannot be
    /// opened. No retry is attempted.
    pub async fn run(self) -> Result<()> {
        let mut feed = match self.session.listen().await {
            Ok(feed) => feed,
            Err(e) => {
                error!(error = %e, "Failed to subscribe to account events");
                return Err(Error::subscribe_failed(e.to_string()));
            }
        };

        info!(group_id = %self.config.group_id, "Listening for rename events");

        while let Some(item) = feed.next().await {
            match item {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(e) => warn!(error = %e, "Event feed error, skipping"),
            }
        }

        warn!("Account event feed ended; event-driven resets are off");
        Ok(())
    }

    /// Handle one event.
    ///
    /// Returns the handle of the scheduled reset if the event is a rename of
    /// the target group. Each reset runs on its own task so a failure while
    /// handling one event never reaches the feed loop.
    pub fn handle_event(&self, event: &AccountEvent) -> Option<JoinHandle<ReconcileOutcome>> {
        let marker = event.log_marker()?;
        if !is_rename_marker(marker) {
            return None;
        }

        let Some(origin) = extract_group_id(event) else {
            debug!(marker, "Rename event without a thread id, ignoring");
            return None;
        };
        if self.config.group_id != origin {
            debug!(marker, origin, "Rename event for another group, ignoring");
            return None;
        }

        info!(
            marker,
            group_id = origin,
            new_name = ?event.new_name(),
            "Rename event detected on target group"
        );

        let reconciler = self.reconciler.clone();
        let config = self.config.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(config.debounce).await;
            let outcome = reconciler
                .apply_title(&config.locked_title, &config.group_id)
                .await;
            if outcome.is_failure() {
                warn!(group_id = %config.group_id, "Event-driven: reset failed");
            } else {
                info!(group_id = %config.group_id, "Event-driven: reset executed");
            }
            outcome
        }))
    }

    /// Run the reactor on its own task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}
