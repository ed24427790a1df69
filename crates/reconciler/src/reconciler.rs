//! Title reconciler.

use std::sync::Arc;

use grouplock_core::GroupId;
use grouplock_session::ChatSession;
use tracing::{debug, error, info, warn};

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Observed title already matched; nothing was sent.
    AlreadyCorrect,
    /// A rename was sent and accepted.
    Corrected,
    /// A rename was sent and failed.
    Failed { reason: String },
}

impl ReconcileOutcome {
    /// Whether a rename request was issued.
    #[must_use]
    pub const fn correction_attempted(&self) -> bool {
        !matches!(self, Self::AlreadyCorrect)
    }

    /// Whether the rename request failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Compares an observed title against the desired one and corrects drift.
///
/// Failures are reported in the outcome and never retried here; retry
/// timing belongs to the caller.
#[derive(Clone)]
pub struct TitleReconciler {
    session: Arc<dyn ChatSession>,
}

impl TitleReconciler {
    /// Create a reconciler writing through `session`.
    #[must_use]
    pub fn new(session: Arc<dyn ChatSession>) -> Self {
        Self { session }
    }

    /// Rename `group` to `desired` unless `observed` already equals it.
    pub async fn reconcile(&self, observed: &str, desired: &str, group: &GroupId) -> ReconcileOutcome {
        if observed == desired {
            debug!(group_id = %group, title = desired, "Group title already correct");
            return ReconcileOutcome::AlreadyCorrect;
        }

        warn!(
            group_id = %group,
            observed,
            desired,
            "Group title drifted to {observed:?}, resetting"
        );
        self.apply_title(desired, group).await
    }

    /// Rename `group` to `title` unconditionally and log the result.
    pub async fn apply_title(&self, title: &str, group: &GroupId) -> ReconcileOutcome {
        match self.session.set_title(title, group).await {
            Ok(()) => {
                info!(group_id = %group, title, "Group title set to {title:?} on {group}");
                ReconcileOutcome::Corrected
            }
            Err(e) => {
                error!(
                    group_id = %group,
                    title,
                    error = %e,
                    "Failed to set group title {title:?} on {group}"
                );
                ReconcileOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::test_support::CapturedLogs;
    use grouplock_session::InMemorySession;

    fn group() -> GroupId {
        GroupId::new("1548468259676275")
    }

    #[tokio::test]
    async fn test_matching_title_is_not_renamed() {
        let session = Arc::new(InMemorySession::with_title(&group(), "Locked Name"));
        let reconciler = TitleReconciler::new(session.clone());

        let outcome = reconciler
            .reconcile("Locked Name", "Locked Name", &group())
            .await;

        assert_eq!(outcome, ReconcileOutcome::AlreadyCorrect);
        assert!(session.renames().await.is_empty());
    }

    #[tokio::test]
    async fn test_drifted_title_is_renamed_once() {
        let session = Arc::new(InMemorySession::with_title(&group(), "Old Name"));
        let reconciler = TitleReconciler::new(session.clone());

        let outcome = reconciler.reconcile("Old Name", "Locked Name", &group()).await;

        assert_eq!(outcome, ReconcileOutcome::Corrected);
        assert_eq!(
            session.renames().await,
            vec![("Locked Name".to_string(), group())]
        );
    }

    #[tokio::test]
    async fn test_rename_failure_is_reported_not_retried() {
        let session = Arc::new(InMemorySession::with_title(&group(), "Old Name"));
        session.fail_renames("permission denied").await;
        let reconciler = TitleReconciler::new(session.clone());

        let outcome = reconciler.reconcile("Old Name", "Locked Name", &group()).await;

        assert!(outcome.is_failure());
        assert!(outcome.correction_attempted());
        assert_eq!(session.renames().await.len(), 1);
        assert!(matches!(
            outcome,
            ReconcileOutcome::Failed { ref reason } if reason.contains("permission denied")
        ));
    }

    #[tokio::test]
    async fn test_success_log_names_title_and_group() {
        let (logs, _guard) = CapturedLogs::install();

        let session = Arc::new(InMemorySession::with_title(&group(), "Old Name"));
        let reconciler = TitleReconciler::new(session);
        reconciler.reconcile("Old Name", "Locked Name", &group()).await;

        let output = logs.contents();
        assert!(output.contains("Group title set to \"Locked Name\" on 1548468259676275"));
    }

    #[tokio::test]
    async fn test_failure_log_names_title_and_group() {
        let (logs, _guard) = CapturedLogs::install();

        let session = Arc::new(InMemorySession::with_title(&group(), "Old Name"));
        session.fail_renames("permission denied").await;
        let reconciler = TitleReconciler::new(session);
        reconciler.reconcile("Old Name", "Locked Name", &group()).await;

        let output = logs.contents();
        assert!(output.contains("ERROR"));
        assert!(output.contains("Failed to set group title \"Locked Name\" on 1548468259676275"));
        assert!(output.contains("permission denied"));
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(!ReconcileOutcome::AlreadyCorrect.correction_attempted());
        assert!(ReconcileOutcome::Corrected.correction_attempted());
        assert!(!ReconcileOutcome::Corrected.is_failure());
    }
}
