//! Poll loop.
//!
//! Each cycle fetches the group's metadata, reconciles the observed title,
//! and picks the next delay from what happened:
//!
//! | cycle outcome     | next delay |
//! |-------------------|------------|
//! | fetch failed      | backoff    |
//! | corrected         | fast       |
//! | correction failed | fast       |
//! | already correct   | steady     |

use std::sync::Arc;
use std::time::Duration;

use grouplock_core::{LockConfig, PollIntervals};
use grouplock_session::ChatSession;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::reconciler::{ReconcileOutcome, TitleReconciler};

/// What a single poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The metadata fetch failed; nothing was compared.
    FetchFailed { reason: String },
    /// The observed title was reconciled.
    Reconciled(ReconcileOutcome),
}

/// Delay before the next cycle, given the outcome of the last one.
#[must_use]
pub fn next_delay(outcome: &CycleOutcome, intervals: &PollIntervals) -> Duration {
    match outcome {
        CycleOutcome::FetchFailed { .. } => intervals.backoff,
        CycleOutcome::Reconciled(ReconcileOutcome::AlreadyCorrect) => intervals.steady,
        CycleOutcome::Reconciled(ReconcileOutcome::Corrected | ReconcileOutcome::Failed { .. }) => {
            intervals.fast
        }
    }
}

/// Periodic fetch-and-reconcile loop for the target group.
pub struct PollLoop {
    config: Arc<LockConfig>,
    session: Arc<dyn ChatSession>,
    reconciler: TitleReconciler,
    intervals: PollIntervals,
    stop_rx: watch::Receiver<bool>,
    stop_tx: watch::Sender<bool>,
}

impl PollLoop {
    /// Create a poll loop using the intervals from `config`.
    #[must_use]
    pub fn new(config: Arc<LockConfig>, session: Arc<dyn ChatSession>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            intervals: config.poll,
            reconciler: TitleReconciler::new(session.clone()),
            config,
            session,
            stop_rx,
            stop_tx,
        }
    }

    /// Override the steady interval, keeping the fast and backoff delays.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting intervals fail validation: zero
    /// steady interval, or backoff no longer than steady.
    pub fn with_steady_interval(mut self, steady: Duration) -> grouplock_core::Result<Self> {
        let intervals = PollIntervals {
            steady,
            ..self.intervals
        };
        intervals.validate()?;
        self.intervals = intervals;
        Ok(self)
    }

    /// The intervals this loop schedules with.
    #[must_use]
    pub const fn intervals(&self) -> &PollIntervals {
        &self.intervals
    }

    /// Run one fetch-and-reconcile cycle.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let group = &self.config.group_id;

        let info = match self.session.thread_info(group).await {
            Ok(info) => info,
            Err(e) => {
                error!(group_id = %group, error = %e, "Polling: error fetching group info");
                return CycleOutcome::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };

        let outcome = self
            .reconciler
            .reconcile(info.title(), &self.config.locked_title, group)
            .await;
        CycleOutcome::Reconciled(outcome)
    }

    /// Run until stopped.
    ///
    /// The stop flag is checked before every cycle and interrupts the wait
    /// between cycles. A cycle already talking to the session finishes first.
    pub async fn run(mut self) {
        info!(
            group_id = %self.config.group_id,
            steady_ms = millis(self.intervals.steady),
            fast_ms = millis(self.intervals.fast),
            backoff_ms = millis(self.intervals.backoff),
            "Starting poll loop"
        );

        loop {
            if *self.stop_rx.borrow() {
                break;
            }

            let outcome = self.run_cycle().await;
            let delay = next_delay(&outcome, &self.intervals);
            debug!(outcome = ?outcome, delay_ms = millis(delay), "Poll cycle complete");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                changed = self.stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Poll loop stopped");
    }

    /// Get a stopper handle.
    #[must_use]
    pub fn stopper(&self) -> PollStopper {
        PollStopper {
            stop_tx: self.stop_tx.clone(),
        }
    }

    /// Start the loop on its own task and return it with its stop handle.
    #[must_use]
    pub fn spawn(self) -> (JoinHandle<()>, PollStopper) {
        let stopper = self.stopper();
        (tokio::spawn(self.run()), stopper)
    }
}

/// Handle to stop a poll loop. Stopping more than once has no further effect.
#[derive(Clone)]
pub struct PollStopper {
    stop_tx: watch::Sender<bool>,
}

impl PollStopper {
    /// Stop the loop.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Whether stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
