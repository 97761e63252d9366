//! Progressive status ticker
//!
//! Advances a step index through [`STATUS_LABELS`] once per period and holds at
//! the last label. The ticker only reports steps; it never decides when loading
//! ends.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Labels shown while a request is in flight
pub const STATUS_LABELS: [&str; 4] = [
    "Uploading image...",
    "Scanning pixel patterns...",
    "Checking lighting and anatomy...",
    "Compiling forensic report...",
];

/// Label for a step index, clamped to the last one
pub fn label(step: usize) -> &'static str {
    STATUS_LABELS[step.min(STATUS_LABELS.len() - 1)]
}

/// Next step index; saturates at the last label, never wraps
pub fn next_step(step: usize) -> usize {
    (step + 1).min(STATUS_LABELS.len() - 1)
}

/// Running ticker task
pub struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Start ticking; `on_step` is called with each new step index
    ///
    /// The task ends when `cancel` (or its parent) is cancelled.
    pub fn start<F>(period: Duration, cancel: CancellationToken, on_step: F) -> Self
    where
        F: Fn(usize) + Send + 'static,
    {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut step = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let next = next_step(step);
                        if next != step {
                            step = next;
                            on_step(step);
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Cancel and wait until the task has exited; no step is reported afterwards
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Status ticker task ended abnormally");
        }
    }
}
