//! Progress Reporter
//!
//! Pushes the latest playback offset to the resume store on a fixed
//! wall-clock period. The reporter owns no session state: every tick it asks
//! its source what to send, so pausing, ending and teardown are all decided
//! by the coordinator.

use crate::{services::ResumePositionStore, PlaybackToken, ProgressReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Report ready to be sent on a tick
#[derive(Debug, Clone)]
pub struct PendingReport {
    pub token: PlaybackToken,
    pub report: ProgressReport,
}

/// What the source wants done on a tick
#[derive(Debug, Clone)]
pub enum Tick {
    /// Send this report
    Report(PendingReport),
    /// Nothing to send this time (paused)
    Skip,
    /// Session is gone; end the task
    Stop,
}

/// Handle to a running reporting interval
///
/// Stopping the handle (explicitly or on drop) ends the interval. A tick
/// re-checks the stop flag after asking its source and before sending, so no
/// `put` starts once `stop()` has returned on a current-thread runtime. On a
/// multi-thread runtime a tick already past that check may still send one
/// report, since the abort only lands at the task's next `.await`.
#[derive(Debug)]
pub struct ProgressReporter {
    handle: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
}

impl ProgressReporter {
    /// Start reporting every `period`. The first report goes out one full
    /// period after the start, not immediately.
    pub fn spawn<F>(period: Duration, store: Arc<dyn ResumePositionStore>, source: F) -> Self
    where
        F: Fn() -> Tick + Send + Sync + 'static,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let halt = stopped.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let pending = match source() {
                    Tick::Report(pending) => pending,
                    Tick::Skip => {
                        debug!("Playback paused, skipping progress report");
                        continue;
                    }
                    Tick::Stop => break,
                };

                // No renewal: an expired token ends reporting for this session
                if pending.token.is_expired() {
                    warn!(
                        expires_at = %pending.token.expires_at,
                        "Playback token expired, progress reporting stopped"
                    );
                    break;
                }

                if halt.load(Ordering::Acquire) {
                    break;
                }

                match store.put_progress(&pending.token, &pending.report).await {
                    Ok(()) => debug!(
                        position = pending.report.position,
                        duration = pending.report.duration,
                        "Progress reported"
                    ),
                    // Retried by the next tick with fresher data
                    Err(err) => warn!(
                        error = %err,
                        code = err.error_code(),
                        position = pending.report.position,
                        "Progress report failed"
                    ),
                }
            }

            debug!("Progress reporter finished");
        });

        Self { handle, stopped }
    }

    /// Stop the interval
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}
