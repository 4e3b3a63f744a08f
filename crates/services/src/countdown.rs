//! One-second countdown task for timed quizzes.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use study_core::{Countdown, TickOutcome};

const TICK: Duration = Duration::from_secs(1);

/// A running countdown.
///
/// The task sends one `TickOutcome::Running` per second and a single
/// `TickOutcome::Expired`, then stops. Cancelling or dropping the timer
/// aborts the task, so no tick arrives after the owner is gone.
#[derive(Debug)]
pub struct CountdownTimer {
    events: mpsc::Receiver<TickOutcome>,
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Spawn the countdown on the current tokio runtime.
    ///
    /// The first tick fires one period after the call. A countdown that has
    /// already expired emits nothing.
    #[must_use]
    pub fn start(countdown: Countdown) -> Self {
        Self::with_period(countdown, TICK)
    }

    pub(crate) fn with_period(mut countdown: Countdown, period: Duration) -> Self {
        let (tx, events) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let outcome = countdown.tick();
                if outcome == TickOutcome::Stopped {
                    break;
                }
                if tx.send(outcome).await.is_err() {
                    break;
                }
                if outcome == TickOutcome::Expired {
                    debug!("countdown expired");
                    break;
                }
            }
        });
        Self { events, handle }
    }

    /// Next countdown event, or `None` once the task has finished.
    pub async fn recv(&mut self) -> Option<TickOutcome> {
        self.events.recv().await
    }

    /// Stop the countdown. Pending events are discarded.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
