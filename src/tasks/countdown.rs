//! Countdown background task
//!
//! Drives the once-per-second tick of a running session. The remaining
//! time is always recomputed from the real deadline rather than a
//! decrement counter, so a late or jittery tick resolves to the correct
//! value on its next firing. When the deadline is reached the task reports
//! the boundary to the session and rearms itself for the next lap without
//! passing through a stopped state.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::state::Session;

/// Period between countdown ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Cancellation token for a running countdown
#[derive(Debug)]
pub struct CountdownHandle {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Cancel the countdown. Takes effect immediately; a tick that is
    /// already queued will not run.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
        self.task.abort();
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the countdown task for one start of the session. The task holds
/// only a weak reference, so dropping the session ends the countdown.
pub(crate) fn spawn(
    scheduler: &Handle,
    session: Weak<Session>,
    epoch: u64,
    loop_duration: Duration,
) -> CountdownHandle {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    let task = scheduler.spawn(async move {
        let mut lap_duration = loop_duration;
        loop {
            let deadline = Instant::now() + lap_duration;
            let mut ticks = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let Some(session) = session.upgrade() else {
                            debug!("Session dropped, countdown exiting");
                            return;
                        };
                        let left = deadline.saturating_duration_since(Instant::now());
                        if left.is_zero() {
                            match session.lap_boundary(epoch) {
                                Some(next) => {
                                    lap_duration = next;
                                    break;
                                }
                                None => return,
                            }
                        } else if !session.report_tick(epoch, left.as_millis() as u64 / 1000) {
                            return;
                        }
                    }
                    _ = cancel_rx.changed() => {
                        debug!("Countdown cancelled");
                        return;
                    }
                }
            }
        }
    });

    CountdownHandle { cancel_tx, task }
}
