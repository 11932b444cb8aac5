//! Session state machine
//!
//! The session owns the interval timer: loop length, live countdown value,
//! lap count and alert volume. All mutations run on the caller's context;
//! the only background activity is the countdown task, which reports back
//! through epoch-guarded callbacks so a cancelled countdown can never touch
//! state again.

use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::services::signal::SignalEmitter;
use crate::state::ambient::AmbientSound;
use crate::state::snapshot::SessionSnapshot;
use crate::tasks::countdown::{self, CountdownHandle};

/// Shortest loop the timer will count down, in seconds.
pub const MIN_LOOP_SECONDS: u64 = 60;
/// Loop length a fresh session starts with.
pub const DEFAULT_LOOP_SECONDS: u64 = 120;
/// Alert volume a fresh session starts with.
pub const DEFAULT_VOLUME: f32 = 0.5;

const MINUTE: u64 = 60;

#[derive(Debug)]
struct SessionInner {
    loop_seconds: u64,
    seconds_left: Option<u64>,
    lap_count: u64,
    alert_volume: f32,
    /// Countdown generation; callbacks from older generations are discarded
    epoch: u64,
}

/// Interval timer session
pub struct Session {
    inner: Mutex<SessionInner>,
    /// Cancellation handle of the active countdown; `Some` iff running
    countdown: Mutex<Option<CountdownHandle>>,
    emitter: Arc<dyn SignalEmitter>,
    ambient: AmbientSound,
    /// Handed to countdown tasks so they cannot keep a dropped session alive
    weak_self: Weak<Session>,
    created_at: Instant,
    /// Last user intent tracking
    last_intent: Mutex<Option<(String, DateTime<Utc>)>>,
    /// Channel for session updates
    update_tx: watch::Sender<SessionSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _update_rx: watch::Receiver<SessionSnapshot>,
}

impl Session {
    /// Create a session with default loop length and volume
    pub fn new(emitter: Arc<dyn SignalEmitter>, ambient: AmbientSound) -> Arc<Self> {
        Self::with_config(DEFAULT_LOOP_SECONDS, DEFAULT_VOLUME, emitter, ambient)
    }

    /// Create a session with an explicit loop length and volume. The loop
    /// length is raised to the minimum and the volume clamped into [0, 1].
    pub fn with_config(
        loop_seconds: u64,
        alert_volume: f32,
        emitter: Arc<dyn SignalEmitter>,
        ambient: AmbientSound,
    ) -> Arc<Self> {
        let loop_seconds = loop_seconds.max(MIN_LOOP_SECONDS);
        let alert_volume = alert_volume.clamp(0.0, 1.0);
        let (update_tx, update_rx) = watch::channel(SessionSnapshot::idle(loop_seconds, alert_volume));

        Arc::new_cyclic(|weak_self| Self {
            inner: Mutex::new(SessionInner {
                loop_seconds,
                seconds_left: None,
                lap_count: 0,
                alert_volume,
                epoch: 0,
            }),
            countdown: Mutex::new(None),
            emitter,
            ambient,
            weak_self: weak_self.clone(),
            created_at: Instant::now(),
            last_intent: Mutex::new(None),
            update_tx,
            _update_rx: update_rx,
        })
    }

    /// Subscribe to session updates
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.update_tx.subscribe()
    }

    /// Start the countdown. A no-op while already running; fails only when
    /// no scheduler is available for the periodic tick.
    pub fn start(&self) -> Result<(), String> {
        let mut countdown = self.lock_countdown()?;
        if countdown.is_some() {
            debug!("start requested while already running, ignoring");
            return Ok(());
        }

        let scheduler = tokio::runtime::Handle::try_current()
            .map_err(|e| format!("No scheduler available for countdown ticks: {}", e))?;

        let (epoch, loop_seconds) = {
            let mut inner = self.lock_inner()?;
            inner.epoch += 1;
            inner.seconds_left = Some(inner.loop_seconds);
            (inner.epoch, inner.loop_seconds)
        };

        *countdown = Some(countdown::spawn(
            &scheduler,
            self.weak_self.clone(),
            epoch,
            Duration::from_secs(loop_seconds),
        ));
        drop(countdown);

        self.touch_intent("start");
        self.publish();
        info!("Session started with {}s loop", loop_seconds);
        Ok(())
    }

    /// Stop the countdown, clear the remaining time and reset the lap
    /// count. Valid and idempotent from any state.
    pub fn stop(&self) -> Result<(), String> {
        // Take the handle first so a queued tick can no longer land
        let cancelled = self.lock_countdown()?.take();
        let was_running = cancelled.is_some();
        if let Some(handle) = cancelled {
            handle.cancel();
        }

        {
            let mut inner = self.lock_inner()?;
            inner.epoch += 1;
            inner.seconds_left = None;
            inner.lap_count = 0;
        }

        self.touch_intent("stop");
        self.publish();
        if was_running {
            info!("Session stopped");
        }
        Ok(())
    }

    /// Lengthen the loop by one minute. Ignored while running.
    pub fn add_minute(&self) -> Result<(), String> {
        let countdown = self.lock_countdown()?;
        if countdown.is_some() {
            debug!("add_minute ignored while running");
            return Ok(());
        }
        let loop_seconds = {
            let mut inner = self.lock_inner()?;
            inner.loop_seconds += MINUTE;
            inner.loop_seconds
        };
        drop(countdown);

        self.touch_intent("add-minute");
        self.publish();
        debug!("Loop length set to {}s", loop_seconds);
        Ok(())
    }

    /// Shorten the loop by one minute, never below the minimum. Ignored
    /// while running.
    pub fn sub_minute(&self) -> Result<(), String> {
        let countdown = self.lock_countdown()?;
        if countdown.is_some() {
            debug!("sub_minute ignored while running");
            return Ok(());
        }
        let loop_seconds = {
            let mut inner = self.lock_inner()?;
            if inner.loop_seconds < MIN_LOOP_SECONDS + MINUTE {
                debug!("Loop length already at minimum");
                return Ok(());
            }
            inner.loop_seconds -= MINUTE;
            inner.loop_seconds
        };
        drop(countdown);

        self.touch_intent("sub-minute");
        self.publish();
        debug!("Loop length set to {}s", loop_seconds);
        Ok(())
    }

    /// Set the alert volume, clamped into [0, 1]. Legal in any state; a
    /// live ambient stream follows the new volume immediately.
    pub fn set_volume(&self, volume: f32) -> Result<(), String> {
        let volume = volume.clamp(0.0, 1.0);
        {
            let mut inner = self.lock_inner()?;
            inner.alert_volume = volume;
        }
        self.ambient.set_volume(volume);

        self.touch_intent("set-volume");
        self.publish();
        debug!("Alert volume set to {:.2}", volume);
        Ok(())
    }

    /// Start or stop ambient playback at the current alert volume
    pub async fn toggle_ambient(&self) {
        let volume = self.volume().unwrap_or(DEFAULT_VOLUME);
        self.ambient.toggle(volume).await;
        self.touch_intent("ambient-toggle");
    }

    /// Run the ambient source selection flow and persist the choice
    pub async fn pick_ambient(&self) {
        self.ambient.pick().await;
        self.touch_intent("ambient-pick");
    }

    /// Check if ambient playback is active
    pub fn ambient_playing(&self) -> bool {
        self.ambient.is_playing()
    }

    /// Cancel any pending countdown tick and release ambient playback
    /// without touching the counters. For teardown when the owning
    /// controller goes away.
    pub fn dispose(&self) {
        if let Ok(mut countdown) = self.countdown.lock() {
            if let Some(handle) = countdown.take() {
                handle.cancel();
                debug!("Session disposed, countdown cancelled");
            }
        }
        self.ambient.stop();
    }

    /// Get the current session snapshot
    pub fn snapshot(&self) -> Result<SessionSnapshot, String> {
        let running = self.lock_countdown()?.is_some();
        let inner = self.lock_inner()?;
        Ok(SessionSnapshot {
            loop_seconds: inner.loop_seconds,
            seconds_left: inner.seconds_left,
            lap_count: inner.lap_count,
            running,
            alert_volume: inner.alert_volume,
        })
    }

    /// Check if the countdown is active
    pub fn is_running(&self) -> Result<bool, String> {
        Ok(self.lock_countdown()?.is_some())
    }

    /// Get the configured loop length in seconds
    pub fn loop_seconds(&self) -> Result<u64, String> {
        Ok(self.lock_inner()?.loop_seconds)
    }

    /// Get the live countdown value, if running
    pub fn seconds_left(&self) -> Result<Option<u64>, String> {
        Ok(self.lock_inner()?.seconds_left)
    }

    /// Get the number of completed laps
    pub fn lap_count(&self) -> Result<u64, String> {
        Ok(self.lock_inner()?.lap_count)
    }

    /// Get the alert volume
    pub fn volume(&self) -> Result<f32, String> {
        Ok(self.lock_inner()?.alert_volume)
    }

    /// Get last intent information
    pub fn last_intent(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_intent.lock() {
            Ok(last) => match &*last {
                Some((name, at)) => (Some(name.clone()), Some(*at)),
                None => (None, None),
            },
            Err(_) => (None, None),
        }
    }

    /// Session lifetime as a formatted string
    pub fn uptime(&self) -> String {
        let duration = self.created_at.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Record a tick from the countdown task. Returns false when the tick
    /// belongs to a cancelled countdown and the task should exit.
    pub(crate) fn report_tick(&self, epoch: u64, seconds_left: u64) -> bool {
        {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    warn!("Failed to lock session state on tick: {}", e);
                    return false;
                }
            };
            if inner.epoch != epoch {
                debug!("Discarding tick from cancelled countdown");
                return false;
            }
            inner.seconds_left = Some(seconds_left);
        }
        self.publish();
        true
    }

    /// Record a boundary crossing: emit the lap signal, bump the lap count
    /// and rearm the countdown. Returns the next lap duration, or `None`
    /// when the countdown was cancelled.
    pub(crate) fn lap_boundary(&self, epoch: u64) -> Option<Duration> {
        let (lap, volume, next) = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    warn!("Failed to lock session state at lap boundary: {}", e);
                    return None;
                }
            };
            if inner.epoch != epoch {
                debug!("Discarding boundary from cancelled countdown");
                return None;
            }
            inner.lap_count += 1;
            inner.seconds_left = Some(inner.loop_seconds);
            (
                inner.lap_count,
                inner.alert_volume,
                Duration::from_secs(inner.loop_seconds),
            )
        };

        // Fire-and-forget; the emitter never blocks the countdown
        self.emitter.emit(lap, volume);
        self.publish();
        info!("Lap {} complete, countdown restarting", lap);
        Some(next)
    }

    fn publish(&self) {
        let snapshot = match self.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to build session snapshot: {}", e);
                return;
            }
        };
        if let Err(e) = self.update_tx.send(snapshot) {
            warn!("Failed to send session update: {}", e);
        }
    }

    fn touch_intent(&self, intent: &str) {
        if let Ok(mut last) = self.last_intent.lock() {
            *last = Some((intent.to_string(), Utc::now()));
        }
    }

    fn lock_countdown(&self) -> Result<std::sync::MutexGuard<'_, Option<CountdownHandle>>, String> {
        self.countdown
            .lock()
            .map_err(|e| format!("Failed to lock countdown handle: {}", e))
    }

    fn lock_inner(&self) -> Result<std::sync::MutexGuard<'_, SessionInner>, String> {
        self.inner
            .lock()
            .map_err(|e| format!("Failed to lock session state: {}", e))
    }
}
