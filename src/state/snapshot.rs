//! Observable session snapshot

use serde::{Deserialize, Serialize};

/// Point-in-time view of the session, published to watchers on every
/// mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Configured loop length in seconds
    pub loop_seconds: u64,
    /// Live countdown value; `None` while the session is stopped
    pub seconds_left: Option<u64>,
    /// Completed intervals since the last start
    pub lap_count: u64,
    /// Whether an active countdown exists
    pub running: bool,
    /// Alert volume in [0, 1]
    pub alert_volume: f32,
}

impl SessionSnapshot {
    /// Create a snapshot of a stopped session
    pub fn idle(loop_seconds: u64, alert_volume: f32) -> Self {
        Self {
            loop_seconds,
            seconds_left: None,
            lap_count: 0,
            running: false,
            alert_volume,
        }
    }

    /// Seconds the display should show: the live countdown while running,
    /// the configured loop length otherwise
    pub fn display_seconds(&self) -> u64 {
        self.seconds_left.unwrap_or(self.loop_seconds)
    }

    /// Check if the countdown is active
    pub fn is_running(&self) -> bool {
        self.running
    }
}
