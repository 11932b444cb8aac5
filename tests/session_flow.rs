//! End-to-end countdown scenarios, driven deterministically under paused
//! tokio time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gong_timer::services::{MemoryStore, NoPicker, SignalEmitter, SilentPlayer};
use gong_timer::state::{AmbientSound, Session};

/// Emitter that records every signal together with the volume it carried
#[derive(Default)]
struct RecordingSignal {
    emitted: Mutex<Vec<(u64, f32)>>,
}

impl RecordingSignal {
    fn emitted(&self) -> Vec<(u64, f32)> {
        self.emitted.lock().unwrap().clone()
    }
}

impl SignalEmitter for RecordingSignal {
    fn emit(&self, lap: u64, volume: f32) {
        self.emitted.lock().unwrap().push((lap, volume));
    }
}

fn recording_session(loop_seconds: u64) -> (Arc<Session>, Arc<RecordingSignal>) {
    let signal = Arc::new(RecordingSignal::default());
    let ambient = AmbientSound::new(
        Arc::new(SilentPlayer),
        Arc::new(NoPicker),
        Arc::new(MemoryStore::default()),
    );
    let session = Session::with_config(loop_seconds, 0.5, signal.clone(), ambient);
    (session, signal)
}

/// Let the freshly spawned countdown task register its timer before the
/// clock is moved
async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

async fn step_seconds(n: u64) {
    for _ in 0..n {
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn sixty_second_loop_completes_one_lap_and_repeats() {
    let (session, signal) = recording_session(60);
    session.start().unwrap();
    settle().await;

    step_seconds(59).await;
    assert_eq!(session.seconds_left().unwrap(), Some(1));
    assert!(signal.emitted().is_empty());

    step_seconds(1).await;
    assert_eq!(signal.emitted(), vec![(1, 0.5)]);
    assert_eq!(session.lap_count().unwrap(), 1);
    assert_eq!(session.seconds_left().unwrap(), Some(60));
    assert!(session.is_running().unwrap());
}

#[tokio::test(start_paused = true)]
async fn countdown_decreases_monotonically() {
    let (session, _signal) = recording_session(120);
    session.start().unwrap();
    settle().await;

    let mut previous = session.seconds_left().unwrap().unwrap();
    assert_eq!(previous, 120);
    for _ in 0..30 {
        step_seconds(1).await;
        let current = session.seconds_left().unwrap().unwrap();
        assert!(current < previous, "{} did not decrease from {}", current, previous);
        previous = current;
    }
    assert_eq!(previous, 90);
}

#[tokio::test(start_paused = true)]
async fn laps_accumulate_across_boundaries() {
    let (session, signal) = recording_session(60);
    session.start().unwrap();
    settle().await;

    step_seconds(180).await;
    assert_eq!(signal.emitted(), vec![(1, 0.5), (2, 0.5), (3, 0.5)]);
    assert_eq!(session.lap_count().unwrap(), 3);
    assert!(session.is_running().unwrap());
}

#[tokio::test(start_paused = true)]
async fn second_start_does_not_restart_the_countdown() {
    let (session, signal) = recording_session(60);
    session.start().unwrap();
    settle().await;
    step_seconds(10).await;

    session.start().unwrap();
    assert_eq!(session.seconds_left().unwrap(), Some(50));

    step_seconds(50).await;
    assert_eq!(signal.emitted(), vec![(1, 0.5)]);
    assert_eq!(session.lap_count().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_ticks() {
    let (session, signal) = recording_session(60);
    session.start().unwrap();
    settle().await;
    step_seconds(5).await;

    session.stop().unwrap();
    step_seconds(120).await;

    assert!(signal.emitted().is_empty());
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.seconds_left, None);
    assert_eq!(snapshot.lap_count, 0);
    assert!(!snapshot.running);
}

#[tokio::test(start_paused = true)]
async fn volume_change_mid_lap_applies_to_the_next_signal() {
    let (session, signal) = recording_session(60);
    session.start().unwrap();
    settle().await;

    step_seconds(30).await;
    session.set_volume(0.3).unwrap();
    step_seconds(30).await;

    assert_eq!(signal.emitted(), vec![(1, 0.3)]);
}

#[tokio::test(start_paused = true)]
async fn dispose_halts_ticking() {
    let (session, signal) = recording_session(60);
    session.start().unwrap();
    settle().await;
    step_seconds(10).await;

    session.dispose();
    step_seconds(120).await;

    assert!(signal.emitted().is_empty());
    assert_eq!(session.seconds_left().unwrap(), Some(50));
}

#[tokio::test(start_paused = true)]
async fn dropped_session_stops_emitting() {
    let (session, signal) = recording_session(60);
    session.start().unwrap();
    settle().await;
    step_seconds(10).await;

    drop(session);
    step_seconds(120).await;

    assert!(signal.emitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn watchers_observe_every_mutation() {
    let (session, _signal) = recording_session(60);
    let mut updates = session.subscribe();

    session.start().unwrap();
    settle().await;
    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert!(snapshot.is_running());
    assert_eq!(snapshot.seconds_left, Some(60));
    assert_eq!(snapshot.display_seconds(), 60);

    step_seconds(1).await;
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.seconds_left, Some(59));

    session.stop().unwrap();
    let snapshot = updates.borrow_and_update().clone();
    assert!(!snapshot.running);
    assert_eq!(snapshot.display_seconds(), 60);
}
