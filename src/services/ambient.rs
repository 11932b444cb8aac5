//! Ambient playback backends
//!
//! Looped playback of an opaque, user-chosen audio source. The backend
//! hands out a handle that supports live volume changes and an explicit
//! stop; everything else about the stream stays inside the backend.

use thiserror::Error;
use tracing::{debug, info};

/// Errors from starting ambient playback
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Selected source could not be opened or decoded
    #[error("unreadable ambient source {source_ref}: {reason}")]
    Source { source_ref: String, reason: String },

    /// No usable audio output device
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// Live control over one looped playback stream
pub trait PlaybackHandle: Send {
    /// Re-apply volume without restarting playback
    fn set_volume(&self, volume: f32);

    /// Stop playback and release the stream
    fn stop(self: Box<Self>);
}

/// Starts looped playback of an opaque source reference
pub trait AmbientPlayer: Send + Sync {
    fn play_looped(
        &self,
        source: &str,
        volume: f32,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}

/// Backend used when the `audio` feature is disabled: playback state is
/// tracked and logged, nothing reaches a sound device.
pub struct SilentPlayer;

struct SilentHandle;

impl PlaybackHandle for SilentHandle {
    fn set_volume(&self, volume: f32) {
        debug!("Ambient volume set to {:.2}, no audio backend", volume);
    }

    fn stop(self: Box<Self>) {
        debug!("Ambient playback stopped, no audio backend");
    }
}

impl AmbientPlayer for SilentPlayer {
    fn play_looped(
        &self,
        source: &str,
        volume: f32,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        info!("Ambient playback of {} at {:.2}, no audio backend", source, volume);
        Ok(Box::new(SilentHandle))
    }
}

#[cfg(feature = "audio")]
pub use rodio_backend::RodioPlayer;

#[cfg(feature = "audio")]
mod rodio_backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::time::Duration;

    use crossbeam_channel::{bounded, Sender};
    use tracing::{debug, warn};

    use super::{AmbientPlayer, PlaybackError, PlaybackHandle};

    enum PlayerCmd {
        Volume(f32),
        Stop,
    }

    /// Looped playback through rodio. Each stream runs on a dedicated
    /// thread owning the output device; the handle talks to it over a
    /// command channel.
    pub struct RodioPlayer;

    struct RodioHandle {
        cmd_tx: Sender<PlayerCmd>,
    }

    impl PlaybackHandle for RodioHandle {
        fn set_volume(&self, volume: f32) {
            if self.cmd_tx.try_send(PlayerCmd::Volume(volume)).is_err() {
                warn!("Ambient playback thread is gone");
            }
        }

        fn stop(self: Box<Self>) {
            let _ = self.cmd_tx.try_send(PlayerCmd::Stop);
        }
    }

    impl AmbientPlayer for RodioPlayer {
        fn play_looped(
            &self,
            source: &str,
            volume: f32,
        ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
            let file = File::open(source).map_err(|e| PlaybackError::Source {
                source_ref: source.to_string(),
                reason: e.to_string(),
            })?;

            let source_ref = source.to_string();
            let (cmd_tx, cmd_rx) = bounded::<PlayerCmd>(8);
            let (ready_tx, ready_rx) = bounded::<Result<(), PlaybackError>>(1);

            std::thread::spawn(move || {
                use rodio::{Decoder, OutputStream, Sink, Source};

                let (_stream, stream_handle) = match OutputStream::try_default() {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(PlaybackError::Output(e.to_string())));
                        return;
                    }
                };
                let decoded = match Decoder::new(BufReader::new(file)) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        let _ = ready_tx.send(Err(PlaybackError::Source {
                            source_ref,
                            reason: e.to_string(),
                        }));
                        return;
                    }
                };
                let sink = match Sink::try_new(&stream_handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(PlaybackError::Output(e.to_string())));
                        return;
                    }
                };

                sink.set_volume(volume);
                sink.append(decoded.repeat_infinite());
                let _ = ready_tx.send(Ok(()));

                loop {
                    match cmd_rx.recv() {
                        Ok(PlayerCmd::Volume(v)) => sink.set_volume(v),
                        Ok(PlayerCmd::Stop) | Err(_) => {
                            sink.stop();
                            debug!("Ambient playback thread exiting");
                            return;
                        }
                    }
                }
            });

            match ready_rx.recv_timeout(Duration::from_secs(2)) {
                Ok(Ok(())) => Ok(Box::new(RodioHandle { cmd_tx })),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(PlaybackError::Output(
                    "playback thread did not start".to_string(),
                )),
            }
        }
    }
}
