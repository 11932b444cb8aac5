//! Lap signal emission
//!
//! A boundary signal is a short tone plus the lap number spoken aloud,
//! both scaled by the alert volume. Emission never blocks the countdown
//! and never reports playback failures back to the session; they are
//! logged here instead.

use tokio::process::Command;
use tracing::{debug, info, warn};

/// Emits the boundary signal for a completed lap.
///
/// Implementations must return immediately; audio and speech run on their
/// own threads or tasks.
pub trait SignalEmitter: Send + Sync {
    fn emit(&self, lap: u64, volume: f32);
}

/// Speaks the lap number through the system speech synthesizer
pub struct SpokenSignal;

impl SignalEmitter for SpokenSignal {
    fn emit(&self, lap: u64, volume: f32) {
        speak_number(lap, volume);
    }
}

/// Drops every signal, keeping only a log line. Used when no speech
/// engine is available so the countdown still runs and renders.
pub struct SilentSignal;

impl SignalEmitter for SilentSignal {
    fn emit(&self, lap: u64, _volume: f32) {
        debug!("Signal for lap {} suppressed, no audio backend", lap);
    }
}

/// Amplitude range of the espeak synthesizer
const SPEECH_AMPLITUDE_MAX: f32 = 200.0;

fn speak_number(lap: u64, volume: f32) {
    let amplitude = (volume.clamp(0.0, 1.0) * SPEECH_AMPLITUDE_MAX).round() as u32;
    tokio::spawn(async move {
        let result = Command::new("espeak")
            .args(["-a", &amplitude.to_string(), &lap.to_string()])
            .output()
            .await;
        match result {
            Ok(output) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("Speech synthesis exited with {}: {}", output.status, stderr.trim());
            }
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
            }
            _ => {}
        }
    });
}

/// Check if a speech synthesizer is available on the system
pub async fn check_speech_available() -> Result<(), String> {
    Command::new("espeak")
        .arg("--version")
        .output()
        .await
        .map_err(|_| "espeak is not available. Lap numbers will not be spoken.".to_string())?;

    info!("espeak is available");
    Ok(())
}

#[cfg(feature = "audio")]
pub use gong::GongSignal;

#[cfg(feature = "audio")]
mod gong {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    use tracing::warn;

    use super::{speak_number, SignalEmitter};
    use crate::services::ambient::PlaybackError;

    /// Plays a gong tone from a sound file, then speaks the lap number
    pub struct GongSignal {
        sound_path: PathBuf,
    }

    impl GongSignal {
        /// Fails if the sound file cannot be opened; callers are expected
        /// to fall back to a speech-only emitter.
        pub fn new(sound_path: impl AsRef<Path>) -> Result<Self, PlaybackError> {
            let sound_path = sound_path.as_ref().to_path_buf();
            File::open(&sound_path).map_err(|e| PlaybackError::Source {
                source_ref: sound_path.display().to_string(),
                reason: e.to_string(),
            })?;
            Ok(Self { sound_path })
        }
    }

    impl SignalEmitter for GongSignal {
        fn emit(&self, lap: u64, volume: f32) {
            let path = self.sound_path.clone();
            let gain = volume.clamp(0.0, 1.0);
            std::thread::spawn(move || {
                use rodio::{Decoder, OutputStream, Sink};

                let Ok((_stream, stream_handle)) = OutputStream::try_default() else {
                    warn!("No audio output available for the gong tone");
                    return;
                };
                let Ok(file) = File::open(&path) else {
                    warn!("Gong sound disappeared: {}", path.display());
                    return;
                };
                let Ok(source) = Decoder::new(BufReader::new(file)) else {
                    warn!("Gong sound is not decodable: {}", path.display());
                    return;
                };
                let Ok(sink) = Sink::try_new(&stream_handle) else {
                    return;
                };
                sink.set_volume(gain);
                sink.append(source);
                sink.sleep_until_end();
            });
            speak_number(lap, volume);
        }
    }
}
