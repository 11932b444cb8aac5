//! Ambient sound controller
//!
//! Looped background audio with a lifecycle independent of the countdown.
//! The selected source is persisted under a single settings key so it
//! survives process restarts. Playback failures are logged here and never
//! reach the session.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::services::ambient::{AmbientPlayer, PlaybackHandle};
use crate::services::picker::SourcePicker;
use crate::services::settings::SettingsStore;

/// Settings key holding the chosen ambient source reference
pub const AMBIENT_SOURCE_KEY: &str = "ambient-source";
/// Picker filter for ambient sources
pub const AMBIENT_MIME_FILTER: &str = "audio/*";

/// Ambient background sound state and control
pub struct AmbientSound {
    player: Arc<dyn AmbientPlayer>,
    picker: Arc<dyn SourcePicker>,
    settings: Arc<dyn SettingsStore>,
    playback: Mutex<Option<Box<dyn PlaybackHandle>>>,
}

impl AmbientSound {
    /// Create an ambient sound controller over the given collaborators
    pub fn new(
        player: Arc<dyn AmbientPlayer>,
        picker: Arc<dyn SourcePicker>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            player,
            picker,
            settings,
            playback: Mutex::new(None),
        }
    }

    /// Check if ambient playback is active
    pub fn is_playing(&self) -> bool {
        self.playback
            .lock()
            .map(|playback| playback.is_some())
            .unwrap_or(false)
    }

    /// Start or stop looped playback. With no source selected yet, runs
    /// the selection flow first and starts playback if a source was chosen.
    pub async fn toggle(&self, volume: f32) {
        let stopped = match self.playback.lock() {
            Ok(mut playback) => playback.take(),
            Err(e) => {
                warn!("Failed to lock ambient playback state: {}", e);
                return;
            }
        };
        if let Some(handle) = stopped {
            handle.stop();
            info!("Ambient playback stopped");
            return;
        }

        let source = match self.source() {
            Some(source) => Some(source),
            None => self.pick().await,
        };
        let Some(source) = source else {
            debug!("No ambient source selected");
            return;
        };
        self.play(&source, volume);
    }

    /// Run the source selection flow and persist the choice
    pub async fn pick(&self) -> Option<String> {
        let source = self.picker.pick(AMBIENT_MIME_FILTER).await?;
        if let Err(e) = self.settings.set(AMBIENT_SOURCE_KEY, &source) {
            warn!("Failed to persist ambient source: {}", e);
        }
        info!("Ambient source selected: {}", source);
        Some(source)
    }

    /// Get the persisted source reference, if one was ever chosen
    pub fn source(&self) -> Option<String> {
        self.settings
            .get(AMBIENT_SOURCE_KEY)
            .filter(|source| !source.is_empty())
    }

    /// Re-apply the alert volume to a live ambient stream
    pub fn set_volume(&self, volume: f32) {
        if let Ok(playback) = self.playback.lock() {
            if let Some(handle) = playback.as_ref() {
                handle.set_volume(volume);
            }
        }
    }

    /// Stop playback if active
    pub fn stop(&self) {
        if let Ok(mut playback) = self.playback.lock() {
            if let Some(handle) = playback.take() {
                handle.stop();
                info!("Ambient playback stopped");
            }
        }
    }

    fn play(&self, source: &str, volume: f32) {
        match self.player.play_looped(source, volume) {
            Ok(handle) => {
                if let Ok(mut playback) = self.playback.lock() {
                    *playback = Some(handle);
                    info!("Ambient playback started: {}", source);
                }
            }
            Err(e) => {
                warn!("Ambient playback failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ambient::{PlaybackError, SilentPlayer};
    use crate::services::settings::MemoryStore;

    use async_trait::async_trait;

    struct StaticPicker(Option<String>);

    #[async_trait]
    impl SourcePicker for StaticPicker {
        async fn pick(&self, _mime_filter: &str) -> Option<String> {
            self.0.clone()
        }
    }

    struct BrokenPlayer;

    impl AmbientPlayer for BrokenPlayer {
        fn play_looped(
            &self,
            source: &str,
            _volume: f32,
        ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
            Err(PlaybackError::Source {
                source_ref: source.to_string(),
                reason: "not a sound file".to_string(),
            })
        }
    }

    fn ambient_with(picker: StaticPicker, settings: Arc<MemoryStore>) -> AmbientSound {
        AmbientSound::new(Arc::new(SilentPlayer), Arc::new(picker), settings)
    }

    #[tokio::test]
    async fn toggle_without_source_runs_the_picker_and_plays() {
        let settings = Arc::new(MemoryStore::default());
        let ambient = ambient_with(
            StaticPicker(Some("waves.ogg".to_string())),
            Arc::clone(&settings),
        );

        ambient.toggle(0.5).await;
        assert!(ambient.is_playing());
        assert_eq!(
            settings.get(AMBIENT_SOURCE_KEY).as_deref(),
            Some("waves.ogg")
        );
    }

    #[tokio::test]
    async fn cancelled_picker_leaves_playback_off() {
        let ambient = ambient_with(StaticPicker(None), Arc::new(MemoryStore::default()));
        ambient.toggle(0.5).await;
        assert!(!ambient.is_playing());
    }

    #[tokio::test]
    async fn toggle_twice_stops_playback() {
        let settings = Arc::new(MemoryStore::default());
        settings.set(AMBIENT_SOURCE_KEY, "waves.ogg").unwrap();
        let ambient = ambient_with(StaticPicker(None), settings);

        ambient.toggle(0.5).await;
        assert!(ambient.is_playing());
        ambient.toggle(0.5).await;
        assert!(!ambient.is_playing());
    }

    #[tokio::test]
    async fn empty_persisted_source_counts_as_none() {
        let settings = Arc::new(MemoryStore::default());
        settings.set(AMBIENT_SOURCE_KEY, "").unwrap();
        let ambient = ambient_with(StaticPicker(None), settings);

        assert_eq!(ambient.source(), None);
        ambient.toggle(0.5).await;
        assert!(!ambient.is_playing());
    }

    #[tokio::test]
    async fn playback_failure_is_contained() {
        let settings = Arc::new(MemoryStore::default());
        settings.set(AMBIENT_SOURCE_KEY, "broken.ogg").unwrap();
        let ambient = AmbientSound::new(Arc::new(BrokenPlayer), Arc::new(StaticPicker(None)), settings);

        ambient.toggle(0.5).await;
        assert!(!ambient.is_playing());
    }

    #[test]
    fn set_volume_without_playback_is_a_noop() {
        let ambient = ambient_with(StaticPicker(None), Arc::new(MemoryStore::default()));
        ambient.set_volume(0.8);
        assert!(!ambient.is_playing());
    }
}
