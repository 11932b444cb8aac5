//! External collaborator module
//!
//! This module contains the narrow interfaces to everything outside the
//! timer itself: signal emission, ambient playback, settings persistence
//! and source selection.

pub mod ambient;
pub mod picker;
pub mod settings;
pub mod signal;

// Re-export main types
pub use ambient::{AmbientPlayer, PlaybackError, PlaybackHandle, SilentPlayer};
pub use picker::{NoPicker, SourcePicker};
pub use settings::{JsonFileStore, MemoryStore, SettingsError, SettingsStore};
pub use signal::{check_speech_available, SignalEmitter, SilentSignal, SpokenSignal};

#[cfg(feature = "audio")]
pub use ambient::RodioPlayer;
#[cfg(feature = "audio")]
pub use signal::GongSignal;
