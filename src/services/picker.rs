//! Ambient source selection
//!
//! Picking a source is an interactive platform flow (a document picker, a
//! file dialog); the crate only defines the boundary and a headless
//! stand-in.

use async_trait::async_trait;
use tracing::debug;

/// External source selection flow. Returns an opaque reference to the
/// chosen resource, or `None` when the user cancels.
#[async_trait]
pub trait SourcePicker: Send + Sync {
    async fn pick(&self, mime_filter: &str) -> Option<String>;
}

/// Picker used by the headless binary: there is no interactive flow, so
/// every request comes back empty.
pub struct NoPicker;

#[async_trait]
impl SourcePicker for NoPicker {
    async fn pick(&self, mime_filter: &str) -> Option<String> {
        debug!("No source picker wired for {} selection", mime_filter);
        None
    }
}
