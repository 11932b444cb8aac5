//! State management module
//!
//! This module contains the session state machine, its observable snapshot
//! and the ambient sound controller.

pub mod ambient;
pub mod session;
pub mod snapshot;

// Re-export main types
pub use ambient::AmbientSound;
pub use session::Session;
pub use snapshot::SessionSnapshot;
