//! Utility functions module
//!
//! This module contains utility functions used throughout the application.

pub mod format;
pub mod signals;

// Re-export main functions
pub use format::seconds_to_digital_time;
pub use signals::shutdown_signal;
