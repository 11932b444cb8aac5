//! Background tasks module
//!
//! This module contains the countdown task that drives a running session.

pub mod countdown;

// Re-export main types
pub use countdown::CountdownHandle;
