//! Gong Timer - a state-managed meditation interval timer
//!
//! This library provides a countdown session that repeats a configurable
//! loop, signals each completed lap with a gong tone and a spoken count,
//! and keeps an optional ambient sound running independently of the timer.

pub mod config;
pub mod state;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AmbientSound, Session, SessionSnapshot};
pub use services::SignalEmitter;
pub use utils::format::seconds_to_digital_time;
pub use utils::signals::shutdown_signal;
