//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "gong-timer")]
#[command(about = "A meditation interval timer that counts laps out loud")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Loop length in minutes
    #[arg(short, long, default_value = "2")]
    pub minutes: u64,

    /// Alert volume between 0.0 and 1.0
    #[arg(long, default_value = "0.5")]
    pub volume: f32,

    /// Preselect an ambient sound source (path or URI)
    #[arg(long)]
    pub ambient_sound: Option<String>,

    /// Gong sound file played at each lap boundary (requires the audio feature)
    #[arg(long)]
    pub gong: Option<PathBuf>,

    /// Settings file location
    #[arg(long)]
    pub settings_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Loop length in whole seconds
    pub fn loop_seconds(&self) -> u64 {
        self.minutes.max(1) * 60
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
