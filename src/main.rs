//! Gong Timer - a meditation interval timer
//!
//! This is the main entry point for the gong-timer application. It acts
//! as the owning controller: it constructs the session once, starts it,
//! renders state updates to the log, and stops the session on shutdown.

use std::sync::Arc;

use tracing::{error, info, warn};

use gong_timer::{
    config::Config,
    services::{
        check_speech_available, AmbientPlayer, JsonFileStore, NoPicker, SettingsStore,
        SignalEmitter, SilentSignal, SpokenSignal,
    },
    state::{ambient::AMBIENT_SOURCE_KEY, AmbientSound, Session},
    utils::{seconds_to_digital_time, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("gong_timer={}", config.log_level()))
        .init();

    info!("Starting gong-timer v1.0.0");
    info!(
        "Configuration: loop={}s, volume={:.2}",
        config.loop_seconds(),
        config.volume
    );

    let settings_path = config
        .settings_file
        .clone()
        .unwrap_or_else(JsonFileStore::default_path);
    let settings: Arc<dyn SettingsStore> = match JsonFileStore::open(&settings_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Cannot open settings file {}: {}", settings_path.display(), e);
            std::process::exit(1);
        }
    };
    if let Some(source) = &config.ambient_sound {
        if let Err(e) = settings.set(AMBIENT_SOURCE_KEY, source) {
            warn!("Failed to preselect ambient source: {}", e);
        }
    }

    let emitter = build_emitter(&config).await;
    let ambient = AmbientSound::new(build_player(), Arc::new(NoPicker), settings);

    // Create the session and start the countdown
    let session = Session::with_config(config.loop_seconds(), config.volume, emitter, ambient);
    if let Err(e) = session.start() {
        error!("Cannot start countdown: {}", e);
        std::process::exit(1);
    }

    // Render session updates until a shutdown signal arrives
    let mut updates = session.subscribe();
    tokio::select! {
        _ = async {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                let time = seconds_to_digital_time(snapshot.display_seconds());
                if snapshot.lap_count >= 1 {
                    info!("{}  laps: {}", time, snapshot.lap_count);
                } else {
                    info!("{}", time);
                }
            }
        } => {}
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = session.stop() {
        warn!("Failed to stop session: {}", e);
    }
    session.dispose();
    info!("Session ran for {}", session.uptime());
    info!("Shutdown complete");
    Ok(())
}

/// Pick the best available signal emitter, degrading to speech-only and
/// then to silence so the countdown always runs.
async fn build_emitter(config: &Config) -> Arc<dyn SignalEmitter> {
    #[cfg(feature = "audio")]
    if let Some(gong) = &config.gong {
        match gong_timer::services::GongSignal::new(gong) {
            Ok(signal) => return Arc::new(signal),
            Err(e) => warn!("Gong sound unusable, falling back to speech: {}", e),
        }
    }
    #[cfg(not(feature = "audio"))]
    if config.gong.is_some() {
        warn!("Built without the audio feature; --gong is ignored");
    }

    match check_speech_available().await {
        Ok(()) => Arc::new(SpokenSignal),
        Err(e) => {
            warn!("{}", e);
            Arc::new(SilentSignal)
        }
    }
}

fn build_player() -> Arc<dyn AmbientPlayer> {
    #[cfg(feature = "audio")]
    {
        Arc::new(gong_timer::services::RodioPlayer)
    }
    #[cfg(not(feature = "audio"))]
    {
        Arc::new(gong_timer::services::SilentPlayer)
    }
}
