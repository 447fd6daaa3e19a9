mod config;
mod error;
mod speech;
mod ui;
mod voice;

use anyhow::Result;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::winit::{UpdateMode, WinitSettings};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::filter::LevelFilter;

use crate::config::AppConfig;
use crate::speech::session::{SpeechRequest, SpeechSession};
use crate::speech::worker::{run_speech_worker, WorkerReply};
use crate::ui::{SpeechChannel, UiPlugin};
use crate::voice::playback::AudioSubsystem;
use crate::voice::tts::GoogleTts;

fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    tracing::info!(tld = %config.tld, cleanup = ?config.cleanup_delay, "Starting Sprachtrainer");

    let (ui_tx, worker_rx) = mpsc::unbounded_channel::<SpeechRequest>();
    let (worker_tx, ui_rx) = mpsc::unbounded_channel::<WorkerReply>();

    // 1. Speech worker on its own runtime thread
    let synthesizer = Arc::new(GoogleTts::new(&config)?);
    let scratch_dir = config.scratch_dir.clone();
    let runtime = tokio::runtime::Runtime::new()?;
    thread::Builder::new()
        .name("speech-worker".into())
        .spawn(move || {
            runtime.block_on(run_speech_worker(
                synthesizer,
                scratch_dir,
                worker_rx,
                worker_tx,
            ));
        })?;

    // 2. Audio output, owned by the app and torn down on exit
    let audio = match AudioSubsystem::open() {
        Ok(audio) => Some(audio),
        Err(e) => {
            tracing::warn!(error = %e, "Audio output unavailable, playback will fail");
            None
        }
    };

    // 3. Bevy app on the main thread
    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "German TTS - Sprachtrainer 🇩🇪".into(),
                    resolution: (520., 360.).into(),
                    ..default()
                }),
                ..default()
            })
            .disable::<LogPlugin>(),
    )
    .insert_resource(WinitSettings {
        focused_mode: UpdateMode::Continuous,
        unfocused_mode: UpdateMode::ReactiveLowPower {
            wait: Duration::from_millis(50),
        },
        ..default()
    })
    .add_plugins(UiPlugin)
    .insert_resource(SpeechChannel {
        tx: ui_tx,
        rx: Mutex::new(ui_rx),
    })
    .insert_resource(SpeechSession::new(
        config.cleanup_delay,
        config.error_display,
    ));

    if let Some(audio) = audio {
        app.insert_non_send_resource(audio);
    }

    app.run();
    Ok(())
}

/// Log level comes from `SPRACHTRAINER_LOG`, default `info`.
fn init_tracing() {
    let level = std::env::var("SPRACHTRAINER_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
