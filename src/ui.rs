pub mod feedback;
pub mod input;

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::{SpeechError, SynthesisError};
use crate::speech::session::{SpeechRequest, SpeechSession, Status, UiState};
use crate::speech::worker::WorkerReply;
use crate::voice::playback::AudioSubsystem;
use crate::voice::scratch;
use feedback::ButtonVisuals;

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(0x22, 0x22, 0x22);
const INPUT_FILL: egui::Color32 = egui::Color32::from_rgb(0x33, 0x33, 0x33);
const INPUT_STROKE: egui::Color32 = egui::Color32::from_rgb(0x55, 0x55, 0x55);
const TEXT: egui::Color32 = egui::Color32::from_rgb(0xee, 0xee, 0xee);
const MUTED: egui::Color32 = egui::Color32::from_rgb(0xcc, 0xcc, 0xcc);
const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0x66, 0xff, 0x66);
const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(0xff, 0x77, 0x66);

/// Channel pair to the speech worker thread.
#[derive(Resource)]
pub struct SpeechChannel {
    pub tx: UnboundedSender<SpeechRequest>,
    pub rx: Mutex<UnboundedReceiver<WorkerReply>>,
}

#[derive(Resource)]
pub struct FormState {
    pub input_text: String,
    pub slow: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            input_text: String::new(),
            slow: true,
        }
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<FormState>()
            .add_systems(Startup, (spawn_camera, configure_egui))
            .add_systems(
                Update,
                (receive_worker_replies, run_deferred_tasks, speech_form_ui).chain(),
            )
            .add_systems(Last, teardown_on_exit);
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}

fn configure_egui(mut contexts: EguiContexts) {
    let ctx = contexts.ctx_mut();
    let mut style = (*ctx.style()).clone();

    style.visuals.panel_fill = BACKGROUND;
    style.visuals.override_text_color = Some(TEXT);
    style.spacing.item_spacing = egui::vec2(8.0, 15.0);
    style.spacing.button_padding = egui::vec2(10.0, 10.0);

    let rounding = egui::Rounding::same(8.0);
    let widgets = &mut style.visuals.widgets;
    widgets.inactive.weak_bg_fill = ButtonVisuals::STATIC.fill;
    widgets.inactive.bg_stroke = egui::Stroke::new(1.0, ButtonVisuals::STATIC.stroke);
    widgets.inactive.rounding = rounding;
    widgets.hovered.weak_bg_fill = ButtonVisuals::HOVER_FILL;
    widgets.hovered.bg_stroke = egui::Stroke::new(1.0, ButtonVisuals::STATIC.stroke);
    widgets.hovered.rounding = rounding;
    widgets.active.rounding = rounding;
    widgets.noninteractive.rounding = rounding;

    ctx.set_style(style);
}

/// Handle audio (or failures) coming back from the worker.
fn receive_worker_replies(
    channel: Option<Res<SpeechChannel>>,
    mut session: ResMut<SpeechSession>,
    mut audio: Option<NonSendMut<AudioSubsystem>>,
    time: Res<Time<Real>>,
) {
    let Some(chan) = channel else {
        return;
    };
    let Ok(mut rx) = chan.rx.try_lock() else {
        return;
    };
    let now = time.elapsed();

    while let Ok(reply) = rx.try_recv() {
        handle_reply(&mut session, audio.as_deref_mut(), reply, now);
    }
}

fn handle_reply(
    session: &mut SpeechSession,
    audio: Option<&mut AudioSubsystem>,
    reply: WorkerReply,
    now: Duration,
) {
    match reply {
        WorkerReply::Ready { id, path } => {
            if !session.artifact_created(id, path.clone(), now) {
                return;
            }
            let started = match audio {
                Some(audio) => audio.play(&path),
                None => Err(SpeechError::Playback("no audio output device".into())),
            };
            match started {
                Ok(duration) => session.playback_started(id, duration, now),
                Err(error) => session.fail(id, &error, now),
            }
        }
        WorkerReply::Failed { id, error } => session.fail(id, &error, now),
    }
}

fn run_deferred_tasks(mut session: ResMut<SpeechSession>, time: Res<Time<Real>>) {
    for path in session.poll(time.elapsed()) {
        remove_scratch_logged(&path);
    }
}

fn speech_form_ui(
    mut contexts: EguiContexts,
    mut form: ResMut<FormState>,
    mut session: ResMut<SpeechSession>,
    channel: Option<Res<SpeechChannel>>,
    time: Res<Time<Real>>,
) {
    let now = time.elapsed();
    let ctx = contexts.ctx_mut();

    egui::CentralPanel::default()
        .frame(
            egui::Frame::none()
                .fill(BACKGROUND)
                .inner_margin(egui::Margin::same(20.0)),
        )
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new("🗣️  Enter German text below:")
                    .strong()
                    .size(16.0),
            );

            // Enter = speak, Shift+Enter = newline
            let input_id = egui::Id::new("speech_input");
            let enter_pressed = input::capture_enter(ui, input_id);

            egui::Frame::none()
                .fill(INPUT_FILL)
                .rounding(egui::Rounding::same(8.0))
                .stroke(egui::Stroke::new(1.0, INPUT_STROKE))
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut form.input_text)
                            .id(input_id)
                            .hint_text("Zum Beispiel: Wie heißt du?")
                            .font(egui::TextStyle::Body)
                            .frame(false)
                            .desired_width(f32::INFINITY)
                            .desired_rows(6)
                            .lock_focus(true),
                    );
                });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.checkbox(
                    &mut form.slow,
                    egui::RichText::new("🕓 Slow voice (0.7x speed)").color(MUTED),
                );
            });

            let label = egui::RichText::new("▶ Speak").strong();
            let button = match session.feedback().visuals(now) {
                Some(visuals) => egui::Button::new(label.color(visuals.text))
                    .fill(visuals.fill)
                    .stroke(egui::Stroke::new(1.0, visuals.stroke)),
                None => egui::Button::new(label),
            }
            .min_size(egui::vec2(120.0, 0.0));

            let clicked = ui
                .vertical_centered(|ui| {
                    ui.add_enabled(session.is_submit_enabled(), button)
                        .clicked()
                })
                .inner;

            if clicked || enter_pressed {
                submit(&mut session, &form, channel.as_deref(), now);
            }

            let status = session.status();
            let color = match status {
                Status::Error(_) => STATUS_ERROR,
                _ => STATUS_OK,
            };
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(status.label()).italics().color(color));
            });
        });

    if session.state() == UiState::Speaking {
        ctx.request_repaint();
    }
}

fn submit(
    session: &mut SpeechSession,
    form: &FormState,
    channel: Option<&SpeechChannel>,
    now: Duration,
) {
    let Some(request) = session.submit(&form.input_text, form.slow, now) else {
        return;
    };
    let id = request.id;

    let sent = channel.is_some_and(|chan| chan.tx.send(request).is_ok());
    if !sent {
        session.fail(
            id,
            &SpeechError::Synthesis(SynthesisError::WorkerUnavailable),
            now,
        );
    }
}

/// Stop audio and delete pending scratch files when the window closes,
/// including audio the worker delivered but the UI never picked up.
fn teardown_on_exit(
    mut exits: EventReader<AppExit>,
    mut session: ResMut<SpeechSession>,
    channel: Option<Res<SpeechChannel>>,
    audio: Option<NonSendMut<AudioSubsystem>>,
) {
    if exits.read().next().is_none() {
        return;
    }

    if let Some(mut audio) = audio {
        audio.shutdown();
    }

    let mut leftovers = session.drain_cleanups();
    if let Some(chan) = &channel {
        if let Ok(mut rx) = chan.rx.lock() {
            leftovers.extend(undelivered_audio(&mut rx));
        }
    }
    for path in leftovers {
        remove_scratch_logged(&path);
    }
}

/// Scratch paths of `Ready` replies still queued in `rx`.
fn undelivered_audio(rx: &mut UnboundedReceiver<WorkerReply>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    while let Ok(reply) = rx.try_recv() {
        if let WorkerReply::Ready { path, .. } = reply {
            paths.push(path);
        }
    }
    paths
}

fn remove_scratch_logged(path: &Path) {
    if let Err(e) = scratch::remove_scratch(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch audio");
    }
}
