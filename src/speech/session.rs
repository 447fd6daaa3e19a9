//! Speak-request lifecycle on the UI thread.
//!
//! All times are elapsed durations from one monotonic clock (bevy's real
//! time in the app, plain values in tests). Deferred work lives in an
//! explicit schedule that the UI polls every frame.

use bevy::prelude::Resource;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SpeechError;
use crate::ui::feedback::PulseAnimation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Speaking,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Clear,
    Speaking,
    Error(String),
}

impl Status {
    pub fn label(&self) -> &str {
        match self {
            Status::Clear => "",
            Status::Speaking => "🔊 Speaking...",
            Status::Error(message) => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub id: u64,
    pub text: String,
    pub slow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Deferred {
    /// Playback of request `id` should be over.
    Complete { id: u64 },
    DeleteScratch(PathBuf),
    /// Error status of request `id` has been shown long enough.
    ClearStatus { id: u64 },
}

#[derive(Debug)]
struct Scheduled {
    due: Duration,
    task: Deferred,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: u64,
    submitted_at: Duration,
}

#[derive(Resource)]
pub struct SpeechSession {
    state: UiState,
    status: Status,
    feedback: PulseAnimation,
    in_flight: Option<InFlight>,
    last_error: Option<u64>,
    next_id: u64,
    schedule: Vec<Scheduled>,
    cleanup_delay: Duration,
    error_display: Duration,
}

impl SpeechSession {
    pub fn new(cleanup_delay: Duration, error_display: Duration) -> Self {
        Self {
            state: UiState::Idle,
            status: Status::Clear,
            feedback: PulseAnimation::default(),
            in_flight: None,
            last_error: None,
            next_id: 1,
            schedule: Vec::new(),
            cleanup_delay,
            error_display,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn feedback(&self) -> &PulseAnimation {
        &self.feedback
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.state == UiState::Idle
    }

    /// Start a new request. Returns `None` (and changes nothing) for blank
    /// text or while another request is in flight.
    pub fn submit(&mut self, text: &str, slow: bool, now: Duration) -> Option<SpeechRequest> {
        if self.state == UiState::Speaking {
            tracing::debug!("Submit ignored: request already in flight");
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;

        self.state = UiState::Speaking;
        self.status = Status::Speaking;
        self.last_error = None;
        self.feedback.start(now);
        self.in_flight = Some(InFlight {
            id,
            submitted_at: now,
        });

        tracing::info!(id, slow, chars = text.chars().count(), "Speech request submitted");

        Some(SpeechRequest {
            id,
            text: text.to_string(),
            slow,
        })
    }

    /// Record the scratch file for request `id` and schedule its deletion at
    /// submit time plus the cleanup delay, independent of playback.
    ///
    /// Returns `false` if `id` is not the request in flight; the file is then
    /// scheduled for deletion right away and must not be played.
    pub fn artifact_created(&mut self, id: u64, path: PathBuf, now: Duration) -> bool {
        match self.current(id) {
            Some(request) => {
                self.defer(
                    request.submitted_at + self.cleanup_delay,
                    Deferred::DeleteScratch(path),
                );
                true
            }
            None => {
                tracing::debug!(id, "Discarding audio for stale request");
                self.defer(now, Deferred::DeleteScratch(path));
                false
            }
        }
    }

    /// Playback of request `id` began at `now` and lasts `duration`.
    pub fn playback_started(&mut self, id: u64, duration: Duration, now: Duration) {
        if self.current(id).is_none() {
            return;
        }
        tracing::info!(id, ?duration, "Playback started");
        self.defer(now + duration, Deferred::Complete { id });
    }

    /// Request `id` failed. Back to Idle with a transient error message.
    pub fn fail(&mut self, id: u64, error: &SpeechError, now: Duration) {
        if self.current(id).is_none() {
            return;
        }
        tracing::warn!(id, error = %error, "Speech request failed");

        self.finish();
        self.status = Status::Error(error.user_message().to_string());
        self.last_error = Some(id);
        self.defer(now + self.error_display, Deferred::ClearStatus { id });
    }

    /// Run every task due at `now`. Returns scratch files to delete.
    pub fn poll(&mut self, now: Duration) -> Vec<PathBuf> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.schedule.drain(..).partition(|s| s.due <= now);
        self.schedule = pending;
        due.sort_by_key(|s| s.due);

        let mut expired = Vec::new();
        for Scheduled { task, .. } in due {
            match task {
                Deferred::Complete { id } => {
                    if self.current(id).is_some() {
                        tracing::info!(id, "Speech request complete");
                        self.finish();
                        self.status = Status::Clear;
                    }
                }
                Deferred::ClearStatus { id } => {
                    if self.last_error == Some(id) {
                        self.status = Status::Clear;
                        self.last_error = None;
                    }
                }
                Deferred::DeleteScratch(path) => expired.push(path),
            }
        }
        expired
    }

    /// Remove every pending scratch deletion, due or not. Used at exit.
    pub fn drain_cleanups(&mut self) -> Vec<PathBuf> {
        let (cleanups, rest): (Vec<_>, Vec<_>) = self
            .schedule
            .drain(..)
            .partition(|s| matches!(s.task, Deferred::DeleteScratch(_)));
        self.schedule = rest;
        cleanups
            .into_iter()
            .filter_map(|s| match s.task {
                Deferred::DeleteScratch(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn current(&self, id: u64) -> Option<InFlight> {
        self.in_flight.filter(|request| request.id == id)
    }

    fn finish(&mut self) {
        self.state = UiState::Idle;
        self.in_flight = None;
        self.feedback.stop();
    }

    fn defer(&mut self, due: Duration, task: Deferred) {
        self.schedule.push(Scheduled { due, task });
    }
}
