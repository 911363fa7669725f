//! User-visible status messages and control labels.

use std::fmt;

use crate::playback::PlaybackState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Ready,
    DecodeFailed,
    AudioUnavailable,
}

impl Status {
    pub fn message(self) -> &'static str {
        match self {
            Status::Idle => "Choose an audio file.",
            Status::Loading => "Loading & Decoding...",
            Status::Ready => "Ready to play!",
            Status::DecodeFailed => "Error decoding file.",
            Status::AudioUnavailable => "Audio is unavailable.",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Status::DecodeFailed | Status::AudioUnavailable)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receives status and state changes from the playback controller.
pub trait StatusSink {
    fn set_status(&self, status: Status);
    fn set_playback_state(&self, _state: PlaybackState) {}
}

/// Rate label, e.g. `1.5x`.
pub fn rate_label(rate: f32) -> String {
    format!("{rate}x")
}

/// Mix label as a rounded percentage, e.g. `30%`.
pub fn mix_label(ratio: f32) -> String {
    format!("{}%", (ratio * 100.0).round() as i32)
}

pub fn play_button_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Playing => "Pause",
        _ => "Play",
    }
}
