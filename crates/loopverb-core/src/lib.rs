//! Signal path for loopverb.
//!
//! A decoded file plays in a loop through a dry path and a convolution
//! reverb path, summed into an analysis tap that drives a bar spectrum.
//! Everything platform-specific sits behind [`AudioBackend`]; the browser
//! front-end implements it on WebAudio and [`offline::OfflineContext`]
//! implements it in pure Rust.

pub mod backend;
pub mod buffer;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod graph;
pub mod impulse;
pub mod mix;
pub mod offline;
pub mod playback;
pub mod spectrum;
pub mod status;

pub use backend::{AudioBackend, ClockState};
pub use buffer::DecodedAudio;
pub use config::LooperConfig;
pub use constants::*;
pub use engine::{AudioEngine, LazyEngine};
pub use error::{LooperError, Result};
pub use graph::MixGraph;
pub use impulse::{build_impulse, build_impulse_with, ImpulseResponse};
pub use mix::MixState;
pub use playback::{PlaybackController, PlaybackState};
pub use spectrum::{CancelToken, FrameScheduler, SpectrumFrame, SpectrumVisualizer, VisualizerTask};
pub use status::{mix_label, play_button_label, rate_label, Status, StatusSink};
