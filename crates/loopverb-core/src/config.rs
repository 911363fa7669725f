//! Validated runtime configuration.
//!
//! Defaults come from `constants.rs`; front-ends may override the initial
//! control values (for example from the initial position of a slider).

use crate::constants::*;
use crate::error::{LooperError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct LooperConfig {
    pub impulse_seconds: f32,
    pub impulse_decay: f32,
    /// Apply the backend's impulse-response power normalization.
    pub normalize_impulse: bool,
    pub fft_size: usize,
    pub bar_count: usize,
    pub initial_rate: f32,
    pub initial_mix: f32,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            impulse_seconds: IMPULSE_SECONDS,
            impulse_decay: IMPULSE_DECAY,
            normalize_impulse: true,
            fft_size: ANALYSER_FFT_SIZE,
            bar_count: BAR_COUNT,
            initial_rate: DEFAULT_RATE,
            initial_mix: DEFAULT_MIX,
        }
    }
}

impl LooperConfig {
    /// Override the initial rate and mix with values read from the controls.
    /// Missing or non-finite values keep the current setting.
    pub fn with_initial_controls(mut self, rate: Option<f32>, mix: Option<f32>) -> Self {
        if let Some(rate) = rate.filter(|r| r.is_finite()) {
            self.initial_rate = rate;
        }
        if let Some(mix) = mix.filter(|m| m.is_finite()) {
            self.initial_mix = mix;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.impulse_seconds.is_finite() && self.impulse_seconds > 0.0) {
            return Err(LooperError::Config(format!(
                "impulse length must be positive, got {}",
                self.impulse_seconds
            )));
        }
        if !(self.impulse_decay.is_finite() && self.impulse_decay >= 0.0) {
            return Err(LooperError::Config(format!(
                "impulse decay must be finite and non-negative, got {}",
                self.impulse_decay
            )));
        }
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(LooperError::Config(format!(
                "fft size must be a power of two in [{MIN_FFT_SIZE}, {MAX_FFT_SIZE}], got {}",
                self.fft_size
            )));
        }
        if self.bar_count == 0 {
            return Err(LooperError::Config("bar count must be at least 1".into()));
        }
        if !(MIN_RATE..=MAX_RATE).contains(&self.initial_rate) {
            return Err(LooperError::Config(format!(
                "initial rate must be in [{MIN_RATE}, {MAX_RATE}], got {}",
                self.initial_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_mix) {
            return Err(LooperError::Config(format!(
                "initial mix must be in [0, 1], got {}",
                self.initial_mix
            )));
        }
        Ok(())
    }
}
