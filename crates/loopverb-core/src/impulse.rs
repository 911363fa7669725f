//! Synthetic stereo reverb impulse response.
//!
//! White noise shaped by a polynomial decay envelope `(1 - i/len)^decay`.
//! The envelope is deterministic; the noise is drawn fresh from the caller's
//! RNG on every build, so two impulses never share fine structure.

use rand::Rng;

use crate::constants::{IMPULSE_CHANNELS, IMPULSE_DECAY, IMPULSE_SECONDS};
use crate::error::{LooperError, Result};

#[derive(Clone, Debug)]
pub struct ImpulseResponse {
    sample_rate: f32,
    decay: f32,
    channels: [Vec<f32>; IMPULSE_CHANNELS],
}

impl ImpulseResponse {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        IMPULSE_CHANNELS
    }

    pub fn duration(&self) -> f32 {
        self.len() as f32 / self.sample_rate
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>; IMPULSE_CHANNELS] {
        &self.channels
    }

    pub fn into_channels(self) -> [Vec<f32>; IMPULSE_CHANNELS] {
        self.channels
    }

    /// Envelope value applied at sample `index`.
    pub fn envelope(&self, index: usize) -> f32 {
        envelope(index, self.len(), self.decay)
    }
}

#[inline]
fn envelope(index: usize, len: usize, decay: f32) -> f32 {
    (1.0 - index as f32 / len as f32).powf(decay)
}

/// Build the default 3 s, decay 2.0 impulse at `sample_rate`.
pub fn build_impulse<R: Rng + ?Sized>(sample_rate: f32, rng: &mut R) -> Result<ImpulseResponse> {
    build_impulse_with(sample_rate, IMPULSE_SECONDS, IMPULSE_DECAY, rng)
}

pub fn build_impulse_with<R: Rng + ?Sized>(
    sample_rate: f32,
    seconds: f32,
    decay: f32,
    rng: &mut R,
) -> Result<ImpulseResponse> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(LooperError::Config(format!(
            "impulse sample rate must be positive, got {sample_rate}"
        )));
    }
    let len = (sample_rate as f64 * seconds as f64).floor() as usize;
    if len == 0 {
        return Err(LooperError::Config(format!(
            "impulse of {seconds}s at {sample_rate}Hz has no samples"
        )));
    }

    let mut left = Vec::with_capacity(len);
    let mut right = Vec::with_capacity(len);
    for i in 0..len {
        let env = envelope(i, len, decay);
        left.push(rng.gen_range(-1.0_f32..=1.0) * env);
        right.push(rng.gen_range(-1.0_f32..=1.0) * env);
    }
    log::debug!(
        "[impulse] built {} samples x {} channels at {}Hz",
        len,
        IMPULSE_CHANNELS,
        sample_rate
    );

    Ok(ImpulseResponse {
        sample_rate,
        decay,
        channels: [left, right],
    })
}
