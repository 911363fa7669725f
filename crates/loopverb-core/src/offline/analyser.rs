//! Byte spectrum with browser `AnalyserNode` semantics: Blackman window,
//! magnitude / N, exponential smoothing, dB range mapped onto 0..=255.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::constants::*;
use crate::error::{LooperError, Result};

use super::block::Block;

pub(crate) struct Analyser {
    fft: Arc<dyn Fft<f32>>,
    ring: Vec<f32>,
    write: usize,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    frames_seen: u64,
    analysed_at: Option<u64>,
}

impl Analyser {
    pub fn new(fft_size: usize) -> Result<Self> {
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(LooperError::Config(format!(
                "analyser fft size {fft_size} is not a power of two in range"
            )));
        }
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        Ok(Self {
            fft,
            ring: vec![0.0; fft_size],
            write: 0,
            window: (0..fft_size).map(|i| blackman(i, fft_size)).collect(),
            smoothed: vec![0.0; fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            frames_seen: 0,
            analysed_at: None,
        })
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Record a block (down-mixed to mono) into the analysis window.
    pub fn push(&mut self, block: &Block) {
        let n = self.ring.len();
        for (&l, &r) in block.left.iter().zip(&block.right) {
            self.ring[self.write] = 0.5 * (l + r);
            self.write = (self.write + 1) % n;
        }
        self.frames_seen += block.left.len() as u64;
    }

    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        // Smoothing advances only when new audio arrived
        if self.analysed_at != Some(self.frames_seen) {
            self.analyse();
            self.analysed_at = Some(self.frames_seen);
        }
        let range = ANALYSER_MAX_DB - ANALYSER_MIN_DB;
        for (o, &mag) in out.iter_mut().zip(&self.smoothed) {
            let db = linear_to_db(mag);
            let scaled = BYTE_FULL_SCALE / range * (db - ANALYSER_MIN_DB);
            *o = scaled.clamp(0.0, BYTE_FULL_SCALE) as u8;
        }
    }

    fn analyse(&mut self) {
        let n = self.ring.len();
        // Oldest sample first
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let s = self.ring[(self.write + i) % n];
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);
        let norm = 1.0 / n as f32;
        for (s, x) in self.smoothed.iter_mut().zip(&self.scratch) {
            let mag = x.norm() * norm;
            let next = ANALYSER_SMOOTHING * *s + (1.0 - ANALYSER_SMOOTHING) * mag;
            *s = if next.is_finite() { next } else { 0.0 };
        }
    }
}

#[inline]
fn blackman(index: usize, size: usize) -> f32 {
    let (a0, a1, a2) = (0.42, 0.5, 0.08);
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

#[inline]
fn linear_to_db(value: f32) -> f32 {
    if value > 0.0 {
        20.0 * value.log10()
    } else {
        f32::NEG_INFINITY
    }
}
