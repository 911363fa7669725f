//! Uniformly partitioned convolution (overlap-save, one partition per
//! render quantum), so long impulse responses run at block latency zero.

use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::constants::RENDER_QUANTUM;
use crate::impulse::ImpulseResponse;

use super::block::Block;

// WebAudio's normalization calibration
const GAIN_CALIBRATION_DB: f32 = -58.0;
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44100.0;
const MIN_POWER: f32 = 0.000125;

pub(crate) struct Convolver {
    left: PartitionedConvolver,
    right: PartitionedConvolver,
    scale: f32,
}

impl Convolver {
    pub fn new(impulse: ImpulseResponse, normalize: bool) -> Self {
        let scale = if normalize {
            normalization_scale(&impulse)
        } else {
            1.0
        };
        let mut planner = FftPlanner::new();
        let [left, right] = impulse.into_channels();
        Self {
            left: PartitionedConvolver::new(&left, &mut planner),
            right: PartitionedConvolver::new(&right, &mut planner),
            scale,
        }
    }

    pub fn process(&mut self, input: &Block) -> Block {
        let mut out = Block::default();
        self.left.process(&input.left, &mut out.left, self.scale);
        self.right.process(&input.right, &mut out.right, self.scale);
        out
    }
}

/// Scale that evens out the loudness of impulse responses of different
/// power, matching a browser `ConvolverNode` with `normalize = true`.
pub(crate) fn normalization_scale(impulse: &ImpulseResponse) -> f32 {
    let channels = impulse.channels();
    let samples = (channels.len() * impulse.len()).max(1);
    let energy: f64 = channels
        .iter()
        .flat_map(|c| c.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();
    let mut power = (energy / samples as f64).sqrt() as f32;
    if !power.is_finite() || power < MIN_POWER {
        power = MIN_POWER;
    }
    let mut scale = 1.0 / power;
    scale *= 10f32.powf(GAIN_CALIBRATION_DB * 0.05);
    scale *= GAIN_CALIBRATION_SAMPLE_RATE / impulse.sample_rate();
    scale
}

struct PartitionedConvolver {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    partitions: Vec<Vec<Complex<f32>>>,
    // Input spectra, newest first
    history: VecDeque<Vec<Complex<f32>>>,
    window: Vec<f32>,
    accum: Vec<Complex<f32>>,
}

impl PartitionedConvolver {
    fn new(kernel: &[f32], planner: &mut FftPlanner<f32>) -> Self {
        let size = 2 * RENDER_QUANTUM;
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let partitions = kernel
            .chunks(RENDER_QUANTUM)
            .map(|chunk| {
                let mut spectrum = vec![Complex::new(0.0, 0.0); size];
                for (d, &s) in spectrum.iter_mut().zip(chunk) {
                    d.re = s;
                }
                forward.process(&mut spectrum);
                spectrum
            })
            .collect::<Vec<_>>();
        Self {
            forward,
            inverse,
            history: VecDeque::with_capacity(partitions.len()),
            partitions,
            window: vec![0.0; size],
            accum: vec![Complex::new(0.0, 0.0); size],
        }
    }

    fn process(&mut self, input: &[f32; RENDER_QUANTUM], out: &mut [f32; RENDER_QUANTUM], scale: f32) {
        if self.partitions.is_empty() {
            out.fill(0.0);
            return;
        }
        let size = self.window.len();

        // Slide the two-block input window
        self.window.copy_within(RENDER_QUANTUM.., 0);
        self.window[RENDER_QUANTUM..].copy_from_slice(input);

        let mut spectrum = if self.history.len() == self.partitions.len() {
            self.history.pop_back().unwrap_or_default()
        } else {
            Vec::new()
        };
        spectrum.clear();
        spectrum.extend(self.window.iter().map(|&s| Complex::new(s, 0.0)));
        self.forward.process(&mut spectrum);
        self.history.push_front(spectrum);

        self.accum.fill(Complex::new(0.0, 0.0));
        for (x, h) in self.history.iter().zip(&self.partitions) {
            for ((acc, &xk), &hk) in self.accum.iter_mut().zip(x).zip(h) {
                *acc += xk * hk;
            }
        }
        self.inverse.process(&mut self.accum);

        // Only the second half is free of circular wrap-around
        let norm = scale / size as f32;
        for (o, y) in out.iter_mut().zip(&self.accum[RENDER_QUANTUM..]) {
            *o = y.re * norm;
        }
    }
}
