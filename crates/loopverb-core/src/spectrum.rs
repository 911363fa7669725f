//! Frequency bars sampled from the graph's analysis tap.
//!
//! A `VisualizerTask` is re-run once per display frame by a
//! `FrameScheduler` until its `CancelToken` is cancelled.

use std::cell::Cell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::backend::AudioBackend;
use crate::constants::BYTE_FULL_SCALE;
use crate::engine::AudioEngine;

/// Shared stop flag for one visualizer run.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Bar heights in [0, 1], lowest frequency first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectrumFrame {
    bars: SmallVec<[f32; 32]>,
}

impl SpectrumFrame {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bars: bytes.iter().map(|&b| b as f32 / BYTE_FULL_SCALE).collect(),
        }
    }

    pub fn bars(&self) -> &[f32] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn peak(&self) -> f32 {
        self.bars.iter().copied().fold(0.0, f32::max)
    }
}

pub struct SpectrumVisualizer {
    bins: Vec<u8>,
    bar_count: usize,
    frame: SpectrumFrame,
}

impl SpectrumVisualizer {
    /// `bar_count` is clamped to `bin_count` so no bar reads past the
    /// analyser's data.
    pub fn new(bar_count: usize, bin_count: usize) -> Self {
        let clamped = bar_count.min(bin_count);
        if clamped != bar_count {
            log::warn!(
                "[visualizer] {} bars requested but only {} bins available",
                bar_count,
                bin_count
            );
        }
        Self {
            bins: vec![0; bin_count],
            bar_count: clamped,
            frame: SpectrumFrame::default(),
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn sample<B: AudioBackend>(&mut self, backend: &B, analyser: &B::Analyser) -> &SpectrumFrame {
        backend.byte_frequency_data(analyser, &mut self.bins);
        self.frame = SpectrumFrame::from_bytes(&self.bins[..self.bar_count]);
        &self.frame
    }
}

pub struct VisualizerTask<B: AudioBackend> {
    engine: Rc<AudioEngine<B>>,
    visualizer: SpectrumVisualizer,
    token: CancelToken,
}

impl<B: AudioBackend> VisualizerTask<B> {
    pub fn new(engine: Rc<AudioEngine<B>>, visualizer: SpectrumVisualizer, token: CancelToken) -> Self {
        Self {
            engine,
            visualizer,
            token,
        }
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Sample one frame, or `None` once cancelled. Schedulers must stop
    /// re-running the task after the first `None`.
    pub fn tick(&mut self) -> Option<&SpectrumFrame> {
        if self.token.is_cancelled() {
            return None;
        }
        let engine = &self.engine;
        Some(
            self.visualizer
                .sample(engine.backend(), engine.graph().analyser()),
        )
    }
}

/// Runs visualizer tasks at display cadence.
pub trait FrameScheduler<B: AudioBackend> {
    fn schedule(&self, task: VisualizerTask<B>);
}
