use std::rc::Rc;

use crate::buffer::DecodedAudio;
use crate::constants::RENDER_QUANTUM;
use crate::error::{LooperError, Result};

use super::block::Block;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Scheduled,
    Stopped,
    Ended,
}

/// Buffer playback with linear interpolation. Mono buffers feed both
/// channels; channels past the second are ignored.
pub(crate) struct BufferSource {
    buffer: Rc<DecodedAudio>,
    phase: Phase,
    start_frame: u64,
    position: f64,
    rate: f32,
    looping: bool,
    loops: u32,
}

impl BufferSource {
    pub fn new(buffer: Rc<DecodedAudio>) -> Self {
        Self {
            buffer,
            phase: Phase::Idle,
            start_frame: 0,
            position: 0.0,
            rate: 1.0,
            looping: false,
            loops: 0,
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Started and still producing sound.
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Scheduled
    }

    pub fn start(&mut self, start_frame: u64) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(LooperError::InvalidState(
                "source can only be started once".into(),
            ));
        }
        self.phase = Phase::Scheduled;
        self.start_frame = start_frame;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        match self.phase {
            Phase::Idle => Err(LooperError::InvalidState(
                "source stopped before it was started".into(),
            )),
            Phase::Scheduled => {
                self.phase = Phase::Stopped;
                Ok(())
            }
            Phase::Stopped | Phase::Ended => Ok(()),
        }
    }

    pub fn render(&mut self, frame: u64, context_rate: f32) -> Block {
        let mut block = Block::default();
        if self.phase != Phase::Scheduled {
            return block;
        }
        let frames = self.buffer.frames();
        if frames == 0 {
            self.phase = Phase::Ended;
            return block;
        }
        let len = frames as f64;
        let step = self.rate as f64 * self.buffer.sample_rate() as f64 / context_rate as f64;
        let first = self.start_frame.saturating_sub(frame).min(RENDER_QUANTUM as u64) as usize;

        for i in first..RENDER_QUANTUM {
            if !(0.0..len).contains(&self.position) {
                if !self.looping {
                    self.phase = Phase::Ended;
                    break;
                }
                self.position = self.position.rem_euclid(len);
                self.loops += 1;
            }
            let (l, r) = self.sample_at(self.position);
            block.left[i] = l;
            block.right[i] = r;
            self.position += step;
        }
        block
    }

    fn sample_at(&self, position: f64) -> (f32, f32) {
        let frames = self.buffer.frames();
        let index = (position.floor() as usize).min(frames - 1);
        let frac = (position - index as f64) as f32;
        let next = if index + 1 < frames {
            index + 1
        } else if self.looping {
            0
        } else {
            index
        };
        let read = |ch: &[f32]| ch[index] + (ch[next] - ch[index]) * frac;
        let left = self.buffer.channel(0).map(read).unwrap_or(0.0);
        let right = self.buffer.channel(1).map(read).unwrap_or(left);
        (left, right)
    }
}
