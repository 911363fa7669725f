use crate::constants::RENDER_QUANTUM;

/// One render quantum of stereo audio.
#[derive(Clone, Debug)]
pub(crate) struct Block {
    pub left: [f32; RENDER_QUANTUM],
    pub right: [f32; RENDER_QUANTUM],
}

impl Default for Block {
    fn default() -> Self {
        Self {
            left: [0.0; RENDER_QUANTUM],
            right: [0.0; RENDER_QUANTUM],
        }
    }
}

impl Block {
    pub fn mix_in(&mut self, other: &Block) {
        for (d, s) in self.left.iter_mut().zip(&other.left) {
            *d += *s;
        }
        for (d, s) in self.right.iter_mut().zip(&other.right) {
            *d += *s;
        }
    }

    pub fn scaled(mut self, gain: f32) -> Block {
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s *= gain;
        }
        self
    }
}
