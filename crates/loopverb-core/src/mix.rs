use crate::constants::DEFAULT_MIX;

/// Dry/wet balance. `ratio` 0 is fully dry, 1 is fully wet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixState {
    ratio: f32,
}

impl MixState {
    /// Out-of-range ratios are clamped to [0, 1]; non-finite ratios fall
    /// back to fully dry.
    pub fn new(ratio: f32) -> Self {
        let clamped = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if clamped != ratio {
            log::warn!("[mix] ratio {} out of range, using {}", ratio, clamped);
        }
        Self { ratio: clamped }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn dry_gain(&self) -> f32 {
        1.0 - self.ratio
    }

    pub fn wet_gain(&self) -> f32 {
        self.ratio
    }
}

impl Default for MixState {
    fn default() -> Self {
        Self::new(DEFAULT_MIX)
    }
}
