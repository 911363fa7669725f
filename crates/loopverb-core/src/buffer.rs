use crate::error::{LooperError, Result};

/// Decoded PCM: one `f32` vector per channel, all the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    sample_rate: f32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    pub fn new(sample_rate: f32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(LooperError::Decode(format!(
                "invalid sample rate {sample_rate}"
            )));
        }
        let Some(first) = channels.first() else {
            return Err(LooperError::Decode("audio has no channels".into()));
        };
        let frames = first.len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(LooperError::Decode("channels differ in length".into()));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }
}
