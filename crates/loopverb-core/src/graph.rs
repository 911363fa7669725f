//! Dry/wet routing with an analysis tap.
//!
//! ```text
//! source ─┬──────────────► dry ─┐
//!         └─► convolver ─► wet ─┴─► analyser ─► destination
//! ```

use crate::backend::AudioBackend;
use crate::config::LooperConfig;
use crate::error::Result;
use crate::impulse::ImpulseResponse;
use crate::mix::MixState;

pub struct MixGraph<B: AudioBackend> {
    dry: B::Gain,
    wet: B::Gain,
    convolver: B::Convolver,
    analyser: B::Analyser,
}

impl<B: AudioBackend> MixGraph<B> {
    /// Build and wire the fixed part of the graph. The impulse response is
    /// moved into the convolution node.
    pub fn initialize(backend: &B, impulse: ImpulseResponse, config: &LooperConfig) -> Result<Self> {
        let mix = MixState::new(config.initial_mix);
        let dry = backend.create_gain(mix.dry_gain())?;
        let wet = backend.create_gain(mix.wet_gain())?;
        let convolver = backend.create_convolver(impulse, config.normalize_impulse)?;
        let analyser = backend.create_analyser(config.fft_size)?;

        backend.connect(dry.as_ref(), analyser.as_ref())?;
        backend.connect(wet.as_ref(), analyser.as_ref())?;
        backend.connect_to_destination(analyser.as_ref())?;
        log::info!(
            "[graph] initialized: fft_size={} bins={}",
            config.fft_size,
            backend.frequency_bin_count(&analyser)
        );

        Ok(Self {
            dry,
            wet,
            convolver,
            analyser,
        })
    }

    /// Feed `source` into both paths in parallel.
    pub fn connect_source(&self, backend: &B, source: &B::Source) -> Result<()> {
        backend.connect(source.as_ref(), self.dry.as_ref())?;
        backend.connect(source.as_ref(), self.convolver.as_ref())?;
        backend.connect(self.convolver.as_ref(), self.wet.as_ref())?;
        Ok(())
    }

    pub fn release_source(&self, backend: &B, source: &B::Source) {
        backend.disconnect(source.as_ref());
    }

    pub fn set_mix(&self, backend: &B, mix: MixState) {
        backend.set_gain(&self.dry, mix.dry_gain());
        backend.set_gain(&self.wet, mix.wet_gain());
    }

    pub fn dry_gain(&self, backend: &B) -> f32 {
        backend.gain(&self.dry)
    }

    pub fn wet_gain(&self, backend: &B) -> f32 {
        backend.gain(&self.wet)
    }

    pub fn analyser(&self) -> &B::Analyser {
        &self.analyser
    }

    pub fn bin_count(&self, backend: &B) -> usize {
        backend.frequency_bin_count(&self.analyser)
    }
}
