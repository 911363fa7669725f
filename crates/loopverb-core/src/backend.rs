//! The seam between the signal path and a concrete audio graph.
//!
//! Node handles are backend-specific; each typed handle exposes its generic
//! node through `AsRef` so the mix graph can wire them together without
//! knowing what they are.

use crate::error::Result;
use crate::impulse::ImpulseResponse;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Suspended,
    Running,
    Closed,
}

#[allow(async_fn_in_trait)]
pub trait AudioBackend {
    type Node;
    type Gain: AsRef<Self::Node>;
    type Convolver: AsRef<Self::Node>;
    type Analyser: AsRef<Self::Node>;
    type Source: AsRef<Self::Node>;
    type Buffer: Clone;

    // Clock
    fn sample_rate(&self) -> f32;
    fn clock_state(&self) -> ClockState;
    async fn resume(&self) -> Result<()>;
    async fn suspend(&self) -> Result<()>;

    // Decoding is delegated to whatever codec the backend owns.
    async fn decode(&self, bytes: Vec<u8>) -> Result<Self::Buffer>;
    fn buffer_duration(&self, buffer: &Self::Buffer) -> f64;

    // Nodes
    fn create_gain(&self, value: f32) -> Result<Self::Gain>;
    fn set_gain(&self, gain: &Self::Gain, value: f32);
    fn gain(&self, gain: &Self::Gain) -> f32;
    fn create_convolver(&self, impulse: ImpulseResponse, normalize: bool)
        -> Result<Self::Convolver>;
    fn create_analyser(&self, fft_size: usize) -> Result<Self::Analyser>;
    fn frequency_bin_count(&self, analyser: &Self::Analyser) -> usize;
    /// Fill `out` with byte magnitudes (0..=255), one per bin, up to `out.len()`.
    fn byte_frequency_data(&self, analyser: &Self::Analyser, out: &mut [u8]);

    // Routing
    fn connect(&self, from: &Self::Node, to: &Self::Node) -> Result<()>;
    fn connect_to_destination(&self, from: &Self::Node) -> Result<()>;
    fn disconnect(&self, node: &Self::Node);

    // Sources
    fn create_source(&self, buffer: &Self::Buffer) -> Result<Self::Source>;
    fn set_looping(&self, source: &Self::Source, looping: bool);
    fn set_playback_rate(&self, source: &Self::Source, rate: f32);
    fn playback_rate(&self, source: &Self::Source) -> f32;
    fn start_source(&self, source: &Self::Source, when: f64) -> Result<()>;
    fn stop_source(&self, source: &Self::Source) -> Result<()>;
}
