// Shared tuning constants for the signal path and the bar view.

// Impulse response
pub const IMPULSE_SECONDS: f32 = 3.0; // tail length
pub const IMPULSE_DECAY: f32 = 2.0; // envelope exponent
pub const IMPULSE_CHANNELS: usize = 2;

// Analysis tap: small transform for a coarse, fast-moving spectrum
pub const ANALYSER_FFT_SIZE: usize = 64;
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;
pub const ANALYSER_SMOOTHING: f32 = 0.8;
pub const ANALYSER_MIN_DB: f32 = -100.0;
pub const ANALYSER_MAX_DB: f32 = -30.0;

// Visualizer
pub const BAR_COUNT: usize = 30;
pub const BYTE_FULL_SCALE: f32 = 255.0;

// Controls
pub const DEFAULT_RATE: f32 = 1.0;
pub const MIN_RATE: f32 = 0.25;
pub const MAX_RATE: f32 = 4.0;
pub const DEFAULT_MIX: f32 = 0.3;

// Offline rendering
pub const RENDER_QUANTUM: usize = 128; // frames per processing block
