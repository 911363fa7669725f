// Host-side tests for mix math, labels and configuration.

use loopverb_core::{
    mix_label, play_button_label, rate_label, LooperConfig, MixState, PlaybackState,
    SpectrumFrame, SpectrumVisualizer, Status, DEFAULT_MIX,
};

#[test]
fn dry_and_wet_always_sum_to_one() {
    for step in 0..=100 {
        let mix = MixState::new(step as f32 / 100.0);
        assert!((mix.dry_gain() + mix.wet_gain() - 1.0).abs() < 1e-6);
        assert_eq!(mix.wet_gain(), mix.ratio());
    }
}

#[test]
fn default_mix_is_thirty_percent_wet() {
    let mix = MixState::default();
    assert_eq!(mix.ratio(), DEFAULT_MIX);
    assert!((mix.dry_gain() - 0.7).abs() < 1e-6);
    assert!((mix.wet_gain() - 0.3).abs() < 1e-6);
}

#[test]
fn out_of_range_mix_is_clamped() {
    assert_eq!(MixState::new(1.5).ratio(), 1.0);
    assert_eq!(MixState::new(-0.2).ratio(), 0.0);
    assert_eq!(MixState::new(f32::NAN).ratio(), 0.0);
    assert_eq!(MixState::new(f32::INFINITY).ratio(), 0.0);
}

#[test]
fn labels_match_the_controls() {
    assert_eq!(rate_label(1.5), "1.5x");
    assert_eq!(rate_label(1.0), "1x");
    assert_eq!(mix_label(0.3), "30%");
    assert_eq!(mix_label(0.0), "0%");
    assert_eq!(mix_label(1.0), "100%");
    assert_eq!(play_button_label(PlaybackState::Playing), "Pause");
    assert_eq!(play_button_label(PlaybackState::Paused), "Play");
    assert_eq!(play_button_label(PlaybackState::Unloaded), "Play");
}

#[test]
fn status_messages() {
    assert_eq!(Status::Loading.message(), "Loading & Decoding...");
    assert_eq!(Status::Ready.message(), "Ready to play!");
    assert_eq!(Status::DecodeFailed.to_string(), "Error decoding file.");
    assert!(Status::DecodeFailed.is_error());
    assert!(!Status::Ready.is_error());
}

#[test]
fn default_config_is_valid() {
    let config = LooperConfig::default();
    config.validate().unwrap();
    assert_eq!(config.fft_size, 64);
    assert_eq!(config.bar_count, 30);
    assert_eq!(config.initial_rate, 1.0);
}

#[test]
fn invalid_configs_are_rejected() {
    let bad = [
        LooperConfig { fft_size: 48, ..Default::default() },
        LooperConfig { fft_size: 16, ..Default::default() },
        LooperConfig { bar_count: 0, ..Default::default() },
        LooperConfig { impulse_seconds: 0.0, ..Default::default() },
        LooperConfig { impulse_decay: f32::NAN, ..Default::default() },
        LooperConfig { initial_mix: 1.5, ..Default::default() },
        LooperConfig { initial_rate: 10.0, ..Default::default() },
    ];
    for config in bad {
        assert!(config.validate().is_err(), "{config:?}");
    }
}

#[test]
fn initial_controls_override_defaults() {
    let config = LooperConfig::default().with_initial_controls(Some(f32::NAN), Some(0.6));
    assert_eq!(config.initial_rate, 1.0);
    assert_eq!(config.initial_mix, 0.6);

    let config = LooperConfig::default().with_initial_controls(Some(2.0), None);
    assert_eq!(config.initial_rate, 2.0);
    assert_eq!(config.initial_mix, DEFAULT_MIX);
}

#[test]
fn bar_count_is_clamped_to_bins() {
    assert_eq!(SpectrumVisualizer::new(30, 32).bar_count(), 30);
    assert_eq!(SpectrumVisualizer::new(40, 32).bar_count(), 32);
}

#[test]
fn frame_scales_bytes_to_fractions() {
    let frame = SpectrumFrame::from_bytes(&[0, 51, 255]);
    assert_eq!(frame.len(), 3);
    assert_eq!(frame.bars()[0], 0.0);
    assert!((frame.bars()[1] - 0.2).abs() < 1e-6);
    assert_eq!(frame.peak(), 1.0);
    assert!(SpectrumFrame::default().is_empty());
}
