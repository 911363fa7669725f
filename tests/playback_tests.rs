// Host-side integration tests for the playback controller, driven through
// the offline backend. Contexts run at low sample rates to keep the
// convolver cheap; buffers stay at 44.1 kHz.

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::io::Cursor;
use std::rc::Rc;

use loopverb_core::offline::OfflineContext;
use loopverb_core::{
    AudioBackend, ClockState, FrameScheduler, LazyEngine, LooperConfig, LooperError,
    PlaybackController, PlaybackState, Status, StatusSink, VisualizerTask,
};
use pollster::block_on;

const CONTEXT_RATE: f32 = 4_000.0;

#[derive(Clone, Default)]
struct Recorder {
    statuses: Rc<RefCell<Vec<Status>>>,
    states: Rc<RefCell<Vec<PlaybackState>>>,
}

impl StatusSink for Recorder {
    fn set_status(&self, status: Status) {
        self.statuses.borrow_mut().push(status);
    }

    fn set_playback_state(&self, state: PlaybackState) {
        self.states.borrow_mut().push(state);
    }
}

impl Recorder {
    fn last_status(&self) -> Option<Status> {
        self.statuses.borrow().last().copied()
    }
}

#[derive(Clone, Default)]
struct Frames {
    tasks: Rc<RefCell<Vec<VisualizerTask<OfflineContext>>>>,
}

impl FrameScheduler<OfflineContext> for Frames {
    fn schedule(&self, task: VisualizerTask<OfflineContext>) {
        self.tasks.borrow_mut().push(task);
    }
}

impl Frames {
    fn count(&self) -> usize {
        self.tasks.borrow().len()
    }

    fn cancelled(&self, index: usize) -> bool {
        self.tasks.borrow()[index].token().is_cancelled()
    }
}

type Controller = PlaybackController<OfflineContext>;

fn controller_with(config: LooperConfig) -> (Controller, Recorder, Frames) {
    let recorder = Recorder::default();
    let frames = Frames::default();
    let engine = LazyEngine::new(config, || OfflineContext::new(CONTEXT_RATE));
    let controller =
        PlaybackController::new(engine, Box::new(recorder.clone()), Box::new(frames.clone()));
    (controller, recorder, frames)
}

fn controller() -> (Controller, Recorder, Frames) {
    controller_with(LooperConfig::default())
}

/// 16-bit PCM WAV holding a half-scale sine.
fn wav_bytes(sample_rate: u32, channels: u16, seconds: f32, freq: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (sample_rate as f32 * seconds) as usize;
        for i in 0..frames {
            let s = (TAU * freq * i as f32 / sample_rate as f32).sin() * 0.5;
            for _ in 0..channels {
                writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn short_clip() -> Vec<u8> {
    wav_bytes(44_100, 2, 1.0, 440.0)
}

fn only_source(ctx: &OfflineContext) -> loopverb_core::offline::NodeId {
    let live = ctx.live_sources();
    assert_eq!(live.len(), 1, "expected exactly one live source");
    live[0]
}

#[test]
fn no_selection_is_a_noop() {
    let (c, recorder, frames) = controller();
    block_on(c.open(None)).unwrap();
    assert_eq!(c.state(), PlaybackState::Unloaded);
    assert!(c.engine().is_none());
    assert_eq!(*recorder.statuses.borrow(), vec![Status::Idle]);
    assert_eq!(frames.count(), 0);
}

#[test]
fn toggle_before_loading_is_a_noop() {
    let (c, recorder, _) = controller();
    block_on(c.toggle_play()).unwrap();
    assert_eq!(c.state(), PlaybackState::Unloaded);
    assert!(recorder.states.borrow().is_empty());
}

#[test]
fn ten_second_mono_clip_loops_with_default_mix() {
    let (c, recorder, _) = controller();
    block_on(c.open(Some(wav_bytes(44_100, 1, 10.0, 220.0)))).unwrap();

    assert_eq!(c.state(), PlaybackState::Playing);
    assert_eq!(
        *recorder.statuses.borrow(),
        vec![Status::Idle, Status::Loading, Status::Ready]
    );
    assert_eq!(
        *recorder.states.borrow(),
        vec![PlaybackState::Stopped, PlaybackState::Playing]
    );

    let engine = c.engine().unwrap();
    let ctx = engine.backend();
    assert_eq!(ctx.clock_state(), ClockState::Running);
    assert!((engine.graph().dry_gain(ctx) - 0.7).abs() < 1e-6);
    assert!((engine.graph().wet_gain(ctx) - 0.3).abs() < 1e-6);

    let source = only_source(ctx);
    assert_eq!(ctx.playback_rate(&source), 1.0);

    let [left, right] = ctx.render_seconds(11.0);
    assert!(ctx.is_source_active(&source));
    assert_eq!(ctx.source_loops(&source), Some(1));
    assert!(ctx.source_position(&source).unwrap() < 441_000.0);

    // Still sounding after the first wrap.
    let tail = &left[(10.5 * CONTEXT_RATE) as usize..];
    assert!(tail.iter().any(|s| s.abs() > 0.05));
    assert!(right.iter().all(|s| s.is_finite()));
}

#[test]
fn playing_twice_leaves_one_active_source() {
    let (c, _, _) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    let ctx = c.engine().unwrap().backend();
    let first = only_source(ctx);

    block_on(c.play()).unwrap();
    block_on(c.play()).unwrap();
    assert_eq!(ctx.active_sources(), 1);
    assert_eq!(ctx.sources_created(), 3);
    let current = only_source(ctx);
    assert_ne!(current, first);
    assert!(!ctx.is_source_active(&first));

    ctx.render_seconds(0.5);
    assert_eq!(ctx.active_sources(), 1);
}

#[test]
fn rate_change_retunes_the_live_source() {
    let (c, _, _) = controller();
    block_on(c.open(Some(wav_bytes(44_100, 1, 10.0, 220.0)))).unwrap();
    let ctx = c.engine().unwrap().backend();
    let source = only_source(ctx);

    c.set_rate(2.0);
    assert_eq!(c.rate(), 2.0);
    assert_eq!(only_source(ctx), source);
    assert_eq!(ctx.playback_rate(&source), 2.0);
    assert_eq!(ctx.sources_created(), 1);

    let [left, _] = ctx.render(4_096);
    let expected = left.len() as f64 * 2.0 * 44_100.0 / CONTEXT_RATE as f64;
    let position = ctx.source_position(&source).unwrap();
    assert!((position - expected).abs() < 1.0, "{position} vs {expected}");
}

#[test]
fn rate_is_kept_for_the_next_source() {
    let (c, _, _) = controller();
    c.set_rate(1.5);
    c.set_rate(f32::NAN);
    assert_eq!(c.rate(), 1.5);

    block_on(c.open(Some(short_clip()))).unwrap();
    let ctx = c.engine().unwrap().backend();
    assert_eq!(ctx.playback_rate(&only_source(ctx)), 1.5);
}

#[test]
fn pause_and_resume_keep_the_same_source() {
    let (c, recorder, frames) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    let ctx = c.engine().unwrap().backend();
    let source = only_source(ctx);
    ctx.render(1_024);
    assert_eq!(frames.count(), 1);

    block_on(c.toggle_play()).unwrap();
    assert_eq!(c.state(), PlaybackState::Paused);
    assert_eq!(ctx.clock_state(), ClockState::Suspended);
    assert!(frames.cancelled(0));

    // A suspended clock freezes the source.
    let before = ctx.source_position(&source).unwrap();
    let [left, _] = ctx.render(1_024);
    assert!(left.iter().all(|&s| s == 0.0));
    assert_eq!(ctx.source_position(&source), Some(before));

    block_on(c.toggle_play()).unwrap();
    assert_eq!(c.state(), PlaybackState::Playing);
    assert_eq!(ctx.clock_state(), ClockState::Running);
    assert_eq!(only_source(ctx), source);
    assert_eq!(ctx.sources_created(), 1);

    // The visualizer restarts with a fresh token.
    assert_eq!(frames.count(), 2);
    assert!(!frames.cancelled(1));

    ctx.render(1_024);
    assert!(ctx.source_position(&source).unwrap() > before);
    assert_eq!(
        *recorder.states.borrow(),
        vec![
            PlaybackState::Stopped,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Playing,
        ]
    );
}

#[test]
fn visualizer_samples_bars_until_cancelled() {
    let (c, _, frames) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    let ctx = c.engine().unwrap().backend();
    ctx.render_seconds(0.25);

    let sampled = frames.tasks.borrow_mut()[0]
        .tick()
        .map(|frame| (frame.len(), frame.peak()));
    let (bars, peak) = sampled.unwrap();
    assert_eq!(bars, 30);
    assert!(peak > 0.0 && peak <= 1.0);

    block_on(c.toggle_play()).unwrap();
    assert!(frames.tasks.borrow_mut()[0].tick().is_none());
}

#[test]
fn mix_changes_apply_to_the_graph() {
    let (c, _, _) = controller();
    c.set_mix(0.5);
    block_on(c.open(Some(short_clip()))).unwrap();
    let engine = c.engine().unwrap();
    let ctx = engine.backend();
    assert_eq!(engine.graph().dry_gain(ctx), 0.5);
    assert_eq!(engine.graph().wet_gain(ctx), 0.5);

    c.set_mix(0.8);
    assert!((engine.graph().dry_gain(ctx) - 0.2).abs() < 1e-6);
    assert_eq!(engine.graph().wet_gain(ctx), 0.8);

    c.set_mix(1.5);
    assert_eq!(c.mix().ratio(), 1.0);
    assert_eq!(engine.graph().dry_gain(ctx), 0.0);
    assert_eq!(engine.graph().wet_gain(ctx), 1.0);
}

#[test]
fn fully_wet_output_is_the_reverb_tail() {
    let (c, _, _) = controller();
    c.set_mix(1.0);
    block_on(c.open(Some(short_clip()))).unwrap();
    let ctx = c.engine().unwrap().backend();

    let [left, _] = ctx.render_seconds(0.5);
    assert!(left.iter().any(|s| s.abs() > 1e-3));

    c.set_mix(0.0);
    let [dry, _] = ctx.render_seconds(0.5);
    assert!(dry.iter().any(|s| s.abs() > 0.1));
}

#[test]
fn corrupt_file_reports_decode_failure() {
    let (c, recorder, frames) = controller();
    let result = block_on(c.open(Some(b"definitely not audio".to_vec())));

    assert!(matches!(result, Err(LooperError::Decode(_))));
    assert_eq!(c.state(), PlaybackState::Unloaded);
    assert!(!c.is_loaded());
    assert_eq!(recorder.last_status(), Some(Status::DecodeFailed));
    assert!(!recorder.states.borrow().contains(&PlaybackState::Playing));
    assert_eq!(frames.count(), 0);

    // The engine survives and stays usable.
    let ctx = c.engine().unwrap().backend();
    assert_eq!(ctx.sources_created(), 0);
    block_on(c.open(Some(short_clip()))).unwrap();
    assert_eq!(c.state(), PlaybackState::Playing);
}

#[test]
fn decode_failure_after_playback_unloads() {
    let (c, recorder, frames) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    let ctx = c.engine().unwrap().backend();

    assert!(block_on(c.open(Some(vec![0; 64]))).is_err());
    assert_eq!(c.state(), PlaybackState::Unloaded);
    assert_eq!(ctx.active_sources(), 0);
    assert!(frames.cancelled(0));
    assert_eq!(recorder.last_status(), Some(Status::DecodeFailed));

    block_on(c.toggle_play()).unwrap();
    assert_eq!(c.state(), PlaybackState::Unloaded);
    assert!(matches!(block_on(c.play()), Err(LooperError::NotLoaded)));
}

#[test]
fn loading_a_new_file_replaces_the_source() {
    let (c, _, frames) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    block_on(c.open(Some(wav_bytes(22_050, 1, 0.5, 330.0)))).unwrap();

    let ctx = c.engine().unwrap().backend();
    assert_eq!(ctx.active_sources(), 1);
    assert_eq!(ctx.sources_created(), 2);
    assert!(frames.cancelled(0));
    assert!(!frames.cancelled(1));
}

#[test]
fn suspended_context_is_resumed_on_open() {
    let (c, _, _) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    let ctx = c.engine().unwrap().backend();
    block_on(ctx.suspend()).unwrap();

    block_on(c.open(Some(short_clip()))).unwrap();
    assert_eq!(ctx.clock_state(), ClockState::Running);
}

#[test]
fn oversized_bar_count_is_clamped() {
    let config = LooperConfig {
        bar_count: 50,
        ..Default::default()
    };
    let (c, _, frames) = controller_with(config);
    block_on(c.open(Some(short_clip()))).unwrap();
    let bars = frames.tasks.borrow_mut()[0].tick().map(|f| f.len());
    assert_eq!(bars, Some(32));
}

#[test]
fn play_while_paused_resumes_the_clock() {
    let (c, _, frames) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    block_on(c.toggle_play()).unwrap();
    let ctx = c.engine().unwrap().backend();
    assert_eq!(ctx.clock_state(), ClockState::Suspended);

    block_on(c.play()).unwrap();
    assert_eq!(c.state(), PlaybackState::Playing);
    assert_eq!(ctx.clock_state(), ClockState::Running);
    assert!(!frames.cancelled(frames.count() - 1));

    let [left, _] = ctx.render(2_048);
    assert!(left.iter().any(|s| s.abs() > 0.05));
}

#[test]
fn reopening_while_paused_plays_audibly() {
    let (c, _, _) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();
    block_on(c.toggle_play()).unwrap();
    assert_eq!(c.state(), PlaybackState::Paused);

    block_on(c.open(Some(wav_bytes(22_050, 1, 0.5, 330.0)))).unwrap();
    let ctx = c.engine().unwrap().backend();
    assert_eq!(c.state(), PlaybackState::Playing);
    assert_eq!(ctx.clock_state(), ClockState::Running);
    assert_eq!(ctx.active_sources(), 1);
}

#[test]
fn rejected_selection_reports_failure_and_unloads() {
    let (c, recorder, frames) = controller();
    block_on(c.open(Some(short_clip()))).unwrap();

    c.reject(&LooperError::Decode("could not read clip.wav".into()));
    assert_eq!(c.state(), PlaybackState::Unloaded);
    assert!(!c.is_loaded());
    assert_eq!(recorder.last_status(), Some(Status::DecodeFailed));
    assert_eq!(c.engine().unwrap().backend().active_sources(), 0);
    assert!(frames.cancelled(0));
}
