//! Looped playback of one decoded buffer through the mix graph.
//!
//! State machine:
//!
//! ```text
//! Unloaded ──load──► Stopped ──play──► Playing ◄──toggle──► Paused
//!     ▲                                   │
//!     └────────── decode failure ─────────┘
//! ```
//!
//! Pausing suspends the shared clock rather than the source, so resuming
//! continues the same source from where it froze. Every method takes
//! `&self` and no borrow is held across an await point.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::backend::{AudioBackend, ClockState};
use crate::config::LooperConfig;
use crate::engine::{AudioEngine, LazyEngine};
use crate::error::{LooperError, Result};
use crate::mix::MixState;
use crate::spectrum::{CancelToken, FrameScheduler, SpectrumVisualizer, VisualizerTask};
use crate::status::{Status, StatusSink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Unloaded,
    Stopped,
    Playing,
    Paused,
}

struct PlaybackSession<B: AudioBackend> {
    buffer: B::Buffer,
    source: Option<B::Source>,
}

pub struct PlaybackController<B: AudioBackend> {
    engine: LazyEngine<B>,
    status: Box<dyn StatusSink>,
    scheduler: Box<dyn FrameScheduler<B>>,
    bar_count: usize,
    state: Cell<PlaybackState>,
    rate: Cell<f32>,
    mix: Cell<MixState>,
    session: RefCell<Option<PlaybackSession<B>>>,
    frame_token: RefCell<Option<CancelToken>>,
}

impl<B: AudioBackend> PlaybackController<B> {
    pub fn new(
        engine: LazyEngine<B>,
        status: Box<dyn StatusSink>,
        scheduler: Box<dyn FrameScheduler<B>>,
    ) -> Self {
        let config: &LooperConfig = engine.config();
        let bar_count = config.bar_count;
        let rate = config.initial_rate;
        let mix = MixState::new(config.initial_mix);
        status.set_status(Status::Idle);
        Self {
            engine,
            status,
            scheduler,
            bar_count,
            state: Cell::new(PlaybackState::Unloaded),
            rate: Cell::new(rate),
            mix: Cell::new(mix),
            session: RefCell::new(None),
            frame_token: RefCell::new(None),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    pub fn rate(&self) -> f32 {
        self.rate.get()
    }

    pub fn mix(&self) -> MixState {
        self.mix.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn engine(&self) -> Option<&Rc<AudioEngine<B>>> {
        self.engine.get()
    }

    /// Load the user's file selection. `None` (nothing selected) is a no-op.
    /// Decode failures are reported to the status sink, leave the controller
    /// unloaded and are returned; nothing is retried.
    pub async fn open(&self, selection: Option<Vec<u8>>) -> Result<()> {
        let Some(bytes) = selection else {
            log::debug!("[playback] no file selected");
            return Ok(());
        };
        self.status.set_status(Status::Loading);
        log::info!("[playback] decoding {} bytes", bytes.len());

        let engine = match self.engine.acquire(self.mix.get()).await {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("[playback] audio engine unavailable: {}", e);
                self.status.set_status(Status::AudioUnavailable);
                return Err(e);
            }
        };

        match engine.backend().decode(bytes).await {
            Ok(buffer) => {
                log::info!(
                    "[playback] decoded {:.2}s",
                    engine.backend().buffer_duration(&buffer)
                );
                self.load(buffer).await
            }
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    /// Report a selection that could not be read or decoded. Any loaded
    /// buffer is dropped and the controller ends up unloaded.
    pub fn reject(&self, error: &LooperError) {
        log::error!("[playback] load failed: {}", error);
        self.unload();
        self.status.set_status(Status::DecodeFailed);
    }

    /// Replace the loaded buffer and start playing it.
    pub async fn load(&self, buffer: B::Buffer) -> Result<()> {
        let engine = self.require_engine()?;
        self.retire_source(&engine);
        *self.session.borrow_mut() = Some(PlaybackSession {
            buffer,
            source: None,
        });
        self.set_state(PlaybackState::Stopped);
        self.status.set_status(Status::Ready);
        self.play().await
    }

    /// Start a fresh looping source for the loaded buffer, stopping and
    /// releasing the previous one first. A suspended clock (paused, or paused
    /// while a file was decoding) is resumed before the source starts.
    pub async fn play(&self) -> Result<()> {
        let engine = self.require_engine()?;
        if !self.is_loaded() {
            return Err(LooperError::NotLoaded);
        }
        let backend = engine.backend();
        if backend.clock_state() != ClockState::Running {
            backend.resume().await?;
        }
        {
            let mut session = self.session.borrow_mut();
            let session = session.as_mut().ok_or(LooperError::NotLoaded)?;
            if let Some(prev) = session.source.take() {
                stop_and_release(&engine, &prev);
            }

            let source = backend.create_source(&session.buffer)?;
            backend.set_playback_rate(&source, self.rate.get());
            backend.set_looping(&source, true);
            let started = engine
                .graph()
                .connect_source(backend, &source)
                .and_then(|_| backend.start_source(&source, 0.0));
            if let Err(e) = started {
                engine.graph().release_source(backend, &source);
                return Err(e);
            }
            session.source = Some(source);
        }
        log::info!("[playback] playing at rate {}", self.rate.get());
        self.set_state(PlaybackState::Playing);
        self.start_visualizer(&engine);
        Ok(())
    }

    /// Pause or resume by suspending or resuming the shared clock. No-op
    /// while unloaded; a loaded but stopped controller starts playing.
    pub async fn toggle_play(&self) -> Result<()> {
        let Some(engine) = self.engine.get().cloned() else {
            return Ok(());
        };
        match self.state.get() {
            PlaybackState::Unloaded => Ok(()),
            PlaybackState::Stopped => self.play().await,
            PlaybackState::Playing => {
                self.set_state(PlaybackState::Paused);
                self.cancel_visualizer();
                if let Err(e) = engine.backend().suspend().await {
                    log::error!("[playback] suspend failed: {}", e);
                    self.set_state(PlaybackState::Playing);
                    self.start_visualizer(&engine);
                    return Err(e);
                }
                Ok(())
            }
            PlaybackState::Paused => {
                self.set_state(PlaybackState::Playing);
                if let Err(e) = engine.backend().resume().await {
                    log::error!("[playback] resume failed: {}", e);
                    self.set_state(PlaybackState::Paused);
                    return Err(e);
                }
                self.start_visualizer(&engine);
                Ok(())
            }
        }
    }

    /// Store the rate for future sources and retune the live one in place.
    pub fn set_rate(&self, rate: f32) {
        if !rate.is_finite() {
            log::warn!("[playback] ignoring non-finite rate {}", rate);
            return;
        }
        self.rate.set(rate);
        if let (Some(engine), Some(session)) = (self.engine.get(), self.session.borrow().as_ref()) {
            if let Some(source) = &session.source {
                engine.backend().set_playback_rate(source, rate);
            }
        }
    }

    pub fn set_mix(&self, ratio: f32) {
        let mix = MixState::new(ratio);
        self.mix.set(mix);
        if let Some(engine) = self.engine.get() {
            engine.graph().set_mix(engine.backend(), mix);
        }
    }

    fn require_engine(&self) -> Result<Rc<AudioEngine<B>>> {
        self.engine
            .get()
            .cloned()
            .ok_or_else(|| LooperError::InvalidState("audio engine not initialized".into()))
    }

    fn set_state(&self, state: PlaybackState) {
        self.state.set(state);
        self.status.set_playback_state(state);
    }

    fn retire_source(&self, engine: &AudioEngine<B>) {
        let prev = self
            .session
            .borrow_mut()
            .as_mut()
            .and_then(|s| s.source.take());
        if let Some(prev) = prev {
            stop_and_release(engine, &prev);
        }
    }

    fn unload(&self) {
        if let Some(engine) = self.engine.get() {
            self.retire_source(engine);
        }
        *self.session.borrow_mut() = None;
        self.cancel_visualizer();
        self.set_state(PlaybackState::Unloaded);
    }

    fn start_visualizer(&self, engine: &Rc<AudioEngine<B>>) {
        self.cancel_visualizer();
        let token = CancelToken::new();
        let bins = engine.graph().bin_count(engine.backend());
        let task = VisualizerTask::new(
            engine.clone(),
            SpectrumVisualizer::new(self.bar_count, bins),
            token.clone(),
        );
        *self.frame_token.borrow_mut() = Some(token);
        self.scheduler.schedule(task);
    }

    fn cancel_visualizer(&self) {
        if let Some(token) = self.frame_token.borrow_mut().take() {
            token.cancel();
        }
    }
}

// Stopping an already stopped source is tolerated.
fn stop_and_release<B: AudioBackend>(engine: &AudioEngine<B>, source: &B::Source) {
    if let Err(e) = engine.backend().stop_source(source) {
        log::debug!("[playback] ignoring stop error: {}", e);
    }
    engine.graph().release_source(engine.backend(), source);
}
