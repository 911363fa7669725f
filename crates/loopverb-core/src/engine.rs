//! The single owned audio context: backend plus mix graph.
//!
//! `LazyEngine` creates it on first use and never recreates it, so the
//! impulse response is synthesized exactly once per backend instance.

use std::cell::OnceCell;
use std::rc::Rc;

use crate::backend::{AudioBackend, ClockState};
use crate::config::LooperConfig;
use crate::error::Result;
use crate::graph::MixGraph;
use crate::impulse::build_impulse_with;
use crate::mix::MixState;

pub struct AudioEngine<B: AudioBackend> {
    backend: B,
    graph: MixGraph<B>,
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn new(backend: B, config: &LooperConfig, mix: MixState) -> Result<Self> {
        config.validate()?;
        let impulse = build_impulse_with(
            backend.sample_rate(),
            config.impulse_seconds,
            config.impulse_decay,
            &mut rand::thread_rng(),
        )?;
        let graph = MixGraph::initialize(&backend, impulse, config)?;
        graph.set_mix(&backend, mix);
        log::info!(
            "[engine] ready: sample_rate={} mix={:.2}",
            backend.sample_rate(),
            mix.ratio()
        );
        Ok(Self { backend, graph })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn graph(&self) -> &MixGraph<B> {
        &self.graph
    }
}

type BackendFactory<B> = Box<dyn Fn() -> Result<B>>;

pub struct LazyEngine<B: AudioBackend> {
    config: LooperConfig,
    factory: BackendFactory<B>,
    engine: OnceCell<Rc<AudioEngine<B>>>,
}

impl<B: AudioBackend> LazyEngine<B> {
    pub fn new(config: LooperConfig, factory: impl Fn() -> Result<B> + 'static) -> Self {
        Self {
            config,
            factory: Box::new(factory),
            engine: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &LooperConfig {
        &self.config
    }

    /// The engine, if it has been created.
    pub fn get(&self) -> Option<&Rc<AudioEngine<B>>> {
        self.engine.get()
    }

    /// Create the engine on first call, then make sure its clock is running.
    /// Callers must not touch the graph until this resolves.
    pub async fn acquire(&self, mix: MixState) -> Result<Rc<AudioEngine<B>>> {
        let engine = match self.engine.get() {
            Some(engine) => engine.clone(),
            None => {
                let backend = (self.factory)()?;
                let engine = Rc::new(AudioEngine::new(backend, &self.config, mix)?);
                _ = self.engine.set(engine.clone());
                engine
            }
        };
        if engine.backend().clock_state() == ClockState::Suspended {
            engine.backend().resume().await?;
        }
        Ok(engine)
    }
}
