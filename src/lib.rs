#![cfg(target_arch = "wasm32")]
//! Browser front-end for the looping reverb player.

use std::rc::Rc;

use loopverb_core::{LazyEngine, LooperConfig, PlaybackController};
use wasm_bindgen::prelude::*;
use web_sys as web;

mod audio;
mod bars;
mod constants;
mod controls;
mod dom;
mod frame;
mod ui;

use constants::{REVERB_INPUT_ID, SPEED_INPUT_ID};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("loopverb-web starting");

    if let Err(e) = init() {
        log::error!("init error: {:?}", e);
    }
    Ok(())
}

fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let config = LooperConfig::default().with_initial_controls(
        dom::input_value(&document, SPEED_INPUT_ID),
        dom::input_value(&document, REVERB_INPUT_ID),
    );
    config.validate()?;

    let bars = bars::BarView::new(&document, config.bar_count)?;
    // The AudioContext is created on first file selection, inside a user gesture.
    let engine = LazyEngine::new(config, audio::WebAudio::new);
    let controller = Rc::new(PlaybackController::new(
        engine,
        Box::new(ui::DomStatus::new(document.clone())),
        Box::new(frame::FrameLoop::new(bars)),
    ));

    controls::wire(&document, &controller);
    log::info!("[controls] ready");
    Ok(())
}
