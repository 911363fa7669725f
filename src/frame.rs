use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use loopverb_core::{FrameScheduler, VisualizerTask};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::audio::WebAudio;
use crate::bars::BarView;

/// `requestAnimationFrame` loop that runs one visualizer task at a time.
///
/// The callback closure is created once and holds only a weak handle, so
/// scheduling a new task never allocates another closure.
pub struct FrameLoop {
    state: Rc<LoopState>,
}

struct LoopState {
    task: RefCell<Option<VisualizerTask<WebAudio>>>,
    running: Cell<bool>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
    bars: BarView,
}

impl FrameLoop {
    pub fn new(bars: BarView) -> Self {
        let state = Rc::new(LoopState {
            task: RefCell::new(None),
            running: Cell::new(false),
            callback: RefCell::new(None),
            bars,
        });
        let weak: Weak<LoopState> = Rc::downgrade(&state);
        let callback = Closure::wrap(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.frame();
            }
        }) as Box<dyn FnMut()>);
        *state.callback.borrow_mut() = Some(callback);
        Self { state }
    }
}

impl FrameScheduler<WebAudio> for FrameLoop {
    fn schedule(&self, task: VisualizerTask<WebAudio>) {
        *self.state.task.borrow_mut() = Some(task);
        // A pending frame picks up the new task.
        if !self.state.running.get() {
            self.state.running.set(self.state.request());
        }
    }
}

impl LoopState {
    fn request(&self) -> bool {
        let callback = self.callback.borrow();
        let (Some(window), Some(callback)) = (web::window(), callback.as_ref()) else {
            return false;
        };
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(_) => true,
            Err(e) => {
                log::error!("[visualizer] requestAnimationFrame error: {:?}", e);
                false
            }
        }
    }

    fn frame(&self) {
        let rendered = {
            let mut slot = self.task.borrow_mut();
            let rendered = match slot.as_mut().and_then(|task| task.tick()) {
                Some(frame) => {
                    self.bars.render(frame);
                    true
                }
                None => false,
            };
            if !rendered {
                *slot = None;
            }
            rendered
        };
        self.running.set(rendered && self.request());
    }
}
