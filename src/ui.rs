use loopverb_core::{play_button_label, PlaybackState, Status, StatusSink};
use web_sys as web;

use crate::constants::{ACTIVE_CLASS, PLAY_BUTTON_ID, STATUS_ID};
use crate::dom;

/// Mirrors controller state into `#status` and `#playBtn`.
pub struct DomStatus {
    document: web::Document,
}

impl DomStatus {
    pub fn new(document: web::Document) -> Self {
        Self { document }
    }

    fn set_button_active(&self, active: bool) {
        let Some(button) = self.document.get_element_by_id(PLAY_BUTTON_ID) else {
            return;
        };
        let classes = button.class_list();
        _ = if active {
            classes.add_1(ACTIVE_CLASS)
        } else {
            classes.remove_1(ACTIVE_CLASS)
        };
    }
}

impl StatusSink for DomStatus {
    fn set_status(&self, status: Status) {
        dom::set_text(&self.document, STATUS_ID, status.message());
        match status {
            Status::Loading => self.set_button_active(false),
            Status::Ready => self.set_button_active(true),
            _ => {}
        }
    }

    fn set_playback_state(&self, state: PlaybackState) {
        dom::set_text(&self.document, PLAY_BUTTON_ID, play_button_label(state));
    }
}
