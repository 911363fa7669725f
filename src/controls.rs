use std::rc::Rc;

use js_sys::Uint8Array;
use loopverb_core::{mix_label, rate_label, LooperError, PlaybackController};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

use crate::audio::WebAudio;
use crate::constants::*;
use crate::dom;

type Controller = Rc<PlaybackController<WebAudio>>;

pub fn wire(document: &web::Document, controller: &Controller) {
    wire_file_input(document, controller);
    wire_play_button(document, controller);
    wire_sliders(document, controller);
}

fn wire_file_input(document: &web::Document, controller: &Controller) {
    let controller = controller.clone();
    dom::add_input_listener(document, FILE_INPUT_ID, "change", move |input| {
        let file = input.files().and_then(|files| files.get(0));
        let controller = controller.clone();
        spawn_local(async move {
            let selection = match file {
                Some(file) => match read_file(&file).await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        let reason = format!("could not read {}: {:?}", file.name(), e);
                        controller.reject(&LooperError::Decode(reason));
                        return;
                    }
                },
                None => None,
            };
            if let Err(e) = controller.open(selection).await {
                log::warn!("[controls] open failed: {}", e);
            }
        });
    });
}

async fn read_file(file: &web::File) -> anyhow::Result<Vec<u8>> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn wire_play_button(document: &web::Document, controller: &Controller) {
    let controller = controller.clone();
    dom::add_click_listener(document, PLAY_BUTTON_ID, move || {
        let controller = controller.clone();
        spawn_local(async move {
            if let Err(e) = controller.toggle_play().await {
                log::warn!("[controls] toggle failed: {}", e);
            }
        });
    });
}

fn wire_sliders(document: &web::Document, controller: &Controller) {
    dom::set_text(document, SPEED_LABEL_ID, &rate_label(controller.rate()));
    dom::set_text(document, REVERB_LABEL_ID, &mix_label(controller.mix().ratio()));

    let speed = controller.clone();
    let speed_doc = document.clone();
    dom::add_input_listener(document, SPEED_INPUT_ID, "input", move |input| {
        let Ok(rate) = input.value().parse::<f32>() else {
            return;
        };
        dom::set_text(&speed_doc, SPEED_LABEL_ID, &rate_label(rate));
        speed.set_rate(rate);
    });

    let reverb = controller.clone();
    let reverb_doc = document.clone();
    dom::add_input_listener(document, REVERB_INPUT_ID, "input", move |input| {
        let Ok(ratio) = input.value().parse::<f32>() else {
            return;
        };
        dom::set_text(&reverb_doc, REVERB_LABEL_ID, &mix_label(ratio));
        reverb.set_mix(ratio);
    });
}
