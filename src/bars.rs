use loopverb_core::SpectrumFrame;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::constants::{BAR_CLASS, BAR_IDLE_HEIGHT, VISUALIZER_ID};

/// The `div.bar` elements inside `#visualizer`, lowest frequency first.
pub struct BarView {
    bars: Vec<web::HtmlElement>,
}

impl BarView {
    pub fn new(document: &web::Document, count: usize) -> anyhow::Result<Self> {
        let container = document
            .get_element_by_id(VISUALIZER_ID)
            .ok_or_else(|| anyhow::anyhow!("missing #{}", VISUALIZER_ID))?;
        container.set_inner_html("");

        let mut bars = Vec::with_capacity(count);
        for _ in 0..count {
            let bar = document
                .create_element("div")
                .map_err(|e| anyhow::anyhow!("{:?}", e))?
                .dyn_into::<web::HtmlElement>()
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            bar.set_class_name(BAR_CLASS);
            _ = bar.style().set_property("height", BAR_IDLE_HEIGHT);
            _ = container.append_child(&bar);
            bars.push(bar);
        }
        log::info!("[visualizer] {} bars", bars.len());
        Ok(Self { bars })
    }

    pub fn render(&self, frame: &SpectrumFrame) {
        for (bar, height) in self.bars.iter().zip(frame.bars()) {
            _ = bar
                .style()
                .set_property("height", &format!("{}%", height * 100.0));
        }
    }
}
