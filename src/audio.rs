use js_sys::Uint8Array;
use loopverb_core::{AudioBackend, ClockState, ImpulseResponse, LooperError, Result};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// `AudioBackend` over a browser `AudioContext`.
pub struct WebAudio {
    ctx: web::AudioContext,
}

fn backend_error(label: &str, e: JsValue) -> LooperError {
    log::error!("{} error: {:?}", label, e);
    LooperError::Backend(format!("{label}: {e:?}"))
}

fn decode_error(e: JsValue) -> LooperError {
    LooperError::Decode(format!("{e:?}"))
}

impl WebAudio {
    pub fn new() -> Result<Self> {
        let ctx = web::AudioContext::new().map_err(|e| backend_error("AudioContext", e))?;
        Ok(Self { ctx })
    }
}

impl AudioBackend for WebAudio {
    type Node = web::AudioNode;
    type Gain = web::GainNode;
    type Convolver = web::ConvolverNode;
    type Analyser = web::AnalyserNode;
    type Source = web::AudioBufferSourceNode;
    type Buffer = web::AudioBuffer;

    fn sample_rate(&self) -> f32 {
        self.ctx.sample_rate()
    }

    fn clock_state(&self) -> ClockState {
        match self.ctx.state() {
            web::AudioContextState::Running => ClockState::Running,
            web::AudioContextState::Closed => ClockState::Closed,
            _ => ClockState::Suspended,
        }
    }

    async fn resume(&self) -> Result<()> {
        let promise = self.ctx.resume().map_err(|e| backend_error("resume", e))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| backend_error("resume", e))?;
        Ok(())
    }

    async fn suspend(&self) -> Result<()> {
        let promise = self.ctx.suspend().map_err(|e| backend_error("suspend", e))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| backend_error("suspend", e))?;
        Ok(())
    }

    async fn decode(&self, bytes: Vec<u8>) -> Result<web::AudioBuffer> {
        let data = Uint8Array::from(bytes.as_slice());
        let promise = self
            .ctx
            .decode_audio_data(&data.buffer())
            .map_err(decode_error)?;
        let decoded = JsFuture::from(promise).await.map_err(decode_error)?;
        decoded
            .dyn_into::<web::AudioBuffer>()
            .map_err(decode_error)
    }

    fn buffer_duration(&self, buffer: &web::AudioBuffer) -> f64 {
        buffer.duration()
    }

    fn create_gain(&self, value: f32) -> Result<web::GainNode> {
        let g = web::GainNode::new(&self.ctx).map_err(|e| backend_error("GainNode", e))?;
        g.gain().set_value(value);
        Ok(g)
    }

    fn set_gain(&self, gain: &web::GainNode, value: f32) {
        gain.gain().set_value(value);
    }

    fn gain(&self, gain: &web::GainNode) -> f32 {
        gain.gain().value()
    }

    fn create_convolver(&self, impulse: ImpulseResponse, normalize: bool) -> Result<web::ConvolverNode> {
        let reverb =
            web::ConvolverNode::new(&self.ctx).map_err(|e| backend_error("ConvolverNode", e))?;
        reverb.set_normalize(normalize);
        let sr = impulse.sample_rate();
        let len = impulse.len() as u32;
        let channels = impulse.channel_count() as u32;
        let ir = self
            .ctx
            .create_buffer(channels, len, sr)
            .map_err(|e| backend_error("impulse buffer", e))?;
        for (ch, mut data) in impulse.into_channels().into_iter().enumerate() {
            ir.copy_to_channel(&mut data, ch as i32)
                .map_err(|e| backend_error("impulse copy", e))?;
        }
        reverb.set_buffer(Some(&ir));
        Ok(reverb)
    }

    fn create_analyser(&self, fft_size: usize) -> Result<web::AnalyserNode> {
        let analyser =
            web::AnalyserNode::new(&self.ctx).map_err(|e| backend_error("AnalyserNode", e))?;
        analyser.set_fft_size(fft_size as u32);
        Ok(analyser)
    }

    fn frequency_bin_count(&self, analyser: &web::AnalyserNode) -> usize {
        analyser.frequency_bin_count() as usize
    }

    fn byte_frequency_data(&self, analyser: &web::AnalyserNode, out: &mut [u8]) {
        analyser.get_byte_frequency_data(out);
    }

    fn connect(&self, from: &web::AudioNode, to: &web::AudioNode) -> Result<()> {
        from.connect_with_audio_node(to)
            .map(|_| ())
            .map_err(|e| backend_error("connect", e))
    }

    fn connect_to_destination(&self, from: &web::AudioNode) -> Result<()> {
        from.connect_with_audio_node(&self.ctx.destination())
            .map(|_| ())
            .map_err(|e| backend_error("connect destination", e))
    }

    fn disconnect(&self, node: &web::AudioNode) {
        _ = node.disconnect();
    }

    fn create_source(&self, buffer: &web::AudioBuffer) -> Result<web::AudioBufferSourceNode> {
        let src = self
            .ctx
            .create_buffer_source()
            .map_err(|e| backend_error("AudioBufferSourceNode", e))?;
        src.set_buffer(Some(buffer));
        Ok(src)
    }

    fn set_looping(&self, source: &web::AudioBufferSourceNode, looping: bool) {
        source.set_loop(looping);
    }

    fn set_playback_rate(&self, source: &web::AudioBufferSourceNode, rate: f32) {
        source.playback_rate().set_value(rate);
    }

    fn playback_rate(&self, source: &web::AudioBufferSourceNode) -> f32 {
        source.playback_rate().value()
    }

    fn start_source(&self, source: &web::AudioBufferSourceNode, when: f64) -> Result<()> {
        source
            .start_with_when(when)
            .map_err(|e| backend_error("source start", e))
    }

    // Browsers throw when stopping a source that never started.
    fn stop_source(&self, source: &web::AudioBufferSourceNode) -> Result<()> {
        source
            .stop()
            .map_err(|e| LooperError::InvalidState(format!("source stop: {e:?}")))
    }
}
