//! A pure-Rust backend that renders the graph block by block.
//!
//! Mirrors the browser graph closely enough to run the whole player off the
//! main thread or in tests: looping buffer sources, gains, partitioned
//! convolution and a byte-spectrum analyser. The context starts suspended,
//! like an autoplay-blocked browser context, and renders silence without
//! advancing its clock until resumed.

mod analyser;
mod block;
mod convolver;
mod decode;
mod source;

use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::{AudioBackend, ClockState};
use crate::buffer::DecodedAudio;
use crate::constants::RENDER_QUANTUM;
use crate::error::{LooperError, Result};
use crate::impulse::ImpulseResponse;

use analyser::Analyser;
use block::Block;
use convolver::Convolver;
use source::BufferSource;

pub use decode::decode_wav;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl AsRef<NodeId> for NodeId {
    fn as_ref(&self) -> &NodeId {
        self
    }
}

enum NodeKind {
    Gain(f32),
    Convolver(Box<Convolver>),
    Analyser(Box<Analyser>),
    Source(Box<BufferSource>),
}

impl NodeKind {
    fn process(&mut self, input: Block, frame: u64, sample_rate: f32) -> Block {
        match self {
            NodeKind::Gain(value) => input.scaled(*value),
            NodeKind::Convolver(conv) => conv.process(&input),
            NodeKind::Analyser(analyser) => {
                analyser.push(&input);
                input
            }
            NodeKind::Source(src) => src.render(frame, sample_rate),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Node(NodeId),
    Destination,
}

struct Graph {
    // Released sources leave a hole so ids stay stable
    nodes: Vec<Option<NodeKind>>,
    edges: Vec<(NodeId, Target)>,
    clock: ClockState,
    frame: u64,
    sources_created: usize,
}

impl Graph {
    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn source_mut(&mut self, id: NodeId) -> Option<&mut BufferSource> {
        match self.node_mut(id) {
            Some(NodeKind::Source(src)) => Some(src.as_mut()),
            _ => None,
        }
    }

    fn add(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Some(kind));
        NodeId(self.nodes.len() - 1)
    }

    fn link(&mut self, from: NodeId, to: Target) -> Result<()> {
        let live = |id: NodeId| self.nodes.get(id.0).is_some_and(Option::is_some);
        if !live(from) || matches!(to, Target::Node(n) if !live(n)) {
            return Err(LooperError::InvalidState(format!(
                "cannot connect {from:?} to {to:?}"
            )));
        }
        if !self.edges.contains(&(from, to)) {
            self.edges.push((from, to));
        }
        Ok(())
    }

    // Kahn's algorithm over live nodes; nodes caught in a cycle are skipped.
    fn order(&self) -> Vec<NodeId> {
        let mut indegree = vec![0usize; self.nodes.len()];
        for (_, to) in &self.edges {
            if let Target::Node(n) = to {
                indegree[n.0] += 1;
            }
        }
        let mut ready: Vec<NodeId> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].is_some() && indegree[i] == 0)
            .map(NodeId)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop() {
            order.push(id);
            for (from, to) in &self.edges {
                if let (true, Target::Node(n)) = (*from == id, to) {
                    indegree[n.0] -= 1;
                    if indegree[n.0] == 0 {
                        ready.push(*n);
                    }
                }
            }
        }
        order
    }

    fn process(&mut self, sample_rate: f32) -> Block {
        let mut inputs: Vec<Block> = vec![Block::default(); self.nodes.len()];
        let mut destination = Block::default();
        for id in self.order() {
            let input = std::mem::take(&mut inputs[id.0]);
            let frame = self.frame;
            let Some(node) = self.node_mut(id) else {
                continue;
            };
            let output = node.process(input, frame, sample_rate);
            for (_, to) in self.edges.iter().filter(|(from, _)| *from == id) {
                match to {
                    Target::Node(n) => inputs[n.0].mix_in(&output),
                    Target::Destination => destination.mix_in(&output),
                }
            }
        }
        self.frame += RENDER_QUANTUM as u64;
        destination
    }
}

pub struct OfflineContext {
    sample_rate: f32,
    graph: RefCell<Graph>,
}

impl OfflineContext {
    pub fn new(sample_rate: f32) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(LooperError::Config(format!(
                "context sample rate must be positive, got {sample_rate}"
            )));
        }
        Ok(Self {
            sample_rate,
            graph: RefCell::new(Graph {
                nodes: Vec::new(),
                edges: Vec::new(),
                clock: ClockState::Suspended,
                frame: 0,
                sources_created: 0,
            }),
        })
    }

    /// Wrap already decoded audio as a buffer for `create_source`.
    pub fn create_buffer(&self, audio: DecodedAudio) -> Rc<DecodedAudio> {
        Rc::new(audio)
    }

    /// Render at least `frames` frames (whole render quanta) of stereo output.
    pub fn render(&self, frames: usize) -> [Vec<f32>; 2] {
        let quanta = frames.div_ceil(RENDER_QUANTUM);
        let mut left = Vec::with_capacity(quanta * RENDER_QUANTUM);
        let mut right = Vec::with_capacity(quanta * RENDER_QUANTUM);
        let mut graph = self.graph.borrow_mut();
        for _ in 0..quanta {
            let block = if graph.clock == ClockState::Running {
                graph.process(self.sample_rate)
            } else {
                Block::default()
            };
            left.extend_from_slice(&block.left);
            right.extend_from_slice(&block.right);
        }
        [left, right]
    }

    pub fn render_seconds(&self, seconds: f64) -> [Vec<f32>; 2] {
        self.render((seconds * self.sample_rate as f64).ceil() as usize)
    }

    /// Sources started and not yet stopped, ended or released.
    pub fn active_sources(&self) -> usize {
        self.graph
            .borrow()
            .nodes
            .iter()
            .filter(|n| matches!(n, Some(NodeKind::Source(src)) if src.is_active()))
            .count()
    }

    pub fn sources_created(&self) -> usize {
        self.graph.borrow().sources_created
    }

    /// Read position in buffer frames.
    pub fn source_position(&self, source: &NodeId) -> Option<f64> {
        self.graph
            .borrow_mut()
            .source_mut(*source)
            .map(|src| src.position())
    }

    /// How many times the source wrapped back to the start.
    pub fn source_loops(&self, source: &NodeId) -> Option<u32> {
        self.graph
            .borrow_mut()
            .source_mut(*source)
            .map(|src| src.loops())
    }

    pub fn is_source_active(&self, source: &NodeId) -> bool {
        self.graph
            .borrow_mut()
            .source_mut(*source)
            .is_some_and(|src| src.is_active())
    }

    /// Live sources in creation order.
    pub fn live_sources(&self) -> Vec<NodeId> {
        self.graph
            .borrow()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Some(NodeKind::Source(_))))
            .map(|(i, _)| NodeId(i))
            .collect()
    }
}

impl AudioBackend for OfflineContext {
    type Node = NodeId;
    type Gain = NodeId;
    type Convolver = NodeId;
    type Analyser = NodeId;
    type Source = NodeId;
    type Buffer = Rc<DecodedAudio>;

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn clock_state(&self) -> ClockState {
        self.graph.borrow().clock
    }

    async fn resume(&self) -> Result<()> {
        let mut graph = self.graph.borrow_mut();
        if graph.clock == ClockState::Closed {
            return Err(LooperError::InvalidState("context is closed".into()));
        }
        graph.clock = ClockState::Running;
        Ok(())
    }

    async fn suspend(&self) -> Result<()> {
        let mut graph = self.graph.borrow_mut();
        if graph.clock == ClockState::Closed {
            return Err(LooperError::InvalidState("context is closed".into()));
        }
        graph.clock = ClockState::Suspended;
        Ok(())
    }

    async fn decode(&self, bytes: Vec<u8>) -> Result<Rc<DecodedAudio>> {
        decode_wav(&bytes).map(Rc::new)
    }

    fn buffer_duration(&self, buffer: &Rc<DecodedAudio>) -> f64 {
        buffer.duration()
    }

    fn create_gain(&self, value: f32) -> Result<NodeId> {
        Ok(self.graph.borrow_mut().add(NodeKind::Gain(value)))
    }

    fn set_gain(&self, gain: &NodeId, value: f32) {
        match self.graph.borrow_mut().node_mut(*gain) {
            Some(NodeKind::Gain(v)) => *v = value,
            _ => log::warn!("[offline] {:?} is not a gain node", gain),
        }
    }

    fn gain(&self, gain: &NodeId) -> f32 {
        match self.graph.borrow_mut().node_mut(*gain) {
            Some(NodeKind::Gain(v)) => *v,
            _ => 0.0,
        }
    }

    fn create_convolver(&self, impulse: ImpulseResponse, normalize: bool) -> Result<NodeId> {
        let conv = Convolver::new(impulse, normalize);
        Ok(self
            .graph
            .borrow_mut()
            .add(NodeKind::Convolver(Box::new(conv))))
    }

    fn create_analyser(&self, fft_size: usize) -> Result<NodeId> {
        let analyser = Analyser::new(fft_size)?;
        Ok(self
            .graph
            .borrow_mut()
            .add(NodeKind::Analyser(Box::new(analyser))))
    }

    fn frequency_bin_count(&self, analyser: &NodeId) -> usize {
        match self.graph.borrow_mut().node_mut(*analyser) {
            Some(NodeKind::Analyser(a)) => a.frequency_bin_count(),
            _ => 0,
        }
    }

    fn byte_frequency_data(&self, analyser: &NodeId, out: &mut [u8]) {
        match self.graph.borrow_mut().node_mut(*analyser) {
            Some(NodeKind::Analyser(a)) => a.byte_frequency_data(out),
            _ => out.fill(0),
        }
    }

    fn connect(&self, from: &NodeId, to: &NodeId) -> Result<()> {
        self.graph.borrow_mut().link(*from, Target::Node(*to))
    }

    fn connect_to_destination(&self, from: &NodeId) -> Result<()> {
        self.graph.borrow_mut().link(*from, Target::Destination)
    }

    fn disconnect(&self, node: &NodeId) {
        let graph = &mut *self.graph.borrow_mut();
        graph.edges.retain(|(from, _)| from != node);
        // Sources can't be restarted, so a disconnected one is dropped
        if matches!(graph.nodes.get(node.0), Some(Some(NodeKind::Source(_)))) {
            graph.nodes[node.0] = None;
            graph.edges.retain(|(_, to)| *to != Target::Node(*node));
        }
    }

    fn create_source(&self, buffer: &Rc<DecodedAudio>) -> Result<NodeId> {
        let mut graph = self.graph.borrow_mut();
        graph.sources_created += 1;
        Ok(graph.add(NodeKind::Source(Box::new(BufferSource::new(buffer.clone())))))
    }

    fn set_looping(&self, source: &NodeId, looping: bool) {
        if let Some(src) = self.graph.borrow_mut().source_mut(*source) {
            src.set_looping(looping);
        }
    }

    fn set_playback_rate(&self, source: &NodeId, rate: f32) {
        if let Some(src) = self.graph.borrow_mut().source_mut(*source) {
            src.set_rate(rate);
        }
    }

    fn playback_rate(&self, source: &NodeId) -> f32 {
        self.graph
            .borrow_mut()
            .source_mut(*source)
            .map_or(0.0, |src| src.rate())
    }

    fn start_source(&self, source: &NodeId, when: f64) -> Result<()> {
        let mut graph = self.graph.borrow_mut();
        let start_frame = (when.max(0.0) * self.sample_rate as f64).round() as u64;
        let start_frame = start_frame.max(graph.frame);
        match graph.source_mut(*source) {
            Some(src) => src.start(start_frame),
            None => Err(LooperError::InvalidState(format!(
                "{source:?} is not a live source"
            ))),
        }
    }

    fn stop_source(&self, source: &NodeId) -> Result<()> {
        match self.graph.borrow_mut().source_mut(*source) {
            Some(src) => src.stop(),
            None => Ok(()),
        }
    }
}
