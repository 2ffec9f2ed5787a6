//! Explicitly owned audio node arena. Nodes are created, connected and
//! removed by id; the render pass pulls one mono block through the graph.
//! Teardown releases nodes in a fixed order (sources, then gains, then
//! filters, then the master) so no node ever reads a freed input.

use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Handle to a node in the arena. Stale ids (after `remove`) are ignored by
/// every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Partition length for the convolver's uniform partitioned convolution.
const CONV_PART: usize = 512;

struct Source {
    buffer: Arc<Vec<f32>>,
    pos: usize,
    looping: bool,
    done: bool,
}

impl Source {
    fn process(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            if self.done {
                *sample = 0.0;
                continue;
            }
            if self.pos >= self.buffer.len() {
                if self.looping && !self.buffer.is_empty() {
                    self.pos = 0;
                } else {
                    self.done = true;
                    *sample = 0.0;
                    continue;
                }
            }
            *sample = self.buffer[self.pos];
            self.pos += 1;
        }
    }
}

struct GainNode {
    value: f32,
    target: f32,
    /// Per-sample increment toward `target`; 0 means jump immediately.
    step: f32,
}

impl GainNode {
    fn process(&mut self, input: &[f32], out: &mut [f32]) {
        for (o, &x) in out.iter_mut().zip(input) {
            if self.value != self.target {
                if self.step <= 0.0 || (self.value - self.target).abs() <= self.step {
                    self.value = self.target;
                } else if self.value < self.target {
                    self.value += self.step;
                } else {
                    self.value -= self.step;
                }
            }
            *o = x * self.value;
        }
    }
}

/// Transposed direct-form II biquad, RBJ cookbook coefficients.
/// Also used directly by the voice synthesizer.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn lowpass(sample_rate: f32, cutoff: f32, q: f32) -> Self {
        let (cos, alpha) = Self::omega(sample_rate, cutoff, q);
        let b1 = 1.0 - cos;
        let b0 = b1 / 2.0;
        Self::normalized(b0, b1, b0, cos, alpha)
    }

    pub fn highpass(sample_rate: f32, cutoff: f32, q: f32) -> Self {
        let (cos, alpha) = Self::omega(sample_rate, cutoff, q);
        let b0 = (1.0 + cos) / 2.0;
        let b1 = -(1.0 + cos);
        Self::normalized(b0, b1, b0, cos, alpha)
    }

    fn omega(sample_rate: f32, cutoff: f32, q: f32) -> (f32, f32) {
        let w0 = 2.0 * std::f32::consts::PI * (cutoff / sample_rate).clamp(0.0001, 0.49);
        (w0.cos(), w0.sin() / (2.0 * q.max(0.01)))
    }

    fn normalized(b0: f32, b1: f32, b2: f32, cos: f32, alpha: f32) -> Self {
        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: (-2.0 * cos) / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn process_sample(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    fn process(&mut self, input: &[f32], out: &mut [f32]) {
        for (o, &x) in out.iter_mut().zip(input) {
            *o = self.process_sample(x);
        }
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Uniform partitioned FFT convolution. Input is chunked to the partition
/// length internally, so callers may render blocks of any size.
struct Convolver {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    ir_parts: Vec<Vec<Complex<f32>>>,
    history: VecDeque<Vec<Complex<f32>>>,
    overlap: Vec<f32>,
    in_fifo: Vec<f32>,
    out_fifo: VecDeque<f32>,
}

impl Convolver {
    fn new(ir: &[f32]) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(2 * CONV_PART);
        let ifft = planner.plan_fft_inverse(2 * CONV_PART);
        let ir_parts: Vec<Vec<Complex<f32>>> = ir
            .chunks(CONV_PART)
            .map(|chunk| {
                let mut spectrum = vec![Complex::new(0.0, 0.0); 2 * CONV_PART];
                for (i, &s) in chunk.iter().enumerate() {
                    spectrum[i].re = s;
                }
                fft.process(&mut spectrum);
                spectrum
            })
            .collect();
        Self {
            fft,
            ifft,
            ir_parts,
            history: VecDeque::new(),
            overlap: vec![0.0; CONV_PART],
            in_fifo: Vec::new(),
            out_fifo: VecDeque::new(),
        }
    }

    fn process_chunk(&mut self, chunk: &[f32]) {
        let n = 2 * CONV_PART;
        let mut spectrum = vec![Complex::new(0.0, 0.0); n];
        for (i, &s) in chunk.iter().enumerate() {
            spectrum[i].re = s;
        }
        self.fft.process(&mut spectrum);
        self.history.push_front(spectrum);
        self.history.truncate(self.ir_parts.len().max(1));

        let mut acc = vec![Complex::new(0.0, 0.0); n];
        for (part, past) in self.ir_parts.iter().zip(self.history.iter()) {
            for i in 0..n {
                acc[i] += part[i] * past[i];
            }
        }
        self.ifft.process(&mut acc);
        let scale = 1.0 / n as f32;
        for i in 0..CONV_PART {
            self.out_fifo.push_back(acc[i].re * scale + self.overlap[i]);
            self.overlap[i] = acc[CONV_PART + i].re * scale;
        }
    }

    fn process(&mut self, input: &[f32], out: &mut [f32]) {
        self.in_fifo.extend_from_slice(input);
        while self.in_fifo.len() >= CONV_PART {
            let chunk: Vec<f32> = self.in_fifo.drain(..CONV_PART).collect();
            self.process_chunk(&chunk);
        }
        for o in out.iter_mut() {
            *o = self.out_fifo.pop_front().unwrap_or(0.0);
        }
    }
}

enum NodeKind {
    Source(Source),
    Gain(GainNode),
    Filter(Biquad),
    Convolver(Convolver),
}

struct Node {
    kind: NodeKind,
    inputs: Vec<NodeId>,
}

pub struct MixerGraph {
    nodes: Vec<Option<Node>>,
    output: Option<NodeId>,
    sample_rate: f32,
}

impl MixerGraph {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            nodes: Vec::new(),
            output: None,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Some(Node {
            kind,
            inputs: Vec::new(),
        }));
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_source(&mut self, buffer: Arc<Vec<f32>>, looping: bool) -> NodeId {
        self.push(NodeKind::Source(Source {
            buffer,
            pos: 0,
            looping,
            done: false,
        }))
    }

    pub fn add_gain(&mut self, initial: f32) -> NodeId {
        self.push(NodeKind::Gain(GainNode {
            value: initial,
            target: initial,
            step: 0.0,
        }))
    }

    pub fn add_highpass(&mut self, cutoff: f32) -> NodeId {
        let filter = Biquad::highpass(self.sample_rate, cutoff, std::f32::consts::FRAC_1_SQRT_2);
        self.push(NodeKind::Filter(filter))
    }

    pub fn add_lowpass(&mut self, cutoff: f32) -> NodeId {
        let filter = Biquad::lowpass(self.sample_rate, cutoff, std::f32::consts::FRAC_1_SQRT_2);
        self.push(NodeKind::Filter(filter))
    }

    pub fn add_convolver(&mut self, impulse_response: &[f32]) -> NodeId {
        self.push(NodeKind::Convolver(Convolver::new(impulse_response)))
    }

    pub fn connect(&mut self, src: NodeId, dst: NodeId) {
        if src == dst || self.nodes.get(src.0).map(Option::is_none).unwrap_or(true) {
            return;
        }
        if let Some(Some(node)) = self.nodes.get_mut(dst.0) {
            if !node.inputs.contains(&src) {
                node.inputs.push(src);
            }
        }
    }

    pub fn disconnect(&mut self, src: NodeId, dst: NodeId) {
        if let Some(Some(node)) = self.nodes.get_mut(dst.0) {
            node.inputs.retain(|&id| id != src);
        }
    }

    pub fn set_output(&mut self, id: NodeId) {
        self.output = Some(id);
    }

    pub fn set_gain(&mut self, id: NodeId, value: f32) {
        if let Some(Some(node)) = self.nodes.get_mut(id.0) {
            if let NodeKind::Gain(g) = &mut node.kind {
                g.value = value;
                g.target = value;
                g.step = 0.0;
            }
        }
    }

    /// Linearly ramp a gain node to `target` over `seconds`.
    pub fn ramp_gain(&mut self, id: NodeId, target: f32, seconds: f32) {
        let sample_rate = self.sample_rate;
        if let Some(Some(node)) = self.nodes.get_mut(id.0) {
            if let NodeKind::Gain(g) = &mut node.kind {
                g.target = target;
                g.step = if seconds <= 0.0 {
                    0.0
                } else {
                    (target - g.value).abs() / (seconds * sample_rate)
                };
            }
        }
    }

    pub fn gain_value(&self, id: NodeId) -> Option<f32> {
        match self.nodes.get(id.0)? {
            Some(Node {
                kind: NodeKind::Gain(g),
                ..
            }) => Some(g.value),
            _ => None,
        }
    }

    pub fn gain_target(&self, id: NodeId) -> Option<f32> {
        match self.nodes.get(id.0)? {
            Some(Node {
                kind: NodeKind::Gain(g),
                ..
            }) => Some(g.target),
            _ => None,
        }
    }

    pub fn source_finished(&self, id: NodeId) -> bool {
        match self.nodes.get(id.0) {
            Some(Some(Node {
                kind: NodeKind::Source(s),
                ..
            })) => s.done,
            _ => true,
        }
    }

    /// Remove a node: free its slot and drop every connection to it.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
        for node in self.nodes.iter_mut().flatten() {
            node.inputs.retain(|&input| input != id);
        }
        if self.output == Some(id) {
            self.output = None;
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    fn topo_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![(root, 0usize)];
        if let Some(v) = visited.get_mut(root.0) {
            *v = true;
        }
        while let Some((id, child)) = stack.pop() {
            let inputs: &[NodeId] = match self.nodes.get(id.0) {
                Some(Some(node)) => &node.inputs,
                _ => &[],
            };
            if child < inputs.len() {
                stack.push((id, child + 1));
                let next = inputs[child];
                if !visited[next.0] {
                    visited[next.0] = true;
                    stack.push((next, 0));
                }
            } else {
                order.push(id);
            }
        }
        order
    }

    /// Pull one mono block through the graph into `out`.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let Some(root) = self.output else {
            return;
        };
        let order = self.topo_order(root);
        let mut buffers: Vec<Option<Vec<f32>>> = vec![None; self.nodes.len()];
        for id in order {
            let mut mix = vec![0.0f32; out.len()];
            let inputs = match self.nodes.get(id.0) {
                Some(Some(node)) => node.inputs.clone(),
                _ => continue,
            };
            for input in inputs {
                if let Some(Some(buf)) = buffers.get(input.0) {
                    for (m, s) in mix.iter_mut().zip(buf) {
                        *m += s;
                    }
                }
            }
            let Some(Some(node)) = self.nodes.get_mut(id.0) else {
                continue;
            };
            let mut buf = vec![0.0f32; out.len()];
            match &mut node.kind {
                NodeKind::Source(s) => s.process(&mut buf),
                NodeKind::Gain(g) => g.process(&mix, &mut buf),
                NodeKind::Filter(f) => f.process(&mix, &mut buf),
                NodeKind::Convolver(c) => c.process(&mix, &mut buf),
            }
            buffers[id.0] = Some(buf);
        }
        if let Some(Some(buf)) = buffers.get(root.0) {
            out.copy_from_slice(buf);
        }
    }

    /// Release every node in dependency-safe order: sources first, then
    /// gains, then filters and convolvers, the output gain last.
    pub fn teardown(&mut self) {
        let ids: Vec<NodeId> = (0..self.nodes.len()).map(NodeId).collect();
        let rank = |node: &Node, id: NodeId, output: Option<NodeId>| match &node.kind {
            _ if Some(id) == output => 3,
            NodeKind::Source(_) => 0,
            NodeKind::Gain(_) => 1,
            NodeKind::Filter(_) | NodeKind::Convolver(_) => 2,
        };
        for pass in 0..=3 {
            for &id in &ids {
                let matches = match self.nodes.get(id.0) {
                    Some(Some(node)) => rank(node, id, self.output) == pass,
                    _ => false,
                };
                if matches {
                    self.remove(id);
                }
            }
        }
        self.output = None;
        debug!("mixer graph torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn const_source(graph: &mut MixerGraph, value: f32, len: usize) -> NodeId {
        graph.add_source(Arc::new(vec![value; len]), true)
    }

    #[test]
    fn gain_scales_and_ramps() {
        let mut graph = MixerGraph::new(100.0);
        let src = const_source(&mut graph, 1.0, 16);
        let gain = graph.add_gain(0.0);
        graph.connect(src, gain);
        graph.set_output(gain);

        // 1 second ramp at 100 Hz: after 100 samples the value arrives.
        graph.ramp_gain(gain, 1.0, 1.0);
        let mut out = vec![0.0f32; 100];
        graph.render(&mut out);
        assert!(out[0] < 0.1);
        graph.render(&mut out);
        assert!((graph.gain_value(gain).unwrap() - 1.0).abs() < 1e-4);
        assert!((out[50] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn one_shot_source_finishes() {
        let mut graph = MixerGraph::new(100.0);
        let src = graph.add_source(Arc::new(vec![0.5; 8]), false);
        let gain = graph.add_gain(1.0);
        graph.connect(src, gain);
        graph.set_output(gain);
        let mut out = vec![0.0f32; 16];
        graph.render(&mut out);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert_eq!(out[12], 0.0);
        assert!(graph.source_finished(src));
    }

    #[test]
    fn highpass_rejects_dc() {
        let mut filter = Biquad::highpass(44_100.0, 40.0, std::f32::consts::FRAC_1_SQRT_2);
        let mut last = 0.0;
        for _ in 0..44_100 {
            last = filter.process_sample(1.0);
        }
        assert!(last.abs() < 0.01, "dc should be attenuated, got {last}");
    }

    #[test]
    fn convolver_with_unit_impulse_is_identity() {
        let mut conv = Convolver::new(&[1.0]);
        let input: Vec<f32> = (0..CONV_PART).map(|i| (i % 7) as f32 * 0.1).collect();
        let mut out = vec![0.0f32; CONV_PART];
        conv.process(&input, &mut out);
        for (a, b) in input.iter().zip(&out) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn remove_drops_connections() {
        let mut graph = MixerGraph::new(100.0);
        let src = const_source(&mut graph, 1.0, 4);
        let gain = graph.add_gain(1.0);
        graph.connect(src, gain);
        graph.set_output(gain);
        graph.remove(src);
        let mut out = vec![1.0f32; 8];
        graph.render(&mut out);
        assert_eq!(out[0], 0.0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn teardown_empties_the_arena() {
        let mut graph = MixerGraph::new(100.0);
        let src = const_source(&mut graph, 1.0, 4);
        let gain = graph.add_gain(1.0);
        let lp = graph.add_lowpass(1000.0);
        graph.connect(src, gain);
        graph.connect(gain, lp);
        graph.set_output(lp);
        graph.teardown();
        assert_eq!(graph.node_count(), 0);
    }
}
