//! The audio engine proper: owns the mixer graph behind a mutex shared with
//! the cpal output callback, applies theme/winter mixes, schedules chime
//! swells and spawns one-shot voices.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::graph::{MixerGraph, NodeId};
use super::{AmbienceLayer, ChimeKind, OneShot, voices};
use crate::error::AudioError;
use crate::scene::Theme;

/// Sample rate used until a real output stream dictates one.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Seconds for theme mix ramps.
const MIX_RAMP: f32 = 1.2;
/// Seconds for master volume and mute ramps; long enough to avoid clicks.
const VOLUME_RAMP: f32 = 0.12;

/// Chime layer gain at rest and at the top of a swell.
const CHIME_REST: f32 = 0.04;
const CHIME_SWELL: f32 = 0.7;
/// Seconds the swell holds before easing back down.
const SWELL_HOLD: f32 = 1.2;

/// Winter substitutes the whole ambience set with one wind loop.
const WINTER_WIND_LEVEL: f32 = 0.55;

/// Per-theme ambience targets. Night favors the water and insect voices,
/// morning the wind and bird voices.
fn theme_mix(theme: Theme) -> [(AmbienceLayer, f32); 5] {
    use AmbienceLayer::*;
    match theme {
        Theme::Morning => [
            (Wind, 0.45),
            (Breeze, 0.20),
            (Birds, 0.50),
            (Water, 0.15),
            (Crickets, 0.0),
        ],
        Theme::Day => [
            (Wind, 0.40),
            (Breeze, 0.15),
            (Birds, 0.35),
            (Water, 0.30),
            (Crickets, 0.05),
        ],
        Theme::Dusk => [
            (Wind, 0.45),
            (Breeze, 0.25),
            (Birds, 0.10),
            (Water, 0.40),
            (Crickets, 0.15),
        ],
        Theme::Night => [
            (Wind, 0.08),
            (Breeze, 0.05),
            (Birds, 0.0),
            (Water, 0.50),
            (Crickets, 0.60),
        ],
    }
}

#[derive(Debug, Clone, Copy)]
struct LayerIds {
    gain: NodeId,
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    master_volume: f32,
    muted: bool,
    chime_interval: f32,
    theme: Theme,
    winter: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            muted: false,
            chime_interval: 12.0,
            theme: Theme::default(),
            winter: false,
        }
    }
}

struct OneShotVoice {
    source: NodeId,
    dry: NodeId,
    send: NodeId,
}

struct EngineInner {
    graph: MixerGraph,
    layers: [Option<LayerIds>; 6],
    chime: Option<LayerIds>,
    snow_chime: Option<LayerIds>,
    master: NodeId,
    convolver: NodeId,
    effects: [Option<Arc<Vec<f32>>>; 3],
    one_shots: Vec<OneShotVoice>,
    settings: Settings,
    chime_kind: ChimeKind,
    chime_countdown: Option<f64>,
    chime_swell: Option<f64>,
    chime_rng: SmallRng,
}

impl EngineInner {
    fn new(sample_rate: f32, settings: Settings) -> Self {
        let mut graph = MixerGraph::new(sample_rate);

        // Shared chain: ambience bus -> high-pass -> low-pass -> master.
        let bus = graph.add_gain(1.0);
        let highpass = graph.add_highpass(40.0);
        let lowpass = graph.add_lowpass(6500.0);
        let master = graph.add_gain(if settings.muted {
            0.0
        } else {
            settings.master_volume
        });
        graph.connect(bus, highpass);
        graph.connect(highpass, lowpass);
        graph.connect(lowpass, master);
        graph.set_output(master);

        // Reverb send: bus -> convolver -> return -> master.
        let ir = voices::impulse_response(sample_rate);
        let convolver = graph.add_convolver(&ir);
        let send = graph.add_gain(0.35);
        let reverb_return = graph.add_gain(0.25);
        graph.connect(bus, send);
        graph.connect(send, convolver);
        graph.connect(convolver, reverb_return);
        graph.connect(reverb_return, master);

        let build_layer = |graph: &mut MixerGraph, buf: Result<Vec<f32>, AudioError>| match buf {
            Ok(buf) => {
                let source = graph.add_source(Arc::new(buf), true);
                let gain = graph.add_gain(0.0);
                graph.connect(source, gain);
                graph.connect(gain, bus);
                Some(LayerIds { gain })
            }
            Err(err) => {
                // Keep going without the voice.
                warn!("{err}");
                None
            }
        };

        let mut layers: [Option<LayerIds>; 6] = [None; 6];
        for (i, layer) in AmbienceLayer::ALL.into_iter().enumerate() {
            layers[i] = build_layer(&mut graph, voices::ambience(layer, sample_rate));
        }
        let chime = build_layer(&mut graph, voices::chime(ChimeKind::Summer, sample_rate));
        let snow_chime = build_layer(&mut graph, voices::chime(ChimeKind::Winter, sample_rate));

        let effects = [
            voices::one_shot(OneShot::Rake, sample_rate)
                .map_err(|err| warn!("{err}"))
                .ok()
                .map(Arc::new),
            voices::one_shot(OneShot::Drop, sample_rate)
                .map_err(|err| warn!("{err}"))
                .ok()
                .map(Arc::new),
            voices::one_shot(OneShot::Click, sample_rate)
                .map_err(|err| warn!("{err}"))
                .ok()
                .map(Arc::new),
        ];

        let mut inner = Self {
            graph,
            layers,
            chime,
            snow_chime,
            master,
            convolver,
            effects,
            one_shots: Vec::new(),
            settings,
            chime_kind: ChimeKind::Summer,
            chime_countdown: None,
            chime_swell: None,
            chime_rng: SmallRng::seed_from_u64(0xc1135),
        };
        // Ease into the configured mix from silence.
        if settings.winter {
            inner.apply_winter(true);
        } else {
            inner.apply_theme(settings.theme);
        }
        inner
    }

    fn layer_ids(&self, layer: AmbienceLayer) -> Option<LayerIds> {
        let index = AmbienceLayer::ALL.iter().position(|&l| l == layer)?;
        self.layers[index]
    }

    fn ramp_layer(&mut self, layer: AmbienceLayer, target: f32) {
        if let Some(ids) = self.layer_ids(layer) {
            self.graph.ramp_gain(ids.gain, target, MIX_RAMP);
        }
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.settings.winter = false;
        for (layer, target) in theme_mix(theme) {
            self.ramp_layer(layer, target);
        }
        self.ramp_layer(AmbienceLayer::WinterWind, 0.0);
        self.arm_chimes(ChimeKind::Summer);
    }

    fn apply_winter(&mut self, on: bool) {
        if !on {
            let theme = self.settings.theme;
            self.apply_theme(theme);
            return;
        }
        self.settings.winter = true;
        for (layer, _) in theme_mix(self.settings.theme) {
            self.ramp_layer(layer, 0.0);
        }
        self.ramp_layer(AmbienceLayer::WinterWind, WINTER_WIND_LEVEL);
        self.arm_chimes(ChimeKind::Winter);
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.settings.master_volume = volume.clamp(0.0, 1.0);
        if !self.settings.muted {
            self.graph
                .ramp_gain(self.master, self.settings.master_volume, VOLUME_RAMP);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        let target = if muted {
            0.0
        } else {
            self.settings.master_volume
        };
        self.graph.ramp_gain(self.master, target, VOLUME_RAMP);
    }

    fn set_chime_interval(&mut self, seconds: f32) {
        self.settings.chime_interval = seconds.max(4.0);
    }

    fn chime_layer(&self) -> Option<LayerIds> {
        match self.chime_kind {
            ChimeKind::Summer => self.chime,
            ChimeKind::Winter => self.snow_chime,
        }
    }

    /// (Re)arm the self-rescheduling chime swell for the given voice.
    fn arm_chimes(&mut self, kind: ChimeKind) {
        // Silence whichever chime bed was active before switching.
        if let Some(ids) = self.chime_layer() {
            self.graph.ramp_gain(ids.gain, 0.0, VOLUME_RAMP);
        }
        self.chime_kind = kind;
        if let Some(ids) = self.chime_layer() {
            self.graph.ramp_gain(ids.gain, CHIME_REST, MIX_RAMP);
        }
        self.chime_countdown = Some(self.next_interval_samples());
        self.chime_swell = None;
    }

    fn cancel_chimes(&mut self) {
        self.chime_countdown = None;
        self.chime_swell = None;
    }

    fn next_interval_samples(&mut self) -> f64 {
        let jitter: f32 = self.chime_rng.random_range(0.6..1.4);
        (self.settings.chime_interval * jitter) as f64 * self.graph.sample_rate() as f64
    }

    /// Advance the chime scheduler by `samples`. Each firing swells the
    /// chime layer's gain and re-arms itself with fresh jitter.
    fn advance_chimes(&mut self, samples: usize) {
        let n = samples as f64;
        if let Some(countdown) = self.chime_countdown {
            if countdown > n {
                self.chime_countdown = Some(countdown - n);
            } else {
                if let Some(ids) = self.chime_layer() {
                    self.graph.ramp_gain(ids.gain, CHIME_SWELL, 0.4);
                }
                self.chime_swell = Some(SWELL_HOLD as f64 * self.graph.sample_rate() as f64);
                self.chime_countdown = Some(self.next_interval_samples());
            }
        }
        if let Some(swell) = self.chime_swell {
            if swell > n {
                self.chime_swell = Some(swell - n);
            } else {
                self.chime_swell = None;
                if let Some(ids) = self.chime_layer() {
                    self.graph.ramp_gain(ids.gain, CHIME_REST, 1.0);
                }
            }
        }
    }

    fn play_one_shot(&mut self, effect: OneShot) {
        let index = match effect {
            OneShot::Rake => 0,
            OneShot::Drop => 1,
            OneShot::Click => 2,
        };
        // A voice that failed to synthesize is silently absent.
        let Some(buffer) = self.effects[index].clone() else {
            return;
        };
        let level = match effect {
            OneShot::Rake => 0.45,
            OneShot::Drop => 0.4,
            OneShot::Click => 0.5,
        };
        let source = self.graph.add_source(buffer, false);
        let dry = self.graph.add_gain(level);
        let send = self.graph.add_gain(0.18);
        self.graph.connect(source, dry);
        self.graph.connect(dry, self.master);
        self.graph.connect(source, send);
        self.graph.connect(send, self.convolver);
        self.one_shots.push(OneShotVoice { source, dry, send });
    }

    fn reap_one_shots(&mut self) {
        let mut finished = Vec::new();
        self.one_shots.retain(|voice| {
            if self.graph.source_finished(voice.source) {
                finished.push([voice.source, voice.dry, voice.send]);
                false
            } else {
                true
            }
        });
        for [source, dry, send] in finished {
            self.graph.remove(source);
            self.graph.remove(dry);
            self.graph.remove(send);
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        self.advance_chimes(out.len());
        self.reap_one_shots();
        self.graph.render(out);
    }

    fn teardown(&mut self) {
        self.cancel_chimes();
        self.one_shots.clear();
        self.graph.teardown();
    }
}

/// Clonable handle used by scene-change subscribers and anything else that
/// needs to poke the engine without owning it.
#[derive(Clone)]
pub struct AudioHandle {
    inner: Arc<Mutex<EngineInner>>,
}

impl AudioHandle {
    /// Remix for the given theme/winter state.
    pub fn apply_scene(&self, theme: Theme, winter: bool) {
        let mut inner = self.inner.lock();
        if winter {
            inner.apply_winter(true);
        } else {
            inner.apply_theme(theme);
        }
    }

    pub fn play_effect(&self, effect: OneShot) {
        self.inner.lock().play_one_shot(effect);
    }
}

/// Ambience engine. Constructed inert; [`AudioEngine::start`] opens the
/// output stream and is safe to call repeatedly.
pub struct AudioEngine {
    inner: Arc<Mutex<EngineInner>>,
    stream: Option<cpal::Stream>,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineInner::new(
                sample_rate,
                Settings::default(),
            ))),
            stream: None,
        }
    }

    pub fn handle(&self) -> AudioHandle {
        AudioHandle {
            inner: self.inner.clone(),
        }
    }

    pub fn is_started(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the output stream and begin pulling from the graph. Idempotent;
    /// called from the first user gesture so the platform unlock succeeds.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat);
        }
        let stream_config: cpal::StreamConfig = config.into();
        let device_rate = stream_config.sample_rate.0 as f32;

        {
            // Rebuild the graph at the device rate if it differs from the
            // rate the voices were synthesized at.
            let mut inner = self.inner.lock();
            if (inner.graph.sample_rate() - device_rate).abs() > f32::EPSILON {
                let settings = inner.settings;
                *inner = EngineInner::new(device_rate, settings);
            }
        }

        let shared = self.inner.clone();
        let channels = (stream_config.channels as usize).max(1);
        let mut scratch: Vec<f32> = Vec::new();
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    let frames = data.len() / channels;
                    scratch.resize(frames, 0.0);
                    shared.lock().render(&mut scratch);
                    for (frame, &sample) in data.chunks_mut(channels).zip(scratch.iter()) {
                        for out in frame {
                            *out = sample;
                        }
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;
        info!("audio stream started at {device_rate} Hz, {channels} ch");
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop the stream but keep the graph so `start` can resume.
    pub fn stop(&mut self) {
        self.stream = None;
    }

    /// Cancel the chime timer, release all voices and tear the graph down.
    pub fn teardown(&mut self) {
        self.stream = None;
        self.inner.lock().teardown();
    }

    pub fn apply_theme(&self, theme: Theme) {
        self.inner.lock().apply_theme(theme);
    }

    pub fn apply_winter(&self, on: bool) {
        self.inner.lock().apply_winter(on);
    }

    pub fn set_master_volume(&self, volume: f32) {
        self.inner.lock().set_master_volume(volume);
    }

    pub fn set_muted(&self, muted: bool) {
        self.inner.lock().set_muted(muted);
    }

    pub fn master_volume(&self) -> f32 {
        self.inner.lock().settings.master_volume
    }

    pub fn is_muted(&self) -> bool {
        self.inner.lock().settings.muted
    }

    pub fn set_chime_interval(&self, seconds: f32) {
        self.inner.lock().set_chime_interval(seconds);
    }

    pub fn play_effect(&self, effect: OneShot) {
        self.inner.lock().play_one_shot(effect);
    }

    /// Target gain an ambience layer is ramping toward, `None` if the voice
    /// failed to load.
    pub fn layer_gain_target(&self, layer: AmbienceLayer) -> Option<f32> {
        let inner = self.inner.lock();
        let ids = inner.layer_ids(layer)?;
        inner.graph.gain_target(ids.gain)
    }

    pub fn master_gain_target(&self) -> Option<f32> {
        let inner = self.inner.lock();
        inner.graph.gain_target(inner.master)
    }

    pub fn chime_armed(&self) -> bool {
        self.inner.lock().chime_countdown.is_some()
    }

    /// Target gain of the active chime layer; rises to the swell level
    /// while a chime is sounding.
    pub fn chime_gain_target(&self) -> Option<f32> {
        let inner = self.inner.lock();
        let ids = inner.chime_layer()?;
        inner.graph.gain_target(ids.gain)
    }

    pub fn active_one_shots(&self) -> usize {
        self.inner.lock().one_shots.len()
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().graph.node_count()
    }

    /// Pull a block without a live stream; the test entry point.
    pub fn render_block(&self, out: &mut [f32]) {
        self.inner.lock().render(out);
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}
