//! Procedural voice synthesis. Every ambience loop, chime bed and one-shot
//! effect is generated at engine build time; a voice that fails validation
//! is skipped and the engine keeps running without it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::graph::Biquad;
use super::{AmbienceLayer, ChimeKind, OneShot};
use crate::error::AudioError;

use std::f32::consts::{FRAC_1_SQRT_2, PI, TAU};

/// Reverb impulse response length in seconds.
pub const IR_SECONDS: f32 = 2.4;

/// Synthesize the looping buffer for an ambience layer.
pub fn ambience(layer: AmbienceLayer, sample_rate: f32) -> Result<Vec<f32>, AudioError> {
    let buf = match layer {
        AmbienceLayer::Wind => wind_bed(sample_rate, 8.0, 420.0, 0.13, 11),
        AmbienceLayer::Breeze => wind_bed(sample_rate, 7.3, 900.0, 0.21, 23),
        AmbienceLayer::Birds => bird_bed(sample_rate, 9.0),
        AmbienceLayer::Water => water_bed(sample_rate, 8.0),
        AmbienceLayer::Crickets => cricket_bed(sample_rate, 8.0),
        AmbienceLayer::WinterWind => winter_wind_bed(sample_rate, 9.0),
    };
    finish_loop(layer.name(), buf, sample_rate)
}

/// Continuous shimmer bed for a chime voice; the scheduler swells its layer
/// gain instead of retriggering a sample.
pub fn chime(kind: ChimeKind, sample_rate: f32) -> Result<Vec<f32>, AudioError> {
    let (partials, level, name): (&[f32], f32, &'static str) = match kind {
        ChimeKind::Summer => (&[660.0, 880.0, 1320.0, 1760.0], 0.2, "chimes"),
        ChimeKind::Winter => (&[990.0, 1485.0, 1980.0, 2970.0], 0.18, "snow-chimes"),
    };
    let len = (sample_rate * 8.0) as usize;
    let mut rng = SmallRng::seed_from_u64(partials[0] as u64);
    let mut buf = vec![0.0f32; len];
    for (pi, &freq) in partials.iter().enumerate() {
        let wobble_hz = loopable_hz(0.05 + 0.04 * pi as f32, 8.0);
        let phase: f32 = rng.random::<f32>() * TAU;
        for (i, sample) in buf.iter_mut().enumerate() {
            let t = i as f32 / sample_rate;
            let wobble = 0.5 + 0.5 * (TAU * wobble_hz * t + phase).sin();
            *sample += (TAU * freq * t).sin() * wobble * level / partials.len() as f32;
        }
    }
    finish_loop(name, buf, sample_rate)
}

/// Synthesize a one-shot effect buffer.
pub fn one_shot(effect: OneShot, sample_rate: f32) -> Result<Vec<f32>, AudioError> {
    let buf = match effect {
        OneShot::Rake => rake_swish(sample_rate),
        OneShot::Drop => gravel_drop(sample_rate),
        OneShot::Click => ui_click(sample_rate),
    };
    validate(effect.name(), buf)
}

/// Reverb impulse response: exponentially decaying white noise, normalized
/// to unit energy so the return gain alone sets the wet level.
pub fn impulse_response(sample_rate: f32) -> Vec<f32> {
    let len = (sample_rate * IR_SECONDS) as usize;
    let mut rng = SmallRng::seed_from_u64(0x1e5e_12b0);
    let mut ir: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            white(&mut rng) * (-6.9 * t / IR_SECONDS).exp()
        })
        .collect();
    let energy: f32 = ir.iter().map(|s| s * s).sum();
    if energy > 0.0 {
        let scale = 1.0 / energy.sqrt();
        for s in &mut ir {
            *s *= scale;
        }
    }
    ir
}

fn white(rng: &mut SmallRng) -> f32 {
    rng.random::<f32>() * 2.0 - 1.0
}

/// Snap an LFO rate so a whole number of cycles fits the loop length,
/// keeping the loop seam inaudible.
fn loopable_hz(hz: f32, seconds: f32) -> f32 {
    (hz * seconds).round().max(1.0) / seconds
}

fn wind_bed(sample_rate: f32, seconds: f32, cutoff: f32, lfo_hz: f32, seed: u64) -> Vec<f32> {
    let len = (sample_rate * seconds) as usize;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut filter = Biquad::lowpass(sample_rate, cutoff, FRAC_1_SQRT_2);
    let lfo_hz = loopable_hz(lfo_hz, seconds);
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let gust = 0.7 + 0.3 * (TAU * lfo_hz * t).sin();
            filter.process_sample(white(&mut rng)) * gust
        })
        .collect()
}

fn bird_bed(sample_rate: f32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate * seconds) as usize;
    let mut rng = SmallRng::seed_from_u64(37);
    let mut buf = vec![0.0f32; len];
    for _ in 0..14 {
        let start = rng.random_range(0.0..seconds - 0.2);
        let dur = 0.09 + rng.random::<f32>() * 0.08;
        let f_hi = 2400.0 + rng.random::<f32>() * 800.0;
        let f_lo = f_hi - 500.0 - rng.random::<f32>() * 300.0;
        let begin = (start * sample_rate) as usize;
        let chirp_len = (dur * sample_rate) as usize;
        for i in 0..chirp_len.min(len.saturating_sub(begin)) {
            let p = i as f32 / chirp_len as f32;
            let freq = f_hi + (f_lo - f_hi) * p;
            let envelope = (PI * p).sin().powi(2) * (-3.0 * p).exp();
            buf[begin + i] += (TAU * freq * (i as f32 / sample_rate)).sin() * envelope * 0.5;
        }
    }
    buf
}

fn water_bed(sample_rate: f32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate * seconds) as usize;
    let mut rng = SmallRng::seed_from_u64(53);
    let mut filter = Biquad::highpass(sample_rate, 120.0, FRAC_1_SQRT_2);
    let ripple_hz = loopable_hz(0.3, seconds);
    let mut brown = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            brown = (brown + white(&mut rng) * 0.02) * 0.997;
            let ripple = 0.8 + 0.2 * (TAU * ripple_hz * t).sin();
            filter.process_sample(brown * 3.5) * ripple
        })
        .collect()
}

fn cricket_bed(sample_rate: f32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate * seconds) as usize;
    let mut rng = SmallRng::seed_from_u64(71);
    let phase: f32 = rng.random::<f32>() * TAU;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            // Chirp bursts: ~0.4s of 28 Hz pulses every 0.9s.
            let cycle = t % 0.9;
            let burst = if cycle < 0.4 {
                (PI * cycle / 0.4).sin()
            } else {
                0.0
            };
            let pulse = ((TAU * 28.0 * t).sin().max(0.0)).powi(2);
            (TAU * 4300.0 * t + phase).sin() * pulse * burst * 0.35
        })
        .collect()
}

fn winter_wind_bed(sample_rate: f32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate * seconds) as usize;
    let mut rng = SmallRng::seed_from_u64(97);
    let mut filter = Biquad::lowpass(sample_rate, 300.0, FRAC_1_SQRT_2);
    let lfo_hz = loopable_hz(0.09, seconds);
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let gust = 0.55 + 0.45 * (TAU * lfo_hz * t).sin();
            let whistle = (TAU * 640.0 * t).sin() * gust * gust * 0.12;
            filter.process_sample(white(&mut rng)) * gust + whistle
        })
        .collect()
}

fn rake_swish(sample_rate: f32) -> Vec<f32> {
    let len = (sample_rate * 0.35) as usize;
    let mut rng = SmallRng::seed_from_u64(5);
    let mut filter = Biquad::lowpass(sample_rate, 1400.0, FRAC_1_SQRT_2);
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            filter.process_sample(white(&mut rng)) * (-8.0 * t).exp() * 0.7
        })
        .collect()
}

fn gravel_drop(sample_rate: f32) -> Vec<f32> {
    let len = (sample_rate * 0.28) as usize;
    let mut rng = SmallRng::seed_from_u64(9);
    let mut buf = vec![0.0f32; len];
    for _ in 0..5 {
        let begin = (rng.random::<f32>() * 0.18 * sample_rate) as usize;
        let tick_len = (0.015 * sample_rate) as usize;
        for i in 0..tick_len.min(len.saturating_sub(begin)) {
            let t = i as f32 / sample_rate;
            buf[begin + i] += white(&mut rng) * (-200.0 * t).exp() * 0.6;
        }
    }
    buf
}

fn ui_click(sample_rate: f32) -> Vec<f32> {
    let len = (sample_rate * 0.06) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (TAU * 1900.0 * t).sin() * (-60.0 * t).exp() * 0.6
        })
        .collect()
}

/// Normalize, fade the seam and validate a looping bed.
fn finish_loop(
    name: &'static str,
    mut buf: Vec<f32>,
    sample_rate: f32,
) -> Result<Vec<f32>, AudioError> {
    normalize(&mut buf, 0.8);
    edge_fade(&mut buf, sample_rate, 0.05);
    validate(name, buf)
}

fn normalize(buf: &mut [f32], peak: f32) {
    let max = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if max > 0.0 {
        let scale = peak / max;
        for s in buf.iter_mut() {
            *s *= scale;
        }
    }
}

fn edge_fade(buf: &mut [f32], sample_rate: f32, seconds: f32) {
    let fade = ((sample_rate * seconds) as usize).min(buf.len() / 2);
    let len = buf.len();
    for i in 0..fade {
        let k = i as f32 / fade as f32;
        buf[i] *= k;
        buf[len - 1 - i] *= k;
    }
}

fn validate(name: &'static str, buf: Vec<f32>) -> Result<Vec<f32>, AudioError> {
    let finite = buf.iter().all(|s| s.is_finite());
    let peak = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if buf.is_empty() || !finite || peak < 1e-4 {
        return Err(AudioError::Voice(name));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ambience_voice_synthesizes() {
        for layer in AmbienceLayer::ALL {
            let buf = ambience(layer, 8000.0).unwrap();
            assert!(!buf.is_empty(), "{} empty", layer.name());
            assert!(buf.iter().all(|s| s.abs() <= 1.0), "{} clips", layer.name());
        }
    }

    #[test]
    fn loops_start_and_end_silent() {
        let buf = ambience(AmbienceLayer::Wind, 8000.0).unwrap();
        assert_eq!(buf[0], 0.0);
        assert_eq!(buf[buf.len() - 1], 0.0);
    }

    #[test]
    fn impulse_response_decays_and_has_unit_energy() {
        let ir = impulse_response(8000.0);
        assert_eq!(ir.len(), (8000.0 * IR_SECONDS) as usize);
        let head: f32 = ir[..800].iter().map(|s| s * s).sum();
        let tail: f32 = ir[ir.len() - 800..].iter().map(|s| s * s).sum();
        assert!(head > tail * 10.0);
        let energy: f32 = ir.iter().map(|s| s * s).sum();
        assert!((energy - 1.0).abs() < 1e-2);
    }

    #[test]
    fn one_shots_are_short_and_finite() {
        for effect in [OneShot::Rake, OneShot::Drop, OneShot::Click] {
            let buf = one_shot(effect, 8000.0).unwrap();
            assert!(buf.len() < 8000, "{} too long", effect.name());
        }
    }
}
