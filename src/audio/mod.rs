//! Ambient soundscape: a mixing graph of looping procedural voices routed
//! through a shared filter chain and convolution reverb, driven by the
//! scene's theme and winter state.

mod engine;
mod graph;
mod voices;

pub use engine::{AudioEngine, AudioHandle};
pub use graph::{Biquad, MixerGraph, NodeId};

/// Looping ambience voices. Two wind-like layers plus bird, water and
/// insect beds make up the summer mix; the winter loop substitutes them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbienceLayer {
    Wind,
    Breeze,
    Birds,
    Water,
    Crickets,
    WinterWind,
}

impl AmbienceLayer {
    pub const ALL: [AmbienceLayer; 6] = [
        AmbienceLayer::Wind,
        AmbienceLayer::Breeze,
        AmbienceLayer::Birds,
        AmbienceLayer::Water,
        AmbienceLayer::Crickets,
        AmbienceLayer::WinterWind,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AmbienceLayer::Wind => "wind",
            AmbienceLayer::Breeze => "breeze",
            AmbienceLayer::Birds => "birds",
            AmbienceLayer::Water => "water",
            AmbienceLayer::Crickets => "crickets",
            AmbienceLayer::WinterWind => "winter-wind",
        }
    }
}

/// Which chime voice the periodic swell drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChimeKind {
    Summer,
    Winter,
}

/// Short effects triggered by discrete user actions. Each play spawns a
/// fresh voice; overlapping plays are expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    Rake,
    Drop,
    Click,
}

impl OneShot {
    pub fn name(self) -> &'static str {
        match self {
            OneShot::Rake => "rake",
            OneShot::Drop => "drop",
            OneShot::Click => "click",
        }
    }
}
