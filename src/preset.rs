//! Built-in sound effect presets.
//!
//! Each preset is a single oscillator shaped by a frequency curve and a gain
//! envelope. The table is fixed at compile time; hosts pick entries by name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dsp::oscillator::Waveform;

// ── Automation ──────────────────────────────────────────────

/// How a parameter moves to an automation event's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampKind {
    /// Jump to the value at the event time.
    Set,
    /// Linear ramp from the previous event, arriving at the event time.
    Linear,
    /// Exponential ramp from the previous event. Targets must be positive.
    Exponential,
}

/// An automation event relative to the moment the preset is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Automation {
    pub kind: RampKind,
    pub value: f64,
    /// Seconds after trigger.
    pub offset: f64,
}

const fn set(value: f64, offset: f64) -> Automation {
    Automation { kind: RampKind::Set, value, offset }
}

const fn linear(value: f64, offset: f64) -> Automation {
    Automation { kind: RampKind::Linear, value, offset }
}

const fn exponential(value: f64, offset: f64) -> Automation {
    Automation { kind: RampKind::Exponential, value, offset }
}

/// A synthesis recipe: waveform, frequency curve (Hz), gain curve (linear
/// amplitude) and total duration (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresetRecipe {
    pub waveform: Waveform,
    pub frequency: &'static [Automation],
    pub gain: &'static [Automation],
    pub duration: f64,
}

// ── Scheduled voice ─────────────────────────────────────────

/// An automation event on the context clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamEvent {
    pub kind: RampKind,
    pub value: f64,
    /// Absolute context time in seconds.
    pub time: f64,
}

/// A recipe anchored to a concrete start time, ready for a platform to play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePlan {
    pub waveform: Waveform,
    pub frequency: Vec<ParamEvent>,
    pub gain: Vec<ParamEvent>,
    pub start: f64,
    pub stop: f64,
}

impl PresetRecipe {
    /// Anchor every event at `now`. The voice starts immediately and stops
    /// at `now + duration`.
    pub fn schedule(&self, now: f64) -> VoicePlan {
        let anchor = |events: &[Automation]| -> Vec<ParamEvent> {
            events
                .iter()
                .map(|a| ParamEvent {
                    kind: a.kind,
                    value: a.value,
                    time: now + a.offset,
                })
                .collect()
        };
        VoicePlan {
            waveform: self.waveform,
            frequency: anchor(self.frequency),
            gain: anchor(self.gain),
            start: now,
            stop: now + self.duration,
        }
    }
}

// ── Preset names ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Coin,
    Pop,
    Squish,
    Success,
    Neutral,
    Achievement,
    Fox,
    Wheel,
    Drone,
    Upgrade,
    Sold,
    Prestige,
    Cash,
    Dna,
}

impl Preset {
    pub const ALL: [Preset; 14] = [
        Preset::Coin,
        Preset::Pop,
        Preset::Squish,
        Preset::Success,
        Preset::Neutral,
        Preset::Achievement,
        Preset::Fox,
        Preset::Wheel,
        Preset::Drone,
        Preset::Upgrade,
        Preset::Sold,
        Preset::Prestige,
        Preset::Cash,
        Preset::Dna,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Coin => "coin",
            Preset::Pop => "pop",
            Preset::Squish => "squish",
            Preset::Success => "success",
            Preset::Neutral => "neutral",
            Preset::Achievement => "achievement",
            Preset::Fox => "fox",
            Preset::Wheel => "wheel",
            Preset::Drone => "drone",
            Preset::Upgrade => "upgrade",
            Preset::Sold => "sold",
            Preset::Prestige => "prestige",
            Preset::Cash => "cash",
            Preset::Dna => "dna",
        }
    }

    /// Look up a preset by its exact (lowercase) name.
    pub fn from_name(name: &str) -> Option<Preset> {
        Preset::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn recipe(self) -> &'static PresetRecipe {
        match self {
            Preset::Coin => &COIN,
            Preset::Pop => &POP,
            Preset::Squish => &SQUISH,
            Preset::Success => &SUCCESS,
            Preset::Neutral => &NEUTRAL,
            Preset::Achievement => &ACHIEVEMENT,
            Preset::Fox => &FOX,
            Preset::Wheel => &WHEEL,
            Preset::Drone => &DRONE,
            Preset::Upgrade => &UPGRADE,
            Preset::Sold => &SOLD,
            Preset::Prestige => &PRESTIGE,
            Preset::Cash => &CASH,
            Preset::Dna => &DNA,
        }
    }

    pub fn describe(self) -> PresetDescription {
        PresetDescription {
            name: self.name(),
            recipe: *self.recipe(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sound preset '{0}'")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::from_name(s).ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

/// Serializable view of a preset for host-side inspection.
#[derive(Debug, Clone, Serialize)]
pub struct PresetDescription {
    pub name: &'static str,
    #[serde(flatten)]
    pub recipe: PresetRecipe,
}

// ── Preset table ────────────────────────────────────────────

static COIN: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sine,
    frequency: &[set(1200.0, 0.0), exponential(2000.0, 0.1)],
    gain: &[set(0.3, 0.0), exponential(0.01, 0.1)],
    duration: 0.1,
};

static POP: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sine,
    frequency: &[set(600.0, 0.0), exponential(300.0, 0.1)],
    gain: &[set(0.2, 0.0), exponential(0.01, 0.1)],
    duration: 0.1,
};

static SQUISH: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sawtooth,
    frequency: &[set(150.0, 0.0), linear(50.0, 0.1)],
    gain: &[set(0.3, 0.0), linear(0.0, 0.1)],
    duration: 0.1,
};

static SUCCESS: PresetRecipe = PresetRecipe {
    waveform: Waveform::Triangle,
    frequency: &[set(440.0, 0.0), set(554.0, 0.1)],
    gain: &[set(0.2, 0.0), linear(0.0, 0.4)],
    duration: 0.4,
};

static NEUTRAL: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sine,
    frequency: &[set(440.0, 0.0)],
    gain: &[set(0.15, 0.0), linear(0.0, 0.2)],
    duration: 0.2,
};

// C5 E5 G5 C6 arpeggio
static ACHIEVEMENT: PresetRecipe = PresetRecipe {
    waveform: Waveform::Square,
    frequency: &[
        set(523.25, 0.0),
        set(659.25, 0.1),
        set(783.99, 0.2),
        set(1046.50, 0.3),
    ],
    gain: &[set(0.3, 0.0), linear(0.0, 0.8)],
    duration: 0.8,
};

static FOX: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sawtooth,
    frequency: &[set(800.0, 0.0), linear(400.0, 0.2)],
    gain: &[set(0.2, 0.0), linear(0.0, 0.2)],
    duration: 0.2,
};

static WHEEL: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sine,
    frequency: &[set(200.0, 0.0)],
    gain: &[set(0.1, 0.0), exponential(0.01, 0.05)],
    duration: 0.05,
};

static DRONE: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sine,
    frequency: &[set(200.0, 0.0), linear(600.0, 0.3)],
    gain: &[set(0.1, 0.0), linear(0.0, 0.3)],
    duration: 0.3,
};

static UPGRADE: PresetRecipe = PresetRecipe {
    waveform: Waveform::Square,
    frequency: &[set(100.0, 0.0), linear(150.0, 0.2)],
    gain: &[set(0.3, 0.0), linear(0.0, 0.3)],
    duration: 0.3,
};

static SOLD: PresetRecipe = PresetRecipe {
    waveform: Waveform::Square,
    frequency: &[set(800.0, 0.0), set(1200.0, 0.1)],
    gain: &[set(0.3, 0.0), exponential(0.01, 0.3)],
    duration: 0.3,
};

static PRESTIGE: PresetRecipe = PresetRecipe {
    waveform: Waveform::Triangle,
    frequency: &[set(200.0, 0.0), linear(800.0, 2.0)],
    gain: &[set(0.2, 0.0), linear(0.0, 2.0)],
    duration: 2.0,
};

static CASH: PresetRecipe = PresetRecipe {
    waveform: Waveform::Sine,
    frequency: &[set(800.0, 0.0), exponential(1200.0, 0.1)],
    gain: &[set(0.2, 0.0), exponential(0.01, 0.3)],
    duration: 0.3,
};

// Up and back down over one second.
static DNA: PresetRecipe = PresetRecipe {
    waveform: Waveform::Triangle,
    frequency: &[set(300.0, 0.0), linear(600.0, 0.5), linear(300.0, 1.0)],
    gain: &[set(0.2, 0.0), linear(0.0, 1.0)],
    duration: 1.0,
};
