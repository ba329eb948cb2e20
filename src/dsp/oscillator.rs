//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Supported waveform shapes. Sine is the platform default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A band-limited oscillator whose frequency may change every sample.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    /// Frequency in Hz.
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency: 440.0,
            phase: 0.0,
            sample_rate,
        }
    }

    fn phase_inc(&self) -> f64 {
        self.frequency / self.sample_rate
    }

    /// Generate the next sample in [-1, 1] (PolyBLEP may overshoot slightly).
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.phase_inc();
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Sawtooth => 2.0 * self.phase - 1.0 - poly_blep(self.phase, inc),
            Waveform::Square => self.square(inc),
            Waveform::Triangle => self.triangle(),
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }

    fn square(&self, inc: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, inc);
        value -= poly_blep((self.phase + 0.5) % 1.0, inc);
        value
    }

    /// Piecewise linear: -1 → +1 over the first half period, back down over the second.
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// PolyBLEP correction at the waveform discontinuity.
///
/// `t` is the phase [0, 1), `dt` the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(waveform: Waveform, frequency: f64, samples: usize) -> Vec<f64> {
        let mut osc = Oscillator::new(waveform, 44100.0);
        osc.frequency = frequency;
        (0..samples).map(|_| osc.next_sample()).collect()
    }

    #[test]
    fn sine_zero_at_start() {
        let s = run(Waveform::Sine, 440.0, 1)[0];
        assert!(s.abs() < 1e-10, "Sine should start near 0, got {s}");
    }

    #[test]
    fn waveforms_stay_in_range() {
        for (waveform, limit) in [
            (Waveform::Sine, 1.0),
            (Waveform::Triangle, 1.0),
            (Waveform::Square, 1.5),
            (Waveform::Sawtooth, 1.5),
        ] {
            for s in run(waveform, 1200.0, 44100) {
                assert!(s.abs() <= limit, "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn frequency_change_takes_effect_immediately() {
        let mut osc = Oscillator::new(Waveform::Sine, 1000.0);
        osc.frequency = 250.0;
        osc.next_sample();
        // Quarter period at 250 Hz / 1 kHz: phase 0.25 → peak.
        let peak = osc.next_sample();
        assert!((peak - 1.0).abs() < 1e-10, "expected peak, got {peak}");

        osc.reset();
        osc.frequency = 500.0;
        osc.next_sample();
        let trough = osc.next_sample();
        assert!(trough.abs() < 1e-10, "half period should cross zero, got {trough}");
    }

    #[test]
    fn default_waveform_is_sine() {
        assert_eq!(Waveform::default(), Waveform::Sine);
        let parsed: Waveform = serde_json::from_str("\"sawtooth\"").unwrap();
        assert_eq!(parsed, Waveform::Sawtooth);
    }
}
