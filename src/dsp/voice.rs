//! Voice: one scheduled tone, an oscillator through an automated gain.

use crate::preset::VoicePlan;

use super::automation::value_at;
use super::oscillator::Oscillator;

/// Default oscillator frequency before any automation event.
const DEFAULT_FREQUENCY: f64 = 440.0;
/// Default gain before any automation event.
const DEFAULT_GAIN: f64 = 1.0;

/// Renders a `VoicePlan` sample by sample on an absolute sample clock.
#[derive(Debug, Clone)]
pub struct Voice {
    plan: VoicePlan,
    oscillator: Oscillator,
    sample_rate: f64,
}

impl Voice {
    pub fn new(plan: VoicePlan, sample_rate: f64) -> Self {
        Voice {
            oscillator: Oscillator::new(plan.waveform, sample_rate),
            plan,
            sample_rate,
        }
    }

    /// First sample index (on the context clock) this voice sounds at.
    pub fn start_sample(&self) -> usize {
        (self.plan.start.max(0.0) * self.sample_rate).round() as usize
    }

    /// Sample index at which the voice has stopped.
    pub fn stop_sample(&self) -> usize {
        (self.plan.stop.max(0.0) * self.sample_rate).round() as usize
    }

    /// Render the whole voice. Element 0 corresponds to `start_sample()`.
    pub fn render(mut self) -> Vec<f64> {
        let start = self.start_sample();
        let stop = self.stop_sample().max(start);
        (start..stop).map(|i| self.sample_at(i)).collect()
    }

    fn sample_at(&mut self, index: usize) -> f64 {
        let t = index as f64 / self.sample_rate;
        self.oscillator.frequency = value_at(&self.plan.frequency, DEFAULT_FREQUENCY, t);
        let gain = value_at(&self.plan.gain, DEFAULT_GAIN, t);
        self.oscillator.next_sample() * gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::Preset;

    #[test]
    fn length_matches_duration() {
        let voice = Voice::new(Preset::Prestige.recipe().schedule(0.0), 8000.0);
        assert_eq!(voice.render().len(), 16000);

        let voice = Voice::new(Preset::Coin.recipe().schedule(1.0), 44100.0);
        assert_eq!(voice.start_sample(), 44100);
        assert_eq!(voice.render().len(), 4410);
    }

    #[test]
    fn peak_bounded_by_envelope() {
        for preset in Preset::ALL {
            let recipe = preset.recipe();
            let peak_gain = recipe.gain.iter().map(|a| a.value).fold(0.0, f64::max);
            let samples = Voice::new(recipe.schedule(0.0), 22050.0).render();
            let peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
            assert!(peak > 0.0, "{preset} rendered silence");
            // PolyBLEP overshoot stays within 1.5x.
            assert!(peak <= peak_gain * 1.5, "{preset} peak {peak} above envelope {peak_gain}");
        }
    }

    #[test]
    fn fades_toward_silence() {
        let samples = Voice::new(Preset::Fox.recipe().schedule(0.0), 44100.0).render();
        let head = samples[..441].iter().fold(0.0f64, |m, s| m.max(s.abs()));
        let tail = samples[samples.len() - 441..].iter().fold(0.0f64, |m, s| m.max(s.abs()));
        assert!(tail < head * 0.2, "tail {tail} should be much quieter than head {head}");
    }
}
