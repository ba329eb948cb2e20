//! Mixer: sums overlapping voices with master gain.

/// A summing buffer covering a fixed window of the sample clock.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Default for Mixer {
    fn default() -> Self {
        Mixer::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Mixer {
            master_gain: 1.0,
            buffer: Vec::new(),
        }
    }

    /// Reset to `num_samples` of silence.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Add `samples` starting at buffer index `offset`. Out-of-window parts
    /// are dropped.
    pub fn add_slice(&mut self, offset: usize, samples: &[f64]) {
        for (slot, &s) in self.buffer.iter_mut().skip(offset).zip(samples) {
            *slot += s;
        }
    }

    /// Mixed output with master gain and soft clipping applied.
    pub fn output(&self) -> Vec<f32> {
        self.buffer
            .iter()
            .map(|&s| soft_clip(s * self.master_gain) as f32)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// tanh soft clipper; keeps summed voices inside [-1, 1].
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
