//! Parameter automation curves with Web Audio timing semantics.
//!
//! A `set` event steps to its value at its time. A ramp event starts at the
//! previous event (time and value) and arrives at its own value at its own
//! time. After the last event the value holds.

use crate::preset::{ParamEvent, RampKind};

/// Value of the automated parameter at time `t`.
///
/// `default` applies before the first event. Ramps are expected in time
/// order, as produced by `PresetRecipe::schedule`.
pub fn value_at(events: &[ParamEvent], default: f64, t: f64) -> f64 {
    let mut value = default;
    let mut prev_time = 0.0;

    for event in events {
        if t < event.time {
            return match event.kind {
                RampKind::Set => value,
                RampKind::Linear => {
                    let span = event.time - prev_time;
                    if span <= 0.0 || t < prev_time {
                        value
                    } else {
                        value + (event.value - value) * (t - prev_time) / span
                    }
                }
                RampKind::Exponential => {
                    let span = event.time - prev_time;
                    // Undefined for zero or sign-changing endpoints: hold.
                    if span <= 0.0 || t < prev_time || value * event.value <= 0.0 {
                        value
                    } else {
                        value * (event.value / value).powf((t - prev_time) / span)
                    }
                }
            };
        }
        value = event.value;
        prev_time = event.time;
    }

    value
}
