//! DSP: pure Rust rendering of preset voices.
//!
//! Browsers synthesize presets natively through Web Audio; this module
//! renders the same automation offline so presets can be previewed,
//! exported to WAV, or played by headless hosts.

pub mod automation;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod voice;
