pub mod config;
pub mod dsp;
pub mod error;
pub mod offline;
pub mod platform;
pub mod preset;
pub mod system;
#[cfg(feature = "web")]
pub mod web;

pub use crate::config::{SfxConfig, UnlockPolicy};
pub use crate::error::{AudioError, ConfigError};
pub use crate::preset::Preset;
pub use crate::system::{PlayOutcome, SoundSystem, UnlockOutcome};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the sfx-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn lookup(name: &str) -> Result<Preset, JsValue> {
    name.parse::<Preset>().map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: names of every built-in preset.
#[wasm_bindgen]
pub fn preset_names() -> Result<JsValue, JsValue> {
    let names: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
    serde_wasm_bindgen::to_value(&names).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: a preset's waveform, automation curves and duration.
#[wasm_bindgen]
pub fn describe_preset(name: &str) -> Result<JsValue, JsValue> {
    let preset = lookup(name)?;
    serde_wasm_bindgen::to_value(&preset.describe()).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render a preset offline to a 16-bit mono WAV byte array.
/// Fails for sample rates outside 3 kHz to 768 kHz.
#[wasm_bindgen]
pub fn render_preset_wav(name: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let preset = lookup(name)?;
    dsp::renderer::render_preset_wav(preset, sample_rate)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render a preset offline to mono f32 samples.
#[wasm_bindgen]
pub fn render_preset_samples(name: &str, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let preset = lookup(name)?;
    dsp::renderer::render_preset_samples(preset, sample_rate)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}
