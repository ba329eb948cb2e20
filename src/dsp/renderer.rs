//! Offline renderer: renders a single preset to samples or a WAV file.

use std::ops::RangeInclusive;

use crate::error::AudioError;
use crate::preset::Preset;

use super::voice::Voice;

/// Sample rates accepted for offline rendering, the range Web Audio allows.
pub const SAMPLE_RATES: RangeInclusive<u32> = 3000..=768_000;

fn check_sample_rate(sample_rate: u32) -> Result<(), AudioError> {
    if SAMPLE_RATES.contains(&sample_rate) {
        Ok(())
    } else {
        Err(AudioError::SampleRate(sample_rate))
    }
}

/// Render `preset` to mono f32 samples at `sample_rate`.
///
/// A lone voice is converted as-is, with no mixing or clipping, so levels
/// match what a browser plays.
pub fn render_preset_samples(preset: Preset, sample_rate: u32) -> Result<Vec<f32>, AudioError> {
    check_sample_rate(sample_rate)?;
    let voice = Voice::new(preset.recipe().schedule(0.0), sample_rate as f64);
    Ok(voice.render().into_iter().map(|s| s as f32).collect())
}

/// Render `preset` to a 16-bit mono PCM WAV file.
pub fn render_preset_wav(preset: Preset, sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let pcm: Vec<i16> = render_preset_samples(preset, sample_rate)?
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    Ok(encode_wav(&pcm, sample_rate, 1))
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_valid() {
        let wav = render_preset_wav(Preset::Coin, 44100).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 44100);
        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 1);
    }

    #[test]
    fn wav_size_matches_duration() {
        // 2 s at 8 kHz mono = 16000 samples * 2 bytes.
        let wav = render_preset_wav(Preset::Prestige, 8000).unwrap();
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 32000);
        assert_eq!(wav.len(), 44 + 32000);
    }

    #[test]
    fn every_preset_renders_audio() {
        for preset in Preset::ALL {
            let samples = render_preset_samples(preset, 22050).unwrap();
            let expected = (preset.recipe().duration * 22050.0).round() as usize;
            assert_eq!(samples.len(), expected, "{preset}");
            assert!(samples.iter().any(|s| s.abs() > 1e-3), "{preset} is silent");
            assert!(samples.iter().all(|s| s.abs() <= 1.0));
        }
    }

    #[test]
    fn rendered_level_matches_voice() {
        for preset in [Preset::Coin, Preset::Achievement, Preset::Squish] {
            let voice = Voice::new(preset.recipe().schedule(0.0), 44100.0).render();
            let rendered = render_preset_samples(preset, 44100).unwrap();
            assert_eq!(rendered.len(), voice.len());
            for (r, v) in rendered.iter().zip(&voice) {
                assert_eq!(*r, *v as f32, "{preset}");
            }
        }
    }

    #[test]
    fn rejects_unsupported_sample_rates() {
        for rate in [0, 1, 2999, 768_001, u32::MAX] {
            assert_eq!(render_preset_samples(Preset::Pop, rate), Err(AudioError::SampleRate(rate)));
            assert_eq!(render_preset_wav(Preset::Pop, rate), Err(AudioError::SampleRate(rate)));
        }
        assert!(render_preset_wav(Preset::Pop, 3000).is_ok());
        assert!(render_preset_wav(Preset::Wheel, 768_000).is_ok());
    }
}
