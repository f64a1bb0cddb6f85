//! Offline fallback synthesizer.
//!
//! When the cloud voice service is unreachable the pipeline still has to
//! hand back a playable file. This engine renders each word as a short
//! pitched tone burst (word-hash keyed within a locale-dependent base
//! range), with pauses at word and sentence boundaries. The cadence tracks
//! the text, so the output has a speech-like rhythm and duration; actual
//! voice timbre is explicitly not guaranteed.

use std::path::Path;

use tracing::debug;

use crate::audio::AudioBuffer;
use crate::Result;

const SAMPLE_RATE: u32 = 22_050;
const WORD_SECS: f32 = 0.22;
const WORD_GAP_SECS: f32 = 0.08;
const SENTENCE_GAP_SECS: f32 = 0.35;
const AMPLITUDE: f32 = 0.30;
/// Pitch spread across different words, in Hz.
const PITCH_RANGE_HZ: f32 = 140.0;
const FADE_SECS: f32 = 0.02;

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSynthesizer;

impl OfflineSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Render `text` as a WAV file at `path`.
    pub fn synthesize_to(&self, text: &str, locale_code: &str, path: &Path) -> Result<()> {
        let buffer = self.render(text, locale_code);
        buffer.save_wav(path)?;
        debug!(
            path = %path.display(),
            locale = locale_code,
            duration_secs = buffer.duration_secs(),
            "echocast offline synthesis complete"
        );
        Ok(())
    }

    fn render(&self, text: &str, locale_code: &str) -> AudioBuffer {
        let base_pitch = base_pitch_for(locale_code);
        let mut samples = Vec::new();

        for word in text.split_whitespace() {
            let pitch = base_pitch + (word_hash(word) % PITCH_RANGE_HZ as u64) as f32;
            push_tone(&mut samples, pitch, WORD_SECS);

            let gap = if word.ends_with(['.', '!', '?']) {
                SENTENCE_GAP_SECS
            } else {
                WORD_GAP_SECS
            };
            samples.extend(std::iter::repeat(0.0).take((gap * SAMPLE_RATE as f32) as usize));
        }

        if samples.is_empty() {
            // Empty input still yields a playable, silent file.
            return AudioBuffer::silence(0.5, SAMPLE_RATE);
        }
        AudioBuffer::new(samples, SAMPLE_RATE)
    }
}

/// Languages get distinct base pitches so narrations are tellable apart.
fn base_pitch_for(locale_code: &str) -> f32 {
    match locale_code {
        "en" => 200.0,
        "hi" => 220.0,
        "te" => 230.0,
        "es" => 210.0,
        "fr" => 240.0,
        "de" => 190.0,
        "it" => 215.0,
        "pt" => 205.0,
        "ja" => 250.0,
        "ko" => 245.0,
        "zh" => 235.0,
        "ar" => 195.0,
        "ru" => 185.0,
        _ => 200.0,
    }
}

fn word_hash(word: &str) -> u64 {
    // FNV-1a; stable across runs, unlike the std hasher.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in word.to_lowercase().bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Append a sine burst with short linear fades to avoid clicks.
fn push_tone(samples: &mut Vec<f32>, frequency_hz: f32, duration_secs: f32) {
    let count = (duration_secs * SAMPLE_RATE as f32) as usize;
    let fade = ((FADE_SECS * SAMPLE_RATE as f32) as usize).min(count / 2);
    for i in 0..count {
        let mut value = (2.0 * std::f32::consts::PI * frequency_hz * i as f32
            / SAMPLE_RATE as f32)
            .sin()
            * AMPLITUDE;
        if i < fade {
            value *= i as f32 / fade as f32;
        } else if i >= count - fade {
            value *= (count - i) as f32 / fade as f32;
        }
        samples.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_deterministic() {
        let synth = OfflineSynthesizer::new();
        let a = synth.render("Hello offline world.", "en");
        let b = synth.render("Hello offline world.", "en");
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn locale_changes_the_output() {
        let synth = OfflineSynthesizer::new();
        let en = synth.render("same words here", "en");
        let te = synth.render("same words here", "te");
        assert_eq!(en.samples.len(), te.samples.len());
        assert_ne!(en.samples, te.samples);
    }

    #[test]
    fn sentence_ends_pause_longer() {
        let synth = OfflineSynthesizer::new();
        let flat = synth.render("one two", "en");
        let punctuated = synth.render("one. two", "en");
        assert!(punctuated.samples.len() > flat.samples.len());
    }

    #[test]
    fn empty_text_still_produces_audio() {
        let synth = OfflineSynthesizer::new();
        let buffer = synth.render("   ", "en");
        assert!(!buffer.samples.is_empty());
    }

    #[test]
    fn synthesize_writes_readable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fallback.wav");
        OfflineSynthesizer::new()
            .synthesize_to("A short narration for the test.", "en", &path)
            .unwrap();

        let loaded = AudioBuffer::load(&path).unwrap();
        assert_eq!(loaded.sample_rate, SAMPLE_RATE);
        assert!(loaded.duration_secs() > 1.0);
    }
}
