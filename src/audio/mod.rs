//! Podcast audio enhancement.
//!
//! Chain: normalize -> voice-band EQ -> dynamic-range compression ->
//! intro/outro bumpers with crossfade -> chapter marker tones for long
//! recordings. Bumper files that fail to load degrade to silence beds of
//! the configured length; only decode and write failures surface to the
//! caller, which keeps the unenhanced file.

pub mod buffer;

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::EnhancerConfig;
use crate::Result;

pub use buffer::AudioBuffer;

// Voice-band corners and compressor curve used by the podcast preset.
const HIGH_PASS_HZ: f32 = 80.0;
const LOW_PASS_HZ: f32 = 8_000.0;
const COMPRESS_THRESHOLD_DB: f32 = -20.0;
const COMPRESS_RATIO: f32 = 4.0;
const ATTACK_MS: f32 = 5.0;
const RELEASE_MS: f32 = 50.0;
const NORMALIZE_PEAK: f32 = 0.99;

/// Applies the podcast enhancement chain to a finished narration file.
pub struct PodcastEnhancer {
    config: EnhancerConfig,
}

impl PodcastEnhancer {
    pub fn new(config: EnhancerConfig) -> Self {
        Self { config }
    }

    /// Enhance `audio_path` into a `podcast_<stem>.wav` sibling and return
    /// the new path.
    pub fn enhance(&self, audio_path: &Path) -> Result<PathBuf> {
        let mut audio = AudioBuffer::load(audio_path)?;
        debug!(
            path = %audio_path.display(),
            duration_secs = audio.duration_secs(),
            sample_rate = audio.sample_rate,
            "echocast enhancement started"
        );

        if self.config.normalize {
            normalize(&mut audio.samples);
        }
        if self.config.voice_band_eq {
            apply_voice_band(&mut audio);
        }
        if self.config.compress {
            compress(
                &mut audio.samples,
                audio.sample_rate,
                COMPRESS_THRESHOLD_DB,
                COMPRESS_RATIO,
            );
        }

        let audio = self.with_intro_outro(audio);
        let audio = self.with_chapter_markers(audio);

        let output = podcast_path(audio_path);
        audio.save_wav(&output)?;
        Ok(output)
    }

    fn with_intro_outro(&self, main: AudioBuffer) -> AudioBuffer {
        let rate = main.sample_rate;
        let crossfade = (self.config.crossfade_secs as f32 * rate as f32) as usize;

        let intro = self.bumper(&self.config.intro_path, self.config.intro_secs as f32, rate);
        let outro = self.bumper(&self.config.outro_path, self.config.outro_secs as f32, rate);

        let with_intro = crossfade_append(&intro, &main, crossfade);
        crossfade_append(&with_intro, &outro, crossfade)
    }

    /// Load a bumper file resampled to `rate`, or a silence bed when the
    /// file is missing or unreadable.
    fn bumper(&self, path: &Option<PathBuf>, fallback_secs: f32, rate: u32) -> AudioBuffer {
        if let Some(path) = path {
            match AudioBuffer::load(path) {
                Ok(buf) => return buf.resampled(rate),
                Err(err) => warn!(
                    path = %path.display(),
                    error = %err,
                    "echocast bumper load failed, using silence"
                ),
            }
        }
        AudioBuffer::silence(fallback_secs, rate)
    }

    fn with_chapter_markers(&self, audio: AudioBuffer) -> AudioBuffer {
        if (audio.duration_secs() as f64) <= self.config.chapter_threshold_secs {
            return audio;
        }
        let rate = audio.sample_rate;
        let interval = (self.config.chapter_interval_secs * rate as f64) as usize;
        if interval == 0 {
            return audio;
        }

        let guard = AudioBuffer::silence(self.config.marker_guard_secs as f32, rate);
        let marker = tone(
            self.config.marker_tone_hz as f32,
            self.config.marker_tone_secs as f32,
            self.config.marker_gain_db as f32,
            rate,
        );

        let mut out = Vec::with_capacity(audio.samples.len() + 4 * (guard.samples.len() + marker.len()));
        for chunk in audio.samples.chunks(interval) {
            out.extend_from_slice(chunk);
            out.extend_from_slice(&guard.samples);
            out.extend_from_slice(&marker);
            out.extend_from_slice(&guard.samples);
        }
        AudioBuffer::new(out, rate)
    }
}

fn podcast_path(audio_path: &Path) -> PathBuf {
    let stem = audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let parent = audio_path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("podcast_{stem}.wav"))
}

/// Scale so the loudest sample sits just under full scale.
fn normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        let gain = NORMALIZE_PEAK / peak;
        for s in samples.iter_mut() {
            *s *= gain;
        }
    }
}

fn apply_voice_band(audio: &mut AudioBuffer) {
    let mut high_pass = Biquad::high_pass(audio.sample_rate, HIGH_PASS_HZ);
    let mut low_pass = Biquad::low_pass(audio.sample_rate, LOW_PASS_HZ);
    for s in audio.samples.iter_mut() {
        *s = low_pass.process(high_pass.process(*s));
    }
}

/// Feed-forward compressor with a peak-follower envelope (5 ms attack,
/// 50 ms release). Gain above the threshold follows a 1/ratio slope.
fn compress(samples: &mut [f32], sample_rate: u32, threshold_db: f32, ratio: f32) {
    let threshold = db_to_amplitude(threshold_db);
    let attack = envelope_coeff(ATTACK_MS, sample_rate);
    let release = envelope_coeff(RELEASE_MS, sample_rate);

    let mut envelope = 0.0f32;
    for s in samples.iter_mut() {
        let level = s.abs();
        let coeff = if level > envelope { attack } else { release };
        envelope = coeff * envelope + (1.0 - coeff) * level;
        if envelope > threshold {
            let gain = threshold * (envelope / threshold).powf(1.0 / ratio) / envelope;
            *s *= gain;
        }
    }
}

fn envelope_coeff(time_ms: f32, sample_rate: u32) -> f32 {
    (-1.0 / (time_ms * 0.001 * sample_rate as f32)).exp()
}

fn db_to_amplitude(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Join two buffers with a linear crossfade over `crossfade` samples.
fn crossfade_append(a: &AudioBuffer, b: &AudioBuffer, crossfade: usize) -> AudioBuffer {
    let n = crossfade.min(a.samples.len()).min(b.samples.len());
    let mut out = Vec::with_capacity(a.samples.len() + b.samples.len() - n);
    out.extend_from_slice(&a.samples[..a.samples.len() - n]);
    for i in 0..n {
        let t = i as f32 / n as f32;
        let fading_out = a.samples[a.samples.len() - n + i] * (1.0 - t);
        let fading_in = b.samples[i] * t;
        out.push(fading_out + fading_in);
    }
    out.extend_from_slice(&b.samples[n..]);
    AudioBuffer::new(out, a.sample_rate.max(b.sample_rate))
}

/// A sine burst at the given level.
fn tone(frequency_hz: f32, duration_secs: f32, gain_db: f32, sample_rate: u32) -> Vec<f32> {
    let amplitude = db_to_amplitude(gain_db);
    let count = (duration_secs * sample_rate as f32) as usize;
    (0..count)
        .map(|i| (2.0 * PI * frequency_hz * i as f32 / sample_rate as f32).sin() * amplitude)
        .collect()
}

/// Transposed direct-form-II biquad with Butterworth Q.
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    fn low_pass(sample_rate: u32, cutoff_hz: f32) -> Self {
        let (w0, alpha) = Self::prewarp(sample_rate, cutoff_hz);
        let cos_w0 = w0.cos();
        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        Self::normalized(b0, b1, b0, cos_w0, alpha)
    }

    fn high_pass(sample_rate: u32, cutoff_hz: f32) -> Self {
        let (w0, alpha) = Self::prewarp(sample_rate, cutoff_hz);
        let cos_w0 = w0.cos();
        let b0 = (1.0 + cos_w0) / 2.0;
        let b1 = -(1.0 + cos_w0);
        Self::normalized(b0, b1, b0, cos_w0, alpha)
    }

    fn prewarp(sample_rate: u32, cutoff_hz: f32) -> (f32, f32) {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate as f32;
        let q = std::f32::consts::FRAC_1_SQRT_2;
        (w0, w0.sin() / (2.0 * q))
    }

    fn normalized(b0: f32, b1: f32, b2: f32, cos_w0: f32, alpha: f32) -> Self {
        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> EnhancerConfig {
        EnhancerConfig {
            intro_secs: 0.1,
            outro_secs: 0.1,
            crossfade_secs: 0.05,
            ..EnhancerConfig::default()
        }
    }

    #[test]
    fn normalize_scales_to_peak() {
        let mut samples = vec![0.1, -0.4, 0.2];
        normalize(&mut samples);
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - NORMALIZE_PEAK).abs() < 1e-4);
    }

    #[test]
    fn normalize_leaves_silence_alone() {
        let mut samples = vec![0.0; 16];
        normalize(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn high_pass_removes_dc_offset() {
        let mut filter = Biquad::high_pass(22_050, HIGH_PASS_HZ);
        let mut last = 1.0f32;
        for _ in 0..22_050 {
            last = filter.process(1.0);
        }
        assert!(last.abs() < 0.01, "dc leaked through: {last}");
    }

    #[test]
    fn low_pass_attenuates_nyquist() {
        let mut filter = Biquad::low_pass(22_050, LOW_PASS_HZ);
        let mut peak = 0.0f32;
        for i in 0..2_000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = filter.process(x);
            if i > 500 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.5, "nyquist tone kept {peak} of its level");
    }

    #[test]
    fn compressor_reduces_loud_passages() {
        let rate = 22_050;
        let loud: Vec<f32> = (0..rate)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / rate as f32).sin() * 0.9)
            .collect();
        let mut compressed = loud.clone();
        compress(&mut compressed, rate as u32, COMPRESS_THRESHOLD_DB, COMPRESS_RATIO);

        // Skip the attack window; the envelope needs a few ms to catch up.
        let peak_before = loud.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        let peak_after = compressed
            .iter()
            .skip(rate / 4)
            .fold(0.0f32, |a, s| a.max(s.abs()));
        assert!(peak_after < peak_before * 0.6, "steady-state peak {peak_after}");
    }

    #[test]
    fn compressor_leaves_quiet_audio_untouched() {
        let rate = 22_050u32;
        let quiet = vec![0.01f32; 4_000];
        let mut processed = quiet.clone();
        compress(&mut processed, rate, COMPRESS_THRESHOLD_DB, COMPRESS_RATIO);
        assert_eq!(processed, quiet);
    }

    #[test]
    fn crossfade_overlaps_by_requested_length() {
        let a = AudioBuffer::new(vec![1.0; 100], 22_050);
        let b = AudioBuffer::new(vec![0.5; 80], 22_050);
        let joined = crossfade_append(&a, &b, 20);
        assert_eq!(joined.samples.len(), 100 + 80 - 20);

        let concat = crossfade_append(&a, &b, 0);
        assert_eq!(concat.samples.len(), 180);
    }

    #[test]
    fn marker_tone_sits_at_configured_level() {
        let samples = tone(1_000.0, 0.3, -20.0, 22_050);
        assert_eq!(samples.len(), 6_615);
        let peak = samples.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!((peak - 0.1).abs() < 0.01);
    }

    #[test]
    fn chapter_markers_only_past_threshold() {
        let mut config = short_config();
        config.chapter_threshold_secs = 1.0;
        config.chapter_interval_secs = 0.5;
        let enhancer = PodcastEnhancer::new(config);

        let rate = 8_000;
        let short = AudioBuffer::silence(0.8, rate);
        let untouched = enhancer.with_chapter_markers(short);
        assert_eq!(untouched.samples.len(), (0.8 * rate as f32) as usize);

        let long = AudioBuffer::silence(2.0, rate);
        let base_len = long.samples.len();
        let marked = enhancer.with_chapter_markers(long);
        // 4 chunks of 0.5 s, each followed by guard + marker + guard.
        let insert = 2 * (0.5 * rate as f32) as usize + (0.3 * rate as f32) as usize;
        assert_eq!(marked.samples.len(), base_len + 4 * insert);
    }

    #[test]
    fn enhance_writes_podcast_wav() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("audiobook_neutral_lisa_1_abc.wav");
        let samples: Vec<f32> = (0..22_050)
            .map(|i| (2.0 * PI * 220.0 * i as f32 / 22_050.0).sin() * 0.5)
            .collect();
        AudioBuffer::new(samples, 22_050).save_wav(&source).unwrap();

        let enhancer = PodcastEnhancer::new(short_config());
        let out = enhancer.enhance(&source).unwrap();

        assert_eq!(
            out.file_name().and_then(|n| n.to_str()),
            Some("podcast_audiobook_neutral_lisa_1_abc.wav")
        );
        let produced = AudioBuffer::load(&out).unwrap();
        // Intro and outro beds grew the output.
        assert!(produced.samples.len() > 22_050);
    }

    #[test]
    fn missing_bumper_file_degrades_to_silence() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.wav");
        AudioBuffer::new(vec![0.25; 8_000], 8_000)
            .save_wav(&source)
            .unwrap();

        let mut config = short_config();
        config.intro_path = Some(dir.path().join("no_such_intro.wav"));
        let enhancer = PodcastEnhancer::new(config);

        let out = enhancer.enhance(&source).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn enhance_missing_source_fails() {
        let enhancer = PodcastEnhancer::new(EnhancerConfig::default());
        assert!(enhancer.enhance(Path::new("/nonexistent/take.wav")).is_err());
    }
}
