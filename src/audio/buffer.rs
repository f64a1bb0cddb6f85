//! Mono PCM buffers and codec I/O.
//!
//! Everything downstream of decoding works on interleaved-free mono `f32`
//! samples in `[-1.0, 1.0]`. WAV files go through hound; compressed input
//! (mp3 from the cloud voice service) goes through symphonia with a
//! channel-averaging downmix.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{Error, Result};

/// Mono audio samples plus their rate.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A silent buffer of the given length.
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        let count = (duration_secs.max(0.0) * sample_rate as f32).round() as usize;
        Self {
            samples: vec![0.0; count],
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Decode an audio file into mono samples, dispatching on extension.
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "wav" => Self::load_wav(path),
            _ => Self::load_compressed(path),
        }
    }

    fn load_wav(path: &Path) -> Result<Self> {
        let mut reader =
            WavReader::open(path).map_err(|e| Error::audio(format!("open wav: {e}")))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::audio(format!("read wav samples: {e}")))?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| Error::audio(format!("read wav samples: {e}")))?
            }
        };

        Ok(Self {
            samples: downmix(&interleaved, channels),
            sample_rate: spec.sample_rate,
        })
    }

    /// Decode via symphonia (mp3 and friends), averaging channels to mono.
    fn load_compressed(path: &Path) -> Result<Self> {
        let src = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(src), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::audio(format!("probe audio: {e}")))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::audio("no decodable audio track"))?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::audio("source does not declare a sample rate"))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::audio(format!("unsupported codec: {e}")))?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        while let Ok(packet) = format.next_packet() {
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = decoder
                .decode(&packet)
                .map_err(|e| Error::audio(format!("decode packet: {e}")))?;

            if sample_buf.is_none() {
                let spec = *decoded.spec();
                sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            if let Some(buf) = sample_buf.as_mut() {
                let channels = decoded.spec().channels.count().max(1);
                buf.copy_interleaved_ref(decoded);
                samples.extend(downmix(buf.samples(), channels));
            }
        }

        if samples.is_empty() {
            return Err(Error::audio("no audio samples decoded"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Write 16-bit PCM WAV. Samples are clamped to `[-1.0, 1.0]`.
    pub fn save_wav(&self, path: &Path) -> Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer =
            WavWriter::create(path, spec).map_err(|e| Error::audio(format!("create wav: {e}")))?;
        for &sample in &self.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| Error::audio(format!("write wav sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::audio(format!("finalize wav: {e}")))?;
        Ok(())
    }

    /// Linear-interpolation resample. Returns self unchanged when the rates
    /// already match.
    pub fn resampled(&self, target_rate: u32) -> AudioBuffer {
        if target_rate == self.sample_rate || self.samples.is_empty() {
            return AudioBuffer::new(self.samples.clone(), target_rate.max(self.sample_rate));
        }
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_len = (self.samples.len() as f64 / ratio).round() as usize;
        let mut out = Vec::with_capacity(out_len);
        for i in 0..out_len {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            let a = self.samples[idx.min(self.samples.len() - 1)];
            let b = self.samples[(idx + 1).min(self.samples.len() - 1)];
            out.push(a + (b - a) * frac);
        }
        AudioBuffer::new(out, target_rate)
    }
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_expected_length() {
        let buf = AudioBuffer::silence(2.0, 22_050);
        assert_eq!(buf.samples.len(), 44_100);
        assert!(buf.samples.iter().all(|&s| s == 0.0));
        assert!((buf.duration_secs() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn downmix_averages_frames() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix(&stereo, 1), stereo.to_vec());
    }

    #[test]
    fn wav_round_trip_preserves_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let original = AudioBuffer::new(vec![0.0, 0.25, -0.25, 0.5, -0.5, 1.0, -1.0], 22_050);
        original.save_wav(&path).unwrap();

        let restored = AudioBuffer::load(&path).unwrap();
        assert_eq!(restored.sample_rate, 22_050);
        assert_eq!(restored.samples.len(), original.samples.len());
        for (a, b) in original.samples.iter().zip(&restored.samples) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn resample_halves_and_doubles_length() {
        let buf = AudioBuffer::new(vec![0.0; 1000], 44_100);
        let down = buf.resampled(22_050);
        assert_eq!(down.sample_rate, 22_050);
        assert!((down.samples.len() as i64 - 500).abs() <= 1);

        let up = down.resampled(44_100);
        assert!((up.samples.len() as i64 - 1000).abs() <= 2);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let err = AudioBuffer::load(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(err.to_string().contains("wav"));
    }
}
