//! Speech synthesis orchestration.
//!
//! One generation request runs analyze -> optional shorten -> synthesize
//! (cloud, then offline fallback) -> optional podcast enhancement ->
//! index. Only total synthesis failure surfaces to the caller, and even
//! then as a `success: false` result object carrying the analysis.

pub mod cloud;
pub mod offline;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{TextAnalysis, TextAnalyzer};
use crate::audio::PodcastEnhancer;
use crate::catalog::{VoiceCatalog, VoiceSpec};
use crate::resilience::{remote_or_local, RetryPolicy};
use crate::search::SearchEngine;
use crate::{Error, Result};

pub use cloud::CloudTtsClient;
pub use offline::OfflineSynthesizer;

const AUTO_SHORTEN_MAX_WORDS: usize = 150;
const SHORTEN_MAX_SENTENCES: usize = 3;
const SHORTEN_MAX_WORDS: usize = 100;
const TITLE_WORDS: usize = 5;
const FILE_PREFIX: &str = "audiobook";

/// Outcome of one audio generation request.
#[derive(Debug, Clone, Serialize)]
pub struct AudioResult {
    /// Path of the playable artifact; `None` only on total failure.
    pub audio_path: Option<PathBuf>,
    /// The text that was actually narrated (possibly shortened).
    pub processed_text: String,
    pub analysis: TextAnalysis,
    pub success: bool,
    pub error: Option<String>,
}

/// Orchestrates the synthesis half of the pipeline.
pub struct TtsEngine {
    analyzer: TextAnalyzer,
    catalog: VoiceCatalog,
    cloud: CloudTtsClient,
    offline: OfflineSynthesizer,
    enhancer: PodcastEnhancer,
    search: Arc<SearchEngine>,
    policy: RetryPolicy,
    audio_dir: PathBuf,
}

impl TtsEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        analyzer: TextAnalyzer,
        catalog: VoiceCatalog,
        cloud: CloudTtsClient,
        offline: OfflineSynthesizer,
        enhancer: PodcastEnhancer,
        search: Arc<SearchEngine>,
        policy: RetryPolicy,
        audio_dir: PathBuf,
    ) -> Self {
        Self {
            analyzer,
            catalog,
            cloud,
            offline,
            enhancer,
            search,
            policy,
            audio_dir,
        }
    }

    /// Generate narrated audio for `text`.
    ///
    /// Voice and language selectors resolve silently to catalog defaults;
    /// `tone` is a label carried into filenames and the index, validated
    /// upstream by the rewriter.
    pub async fn generate_audio(
        &self,
        text: &str,
        voice_name: &str,
        tone: &str,
        language: &str,
        auto_shorten: bool,
        podcast_mode: bool,
    ) -> AudioResult {
        let voice = self.catalog.resolve(language, voice_name).clone();

        let mut analysis = self.analyzer.analyze(text);
        let mut processed_text = text.to_string();

        if auto_shorten && self.analyzer.is_too_long(text, AUTO_SHORTEN_MAX_WORDS) {
            let original_word_count = analysis.word_count;
            processed_text = self
                .analyzer
                .shorten(text, SHORTEN_MAX_SENTENCES, SHORTEN_MAX_WORDS);
            analysis = self.analyzer.analyze(&processed_text);
            analysis.was_shortened = true;
            analysis.original_word_count = Some(original_word_count);
            info!(
                original_words = original_word_count,
                shortened_words = analysis.word_count,
                "echocast input shortened before synthesis"
            );
        }

        let mut audio_path = match self.synthesize(&processed_text, &voice, tone).await {
            Ok(path) => path,
            Err(err) => {
                let err = Error::synthesis(err.to_string());
                warn!(error = %err, "echocast synthesis failed with no fallback left");
                return AudioResult {
                    audio_path: None,
                    processed_text,
                    analysis,
                    success: false,
                    error: Some(err.to_string()),
                };
            }
        };

        if podcast_mode {
            match self.enhancer.enhance(&audio_path) {
                Ok(enhanced) => {
                    audio_path = enhanced;
                    analysis.podcast_enhanced = true;
                }
                Err(err) => {
                    // Non-fatal: keep the plain narration.
                    warn!(error = %err, "echocast podcast enhancement failed");
                    analysis.podcast_enhanced = false;
                }
            }
        }

        let indexed = self.search.index_content(
            &title_of(text),
            text,
            &processed_text,
            tone,
            &voice.name,
            &audio_path.to_string_lossy(),
            analysis.word_count as i64,
            analysis.estimated_minutes,
        );
        if !indexed {
            warn!(path = %audio_path.display(), "echocast content was not indexed");
        }

        info!(
            path = %audio_path.display(),
            voice = %voice.name,
            tone,
            words = analysis.word_count,
            enhanced = analysis.podcast_enhanced,
            "echocast audio generated"
        );
        AudioResult {
            audio_path: Some(audio_path),
            processed_text,
            analysis,
            success: true,
            error: None,
        }
    }

    /// Cloud synthesis under the retry budget, then the offline engine.
    async fn synthesize(&self, text: &str, voice: &VoiceSpec, tone: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.audio_dir)?;

        let cloud_path = self
            .audio_dir
            .join(generate_filename(FILE_PREFIX, tone, &voice.name, "mp3"));
        let offline_path = self
            .audio_dir
            .join(generate_filename(FILE_PREFIX, tone, &voice.name, "wav"));

        let cloud = &self.cloud;
        let voice_id = voice.service_voice_id.clone();
        remote_or_local(
            &self.policy,
            "synthesize",
            cloud.is_configured(),
            || {
                let cloud_path = cloud_path.clone();
                let voice_id = voice_id.clone();
                async move {
                    let bytes = cloud.synthesize(text, &voice_id).await?;
                    std::fs::write(&cloud_path, bytes)?;
                    Ok(cloud_path)
                }
            },
            || {
                self.offline
                    .synthesize_to(text, &voice.locale_code, &offline_path)?;
                Ok(offline_path.clone())
            },
        )
        .await
    }

    /// Voice metadata for a selection, after silent resolution.
    pub fn voice_info(&self, language: &str, voice_name: &str) -> VoiceSpec {
        self.catalog.resolve(language, voice_name).clone()
    }
}

/// Title used in the index: the first few words of the source text.
fn title_of(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > TITLE_WORDS {
        format!("{}...", words[..TITLE_WORDS].join(" "))
    } else {
        words.join(" ")
    }
}

/// `{prefix}_{tone}_{voice}_{unix_ts}_{uuid8}.{ext}`, with tone and voice
/// stripped to alphanumerics. The uuid keeps concurrent same-second calls
/// from colliding.
pub(crate) fn generate_filename(prefix: &str, tone: &str, voice: &str, extension: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let short_id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!(
        "{}_{}_{}_{}_{}.{}",
        prefix,
        sanitize(tone),
        sanitize(voice),
        timestamp,
        short_id,
        extension
    )
}

fn sanitize(part: &str) -> String {
    part.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Whether a directory entry looks like generated audio.
pub(crate) fn is_audio_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("mp3") | Some("wav") | Some("ogg") | Some("m4a") | Some("flac")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnhancerConfig, TtsConfig};

    #[tokio::test]
    async fn total_synthesis_failure_reports_detail() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed makes every engine in
        // the chain fail before it can write audio.
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let search = Arc::new(SearchEngine::new(&dir.path().join("index.db")).unwrap());
        let engine = TtsEngine::new(
            TextAnalyzer::new(),
            VoiceCatalog::builtin(),
            CloudTtsClient::new(TtsConfig::default()).unwrap(),
            OfflineSynthesizer::new(),
            PodcastEnhancer::new(EnhancerConfig::default()),
            search,
            RetryPolicy::tts_default(),
            blocker.join("audio"),
        );

        let result = engine
            .generate_audio("A line with nowhere to land.", "Lisa", "Neutral", "english", false, false)
            .await;
        assert!(!result.success);
        assert!(result.audio_path.is_none());
        assert!(result.error.unwrap().starts_with("Synthesis failed"));
        assert!(result.analysis.word_count > 0);
    }

    #[test]
    fn filenames_are_unique_within_a_second() {
        let a = generate_filename("audiobook", "Neutral", "Lisa", "wav");
        let b = generate_filename("audiobook", "Neutral", "Lisa", "wav");
        assert_ne!(a, b);
        assert!(a.starts_with("audiobook_Neutral_Lisa_"));
        assert!(a.ends_with(".wav"));
    }

    #[test]
    fn filename_parts_are_sanitized() {
        let name = generate_filename("audiobook", "Sus pense!", "Li-sa", "mp3");
        assert!(name.starts_with("audiobook_Suspense_Lisa_"));
    }

    #[test]
    fn title_truncates_past_five_words() {
        assert_eq!(
            title_of("one two three four five six seven"),
            "one two three four five..."
        );
        assert_eq!(title_of("just four short words"), "just four short words");
    }

    #[test]
    fn audio_extensions_are_recognized() {
        assert!(is_audio_file(Path::new("a/clip.WAV")));
        assert!(is_audio_file(Path::new("clip.mp3")));
        assert!(!is_audio_file(Path::new("notes.txt")));
        assert!(!is_audio_file(Path::new("noext")));
    }
}
