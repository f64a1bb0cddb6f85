//! Caller-facing pipeline handle.
//!
//! [`EchoCast`] owns every component, built once from an [`EngineConfig`]
//! and passed by explicit injection. A UI shell drives the pipeline through
//! this surface alone.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::analysis::TextAnalyzer;
use crate::audio::PodcastEnhancer;
use crate::catalog::{PodcastStyleSpec, ToneSpec, VoiceCatalog, PodcastStyle, Tone};
use crate::config::EngineConfig;
use crate::narrator::PodcastNarrator;
use crate::rewrite::{backend_from_config, ProcessOutcome, TextProcessor};
use crate::search::{IndexStatistics, SearchEngine, SearchFilters, SearchHit, ContentRecord, DateFilter};
use crate::tts::{AudioResult, CloudTtsClient, OfflineSynthesizer, TtsEngine};
use crate::{Error, ErrorContext, Result};

/// Minimum share of alphanumeric characters for input to count as readable.
const MIN_READABLE_RATIO: f64 = 0.1;
/// Listening pace used for duration estimates, in words per minute.
const LISTENING_WPM: f64 = 150.0;

/// Which remote services are live; everything else runs in simulated mode.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub rewrite_backend: &'static str,
    pub rewrite_configured: bool,
    pub tts_configured: bool,
}

/// The assembled content pipeline.
pub struct EchoCast {
    config: EngineConfig,
    processor: TextProcessor,
    narrator: PodcastNarrator,
    engine: TtsEngine,
    search: Arc<SearchEngine>,
    rewrite_backend_id: &'static str,
    tts_configured: bool,
}

impl EchoCast {
    /// Build the full pipeline from a configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.audio_dir)?;

        let backend = backend_from_config(&config.rewrite)?;
        let rewrite_backend_id = backend.id();
        let processor = TextProcessor::new(backend.clone(), config.rewrite.retry);
        let narrator = PodcastNarrator::new(backend, config.narrator.retry);

        let search = Arc::new(SearchEngine::new(&config.index_db)?);
        let cloud = CloudTtsClient::new(config.tts.clone())?;
        let tts_configured = cloud.is_configured();
        let engine = TtsEngine::new(
            TextAnalyzer::new(),
            VoiceCatalog::builtin(),
            cloud,
            OfflineSynthesizer::new(),
            PodcastEnhancer::new(config.enhancer.clone()),
            search.clone(),
            config.tts.retry,
            config.audio_dir.clone(),
        );

        info!(
            audio_dir = %config.audio_dir.display(),
            index_db = %config.index_db.display(),
            backend = rewrite_backend_id,
            "echocast pipeline ready"
        );
        Ok(Self {
            config,
            processor,
            narrator,
            engine,
            search,
            rewrite_backend_id,
            tts_configured,
        })
    }

    /// Pipeline with environment-derived configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::from_env())
    }

    /// Rewrite `text` in the named tone. Soft-fails on an unknown tone.
    pub async fn process_text(
        &self,
        text: &str,
        tone: &str,
        language: &str,
        auto_shorten: bool,
    ) -> ProcessOutcome {
        self.processor
            .process(text, tone, language, auto_shorten)
            .await
    }

    /// Produce a styled podcast script for `content`. Never fails.
    pub async fn generate_podcast_script(
        &self,
        content: &str,
        topic: &str,
        style: &str,
    ) -> String {
        self.narrator.generate_script(content, topic, style).await
    }

    /// Synthesize narrated audio, optionally enhanced and always indexed
    /// on success.
    pub async fn generate_audio(
        &self,
        text: &str,
        voice: &str,
        tone: &str,
        language: &str,
        auto_shorten: bool,
        podcast_mode: bool,
    ) -> AudioResult {
        self.engine
            .generate_audio(text, voice, tone, language, auto_shorten, podcast_mode)
            .await
    }

    /// Search indexed content. Filters are optional selector strings the
    /// way a UI hands them over; unknown date names mean no restriction.
    pub fn search_content(
        &self,
        query: &str,
        tone_filter: Option<&str>,
        voice_filter: Option<&str>,
        date_filter: Option<&str>,
        limit: usize,
    ) -> Vec<SearchHit> {
        let filters = SearchFilters {
            tone: tone_filter.map(str::to_string),
            voice: voice_filter.map(str::to_string),
            date: date_filter.and_then(DateFilter::parse),
        };
        self.search.search(query, &filters, limit)
    }

    pub fn recent_content(&self, limit: usize) -> Vec<SearchHit> {
        self.search.recent(limit)
    }

    pub fn get_content(&self, id: i64) -> Option<ContentRecord> {
        self.search.get(id)
    }

    pub fn delete_content(&self, id: i64) -> bool {
        self.search.delete(id)
    }

    pub fn get_statistics(&self) -> IndexStatistics {
        self.search.statistics()
    }

    /// Validate raw caller input before it enters the pipeline.
    pub fn validate_text(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::invalid_input_with_context(
                "text is empty",
                ErrorContext::new().with_operation("validate_text"),
            ));
        }
        let chars = text.chars().count();
        if chars > self.config.max_text_len {
            return Err(Error::invalid_input_with_context(
                format!(
                    "text is too long: {} characters (maximum {})",
                    chars, self.config.max_text_len
                ),
                ErrorContext::new().with_operation("validate_text"),
            ));
        }
        let readable = text.chars().filter(|c| c.is_ascii_alphanumeric()).count();
        if (readable as f64) < (chars as f64) * MIN_READABLE_RATIO {
            return Err(Error::invalid_input_with_context(
                "text does not contain enough readable content",
                ErrorContext::new()
                    .with_operation("validate_text")
                    .with_details(format!("{} of {} characters alphanumeric", readable, chars)),
            ));
        }
        Ok(())
    }

    /// Remote-service availability, for shells that warn about simulated
    /// mode.
    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus {
            rewrite_backend: self.rewrite_backend_id,
            rewrite_configured: self.config.rewrite_configured(),
            tts_configured: self.tts_configured,
        }
    }

    /// Generated audio files, newest first.
    pub fn list_audio_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.config.audio_dir) else {
            return Vec::new();
        };
        let mut files: Vec<(std::time::SystemTime, PathBuf)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| crate::tts::is_audio_file(path))
            .map(|path| {
                let modified = path
                    .metadata()
                    .and_then(|meta| meta.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                (modified, path)
            })
            .collect();
        files.sort_by(|a, b| b.0.cmp(&a.0));
        files.into_iter().map(|(_, path)| path).collect()
    }

    pub fn tones(&self) -> Vec<ToneSpec> {
        Tone::ALL.iter().map(Tone::spec).collect()
    }

    pub fn podcast_styles(&self) -> Vec<PodcastStyleSpec> {
        PodcastStyle::ALL.iter().map(PodcastStyle::spec).collect()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Listening time at podcast pace, rounded to one decimal.
pub fn estimate_listening_time(word_count: usize) -> f64 {
    ((word_count as f64 / LISTENING_WPM) * 10.0).round() / 10.0
}

/// `MM:SS` rendering of a duration in whole seconds.
pub fn format_duration(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
