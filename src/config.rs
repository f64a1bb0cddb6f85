//! Engine configuration.
//!
//! All components are constructed from an [`EngineConfig`] passed explicitly
//! at build time. Credentials are env-sourced; every remote service is
//! optional and the pipeline degrades to local fallbacks when one is absent.

use std::env;
use std::path::PathBuf;

use crate::resilience::RetryPolicy;

/// Which remote text-generation service backs the rewrite and narration
/// prompts. Selection only; either service may still be unconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteService {
    Watsonx,
    HuggingFace,
}

impl RewriteService {
    pub fn id(&self) -> &'static str {
        match self {
            RewriteService::Watsonx => "watsonx",
            RewriteService::HuggingFace => "huggingface",
        }
    }

    fn from_env_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "ibm" | "watsonx" => RewriteService::Watsonx,
            _ => RewriteService::HuggingFace,
        }
    }
}

/// Credentials and endpoint for the watsonx-style generation API.
#[derive(Debug, Clone)]
pub struct WatsonxConfig {
    pub api_key: String,
    /// Full generation endpoint URL (POST target).
    pub api_url: String,
    pub project_id: String,
    pub model_id: String,
}

impl Default for WatsonxConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://us-south.ml.cloud.ibm.com/ml/v1/text/generation".to_string(),
            project_id: String::new(),
            model_id: "ibm/granite-13b-instruct-v2".to_string(),
        }
    }
}

impl WatsonxConfig {
    /// Both the key and the project id are required by the API.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.project_id.is_empty() && !self.api_url.is_empty()
    }
}

/// Credentials and endpoint for the Hugging Face inference API shape.
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_key: String,
    /// Base URL; the model id is appended as a path segment.
    pub api_url: String,
    pub model: String,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "microsoft/DialoGPT-medium".to_string(),
        }
    }
}

impl HuggingFaceConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_url.is_empty()
    }
}

/// Rewrite/narration backend selection plus per-call retry budget.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    pub service: RewriteService,
    pub watsonx: WatsonxConfig,
    pub hugging_face: HuggingFaceConfig,
    pub retry: RetryPolicy,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            service: RewriteService::HuggingFace,
            watsonx: WatsonxConfig::default(),
            hugging_face: HuggingFaceConfig::default(),
            retry: RetryPolicy::rewrite_default(),
        }
    }
}

/// Cloud TTS endpoint (watson-style `synthesize`).
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_key: String,
    pub api_url: String,
    pub retry: RetryPolicy,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.us-south.text-to-speech.watson.cloud.ibm.com".to_string(),
            retry: RetryPolicy::tts_default(),
        }
    }
}

impl TtsConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_url.is_empty()
    }
}

/// Script generation retry budget. Narration prompts are longer than rewrite
/// prompts, so the per-attempt timeout is wider and the budget smaller.
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    pub retry: RetryPolicy,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::narrator_default(),
        }
    }
}

/// Podcast post-processing parameters. All stages are optional and fail soft.
#[derive(Debug, Clone)]
pub struct EnhancerConfig {
    pub normalize: bool,
    pub voice_band_eq: bool,
    pub compress: bool,
    /// Intro length when no intro file is configured (silence bed).
    pub intro_secs: f64,
    pub outro_secs: f64,
    pub crossfade_secs: f64,
    /// Optional branded intro/outro WAV files; silence is used when absent.
    pub intro_path: Option<PathBuf>,
    pub outro_path: Option<PathBuf>,
    /// Chapter markers are inserted only past this total duration.
    pub chapter_threshold_secs: f64,
    pub chapter_interval_secs: f64,
    pub marker_tone_hz: f64,
    pub marker_tone_secs: f64,
    /// Silence guard on each side of a marker tone.
    pub marker_guard_secs: f64,
    pub marker_gain_db: f64,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            voice_band_eq: true,
            compress: true,
            intro_secs: 3.0,
            outro_secs: 2.0,
            crossfade_secs: 1.5,
            intro_path: None,
            outro_path: None,
            chapter_threshold_secs: 600.0,
            chapter_interval_secs: 300.0,
            marker_tone_hz: 1000.0,
            marker_tone_secs: 0.3,
            marker_guard_secs: 0.5,
            marker_gain_db: -20.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory where synthesized and enhanced audio files are written.
    pub audio_dir: PathBuf,
    /// SQLite file backing the content index.
    pub index_db: PathBuf,
    /// Hard cap on input text length, in characters.
    pub max_text_len: usize,
    pub rewrite: RewriteConfig,
    pub tts: TtsConfig,
    pub narrator: NarratorConfig,
    pub enhancer: EnhancerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("audio"),
            index_db: PathBuf::from("echocast.db"),
            max_text_len: 10_000,
            rewrite: RewriteConfig::default(),
            tts: TtsConfig::default(),
            narrator: NarratorConfig::default(),
            enhancer: EnhancerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the process environment.
    ///
    /// Unset variables keep their defaults; an engine built this way works
    /// fully offline with empty credentials.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env_string("ECHOCAST_AUDIO_DIR") {
            config.audio_dir = PathBuf::from(dir);
        }
        if let Some(db) = env_string("ECHOCAST_INDEX_DB") {
            config.index_db = PathBuf::from(db);
        }
        if let Some(max) = env::var("ECHOCAST_MAX_TEXT_LEN")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            config.max_text_len = max;
        }

        if let Some(service) = env_string("AI_SERVICE") {
            config.rewrite.service = RewriteService::from_env_name(&service);
        }
        if let Some(key) = env_string("IBM_WATSONX_API_KEY") {
            config.rewrite.watsonx.api_key = key;
        }
        if let Some(url) = env_string("IBM_WATSONX_API_URL") {
            config.rewrite.watsonx.api_url = url;
        }
        if let Some(project) = env_string("IBM_WATSONX_PROJECT_ID") {
            config.rewrite.watsonx.project_id = project;
        }
        if let Some(key) = env_string("HUGGINGFACE_API_KEY") {
            config.rewrite.hugging_face.api_key = key;
        }
        if let Some(url) = env_string("HUGGINGFACE_API_URL") {
            config.rewrite.hugging_face.api_url = url;
        }
        if let Some(model) = env_string("HUGGINGFACE_MODEL") {
            config.rewrite.hugging_face.model = model;
        }

        if let Some(key) = env_string("IBM_TTS_API_KEY") {
            config.tts.api_key = key;
        }
        if let Some(url) = env_string("IBM_TTS_URL") {
            config.tts.api_url = url;
        }

        config
    }

    /// Whether the selected rewrite backend has usable credentials.
    pub fn rewrite_configured(&self) -> bool {
        match self.rewrite.service {
            RewriteService::Watsonx => self.rewrite.watsonx.is_configured(),
            RewriteService::HuggingFace => self.rewrite.hugging_face.is_configured(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
