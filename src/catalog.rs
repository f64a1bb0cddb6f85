//! Built-in catalogs: tones, podcast styles, languages and voices.
//!
//! Lookup rules are deliberately asymmetric. Tones form a closed set and an
//! unknown tone is a typed error; voices and styles resolve silently to a
//! default so narration is never blocked by a bad selector.

use serde::Serialize;
use std::fmt;

use crate::{Error, ErrorContext, Result};

/// Narration tone for the rewrite stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tone {
    Neutral,
    Suspenseful,
    Inspiring,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Neutral, Tone::Suspenseful, Tone::Inspiring];

    pub fn name(&self) -> &'static str {
        match self {
            Tone::Neutral => "Neutral",
            Tone::Suspenseful => "Suspenseful",
            Tone::Inspiring => "Inspiring",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tone::Neutral => "Clear, balanced narration suitable for educational content",
            Tone::Suspenseful => "Dramatic, engaging style perfect for thrillers and mysteries",
            Tone::Inspiring => "Uplifting, motivational delivery for personal development",
        }
    }

    /// Instruction prefix prepended to the source text for the remote
    /// rewrite prompt.
    pub fn prompt_prefix(&self) -> &'static str {
        match self {
            Tone::Neutral => {
                "Rewrite the following text in a neutral, clear, and educational tone \
                 while maintaining all key information and meaning: "
            }
            Tone::Suspenseful => {
                "Rewrite the following text with a suspenseful, dramatic tone that builds \
                 tension and engages the reader while preserving the original meaning: "
            }
            Tone::Inspiring => {
                "Rewrite the following text with a inspiring, motivational tone that \
                 uplifts and encourages while maintaining the original message: "
            }
        }
    }

    /// Strict, case-insensitive parse over the closed tone set.
    pub fn parse(name: &str) -> Result<Tone> {
        let trimmed = name.trim();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidTone {
                requested: name.to_string(),
            })
    }

    pub fn spec(&self) -> ToneSpec {
        ToneSpec {
            name: self.name(),
            description: self.description(),
            prompt_prefix: self.prompt_prefix(),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-facing description of a tone.
#[derive(Debug, Clone, Serialize)]
pub struct ToneSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub prompt_prefix: &'static str,
}

/// Script flavor for podcast narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PodcastStyle {
    Conversational,
    Educational,
    Storytelling,
    News,
    Interview,
}

impl PodcastStyle {
    pub const ALL: [PodcastStyle; 5] = [
        PodcastStyle::Conversational,
        PodcastStyle::Educational,
        PodcastStyle::Storytelling,
        PodcastStyle::News,
        PodcastStyle::Interview,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PodcastStyle::Conversational => "Conversational",
            PodcastStyle::Educational => "Educational",
            PodcastStyle::Storytelling => "Storytelling",
            PodcastStyle::News => "News",
            PodcastStyle::Interview => "Interview",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PodcastStyle::Conversational => "Friendly, chatty style like a casual conversation",
            PodcastStyle::Educational => "Informative, explanatory style for learning content",
            PodcastStyle::Storytelling => "Narrative style with dramatic elements",
            PodcastStyle::News => "Formal, authoritative style like news reporting",
            PodcastStyle::Interview => "Question-answer format with multiple voices",
        }
    }

    /// Forgiving parse: anything outside the known set is Educational.
    pub fn parse_or_default(name: &str) -> PodcastStyle {
        let trimmed = name.trim();
        PodcastStyle::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(trimmed))
            .unwrap_or(PodcastStyle::Educational)
    }

    pub fn spec(&self) -> PodcastStyleSpec {
        PodcastStyleSpec {
            name: self.name(),
            description: self.description(),
        }
    }
}

impl fmt::Display for PodcastStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-facing description of a podcast style.
#[derive(Debug, Clone, Serialize)]
pub struct PodcastStyleSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// A supported narration language and its short locale code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

/// Languages the pipeline accepts. Voice definitions exist for a subset;
/// the rest synthesize through the locale-keyed fallback engine.
pub const LANGUAGES: [Language; 13] = [
    Language { name: "English", code: "en" },
    Language { name: "Hindi", code: "hi" },
    Language { name: "Telugu", code: "te" },
    Language { name: "Spanish", code: "es" },
    Language { name: "French", code: "fr" },
    Language { name: "German", code: "de" },
    Language { name: "Italian", code: "it" },
    Language { name: "Portuguese", code: "pt" },
    Language { name: "Japanese", code: "ja" },
    Language { name: "Korean", code: "ko" },
    Language { name: "Chinese", code: "zh" },
    Language { name: "Arabic", code: "ar" },
    Language { name: "Russian", code: "ru" },
];

/// Short locale code for a language name; unknown languages map to English.
pub fn language_code(name: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|lang| lang.name.eq_ignore_ascii_case(name.trim()))
        .map(|lang| lang.code)
        .unwrap_or("en")
}

/// One selectable narration voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceSpec {
    pub name: String,
    pub description: String,
    /// Voice id sent to the cloud TTS service.
    pub service_voice_id: String,
    /// Locale code for the fallback synthesizer.
    pub locale_code: String,
}

impl VoiceSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        service_voice_id: impl Into<String>,
        locale_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            service_voice_id: service_voice_id.into(),
            locale_code: locale_code.into(),
        }
    }
}

/// Voice table: language name to an ordered, non-empty list of voices.
/// The first voice of each list is that language's default.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    languages: Vec<(String, Vec<VoiceSpec>)>,
    default_language: String,
}

impl VoiceCatalog {
    /// Build a catalog from explicit entries, validating the shape the
    /// resolver depends on: every language carries at least one voice and
    /// the default language is present.
    pub fn new(
        default_language: impl Into<String>,
        languages: Vec<(String, Vec<VoiceSpec>)>,
    ) -> Result<Self> {
        let default_language = default_language.into();
        for (language, voices) in &languages {
            if voices.is_empty() {
                return Err(Error::configuration_with_context(
                    format!("language '{}' has no voices", language),
                    ErrorContext::new()
                        .with_operation("catalog_load")
                        .with_source("voice_catalog"),
                ));
            }
        }
        if !languages
            .iter()
            .any(|(language, _)| language == &default_language)
        {
            return Err(Error::configuration_with_context(
                format!("default language '{}' has no voice list", default_language),
                ErrorContext::new()
                    .with_operation("catalog_load")
                    .with_source("voice_catalog"),
            ));
        }
        Ok(Self {
            languages,
            default_language,
        })
    }

    /// The built-in voice table.
    pub fn builtin() -> Self {
        Self {
            default_language: "English".to_string(),
            languages: vec![
                (
                    "English".to_string(),
                    vec![
                        VoiceSpec::new(
                            "Lisa",
                            "Female voice, warm and professional",
                            "en-US_LisaV3Voice",
                            "en",
                        ),
                        VoiceSpec::new(
                            "Michael",
                            "Male voice, clear and authoritative",
                            "en-US_MichaelV3Voice",
                            "en",
                        ),
                        VoiceSpec::new(
                            "Allison",
                            "Female voice, friendly and engaging",
                            "en-US_AllisonV3Voice",
                            "en",
                        ),
                    ],
                ),
                (
                    "Telugu".to_string(),
                    vec![
                        VoiceSpec::new(
                            "Alexa",
                            "Female Telugu voice, clear and expressive",
                            "te-IN_NeerjaV3Voice",
                            "te",
                        ),
                        VoiceSpec::new(
                            "Mazeo",
                            "Male Telugu voice, deep and authoritative",
                            "te-IN_MohanV3Voice",
                            "te",
                        ),
                        VoiceSpec::new(
                            "Default",
                            "Standard Telugu voice",
                            "te-IN_MohanV3Voice",
                            "te",
                        ),
                    ],
                ),
                (
                    "Hindi".to_string(),
                    vec![VoiceSpec::new(
                        "Default",
                        "Standard Hindi voice",
                        "hi-IN_KaranV3Voice",
                        "hi",
                    )],
                ),
                (
                    "Spanish".to_string(),
                    vec![VoiceSpec::new(
                        "Default",
                        "Standard Spanish voice",
                        "es-ES_LauraV3Voice",
                        "es",
                    )],
                ),
            ],
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Voice list for a language; unknown languages yield the default
    /// language's list. Guaranteed non-empty.
    pub fn voices_for(&self, language: &str) -> &[VoiceSpec] {
        self.languages
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(language.trim()))
            .or_else(|| {
                self.languages
                    .iter()
                    .find(|(name, _)| name == &self.default_language)
            })
            .map(|(_, voices)| voices.as_slice())
            .unwrap_or(&[])
    }

    /// Resolve a language/voice selection. Never fails: an unknown voice
    /// resolves to the language default (the first list entry).
    pub fn resolve(&self, language: &str, voice_name: &str) -> &VoiceSpec {
        let voices = self.voices_for(language);
        voices
            .iter()
            .find(|voice| voice.name.eq_ignore_ascii_case(voice_name.trim()))
            .unwrap_or_else(|| &voices[0])
    }

    /// Language names with voice definitions, in catalog order.
    pub fn languages(&self) -> Vec<&str> {
        self.languages
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
