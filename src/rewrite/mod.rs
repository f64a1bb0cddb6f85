//! Tone-adapting text rewriter.
//!
//! The remote backend is asked first (retry with backoff), then a
//! deterministic rule-based rewrite takes over. Callers always get text
//! back; the only hard failure is an unknown tone name.

pub mod backend;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::catalog::Tone;
use crate::resilience::{remote_or_local, RetryPolicy};
use crate::Result;

pub use backend::{backend_from_config, GenerationParams, RewriteBackend};

/// Result object for [`TextProcessor::process`]. Mirrors what a UI shell
/// renders: the rewrite plus enough echo of the request to label it.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub rewritten_text: String,
    pub original_text: String,
    pub tone: String,
    pub language: String,
    pub error: Option<String>,
}

/// Rewrites text in a requested tone.
pub struct TextProcessor {
    backend: Arc<dyn RewriteBackend>,
    policy: RetryPolicy,
}

impl TextProcessor {
    pub fn new(backend: Arc<dyn RewriteBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Rewrite `text` in the named tone.
    ///
    /// Fails only on an unknown tone. Remote trouble degrades silently to
    /// the rule-based rewrite, and a blank result degrades to the original
    /// text.
    pub async fn rewrite(&self, text: &str, tone_name: &str) -> Result<String> {
        let tone = Tone::parse(tone_name)?;
        Ok(self.rewrite_as(text, tone).await)
    }

    /// Rewrite with an already-resolved tone. Never fails.
    pub async fn rewrite_as(&self, text: &str, tone: Tone) -> String {
        let prompt = format!("{}{}", tone.prompt_prefix(), text);
        let params = GenerationParams::rewrite();
        let backend = &self.backend;

        let generated = remote_or_local(
            &self.policy,
            "rewrite",
            backend.is_configured(),
            || backend.generate(&prompt, &params),
            || Ok(simulate_rewrite(text, tone)),
        )
        .await
        .unwrap_or_else(|_| text.to_string());

        let cleaned = clean_generated(&generated);
        if cleaned.is_empty() {
            text.to_string()
        } else {
            cleaned
        }
    }

    /// Wrapper used by callers that want a result object instead of a
    /// `Result`: an invalid tone comes back as `success: false` with the
    /// original text untouched.
    ///
    /// `auto_shorten` is part of the caller contract but acts at the
    /// synthesis stage, not here.
    pub async fn process(
        &self,
        text: &str,
        tone_name: &str,
        language: &str,
        auto_shorten: bool,
    ) -> ProcessOutcome {
        debug!(
            tone = tone_name,
            language,
            auto_shorten,
            chars = text.chars().count(),
            "echocast rewrite requested"
        );
        match self.rewrite(text, tone_name).await {
            Ok(rewritten_text) => ProcessOutcome {
                success: true,
                rewritten_text,
                original_text: text.to_string(),
                tone: tone_name.to_string(),
                language: language.to_string(),
                error: None,
            },
            Err(err) => ProcessOutcome {
                success: false,
                rewritten_text: text.to_string(),
                original_text: text.to_string(),
                tone: tone_name.to_string(),
                language: language.to_string(),
                error: Some(err.to_string()),
            },
        }
    }
}

/// Strip boilerplate markers some generation models echo back.
fn clean_generated(raw: &str) -> String {
    let without_echo = raw.replace("Original text:", "");
    let trimmed = without_echo.trim();
    let stripped = if trimmed.starts_with("Rewritten text:") {
        trimmed.replace("Rewritten text:", "")
    } else {
        trimmed.to_string()
    };
    stripped.trim().to_string()
}

/// Deterministic rule-based rewrite used when no remote service answers.
/// Splits on periods and transforms each segment by tone-specific rules.
pub(crate) fn simulate_rewrite(text: &str, tone: Tone) -> String {
    match tone {
        Tone::Neutral => apply_neutral(text),
        Tone::Suspenseful => apply_suspenseful(text),
        Tone::Inspiring => apply_inspiring(text),
    }
}

fn apply_neutral(text: &str) -> String {
    let mut rewritten = Vec::new();
    for segment in text.split('.') {
        let clean = segment.trim();
        if clean.is_empty() {
            continue;
        }
        let mut sentence = if clean.chars().count() > 10 {
            format!("It is important to understand that {}", clean.to_lowercase())
        } else {
            clean.to_string()
        };
        if !sentence.ends_with(['.', '!', '?']) {
            sentence.push('.');
        }
        rewritten.push(sentence);
    }
    rewritten.join(" ")
}

fn apply_suspenseful(text: &str) -> String {
    let mut rewritten = Vec::new();
    for segment in text.split('.') {
        let clean = segment.trim();
        if clean.is_empty() {
            continue;
        }
        let mut sentence = if clean.chars().count() > 15 {
            format!(
                "In the shadows of uncertainty, {}",
                clean.to_lowercase()
            )
        } else {
            clean.to_string()
        };
        sentence.push_str("... but what lies ahead remains a mystery.");
        rewritten.push(sentence);
    }
    rewritten.join(" ")
}

fn apply_inspiring(text: &str) -> String {
    let mut rewritten = Vec::new();
    for segment in text.split('.') {
        let clean = segment.trim();
        if clean.is_empty() {
            continue;
        }
        let mut sentence = if clean.chars().count() > 12 {
            format!("Believe in the power of {}", clean.to_lowercase())
        } else {
            clean.to_string()
        };
        sentence.push_str("! This is your moment to shine.");
        rewritten.push(sentence);
    }
    rewritten.join(" ")
}
