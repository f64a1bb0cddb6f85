//! Text statistics and extractive summarization.
//!
//! Every method here is total: analysis can degrade in quality but never
//! fails, so downstream stages always have statistics to attach to results.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Basic English stopword list for keyword extraction.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "can", "will", "just",
        "should", "now",
    ]
    .into_iter()
    .collect()
});

/// Words that commonly end in a period mid-sentence. The sentence scanner
/// refuses to split after these.
static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mr", "mrs", "ms", "dr", "prof", "rev", "gen", "sen", "rep", "st", "jr", "sr", "vs",
        "etc", "inc", "ltd", "co", "no", "fig", "al", "dept", "est", "approx",
    ]
    .into_iter()
    .collect()
});

/// Statistics describing one piece of text at a point in the pipeline.
///
/// `was_shortened`, `original_word_count` and `podcast_enhanced` record what
/// the audio stage did to the text after the initial analysis.
#[derive(Debug, Clone, Serialize)]
pub struct TextAnalysis {
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    /// Up to five (token, frequency) pairs, most frequent first; ties keep
    /// first-encountered order.
    pub top_keywords: Vec<(String, usize)>,
    /// Reading time at 200 words per minute, rounded to one decimal.
    pub estimated_minutes: f64,
    pub was_shortened: bool,
    pub original_word_count: Option<usize>,
    pub podcast_enhanced: bool,
}

/// Analyzer for narration input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAnalyzer;

impl TextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compute statistics for a piece of text.
    pub fn analyze(&self, text: &str) -> TextAnalysis {
        let char_count = text.chars().count();
        let word_count = text.split_whitespace().count();
        let sentence_count = self.split_sentences(text).len();
        let top_keywords = self.top_keywords(text, 5);

        TextAnalysis {
            char_count,
            word_count,
            sentence_count,
            top_keywords,
            estimated_minutes: round_tenth(word_count as f64 / 200.0),
            was_shortened: false,
            original_word_count: None,
            podcast_enhanced: false,
        }
    }

    /// Split text into sentences with an abbreviation-aware scan over
    /// `.`/`!`/`?` runs followed by whitespace. Text without terminal
    /// punctuation comes back as a single sentence.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut sentences = Vec::new();
        let mut start = 0usize;
        let mut i = 0usize;

        while i < chars.len() {
            if !matches!(chars[i], '.' | '!' | '?') {
                i += 1;
                continue;
            }

            // Consume the terminator run plus any trailing closers.
            let mut end = i + 1;
            while end < chars.len() && matches!(chars[end], '.' | '!' | '?') {
                end += 1;
            }
            while end < chars.len() && matches!(chars[end], '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
            {
                end += 1;
            }

            let at_boundary = end >= chars.len() || chars[end].is_whitespace();
            let lone_period = chars[i] == '.' && end == i + 1;
            if !at_boundary || (lone_period && is_abbreviation_tail(&chars[start..i])) {
                i = end;
                continue;
            }

            let sentence: String = chars[start..end].iter().collect();
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            while end < chars.len() && chars[end].is_whitespace() {
                end += 1;
            }
            start = end;
            i = end;
        }

        if start < chars.len() {
            let tail: String = chars[start..].iter().collect();
            let tail = tail.trim();
            if !tail.is_empty() {
                sentences.push(tail.to_string());
            }
        }
        sentences
    }

    /// Most frequent non-stopword tokens of length > 2 on the lowercased
    /// text, capped at `limit`. Ties keep first-encountered order.
    pub fn top_keywords(&self, text: &str, limit: usize) -> Vec<(String, usize)> {
        let lowered = text.to_lowercase();
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut order = 0usize;

        for token in KEYWORD_RE.find_iter(&lowered) {
            let word = token.as_str();
            if word.chars().count() <= 2 || STOPWORDS.contains(word) {
                continue;
            }
            let entry = counts.entry(word.to_string()).or_insert_with(|| {
                order += 1;
                (0, order)
            });
            entry.0 += 1;
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, seen))| (word, count, seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(word, count, _)| (word, count))
            .collect()
    }

    /// Extractive shortening: keep the first sentence, the last sentence,
    /// then interior sentences by descending length until `max_sentences`,
    /// concatenated in that order. The result is word-capped at `max_words`
    /// with an ellipsis marker.
    pub fn shorten(&self, text: &str, max_sentences: usize, max_words: usize) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let sentences = self.split_sentences(text);
        if sentences.len() <= max_sentences {
            return text.to_string();
        }

        let mut kept: Vec<&str> = Vec::with_capacity(max_sentences);
        kept.push(&sentences[0]);
        if sentences.len() > 1 {
            kept.push(&sentences[sentences.len() - 1]);
        }

        if sentences.len() > 2 && kept.len() < max_sentences {
            let mut interior: Vec<&String> = sentences[1..sentences.len() - 1].iter().collect();
            // Longer sentences tend to carry more information.
            interior.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
            for sentence in interior {
                if kept.len() >= max_sentences {
                    break;
                }
                kept.push(sentence);
            }
        }

        let shortened = kept.join(" ");
        let words: Vec<&str> = shortened.split_whitespace().collect();
        if words.len() > max_words {
            format!("{}...", words[..max_words].join(" "))
        } else {
            shortened
        }
    }

    /// Whether the text is long enough to warrant shortening before TTS.
    pub fn is_too_long(&self, text: &str, max_words: usize) -> bool {
        text.split_whitespace().count() > max_words
    }
}

fn is_abbreviation_tail(prefix: &[char]) -> bool {
    let word: String = prefix
        .iter()
        .rev()
        .take_while(|c| c.is_alphanumeric())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if word.is_empty() {
        return false;
    }
    // Single uppercase letter reads as an initial ("J. Smith").
    if word.chars().count() == 1 {
        return word.chars().all(|c| c.is_alphabetic() && c.is_uppercase());
    }
    ABBREVIATIONS.contains(word.to_lowercase().as_str())
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
