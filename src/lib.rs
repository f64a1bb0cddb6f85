//! # echocast
//!
//! Text-to-narrated-audio content pipeline: tone-adaptive rewriting,
//! podcast scripting, speech synthesis with a deterministic offline
//! fallback, podcast audio enhancement, and a searchable content index.
//!
//! ## Overview
//!
//! The pipeline turns caller-supplied text into a playable narration. Text
//! is optionally rewritten in a selected tone (or restructured into a
//! podcast script), analyzed and shortened when too long, synthesized to an
//! audio file, optionally run through the podcast enhancement chain, and
//! indexed for keyword search.
//!
//! ## Core Philosophy
//!
//! - **Always produce something**: every remote service has a bounded retry
//!   budget and a deterministic local fallback. Fully offline operation
//!   still yields playable audio and rewritten text.
//! - **Explicit injection**: components are constructed once from an
//!   [`EngineConfig`] and passed by reference; there are no globals.
//! - **Best-effort persistence**: the search index degrades to empty
//!   results on storage trouble and never blocks generation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use echocast::{EchoCast, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() -> echocast::Result<()> {
//!     let pipeline = EchoCast::new(EngineConfig::from_env())?;
//!
//!     let rewrite = pipeline
//!         .process_text("A quiet town kept a secret.", "Suspenseful", "English", true)
//!         .await;
//!
//!     let audio = pipeline
//!         .generate_audio(&rewrite.rewritten_text, "Lisa", "Suspenseful", "English", true, true)
//!         .await;
//!     println!("narration at {:?}", audio.audio_path);
//!
//!     for hit in pipeline.search_content("secret", None, None, None, 10) {
//!         println!("{}: {}", hit.record.title, hit.preview);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`facade`] | The assembled pipeline handle consumed by callers |
//! | [`config`] | Engine configuration and environment loading |
//! | [`catalog`] | Tones, podcast styles, languages, and the voice table |
//! | [`analysis`] | Text statistics and extractive shortening |
//! | [`rewrite`] | Tone rewriting with remote backends and simulated fallback |
//! | [`narrator`] | Podcast script generation |
//! | [`tts`] | Synthesis orchestration, cloud client, offline synthesizer |
//! | [`audio`] | PCM buffers and the podcast enhancement chain |
//! | [`search`] | SQLite content index and keyword search |
//! | [`resilience`] | Shared retry-then-fallback combinator |

pub mod analysis;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod facade;
pub mod narrator;
pub mod resilience;
pub mod rewrite;
pub mod search;
pub mod tts;

// Re-export the surface callers actually touch.
pub use analysis::{TextAnalysis, TextAnalyzer};
pub use catalog::{
    Language, PodcastStyle, PodcastStyleSpec, Tone, ToneSpec, VoiceCatalog, VoiceSpec,
};
pub use config::{EngineConfig, RewriteService};
pub use facade::{estimate_listening_time, format_duration, EchoCast, ServiceStatus};
pub use narrator::PodcastNarrator;
pub use rewrite::{ProcessOutcome, TextProcessor};
pub use search::{
    ContentRecord, DateFilter, IndexStatistics, SearchEngine, SearchFilters, SearchHit,
};
pub use tts::{AudioResult, TtsEngine};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
