//! End-to-end pipeline tests with no credentials configured.
//!
//! Every remote service is absent, so these exercise the terminal fallback
//! path: simulated rewrites, template scripts, the offline synthesizer, and
//! the local index. The contract under test is "offline operation still
//! yields playable audio and rewritten text".

use echocast::audio::AudioBuffer;
use echocast::{EchoCast, EngineConfig, TextAnalyzer, Tone};

fn offline_pipeline() -> (tempfile::TempDir, EchoCast) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::default();
    config.audio_dir = dir.path().join("audio");
    config.index_db = dir.path().join("index.db");
    // Keep enhancement fast in tests.
    config.enhancer.intro_secs = 0.2;
    config.enhancer.outro_secs = 0.2;
    config.enhancer.crossfade_secs = 0.1;
    let pipeline = EchoCast::new(config).unwrap();
    (dir, pipeline)
}

const FIVE_SENTENCES: &str = "The lighthouse keeper climbed the stairs. \
    A storm gathered over the dark water. The lamp flickered twice and died. \
    She reached for the spare wick with steady hands. Light returned to the bay.";

#[tokio::test]
async fn suspenseful_rewrite_offline_appends_cliffhanger() {
    let (_dir, pipeline) = offline_pipeline();

    let outcome = pipeline
        .process_text(FIVE_SENTENCES, "Suspenseful", "English", true)
        .await;
    assert!(outcome.success);
    assert!(!outcome.rewritten_text.is_empty());
    assert_ne!(outcome.rewritten_text, FIVE_SENTENCES);
    assert!(outcome
        .rewritten_text
        .contains("but what lies ahead remains a mystery."));
}

#[tokio::test]
async fn every_tone_rewrites_deterministically_offline() {
    let (_dir, pipeline) = offline_pipeline();

    for tone in Tone::ALL {
        let first = pipeline
            .process_text(FIVE_SENTENCES, tone.name(), "English", true)
            .await;
        let second = pipeline
            .process_text(FIVE_SENTENCES, tone.name(), "English", true)
            .await;
        assert!(first.success, "tone {} failed", tone);
        assert!(!first.rewritten_text.is_empty());
        assert_ne!(first.rewritten_text, FIVE_SENTENCES);
        assert_eq!(first.rewritten_text, second.rewritten_text);
    }
}

#[tokio::test]
async fn neutral_rewrite_preserves_sentence_count() {
    let (_dir, pipeline) = offline_pipeline();
    let analyzer = TextAnalyzer::new();

    let outcome = pipeline
        .process_text(FIVE_SENTENCES, "Neutral", "English", true)
        .await;
    let input_sentences = analyzer.analyze(FIVE_SENTENCES).sentence_count;
    let output_sentences = analyzer.analyze(&outcome.rewritten_text).sentence_count;
    assert_eq!(input_sentences, 5);
    assert_eq!(output_sentences, input_sentences);
}

#[tokio::test]
async fn invalid_tone_soft_fails_and_keeps_content() {
    let (_dir, pipeline) = offline_pipeline();

    let outcome = pipeline
        .process_text(FIVE_SENTENCES, "Sarcastic", "English", true)
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.rewritten_text, FIVE_SENTENCES);
    assert!(outcome.error.unwrap().contains("Sarcastic"));
}

#[tokio::test]
async fn generate_audio_offline_produces_playable_wav_and_indexes_it() {
    let (_dir, pipeline) = offline_pipeline();

    let result = pipeline
        .generate_audio(
            "The bay was calm again tonight.",
            "Lisa",
            "Neutral",
            "English",
            true,
            false,
        )
        .await;
    assert!(result.success, "error: {:?}", result.error);
    assert!(!result.analysis.podcast_enhanced);

    let path = result.audio_path.expect("audio path");
    assert!(path.exists());
    let audio = AudioBuffer::load(&path).unwrap();
    assert!(audio.duration_secs() > 0.5);

    // Reading time at 200 wpm, one decimal.
    assert_eq!(result.analysis.word_count, 6);
    assert_eq!(result.analysis.estimated_minutes, 0.0);

    let hits = pipeline.search_content("tonight", None, None, None, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.title, "The bay was calm again...");
    assert_eq!(hits[0].record.voice, "Lisa");
}

#[tokio::test]
async fn podcast_mode_enhances_the_narration() {
    let (_dir, pipeline) = offline_pipeline();

    let result = pipeline
        .generate_audio(
            "A short enhanced narration.",
            "Lisa",
            "Inspiring",
            "English",
            false,
            true,
        )
        .await;
    assert!(result.success);
    assert!(result.analysis.podcast_enhanced);

    let path = result.audio_path.unwrap();
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("podcast_"), "got {name}");

    // Intro and outro beds make the enhanced file longer than the raw one.
    let enhanced = AudioBuffer::load(&path).unwrap();
    assert!(enhanced.duration_secs() > 0.3);
}

#[tokio::test]
async fn unknown_voice_and_language_fall_back_silently() {
    let (_dir, pipeline) = offline_pipeline();

    let result = pipeline
        .generate_audio(
            "Fallback voices still narrate.",
            "NoSuchVoice",
            "Neutral",
            "Klingon",
            true,
            false,
        )
        .await;
    assert!(result.success);

    // The English default voice was substituted.
    let hits = pipeline.search_content("narrate", None, None, None, 10);
    assert_eq!(hits[0].record.voice, "Lisa");
}

#[tokio::test]
async fn long_input_is_shortened_before_synthesis() {
    let (_dir, pipeline) = offline_pipeline();

    let long_text = (0..40)
        .map(|i| format!("Sentence number {i} carries a handful of words."))
        .collect::<Vec<_>>()
        .join(" ");

    let result = pipeline
        .generate_audio(&long_text, "Lisa", "Neutral", "English", true, false)
        .await;
    assert!(result.success);
    assert!(result.analysis.was_shortened);
    assert_eq!(
        result.analysis.original_word_count,
        Some(long_text.split_whitespace().count())
    );
    assert!(result.analysis.word_count <= 101); // word cap plus ellipsis token
    assert_ne!(result.processed_text, long_text);
}

#[tokio::test]
async fn podcast_script_is_generated_offline() {
    let (_dir, pipeline) = offline_pipeline();

    let script = pipeline
        .generate_podcast_script("Tides follow the moon.", "Ocean Tides", "Educational")
        .await;
    assert!(script.contains("ocean tides"));
    assert!(script.contains("To begin with, Tides follow the moon."));
    assert!(script.ends_with("This has been an EchoCast production."));
}

#[tokio::test]
async fn statistics_track_generated_content() {
    let (_dir, pipeline) = offline_pipeline();

    pipeline
        .generate_audio("First narration here.", "Lisa", "Neutral", "English", true, false)
        .await;
    pipeline
        .generate_audio("Second narration here.", "Michael", "Inspiring", "English", true, false)
        .await;

    let stats = pipeline.get_statistics();
    assert_eq!(stats.total_content, 2);
    assert_eq!(stats.total_words, 6);
    assert_eq!(stats.content_by_tone.get("Neutral"), Some(&1));
    assert_eq!(stats.content_by_voice.get("Michael"), Some(&1));

    let files = pipeline.list_audio_files();
    assert_eq!(files.len(), 2);
}
