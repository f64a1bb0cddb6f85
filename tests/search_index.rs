//! Content index behavior that needs direct database manipulation:
//! backdated records for date filters, cascade verification, and the
//! URL-query pathway end to end.

use chrono::{Duration, Utc};
use echocast::{DateFilter, SearchEngine, SearchFilters};
use rusqlite::Connection;

fn engine_at(dir: &tempfile::TempDir) -> (SearchEngine, std::path::PathBuf) {
    let db_path = dir.path().join("index.db");
    (SearchEngine::new(&db_path).unwrap(), db_path)
}

fn index(engine: &SearchEngine, path: &str, text: &str, tone: &str, voice: &str) {
    assert!(engine.index_content(
        "title",
        text,
        text,
        tone,
        voice,
        path,
        text.split_whitespace().count() as i64,
        0.3,
    ));
}

fn backdate(db_path: &std::path::Path, audio_path: &str, days_ago: i64) {
    let conn = Connection::open(db_path).unwrap();
    let stamp = (Utc::now() - Duration::days(days_ago)).to_rfc3339();
    let changed = conn
        .execute(
            "UPDATE content SET created_at = ?1 WHERE audio_path = ?2",
            rusqlite::params![stamp, audio_path],
        )
        .unwrap();
    assert_eq!(changed, 1);
}

#[test]
fn week_filter_includes_recent_and_excludes_stale_records() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, db_path) = engine_at(&dir);

    index(&engine, "old.wav", "glacier retreat studies", "Neutral", "Lisa");
    index(&engine, "new.wav", "glacier formation basics", "Neutral", "Lisa");
    backdate(&db_path, "old.wav", 10);
    backdate(&db_path, "new.wav", 2);

    let filters = SearchFilters {
        date: Some(DateFilter::Week),
        ..SearchFilters::default()
    };
    let hits = engine.search("glacier", &filters, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.audio_path, "new.wav");

    // Recency listing honors the same window.
    let recent = engine.search("", &filters, 10);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].record.audio_path, "new.wav");
}

#[test]
fn year_filter_keeps_both_records() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, db_path) = engine_at(&dir);

    index(&engine, "old.wav", "comet observations", "Neutral", "Lisa");
    index(&engine, "new.wav", "comet tails explained", "Neutral", "Lisa");
    backdate(&db_path, "old.wav", 300);
    backdate(&db_path, "new.wav", 2);

    let filters = SearchFilters {
        date: Some(DateFilter::Year),
        ..SearchFilters::default()
    };
    assert_eq!(engine.search("comet", &filters, 10).len(), 2);
}

#[test]
fn url_query_finds_matching_article() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = engine_at(&dir);

    index(
        &engine,
        "ai.wav",
        "Artificial intelligence reshapes modern research and industry.",
        "Neutral",
        "Lisa",
    );
    index(&engine, "sea.wav", "Oceanography field notes.", "Neutral", "Lisa");

    let hits = engine.search(
        "https://en.wikipedia.org/wiki/Artificial_intelligence",
        &SearchFilters::default(),
        10,
    );
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.audio_path, "ai.wav");
}

#[test]
fn upsert_refreshes_recency_ordering() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, db_path) = engine_at(&dir);

    index(&engine, "a.wav", "alpha entry", "Neutral", "Lisa");
    index(&engine, "b.wav", "beta entry", "Neutral", "Lisa");
    backdate(&db_path, "a.wav", 5);
    backdate(&db_path, "b.wav", 3);

    // Re-indexing the older item bumps its created_at to now.
    index(&engine, "a.wav", "alpha entry revised", "Neutral", "Lisa");

    let recent = engine.recent(10);
    assert_eq!(recent[0].record.audio_path, "a.wav");
    assert_eq!(recent[0].record.original_text, "alpha entry revised");
}

#[test]
fn delete_removes_token_rows_from_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, db_path) = engine_at(&dir);

    index(&engine, "gone.wav", "ephemeral tokens vanish entirely", "Neutral", "Lisa");
    let id = engine.recent(1)[0].record.id;

    let conn = Connection::open(&db_path).unwrap();
    let before: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM search_index WHERE content_id = ?1",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert!(before > 0);

    assert!(engine.delete(id));

    let after: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM search_index WHERE content_id = ?1",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(after, 0);
}

#[test]
fn limit_caps_result_count() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = engine_at(&dir);

    for i in 0..5 {
        index(
            &engine,
            &format!("clip{i}.wav"),
            "repeated keyword lighthouse",
            "Neutral",
            "Lisa",
        );
    }
    assert_eq!(engine.search("lighthouse", &SearchFilters::default(), 3).len(), 3);
    assert_eq!(engine.recent(2).len(), 2);
}
