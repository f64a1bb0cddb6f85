//! SQLite pool and schema for the content index.
//!
//! Connections run in WAL mode with foreign keys enforced, so a content
//! delete cascades to its token rows. The schema is applied once at open;
//! it only ever uses `IF NOT EXISTS` statements and is safe to re-run.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

use crate::Result;

/// Pool type shared by the search engine.
pub type DbPool = Pool<SqliteConnectionManager>;

const BUSY_TIMEOUT_MS: u64 = 5_000;
const POOL_MAX_SIZE: u32 = 4;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    original_text TEXT NOT NULL,
    rewritten_text TEXT NOT NULL,
    tone TEXT NOT NULL,
    voice TEXT NOT NULL,
    audio_path TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    word_count INTEGER NOT NULL,
    duration_minutes REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS search_index (
    content_id INTEGER NOT NULL REFERENCES content(id) ON DELETE CASCADE,
    token TEXT NOT NULL,
    frequency INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_search_token ON search_index(token);
CREATE INDEX IF NOT EXISTS idx_search_content ON search_index(content_id);
CREATE INDEX IF NOT EXISTS idx_content_tone ON content(tone);
CREATE INDEX IF NOT EXISTS idx_content_voice ON content(voice);
CREATE INDEX IF NOT EXISTS idx_content_created ON content(created_at);
";

/// Open (or create) the index database and apply the schema.
pub fn open_pool(db_path: &Path) -> Result<DbPool> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(|conn| {
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = WAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
            ))
        });

    let pool = Pool::builder().max_size(POOL_MAX_SIZE).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(SCHEMA)?;
    Ok(pool)
}
