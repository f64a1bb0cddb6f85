//! Content index and keyword search.
//!
//! Every generated item is persisted as one `content` row plus a fully
//! rebuilt set of token/frequency rows. Search joins the two, scoring a
//! record by the summed frequency of its matching tokens. All public
//! operations degrade to empty/false results on storage errors; the index
//! is auxiliary and must never break audio generation.

pub mod store;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::ToSql;
use rusqlite::{params, Row};
use serde::Serialize;
use tracing::{debug, warn};

use crate::Result;

use store::DbPool;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://\S+").unwrap());

/// Path segments that name site plumbing rather than the article itself.
const BOILERPLATE_SEGMENTS: [&str; 4] = ["wiki", "wikipedia", "page", "article"];

const PREVIEW_WORDS: usize = 150;

/// One indexed generation.
#[derive(Debug, Clone, Serialize)]
pub struct ContentRecord {
    pub id: i64,
    pub title: String,
    pub original_text: String,
    pub rewritten_text: String,
    pub tone: String,
    pub voice: String,
    pub audio_path: String,
    /// RFC3339 UTC; lexicographic order matches chronological order.
    pub created_at: String,
    pub word_count: i64,
    pub duration_minutes: f64,
}

/// A search result: the record plus presentation extras.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub record: ContentRecord,
    /// Word-capped excerpt for result listings.
    pub preview: String,
    /// Summed matched-token frequency; 0 for recency-only listings.
    pub relevance: i64,
}

/// Relative date window measured against `Utc::now()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    Week,
    Month,
    Year,
}

impl DateFilter {
    /// Forgiving parse; unknown names mean no date restriction.
    pub fn parse(name: &str) -> Option<DateFilter> {
        match name.trim().to_lowercase().as_str() {
            "today" => Some(DateFilter::Today),
            "week" => Some(DateFilter::Week),
            "month" => Some(DateFilter::Month),
            "year" => Some(DateFilter::Year),
            _ => None,
        }
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateFilter::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
                .unwrap_or(now),
            DateFilter::Week => now - Duration::days(7),
            DateFilter::Month => now - Duration::days(30),
            DateFilter::Year => now - Duration::days(365),
        }
    }
}

/// Optional restrictions applied to a search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Exact tone match.
    pub tone: Option<String>,
    /// Exact voice match.
    pub voice: Option<String>,
    pub date: Option<DateFilter>,
}

/// Aggregate counts over the whole index.
#[derive(Debug, Clone, Serialize, Default)]
pub struct IndexStatistics {
    pub total_content: i64,
    pub total_words: i64,
    pub total_duration_minutes: f64,
    pub content_by_tone: HashMap<String, i64>,
    pub content_by_voice: HashMap<String, i64>,
}

/// Indexes generated content and answers keyword searches.
pub struct SearchEngine {
    pool: DbPool,
}

impl SearchEngine {
    pub fn new(db_path: &Path) -> Result<Self> {
        Ok(Self {
            pool: store::open_pool(db_path)?,
        })
    }

    /// Upsert a record keyed by `audio_path` and rebuild its token index.
    ///
    /// Record and token rows change inside one transaction, so a reader can
    /// never observe tokens referencing stale record state. Returns false
    /// (logged) instead of propagating storage errors.
    #[allow(clippy::too_many_arguments)]
    pub fn index_content(
        &self,
        title: &str,
        original_text: &str,
        rewritten_text: &str,
        tone: &str,
        voice: &str,
        audio_path: &str,
        word_count: i64,
        duration_minutes: f64,
    ) -> bool {
        let outcome = self.upsert(
            title,
            original_text,
            rewritten_text,
            tone,
            voice,
            audio_path,
            word_count,
            duration_minutes,
        );
        match outcome {
            Ok(content_id) => {
                debug!(content_id, audio_path, "echocast content indexed");
                true
            }
            Err(err) => {
                warn!(audio_path, error = %err, "echocast indexing failed");
                false
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn upsert(
        &self,
        title: &str,
        original_text: &str,
        rewritten_text: &str,
        tone: &str,
        voice: &str,
        audio_path: &str,
        word_count: i64,
        duration_minutes: f64,
    ) -> Result<i64> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM content WHERE audio_path = ?1",
                params![audio_path],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let content_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE content
                     SET title = ?1, original_text = ?2, rewritten_text = ?3,
                         tone = ?4, voice = ?5, word_count = ?6,
                         duration_minutes = ?7, created_at = ?8
                     WHERE id = ?9",
                    params![
                        title,
                        original_text,
                        rewritten_text,
                        tone,
                        voice,
                        word_count,
                        duration_minutes,
                        now,
                        id
                    ],
                )?;
                tx.execute(
                    "DELETE FROM search_index WHERE content_id = ?1",
                    params![id],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO content
                     (title, original_text, rewritten_text, tone, voice,
                      audio_path, created_at, word_count, duration_minutes)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        title,
                        original_text,
                        rewritten_text,
                        tone,
                        voice,
                        audio_path,
                        now,
                        word_count,
                        duration_minutes
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        let combined = format!("{} {}", original_text, rewritten_text);
        for (token, frequency) in tokenize(&combined) {
            tx.execute(
                "INSERT INTO search_index (content_id, token, frequency)
                 VALUES (?1, ?2, ?3)",
                params![content_id, token, frequency],
            )?;
        }

        tx.commit()?;
        Ok(content_id)
    }

    /// Keyword search with relevance scoring.
    ///
    /// URL-shaped queries have a keyword extracted from their last
    /// meaningful path segment first. A query with no usable tokens lists
    /// the most recent records instead, still subject to `filters`.
    pub fn search(&self, query: &str, filters: &SearchFilters, limit: usize) -> Vec<SearchHit> {
        match self.run_search(query, filters, limit) {
            Ok(hits) => hits,
            Err(err) => {
                warn!(query, error = %err, "echocast search failed");
                Vec::new()
            }
        }
    }

    fn run_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let processed = extract_url_keywords(query);
        let tokens: Vec<String> = tokenize(&processed).into_keys().collect();

        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        let mut sql = if tokens.is_empty() {
            "SELECT c.id, c.title, c.original_text, c.rewritten_text,
                    c.tone, c.voice, c.audio_path, c.created_at,
                    c.word_count, c.duration_minutes, 0
             FROM content c"
                .to_string()
        } else {
            let placeholders = (1..=tokens.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            for token in &tokens {
                values.push(Box::new(token.clone()));
            }
            clauses.push(format!("si.token IN ({placeholders})"));
            "SELECT c.id, c.title, c.original_text, c.rewritten_text,
                    c.tone, c.voice, c.audio_path, c.created_at,
                    c.word_count, c.duration_minutes, SUM(si.frequency) AS relevance
             FROM content c
             JOIN search_index si ON c.id = si.content_id"
                .to_string()
        };

        if let Some(tone) = &filters.tone {
            clauses.push(format!("c.tone = ?{}", values.len() + 1));
            values.push(Box::new(tone.clone()));
        }
        if let Some(voice) = &filters.voice {
            clauses.push(format!("c.voice = ?{}", values.len() + 1));
            values.push(Box::new(voice.clone()));
        }
        if let Some(date) = &filters.date {
            clauses.push(format!("c.created_at >= ?{}", values.len() + 1));
            values.push(Box::new(date.cutoff(Utc::now()).to_rfc3339()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if tokens.is_empty() {
            sql.push_str(" ORDER BY c.created_at DESC");
        } else {
            sql.push_str(" GROUP BY c.id ORDER BY relevance DESC, c.created_at DESC");
        }
        sql.push_str(&format!(" LIMIT ?{}", values.len() + 1));
        values.push(Box::new(limit as i64));

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let hits = stmt
            .query_map(params.as_slice(), |row| {
                let record = record_from_row(row)?;
                let relevance: i64 = row.get(10)?;
                Ok(SearchHit {
                    preview: preview_of(&record),
                    record,
                    relevance,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    /// Most recently created records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<SearchHit> {
        self.search("", &SearchFilters::default(), limit)
    }

    pub fn get(&self, id: i64) -> Option<ContentRecord> {
        let fetch = || -> Result<Option<ContentRecord>> {
            let conn = self.pool.get()?;
            let record = conn
                .query_row(
                    "SELECT id, title, original_text, rewritten_text, tone, voice,
                            audio_path, created_at, word_count, duration_minutes
                     FROM content WHERE id = ?1",
                    params![id],
                    |row| record_from_row(row),
                )
                .map(Some)
                .or_else(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(record)
        };
        match fetch() {
            Ok(record) => record,
            Err(err) => {
                warn!(id, error = %err, "echocast content lookup failed");
                None
            }
        }
    }

    /// Delete a record; its token rows cascade.
    pub fn delete(&self, id: i64) -> bool {
        let run = || -> Result<usize> {
            let conn = self.pool.get()?;
            Ok(conn.execute("DELETE FROM content WHERE id = ?1", params![id])?)
        };
        match run() {
            Ok(rows) => rows > 0,
            Err(err) => {
                warn!(id, error = %err, "echocast content delete failed");
                false
            }
        }
    }

    pub fn statistics(&self) -> IndexStatistics {
        match self.collect_statistics() {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "echocast statistics query failed");
                IndexStatistics::default()
            }
        }
    }

    fn collect_statistics(&self) -> Result<IndexStatistics> {
        let conn = self.pool.get()?;

        let (total_content, total_words, total_duration_minutes) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(word_count), 0),
                    COALESCE(SUM(duration_minutes), 0.0)
             FROM content",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stats = IndexStatistics {
            total_content,
            total_words,
            total_duration_minutes,
            ..IndexStatistics::default()
        };

        let mut by_tone = conn.prepare("SELECT tone, COUNT(*) FROM content GROUP BY tone")?;
        for row in by_tone.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))? {
            let (tone, count): (String, i64) = row?;
            stats.content_by_tone.insert(tone, count);
        }

        let mut by_voice = conn.prepare("SELECT voice, COUNT(*) FROM content GROUP BY voice")?;
        for row in by_voice.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))? {
            let (voice, count): (String, i64) = row?;
            stats.content_by_voice.insert(voice, count);
        }

        Ok(stats)
    }
}

fn record_from_row(row: &Row<'_>) -> std::result::Result<ContentRecord, rusqlite::Error> {
    Ok(ContentRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        original_text: row.get(2)?,
        rewritten_text: row.get(3)?,
        tone: row.get(4)?,
        voice: row.get(5)?,
        audio_path: row.get(6)?,
        created_at: row.get(7)?,
        word_count: row.get(8)?,
        duration_minutes: row.get(9)?,
    })
}

fn preview_of(record: &ContentRecord) -> String {
    let source = if record.original_text.trim().is_empty() {
        &record.rewritten_text
    } else {
        &record.original_text
    };
    truncate_words(source, PREVIEW_WORDS)
}

/// Word-cap `text`, appending an ellipsis when anything was cut.
pub(crate) fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        text.to_string()
    } else {
        format!("{}...", words[..max_words].join(" "))
    }
}

/// Per-token frequency over `\w+` tokens of length > 2, lowercased.
fn tokenize(text: &str) -> HashMap<String, i64> {
    let lowered = text.to_lowercase();
    let mut frequencies = HashMap::new();
    for token in TOKEN_RE.find_iter(&lowered) {
        let word = token.as_str();
        if word.chars().count() <= 2 {
            continue;
        }
        *frequencies.entry(word.to_string()).or_insert(0) += 1;
    }
    frequencies
}

/// Turn a URL query into the keyword its last meaningful path segment
/// spells. Non-URL queries come back unchanged.
fn extract_url_keywords(query: &str) -> String {
    let trimmed = query.trim();
    if !URL_RE.is_match(trimmed) {
        return query.to_string();
    }
    let Ok(parsed) = url::Url::parse(trimmed) else {
        return query.to_string();
    };
    let Some(segments) = parsed.path_segments() else {
        return query.to_string();
    };
    for segment in segments.rev() {
        if segment.is_empty() || BOILERPLATE_SEGMENTS.contains(&segment.to_lowercase().as_str()) {
            continue;
        }
        return segment
            .replace("%20", " ")
            .replace(['_', '-'], " ")
            .trim()
            .to_string();
    }
    query.to_string()
}
