//! SQLite-backed question storage.
//!
//! One table, one long-lived connection. Every public operation is a single
//! statement, so callers never observe a partially applied write.

mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Deck, QuestionRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("question text must not be empty")]
    EmptyQuestion,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Format of SQLite's `CURRENT_TIMESTAMP`, found in databases whose rows
/// were not written by this crate.
const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str =
    "SELECT id, question, answer, subject, is_bookmarked, is_understood, created_at FROM questions";

/// Durable store of question records.
pub struct QuestionStore {
    conn: Mutex<Connection>,
}

impl QuestionStore {
    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening question database at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Statements are atomic; a poisoned lock still guards a usable connection.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new question and return its id.
    ///
    /// A blank `answer` is stored as absent.
    pub fn add(&self, question: &str, answer: Option<&str>, subject: &str) -> Result<i64> {
        let question = question.trim();
        if question.is_empty() {
            return Err(StoreError::EmptyQuestion);
        }
        let answer = answer.filter(|a| !a.trim().is_empty());

        let conn = self.conn();
        conn.execute(
            "INSERT INTO questions (question, answer, subject, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![question, answer, subject.trim(), Utc::now().to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, "Added question");
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<Option<QuestionRecord>> {
        let conn = self.conn();
        let record = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// All questions in insertion order, optionally limited to one subject.
    pub fn list(&self, subject: Option<&str>) -> Result<Vec<QuestionRecord>> {
        match subject {
            Some(subject) => self.query(
                &format!("{} WHERE subject = ?1 ORDER BY id", SELECT_COLUMNS),
                params![subject],
            ),
            None => self.query(&format!("{} ORDER BY id", SELECT_COLUMNS), params![]),
        }
    }

    pub fn list_bookmarked(&self) -> Result<Vec<QuestionRecord>> {
        self.query(
            &format!("{} WHERE is_bookmarked = 1 ORDER BY id", SELECT_COLUMNS),
            params![],
        )
    }

    pub fn list_unanswered(&self) -> Result<Vec<QuestionRecord>> {
        self.query(
            &format!("{} WHERE answer IS NULL ORDER BY id", SELECT_COLUMNS),
            params![],
        )
    }

    /// Records for a study deck.
    pub fn list_deck(&self, deck: &Deck) -> Result<Vec<QuestionRecord>> {
        match deck {
            Deck::All => self.list(None),
            Deck::Subject(subject) => self.list(Some(subject)),
            Deck::Bookmarked => self.list_bookmarked(),
            Deck::Unanswered => self.list_unanswered(),
        }
    }

    /// Distinct non-empty subjects, sorted.
    pub fn subjects(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT subject FROM questions
             WHERE subject IS NOT NULL AND subject != '' ORDER BY subject",
        )?;
        let subjects = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(subjects)
    }

    // The three setters below ignore unknown ids: an update matching no row
    // is not an error.

    pub fn set_bookmark(&self, id: i64, bookmarked: bool) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE questions SET is_bookmarked = ?1 WHERE id = ?2",
            params![bookmarked, id],
        )?;
        log_unmatched("set_bookmark", id, changed);
        Ok(())
    }

    /// Mark a question understood. There is no way to clear the flag.
    pub fn set_understood(&self, id: i64) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE questions SET is_understood = 1 WHERE id = ?1",
            params![id],
        )?;
        log_unmatched("set_understood", id, changed);
        Ok(())
    }

    pub fn set_answer(&self, id: i64, answer: &str) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE questions SET answer = ?1 WHERE id = ?2",
            params![answer, id],
        )?;
        log_unmatched("set_answer", id, changed);
        Ok(())
    }

    fn query(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<QuestionRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn log_unmatched(operation: &str, id: i64, changed: usize) {
    if changed == 0 {
        debug!(id, operation, "No question with this id, update ignored");
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<QuestionRecord> {
    let created_at: String = row.get(6)?;
    let created_at = parse_timestamp(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(QuestionRecord {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        subject: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        is_bookmarked: row.get(4)?,
        is_understood: row.get(5)?,
        created_at,
    })
}

fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(timestamp) => Ok(timestamp.with_timezone(&Utc)),
        Err(e) => NaiveDateTime::parse_from_str(text, SQLITE_TIMESTAMP_FORMAT)
            .map(|timestamp| timestamp.and_utc())
            .map_err(|_| e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> QuestionStore {
        QuestionStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_add_and_get() {
        let store = store();
        let id = store.add("What is Rust?", Some("A language"), "CS").unwrap();

        let record = store.get(id).unwrap().unwrap();
        assert_eq!(record.question, "What is Rust?");
        assert_eq!(record.answer.as_deref(), Some("A language"));
        assert_eq!(record.subject, "CS");
        assert!(!record.is_bookmarked);
        assert!(!record.is_understood);
    }

    #[test]
    fn test_add_rejects_empty_question() {
        let store = store();
        assert!(matches!(store.add("", None, "CS"), Err(StoreError::EmptyQuestion)));
        assert!(matches!(store.add("   ", None, "CS"), Err(StoreError::EmptyQuestion)));
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_blank_answer_is_absent() {
        let store = store();
        let id = store.add("Q?", Some("  "), "CS").unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().answer, None);
        assert_eq!(store.list_unanswered().unwrap().len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = store();
        let mut ids: Vec<i64> = (0..20)
            .map(|i| store.add(&format!("Q{}", i), Some("A"), "Subj").unwrap())
            .collect();
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = store();
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_list_order_and_subject_filter() {
        let store = store();
        let a = store.add("A?", None, "Math").unwrap();
        let b = store.add("B?", None, "Bio").unwrap();
        let c = store.add("C?", None, "Math").unwrap();

        let all: Vec<i64> = store.list(None).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(all, vec![a, b, c]);
        assert_eq!(store.list(None).unwrap(), store.list(None).unwrap());

        let math: Vec<i64> = store.list(Some("Math")).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(math, vec![a, c]);

        assert_eq!(store.subjects().unwrap(), vec!["Bio", "Math"]);
    }

    #[test]
    fn test_bookmark_round_trip() {
        let store = store();
        let id = store.add("Q", Some("A"), "Subj").unwrap();

        store.set_bookmark(id, true).unwrap();
        assert!(store.get(id).unwrap().unwrap().is_bookmarked);
        assert_eq!(store.list_bookmarked().unwrap().len(), 1);

        store.set_bookmark(id, false).unwrap();
        assert!(!store.get(id).unwrap().unwrap().is_bookmarked);
        assert!(store.list_bookmarked().unwrap().is_empty());
    }

    #[test]
    fn test_set_understood_is_idempotent() {
        let store = store();
        let id = store.add("Q", None, "Subj").unwrap();
        store.set_understood(id).unwrap();
        store.set_understood(id).unwrap();

        let record = store.get(id).unwrap().unwrap();
        assert!(record.is_understood);
        assert!(!record.is_bookmarked);
    }

    #[test]
    fn test_set_answer_removes_from_unanswered() {
        let store = store();
        let id = store.add("Q", None, "Subj").unwrap();
        assert_eq!(store.list_unanswered().unwrap().len(), 1);

        store.set_answer(id, "Because").unwrap();
        assert!(store.list_unanswered().unwrap().is_empty());
        assert_eq!(store.get(id).unwrap().unwrap().answer.as_deref(), Some("Because"));
    }

    #[test]
    fn test_updates_on_missing_id_are_noops() {
        let store = store();
        let id = store.add("Q", None, "Subj").unwrap();

        store.set_bookmark(999, true).unwrap();
        store.set_understood(999).unwrap();
        store.set_answer(999, "x").unwrap();

        let record = store.get(id).unwrap().unwrap();
        assert!(!record.is_bookmarked);
        assert!(!record.is_understood);
        assert!(record.answer.is_none());
        assert!(store.get(999).unwrap().is_none());
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("smritify.db");

        let id = {
            let store = QuestionStore::open(&path).unwrap();
            store.add("Persisted?", Some("Yes"), "IO").unwrap()
        };

        let store = QuestionStore::open(&path).unwrap();
        let record = store.get(id).unwrap().unwrap();
        assert_eq!(record.question, "Persisted?");
        assert_eq!(store.add("Next", None, "IO").unwrap(), id + 1);
    }

    #[test]
    fn test_reads_rows_with_sqlite_default_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE questions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    question TEXT NOT NULL,
                    answer TEXT,
                    subject TEXT,
                    is_bookmarked INTEGER DEFAULT 0,
                    is_understood INTEGER DEFAULT 0,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );
                INSERT INTO questions (question, answer, subject, created_at)
                VALUES ('Old?', 'Yes', 'History', '2024-01-01 12:00:00');",
            )
            .unwrap();
        }

        let store = QuestionStore::open(&path).unwrap();
        let new_id = store.add("New?", None, "History").unwrap();

        let records = store.list(None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "Old?");
        assert_eq!(
            records[0].created_at,
            NaiveDateTime::parse_from_str("2024-01-01 12:00:00", SQLITE_TIMESTAMP_FORMAT)
                .unwrap()
                .and_utc()
        );
        assert_eq!(records[1].id, new_id);
        assert_eq!(store.list_deck(&Deck::Subject("History".to_string())).unwrap().len(), 2);
    }

    #[test]
    fn test_unparseable_timestamp_is_error() {
        let store = store();
        store
            .conn()
            .execute(
                "INSERT INTO questions (question, subject, created_at) VALUES ('Q', 'S', 'yesterday')",
                [],
            )
            .unwrap();
        assert!(matches!(store.list(None), Err(StoreError::Sqlite(_))));
    }
}
