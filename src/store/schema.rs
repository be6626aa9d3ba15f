use rusqlite::Connection;

pub(super) fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT NOT NULL CHECK (length(trim(question)) > 0),
            answer TEXT,
            subject TEXT,
            is_bookmarked INTEGER NOT NULL DEFAULT 0,
            is_understood INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_questions_subject ON questions(subject);",
    )
}
