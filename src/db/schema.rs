use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS source_texts (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id TEXT NOT NULL,
      text_content TEXT NOT NULL,
      created_at TEXT NOT NULL,
      updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flashcards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id TEXT NOT NULL,
      front TEXT NOT NULL,
      back TEXT NOT NULL,
      source TEXT NOT NULL,
      source_text_id INTEGER,
      created_at TEXT NOT NULL,
      updated_at TEXT NOT NULL,
      -- Schedule columns
      difficulty REAL NOT NULL DEFAULT 5.0,
      stability REAL NOT NULL DEFAULT 0,
      repetitions INTEGER NOT NULL DEFAULT 0,
      lapses INTEGER NOT NULL DEFAULT 0,
      state TEXT NOT NULL DEFAULT 'New',
      due_at TEXT,
      last_reviewed_at TEXT,
      FOREIGN KEY (source_text_id) REFERENCES source_texts(id)
    );

    CREATE TABLE IF NOT EXISTS review_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      flashcard_id INTEGER NOT NULL,
      user_id TEXT NOT NULL,
      rating INTEGER NOT NULL,
      reviewed_at TEXT NOT NULL,
      review_duration_secs INTEGER NOT NULL DEFAULT 0,
      state_before TEXT NOT NULL,
      state_after TEXT NOT NULL,
      stability REAL NOT NULL,
      difficulty REAL NOT NULL,
      due_at TEXT,
      FOREIGN KEY (flashcard_id) REFERENCES flashcards(id)
    );

    CREATE TABLE IF NOT EXISTS event_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id TEXT NOT NULL,
      event_type TEXT NOT NULL,
      timestamp TEXT NOT NULL,
      severity TEXT NOT NULL DEFAULT 'info',
      payload TEXT NOT NULL DEFAULT '{}'
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_flashcards_user ON flashcards(user_id);
    CREATE INDEX IF NOT EXISTS idx_flashcards_due_at ON flashcards(user_id, due_at);
    CREATE INDEX IF NOT EXISTS idx_flashcards_source_text ON flashcards(source_text_id);
    CREATE INDEX IF NOT EXISTS idx_source_texts_user ON source_texts(user_id);
    CREATE INDEX IF NOT EXISTS idx_review_logs_flashcard ON review_logs(flashcard_id);
    CREATE INDEX IF NOT EXISTS idx_event_logs_user_time ON event_logs(user_id, timestamp);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: lapse and last-review tracking on schedules
  add_column_if_missing(conn, "flashcards", "lapses", "INTEGER NOT NULL DEFAULT 0")?;
  add_column_if_missing(conn, "flashcards", "last_reviewed_at", "TEXT")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    tracing::info!("Adding column {}.{}", table, column);
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
