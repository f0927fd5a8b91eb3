use rusqlite::{Connection, Result};

/// Create all tables and indexes. Safe to run on every startup.
pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS decks (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      description TEXT,
      chat_user_id TEXT,
      chat_review_enabled INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      deck_id INTEGER NOT NULL,
      front_text TEXT NOT NULL,
      back_text TEXT NOT NULL,
      interval_days INTEGER NOT NULL DEFAULT 0 CHECK (interval_days >= 0),
      ease_factor REAL NOT NULL DEFAULT 2.5 CHECK (ease_factor >= 1.3),
      next_review_at TEXT NOT NULL,
      created_at TEXT NOT NULL,
      updated_at TEXT NOT NULL,
      FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS review_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      card_id INTEGER NOT NULL,
      outcome INTEGER NOT NULL,
      channel TEXT NOT NULL,
      interval_days INTEGER NOT NULL,
      ease_factor REAL NOT NULL,
      reviewed_at TEXT NOT NULL,
      FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_cards_deck_next_review ON cards(deck_id, next_review_at);
    CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards(next_review_at);
    CREATE INDEX IF NOT EXISTS idx_decks_chat ON decks(chat_review_enabled, chat_user_id);
    CREATE INDEX IF NOT EXISTS idx_review_logs_card_id ON review_logs(card_id);
    "#,
  )?;

  Ok(())
}
