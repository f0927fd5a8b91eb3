//! Deck CRUD and chat-review settings

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::{format_timestamp, parse_timestamp};
use crate::domain::Deck;

pub fn insert_deck(
  conn: &Connection,
  name: &str,
  description: Option<&str>,
  now: DateTime<Utc>,
) -> Result<i64> {
  conn.execute(
    "INSERT INTO decks (name, description, created_at) VALUES (?1, ?2, ?3)",
    params![name, description, format_timestamp(now)],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn get_deck(conn: &Connection, id: i64) -> Result<Option<Deck>> {
  conn
    .query_row(
      r#"
    SELECT id, name, description, chat_user_id, chat_review_enabled, created_at
    FROM decks WHERE id = ?1
    "#,
      params![id],
      row_to_deck,
    )
    .optional()
}

pub fn list_decks(conn: &Connection) -> Result<Vec<Deck>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, name, description, chat_user_id, chat_review_enabled, created_at
    FROM decks ORDER BY id ASC
    "#,
  )?;
  let decks = stmt
    .query_map([], row_to_deck)?
    .collect::<Result<Vec<_>>>()?;
  Ok(decks)
}

/// Rename a deck and/or change its description; `None` keeps the current value.
/// Returns false if the deck doesn't exist.
pub fn update_deck(
  conn: &Connection,
  deck_id: i64,
  name: Option<&str>,
  description: Option<&str>,
) -> Result<bool> {
  let updated = conn.execute(
    r#"
    UPDATE decks
    SET name = COALESCE(?1, name), description = COALESCE(?2, description)
    WHERE id = ?3
    "#,
    params![name, description, deck_id],
  )?;
  Ok(updated > 0)
}

/// Delete a deck with its cards and their review logs. Returns false if the deck doesn't exist.
pub fn delete_deck(conn: &Connection, deck_id: i64) -> Result<bool> {
  let deleted = conn.execute("DELETE FROM decks WHERE id = ?1", params![deck_id])?;
  Ok(deleted > 0)
}

/// Link a deck to a chat user and toggle chat review. Returns false if the deck doesn't exist.
pub fn update_chat_settings(
  conn: &Connection,
  deck_id: i64,
  chat_user_id: Option<&str>,
  enabled: bool,
) -> Result<bool> {
  let updated = conn.execute(
    "UPDATE decks SET chat_user_id = ?1, chat_review_enabled = ?2 WHERE id = ?3",
    params![chat_user_id, enabled, deck_id],
  )?;
  Ok(updated > 0)
}

fn row_to_deck(row: &Row) -> Result<Deck> {
  let created_at: String = row.get(5)?;
  Ok(Deck {
    id: row.get(0)?,
    name: row.get(1)?,
    description: row.get(2)?,
    chat_user_id: row.get(3)?,
    chat_review_enabled: row.get(4)?,
    created_at: parse_timestamp(5, &created_at)?,
  })
}
