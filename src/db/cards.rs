//! Card CRUD and due-candidate queries

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::{format_timestamp, parse_timestamp};
use crate::domain::{Card, CardSrsState};
use crate::srs::DueCandidate;

const CARD_COLUMNS: &str = r#"
  id, deck_id, front_text, back_text, interval_days, ease_factor, next_review_at,
  created_at, updated_at
"#;

pub fn insert_card(conn: &Connection, card: &Card) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO cards (deck_id, front_text, back_text, interval_days, ease_factor, next_review_at,
                       created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
    params![
      card.deck_id,
      card.front_text,
      card.back_text,
      card.srs.interval_days,
      card.srs.ease_factor,
      format_timestamp(card.srs.next_review_at),
      format_timestamp(card.created_at),
      format_timestamp(card.updated_at),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn get_card_by_id(conn: &Connection, id: i64) -> Result<Option<Card>> {
  conn
    .query_row(
      &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
      params![id],
      row_to_card,
    )
    .optional()
}

pub fn get_cards_for_deck(conn: &Connection, deck_id: i64) -> Result<Vec<Card>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM cards WHERE deck_id = ?1 ORDER BY id ASC",
    CARD_COLUMNS
  ))?;
  let cards = stmt
    .query_map(params![deck_id], row_to_card)?
    .collect::<Result<Vec<_>>>()?;
  Ok(cards)
}

/// Due cards of one deck, as input for the selection policy
pub fn get_due_candidates(
  conn: &Connection,
  deck_id: i64,
  now: DateTime<Utc>,
) -> Result<Vec<DueCandidate>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, next_review_at
    FROM cards
    WHERE deck_id = ?1 AND next_review_at <= ?2
    "#,
  )?;
  let candidates = stmt
    .query_map(params![deck_id, format_timestamp(now)], row_to_candidate)?
    .collect::<Result<Vec<_>>>()?;
  Ok(candidates)
}

/// A due card belonging to a deck that is enabled for chat review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueChatReview {
  pub chat_user_id: String,
  pub candidate: DueCandidate,
}

/// Due cards across all chat-enabled decks that are linked to a chat user
pub fn get_due_chat_reviews(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<DueChatReview>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT d.chat_user_id, c.id, c.next_review_at
    FROM cards c
    JOIN decks d ON c.deck_id = d.id
    WHERE c.next_review_at <= ?1
      AND d.chat_review_enabled = 1
      AND d.chat_user_id IS NOT NULL
    "#,
  )?;
  let reviews = stmt
    .query_map(params![format_timestamp(now)], |row| {
      let next_review_at: String = row.get(2)?;
      Ok(DueChatReview {
        chat_user_id: row.get(0)?,
        candidate: DueCandidate {
          card_id: row.get(1)?,
          next_review_at: parse_timestamp(2, &next_review_at)?,
        },
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(reviews)
}

/// Persist a new scheduling state. Returns false if the card doesn't exist.
pub fn update_card_srs(
  conn: &Connection,
  card_id: i64,
  state: &CardSrsState,
  now: DateTime<Utc>,
) -> Result<bool> {
  let updated = conn.execute(
    r#"
    UPDATE cards
    SET interval_days = ?1, ease_factor = ?2, next_review_at = ?3, updated_at = ?4
    WHERE id = ?5
    "#,
    params![
      state.interval_days,
      state.ease_factor,
      format_timestamp(state.next_review_at),
      format_timestamp(now),
      card_id,
    ],
  )?;
  Ok(updated > 0)
}

/// Replace a card's front and/or back text; `None` keeps the current value.
/// Scheduling state is untouched. Returns false if the card doesn't exist.
pub fn update_card_text(
  conn: &Connection,
  card_id: i64,
  front_text: Option<&str>,
  back_text: Option<&str>,
  now: DateTime<Utc>,
) -> Result<bool> {
  let updated = conn.execute(
    r#"
    UPDATE cards
    SET front_text = COALESCE(?1, front_text), back_text = COALESCE(?2, back_text), updated_at = ?3
    WHERE id = ?4
    "#,
    params![front_text, back_text, format_timestamp(now), card_id],
  )?;
  Ok(updated > 0)
}

/// Delete a card and its review log. Returns false if the card doesn't exist.
pub fn delete_card(conn: &Connection, card_id: i64) -> Result<bool> {
  let deleted = conn.execute("DELETE FROM cards WHERE id = ?1", params![card_id])?;
  Ok(deleted > 0)
}

/// Name of the deck a card belongs to
pub fn get_card_deck_name(conn: &Connection, card_id: i64) -> Result<Option<String>> {
  conn
    .query_row(
      "SELECT d.name FROM cards c JOIN decks d ON c.deck_id = d.id WHERE c.id = ?1",
      params![card_id],
      |row| row.get(0),
    )
    .optional()
}

fn row_to_candidate(row: &Row) -> Result<DueCandidate> {
  let next_review_at: String = row.get(1)?;
  Ok(DueCandidate {
    card_id: row.get(0)?,
    next_review_at: parse_timestamp(1, &next_review_at)?,
  })
}

pub(crate) fn row_to_card(row: &Row) -> Result<Card> {
  let next_review_at: String = row.get(6)?;
  let created_at: String = row.get(7)?;
  let updated_at: String = row.get(8)?;

  Ok(Card {
    id: row.get(0)?,
    deck_id: row.get(1)?,
    front_text: row.get(2)?,
    back_text: row.get(3)?,
    srs: CardSrsState {
      interval_days: row.get(4)?,
      ease_factor: row.get(5)?,
      next_review_at: parse_timestamp(6, &next_review_at)?,
    },
    created_at: parse_timestamp(7, &created_at)?,
    updated_at: parse_timestamp(8, &updated_at)?,
  })
}
