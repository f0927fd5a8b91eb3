//! Atomic review transitions and the review log

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result, TransactionBehavior};

use super::cards::{get_card_by_id, update_card_srs};
use super::{format_timestamp, parse_timestamp};
use crate::domain::{CardSrsState, ReviewChannel, ReviewEvent, ReviewLogEntry, ReviewOutcome};
use crate::srs;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
  #[error("card {0} not found")]
  CardNotFound(i64),
  #[error("database error: {0}")]
  Sql(#[from] rusqlite::Error),
}

/// Apply one review to a card and return its new scheduling state.
///
/// Read, recompute and write happen inside one IMMEDIATE transaction, so a
/// second review of the same card waits for this one to commit instead of
/// overwriting it with a result computed from stale state.
pub fn apply_review(
  conn: &mut Connection,
  event: ReviewEvent,
  now: DateTime<Utc>,
) -> std::result::Result<CardSrsState, ReviewError> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let card = get_card_by_id(&tx, event.card_id)?.ok_or(ReviewError::CardNotFound(event.card_id))?;
  let next = srs::compute_next_state(card.srs.interval_days, card.srs.ease_factor, event.outcome, now);

  if !update_card_srs(&tx, card.id, &next, now)? {
    return Err(ReviewError::CardNotFound(card.id));
  }
  insert_review_log(&tx, event, &next, now)?;
  tx.commit()?;

  tracing::debug!(
    card_id = event.card_id,
    outcome = event.outcome.as_str(),
    channel = event.channel.as_str(),
    interval_days = next.interval_days,
    ease_factor = next.ease_factor,
    "Review applied"
  );

  Ok(next)
}

pub fn insert_review_log(
  conn: &Connection,
  event: ReviewEvent,
  state: &CardSrsState,
  reviewed_at: DateTime<Utc>,
) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO review_logs (card_id, outcome, channel, interval_days, ease_factor, reviewed_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
    params![
      event.card_id,
      event.outcome.code(),
      event.channel.as_str(),
      state.interval_days,
      state.ease_factor,
      format_timestamp(reviewed_at),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Review history of a card, oldest first
pub fn get_review_history(conn: &Connection, card_id: i64) -> Result<Vec<ReviewLogEntry>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, card_id, outcome, channel, interval_days, ease_factor, reviewed_at
    FROM review_logs
    WHERE card_id = ?1
    ORDER BY reviewed_at ASC, id ASC
    "#,
  )?;

  let entries = stmt
    .query_map(params![card_id], |row| {
      let code: u8 = row.get(2)?;
      let outcome = ReviewOutcome::try_from(code).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
      })?;
      let channel_str: String = row.get(3)?;
      let channel = ReviewChannel::from_str(&channel_str).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(3, channel_str.clone(), rusqlite::types::Type::Text)
      })?;
      let reviewed_at: String = row.get(6)?;

      Ok(ReviewLogEntry {
        id: row.get(0)?,
        card_id: row.get(1)?,
        outcome,
        channel,
        interval_days: row.get(4)?,
        ease_factor: row.get(5)?,
        reviewed_at: parse_timestamp(6, &reviewed_at)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;

  Ok(entries)
}
