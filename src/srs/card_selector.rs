//! Deterministic due-card selection.
//!
//! The earliest scheduled card is shown first; equal timestamps fall back to
//! the lowest card id. No randomness, so repeated calls on the same snapshot
//! always agree.

use chrono::{DateTime, Utc};

/// The part of a card that selection looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueCandidate {
  pub card_id: i64,
  pub next_review_at: DateTime<Utc>,
}

/// Pick the card to present next, or `None` when nothing is due.
pub fn select_next(candidates: &[DueCandidate], now: DateTime<Utc>) -> Option<i64> {
  candidates
    .iter()
    .filter(|c| c.next_review_at <= now)
    .min_by_key(|c| (c.next_review_at, c.card_id))
    .map(|c| c.card_id)
}

/// All due card ids in presentation order.
pub fn due_order(candidates: &[DueCandidate], now: DateTime<Utc>) -> Vec<i64> {
  let mut due: Vec<_> = candidates.iter().filter(|c| c.next_review_at <= now).collect();
  due.sort_by_key(|c| (c.next_review_at, c.card_id));
  due.into_iter().map(|c| c.card_id).collect()
}
