use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config;

/// Scheduling state of a single card.
///
/// `interval_days` is unsigned so a negative interval cannot be stored.
/// The ease factor floor is enforced by the engine on every branch that
/// lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSrsState {
  pub interval_days: u32,
  pub ease_factor: f64,
  pub next_review_at: DateTime<Utc>,
}

impl CardSrsState {
  /// State of a freshly authored card: due immediately.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      interval_days: config::DEFAULT_INTERVAL_DAYS,
      ease_factor: config::DEFAULT_EASE_FACTOR,
      next_review_at: now,
    }
  }

  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review_at <= now
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  pub id: i64,
  pub deck_id: i64,
  pub front_text: String,
  pub back_text: String,
  #[serde(flatten)]
  pub srs: CardSrsState,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Card {
  pub fn new(deck_id: i64, front_text: String, back_text: String, now: DateTime<Utc>) -> Self {
    Self {
      id: 0,
      deck_id,
      front_text,
      back_text,
      srs: CardSrsState::new(now),
      created_at: now,
      updated_at: now,
    }
  }
}

/// A named collection of cards.
///
/// Decks with `chat_review_enabled` and a `chat_user_id` have their due
/// cards queued for review over the chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub chat_user_id: Option<String>,
  pub chat_review_enabled: bool,
  pub created_at: DateTime<Utc>,
}
