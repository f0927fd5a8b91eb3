use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::srs::InvalidRatingError;

/// Canonical recall rating consumed by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewOutcome {
  Again = 1,
  Hard = 2,
  Good = 3,
  Easy = 4,
}

impl ReviewOutcome {
  pub const ALL: [ReviewOutcome; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Again => "Again",
      Self::Hard => "Hard",
      Self::Good => "Good",
      Self::Easy => "Easy",
    }
  }

  /// Case-sensitive: labels come from a fixed set of UI buttons.
  pub fn from_label(s: &str) -> Option<Self> {
    match s {
      "Again" => Some(Self::Again),
      "Hard" => Some(Self::Hard),
      "Good" => Some(Self::Good),
      "Easy" => Some(Self::Easy),
      _ => None,
    }
  }

  /// Stable numeric code stored in the review log
  pub fn code(&self) -> u8 {
    *self as u8
  }
}

impl TryFrom<u8> for ReviewOutcome {
  type Error = InvalidRatingError;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      1 => Ok(Self::Again),
      2 => Ok(Self::Hard),
      3 => Ok(Self::Good),
      4 => Ok(Self::Easy),
      other => Err(InvalidRatingError(other)),
    }
  }
}

/// Channel a review arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewChannel {
  Web,
  Chat,
}

impl ReviewChannel {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Web => "web",
      Self::Chat => "chat",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "web" => Some(Self::Web),
      "chat" => Some(Self::Chat),
      _ => None,
    }
  }
}

/// One answered card, the unit of work the scheduler consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewEvent {
  pub card_id: i64,
  pub outcome: ReviewOutcome,
  pub channel: ReviewChannel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
  pub id: i64,
  pub card_id: i64,
  pub outcome: ReviewOutcome,
  pub channel: ReviewChannel,
  pub interval_days: u32,
  pub ease_factor: f64,
  pub reviewed_at: DateTime<Utc>,
}
