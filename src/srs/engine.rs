//! Interval and ease factor recalculation after a review.
//!
//! A simplified SM-2 variant with fixed multipliers per rating. The same
//! function serves every review channel so web and chat reviews can never
//! drift apart.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::{CardSrsState, ReviewOutcome};

pub const MIN_EASE_FACTOR: f64 = 1.3;

const AGAIN_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;
const HARD_INTERVAL_MULTIPLIER: f64 = 1.0;
const EASY_INTERVAL_BONUS: f64 = 1.3;

/// Raised when a rating code outside the four canonical outcomes reaches the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid rating code {0}: expected 1 (Again), 2 (Hard), 3 (Good) or 4 (Easy)")]
pub struct InvalidRatingError(pub u8);

/// Compute the next scheduling state for a card.
///
/// `Again` resets the interval to 0 (review again in the same session);
/// every other rating schedules at least one day out. Pure: the result
/// depends only on the arguments.
pub fn compute_next_state(
  current_interval: u32,
  current_ease_factor: f64,
  rating: ReviewOutcome,
  now: DateTime<Utc>,
) -> CardSrsState {
  let interval = current_interval as f64;

  let (new_interval, new_ease_factor) = match rating {
    ReviewOutcome::Again => (0, (current_ease_factor - AGAIN_EASE_PENALTY).max(MIN_EASE_FACTOR)),
    ReviewOutcome::Hard => (
      grown_interval(interval * HARD_INTERVAL_MULTIPLIER),
      (current_ease_factor - HARD_EASE_PENALTY).max(MIN_EASE_FACTOR),
    ),
    ReviewOutcome::Good => (grown_interval(interval * current_ease_factor), current_ease_factor),
    ReviewOutcome::Easy => (
      grown_interval(interval * current_ease_factor * EASY_INTERVAL_BONUS),
      current_ease_factor + EASY_EASE_BONUS,
    ),
  };

  let latest = latest_review_at();
  let next_review_at = now
    .checked_add_signed(Duration::days(i64::from(new_interval)))
    .map_or(latest, |at| at.min(latest));

  CardSrsState {
    interval_days: new_interval,
    ease_factor: new_ease_factor,
    next_review_at,
  }
}

/// Same as [`compute_next_state`] for a raw rating code read from storage or the wire.
pub fn compute_next_state_for_code(
  current_interval: u32,
  current_ease_factor: f64,
  rating_code: u8,
  now: DateTime<Utc>,
) -> Result<CardSrsState, InvalidRatingError> {
  let rating = ReviewOutcome::try_from(rating_code)?;
  Ok(compute_next_state(current_interval, current_ease_factor, rating, now))
}

/// Latest due date that still has a four-digit year, which RFC 3339 storage requires.
fn latest_review_at() -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
    .single()
    .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Round half away from zero, then clamp to at least one day.
fn grown_interval(product: f64) -> u32 {
  // `as` saturates, so huge products land on u32::MAX instead of wrapping
  (product.round() as u32).max(1)
}
