//! Periodic poll that queues due cards for chat review.
//!
//! Every cycle reads due cards from chat-enabled decks and appends them to
//! the owning user's queue in presentation order. Cards already queued or
//! in flight are skipped, so repeated cycles never duplicate work.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::db::{self, DbLockError, DueChatReview};
use crate::session::ChatSessions;
use crate::srs;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  #[error(transparent)]
  Lock(#[from] DbLockError),
  #[error("database error: {0}")]
  Sql(#[from] rusqlite::Error),
}

/// Run one dispatch cycle. Returns the number of newly queued cards.
pub fn dispatch_due_reviews(
  pool: &db::DbPool,
  sessions: &ChatSessions,
  now: DateTime<Utc>,
) -> Result<usize, DispatchError> {
  // Snapshot under the lock, queue after releasing it
  let due = {
    let conn = db::try_lock(pool)?;
    db::get_due_chat_reviews(&conn, now)?
  };

  if due.is_empty() {
    tracing::debug!("No due chat reviews found");
    return Ok(0);
  }

  let mut queued = 0;
  for (chat_user_id, candidates) in group_by_user(due) {
    for card_id in srs::due_order(&candidates, now) {
      if sessions.enqueue(&chat_user_id, card_id) {
        queued += 1;
      }
    }
  }

  tracing::info!(queued, "Queued due chat reviews");
  Ok(queued)
}

fn group_by_user(due: Vec<DueChatReview>) -> BTreeMap<String, Vec<srs::DueCandidate>> {
  let mut by_user: BTreeMap<String, Vec<srs::DueCandidate>> = BTreeMap::new();
  for review in due {
    by_user.entry(review.chat_user_id).or_default().push(review.candidate);
  }
  by_user
}

/// Poll forever at `interval`. Spawn this on the runtime.
pub async fn run_dispatcher(state: AppState, interval: Duration) {
  tracing::info!("Chat review dispatcher running every {}s", interval.as_secs());
  let mut ticker = tokio::time::interval(interval);
  ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

  loop {
    ticker.tick().await;
    if let Err(e) = dispatch_due_reviews(&state.db, &state.sessions, Utc::now()) {
      tracing::error!("Chat review dispatch failed: {}", e);
    }
    let pruned = state.sessions.prune_idle();
    if pruned > 0 {
      tracing::debug!(pruned, "Pruned idle chat sessions");
    }
  }
}
