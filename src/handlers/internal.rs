//! Bot-to-backend endpoints, all guarded by [`BotAuth`].
//!
//! The bot either grades replies itself and reports `correct`/`incorrect`,
//! or pulls prompts from the user's queue and posts the raw reply text back
//! for grading here.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::auth::BotAuth;
use crate::db::{self, LogOnError};
use crate::domain::{ReviewChannel, ReviewEvent};
use crate::response::AppError;
use crate::srs::{self, ChannelResult};
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckName {
  pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalCard {
  pub front_text: String,
  pub back_text: String,
  pub deck: DeckName,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReviewRequest {
  pub card_id: i64,
  /// "correct" or "incorrect"
  pub outcome: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
  pub card_id: i64,
  pub front_text: String,
  pub deck_name: String,
  pub asked_at: DateTime<Utc>,
  /// Cards still waiting behind this one
  pub remaining: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
  pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
  pub card_id: i64,
  pub correct: bool,
  pub similarity: f64,
  pub expected_answer: String,
  pub interval_days: u32,
  pub next_review_at: DateTime<Utc>,
}

/// GET /api/internal/cards/{card_id}
pub async fn internal_card(
  _bot: BotAuth,
  State(state): State<AppState>,
  Path(card_id): Path<i64>,
) -> Result<Json<InternalCard>, AppError> {
  let conn = db::try_lock(&state.db)?;
  let card = db::get_card_by_id(&conn, card_id)?.ok_or_else(|| AppError::not_found("Card not found"))?;
  let deck_name = db::get_card_deck_name(&conn, card_id)
    .log_warn("Failed to look up deck name")
    .flatten()
    .unwrap_or_default();

  Ok(Json(InternalCard {
    front_text: card.front_text,
    back_text: card.back_text,
    deck: DeckName { name: deck_name },
  }))
}

/// POST /api/reviews/chat
pub async fn chat_review(
  _bot: BotAuth,
  State(state): State<AppState>,
  Json(request): Json<ChatReviewRequest>,
) -> Result<Json<MessageResponse>, AppError> {
  let outcome = srs::normalize(ChannelResult::ChatOutcome(&request.outcome))
    .map_err(|_| AppError::validation("Invalid outcome. Must be \"correct\" or \"incorrect\""))?;
  let event = ReviewEvent {
    card_id: request.card_id,
    outcome,
    channel: ReviewChannel::Chat,
  };

  let mut conn = db::try_lock(&state.db)?;
  db::apply_review(&mut conn, event, Utc::now()).map_err(|e| {
    if matches!(e, db::ReviewError::CardNotFound(_)) {
      tracing::warn!(card_id = request.card_id, "Chat review submitted for missing card");
    }
    AppError::from(e)
  })?;

  Ok(Json(MessageResponse::new("Chat review recorded")))
}

/// GET /api/internal/prompts/{chat_user_id}/next
///
/// Returns the in-flight prompt again if it hasn't been answered. Queued
/// cards that were deleted or reviewed elsewhere since queueing are dropped.
pub async fn next_prompt(
  _bot: BotAuth,
  State(state): State<AppState>,
  Path(chat_user_id): Path<String>,
) -> Result<Json<Option<Prompt>>, AppError> {
  let conn = db::try_lock(&state.db)?;

  loop {
    let now = Utc::now();
    let resumed = state.sessions.in_flight(&chat_user_id);
    let Some(pending) = resumed.or_else(|| state.sessions.next_prompt(&chat_user_id, now)) else {
      return Ok(Json(None));
    };

    match db::get_card_by_id(&conn, pending.card_id)? {
      // A prompt already shown stays valid until answered
      Some(card) if resumed.is_some() || card.srs.is_due(now) => {
        let deck_name = db::get_card_deck_name(&conn, card.id)
          .log_warn("Failed to look up deck name")
          .flatten()
          .unwrap_or_default();
        return Ok(Json(Some(Prompt {
          card_id: card.id,
          front_text: card.front_text,
          deck_name,
          asked_at: pending.asked_at,
          remaining: state.sessions.queue_len(&chat_user_id),
        })));
      }
      _ => {
        tracing::debug!(card_id = pending.card_id, "Dropping stale chat prompt");
        state.sessions.complete(&chat_user_id, pending.card_id);
      }
    }
  }
}

/// POST /api/internal/prompts/{chat_user_id}/answer
///
/// The in-flight prompt is claimed before grading, so a reply delivered twice
/// moves the card's schedule once and the duplicate gets a 404.
pub async fn answer_prompt(
  _bot: BotAuth,
  State(state): State<AppState>,
  Path(chat_user_id): Path<String>,
  Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
  let pending = state
    .sessions
    .take_in_flight(&chat_user_id)
    .ok_or_else(|| AppError::not_found("No prompt awaiting an answer"))?;

  match record_answer(&state, pending.card_id, &request.answer) {
    Ok(response) => Ok(Json(response)),
    Err(e) => {
      // A deleted card can never be answered; other failures keep the prompt open
      if e.status() != StatusCode::NOT_FOUND {
        state.sessions.restore_in_flight(&chat_user_id, pending);
      }
      Err(e)
    }
  }
}

fn record_answer(state: &AppState, card_id: i64, answer: &str) -> Result<AnswerResponse, AppError> {
  let mut conn = db::try_lock(&state.db)?;
  let card = db::get_card_by_id(&conn, card_id)?
    .ok_or_else(|| AppError::not_found("Card not found (may have been deleted)"))?;

  let graded = validation::grade_answer(answer, &card.back_text);
  let outcome = srs::normalize(ChannelResult::Chat {
    is_correct: graded.correct,
  })?;

  let event = ReviewEvent {
    card_id: card.id,
    outcome,
    channel: ReviewChannel::Chat,
  };
  let new_state = db::apply_review(&mut conn, event, Utc::now())?;

  tracing::debug!(
    card_id = card.id,
    correct = graded.correct,
    similarity = graded.similarity,
    "Graded chat answer"
  );

  Ok(AnswerResponse {
    card_id: card.id,
    correct: graded.correct,
    similarity: graded.similarity,
    expected_answer: card.back_text,
    interval_days: new_state.interval_days,
    next_review_at: new_state.next_review_at,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::domain::Card;
  use std::time::Duration;

  const USER: &str = "user-1";

  /// State with one due card already asked to `USER`
  fn state_with_prompt() -> (AppState, i64) {
    let pool = db::init_memory_db().unwrap();
    let card_id = {
      let conn = db::try_lock(&pool).unwrap();
      let deck_id = db::insert_deck(&conn, "Capitals", None, Utc::now()).unwrap();
      let card = Card::new(deck_id, "Capital of France?".into(), "Paris".into(), Utc::now());
      db::insert_card(&conn, &card).unwrap()
    };
    let state = AppState::new(pool, AppConfig::default());
    state.sessions.enqueue(USER, card_id);
    state.sessions.next_prompt(USER, Utc::now()).unwrap();
    (state, card_id)
  }

  async fn answer(state: AppState, text: &'static str) -> Result<Json<AnswerResponse>, AppError> {
    answer_prompt(
      BotAuth,
      State(state),
      Path(USER.to_string()),
      Json(AnswerRequest {
        answer: text.to_string(),
      }),
    )
    .await
  }

  #[tokio::test]
  async fn test_answer_applies_review_and_clears_prompt() {
    let (state, card_id) = state_with_prompt();
    let Json(graded) = answer(state.clone(), "pariss").await.unwrap();
    assert!(graded.correct);
    assert_eq!(graded.card_id, card_id);
    assert_eq!(graded.similarity, 5.0 / 6.0);
    assert_eq!(graded.interval_days, 1);
    assert!(state.sessions.in_flight(USER).is_none());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_duplicate_answer_is_applied_once() {
    let (state, card_id) = state_with_prompt();

    // Hold the database so both deliveries are in progress at the same time
    let guard = db::try_lock(&state.db).unwrap();
    let first = tokio::spawn(answer(state.clone(), "paris"));
    let second = tokio::spawn(answer(state.clone(), "paris"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(guard);

    let results = [first.await.unwrap(), second.await.unwrap()];
    let accepted: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].interval_days, 1);
    let rejected = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(rejected.status(), StatusCode::NOT_FOUND);

    let conn = db::try_lock(&state.db).unwrap();
    assert_eq!(db::get_review_history(&conn, card_id).unwrap().len(), 1);
    let card = db::get_card_by_id(&conn, card_id).unwrap().unwrap();
    assert_eq!(card.srs.interval_days, 1);
  }

  #[tokio::test]
  async fn test_answer_for_deleted_card_drops_prompt() {
    let (state, card_id) = state_with_prompt();
    {
      let conn = db::try_lock(&state.db).unwrap();
      assert!(db::delete_card(&conn, card_id).unwrap());
    }

    let err = answer(state.clone(), "Paris").await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert!(state.sessions.in_flight(USER).is_none());
  }
}
