//! Web study session: fetch the next due card and submit a rating.

use axum::{
  extract::{Path, State},
  Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::domain::{CardSrsState, ReviewChannel, ReviewEvent, ReviewOutcome};
use crate::response::AppError;
use crate::srs::{self, ChannelResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyCard {
  pub id: i64,
  pub front_text: String,
  pub back_text: String,
}

/// Rating as sent by the web client: a button label, or its numeric code
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
  Label(String),
  Code(u8),
}

impl RatingInput {
  fn to_outcome(&self) -> Result<ReviewOutcome, AppError> {
    match self {
      Self::Label(label) => Ok(srs::normalize(ChannelResult::Web(label))?),
      Self::Code(code) => Ok(ReviewOutcome::try_from(*code)?),
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
  pub card_id: i64,
  pub rating: RatingInput,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
  pub card_id: i64,
  pub rating: ReviewOutcome,
  #[serde(flatten)]
  pub state: CardSrsState,
}

/// GET /api/study/{deck_id}/next
///
/// Responds with `null` when nothing in the deck is due.
pub async fn next_card(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> Result<Json<Option<StudyCard>>, AppError> {
  let now = Utc::now();
  let conn = db::try_lock(&state.db)?;
  if db::get_deck(&conn, deck_id)?.is_none() {
    return Err(AppError::not_found("Deck not found"));
  }

  let candidates = db::get_due_candidates(&conn, deck_id, now)?;
  let Some(card_id) = srs::select_next(&candidates, now) else {
    return Ok(Json(None));
  };

  let card = db::get_card_by_id(&conn, card_id)?.ok_or_else(|| AppError::not_found("Card not found"))?;
  Ok(Json(Some(StudyCard {
    id: card.id,
    front_text: card.front_text,
    back_text: card.back_text,
  })))
}

/// POST /api/study/review
pub async fn submit_review(
  State(state): State<AppState>,
  Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
  let outcome = request.rating.to_outcome()?;
  let event = ReviewEvent {
    card_id: request.card_id,
    outcome,
    channel: ReviewChannel::Web,
  };

  let mut conn = db::try_lock(&state.db)?;
  let new_state = db::apply_review(&mut conn, event, Utc::now())?;

  Ok(Json(ReviewResponse {
    card_id: request.card_id,
    rating: outcome,
    state: new_state,
  }))
}
