//! Deck and card management for the web client.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::db;
use crate::domain::{Card, Deck, ReviewLogEntry};
use crate::response::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDeckRequest {
  pub name: String,
  pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeckWithCards {
  #[serde(flatten)]
  pub deck: Deck,
  pub cards: Vec<Card>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeckRequest {
  pub name: Option<String>,
  pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettingsRequest {
  pub chat_user_id: Option<String>,
  pub chat_review_enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
  pub front_text: String,
  pub back_text: String,
}

/// POST /api/decks
pub async fn create_deck(
  State(state): State<AppState>,
  Json(request): Json<CreateDeckRequest>,
) -> Result<(StatusCode, Json<Deck>), AppError> {
  let name = request.name.trim();
  if name.is_empty() {
    return Err(AppError::validation("Deck name is required"));
  }
  let description = request
    .description
    .as_deref()
    .map(str::trim)
    .filter(|d| !d.is_empty());

  let conn = db::try_lock(&state.db)?;
  let id = db::insert_deck(&conn, name, description, Utc::now())?;
  let deck = db::get_deck(&conn, id)?.ok_or_else(|| AppError::internal("deck vanished after insert"))?;

  tracing::info!(deck_id = id, "Created deck");
  Ok((StatusCode::CREATED, Json(deck)))
}

/// GET /api/decks
pub async fn list_decks(State(state): State<AppState>) -> Result<Json<Vec<Deck>>, AppError> {
  let conn = db::try_lock(&state.db)?;
  Ok(Json(db::list_decks(&conn)?))
}

/// GET /api/decks/{deck_id}
pub async fn get_deck(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> Result<Json<DeckWithCards>, AppError> {
  let conn = db::try_lock(&state.db)?;
  let deck = db::get_deck(&conn, deck_id)?.ok_or_else(|| AppError::not_found("Deck not found"))?;
  let cards = db::get_cards_for_deck(&conn, deck_id)?;
  Ok(Json(DeckWithCards { deck, cards }))
}

/// PUT /api/decks/{deck_id}
pub async fn update_deck(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  Json(request): Json<UpdateDeckRequest>,
) -> Result<Json<Deck>, AppError> {
  if request.name.is_none() && request.description.is_none() {
    return Err(AppError::validation(
      "No update fields provided (name or description)",
    ));
  }
  let name = request.name.as_deref().map(str::trim);
  if name.is_some_and(str::is_empty) {
    return Err(AppError::validation("Deck name cannot be empty"));
  }
  let description = request.description.as_deref().map(str::trim);

  let conn = db::try_lock(&state.db)?;
  if !db::update_deck(&conn, deck_id, name, description)? {
    return Err(AppError::not_found("Deck not found"));
  }
  let deck = db::get_deck(&conn, deck_id)?.ok_or_else(|| AppError::not_found("Deck not found"))?;
  Ok(Json(deck))
}

/// DELETE /api/decks/{deck_id}
///
/// Cards go with the deck. Chat prompts already queued for them are dropped
/// when the bot next asks.
pub async fn delete_deck(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
  let conn = db::try_lock(&state.db)?;
  if !db::delete_deck(&conn, deck_id)? {
    return Err(AppError::not_found("Deck not found"));
  }
  tracing::info!(deck_id, "Deleted deck");
  Ok(Json(MessageResponse::new("Deck deleted successfully")))
}

/// PUT /api/decks/{deck_id}/chat
pub async fn update_chat_settings(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  Json(request): Json<ChatSettingsRequest>,
) -> Result<Json<Deck>, AppError> {
  let chat_user_id = request
    .chat_user_id
    .as_deref()
    .map(str::trim)
    .filter(|id| !id.is_empty());
  if request.chat_review_enabled && chat_user_id.is_none() {
    return Err(AppError::validation(
      "chatUserId is required to enable chat review",
    ));
  }

  let conn = db::try_lock(&state.db)?;
  if !db::update_chat_settings(&conn, deck_id, chat_user_id, request.chat_review_enabled)? {
    return Err(AppError::not_found("Deck not found"));
  }
  let deck = db::get_deck(&conn, deck_id)?.ok_or_else(|| AppError::not_found("Deck not found"))?;
  Ok(Json(deck))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
  pub front_text: Option<String>,
  pub back_text: Option<String>,
}

/// POST /api/decks/{deck_id}/cards
pub async fn create_card(
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), AppError> {
  let front = request.front_text.trim();
  let back = request.back_text.trim();
  if front.is_empty() || back.is_empty() {
    return Err(AppError::validation("Front and back text are required"));
  }

  let conn = db::try_lock(&state.db)?;
  if db::get_deck(&conn, deck_id)?.is_none() {
    return Err(AppError::not_found("Deck not found"));
  }

  let card = Card::new(deck_id, front.to_string(), back.to_string(), Utc::now());
  let id = db::insert_card(&conn, &card)?;
  let card = db::get_card_by_id(&conn, id)?.ok_or_else(|| AppError::internal("card vanished after insert"))?;

  tracing::debug!(deck_id, card_id = id, "Created card");
  Ok((StatusCode::CREATED, Json(card)))
}

/// PUT /api/cards/{card_id}
pub async fn update_card(
  State(state): State<AppState>,
  Path(card_id): Path<i64>,
  Json(request): Json<UpdateCardRequest>,
) -> Result<Json<Card>, AppError> {
  let front = request.front_text.as_deref().map(str::trim);
  let back = request.back_text.as_deref().map(str::trim);
  if front.is_none() && back.is_none() {
    return Err(AppError::validation(
      "No update fields provided (frontText or backText)",
    ));
  }
  if front.is_some_and(str::is_empty) || back.is_some_and(str::is_empty) {
    return Err(AppError::validation("Card text cannot be empty"));
  }

  let conn = db::try_lock(&state.db)?;
  if !db::update_card_text(&conn, card_id, front, back, Utc::now())? {
    return Err(AppError::not_found("Card not found"));
  }
  let card = db::get_card_by_id(&conn, card_id)?.ok_or_else(|| AppError::not_found("Card not found"))?;
  Ok(Json(card))
}

/// DELETE /api/cards/{card_id}
pub async fn delete_card(
  State(state): State<AppState>,
  Path(card_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
  let conn = db::try_lock(&state.db)?;
  if !db::delete_card(&conn, card_id)? {
    return Err(AppError::not_found("Card not found"));
  }
  tracing::debug!(card_id, "Deleted card");
  Ok(Json(MessageResponse::new("Card deleted successfully")))
}

/// GET /api/cards/{card_id}/reviews
pub async fn card_reviews(
  State(state): State<AppState>,
  Path(card_id): Path<i64>,
) -> Result<Json<Vec<ReviewLogEntry>>, AppError> {
  let conn = db::try_lock(&state.db)?;
  if db::get_card_by_id(&conn, card_id)?.is_none() {
    return Err(AppError::not_found("Card not found"));
  }
  Ok(Json(db::get_review_history(&conn, card_id)?))
}
