pub mod decks;
pub mod internal;
pub mod study;

use axum::{
  routing::{get, post, put},
  Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
  pub message: String,
}

impl MessageResponse {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

pub async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

/// Build the full API router
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/api/health", get(health))
    // Web channel
    .route("/api/decks", get(decks::list_decks).post(decks::create_deck))
    .route(
      "/api/decks/{deck_id}",
      get(decks::get_deck).put(decks::update_deck).delete(decks::delete_deck),
    )
    .route("/api/decks/{deck_id}/chat", put(decks::update_chat_settings))
    .route("/api/decks/{deck_id}/cards", post(decks::create_card))
    .route("/api/cards/{card_id}", put(decks::update_card).delete(decks::delete_card))
    .route("/api/cards/{card_id}/reviews", get(decks::card_reviews))
    .route("/api/study/{deck_id}/next", get(study::next_card))
    .route("/api/study/review", post(study::submit_review))
    // Bot channel
    .route("/api/internal/cards/{card_id}", get(internal::internal_card))
    .route("/api/reviews/chat", post(internal::chat_review))
    .route("/api/internal/prompts/{chat_user_id}/next", get(internal::next_prompt))
    .route("/api/internal/prompts/{chat_user_id}/answer", post(internal::answer_prompt))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
