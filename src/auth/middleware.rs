//! Bot authentication extractor.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::config::BOT_API_KEY_HEADER;
use crate::response::AppError;
use crate::state::AppState;

/// Proof that the request came from the chat bot.
/// Add this as a handler parameter to require the shared API key.
#[derive(Debug, Clone, Copy)]
pub struct BotAuth;

impl FromRequestParts<AppState> for BotAuth {
  type Rejection = AppError;

  async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
    let Some(expected) = state.config.bot_api_key.as_deref() else {
      return Err(AppError::internal("bot API key is not configured"));
    };

    let provided = parts
      .headers
      .get(BOT_API_KEY_HEADER)
      .and_then(|v| v.to_str().ok());

    match provided {
      Some(key) if keys_match(key, expected) => Ok(BotAuth),
      _ => {
        tracing::warn!("Failed bot API authentication attempt");
        Err(AppError::unauthorized(
          "Unauthorized: invalid or missing API key for bot",
        ))
      }
    }
  }
}

/// Compare without short-circuiting on the first differing byte
fn keys_match(provided: &str, expected: &str) -> bool {
  let (a, b) = (provided.as_bytes(), expected.as_bytes());
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
