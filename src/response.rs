//! JSON error responses for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::{DbLockError, ReviewError};
use crate::srs::{InvalidRatingError, UnknownRatingError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
  status: StatusCode,
  code: &'static str,
  message: String,
  /// Operational errors are shown to the client as-is; others are masked
  is_operational: bool,
}

impl AppError {
  pub fn not_found(message: impl Into<String>) -> Self {
    Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
  }

  pub fn unauthorized(message: impl Into<String>) -> Self {
    Self::operational(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self {
      status: StatusCode::INTERNAL_SERVER_ERROR,
      code: "INTERNAL_ERROR",
      message: message.into(),
      is_operational: false,
    }
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }

  fn operational(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
    Self {
      status,
      code,
      message: message.into(),
      is_operational: true,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let message = if self.is_operational {
      self.message
    } else {
      tracing::error!(code = self.code, "{}", self.message);
      "Internal server error".to_string()
    };

    let body = ErrorResponse {
      error: message,
      code: self.code.to_string(),
    };

    (self.status, Json(body)).into_response()
  }
}

impl From<UnknownRatingError> for AppError {
  fn from(e: UnknownRatingError) -> Self {
    Self::validation(format!(
      "Invalid rating '{}'. Must be one of: Again, Hard, Good, Easy",
      e.0
    ))
  }
}

impl From<InvalidRatingError> for AppError {
  fn from(e: InvalidRatingError) -> Self {
    Self::validation(e.to_string())
  }
}

impl From<ReviewError> for AppError {
  fn from(e: ReviewError) -> Self {
    match e {
      ReviewError::CardNotFound(id) => Self::not_found(format!("Card {} not found", id)),
      ReviewError::Sql(e) => Self::internal(format!("review update failed: {}", e)),
    }
  }
}

impl From<DbLockError> for AppError {
  fn from(e: DbLockError) -> Self {
    Self::internal(e.to_string())
  }
}

impl From<rusqlite::Error> for AppError {
  fn from(e: rusqlite::Error) -> Self {
    Self::internal(format!("database error: {}", e))
  }
}
