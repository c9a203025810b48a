//! Server error type and axum `IntoResponse` implementation.
//!
//! Every failure a handler can produce maps onto the fixed taxonomy:
//! 401 credential problems, 403 scope problems, 400 validation, 409
//! conflicts, 500 everything unexpected. Responses always carry a JSON
//! `{"error": "..."}` body, and internal detail never reaches the client.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing, malformed, or expired credential.
  #[error("unauthorized")]
  Unauthorized,

  /// Login attempt with a wrong email or password.
  #[error("invalid credentials")]
  InvalidCredentials,

  /// Valid session, insufficient role or scope.
  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The identity check did not respond within the fixed timeout.
  #[error("session resolution timed out")]
  Timeout,

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap any backend error. Handlers use this at every store call site.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Store(Box::new(e))
  }
}

impl From<aquila_core::policy::Denied> for Error {
  fn from(_: aquila_core::policy::Denied) -> Self {
    Error::Forbidden
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        "Your session expired. Please sign in again.".to_string(),
      ),
      Error::InvalidCredentials => {
        (StatusCode::UNAUTHORIZED, "Invalid email or password.".to_string())
      }
      Error::Forbidden => {
        (StatusCode::FORBIDDEN, "You are not authorized to do that.".to_string())
      }
      Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      Error::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      Error::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      Error::Timeout => {
        tracing::error!("session resolution timed out");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "The session check timed out. Please try again.".to_string(),
        )
      }
      Error::Internal(detail) => {
        tracing::error!(%detail, "internal error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Something went wrong. Please try again.".to_string(),
        )
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Something went wrong. Please try again.".to_string(),
        )
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
