//! Handlers for login, logout, and the caller's own profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/login`  | Body: `{"email","password"}` → `{token, profile}` |
//! | `POST` | `/api/logout` | Revokes the presented bearer token |
//! | `GET`  | `/api/me`     | Caller's profile |

use aquila_core::store::{ActivityStore, IdentityStore};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, Store,
  auth::{self, Caller},
  error::Error,
};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /api/login`
pub async fn login<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Value>, Error> {
  let email = body.email.trim().to_lowercase();
  if email.is_empty() || body.password.is_empty() {
    return Err(Error::Validation("email and password are required".to_string()));
  }

  let account = state
    .store
    .find_account_by_email(email)
    .await
    .map_err(Error::store)?
    .ok_or(Error::InvalidCredentials)?;

  if !auth::verify_password(&account.password_hash, &body.password) {
    return Err(Error::InvalidCredentials);
  }

  // An account without a profile is half-provisioned; it cannot sign in.
  let profile = state
    .store
    .get_profile(account.account_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::InvalidCredentials)?;

  let token = auth::generate_token();
  let ttl = Duration::minutes(i64::from(state.config.session_ttl_minutes));
  state
    .store
    .create_session(auth::token_digest(&token), account.account_id, Utc::now() + ttl)
    .await
    .map_err(Error::store)?;

  tracing::info!(user = %profile.id, "signed in");
  Ok(Json(json!({ "token": token, "profile": profile })))
}

/// `POST /api/logout`
pub async fn logout<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<StatusCode, Error> {
  state
    .store
    .revoke_session(caller.token_hash)
    .await
    .map_err(Error::store)?;
  state.cache.invalidate_profile(caller.profile.id);
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/me`
pub async fn me<S: Store>(
  State(_state): State<AppState<S>>,
  caller: Caller,
) -> Json<aquila_core::profile::Profile> {
  Json(caller.profile)
}
