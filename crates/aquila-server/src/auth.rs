//! Bearer-session extractor and password helpers.
//!
//! Clients hold an opaque random token; the store only ever sees its SHA-256
//! digest, so a leaked database cannot be replayed as live sessions.

use std::time::Duration;

use aquila_core::{
  profile::Profile,
  store::{ActivityStore, IdentityStore},
};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{AppState, Store, error::Error};

/// Upper bound on one identity-store round trip during request auth. A stuck
/// backend must surface as an error, not a hung request.
pub const SESSION_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Passwords and tokens ─────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::Internal(format!("argon2: {e}")))?
      .to_string(),
  )
}

pub fn verify_password(phc: &str, password: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// 32 random bytes, hex-encoded. Handed to the client verbatim.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The only form of the token the store persists or looks up.
pub fn token_digest(token: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(token.as_bytes());
  hex::encode(hasher.finalize())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The authenticated requester. Present in a handler signature means the
/// bearer token resolved to a live session with an intact profile.
pub struct Caller {
  pub profile:    Profile,
  /// Digest of the presented token, kept for logout.
  pub token_hash: String,
}

impl<S> FromRequestParts<AppState<S>> for Caller
where
  S: Store,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(Error::Unauthorized)?;
    let token_hash = token_digest(token);

    let resolve = state
      .store
      .resolve_session(token_hash.clone(), Utc::now());
    let account_id = tokio::time::timeout(SESSION_RESOLVE_TIMEOUT, resolve)
      .await
      .map_err(|_| Error::Timeout)?
      .map_err(Error::store)?
      .ok_or(Error::Unauthorized)?;

    if let Some(profile) = state.cache.get_profile(account_id) {
      return Ok(Caller { profile, token_hash });
    }

    // A session without a profile is a half-deleted account. Treat it as
    // signed out rather than 500.
    let profile = state
      .store
      .get_profile(account_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::Unauthorized)?;
    state.cache.put_profile(profile.clone());

    Ok(Caller { profile, token_hash })
  }
}
