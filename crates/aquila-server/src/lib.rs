//! HTTP server for the activity tracker.
//!
//! Exposes an axum [`Router`] backed by any [`Store`]: bearer-token
//! sessions, a role-gated JSON read API, admin mutation endpoints with an
//! audit trail, and CSV/XLSX/PDF exports.

pub mod auth;
pub mod cache;
pub mod error;
pub mod export;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use aquila_core::{
  profile::Profile,
  store::{ActivityStore, IdentityStore},
};
use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use cache::ReadCache;

/// Everything the server needs from a backend. Implemented for free by any
/// type that provides both stores.
pub trait Store:
  IdentityStore + ActivityStore + Clone + Send + Sync + 'static
{
}

impl<T> Store for T where
  T: IdentityStore + ActivityStore + Clone + Send + Sync + 'static
{
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with
/// `AQUILA_`-prefixed environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  #[serde(default = "default_session_ttl_minutes")]
  pub session_ttl_minutes: u32,
  #[serde(default = "default_cache_ttl_seconds")]
  pub cache_ttl_seconds:   u64,

  /// Created at startup when no account with this email exists yet, so a
  /// fresh deployment has exactly one admin to sign in with.
  #[serde(default)]
  pub bootstrap_admin_email:    Option<String>,
  #[serde(default)]
  pub bootstrap_admin_password: Option<String>,
  #[serde(default)]
  pub bootstrap_admin_name:     Option<String>,
}

fn default_session_ttl_minutes() -> u32 {
  12 * 60
}

fn default_cache_ttl_seconds() -> u64 {
  30
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Store> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub cache:  Arc<ReadCache>,
}

impl<S: Store> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let cache = ReadCache::new(Duration::from_secs(config.cache_ttl_seconds));
    AppState {
      store:  Arc::new(store),
      config: Arc::new(config),
      cache:  Arc::new(cache),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router.
pub fn router<S: Store>(state: AppState<S>) -> Router {
  Router::new()
    // Sessions
    .route("/api/login",  post(handlers::session::login::<S>))
    .route("/api/logout", post(handlers::session::logout::<S>))
    .route("/api/me",     get(handlers::session::me::<S>))
    // Groups (read)
    .route("/api/groups", get(handlers::groups::list::<S>))
    // Reports
    .route(
      "/api/reports/today",
      get(handlers::reports::today::<S>).put(handlers::reports::save_today::<S>),
    )
    .route("/api/users/{id}/reports", get(handlers::reports::for_user::<S>))
    // Stats
    .route("/api/stats/me",      get(handlers::stats::me::<S>))
    .route("/api/stats/users",   get(handlers::stats::users::<S>))
    .route("/api/stats/roles",   get(handlers::stats::roles::<S>))
    .route("/api/stats/buckets", get(handlers::stats::buckets::<S>))
    // Notes
    .route(
      "/api/youth/{id}/notes",
      get(handlers::notes::list::<S>).post(handlers::notes::create::<S>),
    )
    // Admin
    .route("/api/admin/users",         post(handlers::admin::create_user::<S>))
    .route("/api/admin/users/update",  post(handlers::admin::update_user::<S>))
    .route("/api/admin/users/delete",  post(handlers::admin::delete_user::<S>))
    .route("/api/admin/groups",        post(handlers::admin::create_group::<S>))
    .route("/api/admin/groups/update", post(handlers::admin::update_group::<S>))
    .route("/api/admin/groups/delete", post(handlers::admin::delete_group::<S>))
    .route("/api/admin/audit-logs",    get(handlers::admin::audit_logs::<S>))
    // Exports
    .route("/api/export/reports",      get(handlers::export::reports_csv::<S>))
    .route("/api/export/reports/xlsx", get(handlers::export::reports_xlsx::<S>))
    .route("/api/export/reports/pdf",  get(handlers::export::reports_pdf::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Bootstrap ────────────────────────────────────────────────────────────────

/// Create the configured bootstrap admin if its email is not taken yet.
/// Returns the admin's id when one was created.
pub async fn ensure_bootstrap_admin<S: Store>(
  state: &AppState<S>,
) -> Result<Option<Uuid>, Error> {
  let (Some(email), Some(password)) = (
    state.config.bootstrap_admin_email.clone(),
    state.config.bootstrap_admin_password.clone(),
  ) else {
    return Ok(None);
  };
  let email = email.trim().to_lowercase();

  let hash = auth::hash_password(&password)?;
  let Some(account) = state
    .store
    .create_account(email.clone(), hash)
    .await
    .map_err(Error::store)?
  else {
    // Email already taken; a previous run provisioned the admin.
    return Ok(None);
  };
  let profile = Profile {
    id:       account.account_id,
    name:     state
      .config
      .bootstrap_admin_name
      .clone()
      .unwrap_or_else(|| "Administrator".to_string()),
    role:     aquila_core::profile::Role::Admin,
    group_id: None,
  };
  if let Err(e) = state.store.insert_profile(profile).await {
    if let Err(cleanup) = state.store.delete_account(account.account_id).await {
      tracing::error!(
        account = %account.account_id,
        error = %cleanup,
        "bootstrap profile insert failed and identity cleanup also failed",
      );
    }
    return Err(Error::store(e));
  }

  tracing::info!(admin = %account.account_id, %email, "bootstrap admin created");
  Ok(Some(account.account_id))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use aquila_core::{profile::Role, report::Report};
  use aquila_store_sqlite::SqliteStore;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::Utc;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  fn test_config() -> ServerConfig {
    ServerConfig {
      host:                     "127.0.0.1".to_string(),
      port:                     0,
      store_path:               PathBuf::from(":memory:"),
      session_ttl_minutes:      60,
      cache_ttl_seconds:        30,
      bootstrap_admin_email:    None,
      bootstrap_admin_password: None,
      bootstrap_admin_name:     None,
    }
  }

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(store, test_config())
  }

  async fn seed_user(
    state: &AppState<SqliteStore>,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
    group_id: Option<Uuid>,
  ) -> Uuid {
    let hash = auth::hash_password(password).unwrap();
    let account = state
      .store
      .create_account(email.to_string(), hash)
      .await
      .unwrap()
      .unwrap();
    state
      .store
      .insert_profile(Profile {
        id: account.account_id,
        name: name.to_string(),
        role,
        group_id,
      })
      .await
      .unwrap();
    account.account_id
  }

  async fn seed_report(
    state: &AppState<SqliteStore>,
    user_id: Uuid,
    date: &str,
    bible: u32,
    prayer: u32,
  ) {
    state
      .store
      .upsert_report(Report {
        user_id,
        report_date: date.parse().unwrap(),
        bible_minutes: bible,
        prayer_minutes: prayer,
      })
      .await
      .unwrap();
  }

  async fn request(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn login(state: &AppState<SqliteStore>, email: &str, password: &str) -> String {
    let resp = request(
      state,
      "POST",
      "/api/login",
      None,
      Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await["token"].as_str().unwrap().to_string()
  }

  // ── Sessions ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_returns_token_and_profile() {
    let state = make_state().await;
    seed_user(&state, "ana@example.com", "secret123", "Ana", Role::Youth, None).await;

    let resp = request(
      &state,
      "POST",
      "/api/login",
      None,
      Some(json!({ "email": "ana@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["token"].as_str().unwrap().len() == 64);
    assert_eq!(body["profile"]["name"], "Ana");
    assert_eq!(body["profile"]["role"], "youth");
  }

  #[tokio::test]
  async fn wrong_password_is_401() {
    let state = make_state().await;
    seed_user(&state, "ana@example.com", "secret123", "Ana", Role::Youth, None).await;

    let resp = request(
      &state,
      "POST",
      "/api/login",
      None,
      Some(json!({ "email": "ana@example.com", "password": "nope" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn me_requires_a_bearer_token() {
    let state = make_state().await;
    seed_user(&state, "ana@example.com", "secret123", "Ana", Role::Youth, None).await;

    let resp = request(&state, "GET", "/api/me", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = login(&state, "ana@example.com", "secret123").await;
    let resp = request(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["name"], "Ana");
  }

  #[tokio::test]
  async fn logout_revokes_the_session() {
    let state = make_state().await;
    seed_user(&state, "ana@example.com", "secret123", "Ana", Role::Youth, None).await;
    let token = login(&state, "ana@example.com", "secret123").await;

    let resp = request(&state, "POST", "/api/logout", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The cached profile must not outlive the session.
    let resp = request(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Daily entry ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_visit_of_the_day_is_new_then_ask_edit() {
    let state = make_state().await;
    seed_user(&state, "ana@example.com", "secret123", "Ana", Role::Youth, None).await;
    let token = login(&state, "ana@example.com", "secret123").await;

    let resp = request(&state, "GET", "/api/reports/today", Some(&token), None).await;
    let body = json_body(resp).await;
    assert_eq!(body["flow"]["state"], "new");
    assert!(body["report"].is_null());

    let resp = request(
      &state,
      "PUT",
      "/api/reports/today",
      Some(&token),
      Some(json!({
        "bible_hours": "2", "bible_minutes": "15",
        "prayer_hours": "", "prayer_minutes": "45"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let saved = json_body(resp).await;
    assert_eq!(saved["bible_minutes"], 135);
    assert_eq!(saved["prayer_minutes"], 45);

    let resp = request(&state, "GET", "/api/reports/today", Some(&token), None).await;
    let body = json_body(resp).await;
    assert_eq!(body["flow"]["state"], "ask_edit");
    assert_eq!(body["flow"]["existing"]["bible_minutes"], 135);
  }

  #[tokio::test]
  async fn saving_twice_replaces_todays_report() {
    let state = make_state().await;
    let user = seed_user(&state, "ana@example.com", "secret123", "Ana", Role::Youth, None).await;
    let token = login(&state, "ana@example.com", "secret123").await;

    for (h, m) in [("2", "15"), ("0", "10")] {
      let resp = request(
        &state,
        "PUT",
        "/api/reports/today",
        Some(&token),
        Some(json!({ "bible_hours": h, "bible_minutes": m })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::OK);
    }

    let today = Utc::now().date_naive();
    let stored = state.store.get_report(user, today).await.unwrap().unwrap();
    assert_eq!(stored.bible_minutes, 10);
    assert_eq!(stored.prayer_minutes, 0);
  }

  // ── Scoped reads ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn leader_gets_403_for_out_of_group_user_not_empty_data() {
    let state = make_state().await;
    let alpha = state.store.create_group("Alpha".into()).await.unwrap();
    let beta = state.store.create_group("Beta".into()).await.unwrap();
    seed_user(
      &state, "leader@example.com", "secret123", "Leda", Role::Leader,
      Some(alpha.group_id),
    )
    .await;
    let outsider = seed_user(
      &state, "youth@example.com", "secret123", "Yobo", Role::Youth,
      Some(beta.group_id),
    )
    .await;
    seed_report(&state, outsider, "2024-03-04", 30, 10).await;

    let token = login(&state, "leader@example.com", "secret123").await;
    let resp = request(
      &state,
      "GET",
      &format!("/api/users/{outsider}/reports"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn youth_reads_own_rows_only() {
    let state = make_state().await;
    let me = seed_user(&state, "me@example.com", "secret123", "Me", Role::Youth, None).await;
    let other = seed_user(&state, "o@example.com", "secret123", "Other", Role::Youth, None).await;
    seed_report(&state, me, "2024-03-04", 30, 10).await;

    let token = login(&state, "me@example.com", "secret123").await;
    let resp = request(
      &state,
      "GET",
      &format!("/api/users/{me}/reports?from=2024-03-01&to=2024-03-31"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

    let resp = request(
      &state,
      "GET",
      &format!("/api/users/{other}/reports"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn inverted_range_is_a_validation_error() {
    let state = make_state().await;
    let me = seed_user(&state, "me@example.com", "secret123", "Me", Role::Youth, None).await;
    let token = login(&state, "me@example.com", "secret123").await;

    let resp = request(
      &state,
      "GET",
      &format!("/api/users/{me}/reports?from=2024-04-01&to=2024-03-01"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Stats ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn stats_users_forces_leaders_to_their_own_group() {
    let state = make_state().await;
    let alpha = state.store.create_group("Alpha".into()).await.unwrap();
    let beta = state.store.create_group("Beta".into()).await.unwrap();
    seed_user(
      &state, "leader@example.com", "secret123", "Leda", Role::Leader,
      Some(alpha.group_id),
    )
    .await;
    let inside = seed_user(
      &state, "in@example.com", "secret123", "Ingrid", Role::Youth,
      Some(alpha.group_id),
    )
    .await;
    let outside = seed_user(
      &state, "out@example.com", "secret123", "Oscar", Role::Youth,
      Some(beta.group_id),
    )
    .await;
    seed_report(&state, inside, "2024-03-04", 135, 45).await;
    seed_report(&state, outside, "2024-03-04", 999, 999).await;

    let token = login(&state, "leader@example.com", "secret123").await;
    // Asking for the other group is ignored, not honoured.
    let resp = request(
      &state,
      "GET",
      &format!("/api/stats/users?group_id={}", beta.group_id),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let names: Vec<&str> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|u| u["name"].as_str().unwrap())
      .collect();
    assert!(names.contains(&"Ingrid"));
    assert!(!names.contains(&"Oscar"));

    let ingrid = body
      .as_array()
      .unwrap()
      .iter()
      .find(|u| u["name"] == "Ingrid")
      .unwrap();
    assert_eq!(ingrid["bible_minutes"], 135);
    assert_eq!(ingrid["bible_formatted"], "2 h 15 min");
  }

  #[tokio::test]
  async fn stats_roles_is_admin_only() {
    let state = make_state().await;
    let group = state.store.create_group("Alpha".into()).await.unwrap();
    seed_user(
      &state, "leader@example.com", "secret123", "Leda", Role::Leader,
      Some(group.group_id),
    )
    .await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;

    let leader = login(&state, "leader@example.com", "secret123").await;
    let resp = request(&state, "GET", "/api/stats/roles", Some(&leader), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = login(&state, "admin@example.com", "secret123").await;
    let resp = request(&state, "GET", "/api/stats/roles", Some(&admin), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn stats_buckets_key_on_week_start() {
    let state = make_state().await;
    let admin = seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    // Mon 2024-03-04 through Sun 2024-03-10 share a bucket.
    seed_report(&state, admin, "2024-03-04", 10, 0).await;
    seed_report(&state, admin, "2024-03-10", 20, 0).await;
    seed_report(&state, admin, "2024-03-11", 40, 0).await;

    let token = login(&state, "admin@example.com", "secret123").await;
    let resp = request(
      &state,
      "GET",
      "/api/stats/buckets?bucket=week&from=2024-03-01&to=2024-03-31",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["2024-03-04"]["bible_minutes"], 30);
    assert_eq!(body["2024-03-11"]["bible_minutes"], 40);
  }

  // ── Notes ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn leader_notes_on_own_group_youth_only() {
    let state = make_state().await;
    let alpha = state.store.create_group("Alpha".into()).await.unwrap();
    let beta = state.store.create_group("Beta".into()).await.unwrap();
    seed_user(
      &state, "leader@example.com", "secret123", "Leda", Role::Leader,
      Some(alpha.group_id),
    )
    .await;
    let near = seed_user(
      &state, "near@example.com", "secret123", "Nia", Role::Youth,
      Some(alpha.group_id),
    )
    .await;
    let far = seed_user(
      &state, "far@example.com", "secret123", "Fay", Role::Youth,
      Some(beta.group_id),
    )
    .await;

    let token = login(&state, "leader@example.com", "secret123").await;
    let resp = request(
      &state,
      "POST",
      &format!("/api/youth/{near}/notes"),
      Some(&token),
      Some(json!({ "note": "Brought a friend this week" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = request(
      &state,
      "POST",
      &format!("/api/youth/{far}/notes"),
      Some(&token),
      Some(json!({ "note": "should not land" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = request(
      &state,
      "GET",
      &format!("/api/youth/{near}/notes"),
      Some(&token),
      None,
    )
    .await;
    let notes = json_body(resp).await;
    assert_eq!(notes.as_array().unwrap().len(), 1);
    assert_eq!(notes[0]["note"], "Brought a friend this week");
  }

  // ── Admin: users ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_creates_a_user_who_can_sign_in() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "POST",
      "/api/admin/users",
      Some(&admin),
      Some(json!({
        "email": "New@Example.com",
        "password": "welcome1",
        "name": "Newbie",
        "role": "youth"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Email was normalised to lowercase.
    let token = login(&state, "new@example.com", "welcome1").await;
    let resp = request(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(json_body(resp).await["name"], "Newbie");
  }

  #[tokio::test]
  async fn duplicate_email_is_a_conflict() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    seed_user(&state, "taken@example.com", "secret123", "First", Role::Youth, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "POST",
      "/api/admin/users",
      Some(&admin),
      Some(json!({
        "email": "taken@example.com",
        "password": "welcome1",
        "name": "Second",
        "role": "youth"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The original credential is untouched.
    login(&state, "taken@example.com", "secret123").await;
  }

  #[tokio::test]
  async fn non_admin_cannot_reach_admin_endpoints() {
    let state = make_state().await;
    let group = state.store.create_group("Alpha".into()).await.unwrap();
    seed_user(
      &state, "leader@example.com", "secret123", "Leda", Role::Leader,
      Some(group.group_id),
    )
    .await;
    let token = login(&state, "leader@example.com", "secret123").await;

    let resp = request(
      &state,
      "POST",
      "/api/admin/groups",
      Some(&token),
      Some(json!({ "name": "Gamma" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = request(&state, "GET", "/api/admin/audit-logs", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn short_password_on_update_is_rejected_before_any_change() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let user = seed_user(&state, "u@example.com", "secret123", "Uma", Role::Youth, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "POST",
      "/api/admin/users/update",
      Some(&admin),
      Some(json!({ "user_id": user, "name": "Renamed", "password": "tiny" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let profile = state.store.get_profile(user).await.unwrap().unwrap();
    assert_eq!(profile.name, "Uma");
  }

  #[tokio::test]
  async fn password_reset_revokes_existing_sessions() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let user = seed_user(&state, "u@example.com", "secret123", "Uma", Role::Youth, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;
    let old_session = login(&state, "u@example.com", "secret123").await;

    let resp = request(
      &state,
      "POST",
      "/api/admin/users/update",
      Some(&admin),
      Some(json!({ "user_id": user, "password": "brandnew1" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = request(&state, "GET", "/api/me", Some(&old_session), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    login(&state, "u@example.com", "brandnew1").await;
  }

  #[tokio::test]
  async fn delete_user_refuses_self_and_admin_targets() {
    let state = make_state().await;
    let root = seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let other_admin =
      seed_user(&state, "admin2@example.com", "secret123", "Root2", Role::Admin, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    for target in [root, other_admin] {
      let resp = request(
        &state,
        "POST",
        "/api/admin/users/delete",
        Some(&admin),
        Some(json!({ "user_id": target })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
  }

  #[tokio::test]
  async fn delete_user_removes_rows_and_credentials() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let victim = seed_user(&state, "v@example.com", "secret123", "Vic", Role::Youth, None).await;
    seed_report(&state, victim, "2024-03-04", 30, 10).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "POST",
      "/api/admin/users/delete",
      Some(&admin),
      Some(json!({ "user_id": victim })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(state.store.get_profile(victim).await.unwrap().is_none());
    let resp = request(
      &state,
      "POST",
      "/api/login",
      None,
      Some(json!({ "email": "v@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Admin: groups and audit ──────────────────────────────────────────────────

  #[tokio::test]
  async fn group_lifecycle_is_audited_and_visible() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "POST",
      "/api/admin/groups",
      Some(&admin),
      Some(json!({ "name": "Gamma" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let group = json_body(resp).await;
    let group_id = group["group_id"].as_str().unwrap().to_string();

    // The groups listing reflects the mutation immediately, cache included.
    let resp = request(&state, "GET", "/api/groups", Some(&admin), None).await;
    let groups = json_body(resp).await;
    assert!(groups.as_array().unwrap().iter().any(|g| g["name"] == "Gamma"));

    let resp = request(
      &state,
      "POST",
      "/api/admin/groups/update",
      Some(&admin),
      Some(json!({ "group_id": group_id, "name": "Gamma Prime" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = request(
      &state,
      "GET",
      "/api/admin/audit-logs?action=CREATE_GROUP",
      Some(&admin),
      None,
    )
    .await;
    let page = json_body(resp).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["entries"][0]["action"], "CREATE_GROUP");
    assert_eq!(page["entries"][0]["target_name"], "Gamma");
    assert_eq!(page["entries"][0]["actor_name"], "Root");
  }

  #[tokio::test]
  async fn unknown_audit_action_filter_is_a_validation_error() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "GET",
      "/api/admin/audit-logs?action=LAUNCH_MISSILES",
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Exports ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn csv_export_has_filename_header_and_rows() {
    let state = make_state().await;
    let admin_id =
      seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    seed_report(&state, admin_id, "2024-03-04", 135, 45).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "GET",
      "/api/export/reports?from=2024-03-01&to=2024-03-31",
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
      .headers()
      .get(header::CONTENT_DISPOSITION)
      .unwrap()
      .to_str()
      .unwrap()
      .to_string();
    assert!(disposition.contains("reports-2024-03-01-2024-03-31.csv"));

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.starts_with("date,name,role,group,"));
    assert!(text.contains("2024-03-04,Root,admin,,135,45,180"));
  }

  #[tokio::test]
  async fn export_requires_both_date_bounds() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "GET",
      "/api/export/reports?from=2024-03-01",
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn youth_cannot_export() {
    let state = make_state().await;
    seed_user(&state, "y@example.com", "secret123", "Yobo", Role::Youth, None).await;
    let token = login(&state, "y@example.com", "secret123").await;

    let resp = request(
      &state,
      "GET",
      "/api/export/reports?from=2024-03-01&to=2024-03-31",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn leader_export_is_scoped_to_their_group() {
    let state = make_state().await;
    let alpha = state.store.create_group("Alpha".into()).await.unwrap();
    let beta = state.store.create_group("Beta".into()).await.unwrap();
    seed_user(
      &state, "leader@example.com", "secret123", "Leda", Role::Leader,
      Some(alpha.group_id),
    )
    .await;
    let inside = seed_user(
      &state, "in@example.com", "secret123", "Ingrid", Role::Youth,
      Some(alpha.group_id),
    )
    .await;
    let outside = seed_user(
      &state, "out@example.com", "secret123", "Oscar", Role::Youth,
      Some(beta.group_id),
    )
    .await;
    seed_report(&state, inside, "2024-03-04", 30, 10).await;
    seed_report(&state, outside, "2024-03-05", 99, 99).await;

    let token = login(&state, "leader@example.com", "secret123").await;
    let resp = request(
      &state,
      "GET",
      &format!(
        "/api/export/reports?from=2024-03-01&to=2024-03-31&group_id={}",
        beta.group_id
      ),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.contains("Ingrid"));
    assert!(!text.contains("Oscar"));
  }

  #[tokio::test]
  async fn binary_exports_carry_their_magic_bytes() {
    let state = make_state().await;
    let admin_id =
      seed_user(&state, "admin@example.com", "secret123", "Root", Role::Admin, None).await;
    seed_report(&state, admin_id, "2024-03-04", 30, 10).await;
    let admin = login(&state, "admin@example.com", "secret123").await;

    let resp = request(
      &state,
      "GET",
      "/api/export/reports/xlsx?from=2024-03-01&to=2024-03-31",
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let resp = request(
      &state,
      "GET",
      "/api/export/reports/pdf?from=2024-03-01&to=2024-03-31",
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..5], b"%PDF-");
  }

  // ── Bootstrap ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn bootstrap_admin_is_created_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = ServerConfig {
      bootstrap_admin_email:    Some("root@example.com".to_string()),
      bootstrap_admin_password: Some("bootstrap1".to_string()),
      bootstrap_admin_name:     Some("Root".to_string()),
      ..test_config()
    };
    let state = AppState::new(store, config);

    let created = ensure_bootstrap_admin(&state).await.unwrap();
    assert!(created.is_some());
    assert_eq!(ensure_bootstrap_admin(&state).await.unwrap(), None);

    let token = login(&state, "root@example.com", "bootstrap1").await;
    let resp = request(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(json_body(resp).await["role"], "admin");
  }
}
