//! Admin mutation handlers and the audit-log reader.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/admin/users` | Create identity then profile, compensating on failure |
//! | `POST` | `/api/admin/users/update` | Rename and/or reset password |
//! | `POST` | `/api/admin/users/delete` | Ordered multi-store deletion |
//! | `POST` | `/api/admin/groups` | |
//! | `POST` | `/api/admin/groups/update` | |
//! | `POST` | `/api/admin/groups/delete` | Unassigns members first |
//! | `GET`  | `/api/admin/audit-logs` | Filtered page, newest first |
//!
//! Every successful mutation appends an audit entry. Audit writes are
//! best-effort: a failed append is warn-logged and never fails the mutation
//! it describes.

use aquila_core::{
  audit::{AuditAction, AuditLogEntry, AuditQuery, NewAuditEntry},
  policy::{self, Action},
  profile::{Group, Profile, Role},
  store::{ActivityStore, IdentityStore},
};
use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, Store, auth::{self, Caller}, error::Error, handlers::RangeParams};

const MIN_PASSWORD_LEN: usize = 6;

async fn append_audit<S: Store>(state: &AppState<S>, entry: NewAuditEntry) {
  let action = entry.action;
  if let Err(e) = state.store.append_audit(entry).await {
    tracing::warn!(error = %e, action = action.as_str(), "audit append failed");
  }
}

fn user_audit(
  caller: &Caller,
  action: AuditAction,
  target: &Profile,
  details: Value,
) -> NewAuditEntry {
  NewAuditEntry {
    actor_id:    caller.profile.id,
    actor_name:  Some(caller.profile.name.clone()),
    action,
    target_type: Some("user".to_string()),
    target_id:   Some(target.id.to_string()),
    target_name: Some(target.name.clone()),
    details,
  }
}

fn group_audit(
  caller: &Caller,
  action: AuditAction,
  group: &Group,
  details: Value,
) -> NewAuditEntry {
  NewAuditEntry {
    actor_id:    caller.profile.id,
    actor_name:  Some(caller.profile.name.clone()),
    action,
    target_type: Some("group".to_string()),
    target_id:   Some(group.group_id.to_string()),
    target_name: Some(group.name.clone()),
    details,
  }
}

// ─── User lifecycle ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  pub email:    String,
  pub password: String,
  pub name:     String,
  pub role:     Role,
  pub group_id: Option<Uuid>,
}

/// `POST /api/admin/users`
///
/// Identity first, profile second. If the profile insert fails the identity
/// is deleted again; `delete_account` is idempotent so the compensation is
/// safe to repeat.
pub async fn create_user<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, Error> {
  policy::authorize(&caller.profile, Action::Administer)?;

  let email = body.email.trim().to_lowercase();
  let name = body.name.trim().to_string();
  if email.is_empty() || !email.contains('@') {
    return Err(Error::Validation("a valid email is required".to_string()));
  }
  if name.is_empty() {
    return Err(Error::Validation("name must not be empty".to_string()));
  }
  if body.password.len() < MIN_PASSWORD_LEN {
    return Err(Error::Validation(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  if let Some(group_id) = body.group_id
    && state.store.get_group(group_id).await.map_err(Error::store)?.is_none()
  {
    return Err(Error::Validation(format!("group {group_id} does not exist")));
  }
  let hash = auth::hash_password(&body.password)?;
  // The store reports a taken email in-band, atomically with the insert.
  let Some(account) = state
    .store
    .create_account(email.clone(), hash)
    .await
    .map_err(Error::store)?
  else {
    return Err(Error::Conflict("that email is already in use".to_string()));
  };

  let profile = Profile {
    id:       account.account_id,
    name,
    role:     body.role,
    group_id: body.group_id,
  };
  if let Err(e) = state.store.insert_profile(profile.clone()).await {
    // Compensate: take the identity back out so no orphan credential can
    // sign in. A failure here leaves a dangling account, which we can only
    // report.
    if let Err(cleanup) = state.store.delete_account(account.account_id).await {
      tracing::error!(
        account = %account.account_id,
        error = %cleanup,
        "profile insert failed and identity cleanup also failed; \
         account is dangling",
      );
    }
    return Err(Error::store(e));
  }

  append_audit(
    &state,
    user_audit(
      &caller,
      AuditAction::CreateUser,
      &profile,
      json!({ "email": email.clone(), "role": profile.role, "group_id": profile.group_id }),
    ),
  )
  .await;

  tracing::info!(user = %profile.id, role = %profile.role, "user created");
  Ok((StatusCode::CREATED, Json(json!({ "profile": profile, "email": email }))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
  pub user_id:  Uuid,
  pub name:     Option<String>,
  pub password: Option<String>,
}

/// `POST /api/admin/users/update`
///
/// Name and password are applied independently; each change that actually
/// altered state gets its own audit entry.
pub async fn update_user<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<UpdateUserBody>,
) -> Result<Json<Profile>, Error> {
  policy::authorize(&caller.profile, Action::Administer)?;

  let target = state
    .store
    .get_profile(body.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("user {} not found", body.user_id)))?;

  // Validate both fields before applying either.
  let name = match body.name.as_deref().map(str::trim) {
    Some("") => {
      return Err(Error::Validation("name must not be empty".to_string()));
    }
    other => other.map(str::to_string),
  };
  if let Some(password) = &body.password
    && password.len() < MIN_PASSWORD_LEN
  {
    return Err(Error::Validation(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  if let Some(name) = name {
    let changed = state
      .store
      .update_profile_name(target.id, name.clone())
      .await
      .map_err(Error::store)?;
    if changed {
      state.cache.invalidate_profile(target.id);
      append_audit(
        &state,
        user_audit(
          &caller,
          AuditAction::UpdateUserProfile,
          &target,
          json!({ "name": { "from": target.name.clone(), "to": name } }),
        ),
      )
      .await;
    }
  }

  if let Some(password) = body.password {
    let hash = auth::hash_password(&password)?;
    state
      .store
      .update_password(target.id, hash)
      .await
      .map_err(Error::store)?;
    // Old sessions die with the old password.
    state
      .store
      .revoke_sessions_for_account(target.id)
      .await
      .map_err(Error::store)?;
    append_audit(
      &state,
      user_audit(&caller, AuditAction::ResetPassword, &target, json!({})),
    )
    .await;
  }

  let updated = state
    .store
    .get_profile(target.id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Internal("profile vanished during update".to_string()))?;
  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserBody {
  pub user_id: Uuid,
}

/// `POST /api/admin/users/delete`
///
/// Deletion order: reports, notes, profile, identity. The early steps abort
/// on failure while everything is still consistent; once the profile is gone
/// the user no longer exists as far as the application is concerned, so an
/// identity-deletion failure is logged loudly instead of unwinding.
pub async fn delete_user<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<DeleteUserBody>,
) -> Result<StatusCode, Error> {
  policy::authorize(&caller.profile, Action::Administer)?;

  if body.user_id == caller.profile.id {
    return Err(Error::Validation(
      "you cannot delete your own account".to_string(),
    ));
  }
  let target = state
    .store
    .get_profile(body.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("user {} not found", body.user_id)))?;
  if target.role == Role::Admin {
    return Err(Error::Validation(
      "admin accounts cannot be deleted".to_string(),
    ));
  }

  state
    .store
    .delete_reports_for_user(target.id)
    .await
    .map_err(Error::store)?;
  state
    .store
    .delete_notes_for_user(target.id)
    .await
    .map_err(Error::store)?;
  state.store.delete_profile(target.id).await.map_err(Error::store)?;
  state.cache.invalidate_profile(target.id);

  if let Err(e) = state.store.revoke_sessions_for_account(target.id).await {
    tracing::error!(user = %target.id, error = %e, "session revocation failed");
  }
  if let Err(e) = state.store.delete_account(target.id).await {
    tracing::error!(
      user = %target.id,
      error = %e,
      "identity deletion failed after profile removal; account is dangling",
    );
  }

  append_audit(
    &state,
    user_audit(&caller, AuditAction::DeleteUser, &target, json!({})),
  )
  .await;

  tracing::info!(user = %target.id, "user deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Group lifecycle ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
  pub name: String,
}

/// `POST /api/admin/groups`
pub async fn create_group<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<CreateGroupBody>,
) -> Result<impl IntoResponse, Error> {
  policy::authorize(&caller.profile, Action::Administer)?;

  let name = body.name.trim().to_string();
  if name.is_empty() {
    return Err(Error::Validation("group name must not be empty".to_string()));
  }

  let group = state.store.create_group(name).await.map_err(Error::store)?;
  state.cache.invalidate_groups();
  append_audit(
    &state,
    group_audit(&caller, AuditAction::CreateGroup, &group, json!({})),
  )
  .await;
  Ok((StatusCode::CREATED, Json(group)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupBody {
  pub group_id: Uuid,
  pub name:     String,
}

/// `POST /api/admin/groups/update`
pub async fn update_group<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<UpdateGroupBody>,
) -> Result<Json<Group>, Error> {
  policy::authorize(&caller.profile, Action::Administer)?;

  let name = body.name.trim().to_string();
  if name.is_empty() {
    return Err(Error::Validation("group name must not be empty".to_string()));
  }
  let group = state
    .store
    .get_group(body.group_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("group {} not found", body.group_id)))?;

  let changed = state
    .store
    .update_group_name(group.group_id, name.clone())
    .await
    .map_err(Error::store)?;
  if changed {
    state.cache.invalidate_groups();
    append_audit(
      &state,
      group_audit(
        &caller,
        AuditAction::UpdateGroup,
        &group,
        json!({ "name": { "from": group.name.clone(), "to": name.clone() } }),
      ),
    )
    .await;
  }

  Ok(Json(Group { group_id: group.group_id, name }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteGroupBody {
  pub group_id: Uuid,
}

/// `POST /api/admin/groups/delete`
pub async fn delete_group<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<DeleteGroupBody>,
) -> Result<StatusCode, Error> {
  policy::authorize(&caller.profile, Action::Administer)?;

  let group = state
    .store
    .get_group(body.group_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("group {} not found", body.group_id)))?;

  // Members are unassigned as part of the deletion, so an unknown set of
  // cached profiles just changed.
  state.store.delete_group(group.group_id).await.map_err(Error::store)?;
  state.cache.clear();

  append_audit(
    &state,
    group_audit(&caller, AuditAction::DeleteGroup, &group, json!({})),
  )
  .await;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Audit-log reader ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuditParams {
  pub from:   Option<String>,
  pub to:     Option<String>,
  pub q:      Option<String>,
  pub action: Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

#[derive(Debug, serde::Serialize)]
pub struct AuditPage {
  pub entries: Vec<AuditLogEntry>,
  pub total:   u64,
}

/// `GET /api/admin/audit-logs?from&to&q&action&limit&offset`
pub async fn audit_logs<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<AuditParams>,
) -> Result<Json<AuditPage>, Error> {
  policy::authorize(&caller.profile, Action::ReadAuditLog)?;

  let range = RangeParams { from: params.from, to: params.to, group_id: None };
  let (from, to) = range.dates()?;
  let action = params
    .action
    .as_deref()
    .map(|s| {
      s.parse::<AuditAction>()
        .map_err(|_| Error::Validation(format!("unknown audit action '{s}'")))
    })
    .transpose()?;

  let query = AuditQuery {
    from,
    to,
    q: params.q.filter(|q| !q.trim().is_empty()),
    action,
    limit: params.limit,
    offset: params.offset.unwrap_or(0),
  };
  let (entries, total) = state.store.query_audit(query).await.map_err(Error::store)?;
  Ok(Json(AuditPage { entries, total }))
}
