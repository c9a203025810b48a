//! Handlers for leader notes on youth profiles.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/youth/{id}/notes` | Leader (same group) or admin |
//! | `POST` | `/api/youth/{id}/notes` | Body: `{"note": "..."}` |

use aquila_core::{
  policy::{self, Action},
  profile::{Profile, Role, YouthNote},
  store::ActivityStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Store, auth::Caller, error::Error};

/// Resolve the target, confirm note access, and confirm the target is a
/// youth. Policy runs before existence is admitted.
async fn resolve_youth<S: Store>(
  state: &AppState<S>,
  caller: &Caller,
  id: Uuid,
) -> Result<Profile, Error> {
  let target = state.store.get_profile(id).await.map_err(Error::store)?;
  let youth_group = target.as_ref().and_then(|p| p.group_id);
  policy::authorize(&caller.profile, Action::WriteNote { youth_group })?;

  let target = target.ok_or_else(|| Error::NotFound(format!("user {id} not found")))?;
  if target.role != Role::Youth {
    return Err(Error::Validation(
      "notes can only be attached to youth members".to_string(),
    ));
  }
  Ok(target)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /api/youth/{id}/notes[?limit=]` — newest first.
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<YouthNote>>, Error> {
  resolve_youth(&state, &caller, id).await?;
  let limit = params.limit.unwrap_or(50).clamp(1, 200);
  let notes = state.store.list_notes(id, limit).await.map_err(Error::store)?;
  Ok(Json(notes))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub note: String,
}

/// `POST /api/youth/{id}/notes`
pub async fn create<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, Error> {
  resolve_youth(&state, &caller, id).await?;

  let note = body.note.trim().to_string();
  if note.is_empty() {
    return Err(Error::Validation("note must not be empty".to_string()));
  }

  let stored = state
    .store
    .add_note(id, caller.profile.id, note)
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(stored)))
}
