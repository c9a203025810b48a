//! Handler for the public group listing.

use aquila_core::{profile::Group, store::ActivityStore};
use axum::{Json, extract::State};

use crate::{AppState, Store, auth::Caller, error::Error};

/// `GET /api/groups` — any authenticated caller. Served from the read cache
/// when warm.
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  _caller: Caller,
) -> Result<Json<Vec<Group>>, Error> {
  if let Some(groups) = state.cache.get_groups() {
    return Ok(Json(groups));
  }
  let groups = state.store.list_groups().await.map_err(Error::store)?;
  state.cache.put_groups(groups.clone());
  Ok(Json(groups))
}
