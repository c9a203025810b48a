//! Handlers for aggregated statistics.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/api/stats/me` | Caller's own totals for a range |
//! | `GET` | `/api/stats/users` | Per-user totals; leader forced to own group |
//! | `GET` | `/api/stats/roles` | Per-role totals; admin only |
//! | `GET` | `/api/stats/buckets` | Per-week or per-month totals |
//!
//! All aggregation happens in `aquila_core::aggregate`; handlers only shape
//! the query and join profile metadata onto the results.

use std::collections::{BTreeMap, HashMap};

use aquila_core::{
  aggregate::{self, Bucket, Totals},
  minutes::format_minutes,
  policy::{self, Action},
  profile::Role,
  store::{ActivityStore, ReportQuery},
};
use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, Store, auth::Caller, error::Error, handlers::RangeParams};

fn formatted_minutes(total: u64) -> String {
  format_minutes(u32::try_from(total).unwrap_or(u32::MAX))
}

// ─── Own totals ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TotalsView {
  #[serde(flatten)]
  pub totals:           Totals,
  pub bible_formatted:  String,
  pub prayer_formatted: String,
}

impl From<Totals> for TotalsView {
  fn from(totals: Totals) -> Self {
    TotalsView {
      bible_formatted:  formatted_minutes(totals.bible_minutes),
      prayer_formatted: formatted_minutes(totals.prayer_minutes),
      totals,
    }
  }
}

/// `GET /api/stats/me?from&to`
pub async fn me<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<RangeParams>,
) -> Result<Json<TotalsView>, Error> {
  let (from, to) = params.dates()?;
  let rows = state
    .store
    .list_reports(ReportQuery {
      user_id: Some(caller.profile.id),
      group_id: None,
      from,
      to,
    })
    .await
    .map_err(Error::store)?;
  Ok(Json(aggregate::totals(&rows).into()))
}

// ─── Per-user ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserStats {
  pub user_id:  Uuid,
  pub name:     String,
  pub role:     Role,
  pub group_id: Option<Uuid>,
  #[serde(flatten)]
  pub totals:   TotalsView,
}

/// `GET /api/stats/users?from&to[&group_id]`
///
/// Includes every profile in scope, so members with no reports in the range
/// show zero totals rather than disappearing.
pub async fn users<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<RangeParams>,
) -> Result<Json<Vec<UserStats>>, Error> {
  let (from, to) = params.dates()?;
  let scope = policy::effective_group_scope(&caller.profile, params.group_id)?;

  let rows = state
    .store
    .list_reports(ReportQuery { user_id: None, group_id: scope, from, to })
    .await
    .map_err(Error::store)?;
  let profiles = state.store.list_profiles(scope).await.map_err(Error::store)?;

  let mut per_user = aggregate::by_user(&rows);
  let mut out: Vec<UserStats> = profiles
    .into_iter()
    .map(|p| UserStats {
      totals:   per_user.remove(&p.id).unwrap_or_default().into(),
      user_id:  p.id,
      name:     p.name,
      role:     p.role,
      group_id: p.group_id,
    })
    .collect();
  out.sort_by(|a, b| a.name.cmp(&b.name).then(a.user_id.cmp(&b.user_id)));
  Ok(Json(out))
}

// ─── Per-role ─────────────────────────────────────────────────────────────────

/// `GET /api/stats/roles?from&to` — admin only.
pub async fn roles<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<RangeParams>,
) -> Result<Json<BTreeMap<String, TotalsView>>, Error> {
  policy::authorize(&caller.profile, Action::ReadAll)?;
  let (from, to) = params.dates()?;

  let rows = state
    .store
    .list_reports(ReportQuery { user_id: None, group_id: None, from, to })
    .await
    .map_err(Error::store)?;
  let roles: HashMap<Uuid, Role> = state
    .store
    .list_profiles(None)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|p| (p.id, p.role))
    .collect();

  let out = aggregate::by_role(&rows, &roles)
    .into_iter()
    .map(|(role, totals)| (role.as_str().to_string(), totals.into()))
    .collect();
  Ok(Json(out))
}

// ─── Per-bucket ───────────────────────────────────────────────────────────────

// Query structs stay flat: serde_urlencoded cannot drive `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
pub struct BucketParams {
  pub from:     Option<String>,
  pub to:       Option<String>,
  pub group_id: Option<Uuid>,
  pub bucket:   Bucket,
}

/// `GET /api/stats/buckets?from&to&bucket=week|month[&group_id]`
pub async fn buckets<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<BucketParams>,
) -> Result<Json<BTreeMap<String, TotalsView>>, Error> {
  let range = RangeParams {
    from:     params.from,
    to:       params.to,
    group_id: params.group_id,
  };
  let (from, to) = range.dates()?;
  let scope = policy::effective_group_scope(&caller.profile, range.group_id)?;

  let rows = state
    .store
    .list_reports(ReportQuery { user_id: None, group_id: scope, from, to })
    .await
    .map_err(Error::store)?;

  let out = aggregate::by_bucket(&rows, params.bucket)
    .into_iter()
    .map(|(start, totals)| (start.to_string(), totals.into()))
    .collect();
  Ok(Json(out))
}
