//! Handlers for daily reports.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/reports/today` | Caller's report for today plus the entry-flow hint |
//! | `PUT`  | `/api/reports/today` | Upsert; hour/minute fields arrive as strings |
//! | `GET`  | `/api/users/{id}/reports` | Raw rows, policy-gated |

use aquila_core::{
  flow::{EntryFlow, SavedEntry},
  minutes,
  policy::{self, Action},
  report::Report,
  store::{ActivityStore, ReportQuery},
};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, Store, auth::Caller, error::Error, handlers::RangeParams};

// ─── Today ────────────────────────────────────────────────────────────────────

/// `GET /api/reports/today`
pub async fn today<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Value>, Error> {
  let date = Utc::now().date_naive();
  let existing = state
    .store
    .get_report(caller.profile.id, date)
    .await
    .map_err(Error::store)?;

  let flow = EntryFlow::Loading
    .loaded(existing.as_ref().map(|r| SavedEntry {
      bible_minutes:  r.bible_minutes,
      prayer_minutes: r.prayer_minutes,
    }))
    .map_err(|e| Error::Internal(e.to_string()))?;

  Ok(Json(json!({ "date": date, "report": existing, "flow": flow })))
}

/// Hour/minute fields arrive as free-text strings straight from form inputs.
/// Blank and unparseable values read as zero; hours clamp to [0,24] and
/// minutes to [0,59].
#[derive(Debug, Default, Deserialize)]
pub struct EntryBody {
  #[serde(default)]
  pub bible_hours:    String,
  #[serde(default)]
  pub bible_minutes:  String,
  #[serde(default)]
  pub prayer_hours:   String,
  #[serde(default)]
  pub prayer_minutes: String,
}

/// `PUT /api/reports/today` — the date is always the server's current date;
/// there is no backdating path.
pub async fn save_today<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<EntryBody>,
) -> Result<Json<Report>, Error> {
  let report = Report {
    user_id:        caller.profile.id,
    report_date:    Utc::now().date_naive(),
    bible_minutes:  minutes::combine(&body.bible_hours, &body.bible_minutes),
    prayer_minutes: minutes::combine(&body.prayer_hours, &body.prayer_minutes),
  };
  let stored = state.store.upsert_report(report).await.map_err(Error::store)?;
  Ok(Json(stored))
}

// ─── Per-user rows ────────────────────────────────────────────────────────────

/// `GET /api/users/{id}/reports?from&to`
pub async fn for_user<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Query(params): Query<RangeParams>,
) -> Result<Json<Vec<Report>>, Error> {
  let (from, to) = params.dates()?;

  // Authorize against the target's group before admitting whether the target
  // exists: an out-of-scope caller gets 403 either way.
  let target = state.store.get_profile(id).await.map_err(Error::store)?;
  let target_group = target.as_ref().and_then(|p| p.group_id);
  policy::authorize(&caller.profile, Action::ReadUser {
    user_id:  id,
    group_id: target_group,
  })?;
  if target.is_none() {
    return Err(Error::NotFound(format!("user {id} not found")));
  }

  let rows = state
    .store
    .list_reports(ReportQuery { user_id: Some(id), group_id: None, from, to })
    .await
    .map_err(Error::store)?;
  Ok(Json(rows))
}
