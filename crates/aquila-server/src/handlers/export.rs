//! Export endpoint handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/api/export/reports` | CSV |
//! | `GET` | `/api/export/reports/xlsx` | XLSX workbook |
//! | `GET` | `/api/export/reports/pdf` | PDF document |
//!
//! `from` and `to` are required. Group scope goes through
//! `policy::effective_group_scope`: admins export what they ask for, leaders
//! always their own group, youth are denied.

use std::collections::HashMap;

use aquila_core::{
  policy,
  store::{ActivityStore, ReportQuery},
};
use axum::{
  extract::{Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
  AppState, Store,
  auth::Caller,
  error::Error,
  export::{ExportDocument, ExportRow, csv, pdf, xlsx},
  handlers::RangeParams,
};

async fn gather<S: Store>(
  state: &AppState<S>,
  caller: &Caller,
  params: &RangeParams,
) -> Result<ExportDocument, Error> {
  let (from, to) = params.required_dates()?;
  let scope = policy::effective_group_scope(&caller.profile, params.group_id)?;

  let reports = state
    .store
    .list_reports(ReportQuery {
      user_id:  None,
      group_id: scope,
      from:     Some(from),
      to:       Some(to),
    })
    .await
    .map_err(Error::store)?;

  let profiles: HashMap<Uuid, _> = state
    .store
    .list_profiles(scope)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();
  let groups: HashMap<Uuid, String> = state
    .store
    .list_groups()
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|g| (g.group_id, g.name))
    .collect();

  // Rows arrive chronologically ascending from the store and keep that order.
  let rows = reports
    .into_iter()
    .map(|r| {
      let profile = profiles.get(&r.user_id);
      ExportRow {
        date:           r.report_date,
        name:           profile.map_or_else(
          || "(unknown)".to_string(),
          |p| p.name.clone(),
        ),
        role:           profile.map_or(aquila_core::profile::Role::Youth, |p| p.role),
        group:          profile
          .and_then(|p| p.group_id)
          .and_then(|id| groups.get(&id).cloned())
          .unwrap_or_default(),
        bible_minutes:  r.bible_minutes,
        prayer_minutes: r.prayer_minutes,
      }
    })
    .collect();

  Ok(ExportDocument { from, to, rows })
}

fn attachment(filename: String, content_type: &str, body: Vec<u8>) -> Response {
  (
    [
      (header::CONTENT_TYPE, content_type.to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    body,
  )
    .into_response()
}

/// `GET /api/export/reports?from&to[&group_id]`
pub async fn reports_csv<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<RangeParams>,
) -> Result<Response, Error> {
  let doc = gather(&state, &caller, &params).await?;
  Ok(attachment(
    doc.filename("csv"),
    "text/csv; charset=utf-8",
    csv::render(&doc).into_bytes(),
  ))
}

/// `GET /api/export/reports/xlsx?from&to[&group_id]`
pub async fn reports_xlsx<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<RangeParams>,
) -> Result<Response, Error> {
  let doc = gather(&state, &caller, &params).await?;
  let body = xlsx::render(&doc)?;
  Ok(attachment(
    doc.filename("xlsx"),
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    body,
  ))
}

/// `GET /api/export/reports/pdf?from&to[&group_id]`
pub async fn reports_pdf<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<RangeParams>,
) -> Result<Response, Error> {
  let doc = gather(&state, &caller, &params).await?;
  let body = pdf::render(&doc)?;
  Ok(attachment(doc.filename("pdf"), "application/pdf", body))
}
