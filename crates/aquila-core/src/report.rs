//! Report — one day's logged Bible-reading and prayer minutes for one user.
//!
//! At most one report exists per (user, calendar date); writes go through an
//! upsert keyed on that pair, so re-submitting a day replaces it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single day's activity row. `report_date` is a naive local calendar
/// date; its ISO `YYYY-MM-DD` form is both the storage key and the wire
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub user_id:        Uuid,
  pub report_date:    NaiveDate,
  pub bible_minutes:  u32,
  pub prayer_minutes: u32,
}
