//! Pure aggregation folds over report rows.
//!
//! Every fold is order-independent: sums are commutative and "most recent"
//! uses max rather than last-seen, so permuting the input never changes the
//! result. `BTreeMap` keys keep iteration deterministic for rendering.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  dates::{month_start, week_start},
  profile::Role,
  report::Report,
};

/// Summed activity for one aggregation key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
  pub bible_minutes:  u64,
  pub prayer_minutes: u64,
  pub reports:        u64,
  /// Most recent report date in the set; `None` for an empty set.
  pub last_report:    Option<NaiveDate>,
}

impl Totals {
  fn add(&mut self, row: &Report) {
    self.bible_minutes += u64::from(row.bible_minutes);
    self.prayer_minutes += u64::from(row.prayer_minutes);
    self.reports += 1;
    // ISO dates compare the same lexicographically and as values, so a plain
    // max is the authoritative tie-break.
    if self.last_report.is_none_or(|d| row.report_date > d) {
      self.last_report = Some(row.report_date);
    }
  }
}

/// Which period key to bucket by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
  Week,
  Month,
}

impl Bucket {
  pub fn key(self, date: NaiveDate) -> NaiveDate {
    match self {
      Bucket::Week  => week_start(date),
      Bucket::Month => month_start(date),
    }
  }
}

/// Grand totals over the whole row set.
pub fn totals(rows: &[Report]) -> Totals {
  let mut acc = Totals::default();
  for row in rows {
    acc.add(row);
  }
  acc
}

/// Totals keyed by user id.
pub fn by_user(rows: &[Report]) -> BTreeMap<Uuid, Totals> {
  let mut map = BTreeMap::new();
  for row in rows {
    map.entry(row.user_id).or_insert_with(Totals::default).add(row);
  }
  map
}

/// Totals keyed by role. Rows whose user has no known role are skipped.
pub fn by_role(
  rows: &[Report],
  roles: &HashMap<Uuid, Role>,
) -> BTreeMap<Role, Totals> {
  let mut map = BTreeMap::new();
  for row in rows {
    let Some(role) = roles.get(&row.user_id) else {
      continue;
    };
    map.entry(*role).or_insert_with(Totals::default).add(row);
  }
  map
}

/// Totals keyed by week or month start date.
pub fn by_bucket(rows: &[Report], bucket: Bucket) -> BTreeMap<NaiveDate, Totals> {
  let mut map = BTreeMap::new();
  for row in rows {
    map
      .entry(bucket.key(row.report_date))
      .or_insert_with(Totals::default)
      .add(row);
  }
  map
}
