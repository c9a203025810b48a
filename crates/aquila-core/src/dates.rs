//! Calendar bucketing for periodic aggregation.
//!
//! All dates are naive local calendar dates; no timezone conversion is ever
//! performed, so the same `YYYY-MM-DD` string buckets identically everywhere.

use chrono::{Datelike, Days, NaiveDate};

/// The Monday that starts `date`'s week. Weeks run Monday–Sunday, so a
/// Sunday maps to the Monday six days prior.
pub fn week_start(date: NaiveDate) -> NaiveDate {
  let back = u64::from(date.weekday().num_days_from_monday());
  // Subtracting at most six days from a valid date cannot underflow chrono's
  // supported range in practice; fall back to the date itself if it somehow
  // does.
  date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// The first day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}
