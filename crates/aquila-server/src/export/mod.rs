//! Report export rendering.
//!
//! The handlers assemble an [`ExportDocument`] (already authorized and
//! date-ranged); the format modules turn it into bytes. Rows render in the
//! order given — chronologically ascending from the store — and no format
//! re-sorts them.

pub mod csv;
pub mod pdf;
pub mod xlsx;

use aquila_core::profile::Role;
use chrono::NaiveDate;

/// Column headers shared by every format.
pub const COLUMNS: [&str; 7] = [
  "date",
  "name",
  "role",
  "group",
  "bible_minutes",
  "prayer_minutes",
  "total_minutes",
];

/// One report row joined with its owner's profile metadata.
#[derive(Debug, Clone)]
pub struct ExportRow {
  pub date:           NaiveDate,
  pub name:           String,
  pub role:           Role,
  pub group:          String,
  pub bible_minutes:  u32,
  pub prayer_minutes: u32,
}

impl ExportRow {
  pub fn total_minutes(&self) -> u32 {
    self.bible_minutes + self.prayer_minutes
  }
}

/// A fully-gathered export, ready to render.
#[derive(Debug, Clone)]
pub struct ExportDocument {
  pub from: NaiveDate,
  pub to:   NaiveDate,
  pub rows: Vec<ExportRow>,
}

impl ExportDocument {
  pub fn title(&self) -> String {
    format!("Activity reports {} to {}", self.from, self.to)
  }

  /// Summed (bible, prayer) minutes across all rows.
  pub fn totals(&self) -> (u64, u64) {
    self.rows.iter().fold((0, 0), |(b, p), row| {
      (b + u64::from(row.bible_minutes), p + u64::from(row.prayer_minutes))
    })
  }

  /// `reports-{from}-{to}.{ext}`, restricted to filename-safe characters.
  pub fn filename(&self, ext: &str) -> String {
    let raw = format!("reports-{}-{}.{ext}", self.from, self.to);
    raw
      .chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
          c
        } else {
          '_'
        }
      })
      .collect()
  }
}
