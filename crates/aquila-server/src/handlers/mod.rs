//! HTTP handlers, one module per resource.

pub mod admin;
pub mod export;
pub mod groups;
pub mod notes;
pub mod reports;
pub mod session;
pub mod stats;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Error;

/// Shared `?from=&to=[&group_id=]` query parameters. Dates arrive as strings
/// so malformed input surfaces as a validation error in the standard JSON
/// shape instead of an axum rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
  pub from:     Option<String>,
  pub to:       Option<String>,
  pub group_id: Option<Uuid>,
}

impl RangeParams {
  /// Parse whichever bounds are present and reject inverted ranges.
  pub fn dates(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), Error> {
    let from = self.from.as_deref().map(|s| parse_date("from", s)).transpose()?;
    let to = self.to.as_deref().map(|s| parse_date("to", s)).transpose()?;
    if let (Some(f), Some(t)) = (from, to)
      && f > t
    {
      return Err(Error::Validation(
        "'from' must not be after 'to'".to_string(),
      ));
    }
    Ok((from, to))
  }

  /// Like [`RangeParams::dates`], but both bounds are mandatory.
  pub fn required_dates(&self) -> Result<(NaiveDate, NaiveDate), Error> {
    let (from, to) = self.dates()?;
    match (from, to) {
      (Some(f), Some(t)) => Ok((f, t)),
      _ => Err(Error::Validation(
        "'from' and 'to' are both required".to_string(),
      )),
    }
  }
}

fn parse_date(field: &str, s: &str) -> Result<NaiveDate, Error> {
  s.parse().map_err(|_| {
    Error::Validation(format!("'{field}' must be an ISO date (YYYY-MM-DD)"))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn open_ended_ranges_are_fine() {
    let params = RangeParams { from: Some("2024-03-01".into()), ..Default::default() };
    let (from, to) = params.dates().unwrap();
    assert_eq!(from, Some("2024-03-01".parse().unwrap()));
    assert_eq!(to, None);
  }

  #[test]
  fn inverted_range_is_rejected() {
    let params = RangeParams {
      from: Some("2024-04-01".into()),
      to:   Some("2024-03-01".into()),
      ..Default::default()
    };
    assert!(matches!(params.dates(), Err(Error::Validation(_))));
  }

  #[test]
  fn malformed_date_is_a_validation_error() {
    let params = RangeParams { from: Some("03/01/2024".into()), ..Default::default() };
    assert!(matches!(params.dates(), Err(Error::Validation(_))));
  }

  #[test]
  fn exports_require_both_bounds() {
    let params = RangeParams { from: Some("2024-03-01".into()), ..Default::default() };
    assert!(matches!(params.required_dates(), Err(Error::Validation(_))));
  }
}
