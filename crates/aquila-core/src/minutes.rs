//! Minute-count clamping, combining, and display formatting.

/// Clamp a possibly-fractional, possibly-negative, possibly-NaN value to a
/// non-negative whole minute count via floor.
pub fn clamp_minutes(value: f64) -> u32 {
  if !value.is_finite() {
    return 0;
  }
  let floored = value.floor();
  if floored <= 0.0 {
    0
  } else if floored >= f64::from(u32::MAX) {
    u32::MAX
  } else {
    floored as u32
  }
}

/// Combine separate hour/minute text inputs into a total minute count.
///
/// Blank input counts as zero; hours are clamped to `[0, 24]` and minutes to
/// `[0, 59]` before combining. Unparseable input clamps to zero.
pub fn combine(hours: &str, minutes: &str) -> u32 {
  let h = clamp_field(hours, 24);
  let m = clamp_field(minutes, 59);
  h * 60 + m
}

fn clamp_field(input: &str, max: u32) -> u32 {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return 0;
  }
  match trimmed.parse::<f64>() {
    Ok(n)  => clamp_minutes(n).min(max),
    Err(_) => 0,
  }
}

/// Split a total minute count back into (hours, minutes).
pub fn split_minutes(total: u32) -> (u32, u32) {
  (total / 60, total % 60)
}

/// Render a minute count as `"{h} h {m} min"`, dropping whichever part is
/// zero. A zero total renders `"0 min"`.
pub fn format_minutes(total: u32) -> String {
  let (h, m) = split_minutes(total);
  if h == 0 {
    format!("{m} min")
  } else if m == 0 {
    format!("{h} h")
  } else {
    format!("{h} h {m} min")
  }
}
