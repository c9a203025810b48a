//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`,
//! UUIDs as hyphenated lowercase strings, and audit details as compact JSON.

use aquila_core::{
  audit::{AuditAction, AuditLogEntry},
  profile::{Profile, Role, YouthNote},
  report::Report,
  store::Account,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse().map_err(|_| Error::DateParse(format!("bad date: {s:?}")))
}

// ─── Role / AuditAction ───────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

pub fn decode_action(s: &str) -> Result<AuditAction> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub profile_id: String,
  pub name:       String,
  pub role:       String,
  pub group_id:   Option<String>,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:       decode_uuid(&self.profile_id)?,
      name:     self.name,
      role:     decode_role(&self.role)?,
      group_id: self.group_id.as_deref().map(decode_uuid).transpose()?,
    })
  }
}

/// Raw strings read directly from a `reports` row. NULL minutes read as zero
/// rather than erroring.
pub struct RawReport {
  pub user_id:        String,
  pub report_date:    String,
  pub bible_minutes:  Option<i64>,
  pub prayer_minutes: Option<i64>,
}

impl RawReport {
  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      user_id:        decode_uuid(&self.user_id)?,
      report_date:    decode_date(&self.report_date)?,
      bible_minutes:  clamp_minutes_column(self.bible_minutes),
      prayer_minutes: clamp_minutes_column(self.prayer_minutes),
    })
  }
}

fn clamp_minutes_column(v: Option<i64>) -> u32 {
  v.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `youth_notes` row.
pub struct RawNote {
  pub note_id:    String,
  pub youth_id:   String,
  pub author_id:  String,
  pub note:       String,
  pub created_at: String,
}

impl RawNote {
  pub fn into_note(self) -> Result<YouthNote> {
    Ok(YouthNote {
      note_id:    decode_uuid(&self.note_id)?,
      youth_id:   decode_uuid(&self.youth_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      note:       self.note,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `audit_logs` row.
pub struct RawAuditEntry {
  pub log_id:      String,
  pub created_at:  String,
  pub actor_id:    String,
  pub actor_name:  Option<String>,
  pub action:      String,
  pub target_type: Option<String>,
  pub target_id:   Option<String>,
  pub target_name: Option<String>,
  pub details:     String,
}

impl RawAuditEntry {
  pub fn into_entry(self) -> Result<AuditLogEntry> {
    Ok(AuditLogEntry {
      log_id:      decode_uuid(&self.log_id)?,
      created_at:  decode_dt(&self.created_at)?,
      actor_id:    decode_uuid(&self.actor_id)?,
      actor_name:  self.actor_name,
      action:      decode_action(&self.action)?,
      target_type: self.target_type,
      target_id:   self.target_id,
      target_name: self.target_name,
      details:     serde_json::from_str(&self.details)?,
    })
  }
}
