//! Audit trail types — append-only accountability records for admin actions.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Hard cap on audit-log page size.
pub const MAX_AUDIT_PAGE: usize = 200;

/// The closed action vocabulary, persisted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
  CreateUser,
  UpdateUserProfile,
  ResetPassword,
  DeleteUser,
  CreateGroup,
  UpdateGroup,
  DeleteGroup,
}

impl AuditAction {
  pub fn as_str(self) -> &'static str {
    match self {
      AuditAction::CreateUser        => "CREATE_USER",
      AuditAction::UpdateUserProfile => "UPDATE_USER_PROFILE",
      AuditAction::ResetPassword     => "RESET_PASSWORD",
      AuditAction::DeleteUser        => "DELETE_USER",
      AuditAction::CreateGroup       => "CREATE_GROUP",
      AuditAction::UpdateGroup       => "UPDATE_GROUP",
      AuditAction::DeleteGroup       => "DELETE_GROUP",
    }
  }
}

impl fmt::Display for AuditAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AuditAction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "CREATE_USER"         => Ok(AuditAction::CreateUser),
      "UPDATE_USER_PROFILE" => Ok(AuditAction::UpdateUserProfile),
      "RESET_PASSWORD"      => Ok(AuditAction::ResetPassword),
      "DELETE_USER"         => Ok(AuditAction::DeleteUser),
      "CREATE_GROUP"        => Ok(AuditAction::CreateGroup),
      "UPDATE_GROUP"        => Ok(AuditAction::UpdateGroup),
      "DELETE_GROUP"        => Ok(AuditAction::DeleteGroup),
      other                 => Err(Error::UnknownAuditAction(other.to_string())),
    }
  }
}

/// An audit record as written by a mutation handler. `log_id` and
/// `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
  pub actor_id:    Uuid,
  pub actor_name:  Option<String>,
  pub action:      AuditAction,
  pub target_type: Option<String>,
  pub target_id:   Option<String>,
  pub target_name: Option<String>,
  /// Opaque JSON detail blob; never interpreted by the application.
  pub details:     serde_json::Value,
}

/// A persisted audit record. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
  pub log_id:      Uuid,
  pub created_at:  DateTime<Utc>,
  pub actor_id:    Uuid,
  pub actor_name:  Option<String>,
  pub action:      AuditAction,
  pub target_type: Option<String>,
  pub target_id:   Option<String>,
  pub target_name: Option<String>,
  pub details:     serde_json::Value,
}

/// Filters and pagination for the audit-log reader. Date bounds are
/// inclusive calendar days; `q` is matched case-insensitively against actor
/// name, action, target name, and target type.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
  pub from:   Option<NaiveDate>,
  pub to:     Option<NaiveDate>,
  pub q:      Option<String>,
  pub action: Option<AuditAction>,
  pub limit:  Option<usize>,
  pub offset: usize,
}

impl AuditQuery {
  /// Page size with [`MAX_AUDIT_PAGE`] applied; defaults to 50.
  pub fn page_size(&self) -> usize {
    self.limit.unwrap_or(50).clamp(1, MAX_AUDIT_PAGE)
  }
}
