//! Profiles, roles, groups, and youth notes.
//!
//! A profile is the application-level identity record; the credential that
//! backs it lives in the identity store (see [`crate::store::IdentityStore`])
//! and shares its UUID.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// What a user may see and mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Youth,
  Leader,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Youth  => "youth",
      Role::Leader => "leader",
      Role::Admin  => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "youth"  => Ok(Role::Youth),
      "leader" => Ok(Role::Leader),
      "admin"  => Ok(Role::Admin),
      other    => Err(Error::UnknownRole(other.to_string())),
    }
  }
}

/// A user's application-level identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:       Uuid,
  pub name:     String,
  pub role:     Role,
  pub group_id: Option<Uuid>,
}

/// An organizational bucket of youth members.
///
/// Group names are not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub group_id: Uuid,
  pub name:     String,
}

/// A free-text note attached to a youth profile by a leader or admin.
/// Notes are append-only; they are never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouthNote {
  pub note_id:    Uuid,
  pub youth_id:   Uuid,
  pub author_id:  Uuid,
  pub note:       String,
  pub created_at: DateTime<Utc>,
}
