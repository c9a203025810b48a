//! The `IdentityStore` and `ActivityStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `aquila-store-sqlite`). The server depends on these abstractions, not on
//! any concrete backend.
//!
//! Identity (credentials, sessions) and activity (profiles, groups, reports,
//! notes, audit) are two deliberately separate traits: in production-shaped
//! deployments they are two different systems, and cross-store mutations are
//! choreographed with compensating actions rather than transactions.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  audit::{AuditLogEntry, AuditQuery, NewAuditEntry},
  profile::{Group, Profile, YouthNote},
  report::Report,
};

// ─── Identity types ──────────────────────────────────────────────────────────

/// A credential record. Shares its UUID with the profile it backs.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
  pub account_id:    Uuid,
  pub email:         String,
  /// Argon2 PHC string; never serialised to clients.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Filters for [`ActivityStore::list_reports`]. All fields are conjunctive;
/// results are ordered by `report_date` ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportQuery {
  pub user_id:  Option<Uuid>,
  /// Restrict to users whose profile belongs to this group.
  pub group_id: Option<Uuid>,
  /// Inclusive lower date bound.
  pub from:     Option<NaiveDate>,
  /// Inclusive upper date bound.
  pub to:       Option<NaiveDate>,
}

// ─── Identity store ──────────────────────────────────────────────────────────

/// Abstraction over the credential/session system.
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Provision a credential. Returns `None` if the email is already taken.
  /// The uniqueness check and the insert are atomic in the backend.
  fn create_account(
    &self,
    email: String,
    password_hash: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn find_account_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Replace the stored password hash. Errors if the account is unknown.
  fn update_password(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a credential. Idempotent: deleting an absent account succeeds,
  /// so the compensating-action sequences in the server can retry safely.
  fn delete_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Persist a bearer session keyed by the token's digest.
  fn create_session(
    &self,
    token_hash: String,
    account_id: Uuid,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token digest to its account, treating expired rows as absent.
  fn resolve_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  /// Revoke one session. Idempotent.
  fn revoke_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Revoke every session belonging to an account (used on deletion and
  /// password reset).
  fn revoke_sessions_for_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Activity store ──────────────────────────────────────────────────────────

/// Abstraction over the application data store. Applies no authorization —
/// that is the caller's job, via [`crate::policy::authorize`], before the
/// query is issued.
pub trait ActivityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn insert_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// List profiles, optionally restricted to one group.
  fn list_profiles(
    &self,
    group_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Rename a profile. Returns `true` only if a row actually changed, so
  /// callers can audit real state changes and skip no-ops.
  fn update_profile_name(
    &self,
    id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove a profile. Idempotent.
  fn delete_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  fn create_group(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  /// Rename a group. Returns `true` only if a row actually changed.
  fn update_group_name(
    &self,
    id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a group, first nulling `group_id` on every member profile so no
  /// dangling reference survives.
  fn delete_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Create-or-replace the report for `(report.user_id, report.report_date)`
  /// and return the stored row. Submitting the same pair twice leaves
  /// exactly one row.
  fn upsert_report(
    &self,
    report: Report,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  fn get_report(
    &self,
    user_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Report>, Self::Error>> + Send + '_;

  fn list_reports(
    &self,
    query: ReportQuery,
  ) -> impl Future<Output = Result<Vec<Report>, Self::Error>> + Send + '_;

  /// Remove every report belonging to a user. Idempotent.
  fn delete_reports_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Youth notes ───────────────────────────────────────────────────────

  fn add_note(
    &self,
    youth_id: Uuid,
    author_id: Uuid,
    note: String,
  ) -> impl Future<Output = Result<YouthNote, Self::Error>> + Send + '_;

  /// Notes for one youth, newest first, capped at `limit`.
  fn list_notes(
    &self,
    youth_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<YouthNote>, Self::Error>> + Send + '_;

  /// Remove every note attached to or authored by a user. Idempotent.
  fn delete_notes_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Audit trail ───────────────────────────────────────────────────────

  /// Append an audit record. The store assigns id and timestamp.
  fn append_audit(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Filtered audit page, newest first, plus the total count for the
  /// filtered set (not just the page).
  fn query_audit(
    &self,
    query: AuditQuery,
  ) -> impl Future<Output = Result<(Vec<AuditLogEntry>, u64), Self::Error>> + Send + '_;
}
