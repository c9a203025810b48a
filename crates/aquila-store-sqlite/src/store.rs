//! [`SqliteStore`] — the SQLite implementation of [`IdentityStore`] and
//! [`ActivityStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use aquila_core::{
  audit::{AuditLogEntry, AuditQuery, NewAuditEntry},
  profile::{Group, Profile, YouthNote},
  report::Report,
  store::{Account, ActivityStore, IdentityStore, ReportQuery},
};

use crate::{
  Error, Result,
  encode::{
    RawAccount, RawAuditEntry, RawNote, RawProfile, RawReport, encode_date,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Aquila store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn create_account(
    &self,
    email: String,
    password_hash: String,
  ) -> Result<Option<Account>> {
    let account = Account {
      account_id: Uuid::new_v4(),
      email,
      password_hash,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(account.account_id);
    let email_str = account.email.clone();
    let hash = account.password_hash.clone();
    let at_str = encode_dt(account.created_at);

    let taken: Option<String> = self
      .conn
      .call(move |conn| {
        let existing: Option<String> = conn
          .query_row(
            "SELECT email FROM accounts WHERE email = ?1",
            rusqlite::params![email_str],
            |r| r.get(0),
          )
          .optional()?;

        if existing.is_none() {
          conn.execute(
            "INSERT INTO accounts (account_id, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id_str, email_str, hash, at_str],
          )?;
        }
        Ok(existing)
      })
      .await?;

    match taken {
      Some(_) => Ok(None),
      None    => Ok(Some(account)),
    }
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT account_id, email, password_hash, created_at
             FROM accounts WHERE account_id = ?1",
            rusqlite::params![id_str],
            |r| {
              Ok(RawAccount {
                account_id:    r.get(0)?,
                email:         r.get(1)?,
                password_hash: r.get(2)?,
                created_at:    r.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_account_by_email(&self, email: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT account_id, email, password_hash, created_at
             FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |r| {
              Ok(RawAccount {
                account_id:    r.get(0)?,
                email:         r.get(1)?,
                password_hash: r.get(2)?,
                created_at:    r.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn update_password(&self, id: Uuid, password_hash: String) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE accounts SET password_hash = ?2 WHERE account_id = ?1",
          rusqlite::params![id_str, password_hash],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AccountNotFound(id));
    }
    Ok(())
  }

  async fn delete_account(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE account_id = ?1",
          rusqlite::params![id_str],
        )?;
        conn.execute(
          "DELETE FROM accounts WHERE account_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn create_session(
    &self,
    token_hash: String,
    account_id: Uuid,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let account_str = encode_uuid(account_id);
    let expires_str = encode_dt(expires_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO sessions (token_hash, account_id, expires_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, account_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn resolve_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> Result<Option<Uuid>> {
    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT account_id, expires_at FROM sessions WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    let Some((account_str, expires_str)) = raw else {
      return Ok(None);
    };

    let expires_at = crate::encode::decode_dt(&expires_str)?;
    if expires_at <= now {
      return Ok(None);
    }
    Ok(Some(crate::encode::decode_uuid(&account_str)?))
  }

  async fn revoke_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn revoke_sessions_for_account(&self, account_id: Uuid) -> Result<()> {
    let account_str = encode_uuid(account_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE account_id = ?1",
          rusqlite::params![account_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ActivityStore impl ──────────────────────────────────────────────────────

impl ActivityStore for SqliteStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn insert_profile(&self, profile: Profile) -> Result<()> {
    let id_str = encode_uuid(profile.id);
    let role_str = profile.role.as_str();
    let group_str = profile.group_id.map(encode_uuid);
    let name = profile.name;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (profile_id, name, role, group_id)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, role_str, group_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT profile_id, name, role, group_id
             FROM profiles WHERE profile_id = ?1",
            rusqlite::params![id_str],
            |r| {
              Ok(RawProfile {
                profile_id: r.get(0)?,
                name:       r.get(1)?,
                role:       r.get(2)?,
                group_id:   r.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn list_profiles(&self, group_id: Option<Uuid>) -> Result<Vec<Profile>> {
    let group_str = group_id.map(encode_uuid);
    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        // Bound values are owned Strings so the statement can outlive the
        // match arm that produced them.
        let (sql, params): (&str, Vec<String>) = match group_str {
          Some(g) => (
            "SELECT profile_id, name, role, group_id FROM profiles
             WHERE group_id = ?1 ORDER BY name",
            vec![g],
          ),
          None => (
            "SELECT profile_id, name, role, group_id FROM profiles
             ORDER BY name",
            Vec::new(),
          ),
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |r| {
            Ok(RawProfile {
              profile_id: r.get(0)?,
              name:       r.get(1)?,
              role:       r.get(2)?,
              group_id:   r.get(3)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn update_profile_name(&self, id: Uuid, name: String) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE profiles SET name = ?2 WHERE profile_id = ?1 AND name != ?2",
          rusqlite::params![id_str, name],
        )?;
        Ok(n)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_profile(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM profiles WHERE profile_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn create_group(&self, name: String) -> Result<Group> {
    let group = Group { group_id: Uuid::new_v4(), name };
    let id_str = encode_uuid(group.group_id);
    let name_str = group.name.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO groups (group_id, name) VALUES (?1, ?2)",
          rusqlite::params![id_str, name_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(group)
  }

  async fn get_group(&self, id: Uuid) -> Result<Option<Group>> {
    let id_str = encode_uuid(id);
    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT group_id, name FROM groups WHERE group_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    match raw {
      Some((id_str, name)) => Ok(Some(Group {
        group_id: crate::encode::decode_uuid(&id_str)?,
        name,
      })),
      None => Ok(None),
    }
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    let raws: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT group_id, name FROM groups ORDER BY name")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id_str, name)| {
        Ok(Group { group_id: crate::encode::decode_uuid(&id_str)?, name })
      })
      .collect()
  }

  async fn update_group_name(&self, id: Uuid, name: String) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE groups SET name = ?2 WHERE group_id = ?1 AND name != ?2",
          rusqlite::params![id_str, name],
        )?;
        Ok(n)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_group(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        // Unassign members first so no profile is left pointing at a
        // deleted group.
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE profiles SET group_id = NULL WHERE group_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM groups WHERE group_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn upsert_report(&self, report: Report) -> Result<Report> {
    let user_str = encode_uuid(report.user_id);
    let date_str = encode_date(report.report_date);
    let bible = i64::from(report.bible_minutes);
    let prayer = i64::from(report.prayer_minutes);

    let raw: RawReport = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reports (user_id, report_date, bible_minutes, prayer_minutes)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (user_id, report_date) DO UPDATE SET
             bible_minutes  = excluded.bible_minutes,
             prayer_minutes = excluded.prayer_minutes",
          rusqlite::params![user_str, date_str, bible, prayer],
        )?;
        let row = conn.query_row(
          "SELECT user_id, report_date, bible_minutes, prayer_minutes
           FROM reports WHERE user_id = ?1 AND report_date = ?2",
          rusqlite::params![user_str, date_str],
          |r| {
            Ok(RawReport {
              user_id:        r.get(0)?,
              report_date:    r.get(1)?,
              bible_minutes:  r.get(2)?,
              prayer_minutes: r.get(3)?,
            })
          },
        )?;
        Ok(row)
      })
      .await?;

    raw.into_report()
  }

  async fn get_report(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Report>> {
    let user_str = encode_uuid(user_id);
    let date_str = encode_date(date);
    let raw: Option<RawReport> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT user_id, report_date, bible_minutes, prayer_minutes
             FROM reports WHERE user_id = ?1 AND report_date = ?2",
            rusqlite::params![user_str, date_str],
            |r| {
              Ok(RawReport {
                user_id:        r.get(0)?,
                report_date:    r.get(1)?,
                bible_minutes:  r.get(2)?,
                prayer_minutes: r.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawReport::into_report).transpose()
  }

  async fn list_reports(&self, query: ReportQuery) -> Result<Vec<Report>> {
    // Build the WHERE clause from whichever filters are present. All bound
    // values are strings, so one homogeneous param vector suffices.
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(user_id) = query.user_id {
      params.push(encode_uuid(user_id));
      clauses.push(format!("r.user_id = ?{}", params.len()));
    }
    if let Some(group_id) = query.group_id {
      params.push(encode_uuid(group_id));
      clauses.push(format!("p.group_id = ?{}", params.len()));
    }
    if let Some(from) = query.from {
      params.push(encode_date(from));
      clauses.push(format!("r.report_date >= ?{}", params.len()));
    }
    if let Some(to) = query.to {
      params.push(encode_date(to));
      clauses.push(format!("r.report_date <= ?{}", params.len()));
    }

    let where_sql = if clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
      "SELECT r.user_id, r.report_date, r.bible_minutes, r.prayer_minutes
       FROM reports r
       JOIN profiles p ON p.profile_id = r.user_id
       {where_sql}
       ORDER BY r.report_date, r.user_id"
    );

    let raws: Vec<RawReport> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |r| {
            Ok(RawReport {
              user_id:        r.get(0)?,
              report_date:    r.get(1)?,
              bible_minutes:  r.get(2)?,
              prayer_minutes: r.get(3)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn delete_reports_for_user(&self, user_id: Uuid) -> Result<()> {
    let user_str = encode_uuid(user_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM reports WHERE user_id = ?1",
          rusqlite::params![user_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Youth notes ───────────────────────────────────────────────────────────

  async fn add_note(
    &self,
    youth_id: Uuid,
    author_id: Uuid,
    note: String,
  ) -> Result<YouthNote> {
    let record = YouthNote {
      note_id: Uuid::new_v4(),
      youth_id,
      author_id,
      note,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(record.note_id);
    let youth_str = encode_uuid(record.youth_id);
    let author_str = encode_uuid(record.author_id);
    let note_str = record.note.clone();
    let at_str = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO youth_notes (note_id, youth_id, author_id, note, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, youth_str, author_str, note_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(record)
  }

  async fn list_notes(&self, youth_id: Uuid, limit: usize) -> Result<Vec<YouthNote>> {
    let youth_str = encode_uuid(youth_id);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let raws: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT note_id, youth_id, author_id, note, created_at
           FROM youth_notes WHERE youth_id = ?1
           ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![youth_str, limit], |r| {
            Ok(RawNote {
              note_id:    r.get(0)?,
              youth_id:   r.get(1)?,
              author_id:  r.get(2)?,
              note:       r.get(3)?,
              created_at: r.get(4)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  async fn delete_notes_for_user(&self, user_id: Uuid) -> Result<()> {
    let user_str = encode_uuid(user_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM youth_notes WHERE youth_id = ?1 OR author_id = ?1",
          rusqlite::params![user_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Audit trail ───────────────────────────────────────────────────────────

  async fn append_audit(&self, entry: NewAuditEntry) -> Result<()> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());
    let actor_str = encode_uuid(entry.actor_id);
    let action_str = entry.action.as_str();
    let details = serde_json::to_string(&entry.details)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_logs (
             log_id, created_at, actor_id, actor_name, action,
             target_type, target_id, target_name, details
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            at_str,
            actor_str,
            entry.actor_name,
            action_str,
            entry.target_type,
            entry.target_id,
            entry.target_name,
            details,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_audit(&self, query: AuditQuery) -> Result<(Vec<AuditLogEntry>, u64)> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(from) = query.from {
      params.push(format!("{}T00:00:00", encode_date(from)));
      clauses.push(format!("created_at >= ?{}", params.len()));
    }
    if let Some(to) = query.to {
      // Inclusive day bound: strictly before the following midnight.
      let next = to.succ_opt().unwrap_or(to);
      params.push(format!("{}T00:00:00", encode_date(next)));
      clauses.push(format!("created_at < ?{}", params.len()));
    }
    if let Some(action) = query.action {
      params.push(action.as_str().to_string());
      clauses.push(format!("action = ?{}", params.len()));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
      let pattern = format!("%{}%", q.to_lowercase().replace('%', "\\%"));
      params.push(pattern);
      let n = params.len();
      clauses.push(format!(
        "(lower(coalesce(actor_name, '')) LIKE ?{n} ESCAPE '\\'
          OR lower(action) LIKE ?{n} ESCAPE '\\'
          OR lower(coalesce(target_name, '')) LIKE ?{n} ESCAPE '\\'
          OR lower(coalesce(target_type, '')) LIKE ?{n} ESCAPE '\\')"
      ));
    }

    let where_sql = if clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", clauses.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM audit_logs {where_sql}");
    let page_sql = format!(
      "SELECT log_id, created_at, actor_id, actor_name, action,
              target_type, target_id, target_name, details
       FROM audit_logs {where_sql}
       ORDER BY created_at DESC
       LIMIT {} OFFSET {}",
      query.page_size(),
      query.offset,
    );

    let (raws, count): (Vec<RawAuditEntry>, i64) = self
      .conn
      .call(move |conn| {
        let count: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let mut stmt = conn.prepare(&page_sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |r| {
            Ok(RawAuditEntry {
              log_id:      r.get(0)?,
              created_at:  r.get(1)?,
              actor_id:    r.get(2)?,
              actor_name:  r.get(3)?,
              action:      r.get(4)?,
              target_type: r.get(5)?,
              target_id:   r.get(6)?,
              target_name: r.get(7)?,
              details:     r.get(8)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((rows, count))
      })
      .await?;

    let entries = raws
      .into_iter()
      .map(RawAuditEntry::into_entry)
      .collect::<Result<Vec<_>>>()?;
    Ok((entries, count.max(0) as u64))
  }
}
