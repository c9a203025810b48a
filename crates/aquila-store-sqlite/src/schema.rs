//! SQL schema for the Aquila SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identity tables. Stand-in for the hosted identity provider; the activity
-- tables below never join against them.
CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,   -- sha256 hex of the bearer token
    account_id TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    group_id TEXT PRIMARY KEY,
    name     TEXT NOT NULL         -- names may repeat
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id TEXT PRIMARY KEY,   -- equals the owning account_id
    name       TEXT NOT NULL,
    role       TEXT NOT NULL,      -- 'youth' | 'leader' | 'admin'
    group_id   TEXT REFERENCES groups(group_id)
);

-- One row per (user, calendar date); writes are upserts keyed on that pair.
CREATE TABLE IF NOT EXISTS reports (
    user_id        TEXT NOT NULL REFERENCES profiles(profile_id),
    report_date    TEXT NOT NULL,  -- ISO YYYY-MM-DD
    bible_minutes  INTEGER,        -- NULL reads as zero
    prayer_minutes INTEGER,
    UNIQUE (user_id, report_date)
);

-- Notes are append-only; no UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS youth_notes (
    note_id    TEXT PRIMARY KEY,
    youth_id   TEXT NOT NULL REFERENCES profiles(profile_id),
    author_id  TEXT NOT NULL,
    note       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Audit records are append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_logs (
    log_id      TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,     -- ISO 8601 UTC; server-assigned
    actor_id    TEXT NOT NULL,
    actor_name  TEXT,
    action      TEXT NOT NULL,     -- closed AuditAction vocabulary, verbatim
    target_type TEXT,
    target_id   TEXT,
    target_name TEXT,
    details     TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS reports_user_idx    ON reports(user_id);
CREATE INDEX IF NOT EXISTS reports_date_idx    ON reports(report_date);
CREATE INDEX IF NOT EXISTS profiles_group_idx  ON profiles(group_id);
CREATE INDEX IF NOT EXISTS notes_youth_idx     ON youth_notes(youth_id);
CREATE INDEX IF NOT EXISTS audit_created_idx   ON audit_logs(created_at);
CREATE INDEX IF NOT EXISTS sessions_account_idx ON sessions(account_id);

PRAGMA user_version = 1;
";
