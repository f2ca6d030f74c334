//! SQL schema for the cohort SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id                  TEXT PRIMARY KEY,
    username            TEXT NOT NULL UNIQUE,
    avatar              TEXT,
    bg_color            TEXT,
    is_column_challenge INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL     -- RFC 3339 UTC
);

-- One row per (user, day, kind); writes are upserts on that key.
CREATE TABLE IF NOT EXISTS journals (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    date       TEXT NOT NULL,             -- YYYY-MM-DD
    type       TEXT NOT NULL,             -- 'journal' | 'account' | 'thread' | 'mate' | 'column'
    link       TEXT NOT NULL DEFAULT 'completed',
    amount     INTEGER,                   -- account only
    created_at TEXT NOT NULL,
    UNIQUE (user_id, date, type)
);

CREATE INDEX IF NOT EXISTS journals_date_idx ON journals(date);

PRAGMA user_version = 1;
";
