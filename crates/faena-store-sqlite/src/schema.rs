//! SQL schema for the Faena SQLite store.
//!
//! The base DDL is idempotent (`CREATE TABLE IF NOT EXISTS`) and is
//! executed on every open, followed by [`RECONCILE_COLUMNS`] — the
//! forward-only, additive migration list. Columns introduced after the
//! first release are NOT in the base DDL: they are added by reconcile so
//! that a database created by any older version (or restored from any
//! backup) gains them without data loss. Never drop or rename here.

/// Base schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS clients (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS site_contracts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id  INTEGER NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
    name       TEXT NOT NULL,
    start_date TEXT,
    end_date   TEXT,
    file_path  TEXT,
    sha256     TEXT,
    created_at TEXT
);

CREATE TABLE IF NOT EXISTS sites (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id   INTEGER NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
    contract_id INTEGER REFERENCES site_contracts(id) ON DELETE SET NULL,
    name        TEXT NOT NULL,
    location    TEXT NOT NULL DEFAULT '',
    start_date  TEXT NOT NULL,
    end_date    TEXT,
    status      TEXT NOT NULL CHECK(status IN ('ACTIVE','FINISHED'))
);

CREATE TABLE IF NOT EXISTS site_annexes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id    INTEGER NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    file_path  TEXT NOT NULL,
    sha256     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS workers (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    natural_id   TEXT NOT NULL UNIQUE,
    given_names  TEXT NOT NULL,
    family_names TEXT NOT NULL,
    job_title    TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS assignments (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id        INTEGER NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    worker_id      INTEGER NOT NULL REFERENCES workers(id) ON DELETE CASCADE,
    site_job_title TEXT NOT NULL DEFAULT '',
    entry_date     TEXT NOT NULL,
    exit_date      TEXT,
    status         TEXT NOT NULL DEFAULT 'ACTIVE'
                   CHECK(status IN ('ACTIVE','CLOSED')),
    UNIQUE(site_id, worker_id)
);

CREATE TABLE IF NOT EXISTS worker_documents (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    worker_id  INTEGER NOT NULL REFERENCES workers(id) ON DELETE CASCADE,
    doc_type   TEXT NOT NULL,
    file_name  TEXT NOT NULL,
    file_path  TEXT NOT NULL,
    sha256     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS company_documents (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_type   TEXT NOT NULL,
    file_name  TEXT NOT NULL,
    file_path  TEXT NOT NULL,
    sha256     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS site_company_documents (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id    INTEGER NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    doc_type   TEXT NOT NULL,
    file_name  TEXT NOT NULL,
    file_path  TEXT NOT NULL,
    sha256     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS export_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id    INTEGER NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    file_path  TEXT NOT NULL,
    sha256     TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS export_history_monthly (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    year_month TEXT NOT NULL,
    file_path  TEXT NOT NULL,
    sha256     TEXT,
    size_bytes INTEGER,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS auto_backup_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    tag        TEXT,
    file_path  TEXT NOT NULL,
    sha256     TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS worker_documents_worker_idx
    ON worker_documents(worker_id);
CREATE INDEX IF NOT EXISTS assignments_site_idx ON assignments(site_id);
CREATE INDEX IF NOT EXISTS sites_start_idx      ON sites(start_date);
";

/// Columns added after the first schema version: `(table, column, type)`.
/// Applied on every open via `PRAGMA table_info` diffing; already-present
/// columns are left untouched.
pub const RECONCILE_COLUMNS: &[(&str, &str, &str)] = &[
  ("workers", "cost_center", "TEXT"),
  ("workers", "email", "TEXT"),
  ("workers", "hired_at", "TEXT"),
  ("workers", "medical_exam_until", "TEXT"),
];
