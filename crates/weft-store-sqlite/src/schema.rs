//! SQL schema for the weft SQLite journal.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- The deployment: who owns every registry initially, and under which policy.
-- Written once, on first open.
CREATE TABLE IF NOT EXISTS genesis (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    deployer    TEXT    NOT NULL,
    config_json TEXT    NOT NULL,
    hash        TEXT    NOT NULL
);

-- Every committed command, hash-chained to its predecessor.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS journal (
    seq          INTEGER PRIMARY KEY,
    caller       TEXT    NOT NULL,
    at           INTEGER NOT NULL,   -- unix seconds; execution-context time
    operation    TEXT    NOT NULL,   -- Operation discriminant, for querying
    command_json TEXT    NOT NULL,
    prev_hash    TEXT    NOT NULL,
    entry_hash   TEXT    NOT NULL UNIQUE
);

CREATE TRIGGER IF NOT EXISTS journal_no_update
BEFORE UPDATE ON journal
BEGIN
    SELECT RAISE(ABORT, 'journal is append-only');
END;

CREATE TRIGGER IF NOT EXISTS journal_no_delete
BEFORE DELETE ON journal
BEGIN
    SELECT RAISE(ABORT, 'journal is append-only');
END;

CREATE INDEX IF NOT EXISTS journal_operation_idx ON journal(operation);

PRAGMA user_version = 1;
";
