//! SQL schema for the smsflow SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id              TEXT PRIMARY KEY,
    phone_number         TEXT NOT NULL,
    active               INTEGER NOT NULL DEFAULT 1,
    onboarding_completed INTEGER NOT NULL DEFAULT 0,
    alias                TEXT,
    age                  TEXT,
    postal_code          TEXT,
    created_at           TEXT NOT NULL   -- ISO 8601 UTC
);

-- Messages are strictly append-only.
CREATE TABLE IF NOT EXISTS messages (
    message_id         TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL REFERENCES users(user_id),
    sms_message_sid    TEXT,
    body               TEXT NOT NULL,
    sms_status         TEXT,
    to_number          TEXT,
    to_postal_code     TEXT,
    to_city            TEXT,
    to_country         TEXT,
    from_number        TEXT NOT NULL,
    from_postal_code   TEXT,
    from_city          TEXT,
    from_country       TEXT,
    media_url          TEXT,
    media_content_type TEXT,
    received_at        TEXT NOT NULL
);

-- State snapshots are strictly append-only; the highest seq per user is the
-- current state.
CREATE TABLE IF NOT EXISTS user_states (
    seq                  INTEGER PRIMARY KEY AUTOINCREMENT,
    state_id             TEXT NOT NULL UNIQUE,
    user_id              TEXT NOT NULL REFERENCES users(user_id),
    last_question        INTEGER,        -- NULL = not started, -1 = complete
    message              TEXT NOT NULL,
    onboarding_completed INTEGER NOT NULL,
    recorded_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_phone_idx        ON users(phone_number, active);
CREATE INDEX IF NOT EXISTS messages_user_idx      ON messages(user_id);
CREATE INDEX IF NOT EXISTS user_states_user_idx   ON user_states(user_id, seq);

PRAGMA user_version = 1;
";
