//! SQL schema for the Scry SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS cards (
    card_id     TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    content     TEXT NOT NULL,     -- opaque JSON
    created_at  INTEGER NOT NULL,  -- Unix microseconds; unreviewed cards are due from here
    updated_at  INTEGER NOT NULL
);

-- One row per (learner, card), created on the first review.
CREATE TABLE IF NOT EXISTS learner_card_stats (
    learner_id          TEXT    NOT NULL,
    card_id             TEXT    NOT NULL REFERENCES cards(card_id) ON DELETE CASCADE,
    interval_days       INTEGER NOT NULL CHECK (interval_days >= 0),
    ease_factor         REAL    NOT NULL CHECK (ease_factor > 1.0),
    consecutive_correct INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at    TEXT,              -- NULL until first review
    next_review_at      INTEGER NOT NULL,  -- Unix microseconds, compared numerically
    review_count        INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT    NOT NULL,
    updated_at          TEXT    NOT NULL,
    PRIMARY KEY (learner_id, card_id)
);

CREATE INDEX IF NOT EXISTS cards_owner_idx ON cards(owner_id);
CREATE INDEX IF NOT EXISTS stats_due_idx   ON learner_card_stats(learner_id, next_review_at);

PRAGMA user_version = 1;
";
