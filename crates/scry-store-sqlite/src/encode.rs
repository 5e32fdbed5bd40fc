//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Stats bookkeeping timestamps are stored as RFC 3339 strings. Timestamps
//! that take part in due-date filtering (`next_review_at`, card creation) are
//! stored as Unix microseconds so they compare numerically. UUIDs are stored
//! as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use scry_core::{card::Card, stats::LearnerCardStats};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_micros(dt: DateTime<Utc>) -> i64 { dt.timestamp_micros() }

pub fn decode_micros(us: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_micros(us)
    .ok_or_else(|| Error::DateParse(format!("timestamp out of range: {us}")))
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// A `cards` row as read from SQLite, before decoding.
pub struct RawCard {
  pub card_id:    String,
  pub owner_id:   String,
  pub content:    String,
  pub created_at: i64,
  pub updated_at: i64,
}

impl RawCard {
  pub const COLUMNS: &'static str =
    "card_id, owner_id, content, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      card_id:    row.get(0)?,
      owner_id:   row.get(1)?,
      content:    row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
    })
  }

  pub fn into_card(self) -> Result<Card> {
    Ok(Card {
      card_id:    decode_uuid(&self.card_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      content:    serde_json::from_str(&self.content)?,
      created_at: decode_micros(self.created_at)?,
      updated_at: decode_micros(self.updated_at)?,
    })
  }
}

/// A `learner_card_stats` row as read from SQLite, before decoding.
pub struct RawStats {
  pub learner_id:          String,
  pub card_id:             String,
  pub interval:            u32,
  pub ease_factor:         f64,
  pub consecutive_correct: u32,
  pub last_reviewed_at:    Option<String>,
  pub next_review_at:      i64,
  pub review_count:        u32,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawStats {
  pub const COLUMNS: &'static str = "learner_id, card_id, interval_days, \
    ease_factor, consecutive_correct, last_reviewed_at, next_review_at, \
    review_count, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      learner_id:          row.get(0)?,
      card_id:             row.get(1)?,
      interval:            row.get(2)?,
      ease_factor:         row.get(3)?,
      consecutive_correct: row.get(4)?,
      last_reviewed_at:    row.get(5)?,
      next_review_at:      row.get(6)?,
      review_count:        row.get(7)?,
      created_at:          row.get(8)?,
      updated_at:          row.get(9)?,
    })
  }

  pub fn into_stats(self) -> Result<LearnerCardStats> {
    Ok(LearnerCardStats {
      learner_id:          decode_uuid(&self.learner_id)?,
      card_id:             decode_uuid(&self.card_id)?,
      interval:            self.interval,
      ease_factor:         self.ease_factor,
      consecutive_correct: self.consecutive_correct,
      last_reviewed_at:    self
        .last_reviewed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      next_review_at:      decode_micros(self.next_review_at)?,
      review_count:        self.review_count,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}
