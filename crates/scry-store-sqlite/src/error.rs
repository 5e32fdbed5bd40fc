//! Error type for `scry-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] scry_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("stats already exist for learner {learner_id} and card {card_id}")]
  Duplicate { learner_id: Uuid, card_id: Uuid },

  #[error("no stats for learner {learner_id} and card {card_id}")]
  StatsNotFound { learner_id: Uuid, card_id: Uuid },

  /// The caller dropped the transaction future before it could commit.
  #[error("transaction cancelled before commit")]
  Cancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
