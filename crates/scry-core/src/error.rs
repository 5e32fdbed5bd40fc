//! Error types for `scry-core`.

use thiserror::Error;

/// Validation failures raised by the scheduling layer. None of these ever
/// touch storage; they are detected before any I/O.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  #[error("invalid review outcome: {0:?}")]
  InvalidOutcome(String),

  #[error("postpone days must be at least 1, got {0}")]
  InvalidDays(i64),

  #[error("invalid stats: {0}")]
  InvalidStats(&'static str),

  #[error("invalid scheduling parameters: {0}")]
  InvalidParams(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
