//! The learner's self-reported recall quality for a single review.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// One of exactly four review outcomes. Anything else is rejected with
/// [`Error::InvalidOutcome`]; there is no fallback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
  /// Forgotten; the card lapses and is retried shortly.
  Again,
  Hard,
  Good,
  Easy,
}

impl ReviewOutcome {
  pub const ALL: [ReviewOutcome; 4] =
    [Self::Again, Self::Hard, Self::Good, Self::Easy];

  /// The lowercase wire/storage name.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Again => "again",
      Self::Hard => "hard",
      Self::Good => "good",
      Self::Easy => "easy",
    }
  }
}

impl fmt::Display for ReviewOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ReviewOutcome {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "again" => Ok(Self::Again),
      "hard" => Ok(Self::Hard),
      "good" => Ok(Self::Good),
      "easy" => Ok(Self::Easy),
      other => Err(Error::InvalidOutcome(other.to_owned())),
    }
  }
}
