//! [`Scheduler`], the validating façade over the scheduling algorithm.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result, algorithm, outcome::ReviewOutcome, params::Params,
  stats::LearnerCardStats,
};

/// Stateless apart from its [`Params`]; share one instance freely across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
  params: Params,
}

impl Scheduler {
  /// Build a scheduler after validating `params`.
  pub fn new(params: Params) -> Result<Self> {
    params.validate()?;
    Ok(Self { params })
  }

  pub fn params(&self) -> &Params { &self.params }

  /// Compute the stats that follow a review with `outcome` at `now`.
  ///
  /// Returns a new value; `stats` is left as it was. Fails with
  /// [`Error::InvalidStats`] if `stats` breaks its identity or ease
  /// invariants.
  pub fn calculate_next_review(
    &self,
    stats: &LearnerCardStats,
    outcome: ReviewOutcome,
    now: DateTime<Utc>,
  ) -> Result<LearnerCardStats> {
    stats.validate()?;
    Ok(algorithm::next_stats(stats, outcome, now, &self.params))
  }

  /// Like [`calculate_next_review`](Self::calculate_next_review), parsing
  /// `outcome` first. Unknown outcomes fail with [`Error::InvalidOutcome`].
  pub fn calculate_next_review_str(
    &self,
    stats: &LearnerCardStats,
    outcome: &str,
    now: DateTime<Utc>,
  ) -> Result<LearnerCardStats> {
    let outcome = outcome.parse()?;
    self.calculate_next_review(stats, outcome, now)
  }

  /// Move the due date `days` calendar days later. `days` must be at least 1.
  pub fn postpone_review(
    &self,
    stats: &LearnerCardStats,
    days: i64,
    now: DateTime<Utc>,
  ) -> Result<LearnerCardStats> {
    stats.validate()?;
    if days < 1 {
      return Err(Error::InvalidDays(days));
    }
    // Far beyond the last representable date either way; the result saturates.
    let days = u32::try_from(days).unwrap_or(u32::MAX);
    Ok(algorithm::postponed(stats, days, now))
  }
}
