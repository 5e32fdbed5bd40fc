//! Per-(learner, card) scheduling state.
//!
//! A stats value is never mutated in place by the scheduler; every review or
//! postponement produces a fresh value. Rows are created lazily on the first
//! review rather than when the card is created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Ease factor assigned to a card that has never been reviewed.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerCardStats {
  pub learner_id:          Uuid,
  pub card_id:             Uuid,
  /// Whole days until the next review.
  pub interval:            u32,
  pub ease_factor:         f64,
  /// Non-`again` outcomes since the last `again`.
  pub consecutive_correct: u32,
  /// `None` until the first review completes.
  pub last_reviewed_at:    Option<DateTime<Utc>>,
  pub next_review_at:      DateTime<Utc>,
  pub review_count:        u32,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl LearnerCardStats {
  /// Fresh state for a card the learner has never reviewed. The card is due
  /// immediately.
  pub fn new(learner_id: Uuid, card_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      learner_id,
      card_id,
      interval: 0,
      ease_factor: INITIAL_EASE_FACTOR,
      consecutive_correct: 0,
      last_reviewed_at: None,
      next_review_at: now,
      review_count: 0,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_new(&self) -> bool { self.last_reviewed_at.is_none() }

  /// Check identity and the ease-factor invariant.
  pub fn validate(&self) -> Result<()> {
    if self.learner_id.is_nil() {
      return Err(Error::InvalidStats("learner id cannot be empty"));
    }
    if self.card_id.is_nil() {
      return Err(Error::InvalidStats("card id cannot be empty"));
    }
    if self.ease_factor.is_nan() || self.ease_factor <= 1.0 {
      return Err(Error::InvalidStats("ease factor must be greater than 1.0"));
    }
    Ok(())
  }
}
