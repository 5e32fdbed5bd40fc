//! [`ReviewWorkflow`], the transactional review orchestrator.
//!
//! Each write runs in exactly one store transaction: fetch the card, check
//! ownership, lock the learner's stats row, schedule, then create or update
//! the row. Any failure rolls the whole transaction back.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound as _, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  card::Card,
  outcome::ReviewOutcome,
  scheduler::Scheduler,
  stats::LearnerCardStats,
  store::{ReviewStore, ReviewTx},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Outcomes of the review workflow other than success.
///
/// Every variant except [`ReviewError::Store`] is an expected business result
/// that callers should match on by variant and map to a user-facing response.
#[derive(Debug, Error)]
pub enum ReviewError {
  #[error("invalid answer: {0:?}")]
  InvalidAnswer(String),

  #[error("no cards due for review")]
  NoCardsDue,

  #[error("card not found: {0}")]
  CardNotFound(Uuid),

  #[error("card {card_id} is not owned by the requesting learner")]
  CardNotOwned { card_id: Uuid },

  #[error("card {card_id} has not been reviewed yet")]
  StatsNotFound { card_id: Uuid },

  #[error(transparent)]
  Schedule(#[from] crate::Error),

  /// Persistence or transaction failure, wrapped once where it was detected.
  #[error("{op} failed: {source}")]
  Store {
    op:     &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ReviewError {
  fn store<E>(op: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| Self::Store { op, source: Box::new(e) }
  }

  /// `true` for infrastructure failures; `false` for business outcomes.
  pub fn is_store(&self) -> bool { matches!(self, Self::Store { .. }) }
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Review operations over any [`ReviewStore`].
///
/// Cloning is cheap: the store and scheduler are reference-counted.
pub struct ReviewWorkflow<S> {
  store:     Arc<S>,
  scheduler: Arc<Scheduler>,
  clock:     fn() -> DateTime<Utc>,
}

impl<S> Clone for ReviewWorkflow<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      scheduler: Arc::clone(&self.scheduler),
      clock:     self.clock,
    }
  }
}

impl<S: ReviewStore> ReviewWorkflow<S> {
  pub fn new(store: Arc<S>, scheduler: Scheduler) -> Self {
    Self { store, scheduler: Arc::new(scheduler), clock: Utc::now }
  }

  /// Replace the wall clock used to timestamp reviews.
  pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
    self.clock = clock;
    self
  }

  pub fn scheduler(&self) -> &Scheduler { &self.scheduler }

  /// The clock reading, truncated to whole microseconds so the stats handed
  /// back match what a store persists.
  fn now(&self) -> DateTime<Utc> { (self.clock)().trunc_subsecs(6) }

  /// The learner's next due card.
  ///
  /// [`ReviewError::NoCardsDue`] is the normal "nothing to review" result.
  pub async fn get_next_card(&self, learner_id: Uuid) -> Result<Card, ReviewError> {
    tracing::debug!(%learner_id, "retrieving next review card");

    let card = self
      .store
      .next_due_card(learner_id, self.now())
      .await
      .map_err(|e| {
        tracing::error!(%learner_id, error = %e, "failed to get next review card");
        ReviewError::store("get next card")(e)
      })?;

    match card {
      Some(card) => {
        tracing::debug!(%learner_id, card_id = %card.card_id, "next review card found");
        Ok(card)
      }
      None => {
        tracing::debug!(%learner_id, "no cards due for review");
        Err(ReviewError::NoCardsDue)
      }
    }
  }

  /// Record a review answer and reschedule the card.
  ///
  /// `outcome` is validated before any transaction is opened.
  pub async fn submit_answer(
    &self,
    learner_id: Uuid,
    card_id: Uuid,
    outcome: &str,
  ) -> Result<LearnerCardStats, ReviewError> {
    let Ok(outcome) = outcome.parse::<ReviewOutcome>() else {
      tracing::warn!(%learner_id, %card_id, outcome, "invalid review outcome");
      return Err(ReviewError::InvalidAnswer(outcome.to_owned()));
    };
    self.submit_outcome(learner_id, card_id, outcome).await
  }

  /// [`submit_answer`](Self::submit_answer) with an already-parsed outcome.
  pub async fn submit_outcome(
    &self,
    learner_id: Uuid,
    card_id: Uuid,
    outcome: ReviewOutcome,
  ) -> Result<LearnerCardStats, ReviewError> {
    tracing::debug!(%learner_id, %card_id, %outcome, "processing review answer");

    let scheduler = Arc::clone(&self.scheduler);
    let now = self.now();

    let result = self
      .store
      .run_in_transaction(move |tx| {
        owned_card(tx, learner_id, card_id)?;

        let current = tx
          .stats_for_update(learner_id, card_id)
          .map_err(ReviewError::store("lock stats"))?
          .unwrap_or_else(|| LearnerCardStats::new(learner_id, card_id, now));

        let next = scheduler.calculate_next_review(&current, outcome, now)?;

        if current.is_new() {
          tx.create_stats(&next).map_err(ReviewError::store("create stats"))?;
        } else {
          tx.update_stats(&next).map_err(ReviewError::store("update stats"))?;
        }
        Ok(next)
      })
      .await
      .map_err(ReviewError::store("submit answer transaction"))
      .and_then(|inner| inner);

    match &result {
      Ok(stats) => tracing::debug!(
        %learner_id,
        %card_id,
        %outcome,
        interval = stats.interval,
        ease_factor = stats.ease_factor,
        next_review_at = %stats.next_review_at,
        "review answer recorded"
      ),
      Err(e) => log_failure("submit answer", learner_id, card_id, e),
    }
    result
  }

  /// Push a reviewed card's due date `days` calendar days later.
  ///
  /// `days` is validated before any transaction is opened. Cards the learner
  /// has never reviewed fail with [`ReviewError::StatsNotFound`].
  pub async fn postpone_card(
    &self,
    learner_id: Uuid,
    card_id: Uuid,
    days: i64,
  ) -> Result<LearnerCardStats, ReviewError> {
    tracing::debug!(%learner_id, %card_id, days, "postponing card review");

    if days < 1 {
      tracing::warn!(%learner_id, %card_id, days, "invalid postpone days");
      return Err(crate::Error::InvalidDays(days).into());
    }

    let scheduler = Arc::clone(&self.scheduler);
    let now = self.now();

    let result = self
      .store
      .run_in_transaction(move |tx| {
        owned_card(tx, learner_id, card_id)?;

        let current = tx
          .stats_for_update(learner_id, card_id)
          .map_err(ReviewError::store("lock stats"))?
          .ok_or(ReviewError::StatsNotFound { card_id })?;

        let next = scheduler.postpone_review(&current, days, now)?;
        tx.update_stats(&next).map_err(ReviewError::store("update stats"))?;
        Ok(next)
      })
      .await
      .map_err(ReviewError::store("postpone transaction"))
      .and_then(|inner| inner);

    match &result {
      Ok(stats) => tracing::debug!(
        %learner_id,
        %card_id,
        next_review_at = %stats.next_review_at,
        "card review postponed"
      ),
      Err(e) => log_failure("postpone card", learner_id, card_id, e),
    }
    result
  }
}

/// Fetch `card_id` and check that `learner_id` owns it.
fn owned_card<E>(
  tx: &mut dyn ReviewTx<Error = E>,
  learner_id: Uuid,
  card_id: Uuid,
) -> Result<Card, ReviewError>
where
  E: std::error::Error + Send + Sync + 'static,
{
  let card = tx
    .card(card_id)
    .map_err(ReviewError::store("fetch card"))?
    .ok_or(ReviewError::CardNotFound(card_id))?;

  if !card.is_owned_by(learner_id) {
    tracing::warn!(
      %learner_id,
      %card_id,
      owner_id = %card.owner_id,
      "learner does not own card"
    );
    return Err(ReviewError::CardNotOwned { card_id });
  }
  Ok(card)
}

fn log_failure(op: &str, learner_id: Uuid, card_id: Uuid, err: &ReviewError) {
  if err.is_store() {
    tracing::error!(%learner_id, %card_id, error = %err, "{op} failed");
  } else {
    tracing::warn!(%learner_id, %card_id, error = %err, "{op} rejected");
  }
}
