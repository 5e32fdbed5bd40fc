//! Collaborator traits consumed by the review workflow.
//!
//! Storage backends (e.g. `scry-store-sqlite`) implement these. The workflow
//! depends only on this abstraction.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{card::Card, stats::LearnerCardStats};

// ─── Transaction-scoped handle ───────────────────────────────────────────────

/// Card and stats access inside a single open transaction.
///
/// Work runs synchronously on the backend's connection, so the methods are
/// plain functions. Anything written through the handle becomes visible only
/// if the enclosing transaction commits.
pub trait ReviewTx {
  type Error;

  /// Fetch a card by id. `None` if it does not exist.
  fn card(&mut self, card_id: Uuid) -> Result<Option<Card>, Self::Error>;

  /// Fetch the stats row for `(learner_id, card_id)` and lock it until the
  /// transaction ends, so concurrent reviews of the same pair serialise.
  /// `None` if the learner has never reviewed the card.
  fn stats_for_update(
    &mut self,
    learner_id: Uuid,
    card_id: Uuid,
  ) -> Result<Option<LearnerCardStats>, Self::Error>;

  /// Insert a stats row. Fails if one already exists for the pair.
  fn create_stats(&mut self, stats: &LearnerCardStats) -> Result<(), Self::Error>;

  /// Overwrite an existing stats row. Fails if none exists for the pair.
  fn update_stats(&mut self, stats: &LearnerCardStats) -> Result<(), Self::Error>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over the card and stats persistence the workflow needs.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The learner's card that fell due earliest, at or before `now`. Cards
  /// without a stats row are due from their creation time. `None` if nothing
  /// is due. Unlocked, outside any transaction.
  fn next_due_card(
    &self,
    learner_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Card>, Self::Error>> + Send + '_;

  /// Run `work` inside one transaction.
  ///
  /// Commits if `work` returns `Ok`, rolls back if it returns `Err` or
  /// panics. The outer `Result` carries failures of the transaction itself
  /// (begin, commit, cancellation); the inner one is whatever `work` returned.
  /// Dropping the returned future before it resolves must not commit.
  fn run_in_transaction<T, E, F>(
    &self,
    work: F,
  ) -> impl Future<Output = Result<Result<T, E>, Self::Error>> + Send + '_
  where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce(&mut dyn ReviewTx<Error = Self::Error>) -> Result<T, E>
      + Send
      + 'static;
}
