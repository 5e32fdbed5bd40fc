//! The SQLite implementation of [`ReviewStore`].

use std::{
  any::Any,
  panic::{self, AssertUnwindSafe},
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{ErrorCode, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use scry_core::{
  card::Card,
  stats::LearnerCardStats,
  store::{ReviewStore, ReviewTx},
};

use crate::{
  Error, Result,
  encode::{RawCard, RawStats, encode_dt, encode_micros, encode_uuid},
  schema::SCHEMA,
};

/// How long a writer waits for a competing transaction before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Scry review store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Card plumbing ─────────────────────────────────────────────────────────

  /// Persist a new card owned by `owner_id`.
  pub async fn create_card(
    &self,
    owner_id: Uuid,
    content: serde_json::Value,
  ) -> Result<Card> {
    // Stored at microsecond precision; truncate so the returned card matches.
    let now = Utc::now().trunc_subsecs(6);
    let card = Card {
      card_id: Uuid::new_v4(),
      owner_id,
      content,
      created_at: now,
      updated_at: now,
    };

    let id_str      = encode_uuid(card.card_id);
    let owner_str   = encode_uuid(card.owner_id);
    let content_str = card.content.to_string();
    let at_us       = encode_micros(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cards (card_id, owner_id, content, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![id_str, owner_str, content_str, at_us],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(card_id = %card.card_id, %owner_id, "card created");
    Ok(card)
  }

  /// Retrieve a card by id. Returns `None` if not found.
  pub async fn get_card(&self, card_id: Uuid) -> Result<Option<Card>> {
    let id_str = encode_uuid(card_id);

    let raw: Option<RawCard> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM cards WHERE card_id = ?1", RawCard::COLUMNS),
              rusqlite::params![id_str],
              RawCard::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCard::into_card).transpose()
  }

  /// Unlocked read of a learner's stats for a card.
  pub async fn get_stats(
    &self,
    learner_id: Uuid,
    card_id: Uuid,
  ) -> Result<Option<LearnerCardStats>> {
    let learner_str = encode_uuid(learner_id);
    let card_str    = encode_uuid(card_id);

    let raw: Option<RawStats> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &select_stats_sql(),
              rusqlite::params![learner_str, card_str],
              RawStats::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStats::into_stats).transpose()
  }
}

fn select_stats_sql() -> String {
  format!(
    "SELECT {} FROM learner_card_stats WHERE learner_id = ?1 AND card_id = ?2",
    RawStats::COLUMNS
  )
}

// ─── Transaction handle ──────────────────────────────────────────────────────

/// [`ReviewTx`] over an open `BEGIN IMMEDIATE` transaction.
///
/// SQLite has no row locks. An immediate transaction takes the database write
/// lock when it begins, which serialises every read-modify-write of stats, so
/// the locked read is an ordinary `SELECT`.
struct SqliteTx<'a> {
  conn: &'a rusqlite::Connection,
}

impl ReviewTx for SqliteTx<'_> {
  type Error = Error;

  fn card(&mut self, card_id: Uuid) -> Result<Option<Card>> {
    self
      .conn
      .query_row(
        &format!("SELECT {} FROM cards WHERE card_id = ?1", RawCard::COLUMNS),
        rusqlite::params![encode_uuid(card_id)],
        RawCard::from_row,
      )
      .optional()?
      .map(RawCard::into_card)
      .transpose()
  }

  fn stats_for_update(
    &mut self,
    learner_id: Uuid,
    card_id: Uuid,
  ) -> Result<Option<LearnerCardStats>> {
    self
      .conn
      .query_row(
        &select_stats_sql(),
        rusqlite::params![encode_uuid(learner_id), encode_uuid(card_id)],
        RawStats::from_row,
      )
      .optional()?
      .map(RawStats::into_stats)
      .transpose()
  }

  fn create_stats(&mut self, stats: &LearnerCardStats) -> Result<()> {
    stats.validate()?;

    let inserted = self.conn.execute(
      "INSERT INTO learner_card_stats (
         learner_id, card_id, interval_days, ease_factor, consecutive_correct,
         last_reviewed_at, next_review_at, review_count, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
      rusqlite::params![
        encode_uuid(stats.learner_id),
        encode_uuid(stats.card_id),
        stats.interval,
        stats.ease_factor,
        stats.consecutive_correct,
        stats.last_reviewed_at.map(encode_dt),
        encode_micros(stats.next_review_at),
        stats.review_count,
        encode_dt(stats.created_at),
        encode_dt(stats.updated_at),
      ],
    );

    match inserted {
      Ok(_) => Ok(()),
      Err(rusqlite::Error::SqliteFailure(e, _))
        if e.code == ErrorCode::ConstraintViolation
          && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
      {
        Err(Error::Duplicate {
          learner_id: stats.learner_id,
          card_id:    stats.card_id,
        })
      }
      Err(e) => Err(e.into()),
    }
  }

  fn update_stats(&mut self, stats: &LearnerCardStats) -> Result<()> {
    stats.validate()?;

    let updated = self.conn.execute(
      "UPDATE learner_card_stats
       SET interval_days       = ?1,
           ease_factor         = ?2,
           consecutive_correct = ?3,
           last_reviewed_at    = ?4,
           next_review_at      = ?5,
           review_count        = ?6,
           updated_at          = ?7
       WHERE learner_id = ?8 AND card_id = ?9",
      rusqlite::params![
        stats.interval,
        stats.ease_factor,
        stats.consecutive_correct,
        stats.last_reviewed_at.map(encode_dt),
        encode_micros(stats.next_review_at),
        stats.review_count,
        encode_dt(stats.updated_at),
        encode_uuid(stats.learner_id),
        encode_uuid(stats.card_id),
      ],
    )?;

    if updated == 0 {
      return Err(Error::StatsNotFound {
        learner_id: stats.learner_id,
        card_id:    stats.card_id,
      });
    }
    Ok(())
  }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

/// Flags the transaction as abandoned if the awaiting future is dropped.
struct AbandonOnDrop {
  abandoned: Arc<AtomicBool>,
  armed:     bool,
}

impl AbandonOnDrop {
  fn disarm(mut self) { self.armed = false; }
}

impl Drop for AbandonOnDrop {
  fn drop(&mut self) {
    if self.armed {
      self.abandoned.store(true, Ordering::SeqCst);
    }
  }
}

/// What the connection thread did with a transaction.
enum Finished<R> {
  Done(R),
  Cancelled,
  Panicked(Box<dyn Any + Send>),
}

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for SqliteStore {
  type Error = Error;

  /// Cards the learner has never reviewed have no stats row yet and count
  /// as due from their creation time.
  async fn next_due_card(
    &self,
    learner_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Option<Card>> {
    let learner_str = encode_uuid(learner_id);
    let now_us      = encode_micros(now);

    let raw: Option<RawCard> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT c.card_id, c.owner_id, c.content, c.created_at, c.updated_at
               FROM cards c
               LEFT JOIN learner_card_stats s
                 ON s.card_id = c.card_id AND s.learner_id = ?1
               WHERE c.owner_id = ?1
                 AND COALESCE(s.next_review_at, c.created_at) <= ?2
               ORDER BY COALESCE(s.next_review_at, c.created_at) ASC, c.card_id ASC
               LIMIT 1",
              rusqlite::params![learner_str, now_us],
              RawCard::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCard::into_card).transpose()
  }

  async fn run_in_transaction<T, E, F>(
    &self,
    work: F,
  ) -> Result<Result<T, E>>
  where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce(&mut dyn ReviewTx<Error = Error>) -> Result<T, E>
      + Send
      + 'static,
  {
    let abandoned = Arc::new(AtomicBool::new(false));
    let guard = AbandonOnDrop { abandoned: Arc::clone(&abandoned), armed: true };

    // `Transaction` rolls back when dropped without a commit. A panic in
    // `work` is caught here so it cannot take down the connection thread.
    let finished = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome =
          match panic::catch_unwind(AssertUnwindSafe(|| work(&mut SqliteTx { conn: &tx }))) {
            Ok(outcome) => outcome,
            Err(payload) => return Ok(Finished::Panicked(payload)),
          };

        if outcome.is_ok() {
          if abandoned.load(Ordering::SeqCst) {
            return Ok(Finished::Cancelled);
          }
          tx.commit()?;
        }
        Ok(Finished::Done(outcome))
      })
      .await;
    guard.disarm();

    match finished? {
      Finished::Done(outcome) => Ok(outcome),
      Finished::Cancelled => {
        tracing::warn!("transaction abandoned by caller; rolled back");
        Err(Error::Cancelled)
      }
      Finished::Panicked(payload) => {
        tracing::error!("transaction work panicked; rolled back");
        panic::resume_unwind(payload)
      }
    }
  }
}
