//! The scheduling algorithm: pure functions over the current stats, the
//! review outcome, the current time, and [`Params`].
//!
//! A parameterised SM-2 variant. Nothing here performs I/O or reads the clock;
//! every function returns a new value and leaves its inputs untouched.

use chrono::{DateTime, Days, TimeDelta, TimeZone, Utc};

use crate::{outcome::ReviewOutcome, params::Params, stats::LearnerCardStats};

/// `current + delta[outcome]`, clamped to `[min_ease, max_ease]`.
pub(crate) fn next_ease_factor(
  current: f64,
  outcome: ReviewOutcome,
  params: &Params,
) -> f64 {
  (current + params.ease_deltas.get(outcome)).clamp(params.min_ease, params.max_ease)
}

/// The interval in whole days after this review.
///
/// `consecutive_correct` is the streak *before* this review and `ease_factor`
/// the ease *after* it. Fractional results truncate toward zero.
pub(crate) fn next_interval(
  current_interval: u32,
  consecutive_correct: u32,
  ease_factor: f64,
  outcome: ReviewOutcome,
  params: &Params,
) -> u32 {
  let multipliers = &params.interval_multipliers;
  let factor = match outcome {
    ReviewOutcome::Again => return 0,
    _ if current_interval == 0 => {
      return params.first_review_intervals.get(outcome).unwrap_or(0);
    }
    ReviewOutcome::Good if consecutive_correct == 0 => multipliers.lapse_recovery,
    ReviewOutcome::Good => ease_factor,
    ReviewOutcome::Hard => multipliers.hard,
    ReviewOutcome::Easy => multipliers.easy * ease_factor,
  };
  // `as` saturates at the u32 bounds and truncates toward zero.
  (f64::from(current_interval) * factor) as u32
}

/// When the card becomes due again. `again` retries after a few minutes;
/// anything else lands `interval` calendar days out at the same time of day.
pub(crate) fn next_review_at(
  interval: u32,
  outcome: ReviewOutcome,
  now: DateTime<Utc>,
  params: &Params,
) -> DateTime<Utc> {
  match outcome {
    ReviewOutcome::Again => {
      let retry = TimeDelta::minutes(i64::from(params.again_retry_minutes));
      now.checked_add_signed(retry).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
    _ => add_calendar_days(now, u64::from(interval))
      .unwrap_or(DateTime::<Utc>::MAX_UTC),
  }
}

/// Add whole calendar days, keeping the local time of day. Crosses month,
/// leap-year, and DST boundaries by date arithmetic rather than by adding
/// multiples of 24 hours. `None` if the result is out of range.
pub(crate) fn add_calendar_days<Tz: TimeZone>(
  at: DateTime<Tz>,
  days: u64,
) -> Option<DateTime<Tz>> {
  at.checked_add_days(Days::new(days))
}

/// Compute the full post-review stats.
pub(crate) fn next_stats(
  stats: &LearnerCardStats,
  outcome: ReviewOutcome,
  now: DateTime<Utc>,
  params: &Params,
) -> LearnerCardStats {
  let ease_factor = next_ease_factor(stats.ease_factor, outcome, params);
  let interval = next_interval(
    stats.interval,
    stats.consecutive_correct,
    ease_factor,
    outcome,
    params,
  );
  let consecutive_correct = match outcome {
    ReviewOutcome::Again => 0,
    _ => stats.consecutive_correct.saturating_add(1),
  };

  LearnerCardStats {
    interval,
    ease_factor,
    consecutive_correct,
    last_reviewed_at: Some(now),
    next_review_at: next_review_at(interval, outcome, now, params),
    review_count: stats.review_count.saturating_add(1),
    updated_at: now,
    ..stats.clone()
  }
}

/// Push the due date `days` calendar days past its current value. Only
/// `next_review_at` and `updated_at` change.
pub(crate) fn postponed(
  stats: &LearnerCardStats,
  days: u32,
  now: DateTime<Utc>,
) -> LearnerCardStats {
  LearnerCardStats {
    next_review_at: add_calendar_days(stats.next_review_at, u64::from(days))
      .unwrap_or(DateTime::<Utc>::MAX_UTC),
    updated_at: now,
    ..stats.clone()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{FixedOffset, TimeZone, Timelike};
  use proptest::prelude::*;
  use uuid::Uuid;

  use super::*;

  const EPSILON: f64 = 1e-9;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, 16, 45, 12).unwrap()
  }

  fn stats(interval: u32, ease_factor: f64, consecutive_correct: u32) -> LearnerCardStats {
    let mut s = LearnerCardStats::new(Uuid::new_v4(), Uuid::new_v4(), now());
    s.interval = interval;
    s.ease_factor = ease_factor;
    s.consecutive_correct = consecutive_correct;
    s
  }

  fn outcome_strategy() -> impl Strategy<Value = ReviewOutcome> {
    prop::sample::select(ReviewOutcome::ALL.to_vec())
  }

  // ─── Ease factor ───────────────────────────────────────────────────────────

  #[test]
  fn ease_factor_adjusts_per_outcome() {
    let p = Params::default();
    let cases = [
      (2.5, ReviewOutcome::Again, 2.3),
      (2.5, ReviewOutcome::Hard, 2.35),
      (2.5, ReviewOutcome::Good, 2.5),
      (2.3, ReviewOutcome::Easy, 2.45),
    ];
    for (current, outcome, expected) in cases {
      let got = next_ease_factor(current, outcome, &p);
      assert!((got - expected).abs() < EPSILON, "{outcome}: {got} != {expected}");
    }
  }

  #[test]
  fn ease_factor_is_clamped() {
    let p = Params::default();
    assert_eq!(next_ease_factor(1.35, ReviewOutcome::Again, &p), 1.3);
    assert_eq!(next_ease_factor(2.45, ReviewOutcome::Easy, &p), 2.5);
  }

  // ─── Interval ──────────────────────────────────────────────────────────────

  #[test]
  fn first_review_uses_table_without_ease() {
    let p = Params::default();
    assert_eq!(next_interval(0, 0, 2.35, ReviewOutcome::Hard, &p), 1);
    assert_eq!(next_interval(0, 0, 2.5, ReviewOutcome::Good, &p), 1);
    assert_eq!(next_interval(0, 0, 2.5, ReviewOutcome::Easy, &p), 2);
  }

  #[test]
  fn again_resets_interval() {
    let p = Params::default();
    assert_eq!(next_interval(10, 2, 2.3, ReviewOutcome::Again, &p), 0);
    assert_eq!(next_interval(0, 0, 2.3, ReviewOutcome::Again, &p), 0);
  }

  #[test]
  fn hard_good_easy_growth() {
    let p = Params::default();
    assert_eq!(next_interval(10, 2, 2.35, ReviewOutcome::Hard, &p), 12);
    assert_eq!(next_interval(10, 2, 2.5, ReviewOutcome::Good, &p), 25);
    // 10 * 1.3 * 2.5 = 32.5, truncated.
    assert_eq!(next_interval(10, 2, 2.5, ReviewOutcome::Easy, &p), 32);
  }

  #[test]
  fn good_after_lapse_uses_recovery_multiplier() {
    let p = Params::default();
    assert_eq!(next_interval(10, 0, 2.5, ReviewOutcome::Good, &p), 15);
    // Hard and easy are unaffected by the lapse.
    assert_eq!(next_interval(10, 0, 2.35, ReviewOutcome::Hard, &p), 12);
  }

  #[test]
  fn interval_truncates_toward_zero() {
    let p = Params::default();
    // 3 * 1.5 = 4.5
    assert_eq!(next_interval(3, 0, 2.5, ReviewOutcome::Good, &p), 4);
    // 7 * 1.3 = 9.1
    assert_eq!(next_interval(7, 4, 1.3, ReviewOutcome::Good, &p), 9);
  }

  // ─── Due date ──────────────────────────────────────────────────────────────

  #[test]
  fn again_retries_after_minutes() {
    let p = Params::default();
    let due = next_review_at(0, ReviewOutcome::Again, now(), &p);
    assert_eq!(due - now(), TimeDelta::minutes(10));
  }

  #[test]
  fn zero_interval_non_again_is_due_now() {
    let p = Params::default();
    assert_eq!(next_review_at(0, ReviewOutcome::Good, now(), &p), now());
  }

  #[test]
  fn interval_days_keep_time_of_day() {
    let p = Params::default();
    let due = next_review_at(30, ReviewOutcome::Good, now(), &p);
    assert_eq!(due, Utc.with_ymd_and_hms(2024, 6, 13, 16, 45, 12).unwrap());
    assert_eq!(due.time(), now().time());
  }

  #[test]
  fn calendar_days_cross_leap_day_and_month_end() {
    let feb28 = Utc.with_ymd_and_hms(2024, 2, 28, 23, 0, 0).unwrap();
    assert_eq!(
      add_calendar_days(feb28, 1).unwrap(),
      Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap()
    );
    let jan31 = Utc.with_ymd_and_hms(2023, 1, 31, 8, 0, 0).unwrap();
    assert_eq!(
      add_calendar_days(jan31, 29).unwrap(),
      Utc.with_ymd_and_hms(2023, 3, 1, 8, 0, 0).unwrap()
    );
  }

  #[test]
  fn calendar_days_preserve_local_time_in_offset_zones() {
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    let at = tz.with_ymd_and_hms(2024, 3, 9, 7, 15, 0).unwrap();
    let later = add_calendar_days(at, 3).unwrap();
    assert_eq!(later.hour(), 7);
    assert_eq!(later.minute(), 15);
    assert_eq!(later.date_naive().to_string(), "2024-03-12");
  }

  #[test]
  fn huge_interval_saturates_instead_of_panicking() {
    let p = Params::default();
    let due = next_review_at(u32::MAX, ReviewOutcome::Good, now(), &p);
    assert_eq!(due, DateTime::<Utc>::MAX_UTC);
  }

  // ─── Whole stats ───────────────────────────────────────────────────────────

  #[test]
  fn next_stats_for_new_card() {
    let p = Params::default();
    let before = LearnerCardStats::new(Uuid::new_v4(), Uuid::new_v4(), now());
    let later = now() + TimeDelta::hours(2);
    let after = next_stats(&before, ReviewOutcome::Good, later, &p);

    assert_eq!(after.learner_id, before.learner_id);
    assert_eq!(after.card_id, before.card_id);
    assert_eq!(after.interval, 1);
    assert_eq!(after.ease_factor, 2.5);
    assert_eq!(after.review_count, 1);
    assert_eq!(after.consecutive_correct, 1);
    assert_eq!(after.last_reviewed_at, Some(later));
    assert_eq!(after.next_review_at, later + TimeDelta::days(1));
    assert_eq!(after.updated_at, later);
    assert_eq!(after.created_at, before.created_at);
  }

  #[test]
  fn again_resets_streak() {
    let p = Params::default();
    let before = stats(10, 2.5, 5);
    let after = next_stats(&before, ReviewOutcome::Again, now(), &p);
    assert_eq!(after.consecutive_correct, 0);
    assert_eq!(after.interval, 0);
    assert_eq!(after.next_review_at, now() + TimeDelta::minutes(10));
  }

  #[test]
  fn easy_after_lower_ease_uses_new_ease() {
    let p = Params::default();
    let after = next_stats(&stats(10, 2.3, 2), ReviewOutcome::Easy, now(), &p);
    assert!((after.ease_factor - 2.45).abs() < EPSILON);
    // 10 * 1.3 * 2.45 = 31.85
    assert_eq!(after.interval, 31);
  }

  #[test]
  fn postponed_only_moves_due_date() {
    let before = stats(10, 2.1, 3);
    let later = now() + TimeDelta::minutes(5);
    let after = postponed(&before, 7, later);
    assert_eq!(after.next_review_at, before.next_review_at + TimeDelta::days(7));
    assert_eq!(after.updated_at, later);
    assert_eq!(
      LearnerCardStats {
        next_review_at: before.next_review_at,
        updated_at: before.updated_at,
        ..after
      },
      before
    );
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_ease_stays_in_bounds(
      ease in 1.01f64..4.0,
      interval in 0u32..10_000,
      streak in 0u32..50,
      outcome in outcome_strategy(),
    ) {
      let p = Params::default();
      let after = next_stats(&stats(interval, ease, streak), outcome, now(), &p);
      prop_assert!(after.ease_factor >= p.min_ease);
      prop_assert!(after.ease_factor <= p.max_ease);
    }

    #[test]
    fn prop_again_always_resets(
      ease in 1.3f64..2.5,
      interval in 0u32..100_000,
      streak in 0u32..1_000,
    ) {
      let p = Params::default();
      let after = next_stats(&stats(interval, ease, streak), ReviewOutcome::Again, now(), &p);
      prop_assert_eq!(after.interval, 0);
      prop_assert_eq!(after.consecutive_correct, 0);
    }

    #[test]
    fn prop_review_count_increments_by_one(
      count in 0u32..1_000_000,
      outcome in outcome_strategy(),
    ) {
      let p = Params::default();
      let mut before = stats(4, 2.2, 1);
      before.review_count = count;
      let after = next_stats(&before, outcome, now(), &p);
      prop_assert_eq!(after.review_count, count + 1);
    }

    #[test]
    fn prop_input_is_untouched(
      ease in 1.3f64..2.5,
      interval in 0u32..1_000,
      streak in 0u32..20,
      outcome in outcome_strategy(),
    ) {
      let p = Params::default();
      let before = stats(interval, ease, streak);
      let snapshot = before.clone();
      let _ = next_stats(&before, outcome, now() + TimeDelta::days(1), &p);
      prop_assert_eq!(before, snapshot);
    }

    #[test]
    fn prop_postpone_is_exact(days in 1u32..3_000, offset_hours in 0i64..100_000) {
      let mut before = stats(3, 2.0, 1);
      before.next_review_at = now() + TimeDelta::hours(offset_hours);
      let after = postponed(&before, days, now());
      let expected = before
        .next_review_at
        .date_naive()
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap()
        .and_time(before.next_review_at.time())
        .and_utc();
      prop_assert_eq!(after.next_review_at, expected);
      prop_assert_eq!(after.interval, before.interval);
      prop_assert_eq!(after.review_count, before.review_count);
      prop_assert_eq!(after.consecutive_correct, before.consecutive_correct);
      prop_assert_eq!(after.ease_factor, before.ease_factor);
    }
  }
}
