//! Tunable constants for the scheduling algorithm.
//!
//! Per-outcome values are held in small structs indexed by an exhaustive
//! `match` on [`ReviewOutcome`], so a missing outcome is a compile error
//! rather than a silent zero from a map lookup.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, outcome::ReviewOutcome};

// ─── Per-outcome tables ──────────────────────────────────────────────────────

/// Ease-factor change applied for each outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EaseDeltas {
  pub again: f64,
  pub hard:  f64,
  pub good:  f64,
  pub easy:  f64,
}

impl EaseDeltas {
  pub fn get(&self, outcome: ReviewOutcome) -> f64 {
    match outcome {
      ReviewOutcome::Again => self.again,
      ReviewOutcome::Hard => self.hard,
      ReviewOutcome::Good => self.good,
      ReviewOutcome::Easy => self.easy,
    }
  }
}

/// Interval growth factors. `again` always resets to zero and `good` uses the
/// ease factor itself, so neither has an entry here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalMultipliers {
  pub hard:           f64,
  /// Applied on top of the new ease factor.
  pub easy:           f64,
  /// Used instead of the ease factor for a `good` answer straight after a
  /// lapse.
  pub lapse_recovery: f64,
}

/// Interval in days for the first successful review of a card (or the first
/// after a reset). `again` never reaches this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstReviewIntervals {
  pub hard: u32,
  pub good: u32,
  pub easy: u32,
}

impl FirstReviewIntervals {
  pub fn get(&self, outcome: ReviewOutcome) -> Option<u32> {
    match outcome {
      ReviewOutcome::Again => None,
      ReviewOutcome::Hard => Some(self.hard),
      ReviewOutcome::Good => Some(self.good),
      ReviewOutcome::Easy => Some(self.easy),
    }
  }
}

// ─── Params ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
  pub min_ease:               f64,
  pub max_ease:               f64,
  pub ease_deltas:            EaseDeltas,
  pub interval_multipliers:   IntervalMultipliers,
  pub first_review_intervals: FirstReviewIntervals,
  /// Short-term retry delay after an `again`, in minutes.
  pub again_retry_minutes:    u32,
}

impl Default for Params {
  fn default() -> Self {
    Self {
      min_ease:               1.3,
      max_ease:               2.5,
      ease_deltas:            EaseDeltas {
        again: -0.20,
        hard:  -0.15,
        good:  0.0,
        easy:  0.15,
      },
      interval_multipliers:   IntervalMultipliers {
        hard:           1.2,
        easy:           1.3,
        lapse_recovery: 1.5,
      },
      first_review_intervals: FirstReviewIntervals {
        hard: 1,
        good: 1,
        easy: 2,
      },
      again_retry_minutes:    10,
    }
  }
}

impl Params {
  /// Merge `config` over the defaults and validate the result.
  ///
  /// Unset fields keep their default; any field that is set overrides it,
  /// zero included.
  pub fn from_config(config: &ParamsConfig) -> Result<Self> {
    let d = Self::default();
    let params = Self {
      min_ease:               config.min_ease.unwrap_or(d.min_ease),
      max_ease:               config.max_ease.unwrap_or(d.max_ease),
      ease_deltas:            EaseDeltas {
        again: config.again_ease_delta.unwrap_or(d.ease_deltas.again),
        hard:  config.hard_ease_delta.unwrap_or(d.ease_deltas.hard),
        good:  config.good_ease_delta.unwrap_or(d.ease_deltas.good),
        easy:  config.easy_ease_delta.unwrap_or(d.ease_deltas.easy),
      },
      interval_multipliers:   IntervalMultipliers {
        hard:           config
          .hard_interval_multiplier
          .unwrap_or(d.interval_multipliers.hard),
        easy:           config
          .easy_interval_multiplier
          .unwrap_or(d.interval_multipliers.easy),
        lapse_recovery: config
          .lapse_recovery_multiplier
          .unwrap_or(d.interval_multipliers.lapse_recovery),
      },
      first_review_intervals: FirstReviewIntervals {
        hard: config
          .first_review_hard_days
          .unwrap_or(d.first_review_intervals.hard),
        good: config
          .first_review_good_days
          .unwrap_or(d.first_review_intervals.good),
        easy: config
          .first_review_easy_days
          .unwrap_or(d.first_review_intervals.easy),
      },
      again_retry_minutes:    config
        .again_retry_minutes
        .unwrap_or(d.again_retry_minutes),
    };
    params.validate()?;
    Ok(params)
  }

  pub fn validate(&self) -> Result<()> {
    let invalid = |msg: String| Err(Error::InvalidParams(msg));

    if !self.min_ease.is_finite() || self.min_ease <= 1.0 {
      return invalid(format!("min_ease must be above 1.0, got {}", self.min_ease));
    }
    if !self.max_ease.is_finite() || self.max_ease <= self.min_ease {
      return invalid(format!(
        "max_ease ({}) must be greater than min_ease ({})",
        self.max_ease, self.min_ease
      ));
    }
    for outcome in ReviewOutcome::ALL {
      let delta = self.ease_deltas.get(outcome);
      if !delta.is_finite() {
        return invalid(format!("{outcome} ease delta must be finite"));
      }
    }

    let m = &self.interval_multipliers;
    for (name, value) in [
      ("hard", m.hard),
      ("easy", m.easy),
      ("lapse_recovery", m.lapse_recovery),
    ] {
      if !value.is_finite() || value < 0.0 {
        return invalid(format!(
          "{name} interval multiplier must be non-negative, got {value}"
        ));
      }
    }

    let f = &self.first_review_intervals;
    if f.hard == 0 || f.good == 0 || f.easy == 0 {
      return invalid("first-review intervals must be at least 1 day".into());
    }
    if self.again_retry_minutes == 0 {
      return invalid("again_retry_minutes must be at least 1".into());
    }
    Ok(())
  }
}

// ─── Overrides ───────────────────────────────────────────────────────────────

/// Optional overrides for [`Params`], deserialised from the `[srs]` section of
/// the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsConfig {
  pub min_ease:                  Option<f64>,
  pub max_ease:                  Option<f64>,
  pub again_ease_delta:          Option<f64>,
  pub hard_ease_delta:           Option<f64>,
  pub good_ease_delta:           Option<f64>,
  pub easy_ease_delta:           Option<f64>,
  pub hard_interval_multiplier:  Option<f64>,
  pub easy_interval_multiplier:  Option<f64>,
  pub lapse_recovery_multiplier: Option<f64>,
  pub first_review_hard_days:    Option<u32>,
  pub first_review_good_days:    Option<u32>,
  pub first_review_easy_days:    Option<u32>,
  pub again_retry_minutes:       Option<u32>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_yields_defaults() {
    let params = Params::from_config(&ParamsConfig::default()).unwrap();
    assert_eq!(params, Params::default());
  }

  #[test]
  fn defaults_match_the_outcome_table() {
    let p = Params::default();
    assert_eq!(p.ease_deltas.get(ReviewOutcome::Again), -0.20);
    assert_eq!(p.ease_deltas.get(ReviewOutcome::Hard), -0.15);
    assert_eq!(p.ease_deltas.get(ReviewOutcome::Good), 0.0);
    assert_eq!(p.ease_deltas.get(ReviewOutcome::Easy), 0.15);
    assert_eq!(p.first_review_intervals.get(ReviewOutcome::Again), None);
    assert_eq!(p.first_review_intervals.get(ReviewOutcome::Hard), Some(1));
    assert_eq!(p.first_review_intervals.get(ReviewOutcome::Good), Some(1));
    assert_eq!(p.first_review_intervals.get(ReviewOutcome::Easy), Some(2));
    assert_eq!(p.again_retry_minutes, 10);
  }

  #[test]
  fn explicit_zero_overrides_default() {
    let config = ParamsConfig {
      hard_interval_multiplier: Some(0.0),
      easy_ease_delta: Some(0.0),
      ..Default::default()
    };
    let params = Params::from_config(&config).unwrap();
    assert_eq!(params.interval_multipliers.hard, 0.0);
    assert_eq!(params.ease_deltas.easy, 0.0);
    // Untouched fields keep their defaults.
    assert_eq!(params.interval_multipliers.easy, 1.3);
  }

  #[test]
  fn rejects_inverted_ease_bounds() {
    let config = ParamsConfig {
      min_ease: Some(2.0),
      max_ease: Some(1.5),
      ..Default::default()
    };
    assert!(matches!(
      Params::from_config(&config),
      Err(Error::InvalidParams(_))
    ));
  }

  #[test]
  fn rejects_min_ease_at_or_below_one() {
    let config = ParamsConfig { min_ease: Some(1.0), ..Default::default() };
    assert!(Params::from_config(&config).is_err());
  }

  #[test]
  fn rejects_negative_multiplier_and_zero_retry() {
    let config = ParamsConfig {
      easy_interval_multiplier: Some(-1.0),
      ..Default::default()
    };
    assert!(Params::from_config(&config).is_err());

    let config = ParamsConfig {
      again_retry_minutes: Some(0),
      ..Default::default()
    };
    assert!(Params::from_config(&config).is_err());
  }

  #[test]
  fn config_deserialises_with_missing_fields() {
    let config: ParamsConfig =
      serde_json::from_str(r#"{ "max_ease": 3.0, "first_review_easy_days": 4 }"#)
        .unwrap();
    let params = Params::from_config(&config).unwrap();
    assert_eq!(params.max_ease, 3.0);
    assert_eq!(params.first_review_intervals.easy, 4);
    assert_eq!(params.min_ease, 1.3);
  }
}
