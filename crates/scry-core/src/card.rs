//! Cards, referenced by this crate only for identity and ownership.
//!
//! Card content is opaque here; generating and editing it belongs elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub card_id:    Uuid,
  /// The single learner who owns this card.
  pub owner_id:   Uuid,
  pub content:    serde_json::Value,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Card {
  pub fn is_owned_by(&self, learner_id: Uuid) -> bool {
    self.owner_id == learner_id
  }
}
