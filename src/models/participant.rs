//! Participant identity and seeding.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (player or team entry).
pub type ParticipantId = Uuid;

/// A seeded entrant supplied to the generators. Lower seed = stronger.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    #[serde(default)]
    pub name: String,
    /// 1-based; `None` means "use list position".
    #[serde(default)]
    pub seed: Option<u32>,
}

impl Participant {
    pub fn new(name: impl Into<String>, seed: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            seed: Some(seed),
        }
    }

    /// Seed to display, falling back to the participant's 0-based list index + 1.
    pub fn seed_or(&self, index: usize) -> u32 {
        self.seed.unwrap_or(index as u32 + 1)
    }
}
