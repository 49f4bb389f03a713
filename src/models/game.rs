//! The match entity: bracket position, players, status and score state.

use crate::models::participant::{Participant, ParticipantId};
use crate::models::score::{ScoreState, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;
/// Unique identifier for a tournament.
pub type TournamentId = Uuid;
/// Unique identifier for a category (draw) within a tournament.
pub type CategoryId = Uuid;

/// Which part of the event this match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Group,
    Knockout,
}

/// Match lifecycle. `Completed -> Ongoing` only happens through undo.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Pending,
    Ongoing,
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "PENDING"),
            MatchStatus::Ongoing => write!(f, "ONGOING"),
            MatchStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// What a bracket slot holds: who, at which seed, under which name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entrant {
    pub id: ParticipantId,
    pub seed: u32,
    pub name: Option<String>,
}

impl Entrant {
    fn from_participant(p: &Participant, index: usize) -> Self {
        Self {
            id: p.id,
            seed: p.seed_or(index),
            name: Some(p.name.clone()).filter(|n| !n.is_empty()),
        }
    }
}

/// A single match in a group or knockout draw.
///
/// Rounds count backwards: round 1 is the final, round `n` the earliest knockout
/// round. Group matches all sit in round 1 of the `Group` stage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub category_id: CategoryId,
    pub round: u32,
    /// Mirror of `round` for consumers that read this name.
    pub round_number: u32,
    /// 1-based position within the round.
    pub match_number: u32,
    pub stage: Stage,
    pub player1_id: Option<ParticipantId>,
    pub player2_id: Option<ParticipantId>,
    pub player1_seed: Option<u32>,
    pub player2_seed: Option<u32>,
    #[serde(default)]
    pub player1_name: Option<String>,
    #[serde(default)]
    pub player2_name: Option<String>,
    pub status: MatchStatus,
    pub winner_id: Option<ParticipantId>,
    pub score_state: Option<ScoreState>,
    pub parent_match_id: Option<MatchId>,
    /// Which child of the parent this match is (1 or 2). Informational.
    pub child_position: Option<u8>,
    /// Slot of the parent match the winner moves into.
    pub winner_position: Option<Side>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Bumped on every committed change; doubles as the live sequence number.
    pub version: u64,
}

impl GameMatch {
    /// A new pending match with no players assigned.
    pub fn new(
        tournament_id: TournamentId,
        category_id: CategoryId,
        stage: Stage,
        round: u32,
        match_number: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            category_id,
            round,
            round_number: round,
            match_number,
            stage,
            player1_id: None,
            player2_id: None,
            player1_seed: None,
            player2_seed: None,
            player1_name: None,
            player2_name: None,
            status: MatchStatus::Pending,
            winner_id: None,
            score_state: None,
            parent_match_id: None,
            child_position: None,
            winner_position: None,
            completed_at: None,
            version: 1,
        }
    }

    pub fn player(&self, side: Side) -> Option<ParticipantId> {
        match side {
            Side::Player1 => self.player1_id,
            Side::Player2 => self.player2_id,
        }
    }

    /// Display name in a slot, when the draw knew one.
    pub fn name(&self, side: Side) -> Option<&str> {
        match side {
            Side::Player1 => self.player1_name.as_deref(),
            Side::Player2 => self.player2_name.as_deref(),
        }
    }

    /// Put an entrant (or nobody) into one slot, keeping the display seed and name in step.
    pub fn set_slot(&mut self, side: Side, entrant: Option<Entrant>) {
        let (id, seed, name) = match entrant {
            Some(e) => (Some(e.id), Some(e.seed), e.name),
            None => (None, None, None),
        };
        match side {
            Side::Player1 => {
                self.player1_id = id;
                self.player1_seed = seed;
                self.player1_name = name;
            }
            Side::Player2 => {
                self.player2_id = id;
                self.player2_seed = seed;
                self.player2_name = name;
            }
        }
    }

    /// Assign both slots from seeded participants at their list positions.
    pub fn assign(&mut self, p1: (&Participant, usize), p2: Option<(&Participant, usize)>) {
        self.set_slot(Side::Player1, Some(Entrant::from_participant(p1.0, p1.1)));
        self.set_slot(Side::Player2, p2.map(|(p, i)| Entrant::from_participant(p, i)));
    }

    /// Which side a participant plays on, if any.
    pub fn side_of(&self, participant: ParticipantId) -> Option<Side> {
        if self.player1_id == Some(participant) {
            Some(Side::Player1)
        } else if self.player2_id == Some(participant) {
            Some(Side::Player2)
        } else {
            None
        }
    }

    /// Whoever won, with seed and name, for carrying into the parent slot.
    pub fn winner_entrant(&self) -> Option<Entrant> {
        let id = self.winner_id?;
        let side = self.side_of(id)?;
        let seed = match side {
            Side::Player1 => self.player1_seed,
            Side::Player2 => self.player2_seed,
        };
        Some(Entrant {
            id,
            seed: seed.unwrap_or_default(),
            name: self.name(side).map(str::to_owned),
        })
    }

    pub fn is_bye(&self) -> bool {
        self.score_state.as_ref().is_some_and(|s| s.bye)
    }

    pub fn is_paused(&self) -> bool {
        self.score_state
            .as_ref()
            .is_some_and(|s| s.timer.is_paused())
    }

    /// Unordered pair key, used to check for duplicate pairings.
    pub fn pairing(&self) -> Option<(ParticipantId, ParticipantId)> {
        let (a, b) = (self.player1_id?, self.player2_id?);
        Some(if a <= b { (a, b) } else { (b, a) })
    }
}
