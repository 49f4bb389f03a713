//! Error types for generation, scoring and storage.

use crate::models::game::{MatchId, MatchStatus};
use crate::models::participant::ParticipantId;
use thiserror::Error;

/// Bad input: nothing is persisted when one of these is returned.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("need at least 2 participants, got {got}")]
    NotEnoughParticipants { got: usize },
    #[error("participant {0} appears more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("qualifier count {qualifiers} must be between 1 and {participants}")]
    QualifierCountOutOfRange { qualifiers: usize, participants: usize },
    #[error("invalid match config: {0}")]
    InvalidMatchConfig(&'static str),
    #[error("malformed participant list: {0}")]
    MalformedParticipants(String),
}

/// The requested transition is not valid for the match as it stands.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum StateError {
    #[error("cannot {action} a match that is {status}")]
    InvalidTransition {
        status: MatchStatus,
        action: &'static str,
    },
    #[error("match timer is paused")]
    TimerPaused,
    #[error("match timer is not paused")]
    TimerNotPaused,
    #[error("no points to undo")]
    NothingToUndo,
    #[error("match is not part of a knockout bracket")]
    NotAKnockoutMatch,
    #[error("next match {0} has already started")]
    ParentAlreadyStarted(MatchId),
    #[error("draw has already been generated for this category")]
    AlreadyGenerated,
    #[error("both players must be decided before the match starts")]
    PlayersNotDecided,
    #[error("bye matches are not played")]
    ByeMatch,
    #[error("group still has {pending} unfinished matches")]
    GroupUnfinished { pending: usize },
}

/// Failures reported by a match store.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum StoreError {
    #[error("match {0} was modified concurrently")]
    Conflict(MatchId),
    #[error("match {0} already exists")]
    DuplicateKey(MatchId),
    #[error("match {0} does not exist")]
    Missing(MatchId),
    #[error("stored match {id} could not be decoded: {reason}")]
    Corrupt { id: MatchId, reason: String },
}

/// Errors surfaced by the engine.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    /// The triggering match is committed; only advancement failed and can be retried.
    #[error("match {match_id} points to missing parent {parent_id}")]
    Consistency { match_id: MatchId, parent_id: MatchId },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TournamentError {
    pub fn match_not_found(id: MatchId) -> Self {
        TournamentError::NotFound {
            entity: "match",
            id: id.to_string(),
        }
    }
}
