//! Data structures for the engine: participants, matches, score state, errors.

mod error;
mod game;
mod participant;
mod score;

pub use error::{StateError, StoreError, TournamentError, ValidationError};
pub use game::{CategoryId, Entrant, GameMatch, MatchId, MatchStatus, Stage, TournamentId};
pub use participant::{Participant, ParticipantId};
pub use score::{
    MatchConfig, MatchTimer, PauseRecord, PointEvent, Score, ScoreState, SetResult, Side,
    EXTENSION_CAP_MARGIN,
};
