//! Tournament engine: round-robin and knockout draws, live match scoring, advancement.

pub mod config;
pub mod live;
pub mod logic;
pub mod models;
pub mod notify;
pub mod service;
pub mod store;

pub use config::Settings;
pub use live::{LiveEvent, LiveEventType, LiveHub, LiveView};
pub use logic::{
    generate_knockout_bracket, generate_round_robin, group_standings, indicators,
    parse_participants_csv, select_qualifiers, KnockoutBracket, MatchIndicators, ScoreOutcome,
    ServePolicy, Standing,
};
pub use models::{
    CategoryId, Entrant, GameMatch, MatchConfig, MatchId, MatchStatus, Participant, ParticipantId,
    ScoreState, Side, Stage, StateError, StoreError, TournamentError, TournamentId,
    ValidationError,
};
pub use notify::{LogNotifier, Notifier};
pub use service::{MatchUpdate, MatchView, TournamentService};
pub use store::{InMemoryStore, MatchStore, WriteBatch};
