//! Tournament business logic: validation, draw generation, scoring, advancement.

mod advancement;
mod import;
mod indicators;
mod knockout;
mod round_robin;
mod scoring;
mod serve;
mod standings;
pub mod validation;

pub use advancement::{advance_winner, retract_winner};
pub use import::parse_participants_csv;
pub use indicators::{indicators, Court, MatchIndicators};
pub use knockout::{generate_knockout_bracket, KnockoutBracket};
pub use round_robin::generate_round_robin;
pub use scoring::{add_point, pause_timer, resume_timer, start_match, undo_last_point, ScoreOutcome};
pub use serve::{CoinTossServePolicy, SeedServePolicy, ServePolicy, ServePolicyKind};
pub use standings::{group_finished, group_standings, select_qualifiers, Standing};
