//! Read-only overlays derived from the live score. Never stored.

use crate::models::{GameMatch, MatchStatus, ScoreState, Side};
use serde::Serialize;

/// Service court for doubles, from the parity of the server's own score.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Court {
    Right,
    Left,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchIndicators {
    /// Sides one rally away from taking the current set.
    pub game_point: Vec<Side>,
    /// Sides one rally away from taking the match.
    pub match_point: Vec<Side>,
    pub server: Option<Side>,
    pub serving_court: Option<Court>,
}

fn is_game_point(state: &ScoreState, side: Side) -> bool {
    let mut next = state.current_score;
    *next.get_mut(side) += 1;
    state.match_config.wins_set(next, side)
}

pub fn indicators(m: &GameMatch) -> MatchIndicators {
    let Some(state) = m.score_state.as_ref() else {
        return MatchIndicators::default();
    };
    if m.status != MatchStatus::Ongoing {
        return MatchIndicators::default();
    }

    let sets_won = state.sets_won();
    let needed = state.match_config.sets_needed();
    let mut out = MatchIndicators::default();
    for side in [Side::Player1, Side::Player2] {
        if is_game_point(state, side) {
            out.game_point.push(side);
            if sets_won.get(side) + 1 >= needed {
                out.match_point.push(side);
            }
        }
    }

    let server = state.current_server;
    out.server = Some(server);
    out.serving_court = Some(if state.current_score.get(server) % 2 == 0 {
        Court::Right
    } else {
        Court::Left
    });
    out
}
