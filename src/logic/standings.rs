//! Group tables from completed round-robin matches, and qualifier selection.

use crate::logic::validation::validate_qualifier_count;
use crate::models::{
    GameMatch, MatchStatus, Participant, ParticipantId, Side, Stage, StateError, TournamentError,
};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// One row of a group table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub participant_id: ParticipantId,
    pub name: String,
    pub seed: u32,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub sets_for: u32,
    pub sets_against: u32,
    pub points_for: u32,
    pub points_against: u32,
}

impl Standing {
    pub fn set_difference(&self) -> i64 {
        self.sets_for as i64 - self.sets_against as i64
    }

    pub fn point_difference(&self) -> i64 {
        self.points_for as i64 - self.points_against as i64
    }
}

/// Rank everyone appearing in the group matches.
///
/// Order: wins, set difference, point difference, then seed. Byes and
/// knockout matches are ignored.
pub fn group_standings(matches: &[GameMatch]) -> Vec<Standing> {
    let mut table: HashMap<ParticipantId, Standing> = HashMap::new();

    for m in matches.iter().filter(|m| m.stage == Stage::Group) {
        for side in [Side::Player1, Side::Player2] {
            if let Some(id) = m.player(side) {
                let seed = match side {
                    Side::Player1 => m.player1_seed,
                    Side::Player2 => m.player2_seed,
                };
                table.entry(id).or_insert_with(|| Standing {
                    participant_id: id,
                    name: m.name(side).unwrap_or_default().to_owned(),
                    seed: seed.unwrap_or(u32::MAX),
                    ..Standing::default()
                });
            }
        }

        if m.status != MatchStatus::Completed || m.is_bye() {
            continue;
        }
        let (Some(state), Some(winner)) = (m.score_state.as_ref(), m.winner_id) else {
            continue;
        };
        for side in [Side::Player1, Side::Player2] {
            let Some(row) = m.player(side).and_then(|id| table.get_mut(&id)) else {
                continue;
            };
            row.played += 1;
            if m.player(side) == Some(winner) {
                row.wins += 1;
            } else {
                row.losses += 1;
            }
            for set in &state.sets {
                if set.winner == side {
                    row.sets_for += 1;
                } else {
                    row.sets_against += 1;
                }
                row.points_for += set.score.get(side);
                row.points_against += set.score.get(side.opponent());
            }
        }
    }

    let mut rows: Vec<Standing> = table.into_values().collect();
    rows.sort_by_key(|r| {
        (
            Reverse(r.wins),
            Reverse(r.set_difference()),
            Reverse(r.point_difference()),
            r.seed,
            r.participant_id,
        )
    });
    rows
}

/// Whether every group match has been played out.
pub fn group_finished(matches: &[GameMatch]) -> Result<(), StateError> {
    let pending = matches
        .iter()
        .filter(|m| m.stage == Stage::Group && m.status != MatchStatus::Completed)
        .count();
    if pending > 0 {
        return Err(StateError::GroupUnfinished { pending });
    }
    Ok(())
}

/// Take the top `qualifiers` rows, re-seeded by finishing position, ready for a knockout draw.
pub fn select_qualifiers(
    standings: &[Standing],
    qualifiers: usize,
) -> Result<Vec<Participant>, TournamentError> {
    validate_qualifier_count(qualifiers, standings.len())?;
    Ok(standings
        .iter()
        .take(qualifiers)
        .enumerate()
        .map(|(rank, row)| Participant {
            id: row.participant_id,
            name: row.name.clone(),
            seed: Some(rank as u32 + 1),
        })
        .collect())
}
