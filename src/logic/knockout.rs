//! Single-elimination bracket: tree wiring, first-round pairings and byes.

use crate::logic::advancement::advance_winner;
use crate::logic::validation::{bye_count, total_rounds, validate_participants};
use crate::models::{
    CategoryId, GameMatch, MatchStatus, Participant, ScoreState, Side, Stage, TournamentError,
    TournamentId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Generated bracket, final first.
#[derive(Clone, Debug, Serialize)]
pub struct KnockoutBracket {
    pub rounds: u32,
    pub matches: Vec<GameMatch>,
}

impl KnockoutBracket {
    pub fn round(&self, round: u32) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    pub fn final_match(&self) -> Option<&GameMatch> {
        self.matches
            .iter()
            .find(|m| m.round == 1 && m.parent_match_id.is_none())
    }
}

/// Build a complete bracket for `participants` (already in seed order).
///
/// Rounds are created from the final outwards so each match can point at its
/// parent as soon as it exists. The strongest `bye_count` seeds get walkovers in
/// the earliest round, and those walkovers are advanced before returning, so
/// the result needs no later repair.
pub fn generate_knockout_bracket(
    tournament_id: TournamentId,
    category_id: CategoryId,
    participants: &[Participant],
    now: DateTime<Utc>,
) -> Result<KnockoutBracket, TournamentError> {
    validate_participants(participants)?;

    let n = participants.len();
    let rounds = total_rounds(n);
    let byes = bye_count(n);

    let mut by_round: Vec<Vec<GameMatch>> = Vec::with_capacity(rounds as usize);
    for round in 1..=rounds {
        let count = 1usize << (round - 1);
        let mut matches = Vec::with_capacity(count);
        for index in 0..count {
            let mut m = GameMatch::new(
                tournament_id,
                category_id,
                Stage::Knockout,
                round,
                index as u32 + 1,
            );
            if let Some(previous) = by_round.last() {
                m.parent_match_id = Some(previous[index / 2].id);
                m.child_position = Some(index as u8 % 2 + 1);
                m.winner_position = Some(if index % 2 == 0 {
                    Side::Player1
                } else {
                    Side::Player2
                });
            }
            matches.push(m);
        }
        by_round.push(matches);
    }

    let (with_byes, in_first_round) = participants.split_at(byes);
    let regular = in_first_round.len() / 2;

    let (earlier, first) = by_round.split_at_mut(rounds as usize - 1);
    let first = &mut first[0];

    for (slot, pair) in in_first_round.chunks_exact(2).enumerate() {
        let offset = byes + slot * 2;
        first[slot].assign((&pair[0], offset), Some((&pair[1], offset + 1)));
    }

    for (k, participant) in with_byes.iter().enumerate() {
        let slot = regular + k;
        let m = &mut first[slot];
        m.assign((participant, k), None);
        m.status = MatchStatus::Completed;
        m.winner_id = Some(participant.id);
        m.score_state = Some(ScoreState::bye());
        m.completed_at = Some(now);

        // a bye implies a non-power-of-two field, so there is always a next round
        if let Some(next) = earlier.last_mut() {
            advance_winner(m, &mut next[slot / 2])?;
        }
    }

    log::info!(
        "knockout bracket for category {}: {} participants, {} rounds, {} byes",
        category_id,
        n,
        rounds,
        byes
    );

    Ok(KnockoutBracket {
        rounds,
        matches: by_round.into_iter().flatten().collect(),
    })
}
