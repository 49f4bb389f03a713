//! Group stage: every participant plays every other participant once.

use crate::logic::validation::{round_robin_match_count, validate_participants};
use crate::models::{
    CategoryId, GameMatch, Participant, Stage, TournamentError, TournamentId, ValidationError,
};
use std::collections::HashSet;

/// Build all `n(n-1)/2` pairings in nested-loop order over the input list.
///
/// The same list always yields the same pairings in the same order; only the
/// match ids differ between calls.
pub fn generate_round_robin(
    tournament_id: TournamentId,
    category_id: CategoryId,
    participants: &[Participant],
) -> Result<Vec<GameMatch>, TournamentError> {
    validate_participants(participants)?;

    let n = participants.len();
    let mut matches = Vec::with_capacity(round_robin_match_count(n));
    let mut pairings = HashSet::with_capacity(round_robin_match_count(n));

    for i in 0..n {
        for j in (i + 1)..n {
            let number = matches.len() as u32 + 1;
            let mut m = GameMatch::new(tournament_id, category_id, Stage::Group, 1, number);
            m.assign((&participants[i], i), Some((&participants[j], j)));
            if let Some(pair) = m.pairing() {
                if !pairings.insert(pair) {
                    return Err(ValidationError::DuplicateParticipant(pair.0).into());
                }
            }
            matches.push(m);
        }
    }

    log::debug!(
        "round robin for category {}: {} participants, {} matches",
        category_id,
        n,
        matches.len()
    );
    Ok(matches)
}
