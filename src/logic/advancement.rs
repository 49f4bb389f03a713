//! Moving a finished match's winner into its slot of the next match (and back out on undo).

use crate::models::{GameMatch, MatchStatus, StateError, TournamentError};

/// Write `child`'s winner into the `parent` slot named by `child.winner_position`.
///
/// Returns `Ok(false)` when the slot already holds that winner, so retries are harmless.
pub fn advance_winner(child: &GameMatch, parent: &mut GameMatch) -> Result<bool, TournamentError> {
    if child.status != MatchStatus::Completed {
        return Err(StateError::InvalidTransition {
            status: child.status,
            action: "advance the winner of",
        }
        .into());
    }
    let Some(side) = child.winner_position else {
        return Err(StateError::NotAKnockoutMatch.into());
    };
    let Some(entrant) = child.winner_entrant() else {
        return Err(StateError::NotAKnockoutMatch.into());
    };
    let winner = entrant.id;
    if child.parent_match_id != Some(parent.id) {
        return Err(TournamentError::Consistency {
            match_id: child.id,
            parent_id: parent.id,
        });
    }

    if parent.player(side) == Some(winner) {
        return Ok(false);
    }
    if parent.status != MatchStatus::Pending {
        return Err(StateError::ParentAlreadyStarted(parent.id).into());
    }

    parent.set_slot(side, Some(entrant));
    log::debug!(
        "advanced {} from match {} into {:?} of match {}",
        winner,
        child.id,
        side,
        parent.id
    );
    Ok(true)
}

/// Undo an advancement: clear the parent slot if it still holds `child`'s winner.
pub fn retract_winner(child: &GameMatch, parent: &mut GameMatch) -> Result<bool, TournamentError> {
    let (Some(winner), Some(side)) = (child.winner_id, child.winner_position) else {
        return Ok(false);
    };
    if parent.player(side) != Some(winner) {
        return Ok(false);
    }
    if parent.status != MatchStatus::Pending {
        return Err(StateError::ParentAlreadyStarted(parent.id).into());
    }
    parent.set_slot(side, None);
    Ok(true)
}
