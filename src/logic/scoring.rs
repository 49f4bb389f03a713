//! Per-match scoring state machine: start, rally points, undo, timer pause/resume.
//!
//! These functions only mutate the match they are given. Persisting the change,
//! advancing winners and broadcasting are left to the caller.

use crate::logic::validation::validate_match_config;
use crate::models::{
    GameMatch, MatchConfig, MatchStatus, PauseRecord, PointEvent, Score, ScoreState, SetResult,
    Side, StateError, TournamentError,
};
use chrono::{DateTime, Utc};

/// What a scoring call did to the match, beyond the point itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScoreOutcome {
    /// Score moved within the current set.
    Rally,
    /// A set was won but the match goes on.
    SetCompleted,
    /// The match was won.
    MatchCompleted,
    /// An undo reopened a finished set.
    SetReopened,
    /// An undo took a completed match back to ongoing.
    MatchReopened,
}

fn require_status(m: &GameMatch, status: MatchStatus, action: &'static str) -> Result<(), StateError> {
    if m.status != status {
        return Err(StateError::InvalidTransition {
            status: m.status,
            action,
        });
    }
    Ok(())
}

fn live_state<'a>(m: &'a mut GameMatch, action: &'static str) -> Result<&'a mut ScoreState, StateError> {
    let status = m.status;
    m.score_state
        .as_mut()
        .ok_or(StateError::InvalidTransition { status, action })
}

/// `PENDING -> ONGOING`. Fixes the match format and starts the clock.
pub fn start_match(
    m: &mut GameMatch,
    config: MatchConfig,
    server: Side,
    now: DateTime<Utc>,
) -> Result<(), TournamentError> {
    if m.is_bye() {
        return Err(StateError::ByeMatch.into());
    }
    require_status(m, MatchStatus::Pending, "start")?;
    if m.player1_id.is_none() || m.player2_id.is_none() {
        return Err(StateError::PlayersNotDecided.into());
    }
    validate_match_config(&config)?;

    m.score_state = Some(ScoreState::new(config, server, now));
    m.status = MatchStatus::Ongoing;
    Ok(())
}

/// Award a rally to `side`. Completes the set and possibly the match.
pub fn add_point(m: &mut GameMatch, side: Side, now: DateTime<Utc>) -> Result<ScoreOutcome, TournamentError> {
    require_status(m, MatchStatus::Ongoing, "score")?;
    let state = live_state(m, "score")?;
    if state.timer.is_paused() {
        return Err(StateError::TimerPaused.into());
    }

    let server = state.current_server;
    *state.current_score.get_mut(side) += 1;
    state.history.push(PointEvent {
        player: side,
        score: state.current_score,
        set: state.current_set,
        server,
    });
    // rally scoring: whoever wins the point serves the next one
    state.current_server = side;

    if !state.match_config.wins_set(state.current_score, side) {
        return Ok(ScoreOutcome::Rally);
    }

    state.sets.push(SetResult {
        set_number: state.current_set,
        score: state.current_score,
        winner: side,
    });
    state.current_score = Score::default();
    state.current_set += 1;

    if state.sets_won().get(side) < state.match_config.sets_needed() {
        return Ok(ScoreOutcome::SetCompleted);
    }

    state.timer.ended_at = Some(now);
    m.status = MatchStatus::Completed;
    m.winner_id = m.player(side);
    m.completed_at = Some(now);
    Ok(ScoreOutcome::MatchCompleted)
}

/// Reverse the most recent rally, reopening its set and the match if it closed them.
pub fn undo_last_point(m: &mut GameMatch) -> Result<ScoreOutcome, TournamentError> {
    if m.status == MatchStatus::Pending {
        return Err(StateError::InvalidTransition {
            status: m.status,
            action: "undo a point in",
        }
        .into());
    }
    let state = live_state(m, "undo a point in")?;
    if state.bye {
        return Err(StateError::ByeMatch.into());
    }
    if state.timer.is_paused() {
        return Err(StateError::TimerPaused.into());
    }
    let event = state.history.pop().ok_or(StateError::NothingToUndo)?;

    let reopened_set = state.sets.last().is_some_and(|s| s.set_number == event.set);
    if reopened_set {
        state.sets.pop();
    }
    let mut score = event.score;
    let points = score.get_mut(event.player);
    *points = points.saturating_sub(1);
    state.current_score = score;
    state.current_set = event.set;
    state.current_server = event.server;

    if m.status == MatchStatus::Completed {
        if let Some(state) = m.score_state.as_mut() {
            state.timer.ended_at = None;
        }
        m.status = MatchStatus::Ongoing;
        m.winner_id = None;
        m.completed_at = None;
        return Ok(ScoreOutcome::MatchReopened);
    }
    Ok(if reopened_set {
        ScoreOutcome::SetReopened
    } else {
        ScoreOutcome::Rally
    })
}

/// Stop the clock. Scoring is frozen until `resume_timer`.
pub fn pause_timer(m: &mut GameMatch, now: DateTime<Utc>) -> Result<(), TournamentError> {
    require_status(m, MatchStatus::Ongoing, "pause")?;
    let state = live_state(m, "pause")?;
    if state.timer.is_paused() {
        return Err(StateError::TimerPaused.into());
    }
    state.timer.paused_at = Some(now);
    Ok(())
}

pub fn resume_timer(m: &mut GameMatch, now: DateTime<Utc>) -> Result<(), TournamentError> {
    require_status(m, MatchStatus::Ongoing, "resume")?;
    let state = live_state(m, "resume")?;
    let paused_at = state.timer.paused_at.take().ok_or(StateError::TimerNotPaused)?;

    let duration_ms = now.signed_duration_since(paused_at).num_milliseconds().max(0);
    state.timer.pause_history.push(PauseRecord {
        paused_at,
        resumed_at: now,
        duration_ms,
    });
    state.timer.total_paused_ms += duration_ms;
    Ok(())
}
