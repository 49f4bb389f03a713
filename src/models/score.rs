//! Typed score state owned by a single match: sets, running score, point history, timer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Points above `points_per_set` at which an extended set ends regardless of lead.
pub const EXTENSION_CAP_MARGIN: u32 = 9;

/// One side of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }
}

/// Points (or sets) per side.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub player1: u32,
    pub player2: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Player1 => self.player1,
            Side::Player2 => self.player2,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        }
    }
}

/// Match format, fixed when the match starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    pub points_per_set: u32,
    pub sets_to_win: u32,
    pub max_sets: u32,
    /// Deuce: require a 2-point lead, capped at `points_per_set + EXTENSION_CAP_MARGIN`.
    pub extension: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            points_per_set: 21,
            sets_to_win: 2,
            max_sets: 3,
            extension: true,
        }
    }
}

impl MatchConfig {
    /// Score at which a set ends even without a 2-point lead.
    pub fn point_cap(&self) -> u32 {
        if self.extension {
            self.points_per_set.saturating_add(EXTENSION_CAP_MARGIN)
        } else {
            self.points_per_set
        }
    }

    /// Whether `score` wins the set for `side` under this format.
    pub fn wins_set(&self, score: Score, side: Side) -> bool {
        let own = score.get(side);
        let other = score.get(side.opponent());
        if own < self.points_per_set {
            return false;
        }
        if !self.extension {
            return true;
        }
        own >= self.point_cap() || own >= other.saturating_add(2)
    }

    /// Sets a side needs to take the match.
    pub fn sets_needed(&self) -> u32 {
        if self.max_sets == 1 {
            1
        } else {
            self.sets_to_win
        }
    }
}

/// A finished set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResult {
    pub set_number: u32,
    pub score: Score,
    pub winner: Side,
}

/// One rally in the history log; the undo source of truth.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEvent {
    pub player: Side,
    /// Running score of the set right after this point.
    pub score: Score,
    pub set: u32,
    /// Who served this rally.
    pub server: Side,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseRecord {
    pub paused_at: DateTime<Utc>,
    pub resumed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Match clock. Paused time is excluded from playing time.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTimer {
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub total_paused_ms: i64,
    pub pause_history: Vec<PauseRecord>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl MatchTimer {
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            started_at: Some(now),
            ..Self::default()
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Elapsed time minus pauses, measured at `ended_at` if the match is over.
    pub fn playing_time(&self, now: DateTime<Utc>) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::zero();
        };
        let end = self.ended_at.unwrap_or(now);
        let open_pause = self
            .paused_at
            .map(|p| end.signed_duration_since(p))
            .unwrap_or_else(Duration::zero);
        let played = end.signed_duration_since(started)
            - Duration::milliseconds(self.total_paused_ms)
            - open_pause;
        played.max(Duration::zero())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreState {
    pub sets: Vec<SetResult>,
    pub current_score: Score,
    pub current_set: u32,
    pub current_server: Side,
    pub history: Vec<PointEvent>,
    pub timer: MatchTimer,
    pub match_config: MatchConfig,
    /// Walkover: the winner advanced without a rally being played.
    #[serde(default)]
    pub bye: bool,
}

impl ScoreState {
    pub fn new(config: MatchConfig, server: Side, now: DateTime<Utc>) -> Self {
        Self {
            sets: Vec::new(),
            current_score: Score::default(),
            current_set: 1,
            current_server: server,
            history: Vec::new(),
            timer: MatchTimer::started(now),
            match_config: config,
            bye: false,
        }
    }

    /// Marker state for a first-round bye.
    pub fn bye() -> Self {
        Self {
            sets: Vec::new(),
            current_score: Score::default(),
            current_set: 1,
            current_server: Side::Player1,
            history: Vec::new(),
            timer: MatchTimer::default(),
            match_config: MatchConfig::default(),
            bye: true,
        }
    }

    /// Completed sets won by each side.
    pub fn sets_won(&self) -> Score {
        let mut won = Score::default();
        for set in &self.sets {
            *won.get_mut(set.winner) += 1;
        }
        won
    }

    pub fn playing_time(&self, now: DateTime<Utc>) -> Duration {
        self.timer.playing_time(now)
    }
}
