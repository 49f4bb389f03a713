//! Engine entry points: draw generation, scoring, queries and live subscriptions.
//!
//! Every mutating call holds the match's lock for its whole read-modify-commit
//! cycle, and scoring holds its category's lock shared while generation holds
//! it exclusively. Locks are taken child first, then parent, which is the only
//! order advancement ever needs.

use crate::config::Settings;
use crate::live::{LiveEvent, LiveEventType, LiveHub};
use crate::logic::{self, KnockoutBracket, MatchIndicators, ScoreOutcome, ServePolicy, Standing};
use crate::models::{
    CategoryId, GameMatch, MatchConfig, MatchId, MatchStatus, Participant, Side, StateError,
    TournamentError, TournamentId,
};
use crate::notify::{LogNotifier, Notifier};
use crate::store::{MatchStore, WriteBatch};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::broadcast;

/// A match as returned to readers, with the derived overlays alongside.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    #[serde(flatten)]
    pub game: GameMatch,
    pub indicators: MatchIndicators,
    pub playing_time_ms: i64,
}

impl MatchView {
    pub fn new(game: GameMatch, now: DateTime<Utc>) -> Self {
        let playing_time_ms = game
            .score_state
            .as_ref()
            .map(|s| s.playing_time(now).num_milliseconds())
            .unwrap_or_default();
        Self {
            indicators: logic::indicators(&game),
            game,
            playing_time_ms,
        }
    }
}

/// Result of a mutating call: the match after the change, and its parent if
/// the change moved a winner in or out of it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    #[serde(rename = "match")]
    pub game: GameMatch,
    pub parent: Option<GameMatch>,
    #[serde(skip)]
    pub outcome: Option<ScoreOutcome>,
}

type CategoryKey = (TournamentId, CategoryId);
type LockTable<K, L> = Mutex<HashMap<K, Arc<L>>>;

/// Fetch or create the lock for `key`. Creating one first drops every entry
/// nobody holds, so the table only grows with the number of locks in use.
fn shared_lock<K, L>(table: &LockTable<K, L>, key: K) -> Arc<L>
where
    K: Eq + Hash,
    L: Default,
{
    let mut locks = table.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(lock) = locks.get(&key) {
        return lock.clone();
    }
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    locks.entry(key).or_default().clone()
}

pub struct TournamentService {
    store: Arc<dyn MatchStore>,
    notifier: Arc<dyn Notifier>,
    serve_policy: Arc<dyn ServePolicy>,
    match_config: MatchConfig,
    live: LiveHub,
    match_locks: LockTable<MatchId, Mutex<()>>,
    category_locks: LockTable<CategoryKey, RwLock<()>>,
}

impl TournamentService {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self {
            store,
            notifier: Arc::new(LogNotifier),
            serve_policy: Arc::new(logic::SeedServePolicy),
            match_config: MatchConfig::default(),
            live: LiveHub::new(),
            match_locks: Mutex::new(HashMap::new()),
            category_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(store: Arc<dyn MatchStore>, settings: &Settings) -> Self {
        Self::new(store)
            .with_match_config(settings.match_config)
            .with_serve_policy(Arc::from(settings.serve_policy.build()))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_serve_policy(mut self, policy: Arc<dyn ServePolicy>) -> Self {
        self.serve_policy = policy;
        self
    }

    /// Format used by `start_match` when the caller does not pass one.
    pub fn with_match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    fn match_lock(&self, id: MatchId) -> Arc<Mutex<()>> {
        shared_lock(&self.match_locks, id)
    }

    fn category_lock(&self, tournament_id: TournamentId, category_id: CategoryId) -> Arc<RwLock<()>> {
        shared_lock(&self.category_locks, (tournament_id, category_id))
    }

    fn load(&self, id: MatchId) -> Result<GameMatch, TournamentError> {
        self.store
            .load(id)?
            .ok_or_else(|| TournamentError::match_not_found(id))
    }

    fn ensure_not_generated(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> Result<(), TournamentError> {
        if !self.store.load_category(tournament_id, category_id)?.is_empty() {
            return Err(StateError::AlreadyGenerated.into());
        }
        Ok(())
    }

    fn publish_draw(&self, tournament_id: TournamentId, category_id: CategoryId, matches: &[GameMatch]) {
        for m in matches {
            self.live.publish(LiveEvent::snapshot(LiveEventType::StatusChange, m));
        }
        self.notifier
            .draw_published(tournament_id, category_id, matches.len());
    }

    /// Create the group stage for a category. Fails if the category already has a draw.
    pub fn generate_round_robin(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
        participants: &[Participant],
    ) -> Result<Vec<GameMatch>, TournamentError> {
        let lock = self.category_lock(tournament_id, category_id);
        let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);

        self.ensure_not_generated(tournament_id, category_id)?;
        let matches = logic::generate_round_robin(tournament_id, category_id, participants)?;
        self.store.commit(WriteBatch {
            inserts: matches.clone(),
            updates: Vec::new(),
        })?;

        log::info!(
            "round robin published for category {}: {} matches",
            category_id,
            matches.len()
        );
        self.publish_draw(tournament_id, category_id, &matches);
        Ok(matches)
    }

    /// Create the knockout bracket for a category in a single commit.
    pub fn generate_knockout_bracket(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
        participants: &[Participant],
    ) -> Result<KnockoutBracket, TournamentError> {
        let lock = self.category_lock(tournament_id, category_id);
        let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);

        self.ensure_not_generated(tournament_id, category_id)?;
        let bracket =
            logic::generate_knockout_bracket(tournament_id, category_id, participants, Utc::now())?;
        self.store.commit(WriteBatch {
            inserts: bracket.matches.clone(),
            updates: Vec::new(),
        })?;

        self.publish_draw(tournament_id, category_id, &bracket.matches);
        Ok(bracket)
    }

    /// Seed a knockout category from the top `qualifiers` of a finished group.
    ///
    /// Every group match must be completed. The qualifiers are read under the
    /// group's lock, which is released before the knockout category is locked
    /// for generation.
    pub fn generate_knockout_from_group(
        &self,
        tournament_id: TournamentId,
        group_category_id: CategoryId,
        knockout_category_id: CategoryId,
        qualifiers: usize,
    ) -> Result<KnockoutBracket, TournamentError> {
        let seeded = {
            let group = self.category_lock(tournament_id, group_category_id);
            let _shared = group.read().unwrap_or_else(PoisonError::into_inner);
            let matches = self.store.load_category(tournament_id, group_category_id)?;
            if matches.is_empty() {
                return Err(TournamentError::NotFound {
                    entity: "category",
                    id: group_category_id.to_string(),
                });
            }
            logic::group_finished(&matches)?;
            logic::select_qualifiers(&logic::group_standings(&matches), qualifiers)?
        };
        self.generate_knockout_bracket(tournament_id, knockout_category_id, &seeded)
    }

    /// Run `change` on a match under its locks, then commit it together with
    /// whatever the change does to the parent match.
    fn mutate<F>(&self, id: MatchId, change: F) -> Result<MatchUpdate, TournamentError>
    where
        F: FnOnce(&mut GameMatch, DateTime<Utc>) -> Result<Option<ScoreOutcome>, TournamentError>,
    {
        let scope = self.load(id)?;
        let category = self.category_lock(scope.tournament_id, scope.category_id);
        let _shared = category.read().unwrap_or_else(PoisonError::into_inner);
        let lock = self.match_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let before = self.load(id)?;
        let mut game = before.clone();
        let outcome = change(&mut game, Utc::now())?;
        game.version += 1;

        let mut batch = WriteBatch::new();
        let mut parent = None;
        let mut orphaned = None;

        let parent_id = match outcome {
            Some(ScoreOutcome::MatchCompleted) | Some(ScoreOutcome::MatchReopened) => {
                game.parent_match_id
            }
            _ => None,
        };
        let parent_lock = parent_id.map(|pid| self.match_lock(pid));
        let _parent_guard = parent_lock
            .as_ref()
            .map(|l| l.lock().unwrap_or_else(PoisonError::into_inner));

        if let Some(parent_id) = parent_id {
            match self.store.load(parent_id)? {
                Some(mut p) => {
                    let changed = if outcome == Some(ScoreOutcome::MatchCompleted) {
                        logic::advance_winner(&game, &mut p)?
                    } else {
                        logic::retract_winner(&before, &mut p)?
                    };
                    if changed {
                        p.version += 1;
                        batch = batch.update(p.clone());
                        parent = Some(p);
                    }
                }
                None => orphaned = Some(parent_id),
            }
        }
        self.store.commit(batch.update(game.clone()))?;

        self.publish_update(&game, outcome, parent.as_ref());

        if let Some(parent_id) = orphaned {
            log::error!(
                "match {} committed but its parent {} is missing; advancement not applied",
                game.id,
                parent_id
            );
            return Err(TournamentError::Consistency {
                match_id: game.id,
                parent_id,
            });
        }

        Ok(MatchUpdate {
            game,
            parent,
            outcome,
        })
    }

    fn publish_update(&self, game: &GameMatch, outcome: Option<ScoreOutcome>, parent: Option<&GameMatch>) {
        let kind = match outcome {
            Some(ScoreOutcome::MatchCompleted) => LiveEventType::MatchComplete,
            Some(ScoreOutcome::MatchReopened) | None => LiveEventType::StatusChange,
            Some(_) => LiveEventType::ScoreUpdate,
        };
        self.live.publish(LiveEvent::snapshot(kind, game));
        if let Some(parent) = parent {
            self.live
                .publish(LiveEvent::snapshot(LiveEventType::StatusChange, parent));
        }
    }

    /// Start a pending match with `config`, or the service's default format.
    pub fn start_match(
        &self,
        id: MatchId,
        config: Option<MatchConfig>,
    ) -> Result<MatchUpdate, TournamentError> {
        let config = config.unwrap_or(self.match_config);
        let update = self.mutate(id, |m, now| {
            let server = self.serve_policy.first_server(m);
            logic::start_match(m, config, server, now)?;
            Ok(None)
        })?;
        log::info!("match {} started", id);
        Ok(update)
    }

    pub fn add_point(&self, id: MatchId, side: Side) -> Result<MatchUpdate, TournamentError> {
        let update = self.mutate(id, |m, now| logic::add_point(m, side, now).map(Some))?;
        if update.outcome == Some(ScoreOutcome::MatchCompleted) {
            log::info!(
                "match {} completed, winner {:?}",
                id,
                update.game.winner_id
            );
        }
        Ok(update)
    }

    pub fn undo_last_point(&self, id: MatchId) -> Result<MatchUpdate, TournamentError> {
        let update = self.mutate(id, |m, _| logic::undo_last_point(m).map(Some))?;
        if update.outcome == Some(ScoreOutcome::MatchReopened) {
            log::info!("match {} reopened by undo", id);
        }
        Ok(update)
    }

    pub fn pause_timer(&self, id: MatchId) -> Result<MatchUpdate, TournamentError> {
        self.mutate(id, |m, now| logic::pause_timer(m, now).map(|_| None))
    }

    pub fn resume_timer(&self, id: MatchId) -> Result<MatchUpdate, TournamentError> {
        self.mutate(id, |m, now| logic::resume_timer(m, now).map(|_| None))
    }

    /// Re-apply advancement for a completed match. Safe to call repeatedly.
    pub fn advance_winner(&self, id: MatchId) -> Result<Option<GameMatch>, TournamentError> {
        let scope = self.load(id)?;
        let category = self.category_lock(scope.tournament_id, scope.category_id);
        let _shared = category.read().unwrap_or_else(PoisonError::into_inner);
        let lock = self.match_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let game = self.load(id)?;
        let parent_id = game.parent_match_id.ok_or(StateError::NotAKnockoutMatch)?;

        let parent_lock = self.match_lock(parent_id);
        let _parent_guard = parent_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut parent = self
            .store
            .load(parent_id)?
            .ok_or(TournamentError::Consistency {
                match_id: id,
                parent_id,
            })?;
        if !logic::advance_winner(&game, &mut parent)? {
            return Ok(None);
        }
        parent.version += 1;
        self.store.commit(WriteBatch::new().update(parent.clone()))?;
        self.live
            .publish(LiveEvent::snapshot(LiveEventType::StatusChange, &parent));
        Ok(Some(parent))
    }

    /// Tell the notification collaborator that a ready match is about to be called.
    pub fn announce_match_starting(&self, id: MatchId) -> Result<(), TournamentError> {
        let game = self.load(id)?;
        if game.status != MatchStatus::Pending {
            return Err(StateError::InvalidTransition {
                status: game.status,
                action: "announce",
            }
            .into());
        }
        if game.player1_id.is_none() || game.player2_id.is_none() {
            return Err(StateError::PlayersNotDecided.into());
        }
        self.notifier.match_starting_soon(&game);
        Ok(())
    }

    pub fn get_match(&self, id: MatchId) -> Result<MatchView, TournamentError> {
        Ok(MatchView::new(self.load(id)?, Utc::now()))
    }

    pub fn get_matches_by_round(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
        round: u32,
    ) -> Result<Vec<GameMatch>, TournamentError> {
        Ok(self.store.load_round(tournament_id, category_id, round)?)
    }

    pub fn get_category_matches(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> Result<Vec<GameMatch>, TournamentError> {
        Ok(self.store.load_category(tournament_id, category_id)?)
    }

    pub fn group_standings(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> Result<Vec<Standing>, TournamentError> {
        let category = self.category_lock(tournament_id, category_id);
        let _shared = category.read().unwrap_or_else(PoisonError::into_inner);
        let matches = self.store.load_category(tournament_id, category_id)?;
        Ok(logic::group_standings(&matches))
    }

    pub fn subscribe_match(&self, id: MatchId) -> broadcast::Receiver<LiveEvent> {
        self.live.subscribe_match(id)
    }

    pub fn subscribe_tournament(&self, id: TournamentId) -> broadcast::Receiver<LiveEvent> {
        self.live.subscribe_tournament(id)
    }
}
