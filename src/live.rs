//! Live snapshot broadcast: per-match and per-tournament channels.
//!
//! Every event carries the full match, tagged with the match version as its
//! sequence number. Subscribers replace their copy, they never patch it.

use crate::models::{GameMatch, MatchId, TournamentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

/// Buffered events per channel before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveEventType {
    ScoreUpdate,
    MatchComplete,
    StatusChange,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    #[serde(rename = "type")]
    pub kind: LiveEventType,
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub sequence: u64,
    pub payload: GameMatch,
}

impl LiveEvent {
    pub fn snapshot(kind: LiveEventType, m: &GameMatch) -> Self {
        Self {
            kind,
            match_id: m.id,
            tournament_id: m.tournament_id,
            sequence: m.version,
            payload: m.clone(),
        }
    }
}

#[derive(Default)]
struct Channels {
    matches: HashMap<MatchId, broadcast::Sender<LiveEvent>>,
    tournaments: HashMap<TournamentId, broadcast::Sender<LiveEvent>>,
}

/// Fan-out point for live events. Publishing never blocks and never fails the caller.
#[derive(Default)]
pub struct LiveHub {
    channels: Mutex<Channels>,
}

fn sender<K: std::hash::Hash + Eq>(
    map: &mut HashMap<K, broadcast::Sender<LiveEvent>>,
    key: K,
) -> broadcast::Sender<LiveEvent> {
    map.entry(key)
        .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
        .clone()
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_match(&self, id: MatchId) -> broadcast::Receiver<LiveEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        sender(&mut channels.matches, id).subscribe()
    }

    pub fn subscribe_tournament(&self, id: TournamentId) -> broadcast::Receiver<LiveEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        sender(&mut channels.tournaments, id).subscribe()
    }

    /// Send to the match channel and its tournament channel.
    pub fn publish(&self, event: LiveEvent) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let targets = [
            channels.matches.get(&event.match_id).cloned(),
            channels.tournaments.get(&event.tournament_id).cloned(),
        ];
        for tx in targets.into_iter().flatten() {
            if tx.send(event.clone()).is_err() {
                log::debug!("no live subscribers for match {}", event.match_id);
            }
        }
        // drop channels whose subscribers have all gone
        channels.matches.retain(|_, tx| tx.receiver_count() > 0);
        channels.tournaments.retain(|_, tx| tx.receiver_count() > 0);
    }
}

/// Client-side view that keeps the newest snapshot per match.
#[derive(Clone, Debug, Default)]
pub struct LiveView {
    matches: HashMap<MatchId, GameMatch>,
    sequences: HashMap<MatchId, u64>,
}

impl LiveView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event. Returns `false` for stale or duplicate deliveries.
    pub fn apply(&mut self, event: LiveEvent) -> bool {
        if self
            .sequences
            .get(&event.match_id)
            .is_some_and(|seen| *seen >= event.sequence)
        {
            return false;
        }
        self.sequences.insert(event.match_id, event.sequence);
        self.matches.insert(event.match_id, event.payload);
        true
    }

    pub fn get(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.get(&id)
    }
}
