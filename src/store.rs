//! Persistence port for matches, plus the bundled in-memory implementation.

use crate::models::{CategoryId, GameMatch, MatchId, StoreError, TournamentId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Rows to write in one all-or-nothing commit.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub inserts: Vec<GameMatch>,
    /// Each update must carry `version = stored version + 1`.
    pub updates: Vec<GameMatch>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, m: GameMatch) -> Self {
        self.inserts.push(m);
        self
    }

    pub fn update(mut self, m: GameMatch) -> Self {
        self.updates.push(m);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

/// Storage used by the engine. Implementations must apply a batch atomically.
pub trait MatchStore: Send + Sync {
    fn load(&self, id: MatchId) -> Result<Option<GameMatch>, StoreError>;

    /// All matches of a category, ordered by stage, round and match number.
    fn load_category(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> Result<Vec<GameMatch>, StoreError>;

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn load_round(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
        round: u32,
    ) -> Result<Vec<GameMatch>, StoreError> {
        let mut matches = self.load_category(tournament_id, category_id)?;
        matches.retain(|m| m.round == round);
        Ok(matches)
    }
}

#[derive(Default)]
struct Tables {
    /// Rows are kept as JSON, as they would be in a document column.
    rows: HashMap<MatchId, serde_json::Value>,
    by_category: HashMap<(TournamentId, CategoryId), Vec<MatchId>>,
}

/// Process-local store. Suitable for a single server instance and for tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

fn encode(m: &GameMatch) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(m).map_err(|e| StoreError::Corrupt {
        id: m.id,
        reason: e.to_string(),
    })
}

fn decode(id: MatchId, row: &serde_json::Value) -> Result<GameMatch, StoreError> {
    serde_json::from_value(row.clone()).map_err(|e| StoreError::Corrupt {
        id,
        reason: e.to_string(),
    })
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchStore for InMemoryStore {
    fn load(&self, id: MatchId) -> Result<Option<GameMatch>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.rows.get(&id).map(|row| decode(id, row)).transpose()
    }

    fn load_category(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> Result<Vec<GameMatch>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let Some(ids) = tables.by_category.get(&(tournament_id, category_id)) else {
            return Ok(Vec::new());
        };
        let mut matches = ids
            .iter()
            .filter_map(|id| tables.rows.get(id).map(|row| decode(*id, row)))
            .collect::<Result<Vec<_>, _>>()?;
        matches.sort_by_key(|m| (m.stage != crate::models::Stage::Group, m.round, m.match_number));
        Ok(matches)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        // Check and encode everything before touching the tables.
        let mut inserts = Vec::with_capacity(batch.inserts.len());
        for m in &batch.inserts {
            if tables.rows.contains_key(&m.id) || inserts.iter().any(|(id, _, _)| *id == m.id) {
                return Err(StoreError::DuplicateKey(m.id));
            }
            inserts.push((m.id, (m.tournament_id, m.category_id), encode(m)?));
        }
        let mut updates = Vec::with_capacity(batch.updates.len());
        for m in &batch.updates {
            let row = tables.rows.get(&m.id).ok_or(StoreError::Missing(m.id))?;
            let stored = decode(m.id, row)?;
            if m.version != stored.version + 1 {
                return Err(StoreError::Conflict(m.id));
            }
            updates.push((m.id, encode(m)?));
        }

        for (id, key, row) in inserts {
            tables.rows.insert(id, row);
            tables.by_category.entry(key).or_default().push(id);
        }
        for (id, row) in updates {
            tables.rows.insert(id, row);
        }
        Ok(())
    }
}
