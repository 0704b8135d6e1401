//! Persistence boundary.
//!
//! The engine owns no storage. It reads snapshots and writes back deltas
//! through these traits, which the surrounding application implements on
//! top of its relational store. `InMemoryStore` is the reference
//! implementation used by tests and local tools.

use crate::combat::{EncounterSession, OpponentDefinition};
use crate::error::{EngineError, Result};
use crate::ids::{OpponentId, PlayerId, SessionId};
use crate::power::PowerSummary;
use crate::snapshot::{
    CharacterSnapshot, Decree, EquipmentItem, PlayerSnapshot, RankSnapshot, SkillSnapshot,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Read access to player records.
///
/// Only `load_player` identifies a player; every other loader may come back
/// empty without that being an error.
pub trait PlayerStore: Send + Sync {
    fn load_player(&self, id: &PlayerId) -> Result<Option<PlayerSnapshot>>;
    fn load_character(&self, id: &PlayerId) -> Result<Option<CharacterSnapshot>>;
    fn load_equipment(&self, id: &PlayerId) -> Result<Vec<EquipmentItem>>;
    fn load_skills(&self, id: &PlayerId) -> Result<Option<SkillSnapshot>>;
    fn load_rank(&self, id: &PlayerId) -> Result<Option<RankSnapshot>>;
    /// Decrees granted to the player, expired ones included.
    fn load_decrees(&self, id: &PlayerId) -> Result<Vec<Decree>>;
}

/// Lookup of opponent definitions.
pub trait OpponentCatalog: Send + Sync {
    fn opponent(&self, id: &OpponentId) -> Result<Option<OpponentDefinition>>;
}

/// Encounter session records with optimistic concurrency.
pub trait SessionStore: Send + Sync {
    fn load_session(&self, id: &SessionId) -> Result<Option<EncounterSession>>;

    /// Store a brand-new session; an id already in use fails with
    /// `SessionExists`.
    fn insert_session(&self, session: &EncounterSession) -> Result<()>;

    /// Replace the stored session only if its version is still
    /// `expected_version`; otherwise fail with `SessionConflict`.
    fn compare_and_swap(&self, session: &EncounterSession, expected_version: u64) -> Result<()>;
}

/// Power summaries consumed by matchmaking and leaderboards.
pub trait PowerStore: Send + Sync {
    /// Every tracked summary, in a stable order.
    fn tracked(&self) -> Result<Vec<PowerSummary>>;
    fn save_summary(&self, summary: &PowerSummary) -> Result<()>;
}

/// All records of one player as the in-memory store keeps them.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player: PlayerSnapshot,
    pub character: Option<CharacterSnapshot>,
    pub equipment: Vec<EquipmentItem>,
    pub skills: Option<SkillSnapshot>,
    pub rank: Option<RankSnapshot>,
    pub decrees: Vec<Decree>,
}

impl PlayerRecord {
    /// A record with only the player row.
    pub fn new(player: PlayerSnapshot) -> Self {
        Self {
            player,
            character: None,
            equipment: Vec::new(),
            skills: None,
            rank: None,
            decrees: Vec::new(),
        }
    }
}

fn poisoned<T>(_: T) -> EngineError {
    EngineError::PersistenceFailure(String::from("lock poisoned"))
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    players: RwLock<HashMap<PlayerId, PlayerRecord>>,
    opponents: RwLock<HashMap<OpponentId, OpponentDefinition>>,
    sessions: RwLock<HashMap<SessionId, EncounterSession>>,
    summaries: RwLock<BTreeMap<PlayerId, PowerSummary>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a player record.
    pub fn put_player(&self, record: PlayerRecord) -> Result<()> {
        let mut players = self.players.write().map_err(poisoned)?;
        players.insert(record.player.id.clone(), record);
        Ok(())
    }

    /// Apply `f` to a stored player record, e.g. after a reward write-back.
    pub fn update_player<F>(&self, id: &PlayerId, f: F) -> Result<()>
    where
        F: FnOnce(&mut PlayerRecord),
    {
        let mut players = self.players.write().map_err(poisoned)?;
        let record = players
            .get_mut(id)
            .ok_or_else(|| EngineError::PlayerNotFound(id.clone()))?;
        f(record);
        Ok(())
    }

    /// Insert or replace an opponent definition.
    pub fn put_opponent(&self, opponent: OpponentDefinition) -> Result<()> {
        let mut opponents = self.opponents.write().map_err(poisoned)?;
        opponents.insert(opponent.id.clone(), opponent);
        Ok(())
    }

    /// Load a JSON array of opponent definitions into the catalog.
    pub fn load_opponents_json(&self, json: &str) -> Result<usize> {
        let defs: Vec<OpponentDefinition> = serde_json::from_str(json)
            .map_err(|e| EngineError::PersistenceFailure(format!("opponent catalog: {e}")))?;
        let count = defs.len();
        for def in defs {
            self.put_opponent(def)?;
        }
        Ok(count)
    }

    /// Start tracking a power summary.
    pub fn put_summary(&self, summary: PowerSummary) -> Result<()> {
        self.save_summary(&summary)
    }

    /// Read back one power summary.
    pub fn summary(&self, id: &PlayerId) -> Result<Option<PowerSummary>> {
        let summaries = self.summaries.read().map_err(poisoned)?;
        Ok(summaries.get(id).cloned())
    }

    fn with_record<T>(
        &self,
        id: &PlayerId,
        f: impl FnOnce(&PlayerRecord) -> T,
    ) -> Result<Option<T>> {
        let players = self.players.read().map_err(poisoned)?;
        Ok(players.get(id).map(f))
    }
}

impl PlayerStore for InMemoryStore {
    fn load_player(&self, id: &PlayerId) -> Result<Option<PlayerSnapshot>> {
        self.with_record(id, |r| r.player.clone())
    }

    fn load_character(&self, id: &PlayerId) -> Result<Option<CharacterSnapshot>> {
        Ok(self.with_record(id, |r| r.character.clone())?.flatten())
    }

    fn load_equipment(&self, id: &PlayerId) -> Result<Vec<EquipmentItem>> {
        Ok(self.with_record(id, |r| r.equipment.clone())?.unwrap_or_default())
    }

    fn load_skills(&self, id: &PlayerId) -> Result<Option<SkillSnapshot>> {
        Ok(self.with_record(id, |r| r.skills.clone())?.flatten())
    }

    fn load_rank(&self, id: &PlayerId) -> Result<Option<RankSnapshot>> {
        Ok(self.with_record(id, |r| r.rank)?.flatten())
    }

    fn load_decrees(&self, id: &PlayerId) -> Result<Vec<Decree>> {
        Ok(self.with_record(id, |r| r.decrees.clone())?.unwrap_or_default())
    }
}

impl OpponentCatalog for InMemoryStore {
    fn opponent(&self, id: &OpponentId) -> Result<Option<OpponentDefinition>> {
        let opponents = self.opponents.read().map_err(poisoned)?;
        Ok(opponents.get(id).cloned())
    }
}

impl SessionStore for InMemoryStore {
    fn load_session(&self, id: &SessionId) -> Result<Option<EncounterSession>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(id).cloned())
    }

    fn insert_session(&self, session: &EncounterSession) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.contains_key(&session.session_id) {
            return Err(EngineError::SessionExists(session.session_id.clone()));
        }
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    fn compare_and_swap(&self, session: &EncounterSession, expected_version: u64) -> Result<()> {
        // Check and write under one write lock.
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let stored = sessions
            .get_mut(&session.session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session.session_id.clone()))?;
        if stored.version != expected_version {
            return Err(EngineError::SessionConflict {
                session_id: session.session_id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }
        *stored = session.clone();
        Ok(())
    }
}

impl PowerStore for InMemoryStore {
    fn tracked(&self) -> Result<Vec<PowerSummary>> {
        let summaries = self.summaries.read().map_err(poisoned)?;
        Ok(summaries.values().cloned().collect())
    }

    fn save_summary(&self, summary: &PowerSummary) -> Result<()> {
        let mut summaries = self.summaries.write().map_err(poisoned)?;
        summaries.insert(summary.player_id.clone(), summary.clone());
        Ok(())
    }
}
