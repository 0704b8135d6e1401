//! Store-backed encounter flow.
//!
//! Every turn is a read-modify-write of one session record: load, check
//! ownership, rebuild the player context, resolve, then compare-and-swap
//! on the loaded version. A stale version fails with `SessionConflict`
//! and the stored session stays as it was.

use crate::combat::engine::{resolve_turn, start_encounter};
use crate::combat::session::{CombatAction, EncounterOutcome, EncounterSession};
use crate::config::EngineConfig;
use crate::context::ContextBuilder;
use crate::error::{EngineError, Result};
use crate::ids::{OpponentId, PlayerId, SessionId};
use crate::store::{OpponentCatalog, PlayerStore, SessionStore};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Starts encounters and submits turns against the stores.
pub struct EncounterService<'a> {
    players: &'a dyn PlayerStore,
    sessions: &'a dyn SessionStore,
    opponents: &'a dyn OpponentCatalog,
    config: &'a EngineConfig,
}

impl<'a> EncounterService<'a> {
    pub fn new(
        players: &'a dyn PlayerStore,
        sessions: &'a dyn SessionStore,
        opponents: &'a dyn OpponentCatalog,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            players,
            sessions,
            opponents,
            config,
        }
    }

    /// Start an encounter with a random crit seed.
    pub fn begin(
        &self,
        player_id: &PlayerId,
        opponent_id: &OpponentId,
        now: DateTime<Utc>,
    ) -> Result<EncounterSession> {
        self.begin_seeded(player_id, opponent_id, rand::random::<u64>(), now)
    }

    /// Start an encounter with a caller-chosen seed, for replays.
    ///
    /// The seed fixes every crit roll, not the session: each call stores a
    /// fresh session, so the same seed can be replayed any number of times.
    pub fn begin_seeded(
        &self,
        player_id: &PlayerId,
        opponent_id: &OpponentId,
        seed: u64,
        now: DateTime<Utc>,
    ) -> Result<EncounterSession> {
        let context = ContextBuilder::new(self.players, self.config).build(player_id, now)?;
        let opponent = self
            .opponents
            .opponent(opponent_id)?
            .ok_or_else(|| EngineError::OpponentNotFound(opponent_id.clone()))?;

        let session_id = new_session_id(player_id, opponent_id, seed);
        let session = start_encounter(session_id, seed, &context, &opponent);
        self.sessions.insert_session(&session)?;

        info!(
            session = %session.session_id,
            player = %player_id,
            opponent = %opponent_id,
            opponent_level = session.opponent.level,
            player_hp = session.player_hp,
            opponent_hp = session.opponent_hp,
            "encounter started"
        );
        Ok(session)
    }

    /// Resolve one turn of `session_id` for `player_id`.
    pub fn submit_turn(
        &self,
        player_id: &PlayerId,
        session_id: &SessionId,
        action: CombatAction,
        now: DateTime<Utc>,
    ) -> Result<EncounterSession> {
        let session = self.load_owned(player_id, session_id)?;
        if session.is_resolved() {
            return Err(EngineError::EncounterAlreadyResolved {
                session_id: session_id.clone(),
                state: session.state,
            });
        }

        let context = ContextBuilder::new(self.players, self.config).build(player_id, now)?;
        let next = resolve_turn(&session, action, &context, &self.config.combat)?;

        if let Err(err) = self.sessions.compare_and_swap(&next, session.version) {
            if let EngineError::SessionConflict { found, .. } = &err {
                warn!(
                    session = %session_id,
                    expected = session.version,
                    found,
                    "stale turn rejected"
                );
            }
            return Err(err);
        }

        if next.is_resolved() {
            info!(
                session = %session_id,
                player = %player_id,
                state = %next.state,
                turns = next.turn_count,
                "encounter resolved"
            );
        }
        Ok(next)
    }

    /// Terminal report for a resolved session; `None` while still active.
    pub fn outcome(
        &self,
        player_id: &PlayerId,
        session_id: &SessionId,
    ) -> Result<Option<EncounterOutcome>> {
        let session = self.load_owned(player_id, session_id)?;
        Ok(session
            .is_resolved()
            .then(|| EncounterOutcome::from_session(&session)))
    }

    fn load_owned(&self, player_id: &PlayerId, session_id: &SessionId) -> Result<EncounterSession> {
        let session = self
            .sessions
            .load_session(session_id)?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.clone()))?;
        if &session.player_id != player_id {
            return Err(EngineError::EncounterNotOwned {
                session_id: session_id.clone(),
                player_id: player_id.clone(),
            });
        }
        Ok(session)
    }
}

/// `enc-{player}-{opponent}-{seed}-{nonce}`; the nonce keeps replays of
/// one seed apart.
fn new_session_id(player_id: &PlayerId, opponent_id: &OpponentId, seed: u64) -> SessionId {
    let nonce = rand::random::<u32>();
    SessionId::from(format!("enc-{player_id}-{opponent_id}-{seed:016x}-{nonce:08x}"))
}
