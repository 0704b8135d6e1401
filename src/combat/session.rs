//! Encounter session state.

use crate::combat::opponent::ScaledOpponent;
use crate::ids::{OpponentId, PlayerId, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an encounter. `Victory` and `Defeat` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterState {
    Active,
    Victory,
    Defeat,
}

impl EncounterState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, EncounterState::Active)
    }
}

impl fmt::Display for EncounterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncounterState::Active => "ACTIVE",
            EncounterState::Victory => "VICTORY",
            EncounterState::Defeat => "DEFEAT",
        };
        f.write_str(name)
    }
}

/// What the player does on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatAction {
    /// Strike the opponent.
    Attack,
    /// Deal nothing, absorb part of the counter.
    Guard,
}

/// Who acted in a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Player,
    Opponent,
}

/// One line of the append-only combat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// 1-based turn this entry belongs to.
    pub turn: u32,
    pub actor: Actor,
    /// The player's action; opponents always counter-attack.
    pub action: CombatAction,
    pub damage: u32,
    pub crit: bool,
    pub player_hp: u32,
    pub opponent_hp: u32,
}

/// Mutable per-player, per-opponent combat state.
///
/// The external store is the source of truth between turns; `version` is
/// the optimistic-concurrency token checked on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSession {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub opponent_id: OpponentId,
    pub opponent: ScaledOpponent,
    pub player_hp: u32,
    pub player_max_hp: u32,
    pub opponent_hp: u32,
    pub opponent_max_hp: u32,
    pub turn_count: u32,
    pub transcript: Vec<TranscriptEntry>,
    pub state: EncounterState,
    /// Seed for per-turn crit rolls.
    pub seed: u64,
    pub version: u64,
}

impl EncounterSession {
    pub fn is_resolved(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Terminal report handed to the loot/reward caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterOutcome {
    pub state: EncounterState,
    pub turns: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub crits: u32,
    pub opponent_level: u32,
}

impl EncounterOutcome {
    /// Summarize a session from its transcript.
    pub fn from_session(session: &EncounterSession) -> Self {
        let mut outcome = Self {
            state: session.state,
            turns: session.turn_count,
            damage_dealt: 0,
            damage_taken: 0,
            crits: 0,
            opponent_level: session.opponent.level,
        };
        for entry in &session.transcript {
            match entry.actor {
                Actor::Player => {
                    outcome.damage_dealt += u64::from(entry.damage);
                    outcome.crits += u32::from(entry.crit);
                }
                Actor::Opponent => outcome.damage_taken += u64::from(entry.damage),
            }
        }
        outcome
    }
}
