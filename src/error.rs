//! Error types for the engine.
//!
//! Every failure a caller can observe is represented by the
//! `EngineError` enum. Missing optional sub-records never surface here;
//! they degrade to "no contribution" inside the buff sources.

use crate::buff::BuffSource;
use crate::combat::EncounterState;
use crate::ids::{OpponentId, PlayerId, SessionId, SkillId};
use crate::modifier::ModifierField;
use thiserror::Error;

/// Format a prerequisite cycle as a readable string.
fn format_skill_path(path: &[SkillId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur while building contexts, resolving encounters,
/// composing rewards or running the decay pass.
///
/// # Examples
///
/// ```rust
/// use titanstat::{EngineError, PlayerId};
///
/// let err = EngineError::PlayerNotFound(PlayerId::new("p-404"));
/// assert_eq!(err.to_string(), "Player not found: p-404");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The player snapshot could not be loaded.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The opponent id is not in the catalog.
    #[error("Opponent not found: {0}")]
    OpponentNotFound(OpponentId),

    /// No encounter session is stored under this id.
    #[error("Encounter session not found: {0}")]
    SessionNotFound(SessionId),

    /// A turn was submitted against a session in a terminal state.
    #[error("Encounter {session_id} is already resolved ({state})")]
    EncounterAlreadyResolved {
        session_id: SessionId,
        state: EncounterState,
    },

    /// A player tried to act on a session they did not initiate.
    #[error("Encounter {session_id} is not owned by player {player_id}")]
    EncounterNotOwned {
        session_id: SessionId,
        player_id: PlayerId,
    },

    /// A new session was inserted under an id that is already stored.
    #[error("Encounter session already exists: {0}")]
    SessionExists(SessionId),

    /// The stored session moved on between read and write.
    #[error("Encounter {session_id} changed concurrently (expected v{expected}, found v{found})")]
    SessionConflict {
        session_id: SessionId,
        expected: u64,
        found: u64,
    },

    /// A buff source produced a factor that is not strictly positive.
    #[error("Invalid modifier from {origin}: {field} = {value}")]
    InvalidModifier {
        origin: BuffSource,
        field: ModifierField,
        value: f64,
    },

    /// The skill prerequisite graph contains a cycle.
    #[error("Skill tree cycle: {}", format_skill_path(.path))]
    InvalidSkillTree { path: Vec<SkillId> },

    /// The level curve returned a zero threshold.
    #[error("Level curve returned a zero threshold at level {level}")]
    InvalidLevelCurve { level: u32 },

    /// The external store failed; never masked.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// The engine configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
