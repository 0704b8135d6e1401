//! Turn-based combat.
//!
//! - [`opponent`] - opponent definitions and level scaling
//! - [`session`] - encounter session state and transcript
//! - [`engine`] - pure turn resolution
//! - [`service`] - store-backed encounter flow with optimistic concurrency

pub mod engine;
pub mod opponent;
pub mod service;
pub mod session;

pub use engine::{resolve_turn, start_encounter};
pub use opponent::{Difficulty, OpponentDefinition, OpponentScaling, ScaledOpponent};
pub use service::EncounterService;
pub use session::{
    Actor, CombatAction, EncounterOutcome, EncounterSession, EncounterState, TranscriptEntry,
};
