//! # titanstat - Player Context & Combat Resolution Engine
//!
//! The numeric core of a fitness RPG. It provides:
//! - **Modifier folding** of every power source into one typed model
//! - **Player contexts** built fresh per request from an external store
//! - **Turn-based combat** as a pure `(session, action, context) -> session` function
//! - **Rewards and leveling** through the same modifier discipline
//! - **Power decay** as a batch pass that tolerates per-player failure
//!
//! ## Core Concepts
//!
//! ### Two combination lanes
//!
//! ```text
//! [BuffSource] → [ActiveBuff] → fold → [ModifierModel] → [PlayerContext]
//! ```
//!
//! Factors from independent sources (archetype, equipment, rank, mood)
//! **multiply**. XP boost points (subscription, onboarding, decree,
//! streak) are **summed** first and turned into a single factor, so
//! frequently stacked bonuses never compound.
//!
//! ### Purity at the edges
//!
//! The engine owns no storage. Everything it reads comes through the
//! traits in [`store`], and everything it produces is plain data the
//! caller writes back.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use titanstat::combat::{CombatAction, EncounterService, EncounterState, OpponentDefinition};
//! use titanstat::snapshot::{Archetype, PlayerSnapshot, SubscriptionTier};
//! use titanstat::store::{InMemoryStore, PlayerRecord};
//! use titanstat::{EngineConfig, OpponentId, PlayerId};
//!
//! let store = InMemoryStore::new();
//! store.put_player(PlayerRecord::new(PlayerSnapshot {
//!     id: PlayerId::new("p-1"),
//!     display_name: "Ana".into(),
//!     archetype: Archetype::Juggernaut,
//!     level: 12,
//!     xp: 0,
//!     subscription: SubscriptionTier::Free,
//!     streak_days: 0,
//!     mood: None,
//!     recovery_score: 0,
//! })).unwrap();
//! store
//!     .load_opponents_json(r#"[{"id":"slime","name":"Slime","base_hp":12,"base_damage":3}]"#)
//!     .unwrap();
//!
//! let config = EngineConfig::default();
//! let service = EncounterService::new(&store, &store, &store, &config);
//! let player = PlayerId::new("p-1");
//!
//! let session = service.begin(&player, &OpponentId::new("slime"), Utc::now()).unwrap();
//! let next = service
//!     .submit_turn(&player, &session.session_id, CombatAction::Attack, Utc::now())
//!     .unwrap();
//! assert_eq!(next.state, EncounterState::Victory); // floor(10 * 1.2) >= 12
//! ```
//!
//! ## Modules
//!
//! - [`ids`] - Interned identifier types
//! - [`modifier`] - The modifier model and its fold
//! - [`buff`] - Buff sources and active buffs
//! - [`sources`] - One derivation per buff source
//! - [`skill_tree`] - Skill prerequisite graph
//! - [`snapshot`] - Records read from the store
//! - [`context`] - Player context builder
//! - [`resolved`] - Derived stats with breakdowns
//! - [`combat`] - Encounters, turn resolution and the encounter service
//! - [`reward`] - Reward composition
//! - [`leveling`] - Level curves and the leveling loop
//! - [`power`] - Power summaries and decay
//! - [`decay`] - The batch recompute/decay pass
//! - [`store`] - Persistence traits and the in-memory store
//! - [`config`] - Engine configuration
//! - [`error`] - Error types

pub mod buff;
pub mod combat;
pub mod config;
pub mod context;
pub mod decay;
pub mod error;
pub mod ids;
pub mod leveling;
pub mod modifier;
pub mod power;
pub mod resolved;
pub mod reward;
pub mod skill_tree;
pub mod snapshot;
pub mod sources;
pub mod store;

// Re-export main types for convenience
pub use buff::{ActiveBuff, BuffSource};
pub use config::EngineConfig;
pub use context::{ContextBuilder, PlayerContext};
pub use decay::{DecayPass, PassReport};
pub use error::{EngineError, Result};
pub use ids::{DecreeId, ItemId, OpponentId, PlayerId, SessionId, SkillId};
pub use leveling::{apply_xp, LevelCurve, LevelOutcome, LevelProgress, LinearCurve};
pub use modifier::{Factor, ModifierField, ModifierModel};
pub use power::{PerformanceSignals, PowerSummary};
pub use resolved::ResolvedStat;
pub use reward::{compose, RewardEvent, RewardKind, RewardResult};
pub use store::{InMemoryStore, OpponentCatalog, PlayerStore, PowerStore, SessionStore};
