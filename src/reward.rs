//! Reward composition.
//!
//! Turns a base amount into a final amount using the same modifier
//! discipline as combat. XP rewards go through the boost lane
//! (`xp_multiplier`), everything else through its own factor.

use crate::config::RewardConfig;
use crate::context::PlayerContext;
use crate::modifier::{ModifierField, ModifierModel};
use serde::{Deserialize, Serialize};
use tracing::info;

/// What a reward pays out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Xp,
    Gold,
    StrengthXp,
    CardioXp,
    /// Loot roll weight handed to the external catalog.
    Loot,
}

impl RewardKind {
    /// Fields whose buffs are reported for this kind.
    pub fn fields(self) -> &'static [ModifierField] {
        match self {
            RewardKind::Xp => &[ModifierField::XpGain, ModifierField::XpBoostPoints],
            RewardKind::Gold => &[ModifierField::GoldGain],
            RewardKind::StrengthXp => &[
                ModifierField::StrengthXp,
                ModifierField::XpGain,
                ModifierField::XpBoostPoints,
            ],
            RewardKind::CardioXp => &[
                ModifierField::CardioXp,
                ModifierField::XpGain,
                ModifierField::XpBoostPoints,
            ],
            RewardKind::Loot => &[ModifierField::LootLuck],
        }
    }

    /// The single multiplier applied to a base amount of this kind.
    pub fn multiplier(self, modifiers: &ModifierModel) -> f64 {
        match self {
            RewardKind::Xp => modifiers.xp_multiplier(),
            RewardKind::Gold => modifiers.gold_gain.value(),
            RewardKind::StrengthXp => modifiers.strength_xp.value() * modifiers.xp_multiplier(),
            RewardKind::CardioXp => modifiers.cardio_xp.value() * modifiers.xp_multiplier(),
            RewardKind::Loot => modifiers.loot_luck.value(),
        }
    }
}

/// A composed reward. Never persisted; the caller writes the balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardResult {
    pub kind: RewardKind,
    pub base_amount: u64,
    pub applied_multiplier: f64,
    pub final_amount: u64,
    /// Every active buff that touched a field relevant to `kind`.
    pub applied_buff_names: Vec<String>,
}

/// Apply the context's modifiers to `base_amount`.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use titanstat::context::PlayerContext;
/// use titanstat::reward::{compose, RewardKind};
/// use titanstat::snapshot::{Archetype, PlayerSnapshot, Snapshot, SubscriptionTier};
/// use titanstat::{EngineConfig, PlayerId};
///
/// let player = PlayerSnapshot {
///     id: PlayerId::new("p-1"),
///     display_name: "Ana".into(),
///     archetype: Archetype::Wanderer,
///     level: 3,
///     xp: 0,
///     subscription: SubscriptionTier::Free,
///     streak_days: 0,
///     mood: None,
///     recovery_score: 0,
/// };
/// let snapshot = Snapshot::bare(player, Utc::now());
/// let ctx = PlayerContext::from_snapshot(&snapshot, &EngineConfig::default()).unwrap();
///
/// // Level 3 players get the +50% apprentice boost.
/// let reward = compose(RewardKind::Xp, 100, &ctx);
/// assert_eq!(reward.final_amount, 150);
/// assert_eq!(reward.applied_buff_names, vec!["Apprentice Boost".to_string()]);
/// ```
pub fn compose(kind: RewardKind, base_amount: u64, context: &PlayerContext) -> RewardResult {
    let applied_multiplier = kind.multiplier(&context.modifiers);
    let final_amount = (base_amount as f64 * applied_multiplier).floor().max(0.0) as u64;
    let applied_buff_names = context.buffs_touching(kind.fields());
    info!(
        player = %context.identity.player_id,
        ?kind,
        base_amount,
        applied_multiplier,
        final_amount,
        "reward composed"
    );
    RewardResult {
        kind,
        base_amount,
        applied_multiplier,
        final_amount,
        applied_buff_names,
    }
}

/// In-game events that pay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RewardEvent {
    /// A logged training set; `volume` is weight x reps.
    SetCompleted { volume: u64 },
    WaveSurvived { wave: u32 },
    EncounterWon { opponent_level: u32 },
}

impl RewardEvent {
    /// Base amounts this event pays, before modifiers.
    pub fn base_amounts(self, config: &RewardConfig) -> Vec<(RewardKind, u64)> {
        match self {
            RewardEvent::SetCompleted { volume } => {
                let xp = volume / config.volume_per_xp.max(1);
                vec![(RewardKind::Xp, xp), (RewardKind::StrengthXp, xp)]
            }
            RewardEvent::WaveSurvived { wave } => vec![
                (RewardKind::Xp, config.xp_per_wave * u64::from(wave)),
                (RewardKind::Gold, config.gold_per_wave * u64::from(wave)),
            ],
            RewardEvent::EncounterWon { opponent_level } => {
                let level = u64::from(opponent_level.max(1));
                vec![
                    (RewardKind::Xp, config.encounter_xp * level),
                    (RewardKind::Gold, config.encounter_gold * level),
                ]
            }
        }
    }
}

/// Compose every reward an event pays.
pub fn compose_event(
    event: RewardEvent,
    context: &PlayerContext,
    config: &RewardConfig,
) -> Vec<RewardResult> {
    event
        .base_amounts(config)
        .into_iter()
        .map(|(kind, base)| compose(kind, base, context))
        .collect()
}
