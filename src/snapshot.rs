//! Snapshot module.
//!
//! Plain data read from the external store. The engine never owns these
//! records; it reads them once per request and derives everything else.

use crate::buff::BuffSource;
use crate::error::Result;
use crate::ids::{DecreeId, ItemId, PlayerId, SkillId};
use crate::modifier::{ModifierField, ModifierModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player-chosen class with a permanent stat profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Raw strength at the cost of stamina.
    Juggernaut,
    /// Endurance at the cost of attack.
    Pathfinder,
    /// Defense at the cost of attack.
    Sentinel,
    /// No specialization.
    #[default]
    Wanderer,
}

/// Paid subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Plus,
    Pro,
}

/// Mood/fatigue state derived from recent activity and health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Weakened,
    Neutral,
    Focused,
}

/// Identity and progression record of a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub display_name: String,
    #[serde(default)]
    pub archetype: Archetype,
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub subscription: SubscriptionTier,
    /// Consecutive active days.
    #[serde(default)]
    pub streak_days: u32,
    /// Explicitly stored mood; derived from health when absent.
    #[serde(default)]
    pub mood: Option<Mood>,
    /// Recovery score in `0..=100` reported by the activity tracker.
    #[serde(default)]
    pub recovery_score: u32,
}

/// Character ("titan") record with base stats and HP pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub strength: u32,
    #[serde(default)]
    pub endurance: u32,
    pub hp: u32,
    pub max_hp: u32,
}

/// One contribution of an item or skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Percentage change of a multiplicative field, e.g. `+20` strength XP.
    Percent { field: ModifierField, percent: f64 },
    /// Flat amount added to an additive field.
    Flat { field: ModifierField, amount: f64 },
}

impl Effect {
    /// Fold this effect into `model` on behalf of `origin`.
    pub fn apply(self, model: ModifierModel, origin: BuffSource) -> Result<ModifierModel> {
        match self {
            Effect::Percent { field, percent } => model.with_percent(origin, field, percent),
            Effect::Flat { field, amount } => model.with_flat(origin, field, amount),
        }
    }
}

/// An inventory item; only `equipped` items contribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub item_id: ItemId,
    pub name: String,
    pub equipped: bool,
    /// Flat combat power added to effective attack.
    #[serde(default)]
    pub power: u32,
    /// Flat armor added to effective defense.
    #[serde(default)]
    pub armor: u32,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// A node of the skill tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub prerequisites: Vec<SkillId>,
}

/// A player's skill tree state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    pub definitions: Vec<SkillDefinition>,
    pub unlocked: Vec<SkillId>,
    pub socketed: Vec<SkillId>,
}

/// Competitive rank profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankSnapshot {
    pub score: u32,
}

/// A time-limited, externally granted XP bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decree {
    pub id: DecreeId,
    pub name: String,
    pub xp_boost_points: f64,
    pub expires_at: DateTime<Utc>,
}

impl Decree {
    /// Whether the decree still applies at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Everything the buff sources read for one player, loaded in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub player: PlayerSnapshot,
    pub character: Option<CharacterSnapshot>,
    pub equipment: Vec<EquipmentItem>,
    pub skills: Option<SkillSnapshot>,
    pub rank: Option<RankSnapshot>,
    pub decrees: Vec<Decree>,
    pub now: DateTime<Utc>,
}

impl Snapshot {
    /// A snapshot with only the required player record.
    pub fn bare(player: PlayerSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            player,
            character: None,
            equipment: Vec::new(),
            skills: None,
            rank: None,
            decrees: Vec::new(),
            now,
        }
    }

    /// Items that are currently equipped.
    pub fn equipped(&self) -> impl Iterator<Item = &EquipmentItem> {
        self.equipment.iter().filter(|item| item.equipped)
    }
}
