//! Engine configuration.
//!
//! All tunable constants live here so that balance changes never touch the
//! formulas. Every section has sane defaults; a JSON document only needs to
//! name what it overrides.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Combat formula parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Damage multiplier applied on a critical hit.
    pub crit_multiplier: f64,
    /// Defense is divided by this before being subtracted from damage.
    pub defense_divisor: u32,
    /// Floor for any landed hit.
    pub minimum_damage: u32,
    /// Fraction of counter damage absorbed by `Guard`.
    pub guard_reduction: f64,
    pub base_attack: u32,
    pub base_defense: u32,
    /// HP pool used when a player has no character record.
    pub base_hp: u32,
    /// Damage dealt per unit of training volume at `attack_power == 1.0`.
    pub base_damage_per_volume: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            crit_multiplier: 1.5,
            defense_divisor: 2,
            minimum_damage: 1,
            guard_reduction: 0.5,
            base_attack: 10,
            base_defense: 5,
            base_hp: 100,
            base_damage_per_volume: 0.01,
        }
    }
}

/// Leveling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Slope of the default linear curve: `threshold(level) = level * xp_per_level`.
    pub xp_per_level: u64,
    /// Character max HP gained per level.
    pub max_hp_per_level: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_per_level: 1000,
            max_hp_per_level: 10,
        }
    }
}

/// Base reward amounts per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Training volume (kg x reps) worth one XP.
    pub volume_per_xp: u64,
    pub xp_per_wave: u64,
    pub gold_per_wave: u64,
    pub encounter_xp: u64,
    pub encounter_gold: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            volume_per_xp: 100,
            xp_per_wave: 25,
            gold_per_wave: 5,
            encounter_xp: 100,
            encounter_gold: 50,
        }
    }
}

/// Power summary recomputation and decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Players idle at least this many days are decayed instead of recomputed.
    pub inactivity_days: i64,
    /// Length of one decay period in days.
    pub period_days: i64,
    /// Score multiplier per elapsed period, in `(0, 1]`.
    pub factor: f64,
    pub level_weight: u64,
    pub performance_weight: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            inactivity_days: 7,
            period_days: 7,
            factor: 0.95,
            level_weight: 10,
            performance_weight: 1.0,
        }
    }
}

/// Skill socket limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    pub max_socketed: usize,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self { max_socketed: 4 }
    }
}

/// Thresholds for deriving mood when none is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    /// Below this `hp / max_hp` ratio the player is weakened.
    pub weakened_hp_ratio: f64,
    /// At or above this recovery score the player is focused.
    pub focused_recovery_score: u32,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            weakened_hp_ratio: 0.3,
            focused_recovery_score: 80,
        }
    }
}

/// Top-level engine configuration.
///
/// # Examples
///
/// ```rust
/// use titanstat::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "combat": { "crit_multiplier": 2.0 } }"#).unwrap();
/// assert_eq!(config.combat.crit_multiplier, 2.0);
/// assert_eq!(config.decay.factor, 0.95);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub combat: CombatConfig,
    pub progression: ProgressionConfig,
    pub rewards: RewardConfig,
    pub decay: DecayConfig,
    pub skills: SkillConfig,
    pub mood: MoodConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break formula invariants.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));
        if !(self.combat.crit_multiplier >= 1.0) {
            return fail("combat.crit_multiplier must be >= 1");
        }
        if self.combat.defense_divisor == 0 {
            return fail("combat.defense_divisor must be > 0");
        }
        if !(0.0..=1.0).contains(&self.combat.guard_reduction) {
            return fail("combat.guard_reduction must be in [0, 1]");
        }
        if self.progression.xp_per_level == 0 {
            return fail("progression.xp_per_level must be > 0");
        }
        if self.rewards.volume_per_xp == 0 {
            return fail("rewards.volume_per_xp must be > 0");
        }
        if !(self.decay.factor > 0.0 && self.decay.factor <= 1.0) {
            return fail("decay.factor must be in (0, 1]");
        }
        if self.decay.period_days <= 0 {
            return fail("decay.period_days must be > 0");
        }
        if self.decay.inactivity_days < 0 {
            return fail("decay.inactivity_days must be >= 0");
        }
        Ok(())
    }
}
