//! Leveling loop.
//!
//! The threshold curve is a trait so balance can swap it without touching
//! the loop. Any `Fn(u32) -> u64` is a curve.

use crate::config::ProgressionConfig;
use crate::error::{EngineError, Result};
use crate::snapshot::{CharacterSnapshot, PlayerSnapshot};
use serde::{Deserialize, Serialize};
use tracing::info;

/// XP needed to advance from `level` to `level + 1`.
///
/// Must be non-decreasing in `level` and never zero.
pub trait LevelCurve {
    fn threshold(&self, level: u32) -> u64;
}

impl<F> LevelCurve for F
where
    F: Fn(u32) -> u64,
{
    fn threshold(&self, level: u32) -> u64 {
        self(level)
    }
}

/// `threshold(level) = level * xp_per_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearCurve {
    pub xp_per_level: u64,
}

impl LinearCurve {
    pub fn new(xp_per_level: u64) -> Self {
        Self { xp_per_level }
    }

    pub fn from_config(config: &ProgressionConfig) -> Self {
        Self::new(config.xp_per_level)
    }
}

impl Default for LinearCurve {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl LevelCurve for LinearCurve {
    fn threshold(&self, level: u32) -> u64 {
        u64::from(level).saturating_mul(self.xp_per_level)
    }
}

/// Stored XP and level of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// XP accumulated toward the next level.
    pub xp: u64,
    pub level: u32,
}

impl LevelProgress {
    pub fn new(xp: u64, level: u32) -> Self {
        Self { xp, level }
    }

    pub fn of(player: &PlayerSnapshot) -> Self {
        Self::new(player.xp, player.level)
    }
}

/// Result of one XP grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelOutcome {
    pub xp: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub levels_gained: u32,
    /// Character max HP gained with the new levels.
    pub max_hp_gain: u32,
}

impl LevelOutcome {
    /// Write the new level, XP and HP growth in one step.
    pub fn apply_to(&self, player: &mut PlayerSnapshot, character: Option<&mut CharacterSnapshot>) {
        player.xp = self.xp;
        player.level = self.level;
        if let Some(c) = character {
            c.max_hp = c.max_hp.saturating_add(self.max_hp_gain);
            c.hp = c.hp.saturating_add(self.max_hp_gain).min(c.max_hp);
        }
    }
}

/// Add `grant` XP and level up as many times as it covers.
///
/// Each threshold crossed is subtracted and the level increments; the loop
/// repeats while the remaining XP still covers the next threshold.
///
/// # Arguments
///
/// * `progress` - Current XP and level
/// * `grant` - XP awarded, already scaled by the reward composer
/// * `curve` - Threshold per level
/// * `config` - Max HP gained per level
///
/// # Returns
///
/// The new XP and level with the number of levels gained. A zero grant
/// returns `progress` unchanged. A curve that yields a zero threshold
/// fails with `InvalidLevelCurve`.
///
/// # Examples
///
/// ```rust
/// use titanstat::config::ProgressionConfig;
/// use titanstat::leveling::{apply_xp, LevelProgress, LinearCurve};
///
/// let config = ProgressionConfig::default();
/// let curve = LinearCurve::new(1000);
/// let outcome = apply_xp(LevelProgress::new(900, 1), 300, &curve, &config).unwrap();
/// assert_eq!((outcome.xp, outcome.level), (200, 2));
/// assert!(outcome.leveled_up);
/// ```
pub fn apply_xp<C>(
    progress: LevelProgress,
    grant: u64,
    curve: &C,
    config: &ProgressionConfig,
) -> Result<LevelOutcome>
where
    C: LevelCurve + ?Sized,
{
    let mut xp = progress.xp;
    let mut level = progress.level;

    if grant > 0 {
        xp = xp.saturating_add(grant);
        while level < u32::MAX {
            let threshold = curve.threshold(level);
            if threshold == 0 {
                return Err(EngineError::InvalidLevelCurve { level });
            }
            if xp < threshold {
                break;
            }
            xp -= threshold;
            level += 1;
        }
    }

    let levels_gained = level - progress.level;
    let outcome = LevelOutcome {
        xp,
        level,
        leveled_up: levels_gained > 0,
        levels_gained,
        max_hp_gain: levels_gained.saturating_mul(config.max_hp_per_level),
    };
    if outcome.leveled_up {
        info!(
            from = progress.level,
            to = level,
            max_hp_gain = outcome.max_hp_gain,
            "level up"
        );
    }
    Ok(outcome)
}
