//! Opponent definitions and level scaling.

use crate::ids::OpponentId;
use serde::{Deserialize, Serialize};

/// Encounter difficulty, scaling opponent counter damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Multiplier applied to the opponent's scripted damage.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// How an opponent's pools grow with level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum OpponentScaling {
    /// Scripted stats, used as-is.
    #[default]
    Fixed,
    /// HP and damage grow by `percent` for every level above 1.
    PerLevel { percent: f64 },
    /// Like `PerLevel`, but the opponent takes the player's level.
    MatchPlayer { percent: f64 },
}

/// Catalog entry for an opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentDefinition {
    pub id: OpponentId,
    pub name: String,
    pub base_hp: u32,
    pub base_damage: u32,
    #[serde(default)]
    pub defense: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub scaling: OpponentScaling,
    #[serde(default)]
    pub difficulty: Difficulty,
}

fn default_level() -> u32 {
    1
}

/// Opponent stats fixed for the lifetime of one encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledOpponent {
    pub level: u32,
    pub max_hp: u32,
    /// Counter damage after difficulty scaling.
    pub damage: u32,
    pub defense: u32,
}

impl OpponentDefinition {
    /// Scale this opponent for a fight against a player of `player_level`.
    ///
    /// ```rust
    /// use titanstat::combat::{Difficulty, OpponentDefinition, OpponentScaling};
    /// use titanstat::OpponentId;
    ///
    /// let golem = OpponentDefinition {
    ///     id: OpponentId::new("golem"),
    ///     name: "Iron Golem".into(),
    ///     base_hp: 200,
    ///     base_damage: 20,
    ///     defense: 10,
    ///     level: 3,
    ///     scaling: OpponentScaling::PerLevel { percent: 10.0 },
    ///     difficulty: Difficulty::Hard,
    /// };
    /// let scaled = golem.scaled(50);
    /// assert_eq!(scaled.level, 3);
    /// assert_eq!(scaled.max_hp, 240);  // 200 * 1.2
    /// assert_eq!(scaled.damage, 36);   // 20 * 1.2 * 1.5
    /// ```
    pub fn scaled(&self, player_level: u32) -> ScaledOpponent {
        let (level, percent) = match self.scaling {
            OpponentScaling::Fixed => (self.level, 0.0),
            OpponentScaling::PerLevel { percent } => (self.level, percent),
            OpponentScaling::MatchPlayer { percent } => (player_level.max(1), percent),
        };
        let growth = (1.0 + percent / 100.0 * f64::from(level.saturating_sub(1))).max(0.0);
        let max_hp = (f64::from(self.base_hp) * growth).floor().max(1.0) as u32;
        let damage =
            (f64::from(self.base_damage) * growth * self.difficulty.multiplier()).floor() as u32;
        ScaledOpponent {
            level,
            max_hp,
            damage,
            defense: self.defense,
        }
    }
}
