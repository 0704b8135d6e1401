//! Resolved stat results module.
//!
//! Contains the `ResolvedStat` type: a derived combat stat together with
//! the breakdown of every flat source and multiplier that produced it.
//! The breakdown is what lets a player audit their numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived combat stats carried by a player context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStat {
    EffectiveAttack,
    EffectiveDefense,
    MaxHp,
}

impl fmt::Display for CombatStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CombatStat::EffectiveAttack => "effective_attack",
            CombatStat::EffectiveDefense => "effective_defense",
            CombatStat::MaxHp => "max_hp",
        };
        f.write_str(name)
    }
}

/// A resolved stat value with full breakdown information.
///
/// `value = floor(sum(sources) * product(multipliers))`.
///
/// # Examples
///
/// ```rust
/// use titanstat::resolved::{CombatStat, ResolvedStat};
///
/// let attack = ResolvedStat::builder(CombatStat::EffectiveAttack)
///     .source("Base attack", 10.0)
///     .source("Strength", 20.0)
///     .source("Equipment", 110.0)
///     .multiplier("attack_power", 1.2)
///     .resolve();
///
/// assert_eq!(attack.value, 168);
/// assert_eq!(attack.sources.len(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedStat {
    pub stat: CombatStat,

    /// The final, floored value.
    pub value: u64,

    /// Each entry is `(source_description, value)`, in insertion order.
    pub sources: Vec<(String, f64)>,

    /// Each entry is `(multiplier_description, factor)`, in insertion order.
    pub multipliers: Vec<(String, f64)>,
}

impl ResolvedStat {
    /// Start building a stat.
    pub fn builder(stat: CombatStat) -> ResolvedStatBuilder {
        ResolvedStatBuilder {
            stat,
            sources: Vec::new(),
            multipliers: Vec::new(),
        }
    }

    /// Sum of all flat sources before multipliers.
    pub fn base(&self) -> f64 {
        self.sources.iter().map(|(_, v)| v).sum()
    }
}

/// Accumulates the breakdown of a `ResolvedStat`.
#[derive(Debug, Clone)]
pub struct ResolvedStatBuilder {
    stat: CombatStat,
    sources: Vec<(String, f64)>,
    multipliers: Vec<(String, f64)>,
}

impl ResolvedStatBuilder {
    /// Add a flat contribution.
    pub fn source(mut self, description: impl Into<String>, value: f64) -> Self {
        self.sources.push((description.into(), value));
        self
    }

    /// Add a multiplier. Identity multipliers are kept so the breakdown
    /// always names every lane that was consulted.
    pub fn multiplier(mut self, description: impl Into<String>, factor: f64) -> Self {
        self.multipliers.push((description.into(), factor));
        self
    }

    /// Compute the floored value. Negative bases resolve to zero.
    pub fn resolve(self) -> ResolvedStat {
        let base: f64 = self.sources.iter().map(|(_, v)| v).sum();
        let product: f64 = self.multipliers.iter().map(|(_, f)| f).product();
        let value = (base * product).floor().max(0.0) as u64;
        ResolvedStat {
            stat: self.stat,
            value,
            sources: self.sources,
            multipliers: self.multipliers,
        }
    }
}
