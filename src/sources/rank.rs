//! Competitive rank buff, bucketed by tier.

use crate::buff::{ActiveBuff, BuffSource};
use crate::error::Result;
use crate::modifier::{ModifierField, ModifierModel};
use crate::snapshot::Snapshot;

/// A rank tier with its inclusive lower bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankTier {
    pub min_score: u32,
    pub key: &'static str,
    pub name: &'static str,
    /// Attack bonus in percent.
    pub attack_percent: f64,
    /// Crit chance bonus as a probability.
    pub crit_chance: f64,
}

/// Tiers in ascending order.
pub const TIERS: [RankTier; 5] = [
    RankTier {
        min_score: 1000,
        key: "contender",
        name: "Contender",
        attack_percent: 2.0,
        crit_chance: 0.01,
    },
    RankTier {
        min_score: 1200,
        key: "challenger",
        name: "Challenger",
        attack_percent: 4.0,
        crit_chance: 0.02,
    },
    RankTier {
        min_score: 1500,
        key: "gladiator",
        name: "Gladiator",
        attack_percent: 6.0,
        crit_chance: 0.03,
    },
    RankTier {
        min_score: 1800,
        key: "champion",
        name: "Champion",
        attack_percent: 8.0,
        crit_chance: 0.04,
    },
    RankTier {
        min_score: 2100,
        key: "legend",
        name: "Legend",
        attack_percent: 10.0,
        crit_chance: 0.05,
    },
];

/// The highest tier reached by `score`, if any.
pub fn tier_for(score: u32) -> Option<&'static RankTier> {
    TIERS.iter().rev().find(|tier| score >= tier.min_score)
}

/// Derive the rank buff; `None` without a profile or below the first tier.
pub fn derive(snapshot: &Snapshot) -> Result<Option<ActiveBuff>> {
    let Some(rank) = snapshot.rank else {
        return Ok(None);
    };
    let Some(tier) = tier_for(rank.score) else {
        return Ok(None);
    };
    let modifiers = ModifierModel::new()
        .with_percent(BuffSource::Rank, ModifierField::AttackPower, tier.attack_percent)?
        .with_flat(BuffSource::Rank, ModifierField::CritChance, tier.crit_chance)?;
    Ok(Some(ActiveBuff::new(
        BuffSource::Rank,
        tier.key,
        tier.name,
        format!(
            "Rank {} (+{}% attack, +{}% crit)",
            rank.score,
            tier.attack_percent,
            tier.crit_chance * 100.0
        ),
        modifiers,
    )))
}
