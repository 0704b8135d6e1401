//! Buff module.
//!
//! An `ActiveBuff` is a named, sourced slice of the modifier model. Buffs
//! are what a player sees when asking "why did my XP change?": each one
//! carries the exact partial model it contributed to the fold.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::modifier::{ModifierField, ModifierModel};
use crate::snapshot::Snapshot;
use crate::sources;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a buff comes from.
///
/// A closed set: adding a new source means adding a variant here, and the
/// compiler then points at every match that must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuffSource {
    Archetype,
    Equipment,
    Skill,
    /// Competitive (PvP) rank.
    Rank,
    Mood,
    Decree,
    Streak,
    Subscription,
    /// Level-based apprentice boost for new players.
    Onboarding,
}

impl BuffSource {
    /// Every source, in the order the context builder derives them.
    pub const ALL: [BuffSource; 9] = [
        BuffSource::Archetype,
        BuffSource::Equipment,
        BuffSource::Skill,
        BuffSource::Rank,
        BuffSource::Mood,
        BuffSource::Subscription,
        BuffSource::Onboarding,
        BuffSource::Decree,
        BuffSource::Streak,
    ];

    /// Derive this source's buff from a snapshot.
    ///
    /// Returns `Ok(None)` when the source contributes nothing (no equipped
    /// items, no rank profile, no active decree...).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use titanstat::buff::BuffSource;
    /// use titanstat::snapshot::{Archetype, PlayerSnapshot, Snapshot, SubscriptionTier};
    /// use titanstat::{EngineConfig, PlayerId};
    ///
    /// let player = PlayerSnapshot {
    ///     id: PlayerId::new("p-1"),
    ///     display_name: "Ana".into(),
    ///     archetype: Archetype::Juggernaut,
    ///     level: 20,
    ///     xp: 0,
    ///     subscription: SubscriptionTier::Free,
    ///     streak_days: 0,
    ///     mood: None,
    ///     recovery_score: 0,
    /// };
    /// let snapshot = Snapshot::bare(player, Utc::now());
    /// let config = EngineConfig::default();
    ///
    /// let buff = BuffSource::Archetype.derive(&snapshot, &config).unwrap().unwrap();
    /// assert_eq!(buff.name, "Juggernaut");
    /// assert!(BuffSource::Equipment.derive(&snapshot, &config).unwrap().is_none());
    /// ```
    pub fn derive(self, snapshot: &Snapshot, config: &EngineConfig) -> Result<Option<ActiveBuff>> {
        match self {
            BuffSource::Archetype => sources::archetype::derive(snapshot).map(Some),
            BuffSource::Equipment => sources::equipment::derive(snapshot),
            BuffSource::Skill => sources::skill::derive(snapshot, &config.skills),
            BuffSource::Rank => sources::rank::derive(snapshot),
            BuffSource::Mood => sources::mood::derive(snapshot, &config.mood),
            BuffSource::Subscription => sources::boost::subscription(snapshot),
            BuffSource::Onboarding => sources::boost::onboarding(snapshot),
            BuffSource::Decree => sources::boost::decree(snapshot),
            BuffSource::Streak => sources::boost::streak(snapshot),
        }
    }

    /// Whether this source feeds the summed `xp_boost_points` lane.
    pub fn is_boost_lane(self) -> bool {
        matches!(
            self,
            BuffSource::Subscription
                | BuffSource::Onboarding
                | BuffSource::Decree
                | BuffSource::Streak
        )
    }

    /// Lowercase name used in ids and messages.
    pub fn name(self) -> &'static str {
        match self {
            BuffSource::Archetype => "archetype",
            BuffSource::Equipment => "equipment",
            BuffSource::Skill => "skill",
            BuffSource::Rank => "rank",
            BuffSource::Mood => "mood",
            BuffSource::Decree => "decree",
            BuffSource::Streak => "streak",
            BuffSource::Subscription => "subscription",
            BuffSource::Onboarding => "onboarding",
        }
    }
}

impl fmt::Display for BuffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A buff active for one context snapshot.
///
/// Immutable once produced. `modifiers` is exactly what the buff folded
/// into the context, nothing more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuff {
    /// Stable id, `"<source>:<key>"`.
    pub id: String,
    pub source: BuffSource,
    pub name: String,
    pub description: String,
    pub modifiers: ModifierModel,
}

impl ActiveBuff {
    /// Create a new buff; the id is prefixed with the source name.
    pub fn new(
        source: BuffSource,
        key: &str,
        name: impl Into<String>,
        description: impl Into<String>,
        modifiers: ModifierModel,
    ) -> Self {
        Self {
            id: format!("{}:{}", source.name(), key),
            source,
            name: name.into(),
            description: description.into(),
            modifiers,
        }
    }

    /// Whether this buff moved any of `fields` away from identity.
    pub fn touches_any(&self, fields: &[ModifierField]) -> bool {
        fields.iter().any(|f| self.modifiers.touches(*f))
    }
}
