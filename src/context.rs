//! Player context module.
//!
//! A `PlayerContext` is the folded view of everything that makes up a
//! player's power at one instant. It is built fresh for every request and
//! discarded afterwards; it has no identity of its own.

use crate::buff::{ActiveBuff, BuffSource};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ids::{ItemId, PlayerId, SkillId};
use crate::modifier::{ModifierField, ModifierModel};
use crate::resolved::{CombatStat, ResolvedStat};
use crate::snapshot::{Archetype, Snapshot};
use crate::store::PlayerStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who the context belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub player_id: PlayerId,
    pub archetype: Archetype,
    pub level: u32,
    pub display_name: String,
}

/// Derived combat numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    pub effective_attack: ResolvedStat,
    pub effective_defense: ResolvedStat,
    pub max_hp: ResolvedStat,
    /// Damage dealt per unit of training volume.
    pub damage_per_volume: f64,
    pub crit_multiplier: f64,
    /// Folded, already clamped to `[0, 1]`.
    pub crit_chance: f64,
}

impl CombatProfile {
    pub fn attack(&self) -> u64 {
        self.effective_attack.value
    }

    pub fn defense(&self) -> u64 {
        self.effective_defense.value
    }

    /// Max HP as a pool size.
    pub fn hp_pool(&self) -> u32 {
        u32::try_from(self.max_hp.value).unwrap_or(u32::MAX)
    }
}

/// Raw ids the context was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIds {
    pub unlocked_skill_ids: Vec<SkillId>,
    pub equipped_item_ids: Vec<ItemId>,
}

/// The folded power of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerContext {
    pub identity: Identity,
    pub modifiers: ModifierModel,
    /// Every buff folded into `modifiers`, in derivation order.
    pub active_buffs: Vec<ActiveBuff>,
    pub combat: CombatProfile,
    pub raw: RawIds,
}

impl PlayerContext {
    /// Build a context from an already-loaded snapshot.
    ///
    /// Pure: the same snapshot and config always give the same context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use titanstat::context::PlayerContext;
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
    /// let ctx = PlayerContext::from_snapshot(&snapshot, &EngineConfig::default()).unwrap();
    ///
    /// assert!((ctx.modifiers.attack_power.value() - 1.2).abs() < 1e-12);
    /// assert_eq!(ctx.combat.attack(), 12); // floor(10 * 1.2)
    /// ```
    pub fn from_snapshot(snapshot: &Snapshot, config: &EngineConfig) -> Result<Self> {
        let mut active_buffs = Vec::new();
        for source in BuffSource::ALL {
            if let Some(buff) = source.derive(snapshot, config)? {
                active_buffs.push(buff);
            }
        }
        let modifiers = ModifierModel::fold(active_buffs.iter().map(|b| &b.modifiers));
        let combat = combat_profile(snapshot, &modifiers, &active_buffs, config);

        let raw = RawIds {
            unlocked_skill_ids: snapshot
                .skills
                .as_ref()
                .map(|s| s.unlocked.clone())
                .unwrap_or_default(),
            equipped_item_ids: snapshot.equipped().map(|i| i.item_id.clone()).collect(),
        };
        let player = &snapshot.player;
        Ok(Self {
            identity: Identity {
                player_id: player.id.clone(),
                archetype: player.archetype,
                level: player.level,
                display_name: player.display_name.clone(),
            },
            modifiers,
            active_buffs,
            combat,
            raw,
        })
    }

    /// Names of the buffs that moved any of `fields`.
    pub fn buffs_touching(&self, fields: &[ModifierField]) -> Vec<String> {
        self.active_buffs
            .iter()
            .filter(|b| b.touches_any(fields))
            .map(|b| b.name.clone())
            .collect()
    }
}

fn combat_profile(
    snapshot: &Snapshot,
    modifiers: &ModifierModel,
    buffs: &[ActiveBuff],
    config: &EngineConfig,
) -> CombatProfile {
    let combat = &config.combat;
    let character = snapshot.character.as_ref();

    let mut attack = ResolvedStat::builder(CombatStat::EffectiveAttack)
        .source("Base attack", f64::from(combat.base_attack));
    if let Some(c) = character {
        attack = attack.source("Strength", f64::from(c.strength));
    }
    for buff in buffs.iter().filter(|b| b.modifiers.flat_attack != 0.0) {
        attack = attack.source(buff.name.clone(), buff.modifiers.flat_attack);
    }
    let effective_attack = attack
        .multiplier("attack_power", modifiers.attack_power.value())
        .resolve();

    let mut defense = ResolvedStat::builder(CombatStat::EffectiveDefense)
        .source("Base defense", f64::from(combat.base_defense));
    if let Some(c) = character {
        defense = defense.source("Endurance", f64::from(c.endurance));
    }
    for buff in buffs.iter().filter(|b| b.modifiers.flat_defense != 0.0) {
        defense = defense.source(buff.name.clone(), buff.modifiers.flat_defense);
    }
    let effective_defense = defense
        .multiplier("defense", modifiers.defense.value())
        .resolve();

    let max_hp = match character {
        Some(c) => {
            ResolvedStat::builder(CombatStat::MaxHp).source("Character", f64::from(c.max_hp))
        }
        None => {
            ResolvedStat::builder(CombatStat::MaxHp).source("Base HP", f64::from(combat.base_hp))
        }
    }
    .multiplier("max_hp", modifiers.max_hp.value())
    .multiplier("stamina", modifiers.stamina.value())
    .resolve();

    CombatProfile {
        effective_attack,
        effective_defense,
        max_hp,
        damage_per_volume: combat.base_damage_per_volume * modifiers.attack_power.value(),
        crit_multiplier: combat.crit_multiplier,
        crit_chance: modifiers.crit_chance,
    }
}

/// Loads snapshots from a [`PlayerStore`] and builds contexts.
pub struct ContextBuilder<'a, S: PlayerStore + ?Sized> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: PlayerStore + ?Sized> ContextBuilder<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Read every record of a player in one pass.
    ///
    /// Only the player record is required; missing sub-records become
    /// empty contributions.
    pub fn load_snapshot(&self, player_id: &PlayerId, now: DateTime<Utc>) -> Result<Snapshot> {
        let player = self
            .store
            .load_player(player_id)?
            .ok_or_else(|| EngineError::PlayerNotFound(player_id.clone()))?;
        Ok(Snapshot {
            player,
            character: self.store.load_character(player_id)?,
            equipment: self.store.load_equipment(player_id)?,
            skills: self.store.load_skills(player_id)?,
            rank: self.store.load_rank(player_id)?,
            decrees: self.store.load_decrees(player_id)?,
            now,
        })
    }

    /// Build a fresh context for `player_id` as of `now`.
    ///
    /// Every record is read from the store on each call, so changes such
    /// as an equipment swap show up in the next context. Missing optional
    /// records (character, equipment, skills, rank) contribute nothing.
    ///
    /// # Arguments
    ///
    /// * `player_id` - The player to build for
    /// * `now` - Evaluation time, used to filter expired decrees
    ///
    /// # Returns
    ///
    /// The folded context, or `PlayerNotFound` when the player record is
    /// missing. Invalid source data fails with `InvalidModifier` or
    /// `InvalidSkillTree`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use titanstat::snapshot::{Archetype, PlayerSnapshot, SubscriptionTier};
    /// use titanstat::store::{InMemoryStore, PlayerRecord};
    /// use titanstat::{ContextBuilder, EngineConfig, PlayerId};
    ///
    /// let store = InMemoryStore::new();
    /// store.put_player(PlayerRecord::new(PlayerSnapshot {
    ///     id: PlayerId::new("p-1"),
    ///     display_name: "Ana".into(),
    ///     archetype: Archetype::Juggernaut,
    ///     level: 20,
    ///     xp: 0,
    ///     subscription: SubscriptionTier::Free,
    ///     streak_days: 0,
    ///     mood: None,
    ///     recovery_score: 0,
    /// })).unwrap();
    ///
    /// let config = EngineConfig::default();
    /// let ctx = ContextBuilder::new(&store, &config)
    ///     .build(&PlayerId::new("p-1"), Utc::now())
    ///     .unwrap();
    /// // floor(10 * 1.2)
    /// assert_eq!(ctx.combat.attack(), 12);
    /// ```
    pub fn build(&self, player_id: &PlayerId, now: DateTime<Utc>) -> Result<PlayerContext> {
        let snapshot = self.load_snapshot(player_id, now)?;
        let context = PlayerContext::from_snapshot(&snapshot, self.config)?;
        debug!(
            player = %player_id,
            buffs = context.active_buffs.len(),
            effective_attack = context.combat.attack(),
            effective_defense = context.combat.defense(),
            max_hp = context.combat.max_hp.value,
            "context built"
        );
        Ok(context)
    }
}
