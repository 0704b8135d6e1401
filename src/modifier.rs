//! Modifier model module.
//!
//! A `ModifierModel` is a typed bag of every numeric lever a player can
//! have: multiplicative factors (default `1.0`) and additive values
//! (default `0.0`). Buff sources each produce a partial model; the
//! context builder folds them into one.
//!
//! Two stacking lanes exist and are never unified:
//!
//! ```text
//! Multiplicative lane: attack_power, defense, xp_gain, ...   → product
//! Additive lane:       crit_chance, flat_attack, ...         → sum
//! ```
//!
//! XP boosts from subscription, decree, streak and onboarding are summed as
//! percentage points in `xp_boost_points` and only turned into a single
//! factor by [`ModifierModel::xp_multiplier`], so they never compound on
//! top of each other.

use crate::buff::BuffSource;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How values in a field combine across independent sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Values are multiplied. Identity is `1.0`.
    Multiplicative,
    /// Values are summed. Identity is `0.0`.
    Additive,
}

/// Every field of the modifier model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierField {
    AttackPower,
    Defense,
    XpGain,
    GoldGain,
    Stamina,
    StrengthXp,
    CardioXp,
    LootLuck,
    MaxHp,
    CritChance,
    FlatAttack,
    FlatDefense,
    XpBoostPoints,
}

impl ModifierField {
    /// All fields, multiplicative first.
    pub const ALL: [ModifierField; 13] = [
        ModifierField::AttackPower,
        ModifierField::Defense,
        ModifierField::XpGain,
        ModifierField::GoldGain,
        ModifierField::Stamina,
        ModifierField::StrengthXp,
        ModifierField::CardioXp,
        ModifierField::LootLuck,
        ModifierField::MaxHp,
        ModifierField::CritChance,
        ModifierField::FlatAttack,
        ModifierField::FlatDefense,
        ModifierField::XpBoostPoints,
    ];

    /// The stacking lane of this field.
    ///
    /// ```rust
    /// use titanstat::modifier::{Lane, ModifierField};
    ///
    /// assert_eq!(ModifierField::AttackPower.lane(), Lane::Multiplicative);
    /// assert_eq!(ModifierField::CritChance.lane(), Lane::Additive);
    /// ```
    pub fn lane(self) -> Lane {
        match self {
            ModifierField::AttackPower
            | ModifierField::Defense
            | ModifierField::XpGain
            | ModifierField::GoldGain
            | ModifierField::Stamina
            | ModifierField::StrengthXp
            | ModifierField::CardioXp
            | ModifierField::LootLuck
            | ModifierField::MaxHp => Lane::Multiplicative,
            ModifierField::CritChance
            | ModifierField::FlatAttack
            | ModifierField::FlatDefense
            | ModifierField::XpBoostPoints => Lane::Additive,
        }
    }

    /// Snake-case name, as shown in errors and serialized output.
    pub fn name(self) -> &'static str {
        match self {
            ModifierField::AttackPower => "attack_power",
            ModifierField::Defense => "defense",
            ModifierField::XpGain => "xp_gain",
            ModifierField::GoldGain => "gold_gain",
            ModifierField::Stamina => "stamina",
            ModifierField::StrengthXp => "strength_xp",
            ModifierField::CardioXp => "cardio_xp",
            ModifierField::LootLuck => "loot_luck",
            ModifierField::MaxHp => "max_hp",
            ModifierField::CritChance => "crit_chance",
            ModifierField::FlatAttack => "flat_attack",
            ModifierField::FlatDefense => "flat_defense",
            ModifierField::XpBoostPoints => "xp_boost_points",
        }
    }
}

impl fmt::Display for ModifierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A strictly positive, finite multiplicative factor.
///
/// The only way to build a non-identity factor is through validation, so
/// a folded model can never hold a zero or negative multiplier.
///
/// ```rust
/// use titanstat::buff::BuffSource;
/// use titanstat::modifier::{Factor, ModifierField};
///
/// let f = Factor::from_percent(BuffSource::Archetype, ModifierField::AttackPower, 20.0).unwrap();
/// assert!((f.value() - 1.2).abs() < 1e-12);
///
/// assert!(Factor::new(BuffSource::Equipment, ModifierField::Defense, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Factor(f64);

impl Factor {
    /// The neutral factor.
    pub const IDENTITY: Factor = Factor(1.0);

    /// Validate a raw factor coming from `origin`.
    pub fn new(origin: BuffSource, field: ModifierField, value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidModifier {
                origin,
                field,
                value,
            })
        }
    }

    /// Build `1 + percent / 100`, e.g. `-10.0` gives `0.9`.
    pub fn from_percent(origin: BuffSource, field: ModifierField, percent: f64) -> Result<Self> {
        Self::new(origin, field, 1.0 + percent / 100.0)
    }

    /// The raw multiplier.
    pub fn value(self) -> f64 {
        self.0
    }

    // Products of valid factors stay inside the positive finite range.
    fn product(self, other: Factor) -> Factor {
        Factor((self.0 * other.0).clamp(f64::MIN_POSITIVE, f64::MAX))
    }
}

impl Default for Factor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<f64> for Factor {
    type Error = String;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(format!("factor must be finite and > 0, got {value}"))
        }
    }
}

impl From<Factor> for f64 {
    fn from(f: Factor) -> f64 {
        f.0
    }
}

/// The folded (or partial) set of modifiers.
///
/// A freshly constructed model is the identity: folding it with anything
/// leaves the other model unchanged.
///
/// # Examples
///
/// ```rust
/// use titanstat::buff::BuffSource;
/// use titanstat::modifier::{ModifierField, ModifierModel};
///
/// let archetype = ModifierModel::new()
///     .with_percent(BuffSource::Archetype, ModifierField::AttackPower, 20.0)
///     .unwrap();
/// let rank = ModifierModel::new()
///     .with_percent(BuffSource::Rank, ModifierField::AttackPower, 10.0)
///     .unwrap()
///     .with_flat(BuffSource::Rank, ModifierField::CritChance, 0.03)
///     .unwrap();
///
/// let folded = ModifierModel::fold([&archetype, &rank]);
/// assert!((folded.get(ModifierField::AttackPower) - 1.32).abs() < 1e-12);
/// assert!((folded.crit_chance - 0.03).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierModel {
    pub attack_power: Factor,
    pub defense: Factor,
    pub xp_gain: Factor,
    pub gold_gain: Factor,
    pub stamina: Factor,
    pub strength_xp: Factor,
    pub cardio_xp: Factor,
    pub loot_luck: Factor,
    pub max_hp: Factor,
    /// Probability in `[0, 1]` once folded.
    pub crit_chance: f64,
    pub flat_attack: f64,
    pub flat_defense: f64,
    /// Summed XP boost percentage points.
    pub xp_boost_points: f64,
}

impl Default for ModifierModel {
    fn default() -> Self {
        Self {
            attack_power: Factor::IDENTITY,
            defense: Factor::IDENTITY,
            xp_gain: Factor::IDENTITY,
            gold_gain: Factor::IDENTITY,
            stamina: Factor::IDENTITY,
            strength_xp: Factor::IDENTITY,
            cardio_xp: Factor::IDENTITY,
            loot_luck: Factor::IDENTITY,
            max_hp: Factor::IDENTITY,
            crit_chance: 0.0,
            flat_attack: 0.0,
            flat_defense: 0.0,
            xp_boost_points: 0.0,
        }
    }
}

impl ModifierModel {
    /// Create the identity model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read any field as a plain number.
    pub fn get(&self, field: ModifierField) -> f64 {
        match field {
            ModifierField::AttackPower => self.attack_power.value(),
            ModifierField::Defense => self.defense.value(),
            ModifierField::XpGain => self.xp_gain.value(),
            ModifierField::GoldGain => self.gold_gain.value(),
            ModifierField::Stamina => self.stamina.value(),
            ModifierField::StrengthXp => self.strength_xp.value(),
            ModifierField::CardioXp => self.cardio_xp.value(),
            ModifierField::LootLuck => self.loot_luck.value(),
            ModifierField::MaxHp => self.max_hp.value(),
            ModifierField::CritChance => self.crit_chance,
            ModifierField::FlatAttack => self.flat_attack,
            ModifierField::FlatDefense => self.flat_defense,
            ModifierField::XpBoostPoints => self.xp_boost_points,
        }
    }

    fn factor_mut(&mut self, field: ModifierField) -> Option<&mut Factor> {
        match field {
            ModifierField::AttackPower => Some(&mut self.attack_power),
            ModifierField::Defense => Some(&mut self.defense),
            ModifierField::XpGain => Some(&mut self.xp_gain),
            ModifierField::GoldGain => Some(&mut self.gold_gain),
            ModifierField::Stamina => Some(&mut self.stamina),
            ModifierField::StrengthXp => Some(&mut self.strength_xp),
            ModifierField::CardioXp => Some(&mut self.cardio_xp),
            ModifierField::LootLuck => Some(&mut self.loot_luck),
            ModifierField::MaxHp => Some(&mut self.max_hp),
            _ => None,
        }
    }

    fn flat_mut(&mut self, field: ModifierField) -> Option<&mut f64> {
        match field {
            ModifierField::CritChance => Some(&mut self.crit_chance),
            ModifierField::FlatAttack => Some(&mut self.flat_attack),
            ModifierField::FlatDefense => Some(&mut self.flat_defense),
            ModifierField::XpBoostPoints => Some(&mut self.xp_boost_points),
            _ => None,
        }
    }

    /// Multiply a multiplicative field by `factor`.
    ///
    /// Fails with `InvalidModifier` if the factor is not strictly positive
    /// or the field belongs to the additive lane.
    pub fn with_factor(
        mut self,
        origin: BuffSource,
        field: ModifierField,
        factor: f64,
    ) -> Result<Self> {
        let factor = Factor::new(origin, field, factor)?;
        let slot = self.factor_mut(field).ok_or(EngineError::InvalidModifier {
            origin,
            field,
            value: factor.value(),
        })?;
        *slot = slot.product(factor);
        Ok(self)
    }

    /// Multiply a multiplicative field by `1 + percent / 100`.
    pub fn with_percent(
        self,
        origin: BuffSource,
        field: ModifierField,
        percent: f64,
    ) -> Result<Self> {
        self.with_factor(origin, field, 1.0 + percent / 100.0)
    }

    /// Add `amount` to an additive field.
    ///
    /// `xp_boost_points` only accepts non-negative points from the boost
    /// lane sources, so the summed XP factor never drops below 1.
    pub fn with_flat(
        mut self,
        origin: BuffSource,
        field: ModifierField,
        amount: f64,
    ) -> Result<Self> {
        let invalid = EngineError::InvalidModifier {
            origin,
            field,
            value: amount,
        };
        if !amount.is_finite() {
            return Err(invalid);
        }
        if field == ModifierField::XpBoostPoints && (amount < 0.0 || !origin.is_boost_lane()) {
            return Err(invalid);
        }
        let slot = self.flat_mut(field).ok_or(invalid)?;
        *slot += amount;
        Ok(self)
    }

    /// Combine two models without clamping.
    pub fn combine(&self, other: &ModifierModel) -> ModifierModel {
        ModifierModel {
            attack_power: self.attack_power.product(other.attack_power),
            defense: self.defense.product(other.defense),
            xp_gain: self.xp_gain.product(other.xp_gain),
            gold_gain: self.gold_gain.product(other.gold_gain),
            stamina: self.stamina.product(other.stamina),
            strength_xp: self.strength_xp.product(other.strength_xp),
            cardio_xp: self.cardio_xp.product(other.cardio_xp),
            loot_luck: self.loot_luck.product(other.loot_luck),
            max_hp: self.max_hp.product(other.max_hp),
            crit_chance: self.crit_chance + other.crit_chance,
            flat_attack: self.flat_attack + other.flat_attack,
            flat_defense: self.flat_defense + other.flat_defense,
            xp_boost_points: self.xp_boost_points + other.xp_boost_points,
        }
    }

    /// Fold any number of partial models into one.
    ///
    /// Factors multiply, additive values sum, and `crit_chance` is clamped
    /// to `[0, 1]` after the fold. Zero inputs give the identity.
    pub fn fold<'a, I>(models: I) -> ModifierModel
    where
        I: IntoIterator<Item = &'a ModifierModel>,
    {
        let mut folded = models
            .into_iter()
            .fold(ModifierModel::new(), |acc, m| acc.combine(m));
        folded.crit_chance = folded.crit_chance.clamp(0.0, 1.0);
        folded
    }

    /// Whether this model moves `field` away from its identity.
    pub fn touches(&self, field: ModifierField) -> bool {
        match field.lane() {
            Lane::Multiplicative => self.get(field) != 1.0,
            Lane::Additive => self.get(field) != 0.0,
        }
    }

    /// Every field this model moves away from identity.
    pub fn touched_fields(&self) -> Vec<ModifierField> {
        ModifierField::ALL
            .iter()
            .copied()
            .filter(|f| self.touches(*f))
            .collect()
    }

    /// Whether every field is at its identity.
    pub fn is_identity(&self) -> bool {
        self.touched_fields().is_empty()
    }

    /// The single XP factor: the multiplicative `xp_gain` times one factor
    /// built from the summed boost points.
    ///
    /// ```rust
    /// use titanstat::buff::BuffSource;
    /// use titanstat::modifier::{ModifierField, ModifierModel};
    ///
    /// let m = ModifierModel::new()
    ///     .with_factor(BuffSource::Archetype, ModifierField::XpGain, 1.2).unwrap()
    ///     .with_flat(BuffSource::Streak, ModifierField::XpBoostPoints, 10.0).unwrap()
    ///     .with_flat(BuffSource::Decree, ModifierField::XpBoostPoints, 15.0).unwrap();
    ///
    /// // 1.2 * (1 + 0.25), not 1.2 * 1.10 * 1.15
    /// assert!((m.xp_multiplier() - 1.5).abs() < 1e-12);
    /// ```
    pub fn xp_multiplier(&self) -> f64 {
        self.xp_gain.value() * (1.0 + self.xp_boost_points / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identity_model() {
        let m = ModifierModel::new();
        assert!(m.is_identity());
        assert_eq!(m.get(ModifierField::AttackPower), 1.0);
        assert_eq!(m.get(ModifierField::CritChance), 0.0);
    }

    #[test]
    fn test_fold_empty_is_identity() {
        let folded = ModifierModel::fold(std::iter::empty());
        assert_eq!(folded, ModifierModel::new());
    }

    #[test]
    fn test_fold_multiplies_and_sums() {
        let a = ModifierModel::new()
            .with_factor(BuffSource::Archetype, ModifierField::AttackPower, 1.2)
            .unwrap()
            .with_flat(BuffSource::Equipment, ModifierField::FlatAttack, 100.0)
            .unwrap();
        let b = ModifierModel::new()
            .with_factor(BuffSource::Mood, ModifierField::AttackPower, 0.8)
            .unwrap()
            .with_flat(BuffSource::Equipment, ModifierField::FlatAttack, 10.0)
            .unwrap();
        let folded = ModifierModel::fold([&a, &b]);
        assert!(approx(folded.attack_power.value(), 0.96));
        assert!(approx(folded.flat_attack, 110.0));
    }

    #[test]
    fn test_crit_clamped_after_fold() {
        let crit = ModifierModel::new()
            .with_flat(BuffSource::Rank, ModifierField::CritChance, 0.6)
            .unwrap();
        let folded = ModifierModel::fold([&crit, &crit, &crit]);
        assert_eq!(folded.crit_chance, 1.0);

        let negative = ModifierModel::new()
            .with_flat(BuffSource::Mood, ModifierField::CritChance, -0.4)
            .unwrap();
        let folded = ModifierModel::fold([&negative]);
        assert_eq!(folded.crit_chance, 0.0);
    }

    #[test]
    fn test_non_positive_factor_rejected() {
        let err = ModifierModel::new()
            .with_percent(BuffSource::Skill, ModifierField::Stamina, -100.0)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidModifier {
                origin: BuffSource::Skill,
                field: ModifierField::Stamina,
                ..
            }
        ));
        assert!(ModifierModel::new()
            .with_factor(BuffSource::Skill, ModifierField::Stamina, f64::NAN)
            .is_err());
    }

    #[test]
    fn test_lane_mismatch_rejected() {
        assert!(ModifierModel::new()
            .with_factor(BuffSource::Rank, ModifierField::CritChance, 1.1)
            .is_err());
        assert!(ModifierModel::new()
            .with_flat(BuffSource::Rank, ModifierField::AttackPower, 0.1)
            .is_err());
    }

    #[test]
    fn test_touches() {
        let m = ModifierModel::new()
            .with_percent(BuffSource::Archetype, ModifierField::Stamina, -10.0)
            .unwrap();
        assert!(m.touches(ModifierField::Stamina));
        assert!(!m.touches(ModifierField::AttackPower));
        assert_eq!(m.touched_fields(), vec![ModifierField::Stamina]);
    }

    #[test]
    fn test_factor_serde_rejects_zero() {
        assert!(serde_json::from_str::<Factor>("0.0").is_err());
        let f: Factor = serde_json::from_str("1.25").unwrap();
        assert_eq!(f.value(), 1.25);
    }

    #[test]
    fn test_xp_lanes_stay_distinct() {
        let m = ModifierModel::new()
            .with_flat(BuffSource::Subscription, ModifierField::XpBoostPoints, 25.0)
            .unwrap()
            .with_flat(BuffSource::Onboarding, ModifierField::XpBoostPoints, 50.0)
            .unwrap();
        assert!(approx(m.xp_multiplier(), 1.75));
        assert_eq!(m.xp_gain.value(), 1.0);
    }

    #[test]
    fn test_boost_points_outside_lane_rejected() {
        let err = ModifierModel::new()
            .with_flat(BuffSource::Decree, ModifierField::XpBoostPoints, -150.0)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidModifier {
                origin: BuffSource::Decree,
                field: ModifierField::XpBoostPoints,
                value: -150.0,
            }
        );
        assert!(ModifierModel::new()
            .with_flat(BuffSource::Equipment, ModifierField::XpBoostPoints, 10.0)
            .is_err());
        assert!(ModifierModel::new()
            .with_flat(BuffSource::Streak, ModifierField::XpBoostPoints, 0.0)
            .is_ok());
    }
}
