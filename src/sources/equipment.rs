//! Equipment buff: flat power and armor plus named percentage effects.
//!
//! Only items flagged `equipped` count; the rest of the inventory is
//! ignored entirely.

use crate::buff::{ActiveBuff, BuffSource};
use crate::error::Result;
use crate::modifier::{ModifierField, ModifierModel};
use crate::snapshot::Snapshot;

/// Derive the aggregated equipment buff, or `None` with nothing equipped.
pub fn derive(snapshot: &Snapshot) -> Result<Option<ActiveBuff>> {
    let mut modifiers = ModifierModel::new();
    let mut names = Vec::new();

    for item in snapshot.equipped() {
        modifiers = modifiers
            .with_flat(BuffSource::Equipment, ModifierField::FlatAttack, f64::from(item.power))?
            .with_flat(BuffSource::Equipment, ModifierField::FlatDefense, f64::from(item.armor))?;
        for effect in &item.effects {
            modifiers = effect.apply(modifiers, BuffSource::Equipment)?;
        }
        names.push(item.name.as_str());
    }

    if names.is_empty() {
        return Ok(None);
    }

    let description = format!(
        "{} equipped: {} (+{} power)",
        names.len(),
        names.join(", "),
        modifiers.flat_attack
    );
    Ok(Some(ActiveBuff::new(
        BuffSource::Equipment,
        "loadout",
        "Equipment",
        description,
        modifiers,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::ids::ItemId;
    use crate::snapshot::{Archetype, Effect, EquipmentItem};
    use crate::sources::fixtures;

    fn item(id: &str, equipped: bool, power: u32, effects: Vec<Effect>) -> EquipmentItem {
        EquipmentItem {
            item_id: ItemId::new(id),
            name: id.to_string(),
            equipped,
            power,
            armor: 0,
            effects,
        }
    }

    #[test]
    fn test_no_equipment_no_buff() {
        let snapshot = fixtures::snapshot(Archetype::Wanderer, 1);
        assert!(derive(&snapshot).unwrap().is_none());
    }

    #[test]
    fn test_only_equipped_items_count() {
        let mut snapshot = fixtures::snapshot(Archetype::Wanderer, 1);
        snapshot.equipment = vec![
            item("belt", true, 100, vec![]),
            item("gloves", true, 10, vec![]),
            item("spare-bar", false, 500, vec![]),
        ];
        let buff = derive(&snapshot).unwrap().unwrap();
        assert_eq!(buff.modifiers.flat_attack, 110.0);
        assert!(!buff.description.contains("spare-bar"));
    }

    #[test]
    fn test_named_effects() {
        let mut snapshot = fixtures::snapshot(Archetype::Wanderer, 1);
        snapshot.equipment = vec![item(
            "lifting-straps",
            true,
            0,
            vec![Effect::Percent {
                field: ModifierField::StrengthXp,
                percent: 20.0,
            }],
        )];
        let buff = derive(&snapshot).unwrap().unwrap();
        assert!((buff.modifiers.strength_xp.value() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_negative_factor_rejected() {
        let mut snapshot = fixtures::snapshot(Archetype::Wanderer, 1);
        snapshot.equipment = vec![item(
            "cursed-ring",
            true,
            0,
            vec![Effect::Percent {
                field: ModifierField::Defense,
                percent: -150.0,
            }],
        )];
        assert!(matches!(
            derive(&snapshot),
            Err(EngineError::InvalidModifier {
                origin: BuffSource::Equipment,
                ..
            })
        ));
    }
}
