//! Archetype buff: a fixed multiplier profile per class.
//!
//! Always present. The neutral archetype still yields a descriptive buff
//! with an identity model so every player sees their class in the list.

use crate::buff::{ActiveBuff, BuffSource};
use crate::error::Result;
use crate::modifier::{ModifierField, ModifierModel};
use crate::snapshot::{Archetype, Snapshot};

/// Percentage changes per archetype.
fn profile(archetype: Archetype) -> &'static [(ModifierField, f64)] {
    match archetype {
        Archetype::Juggernaut => &[
            (ModifierField::AttackPower, 20.0),
            (ModifierField::Stamina, -10.0),
        ],
        Archetype::Pathfinder => &[
            (ModifierField::Stamina, 30.0),
            (ModifierField::AttackPower, -10.0),
            (ModifierField::CardioXp, 10.0),
        ],
        Archetype::Sentinel => &[
            (ModifierField::Defense, 20.0),
            (ModifierField::AttackPower, -10.0),
        ],
        Archetype::Wanderer => &[],
    }
}

fn label(archetype: Archetype) -> (&'static str, &'static str, &'static str) {
    match archetype {
        Archetype::Juggernaut => ("juggernaut", "Juggernaut", "+20% attack, -10% stamina"),
        Archetype::Pathfinder => (
            "pathfinder",
            "Pathfinder",
            "+30% stamina, -10% attack, +10% cardio XP",
        ),
        Archetype::Sentinel => ("sentinel", "Sentinel", "+20% defense, -10% attack"),
        Archetype::Wanderer => ("wanderer", "Wanderer", "Balanced, no specialization"),
    }
}

/// Derive the archetype buff.
pub fn derive(snapshot: &Snapshot) -> Result<ActiveBuff> {
    let archetype = snapshot.player.archetype;
    let modifiers = profile(archetype)
        .iter()
        .try_fold(ModifierModel::new(), |m, (field, pct)| {
            m.with_percent(BuffSource::Archetype, *field, *pct)
        })?;
    let (key, name, description) = label(archetype);
    Ok(ActiveBuff::new(
        BuffSource::Archetype,
        key,
        name,
        description,
        modifiers,
    ))
}
