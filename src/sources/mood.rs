//! Mood/fatigue buff.
//!
//! A stored mood wins. Without one, the mood is derived from the
//! character's HP ratio and the player's recovery score.

use crate::buff::{ActiveBuff, BuffSource};
use crate::config::MoodConfig;
use crate::error::Result;
use crate::modifier::{ModifierField, ModifierModel};
use crate::snapshot::{Mood, Snapshot};

const COMBAT_FIELDS: [ModifierField; 3] = [
    ModifierField::AttackPower,
    ModifierField::Defense,
    ModifierField::Stamina,
];

/// Resolve the effective mood for a snapshot.
pub fn resolve_mood(snapshot: &Snapshot, config: &MoodConfig) -> Mood {
    if let Some(mood) = snapshot.player.mood {
        return mood;
    }
    if let Some(character) = &snapshot.character {
        if character.max_hp > 0 {
            let ratio = f64::from(character.hp) / f64::from(character.max_hp);
            if ratio < config.weakened_hp_ratio {
                return Mood::Weakened;
            }
        }
    }
    if snapshot.player.recovery_score >= config.focused_recovery_score {
        return Mood::Focused;
    }
    Mood::Neutral
}

/// Derive the mood buff; a neutral mood contributes nothing.
pub fn derive(snapshot: &Snapshot, config: &MoodConfig) -> Result<Option<ActiveBuff>> {
    let (key, name, percent) = match resolve_mood(snapshot, config) {
        Mood::Neutral => return Ok(None),
        Mood::Weakened => ("weakened", "Weakened", -20.0),
        Mood::Focused => ("focused", "Focused", 10.0),
    };
    let modifiers = COMBAT_FIELDS
        .iter()
        .try_fold(ModifierModel::new(), |m, field| {
            m.with_percent(BuffSource::Mood, *field, percent)
        })?;
    Ok(Some(ActiveBuff::new(
        BuffSource::Mood,
        key,
        name,
        format!("{percent:+}% attack, defense and stamina"),
        modifiers,
    )))
}
