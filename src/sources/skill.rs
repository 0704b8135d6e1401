//! Skill buff.
//!
//! A skill contributes only if it is unlocked, socketed, defined, and every
//! prerequisite in the tree is unlocked. Only skills that pass those checks
//! occupy a socket; they are taken in id order so the cut at the limit is
//! deterministic.

use crate::buff::{ActiveBuff, BuffSource};
use crate::config::SkillConfig;
use crate::error::Result;
use crate::ids::SkillId;
use crate::modifier::ModifierModel;
use crate::skill_tree::SkillTree;
use crate::snapshot::{SkillDefinition, SkillSnapshot, Snapshot};
use std::collections::{BTreeSet, HashMap, HashSet};

/// The skills that actually contribute, in id order.
pub fn active_skills<'a>(
    skills: &'a SkillSnapshot,
    config: &SkillConfig,
) -> Result<Vec<&'a SkillDefinition>> {
    let tree = SkillTree::from_definitions(&skills.definitions)?;
    let definitions: HashMap<&SkillId, &SkillDefinition> =
        skills.definitions.iter().map(|d| (&d.id, d)).collect();
    let unlocked: HashSet<&SkillId> = skills.unlocked.iter().collect();
    let socketed: BTreeSet<&SkillId> = skills.socketed.iter().collect();

    Ok(socketed
        .into_iter()
        .filter(|id| unlocked.contains(id))
        .filter(|id| tree.prerequisites_met(id, &unlocked))
        .filter_map(|id| definitions.get(id).copied())
        .take(config.max_socketed)
        .collect())
}

/// Derive the skill buff; `None` when no skill is active.
pub fn derive(snapshot: &Snapshot, config: &SkillConfig) -> Result<Option<ActiveBuff>> {
    let Some(skills) = &snapshot.skills else {
        return Ok(None);
    };
    let active = active_skills(skills, config)?;
    if active.is_empty() {
        return Ok(None);
    }

    let mut modifiers = ModifierModel::new();
    for skill in &active {
        for effect in &skill.effects {
            modifiers = effect.apply(modifiers, BuffSource::Skill)?;
        }
    }
    let names: Vec<&str> = active.iter().map(|s| s.name.as_str()).collect();
    Ok(Some(ActiveBuff::new(
        BuffSource::Skill,
        "socketed",
        "Skills",
        format!("Active: {}", names.join(", ")),
        modifiers,
    )))
}
