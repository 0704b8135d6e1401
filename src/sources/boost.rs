//! XP boost lane: subscription, onboarding, decree and streak.
//!
//! These sources only ever add percentage points to
//! `xp_boost_points`. The points are summed across sources and turned into
//! one factor by `ModifierModel::xp_multiplier`.

use crate::buff::{ActiveBuff, BuffSource};
use crate::error::Result;
use crate::modifier::{ModifierField, ModifierModel};
use crate::snapshot::{Snapshot, SubscriptionTier};

/// Streak points per consecutive day.
pub const STREAK_POINTS_PER_DAY: f64 = 2.0;
/// Maximum streak points.
pub const STREAK_POINTS_CAP: f64 = 20.0;

fn points(origin: BuffSource, points: f64) -> Result<ModifierModel> {
    ModifierModel::new().with_flat(origin, ModifierField::XpBoostPoints, points)
}

/// Subscription tier boost; free tier contributes nothing.
pub fn subscription(snapshot: &Snapshot) -> Result<Option<ActiveBuff>> {
    let (key, name, pts) = match snapshot.player.subscription {
        SubscriptionTier::Free => return Ok(None),
        SubscriptionTier::Plus => ("plus", "Plus Member", 10.0),
        SubscriptionTier::Pro => ("pro", "Pro Member", 25.0),
    };
    Ok(Some(ActiveBuff::new(
        BuffSource::Subscription,
        key,
        name,
        format!("+{pts}% XP"),
        points(BuffSource::Subscription, pts)?,
    )))
}

/// Apprentice boost for early levels.
pub fn onboarding(snapshot: &Snapshot) -> Result<Option<ActiveBuff>> {
    let pts = match snapshot.player.level {
        0..=5 => 50.0,
        6..=10 => 25.0,
        _ => return Ok(None),
    };
    Ok(Some(ActiveBuff::new(
        BuffSource::Onboarding,
        "apprentice",
        "Apprentice Boost",
        format!("+{pts}% XP until level 10"),
        points(BuffSource::Onboarding, pts)?,
    )))
}

/// Sum of every decree still active at the snapshot's `now`.
pub fn decree(snapshot: &Snapshot) -> Result<Option<ActiveBuff>> {
    let active: Vec<_> = snapshot
        .decrees
        .iter()
        .filter(|d| d.is_active(snapshot.now))
        .collect();
    if active.is_empty() {
        return Ok(None);
    }
    let modifiers = active.iter().try_fold(ModifierModel::new(), |m, d| {
        m.with_flat(
            BuffSource::Decree,
            ModifierField::XpBoostPoints,
            d.xp_boost_points,
        )
    })?;
    let names: Vec<&str> = active.iter().map(|d| d.name.as_str()).collect();
    let key: Vec<&str> = active.iter().map(|d| d.id.as_str()).collect();
    Ok(Some(ActiveBuff::new(
        BuffSource::Decree,
        &key.join("+"),
        names.join(", "),
        format!("+{}% XP", modifiers.xp_boost_points),
        modifiers,
    )))
}

/// Consecutive-day streak, capped.
pub fn streak(snapshot: &Snapshot) -> Result<Option<ActiveBuff>> {
    let days = snapshot.player.streak_days;
    if days == 0 {
        return Ok(None);
    }
    let pts = (f64::from(days) * STREAK_POINTS_PER_DAY).min(STREAK_POINTS_CAP);
    Ok(Some(ActiveBuff::new(
        BuffSource::Streak,
        "daily",
        format!("{days}-Day Streak"),
        format!("+{pts}% XP"),
        points(BuffSource::Streak, pts)?,
    )))
}
