//! Turn resolution.
//!
//! Both entry points are pure: they take the current session and context
//! and return a new session, leaving the input untouched. Whatever
//! serialization the persistence boundary uses wraps them from outside.

use crate::combat::opponent::OpponentDefinition;
use crate::combat::session::{
    Actor, CombatAction, EncounterSession, EncounterState, TranscriptEntry,
};
use crate::config::CombatConfig;
use crate::context::PlayerContext;
use crate::error::{EngineError, Result};
use crate::ids::SessionId;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Golden-ratio constant used to spread turn numbers across the seed space.
const TURN_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Create a fresh `Active` session at full HP on both sides.
pub fn start_encounter(
    session_id: SessionId,
    seed: u64,
    context: &PlayerContext,
    opponent: &OpponentDefinition,
) -> EncounterSession {
    let scaled = opponent.scaled(context.identity.level);
    let player_max_hp = context.combat.hp_pool().max(1);
    EncounterSession {
        session_id,
        player_id: context.identity.player_id.clone(),
        opponent_id: opponent.id.clone(),
        opponent: scaled,
        player_hp: player_max_hp,
        player_max_hp,
        opponent_hp: scaled.max_hp,
        opponent_max_hp: scaled.max_hp,
        turn_count: 0,
        transcript: Vec::new(),
        state: EncounterState::Active,
        seed,
        version: 0,
    }
}

/// Damage the player deals before crits.
pub fn player_damage(attack: u64, opponent_defense: u32, config: &CombatConfig) -> u64 {
    let mitigation = u64::from(opponent_defense / config.defense_divisor.max(1));
    attack
        .saturating_sub(mitigation)
        .max(u64::from(config.minimum_damage))
}

/// Damage the opponent deals back, after guard.
pub fn counter_damage(
    opponent_damage: u32,
    defense: u64,
    action: CombatAction,
    config: &CombatConfig,
) -> u64 {
    let mitigation = defense / u64::from(config.defense_divisor.max(1));
    let raw = u64::from(opponent_damage)
        .saturating_sub(mitigation)
        .max(u64::from(config.minimum_damage));
    match action {
        CombatAction::Attack => raw,
        CombatAction::Guard => (raw as f64 * (1.0 - config.guard_reduction)).floor() as u64,
    }
}

fn turn_rng(seed: u64, turn: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ u64::from(turn).wrapping_mul(TURN_SEED_MIX))
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Resolve one turn.
///
/// The player acts first; the opponent counters only if it survives.
/// Crit rolls are drawn from the session seed and the turn number, so the
/// same inputs always give the same session.
///
/// # Arguments
///
/// * `session` - The session as last read from the store
/// * `action` - The player's action this turn
/// * `context` - A context built for the session's player
/// * `config` - Damage formula parameters
///
/// # Returns
///
/// The next session, with the transcript extended, `turn_count` and
/// `version` bumped by one. Terminal sessions are rejected with
/// `EncounterAlreadyResolved`, and a context belonging to another player
/// with `EncounterNotOwned`. On error the input session is the state of
/// record.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use titanstat::combat::{
///     resolve_turn, start_encounter, CombatAction, Difficulty, OpponentDefinition,
///     OpponentScaling,
/// };
/// use titanstat::snapshot::{Archetype, PlayerSnapshot, Snapshot, SubscriptionTier};
/// use titanstat::{EngineConfig, OpponentId, PlayerContext, PlayerId, SessionId};
///
/// let config = EngineConfig::default();
/// let player = PlayerSnapshot {
///     id: PlayerId::new("p-1"),
///     display_name: "Ana".into(),
///     archetype: Archetype::Wanderer,
///     level: 20,
///     xp: 0,
///     subscription: SubscriptionTier::Free,
///     streak_days: 0,
///     mood: None,
///     recovery_score: 0,
/// };
/// let ctx = PlayerContext::from_snapshot(&Snapshot::bare(player, Utc::now()), &config).unwrap();
/// let rat = OpponentDefinition {
///     id: OpponentId::new("rat"),
///     name: "Rat".into(),
///     base_hp: 30,
///     base_damage: 4,
///     defense: 0,
///     level: 1,
///     scaling: OpponentScaling::Fixed,
///     difficulty: Difficulty::Normal,
/// };
///
/// let session = start_encounter(SessionId::new("s-1"), 7, &ctx, &rat);
/// let next = resolve_turn(&session, CombatAction::Attack, &ctx, &config.combat).unwrap();
/// assert_eq!(next.opponent_hp, 20); // 10 attack
/// assert_eq!(next.player_hp, 98); // 4 - 5/2
/// assert_eq!(next.version, 1);
/// assert_eq!(session.version, 0);
/// ```
pub fn resolve_turn(
    session: &EncounterSession,
    action: CombatAction,
    context: &PlayerContext,
    config: &CombatConfig,
) -> Result<EncounterSession> {
    if session.is_resolved() {
        return Err(EngineError::EncounterAlreadyResolved {
            session_id: session.session_id.clone(),
            state: session.state,
        });
    }
    if context.identity.player_id != session.player_id {
        return Err(EngineError::EncounterNotOwned {
            session_id: session.session_id.clone(),
            player_id: context.identity.player_id.clone(),
        });
    }

    let mut next = session.clone();
    let turn = session.turn_count + 1;
    let mut rng = turn_rng(session.seed, turn);

    let (dealt, crit) = match action {
        CombatAction::Attack => {
            let base = player_damage(context.combat.attack(), next.opponent.defense, config);
            let crit = rng.gen::<f64>() < context.combat.crit_chance;
            let dealt = if crit {
                (base as f64 * context.combat.crit_multiplier).floor() as u64
            } else {
                base
            };
            (clamp_u32(dealt), crit)
        }
        CombatAction::Guard => (0, false),
    };
    next.opponent_hp = next.opponent_hp.saturating_sub(dealt);
    next.transcript.push(TranscriptEntry {
        turn,
        actor: Actor::Player,
        action,
        damage: dealt,
        crit,
        player_hp: next.player_hp,
        opponent_hp: next.opponent_hp,
    });

    if next.opponent_hp == 0 {
        next.state = EncounterState::Victory;
    } else {
        let taken = clamp_u32(counter_damage(
            next.opponent.damage,
            context.combat.defense(),
            action,
            config,
        ));
        next.player_hp = next.player_hp.saturating_sub(taken);
        next.transcript.push(TranscriptEntry {
            turn,
            actor: Actor::Opponent,
            action,
            damage: taken,
            crit: false,
            player_hp: next.player_hp,
            opponent_hp: next.opponent_hp,
        });
        if next.player_hp == 0 {
            next.state = EncounterState::Defeat;
        }
    }

    next.turn_count = turn;
    next.version = session.version + 1;

    debug!(
        session = %next.session_id,
        turn,
        ?action,
        dealt,
        crit,
        player_hp = next.player_hp,
        opponent_hp = next.opponent_hp,
        state = %next.state,
        "turn resolved"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::opponent::{Difficulty, OpponentScaling};
    use crate::config::EngineConfig;
    use crate::ids::OpponentId;
    use crate::snapshot::Archetype;
    use crate::sources::fixtures;

    fn context() -> PlayerContext {
        // attack 10, defense 5, max hp 100
        let snapshot = fixtures::snapshot(Archetype::Wanderer, 20);
        PlayerContext::from_snapshot(&snapshot, &EngineConfig::default()).unwrap()
    }

    fn opponent(base_hp: u32, base_damage: u32, defense: u32) -> OpponentDefinition {
        OpponentDefinition {
            id: OpponentId::new("dummy"),
            name: String::from("Dummy"),
            base_hp,
            base_damage,
            defense,
            level: 1,
            scaling: OpponentScaling::Fixed,
            difficulty: Difficulty::Normal,
        }
    }

    fn session(base_hp: u32, base_damage: u32, defense: u32) -> EncounterSession {
        start_encounter(
            SessionId::new("s-1"),
            7,
            &context(),
            &opponent(base_hp, base_damage, defense),
        )
    }

    #[test]
    fn test_start_full_hp() {
        let s = session(50, 5, 0);
        assert_eq!(s.player_hp, 100);
        assert_eq!(s.player_max_hp, 100);
        assert_eq!(s.opponent_hp, 50);
        assert_eq!(s.state, EncounterState::Active);
        assert_eq!(s.version, 0);
    }

    #[test]
    fn test_attack_turn() {
        let config = CombatConfig::default();
        let s = session(50, 9, 4);
        let next = resolve_turn(&s, CombatAction::Attack, &context(), &config).unwrap();
        // 10 - 4/2 = 8 dealt; 9 - 5/2 = 7 taken
        assert_eq!(next.opponent_hp, 42);
        assert_eq!(next.player_hp, 93);
        assert_eq!(next.turn_count, 1);
        assert_eq!(next.version, 1);
        assert_eq!(next.transcript.len(), 2);
        // input untouched
        assert_eq!(s.opponent_hp, 50);
        assert!(s.transcript.is_empty());
    }

    #[test]
    fn test_victory_skips_counter() {
        let s = session(10, 500, 0);
        let next =
            resolve_turn(&s, CombatAction::Attack, &context(), &CombatConfig::default()).unwrap();
        assert_eq!(next.state, EncounterState::Victory);
        assert_eq!(next.player_hp, 100);
        assert_eq!(next.transcript.len(), 1);
    }

    #[test]
    fn test_guard_halves_counter() {
        let s = session(50, 25, 0);
        let next =
            resolve_turn(&s, CombatAction::Guard, &context(), &CombatConfig::default()).unwrap();
        // (25 - 2) * 0.5 = 11
        assert_eq!(next.player_hp, 89);
        assert_eq!(next.opponent_hp, 50);
    }

    #[test]
    fn test_minimum_damage() {
        assert_eq!(player_damage(3, 100, &CombatConfig::default()), 1);
    }

    #[test]
    fn test_guaranteed_crit() {
        let mut ctx = context();
        ctx.combat.crit_chance = 1.0;
        let s = session(100, 1, 0);
        let next = resolve_turn(&s, CombatAction::Attack, &ctx, &CombatConfig::default()).unwrap();
        assert!(next.transcript[0].crit);
        assert_eq!(next.transcript[0].damage, 15);
    }

    #[test]
    fn test_crit_roll_is_replayable() {
        let mut ctx = context();
        ctx.combat.crit_chance = 0.5;
        let s = session(1000, 1, 0);
        let a = resolve_turn(&s, CombatAction::Attack, &ctx, &CombatConfig::default()).unwrap();
        let b = resolve_turn(&s, CombatAction::Attack, &ctx, &CombatConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_terminal_rejected() {
        let mut s = session(50, 5, 0);
        s.state = EncounterState::Defeat;
        s.player_hp = 0;
        let err = resolve_turn(&s, CombatAction::Attack, &context(), &CombatConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::EncounterAlreadyResolved {
                state: EncounterState::Defeat,
                ..
            }
        ));
    }
}
