use chrono::{DateTime, TimeZone, Utc};
use titanstat::combat::{
    resolve_turn, Actor, CombatAction, Difficulty, EncounterOutcome, EncounterService,
    EncounterState, OpponentDefinition, OpponentScaling,
};
use titanstat::snapshot::{Archetype, CharacterSnapshot, PlayerSnapshot, SubscriptionTier};
use titanstat::store::PlayerRecord;
use titanstat::{
    ContextBuilder, EngineConfig, EngineError, InMemoryStore, OpponentId, PlayerId, SessionStore,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
}

/// Player with attack 40, defense 15 and 100 HP; opponents by difficulty.
fn arena() -> InMemoryStore {
    let store = InMemoryStore::new();
    let mut record = PlayerRecord::new(PlayerSnapshot {
        id: PlayerId::new("hero"),
        display_name: String::from("Hero"),
        archetype: Archetype::Wanderer,
        level: 15,
        xp: 0,
        subscription: SubscriptionTier::Free,
        streak_days: 0,
        mood: None,
        recovery_score: 0,
    });
    record.character = Some(CharacterSnapshot {
        strength: 30,
        endurance: 10,
        hp: 100,
        max_hp: 100,
    });
    store.put_player(record).unwrap();
    store
        .load_opponents_json(
            r#"[
                {"id":"goblin","name":"Goblin","base_hp":100,"base_damage":10,"defense":4},
                {"id":"troll","name":"Troll","base_hp":5000,"base_damage":40,"difficulty":"hard"},
                {"id":"shade","name":"Shade","base_hp":50,"base_damage":10,
                 "scaling":{"rule":"match_player","percent":10.0}}
            ]"#,
        )
        .unwrap();
    store
}

fn fight(
    service: &EncounterService<'_>,
    opponent: &str,
    action: CombatAction,
) -> titanstat::combat::EncounterSession {
    let hero = PlayerId::new("hero");
    let mut session = service
        .begin_seeded(&hero, &OpponentId::new(opponent), 42, now())
        .unwrap();
    while !session.is_resolved() {
        session = service
            .submit_turn(&hero, &session.session_id, action, now())
            .unwrap();
    }
    session
}

#[test]
fn test_fight_until_victory() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);

    let session = fight(&service, "goblin", CombatAction::Attack);
    // 40 - 4/2 = 38 per hit: 100 -> 62 -> 24 -> 0
    assert_eq!(session.state, EncounterState::Victory);
    assert_eq!(session.turn_count, 3);
    assert_eq!(session.opponent_hp, 0);
    // 10 - 15/2 = 3 per counter, two counters
    assert_eq!(session.player_hp, 94);
    assert_eq!(session.version, 3);

    // Transcript records the damage rolled, not the HP left to take.
    let outcome = EncounterOutcome::from_session(&session);
    assert_eq!(outcome.damage_dealt, 114);
    assert_eq!(outcome.damage_taken, 6);
    assert_eq!(outcome.crits, 0);
}

#[test]
fn test_fight_until_defeat() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);

    let session = fight(&service, "troll", CombatAction::Attack);
    // 40 * 1.5 = 60 - 7 = 53 per counter: 100 -> 47 -> 0
    assert_eq!(session.state, EncounterState::Defeat);
    assert_eq!(session.turn_count, 2);
    assert_eq!(session.player_hp, 0);
    assert_eq!(session.transcript.last().unwrap().actor, Actor::Opponent);
}

#[test]
fn test_guard_survives_longer() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);

    let session = fight(&service, "troll", CombatAction::Guard);
    // floor(53 * 0.5) = 26 per counter: four turns to fall
    assert_eq!(session.state, EncounterState::Defeat);
    assert_eq!(session.turn_count, 4);
    assert!(session
        .transcript
        .iter()
        .filter(|e| e.actor == Actor::Player)
        .all(|e| e.damage == 0));
}

#[test]
fn test_opponent_matches_player_level() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);

    let session = service
        .begin_seeded(&PlayerId::new("hero"), &OpponentId::new("shade"), 1, now())
        .unwrap();
    assert_eq!(session.opponent.level, 15);
    // 50 * (1 + 0.1 * 14)
    assert_eq!(session.opponent_max_hp, 120);
    assert_eq!(session.player_hp, session.player_max_hp);
}

#[test]
fn test_resolved_session_rejects_turns() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);
    let hero = PlayerId::new("hero");

    let session = fight(&service, "goblin", CombatAction::Attack);
    let err = service
        .submit_turn(&hero, &session.session_id, CombatAction::Attack, now())
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::EncounterAlreadyResolved {
            session_id: session.session_id.clone(),
            state: EncounterState::Victory,
        }
    );

    let stored = store.load_session(&session.session_id).unwrap().unwrap();
    assert_eq!(stored, session);
}

#[test]
fn test_stale_write_is_rejected() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);
    let hero = PlayerId::new("hero");

    let session = service
        .begin_seeded(&hero, &OpponentId::new("goblin"), 9, now())
        .unwrap();
    let context = ContextBuilder::new(&store, &config).build(&hero, now()).unwrap();

    // Two requests both read version 0 and resolve a turn.
    let first = resolve_turn(&session, CombatAction::Attack, &context, &config.combat).unwrap();
    let second = resolve_turn(&session, CombatAction::Guard, &context, &config.combat).unwrap();

    store.compare_and_swap(&first, session.version).unwrap();
    let err = store.compare_and_swap(&second, session.version).unwrap_err();
    assert_eq!(
        err,
        EngineError::SessionConflict {
            session_id: session.session_id.clone(),
            expected: 0,
            found: 1,
        }
    );

    let stored = store.load_session(&session.session_id).unwrap().unwrap();
    assert_eq!(stored.opponent_hp, first.opponent_hp);
    assert_eq!(stored.transcript.len(), 2);
}

/// Replaying a seed starts a new session and plays out the same way.
#[test]
fn test_replay_with_same_seed() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);

    let first = fight(&service, "goblin", CombatAction::Attack);
    let replay = fight(&service, "goblin", CombatAction::Attack);
    assert_ne!(first.session_id, replay.session_id);
    assert_eq!(first.transcript, replay.transcript);
    assert_eq!(first.player_hp, replay.player_hp);

    // Same seed against another opponent is fine too.
    let other = service
        .begin_seeded(&PlayerId::new("hero"), &OpponentId::new("shade"), 42, now())
        .unwrap();
    assert_eq!(other.state, EncounterState::Active);
}

#[test]
fn test_duplicate_session_id_is_not_a_conflict() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);

    let session = service
        .begin_seeded(&PlayerId::new("hero"), &OpponentId::new("goblin"), 5, now())
        .unwrap();
    assert_eq!(
        store.insert_session(&session).unwrap_err(),
        EngineError::SessionExists(session.session_id.clone())
    );
}

#[test]
fn test_unknown_opponent_and_session() {
    let store = arena();
    let config = EngineConfig::default();
    let service = EncounterService::new(&store, &store, &store, &config);
    let hero = PlayerId::new("hero");

    assert_eq!(
        service
            .begin(&hero, &OpponentId::new("dragon"), now())
            .unwrap_err(),
        EngineError::OpponentNotFound(OpponentId::new("dragon"))
    );
    assert!(matches!(
        service.submit_turn(&hero, &"missing".into(), CombatAction::Attack, now()),
        Err(EngineError::SessionNotFound(_))
    ));
}

#[test]
fn test_scaled_definition_is_used_as_is() {
    let def = OpponentDefinition {
        id: OpponentId::new("wisp"),
        name: String::from("Wisp"),
        base_hp: 30,
        base_damage: 8,
        defense: 0,
        level: 2,
        scaling: OpponentScaling::Fixed,
        difficulty: Difficulty::Easy,
    };
    let scaled = def.scaled(99);
    assert_eq!(scaled.level, 2);
    assert_eq!(scaled.max_hp, 30);
    assert_eq!(scaled.damage, 6);
}
