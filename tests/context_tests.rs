use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use titanstat::buff::BuffSource;
use titanstat::snapshot::{
    Archetype, CharacterSnapshot, Decree, Effect, EquipmentItem, Mood, PlayerSnapshot,
    RankSnapshot, SkillDefinition, SkillSnapshot, SubscriptionTier,
};
use titanstat::store::PlayerRecord;
use titanstat::{
    ContextBuilder, DecreeId, EngineConfig, EngineError, InMemoryStore, ItemId, ModifierField,
    ModifierModel, PlayerContext, PlayerId, SkillId,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
}

fn player(id: &str, archetype: Archetype, level: u32) -> PlayerSnapshot {
    PlayerSnapshot {
        id: PlayerId::new(id),
        display_name: id.to_uppercase(),
        archetype,
        level,
        xp: 0,
        subscription: SubscriptionTier::Free,
        streak_days: 0,
        mood: None,
        recovery_score: 0,
    }
}

fn item(id: &str, power: u32) -> EquipmentItem {
    EquipmentItem {
        item_id: ItemId::new(id),
        name: id.to_string(),
        equipped: true,
        power,
        armor: 0,
        effects: Vec::new(),
    }
}

fn build(store: &InMemoryStore, id: &str) -> Result<PlayerContext, EngineError> {
    let config = EngineConfig::default();
    ContextBuilder::new(store, &config).build(&PlayerId::new(id), now())
}

/// Juggernaut with nothing else: only the archetype profile applies.
#[test]
fn test_archetype_only_modifiers() {
    let store = InMemoryStore::new();
    store
        .put_player(PlayerRecord::new(player("ana", Archetype::Juggernaut, 20)))
        .unwrap();

    let ctx = build(&store, "ana").unwrap();
    assert!((ctx.modifiers.attack_power.value() - 1.20).abs() < 1e-12);
    assert!((ctx.modifiers.stamina.value() - 0.90).abs() < 1e-12);
    assert_eq!(ctx.active_buffs.len(), 1);
    assert_eq!(ctx.active_buffs[0].source, BuffSource::Archetype);
}

/// Two equipped items, strength 20, base attack 10, archetype x1.2.
#[test]
fn test_effective_attack_with_equipment() {
    let store = InMemoryStore::new();
    let mut record = PlayerRecord::new(player("ana", Archetype::Juggernaut, 20));
    record.character = Some(CharacterSnapshot {
        strength: 20,
        endurance: 0,
        hp: 200,
        max_hp: 200,
    });
    record.equipment = vec![item("greatsword", 100), item("ring", 10)];
    store.put_player(record).unwrap();

    let ctx = build(&store, "ana").unwrap();
    assert_eq!(ctx.combat.effective_attack.value, 168);
    let sources: Vec<&str> = ctx
        .combat
        .effective_attack
        .sources
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(sources, vec!["Base attack", "Strength", "Equipment"]);
}

#[test]
fn test_unknown_player_is_an_error() {
    let store = InMemoryStore::new();
    let err = build(&store, "nobody").unwrap_err();
    assert_eq!(err, EngineError::PlayerNotFound(PlayerId::new("nobody")));
}

#[test]
fn test_missing_records_degrade_gracefully() {
    let store = InMemoryStore::new();
    store
        .put_player(PlayerRecord::new(player("bo", Archetype::Wanderer, 40)))
        .unwrap();

    let ctx = build(&store, "bo").unwrap();
    assert!(ctx.modifiers.attack_power.value() == 1.0);
    assert_eq!(ctx.combat.effective_attack.value, 10);
    assert_eq!(ctx.combat.max_hp.value, 100);
    assert!(ctx.raw.equipped_item_ids.is_empty());
    assert!(ctx.raw.unlocked_skill_ids.is_empty());
}

#[test]
fn test_every_source_contributes() {
    let store = InMemoryStore::new();
    let mut p = player("cy", Archetype::Sentinel, 4);
    p.subscription = SubscriptionTier::Plus;
    p.streak_days = 3;
    p.mood = Some(Mood::Focused);
    let mut record = PlayerRecord::new(p);
    record.equipment = vec![EquipmentItem {
        effects: vec![Effect::Percent {
            field: ModifierField::GoldGain,
            percent: 15.0,
        }],
        ..item("lucky-charm", 0)
    }];
    record.skills = Some(SkillSnapshot {
        definitions: vec![SkillDefinition {
            id: SkillId::new("iron-skin"),
            name: String::from("Iron Skin"),
            effects: vec![Effect::Flat {
                field: ModifierField::FlatDefense,
                amount: 5.0,
            }],
            prerequisites: Vec::new(),
        }],
        unlocked: vec![SkillId::new("iron-skin")],
        socketed: vec![SkillId::new("iron-skin")],
    });
    record.rank = Some(RankSnapshot { score: 1550 });
    record.decrees = vec![Decree {
        id: DecreeId::new("weekend"),
        name: String::from("Weekend Warrior"),
        xp_boost_points: 15.0,
        expires_at: now() + Duration::hours(6),
    }];
    store.put_player(record).unwrap();

    let ctx = build(&store, "cy").unwrap();
    let mut sources: Vec<BuffSource> = ctx.active_buffs.iter().map(|b| b.source).collect();
    sources.sort();
    let mut all = BuffSource::ALL.to_vec();
    all.sort();
    assert_eq!(sources, all);

    // 50 onboarding + 10 plus + 15 decree + 6 streak
    assert_eq!(ctx.modifiers.xp_boost_points, 81.0);
    assert!((ctx.modifiers.crit_chance - 0.03).abs() < 1e-12);
    assert!((ctx.modifiers.gold_gain.value() - 1.15).abs() < 1e-12);
    assert_eq!(ctx.raw.unlocked_skill_ids, vec![SkillId::new("iron-skin")]);
}

/// A negative decree would zero every XP reward; the build refuses it.
#[test]
fn test_negative_decree_is_rejected() {
    let store = InMemoryStore::new();
    let mut record = PlayerRecord::new(player("fay", Archetype::Wanderer, 30));
    record.decrees = vec![Decree {
        id: DecreeId::new("penalty"),
        name: String::from("Penalty"),
        xp_boost_points: -150.0,
        expires_at: now() + Duration::hours(1),
    }];
    store.put_player(record).unwrap();

    let err = build(&store, "fay").unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidModifier {
            origin: BuffSource::Decree,
            field: ModifierField::XpBoostPoints,
            value: -150.0,
        }
    );
}

#[test]
fn test_equipment_cannot_feed_boost_points() {
    let store = InMemoryStore::new();
    let mut record = PlayerRecord::new(player("gus", Archetype::Wanderer, 30));
    record.equipment = vec![EquipmentItem {
        effects: vec![Effect::Flat {
            field: ModifierField::XpBoostPoints,
            amount: -120.0,
        }],
        ..item("drain-ring", 0)
    }];
    store.put_player(record).unwrap();

    assert!(matches!(
        build(&store, "gus"),
        Err(EngineError::InvalidModifier {
            origin: BuffSource::Equipment,
            field: ModifierField::XpBoostPoints,
            ..
        })
    ));
}

#[test]
fn test_skill_cycle_surfaces_error() {
    let store = InMemoryStore::new();
    let mut record = PlayerRecord::new(player("dee", Archetype::Wanderer, 30));
    let skill = |id: &str, prereq: &str| SkillDefinition {
        id: SkillId::new(id),
        name: id.to_string(),
        effects: Vec::new(),
        prerequisites: vec![SkillId::new(prereq)],
    };
    record.skills = Some(SkillSnapshot {
        definitions: vec![skill("a", "b"), skill("b", "a")],
        unlocked: vec![SkillId::new("a")],
        socketed: vec![SkillId::new("a")],
    });
    store.put_player(record).unwrap();

    let err = build(&store, "dee").unwrap_err();
    assert!(matches!(err, EngineError::InvalidSkillTree { .. }));
}

#[test]
fn test_context_reflects_equipment_swap_immediately() {
    let store = InMemoryStore::new();
    let mut record = PlayerRecord::new(player("eli", Archetype::Wanderer, 30));
    record.equipment = vec![item("club", 20)];
    store.put_player(record).unwrap();
    assert_eq!(build(&store, "eli").unwrap().combat.effective_attack.value, 30);

    store
        .update_player(&PlayerId::new("eli"), |r| r.equipment[0].equipped = false)
        .unwrap();
    assert_eq!(build(&store, "eli").unwrap().combat.effective_attack.value, 10);
}

fn partial_model() -> impl Strategy<Value = ModifierModel> {
    (0.5f64..2.0, 0.5f64..2.0, -0.5f64..0.8, 0.0f64..50.0, 0.0f64..30.0).prop_map(
        |(atk, xp, crit, flat, boost)| {
            ModifierModel::new()
                .with_factor(BuffSource::Equipment, ModifierField::AttackPower, atk)
                .unwrap()
                .with_factor(BuffSource::Equipment, ModifierField::XpGain, xp)
                .unwrap()
                .with_flat(BuffSource::Rank, ModifierField::CritChance, crit)
                .unwrap()
                .with_flat(BuffSource::Equipment, ModifierField::FlatAttack, flat)
                .unwrap()
                .with_flat(BuffSource::Streak, ModifierField::XpBoostPoints, boost)
                .unwrap()
        },
    )
}

/// A list of partial models together with an arbitrary permutation of it.
fn permuted_models() -> impl Strategy<Value = (Vec<ModifierModel>, Vec<ModifierModel>)> {
    prop::collection::vec(partial_model(), 0..8)
        .prop_flat_map(|models| (Just(models.clone()), Just(models).prop_shuffle()))
}

proptest! {
    #[test]
    fn prop_fold_is_order_independent((models, shuffled) in permuted_models()) {
        let forward = ModifierModel::fold(&models);
        let permuted = ModifierModel::fold(&shuffled);
        for field in ModifierField::ALL {
            let (a, b) = (forward.get(field), permuted.get(field));
            prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0), "{field}: {a} vs {b}");
        }
    }

    #[test]
    fn prop_crit_is_clamped(models in prop::collection::vec(partial_model(), 0..16)) {
        let folded = ModifierModel::fold(&models);
        prop_assert!((0.0..=1.0).contains(&folded.crit_chance));
    }
}
