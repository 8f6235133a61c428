//! Well lifecycle integration test
//!
//! Полный цикл персонального waterwell headless:
//! - подмена generic → owned (с отложенным destroy оригинала)
//! - таблица списаний урона + fail-destructive default
//! - recovery-скан после "рестарта" (идемпотентность)
//! - round-trip: выдача → установка → pickup с сохранением маркировки
//! - permission gate и owner-only pickup policy
//!
//! Тики дергаем через run_schedule(FixedUpdate) — детерминированно, без
//! зависимости от wall-clock аккумуляции fixed timestep.

use bevy::prelude::*;
use waterwell_simulation::*;

/// Helper: App с plugin и отработавшим Startup
fn create_test_app() -> App {
    let mut app = create_headless_app();
    app.update(); // Startup (recovery-скан)
    app
}

/// Helper: один тик симуляции
fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Helper: spawn игрока с инвентарём
fn spawn_player(app: &mut App, user_id: u64) -> Entity {
    app.world_mut()
        .spawn((Player { user_id }, Inventory::default()))
        .id()
}

/// Helper: spawn finalized deployable + DeployFinished событие
fn deploy(app: &mut App, skin_id: u64, owner_id: u64, transform: Transform) -> Entity {
    let entity = app
        .world_mut()
        .spawn((Deployable { skin_id, owner_id }, transform))
        .id();
    app.world_mut().send_event(DeployFinished { entity });
    entity
}

/// Helper: spawn готового owned well (минуя пайплайн установки)
fn spawn_owned_well(app: &mut App, owner_id: u64, transform: Transform) -> Entity {
    app.world_mut()
        .spawn((
            Waterwell {
                skin_id: WELL_SKIN_ID,
                owner_id,
            },
            WellHealth::new(WELL_MAX_HEALTH),
            transform,
        ))
        .id()
}

fn personal_wells(app: &mut App) -> Vec<(Entity, Waterwell)> {
    let mut query = app.world_mut().query::<(Entity, &Waterwell)>();
    query
        .iter(app.world())
        .filter(|(_, well)| well.is_personal())
        .map(|(entity, well)| (entity, *well))
        .collect()
}

fn collect_effect_cues(app: &App) -> Vec<EffectCue> {
    let events = app.world().resource::<Events<EffectCue>>();
    events.get_cursor().read(events).cloned().collect()
}

fn collect_notifications(app: &App) -> Vec<ChatNotification> {
    let events = app.world().resource::<Events<ChatNotification>>();
    events.get_cursor().read(events).cloned().collect()
}

/// Test: маркированная установка подменяется owned well, оригинал умирает тиком позже
#[test]
fn test_marked_deploy_substituted_after_deferred_tick() {
    let mut app = create_test_app();
    let pose = Transform::from_xyz(4.0, 0.0, -2.0)
        .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
    let generic = deploy(&mut app, WELL_SKIN_ID, 7001, pose);

    tick(&mut app);

    // Owned well существует сразу, оригинал ещё жив (destroy отложен на тик)
    let wells = personal_wells(&mut app);
    assert_eq!(wells.len(), 1);
    assert_eq!(wells[0].1.owner_id, 7001);
    assert!(app.world().get_entity(generic).is_ok());

    let well_entity = wells[0].0;
    let health = app.world().get::<WellHealth>(well_entity).expect("ledger");
    assert_eq!(health.current, 100);
    assert_eq!(health.max, 100);

    let well_pose = app.world().get::<Transform>(well_entity).expect("pose");
    assert_eq!(well_pose.translation, pose.translation);
    assert_eq!(well_pose.rotation, pose.rotation);

    tick(&mut app);

    // После отложенного тика: ровно один owned well, generic исчез
    assert_eq!(personal_wells(&mut app).len(), 1);
    assert!(app.world().get_entity(generic).is_err());
}

/// Test: немаркированная установка — no-op
#[test]
fn test_unmarked_deploy_untouched() {
    let mut app = create_test_app();
    let generic = deploy(&mut app, 12345, 7001, Transform::from_xyz(1.0, 0.0, 1.0));

    tick(&mut app);
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());
    assert!(app.world().get_entity(generic).is_ok());
}

/// Test: DeployFinished по уже исчезнувшей сущности — no-op (guard подмены)
#[test]
fn test_deploy_event_for_missing_entity_is_noop() {
    let mut app = create_test_app();
    let generic = deploy(
        &mut app,
        WELL_SKIN_ID,
        7001,
        Transform::from_xyz(0.0, 0.0, 0.0),
    );
    app.world_mut().despawn(generic);

    tick(&mut app);
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());
}

/// Test: маркированная установка без владельца пропускается
#[test]
fn test_ownerless_marked_deploy_skipped() {
    let mut app = create_test_app();
    let generic = deploy(&mut app, WELL_SKIN_ID, 0, Transform::default());

    tick(&mut app);
    tick(&mut app);

    // Инвариант owner_id != 0 сохранён, оригинал не тронут
    assert!(personal_wells(&mut app).is_empty());
    assert!(app.world().get_entity(generic).is_ok());
}

/// Test: каждая причина из таблицы списывает свой deduction со свежего ledger
#[test]
fn test_damage_table_applied() {
    let cases = [
        ("Damage.Melee", 5),
        ("Damage.Buckshot", 9),
        ("Damage.Arrow", 15),
        ("Damage.Pistol", 20),
        ("Damage.Rifle", 25),
    ];

    for (properties, deduction) in cases {
        let mut app = create_test_app();
        let well = spawn_owned_well(&mut app, 7001, Transform::default());

        app.world_mut().send_event(WellDamage {
            target: well,
            properties: Some(properties.to_string()),
        });
        tick(&mut app);

        let health = app.world().get::<WellHealth>(well).expect("well alive");
        assert_eq!(
            health.current,
            100 - deduction,
            "cause {}: expected {} HP",
            properties,
            100 - deduction
        );
    }
}

/// Test: нераспознанная причина уничтожает с одного удара, два effect cue
#[test]
fn test_unrecognized_cause_destroys_in_one_hit() {
    let mut app = create_test_app();
    let position = Vec3::new(3.0, 0.0, 8.0);
    let well = spawn_owned_well(&mut app, 7001, Transform::from_translation(position));

    app.world_mut().send_event(WellDamage {
        target: well,
        properties: Some("Damage.Explosion".to_string()),
    });
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());

    let cues = collect_effect_cues(&app);
    assert_eq!(cues.len(), 2);
    for (cue, expected) in cues.iter().zip(DESTRUCTION_CUES) {
        assert_eq!(cue.cue, expected);
        assert_eq!(cue.position, position);
    }
}

/// Test: malformed properties (нет категории) = нераспознанная причина
#[test]
fn test_malformed_damage_properties_destroy() {
    let mut app = create_test_app();
    let well = spawn_owned_well(&mut app, 7001, Transform::default());

    app.world_mut().send_event(WellDamage {
        target: well,
        properties: None,
    });
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());
}

/// Test: урон по чужой сущности (без ledger) — no-op
#[test]
fn test_damage_ignores_unowned_entities() {
    let mut app = create_test_app();
    // Статический общий well: без владельца, без ledger
    let static_well = app
        .world_mut()
        .spawn((
            Waterwell {
                skin_id: 0,
                owner_id: 0,
            },
            Transform::default(),
        ))
        .id();

    app.world_mut().send_event(WellDamage {
        target: static_well,
        properties: Some("Damage.Rifle".to_string()),
    });
    tick(&mut app);

    assert!(app.world().get_entity(static_well).is_ok());
    assert!(collect_effect_cues(&app).is_empty());
}

/// Test: сценарий добивания — 20 HP, Rifle (25) → транзиентный -5, destroy,
/// ровно два cue в последней позиции, никакого дублирующего death-пайплайна
#[test]
fn test_rifle_overkill_destroys_and_fires_two_cues() {
    let mut app = create_test_app();
    let position = Vec3::new(-6.0, 0.0, 2.5);
    let well = spawn_owned_well(&mut app, 7001, Transform::from_translation(position));
    app.world_mut()
        .get_mut::<WellHealth>(well)
        .expect("ledger")
        .current = 20;

    app.world_mut().send_event(WellDamage {
        target: well,
        properties: Some("Damage.Rifle".to_string()),
    });
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());

    let cues = collect_effect_cues(&app);
    assert_eq!(cues.len(), 2, "ровно два destruction cue");
    assert!(cues.iter().all(|cue| cue.position == position));
}

/// Test: recovery-скан вешает ledger осиротевшим well и идемпотентен
#[test]
fn test_recovery_scan_idempotent() {
    let mut app = create_headless_app();

    // "Переживший рестарт" owned well без ledger + статический well
    let orphan = app
        .world_mut()
        .spawn((
            Waterwell {
                skin_id: WELL_SKIN_ID,
                owner_id: 7001,
            },
            Transform::from_xyz(2.0, 0.0, 2.0),
        ))
        .id();
    let static_well = app
        .world_mut()
        .spawn((
            Waterwell {
                skin_id: 0,
                owner_id: 0,
            },
            Transform::default(),
        ))
        .id();

    app.update(); // Startup → recovery

    let health = app.world().get::<WellHealth>(orphan).expect("recovered");
    assert_eq!(health.current, 100);
    assert!(app.world().get::<WellHealth>(static_well).is_none());

    // Частично повреждаем и гоняем скан повторно: ledger не перевешивается
    app.world_mut()
        .get_mut::<WellHealth>(orphan)
        .expect("ledger")
        .current = 40;
    app.world_mut().run_schedule(Startup);

    let health = app.world().get::<WellHealth>(orphan).expect("ledger");
    assert_eq!(health.current, 40, "повторный скан не должен сбрасывать ledger");
    assert!(app.world().get::<WellHealth>(static_well).is_none());
}

/// Test: round-trip выдача → установка → pickup сохраняет маркировку и имя
#[test]
fn test_issue_deploy_pickup_round_trip() {
    let mut app = create_test_app();
    let player = spawn_player(&mut app, 7001);
    app.world_mut()
        .resource_mut::<PermissionRegistry>()
        .grant(7001, PERM_USE);

    // Свежая выдача через крафт
    app.world_mut().send_event(CraftRequest { actor: player });
    tick(&mut app);

    let issued = {
        let inventory = app.world().get::<Inventory>(player).expect("inventory");
        assert_eq!(inventory.items.len(), 1);
        inventory.items[0].clone()
    };
    assert!(issued.is_marked());
    assert_eq!(issued.name, "Waterwell");

    // Хост потребляет предмет и финализирует deployable
    let item = app
        .world_mut()
        .get_mut::<Inventory>(player)
        .expect("inventory")
        .take_marked_item()
        .expect("item");
    deploy(
        &mut app,
        item.skin_id,
        7001,
        Transform::from_xyz(5.0, 0.0, 5.0),
    );
    tick(&mut app);
    tick(&mut app);

    let wells = personal_wells(&mut app);
    assert_eq!(wells.len(), 1);

    // Pickup возвращает идентично маркированный предмет
    app.world_mut().send_event(PickupAttempt {
        actor: player,
        target: wells[0].0,
    });
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());
    let inventory = app.world().get::<Inventory>(player).expect("inventory");
    assert_eq!(inventory.items.len(), 1);
    assert_eq!(inventory.items[0].skin_id, issued.skin_id);
    assert_eq!(inventory.items[0].name, issued.name);

    let texts: Vec<String> = collect_notifications(&app)
        .into_iter()
        .map(|n| n.text)
        .collect();
    assert!(texts.contains(&"You received Waterwell!".to_string()));
    assert!(texts.contains(&"You picked up Waterwell!".to_string()));
}

/// Test: крафт без permission — отказ, сообщение, мир не изменился
#[test]
fn test_craft_without_permission_denied() {
    let mut app = create_test_app();
    let player = spawn_player(&mut app, 7002);

    app.world_mut().send_event(CraftRequest { actor: player });
    tick(&mut app);

    let inventory = app.world().get::<Inventory>(player).expect("inventory");
    assert!(inventory.items.is_empty());
    assert!(personal_wells(&mut app).is_empty());

    let notifications = collect_notifications(&app);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "You need permission to do that!");
}

/// Test: owner_only_pickup — чужой актор получает no-op, владелец забирает
#[test]
fn test_owner_only_pickup_config() {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(WaterwellConfig {
            owner_only_pickup: true,
        })
        .add_plugins(PersonalWaterwellPlugin);
    app.update();

    let owner = spawn_player(&mut app, 7001);
    let stranger = spawn_player(&mut app, 7002);
    let well = spawn_owned_well(&mut app, 7001, Transform::default());

    app.world_mut().send_event(PickupAttempt {
        actor: stranger,
        target: well,
    });
    tick(&mut app);

    assert_eq!(personal_wells(&mut app).len(), 1, "чужой pickup отклонён");
    let inventory = app.world().get::<Inventory>(stranger).expect("inventory");
    assert!(inventory.items.is_empty());

    app.world_mut().send_event(PickupAttempt {
        actor: owner,
        target: well,
    });
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());
    let inventory = app.world().get::<Inventory>(owner).expect("inventory");
    assert_eq!(inventory.items.len(), 1);
}

/// Test: два pickup по одной цели в одном тике — ровно одна выдача
#[test]
fn test_duplicate_pickup_single_grant() {
    let mut app = create_test_app();
    let player = spawn_player(&mut app, 7001);
    let well = spawn_owned_well(&mut app, 7001, Transform::default());

    app.world_mut().send_event(PickupAttempt {
        actor: player,
        target: well,
    });
    app.world_mut().send_event(PickupAttempt {
        actor: player,
        target: well,
    });
    tick(&mut app);

    assert!(personal_wells(&mut app).is_empty());
    let inventory = app.world().get::<Inventory>(player).expect("inventory");
    assert_eq!(inventory.items.len(), 1);
}
