//! Headless прогон персонального waterwell
//!
//! Сценарий end-to-end без хоста: выдача → установка → подмена → обстрел →
//! разрушение. Тики дергаем через FixedUpdate напрямую — без реального
//! времени прогон детерминирован.

use bevy::prelude::*;
use waterwell_simulation::*;

fn main() {
    let mut app = create_headless_app();
    app.update(); // Startup (recovery-скан пустого мира)

    // Игрок с правом на крафт
    let player = app
        .world_mut()
        .spawn((Player { user_id: 1001 }, Inventory::default()))
        .id();
    app.world_mut()
        .resource_mut::<PermissionRegistry>()
        .grant(1001, PERM_USE);

    // Крафт предмета
    app.world_mut().send_event(CraftRequest { actor: player });
    tick(&mut app);

    // Установка: хост потребляет предмет и финализирует deployable
    let item = app
        .world_mut()
        .get_mut::<Inventory>(player)
        .and_then(|mut inventory| inventory.take_marked_item())
        .expect("crafted item");
    println!("Deploying item: {} (skin {})", item.name, item.skin_id);

    let deployable = app
        .world_mut()
        .spawn((
            Deployable {
                skin_id: item.skin_id,
                owner_id: 1001,
            },
            Transform::from_xyz(10.0, 0.0, -3.0),
        ))
        .id();
    app.world_mut().send_event(DeployFinished { entity: deployable });
    tick(&mut app); // Подмена
    tick(&mut app); // Отложенный destroy оригинала

    // Обстрел из винтовки: 4 × 25 = 100
    for shot in 0..4 {
        let target = single_well(&mut app).expect("well alive");
        app.world_mut().send_event(WellDamage {
            target,
            properties: Some("Damage.Rifle".to_string()),
        });
        tick(&mut app);
        println!("Shot {} fired", shot + 1);
    }

    match single_well(&mut app) {
        None => println!("Waterwell destroyed, simulation complete!"),
        Some(entity) => println!("Unexpected survivor: {:?}", entity),
    }
}

fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn single_well(app: &mut App) -> Option<Entity> {
    let mut query = app.world_mut().query::<(Entity, &Waterwell)>();
    query
        .iter(app.world())
        .find(|(_, well)| well.is_personal())
        .map(|(entity, _)| entity)
}
