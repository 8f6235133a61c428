//! Substitution controller
//!
//! Подмена generic-объекта на персональный waterwell и обратная операция:
//! - `substitute_marked_deployables` — DeployFinished → spawn Waterwell+WellHealth,
//!   оригинал помечается на отложенный destroy (следующий тик)
//! - `flush_deferred_despawns` — убирает помеченные сущности в начале тика
//! - `handle_pickup_attempts` — PickupAttempt → destroy well + выдать предмет
//! - `recover_orphaned_wells` — startup-скан: осиротевшим персональным well
//!   (пережившим рестарт без ledger) заново вешается WellHealth
//!
//! Контроллер не держит ссылок на сущности между тиками — всё через query,
//! поэтому рестарт-безопасность структурная, а не через сохранённое состояние.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::components::{
    Deployable, DespawnNextTick, Player, Waterwell, WellHealth, WELL_MAX_HEALTH, WELL_SKIN_ID,
};
use crate::config::WaterwellConfig;
use crate::grants::WellGrant;
use crate::logger;

/// Хост-событие: установка deployable финализирована
#[derive(Event, Debug, Clone, Copy)]
pub struct DeployFinished {
    pub entity: Entity,
}

/// Хост-событие: актор выполнил действие ручного снятия по мировой сущности
#[derive(Event, Debug, Clone, Copy)]
pub struct PickupAttempt {
    pub actor: Entity,
    pub target: Entity,
}

/// Система: подмена маркированных deployable на персональный waterwell
///
/// Немаркированный skin — no-op. Иначе: читаем позу и владельца оригинала,
/// спавним Waterwell с тем же owner и свежим ledger (100/100), оригинал
/// помечаем DespawnNextTick. Если оригинал уже исчез или owner нулевой —
/// операция отменяется целиком и отложенный destroy НЕ планируется
/// (guard против "подмена не удалась, а оригинал всё равно уничтожен").
pub fn substitute_marked_deployables(
    mut commands: Commands,
    mut deploy_events: EventReader<DeployFinished>,
    deployables: Query<(&Deployable, &Transform)>,
) {
    for event in deploy_events.read() {
        let Ok((deployable, transform)) = deployables.get(event.entity) else {
            continue; // Сущность не deployable или уже уничтожена
        };
        if deployable.skin_id != WELL_SKIN_ID {
            continue;
        }
        if deployable.owner_id == 0 {
            // Персональный well без владельца нарушил бы инвариант owner_id != 0
            logger::log_warning(&format!(
                "Marked deployable {:?} has no owner, substitution skipped",
                event.entity
            ));
            continue;
        }

        commands.spawn((
            Waterwell {
                skin_id: WELL_SKIN_ID,
                owner_id: deployable.owner_id,
            },
            WellHealth::new(WELL_MAX_HEALTH),
            *transform,
        ));

        // Destroy оригинала — тиком позже: пайплайн установки ещё финализирует его
        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert(DespawnNextTick);
        }

        logger::log_info(&format!(
            "Substituted personal waterwell for {:?} (owner {})",
            event.entity, deployable.owner_id
        ));
    }
}

/// Система: уничтожение сущностей, помеченных на прошлом тике
///
/// Идёт первой в цепочке, поэтому метка, поставленная в этом тике, сработает
/// только в следующем. Уже уничтоженные сущности в query не попадают —
/// повторный destroy безопасный no-op.
pub fn flush_deferred_despawns(
    mut commands: Commands,
    pending: Query<Entity, With<DespawnNextTick>>,
) {
    for entity in pending.iter() {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.despawn();
        }
    }
}

/// Система: pickup персонального waterwell
///
/// Немаркированная цель — no-op. Well уничтожается сразу, актору выдаётся
/// маркированный предмет (через WellGrant → grant_well_items в этом же тике).
/// При owner_only_pickup чужой актор получает тихий no-op.
pub fn handle_pickup_attempts(
    mut commands: Commands,
    config: Res<WaterwellConfig>,
    mut pickup_events: EventReader<PickupAttempt>,
    mut grants: EventWriter<WellGrant>,
    wells: Query<&Waterwell>,
    players: Query<&Player>,
) {
    // Два pickup по одной цели в одном тике → ровно одна выдача
    let mut claimed: HashSet<Entity> = HashSet::new();

    for event in pickup_events.read() {
        let Ok(well) = wells.get(event.target) else {
            continue;
        };
        if well.skin_id != WELL_SKIN_ID {
            continue;
        }
        if config.owner_only_pickup {
            let is_owner = players
                .get(event.actor)
                .map(|player| player.user_id == well.owner_id)
                .unwrap_or(false);
            if !is_owner {
                continue;
            }
        }
        if !claimed.insert(event.target) {
            continue;
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.target) {
            entity_commands.despawn();
        }
        grants.write(WellGrant {
            actor: event.actor,
            via_pickup: true,
        });

        logger::log_info(&format!(
            "Personal waterwell {:?} picked up by {:?}",
            event.target, event.actor
        ));
    }
}

/// Система: восстановление осиротевших персональных well после рестарта
///
/// Ledger не переживает рестарт процесса, сама сущность — да (её персистит
/// хост). Скан по типу: каждому Waterwell с owner_id != 0 без WellHealth
/// вешается свежий ledger, на месте, без респавна. Фильтр Without — и есть
/// guard от двойного attach: повторный прогон ничего не найдёт.
pub fn recover_orphaned_wells(
    mut commands: Commands,
    orphans: Query<(Entity, &Waterwell), Without<WellHealth>>,
) {
    for (entity, well) in orphans.iter() {
        if well.owner_id == 0 {
            continue;
        }
        logger::log_info(&format!(
            "Found personal waterwell {:?} (owner {}), attaching health ledger",
            entity, well.owner_id
        ));
        commands
            .entity(entity)
            .insert(WellHealth::new(WELL_MAX_HEALTH));
    }
}
