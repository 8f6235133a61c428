//! Damage classifier + применение урона к персональным waterwell
//!
//! ECS ответственность:
//! - классификация причины урона → фиксированное списание (total function)
//! - ведение WellHealth, уничтожение при current ≤ 0
//! - события EffectCue для хост-бриджа (эффекты разрушения)
//!
//! Хост ответственность:
//! - источник WellDamage событий (по одному на применение урона)
//! - проигрывание EffectCue (particles, звук)
//!
//! Для персонального waterwell этот обработчик авторитетен: дефолтный
//! death-пайплайн хоста не вызывается — никаких generic death-событий и
//! Dead-маркеров отсюда не выходит.

use bevy::prelude::*;

use crate::components::{Waterwell, WellHealth, WELL_SKIN_ID};
use crate::logger;

/// Списание по умолчанию: нераспознанная причина уничтожает с одного удара.
/// Fail-destructive: урон никогда не игнорируется молча.
pub const UNCLASSIFIED_DEDUCTION: i32 = 100;

/// Эффекты разрушения — два независимых fire-and-forget cue
pub const DESTRUCTION_CUES: [&str; 2] = ["fx/item_break", "fx/impacts/stab_rock"];

/// Хост-событие: применение урона к мировой сущности
///
/// properties — сырое имя damage properties вида "Damage.Rifle".
/// None или неожиданная форма = нераспознанная причина.
#[derive(Event, Debug, Clone)]
pub struct WellDamage {
    pub target: Entity,
    pub properties: Option<String>,
}

/// Событие для хост-бриджа: проиграть эффект в точке
#[derive(Event, Debug, Clone)]
pub struct EffectCue {
    pub cue: &'static str,
    pub position: Vec3,
}

/// Классификация причины урона → фиксированное списание
///
/// Total function: категория — второй сегмент имени properties
/// ("Damage.Melee" → "Melee"); любая невалидная форма падает в default-ветку.
pub fn deduction_for(properties: Option<&str>) -> i32 {
    let Some(category) = properties.and_then(|name| name.split('.').nth(1)) else {
        return UNCLASSIFIED_DEDUCTION;
    };
    match category {
        "Melee" => 5,
        "Buckshot" => 9,
        "Arrow" => 15,
        "Pistol" => 20,
        "Rifle" => 25,
        _ => UNCLASSIFIED_DEDUCTION,
    }
}

/// Система: применение урона к персональным waterwell
///
/// Fast-reject: цель без Waterwell+WellHealth (или не sentinel skin) — no-op,
/// урон обрабатывает дефолтный пайплайн хоста. Иначе списываем по таблице;
/// при current ≤ 0 — два EffectCue в позиции сущности и destroy.
pub fn apply_well_damage(
    mut commands: Commands,
    mut damage_events: EventReader<WellDamage>,
    mut effect_events: EventWriter<EffectCue>,
    mut wells: Query<(&Waterwell, &mut WellHealth, &Transform)>,
) {
    for event in damage_events.read() {
        let Ok((well, mut health, transform)) = wells.get_mut(event.target) else {
            continue; // Не персональный waterwell — нас не касается
        };
        if well.skin_id != WELL_SKIN_ID || well.owner_id == 0 {
            continue;
        }
        if health.is_depleted() {
            // Уже уничтожен ранее в этом тике (destroy применится на sync point)
            continue;
        }

        let deduction = deduction_for(event.properties.as_deref());
        health.deduct(deduction);
        logger::log(&format!(
            "Waterwell {:?} took {} damage ({} HP left)",
            event.target, deduction, health.current
        ));

        if health.is_depleted() {
            for cue in DESTRUCTION_CUES {
                effect_events.write(EffectCue {
                    cue,
                    position: transform.translation,
                });
            }
            if let Ok(mut entity_commands) = commands.get_entity(event.target) {
                entity_commands.despawn();
            }
            logger::log_info(&format!("💥 Personal waterwell {:?} destroyed", event.target));
        }
    }
}
