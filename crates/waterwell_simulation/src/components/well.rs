//! Waterwell-компоненты: Deployable, Waterwell, WellHealth, WellItem
//!
//! Маркировка: skin_id == WELL_SKIN_ID — единственный признак "персональной"
//! версии и у предмета, и у мировой сущности. Других значений skin не несёт.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Sentinel skin — отличает персональный waterwell от обычного
pub const WELL_SKIN_ID: u64 = 2_532_413_310;

/// Базовый вид предмета, под которым маркированный waterwell лежит в инвентаре
pub const ITEM_BASE_KIND: &str = "water.catcher.small";

/// Максимальное здоровье персонального waterwell
pub const WELL_MAX_HEALTH: i32 = 100;

/// Задеплоенный игроком generic-объект (результат установки предмета)
///
/// Создаётся хостом, не нами. Ядро его только наблюдает: если skin — sentinel,
/// объект подменяется на Waterwell и уничтожается.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Deployable {
    pub skin_id: u64,
    pub owner_id: u64,
}

/// Waterwell — мировая сущность
///
/// Персональный вариант: skin_id == WELL_SKIN_ID, owner_id != 0, плюс WellHealth.
/// Общий (статический) вариант: owner_id == 0, без WellHealth.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Waterwell {
    pub skin_id: u64,
    pub owner_id: u64,
}

impl Waterwell {
    pub fn is_personal(&self) -> bool {
        self.skin_id == WELL_SKIN_ID && self.owner_id != 0
    }
}

/// Health ledger персонального waterwell
///
/// Инвариант: current ≤ max. current намеренно i32: при добивающем ударе
/// значение транзиентно уходит в минус, и только проверка current ≤ 0
/// уничтожает сущность (не clamp до нуля).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct WellHealth {
    pub current: i32,
    pub max: i32,
}

impl Default for WellHealth {
    fn default() -> Self {
        Self::new(WELL_MAX_HEALTH)
    }
}

impl WellHealth {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Списывает deduction без clamp — значение может стать отрицательным
    pub fn deduct(&mut self, deduction: i32) {
        self.current -= deduction;
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0
    }
}

/// Маркированный предмет в инвентаре
///
/// Создаётся крафтом/выдачей или успешным pickup; уничтожается при установке.
#[derive(Debug, Clone, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub struct WellItem {
    pub base_kind: String,
    pub skin_id: u64,
    pub name: String,
}

impl WellItem {
    pub fn new(name: &str) -> Self {
        Self {
            base_kind: ITEM_BASE_KIND.to_string(),
            skin_id: WELL_SKIN_ID,
            name: name.to_string(),
        }
    }

    pub fn is_marked(&self) -> bool {
        self.skin_id == WELL_SKIN_ID
    }
}

/// Маркер: уничтожить сущность в начале следующего тика
///
/// Отложенный destroy при подмене: generic-объект ещё финализируется пайплайном
/// установки, убивать его в том же тике нельзя. Система `flush_deferred_despawns`
/// идёт первой в цепочке и убирает помеченные сущности тиком позже.
#[derive(Component, Debug)]
pub struct DespawnNextTick;
