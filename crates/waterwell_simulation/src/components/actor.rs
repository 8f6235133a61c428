//! Компоненты акторов хоста: Player, Inventory
//!
//! Акторами (игроками) владеет хост-симуляция. Ядру от них нужно немного:
//! user_id для permission gate / owner-проверки и инвентарь для выдачи предмета.

use bevy::prelude::*;
use crate::components::WellItem;

/// Игрок (актор, способный ставить/подбирать waterwell)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player {
    /// Stable user ID хоста (0 = невалидный)
    pub user_id: u64,
}

/// Инвентарь актора
///
/// Ёмкость и раскладка — забота хоста; ядро только кладёт выданные предметы.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Inventory {
    pub items: Vec<WellItem>,
}

impl Inventory {
    /// Забрать первый маркированный waterwell-предмет (для установки)
    pub fn take_marked_item(&mut self) -> Option<WellItem> {
        let index = self.items.iter().position(|item| item.is_marked())?;
        Some(self.items.remove(index))
    }
}
