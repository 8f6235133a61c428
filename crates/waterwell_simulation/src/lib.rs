//! Personal Waterwell Simulation Core
//!
//! ECS-ядро персонального waterwell: игрок ставит generic deployable с
//! sentinel skin, ядро атомарно подменяет его на owned-сущность с health
//! ledger; урон списывается по фиксированной таблице причин, при исчерпании —
//! эффекты разрушения и destroy; ручной pickup возвращает маркированный
//! предмет в инвентарь.
//!
//! Хост-симуляция (игровой сервер) владеет рендером, физикой, персистом и
//! чатом; интеграция — только через события (DeployFinished, WellDamage,
//! PickupAttempt, CraftRequest → EffectCue, ChatNotification).

use bevy::prelude::*;

// Публичные модули
pub mod components;
pub mod config;
pub mod damage;
pub mod grants;
pub mod logger;
pub mod substitution;

// Re-export основных типов
pub use components::{
    Deployable, DespawnNextTick, Inventory, Player, Waterwell, WellHealth, WellItem,
    ITEM_BASE_KIND, WELL_MAX_HEALTH, WELL_SKIN_ID,
};
pub use config::WaterwellConfig;
pub use damage::{
    apply_well_damage, deduction_for, EffectCue, WellDamage, DESTRUCTION_CUES,
    UNCLASSIFIED_DEDUCTION,
};
pub use grants::{
    ChatNotification, CraftRequest, MessageCatalog, MessageKey, PermissionRegistry, WellGrant,
    PERM_USE,
};
pub use substitution::{DeployFinished, PickupAttempt};

/// Главный plugin ядра
///
/// Порядок выполнения (FixedUpdate, единая цепочка):
/// 1. flush_deferred_despawns — отложенные destroy с прошлого тика
/// 2. substitute_marked_deployables — подмена маркированных deployable
/// 3. apply_well_damage — урон и разрушение
/// 4. handle_pickup_attempts — pickup (пишет WellGrant)
/// 5. handle_craft_requests — крафт через permission gate (пишет WellGrant)
/// 6. grant_well_items — выдача предметов и уведомления
///
/// Recovery-скан осиротевших well — один раз в Startup, до первого события.
pub struct PersonalWaterwellPlugin;

impl Plugin for PersonalWaterwellPlugin {
    fn build(&self, app: &mut App) {
        // Ресурсы: init_resource не перетирает конфиг, вставленный хостом/тестом
        app.init_resource::<WaterwellConfig>()
            .init_resource::<MessageCatalog>()
            .init_resource::<PermissionRegistry>();

        // Регистрация событий
        app.add_event::<DeployFinished>()
            .add_event::<PickupAttempt>()
            .add_event::<WellDamage>()
            .add_event::<EffectCue>()
            .add_event::<CraftRequest>()
            .add_event::<WellGrant>()
            .add_event::<ChatNotification>();

        app.add_systems(Startup, substitution::recover_orphaned_wells);

        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: отложенные destroy (метки прошлого тика)
                substitution::flush_deferred_despawns,

                // Фаза 2: подмена generic → owned
                substitution::substitute_marked_deployables,

                // Фаза 3: урон
                damage::apply_well_damage,

                // Фаза 4: pickup и крафт (оба пишут WellGrant)
                substitution::handle_pickup_attempts,
                grants::handle_craft_requests,

                // Фаза 5: выдача предметов
                grants::grant_well_items,
            )
                .chain(), // Последовательное выполнение
        );
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app() -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(PersonalWaterwellPlugin);

    app
}
