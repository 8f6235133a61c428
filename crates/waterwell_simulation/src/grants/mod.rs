//! Выдача маркированного предмета, permission gate, message catalog
//!
//! # Flow
//!
//! **Fresh grant (крафт/админ):**
//! - `CraftRequest` → permission check → `WellGrant { via_pickup: false }`
//! - админская команда хоста шлёт `WellGrant` напрямую после собственной
//!   авторизации (ядро её не проверяет)
//!
//! **Reclaim (pickup):**
//! - `handle_pickup_attempts` шлёт `WellGrant { via_pickup: true }` —
//!   permission gate при возврате НЕ применяется
//!
//! Уведомления уходят событиями `ChatNotification`; доставку в чат делает хост.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::components::{Inventory, Player, WellItem};
use crate::logger;

/// Permission на крафт/получение персонального waterwell
pub const PERM_USE: &str = "personalwaterwell.use";

// ============================================================================
// Events
// ============================================================================

/// Выдать актору маркированный предмет (точка входа операции Issue)
#[derive(Event, Debug, Clone, Copy)]
pub struct WellGrant {
    pub actor: Entity,
    /// true — возврат через pickup, false — свежая выдача
    pub via_pickup: bool,
}

/// Запрос крафта от чат-команды (permission-gated путь)
#[derive(Event, Debug, Clone, Copy)]
pub struct CraftRequest {
    pub actor: Entity,
}

/// Локализованное сообщение актору (доставляет хост)
#[derive(Event, Debug, Clone)]
pub struct ChatNotification {
    pub actor: Entity,
    pub text: String,
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Отображаемое имя предмета
    Name,
    /// Подтверждение pickup
    Pickup,
    /// Подтверждение свежей выдачи
    Receive,
    /// Отказ в permission
    Permission,
}

/// Каталог локализованных сообщений
///
/// Дефолты — английские; хост может заменить таблицу своей локалью.
#[derive(Resource, Debug, Clone)]
pub struct MessageCatalog {
    messages: HashMap<MessageKey, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let mut messages = HashMap::new();
        messages.insert(MessageKey::Name, "Waterwell".to_string());
        messages.insert(MessageKey::Pickup, "You picked up Waterwell!".to_string());
        messages.insert(MessageKey::Receive, "You received Waterwell!".to_string());
        messages.insert(
            MessageKey::Permission,
            "You need permission to do that!".to_string(),
        );
        Self { messages }
    }
}

impl MessageCatalog {
    pub fn get(&self, key: MessageKey) -> &str {
        self.messages.get(&key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: MessageKey, text: impl Into<String>) {
        self.messages.insert(key, text.into());
    }
}

/// Реестр выданных permissions (user_id, permission)
///
/// Кто и как выдаёт права — забота админ-поверхности хоста.
#[derive(Resource, Debug, Clone, Default)]
pub struct PermissionRegistry {
    grants: HashSet<(u64, String)>,
}

impl PermissionRegistry {
    pub fn grant(&mut self, user_id: u64, permission: &str) {
        self.grants.insert((user_id, permission.to_string()));
    }

    pub fn revoke(&mut self, user_id: u64, permission: &str) {
        self.grants.remove(&(user_id, permission.to_string()));
    }

    pub fn has(&self, user_id: u64, permission: &str) -> bool {
        self.grants.contains(&(user_id, permission.to_string()))
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Система: крафт через permission gate
///
/// Без permission — сообщение Permission и отказ, состояние мира не меняется.
pub fn handle_craft_requests(
    mut craft_events: EventReader<CraftRequest>,
    mut grants: EventWriter<WellGrant>,
    mut notifications: EventWriter<ChatNotification>,
    permissions: Res<PermissionRegistry>,
    messages: Res<MessageCatalog>,
    players: Query<&Player>,
) {
    for event in craft_events.read() {
        let Ok(player) = players.get(event.actor) else {
            continue;
        };
        if !permissions.has(player.user_id, PERM_USE) {
            notifications.write(ChatNotification {
                actor: event.actor,
                text: messages.get(MessageKey::Permission).to_string(),
            });
            continue;
        }
        grants.write(WellGrant {
            actor: event.actor,
            via_pickup: false,
        });
    }
}

/// Система: выдача маркированного предмета (операция Issue)
///
/// Актор без Player+Inventory — no-op (null-actor). Предмет всегда несёт
/// sentinel skin и имя из каталога; переполнение инвентаря — забота хоста,
/// ядро не ретраит.
pub fn grant_well_items(
    mut grant_events: EventReader<WellGrant>,
    mut notifications: EventWriter<ChatNotification>,
    messages: Res<MessageCatalog>,
    mut actors: Query<(&Player, &mut Inventory)>,
) {
    for event in grant_events.read() {
        let Ok((player, mut inventory)) = actors.get_mut(event.actor) else {
            continue;
        };

        inventory
            .items
            .push(WellItem::new(messages.get(MessageKey::Name)));

        let key = if event.via_pickup {
            MessageKey::Pickup
        } else {
            MessageKey::Receive
        };
        notifications.write(ChatNotification {
            actor: event.actor,
            text: messages.get(key).to_string(),
        });

        logger::log(&format!(
            "Issued waterwell item to user {} (via_pickup: {})",
            player.user_id, event.via_pickup
        ));
    }
}
