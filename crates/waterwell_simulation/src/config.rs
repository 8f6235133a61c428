//! Конфигурация ядра
//!
//! Вставляется через `init_resource`: если хост (или тест) положил свой
//! конфиг до регистрации plugin — он и действует.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Resource, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaterwellConfig {
    /// Разрешать pickup только владельцу
    ///
    /// Исходное поведение — любой актор может забрать чужой waterwell,
    /// поэтому default = false. Открытый policy-вопрос вынесен в конфиг.
    pub owner_only_pickup: bool,
}

impl Default for WaterwellConfig {
    fn default() -> Self {
        Self {
            owner_only_pickup: false,
        }
    }
}
