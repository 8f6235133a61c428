//! ECS Components
//!
//! Организация по доменам:
//! - well: waterwell-сущности (Deployable, Waterwell, WellHealth, WellItem)
//! - actor: акторы хоста (Player, Inventory)

pub mod actor;
pub mod well;

// Re-exports для удобного импорта
pub use actor::*;
pub use well::*;
