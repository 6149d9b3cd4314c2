//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - player: игрок (Player, Lives, MoveState, Pose, Invincible, FireControl)
//! - enemy: враги (Enemy, Health, каталог archetype'ов живёт в config)
//! - projectile: снаряды (Projectile)
//! - world: привязка физических тел к игровым ролям (BodyOwner)

pub mod enemy;
pub mod player;
pub mod projectile;
pub mod world;

// Re-exports для удобного импорта
pub use enemy::*;
pub use player::*;
pub use projectile::*;
pub use world::*;
