//! Компонент снаряда

use bevy::prelude::*;

/// Снаряд в полёте
///
/// Lifecycle: Spawned → Active → MarkedForRemoval (RemovalQueue) → detach.
/// Времена — по fixed-clock (Time<Fixed>::elapsed_secs).
#[derive(Component, Debug, Clone, Copy)]
pub struct Projectile {
    /// Момент spawn'а (секунды fixed-clock)
    pub spawned_at: f32,
    /// Точка spawn'а (для max_range проверки)
    pub origin: Vec3,
    /// Урон при попадании (снимок config'а на момент выстрела)
    pub damage: u32,
}
