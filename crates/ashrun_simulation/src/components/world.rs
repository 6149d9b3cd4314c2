//! Привязка физических тел к игровым ролям

use bevy::prelude::*;

/// Роль физического тела в игровой логике
///
/// Collision handlers получают от движка только пары Entity; вместо
/// произвольного user data на телах движка — явный sum type компонентом
/// на entity. Все resolve-системы диспетчеризуются по нему.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOwner {
    Player,
    Enemy,
    Projectile,
    Obstacle,
    Collectible,
    /// Уровень: пол, стены (не pooled, не удаляется)
    Static,
}

impl BodyOwner {
    /// Pooled-роли проходят через deferred removal; Player и Static — нет
    pub fn is_pooled(&self) -> bool {
        matches!(
            self,
            BodyOwner::Enemy | BodyOwner::Projectile | BodyOwner::Obstacle | BodyOwner::Collectible
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pooled_roles() {
        assert!(BodyOwner::Projectile.is_pooled());
        assert!(BodyOwner::Collectible.is_pooled());
        assert!(!BodyOwner::Player.is_pooled());
        assert!(!BodyOwner::Static.is_pooled());
    }
}
