//! Компоненты врагов

use bevy::prelude::*;

/// Враг, преследующий игрока
///
/// Все числовые параметры (скорость, размеры, здоровье, очки) живут в
/// shared шаблоне `EnemyArchetype` в GameConfig.enemies; компонент хранит
/// только индекс.
#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy {
    /// Индекс в GameConfig.enemies
    pub archetype: usize,
}

/// Здоровье врага
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }
}

/// Препятствие (статичный hazard на арене)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Obstacle;

/// Подбираемый бонус (sensor, очки при касании игроком)
#[derive(Component, Debug, Clone, Copy)]
pub struct Collectible {
    pub value: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(30);
        assert!(health.is_alive());

        health.take_damage(10);
        assert_eq!(health.current, 20);

        health.take_damage(100); // Saturating sub
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }
}
