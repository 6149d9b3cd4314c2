//! Игровая конфигурация (tunables)
//!
//! Один GameConfig resource на весь App. Host может переопределить
//! значения из JSON строки (`GameConfig::from_json`), источник файла —
//! ответственность host'а. Все поля имеют дефолты, частичный JSON валиден.

use bevy::prelude::*;
use serde::Deserialize;

/// Параметры игрока
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Горизонтальная скорость (m/s)
    pub move_speed: f32,
    /// Начальная вертикальная скорость прыжка (m/s, Y-up)
    pub jump_speed: f32,
    /// Decay горизонтальной скорости в воздухе без input (за тик)
    pub air_decay: f32,
    /// Capsule: половина цилиндрической части (m)
    pub half_height: f32,
    /// Capsule: радиус (m)
    pub radius: f32,
    /// Половина цилиндрической части во время slide (m)
    pub slide_half_height: f32,
    /// Длительность slide (секунды)
    pub slide_duration: f32,
    /// Длительность invincibility после урона (секунды)
    pub invincibility_duration: f32,
    /// Частота мигания во время invincibility (Hz, полный цикл)
    pub blink_hz: f32,
    /// Стартовое число жизней
    pub lives: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            jump_speed: 7.5,
            air_decay: 0.92,
            half_height: 0.6,
            radius: 0.3,
            slide_half_height: 0.2,
            slide_duration: 0.8,
            invincibility_duration: 2.0,
            blink_hz: 8.0,
            lives: 3,
        }
    }
}

/// Параметры снарядов
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Скорость полёта (m/s)
    pub speed: f32,
    /// Урон за попадание
    pub damage: u32,
    /// Время жизни (секунды)
    pub lifetime: f32,
    /// Максимальная дистанция от точки spawn'а (m)
    pub max_range: f32,
    /// Радиус коллайдера (m)
    pub radius: f32,
    /// Минимальный интервал между выстрелами (секунды)
    pub fire_cooldown: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 30.0,
            damage: 10,
            lifetime: 3.0,
            max_range: 60.0,
            radius: 0.1,
            fire_cooldown: 0.25,
        }
    }
}

/// Шаблон врага (shared template, см. EnemyCatalog в components::enemy)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnemyArchetype {
    pub name: String,
    /// Половинные размеры cuboid коллайдера [x, y, z] (m)
    pub half_extents: [f32; 3],
    /// Скорость преследования (m/s)
    pub speed: f32,
    /// Стартовое здоровье
    pub max_health: u32,
    /// Очки за убийство
    pub score_value: u32,
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self {
            name: "grunt".to_string(),
            half_extents: [0.4, 0.6, 0.4],
            speed: 3.0,
            max_health: 20,
            score_value: 100,
        }
    }
}

impl EnemyArchetype {
    pub fn half_extents_vec(&self) -> Vec3 {
        Vec3::from_array(self.half_extents)
    }

    /// Максимальный горизонтальный footprint (для arena clamp)
    pub fn footprint(&self) -> f32 {
        self.half_extents[0].max(self.half_extents[2])
    }
}

/// Параметры волнового spawn'а
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Интервал между spawn'ами врагов (секунды)
    pub enemy_interval: f32,
    /// Интервал между spawn'ами препятствий (секунды)
    pub obstacle_interval: f32,
    /// Интервал между spawn'ами collectible'ов (секунды)
    pub collectible_interval: f32,
    /// Лимит одновременно живых врагов
    pub max_enemies: usize,
    /// Лимит одновременно живых препятствий
    pub max_obstacles: usize,
    /// Лимит одновременно живых collectible'ов
    pub max_collectibles: usize,
    /// Очки за подбор collectible'а
    pub collectible_value: u32,
    /// Половинные размеры препятствия [x, y, z] (m)
    pub obstacle_half_extents: [f32; 3],
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            enemy_interval: 2.5,
            obstacle_interval: 4.0,
            collectible_interval: 6.0,
            max_enemies: 12,
            max_obstacles: 8,
            max_collectibles: 4,
            collectible_value: 50,
            obstacle_half_extents: [0.5, 0.5, 0.5],
        }
    }
}

/// Границы арены
///
/// Квадратная арена со стороной 2 * half_extent, пол на y = 0.
/// min_y — нижняя world-граница: всё что провалилось ниже, деспавнится.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub half_extent: f32,
    pub min_y: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            half_extent: 25.0,
            min_y: -10.0,
        }
    }
}

/// Корневая конфигурация симуляции
#[derive(Resource, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub projectile: ProjectileConfig,
    pub spawn: SpawnConfig,
    pub arena: ArenaConfig,
    pub enemies: Vec<EnemyArchetype>,
}

impl GameConfig {
    /// Парсит конфиг из JSON строки (частичные переопределения допустимы)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: GameConfig = serde_json::from_str(json)?;
        config.ensure_catalog();
        Ok(config)
    }

    /// Каталог врагов не бывает пустым: без archetypes spawn'ер не работает
    pub fn ensure_catalog(&mut self) {
        if self.enemies.is_empty() {
            self.enemies = Self::default_catalog();
        }
    }

    fn default_catalog() -> Vec<EnemyArchetype> {
        vec![
            EnemyArchetype::default(),
            EnemyArchetype {
                name: "brute".to_string(),
                half_extents: [0.6, 0.9, 0.6],
                speed: 1.8,
                max_health: 60,
                score_value: 250,
            },
        ]
    }

    /// Дефолтный конфиг с заполненным каталогом
    pub fn standard() -> Self {
        let mut config = Self::default();
        config.ensure_catalog();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = GameConfig::standard();
        assert!(config.player.jump_speed > 0.0);
        assert!(config.player.slide_half_height < config.player.half_height);
        assert!(!config.enemies.is_empty());
    }

    #[test]
    fn test_partial_json_override() {
        let config = GameConfig::from_json(r#"{ "player": { "lives": 5 } }"#).unwrap();

        // Переопределённое поле
        assert_eq!(config.player.lives, 5);
        // Остальное — дефолты
        assert_eq!(config.player.move_speed, PlayerConfig::default().move_speed);
        assert!(!config.enemies.is_empty());
    }

    #[test]
    fn test_invalid_json_is_err() {
        assert!(GameConfig::from_json("{ nope").is_err());
    }

    #[test]
    fn test_catalog_from_json() {
        let config = GameConfig::from_json(
            r#"{ "enemies": [ { "name": "runner", "speed": 5.0, "max_health": 10, "score_value": 75 } ] }"#,
        )
        .unwrap();

        assert_eq!(config.enemies.len(), 1);
        assert_eq!(config.enemies[0].name, "runner");
        // Незаполненные поля archetype — дефолты
        assert_eq!(config.enemies[0].half_extents, [0.4, 0.6, 0.4]);
    }
}
