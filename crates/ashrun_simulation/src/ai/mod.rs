//! AI steering: преследование игрока
//!
//! Каждый тик, для каждого живого (не помеченного) врага:
//! 1. Clamp позиции к арене (по своему footprint'у) + обнуление
//!    "наружных" компонент скорости на clamped осях
//! 2. direction = normalize(flatten_y(player - enemy))
//! 3. Горизонтальная скорость = direction * speed (Y — у физики)
//! 4. Heading slerp'ится к atan2(dir.x, dir.z) с фиксированным фактором
//!    (плавный разворот вместо мгновенного)
//!
//! Нет игрока → steering пропускается, враги держат позицию.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::{Enemy, Player};
use crate::config::GameConfig;
use crate::lifecycle::Doomed;
use crate::physics::SimSet;

/// Фактор сглаживания разворота за тик
const TURN_SMOOTHING: f32 = 0.1;

/// Система: chase steering всех врагов
pub fn steer_enemies(
    config: Res<GameConfig>,
    player: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut enemies: Query<
        (&Enemy, &mut Transform, &mut Velocity),
        (Without<Player>, Without<Doomed>),
    >,
) {
    let Ok(player_transform) = player.single() else {
        return;
    };
    let player_position = player_transform.translation;

    for (enemy, mut transform, mut velocity) in enemies.iter_mut() {
        let Some(archetype) = config.enemies.get(enemy.archetype) else {
            continue;
        };

        clamp_to_arena(
            &mut transform.translation,
            &mut velocity.linvel,
            config.arena.half_extent,
            archetype.footprint(),
        );

        let Some(direction) = chase_direction(player_position, transform.translation) else {
            continue;
        };

        // Вертикаль не трогаем — гравитация у движка
        velocity.linvel.x = direction.x * archetype.speed;
        velocity.linvel.z = direction.z * archetype.speed;

        let target = Quat::from_rotation_y(heading_of(direction));
        transform.rotation = transform.rotation.slerp(target, TURN_SMOOTHING);
    }
}

/// Clamp к квадрату арены; наружная компонента скорости на clamped оси
/// обнуляется (иначе движок продавит тело сквозь границу)
pub(crate) fn clamp_to_arena(
    translation: &mut Vec3,
    velocity: &mut Vec3,
    half_extent: f32,
    footprint: f32,
) {
    let limit = (half_extent - footprint).max(0.0);

    if translation.x > limit {
        translation.x = limit;
        velocity.x = velocity.x.min(0.0);
    } else if translation.x < -limit {
        translation.x = -limit;
        velocity.x = velocity.x.max(0.0);
    }

    if translation.z > limit {
        translation.z = limit;
        velocity.z = velocity.z.min(0.0);
    } else if translation.z < -limit {
        translation.z = -limit;
        velocity.z = velocity.z.max(0.0);
    }
}

/// Горизонтальное направление на игрока; None если цель прямо над/под
pub(crate) fn chase_direction(player: Vec3, enemy: Vec3) -> Option<Vec3> {
    let mut direction = player - enemy;
    direction.y = 0.0;
    direction.try_normalize()
}

/// Yaw-heading направления (радианы вокруг Y)
pub(crate) fn heading_of(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

pub struct SteeringPlugin;

impl Plugin for SteeringPlugin {
    fn build(&self, app: &mut App) {
        // Позицию игрока читаем после его движенческой цепочки (slide
        // двигает Transform) — порядок фиксируем явно
        app.add_systems(
            FixedUpdate,
            steer_enemies
                .in_set(SimSet::Update)
                .after(crate::player::player_fire),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chase_direction_is_flat_and_unit() {
        let direction = chase_direction(Vec3::new(10.0, 5.0, 0.0), Vec3::ZERO).unwrap();

        assert_eq!(direction.y, 0.0);
        assert!((direction.length() - 1.0).abs() < 1e-5);
        assert!(direction.x > 0.99);
    }

    #[test]
    fn test_chase_direction_degenerate() {
        // Игрок ровно над врагом — горизонтального направления нет
        assert!(chase_direction(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO).is_none());
    }

    #[test]
    fn test_clamp_zeroes_outward_velocity_only() {
        let mut translation = Vec3::new(30.0, 1.0, 0.0);
        let mut velocity = Vec3::new(4.0, -2.0, 1.0);

        clamp_to_arena(&mut translation, &mut velocity, 25.0, 0.5);

        assert_eq!(translation.x, 24.5);
        assert_eq!(velocity.x, 0.0); // Наружная компонента убита
        assert_eq!(velocity.y, -2.0); // Вертикаль не тронута
        assert_eq!(velocity.z, 1.0); // Другая ось не тронута
    }

    #[test]
    fn test_clamp_keeps_inward_velocity() {
        let mut translation = Vec3::new(-30.0, 1.0, 0.0);
        let mut velocity = Vec3::new(3.0, 0.0, 0.0); // Уже внутрь

        clamp_to_arena(&mut translation, &mut velocity, 25.0, 0.5);

        assert_eq!(translation.x, -24.5);
        assert_eq!(velocity.x, 3.0);
    }

    #[test]
    fn test_heading_quadrants() {
        use std::f32::consts::FRAC_PI_2;

        assert!((heading_of(Vec3::Z) - 0.0).abs() < 1e-5);
        assert!((heading_of(Vec3::X) - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_inside_arena_untouched() {
        let mut translation = Vec3::new(1.0, 0.5, -2.0);
        let mut velocity = Vec3::new(1.0, 0.0, 1.0);

        clamp_to_arena(&mut translation, &mut velocity, 25.0, 0.5);

        assert_eq!(translation, Vec3::new(1.0, 0.5, -2.0));
        assert_eq!(velocity, Vec3::new(1.0, 0.0, 1.0));
    }
}
