//! Волновой spawn врагов / препятствий / collectible'ов
//!
//! Интервальные таймеры + DeterministicRng (seed → воспроизводимые
//! волны). Слоты берутся из пулов; лимиты одновременно живых — в config.
//! Препятствия не спавнятся внахлёст: AABB-проверка против уже живых.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::Rng;

use crate::components::{BodyOwner, Collectible, Enemy, Health, Obstacle};
use crate::config::{GameConfig, SpawnConfig};
use crate::lifecycle::{EntityPool, Pooled};
use crate::physics::{enemy_groups, pickup_groups, static_groups, SimSet};
use crate::visual::{VisualEvent, VisualKind};
use crate::DeterministicRng;

/// Обратные отсчёты до следующего spawn'а каждого вида
#[derive(Resource, Debug)]
pub struct SpawnTimers {
    pub enemy: f32,
    pub obstacle: f32,
    pub collectible: f32,
}

impl SpawnTimers {
    pub fn from_config(config: &SpawnConfig) -> Self {
        Self {
            enemy: config.enemy_interval,
            obstacle: config.obstacle_interval,
            collectible: config.collectible_interval,
        }
    }
}

impl Default for SpawnTimers {
    fn default() -> Self {
        Self::from_config(&SpawnConfig::default())
    }
}

/// Symmetric AABB overlap (spawn-rejection для препятствий)
pub fn aabb_overlap(center_a: Vec3, half_a: Vec3, center_b: Vec3, half_b: Vec3) -> bool {
    (center_a.x - center_b.x).abs() <= half_a.x + half_b.x
        && (center_a.y - center_b.y).abs() <= half_a.y + half_b.y
        && (center_a.z - center_b.z).abs() <= half_a.z + half_b.z
}

/// Spawn врага: слот из пула или новая entity
pub fn spawn_enemy(
    commands: &mut Commands,
    pool: &mut EntityPool<Enemy>,
    visuals: &mut EventWriter<VisualEvent>,
    config: &GameConfig,
    archetype: usize,
    position: Vec3,
) -> Option<Entity> {
    let template = config.enemies.get(archetype)?;
    let half = template.half_extents_vec();

    let bundle = (
        (
            Transform::from_translation(position),
            Enemy { archetype },
            Health::new(template.max_health),
            BodyOwner::Enemy,
            Pooled { active: true },
        ),
        (
            RigidBody::Dynamic,
            Collider::cuboid(half.x, half.y, half.z),
            Velocity::zero(),
            LockedAxes::ROTATION_LOCKED,
            enemy_groups(),
        ),
    );

    let entity = match pool.acquire() {
        Some(entity) => {
            commands.entity(entity).insert(bundle);
            entity
        }
        None => {
            let entity = commands.spawn(bundle).id();
            pool.register(entity);
            entity
        }
    };

    visuals.write(VisualEvent::Attached {
        entity,
        kind: VisualKind::Enemy { archetype },
    });
    Some(entity)
}

/// Spawn препятствия (static hazard)
pub fn spawn_obstacle(
    commands: &mut Commands,
    pool: &mut EntityPool<Obstacle>,
    visuals: &mut EventWriter<VisualEvent>,
    config: &GameConfig,
    position: Vec3,
) -> Entity {
    let half = Vec3::from_array(config.spawn.obstacle_half_extents);

    let bundle = (
        Transform::from_translation(position),
        Obstacle,
        BodyOwner::Obstacle,
        Pooled { active: true },
        RigidBody::Fixed,
        Collider::cuboid(half.x, half.y, half.z),
        static_groups(),
    );

    let entity = match pool.acquire() {
        Some(entity) => {
            commands.entity(entity).insert(bundle);
            entity
        }
        None => {
            let entity = commands.spawn(bundle).id();
            pool.register(entity);
            entity
        }
    };

    visuals.write(VisualEvent::Attached {
        entity,
        kind: VisualKind::Obstacle,
    });
    entity
}

/// Spawn collectible (sensor, очки при касании)
pub fn spawn_collectible(
    commands: &mut Commands,
    pool: &mut EntityPool<Collectible>,
    visuals: &mut EventWriter<VisualEvent>,
    config: &GameConfig,
    position: Vec3,
) -> Entity {
    let bundle = (
        Transform::from_translation(position),
        Collectible {
            value: config.spawn.collectible_value,
        },
        BodyOwner::Collectible,
        Pooled { active: true },
        RigidBody::Fixed,
        Collider::ball(0.3),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        pickup_groups(),
    );

    let entity = match pool.acquire() {
        Some(entity) => {
            commands.entity(entity).insert(bundle);
            entity
        }
        None => {
            let entity = commands.spawn(bundle).id();
            pool.register(entity);
            entity
        }
    };

    visuals.write(VisualEvent::Attached {
        entity,
        kind: VisualKind::Collectible,
    });
    entity
}

/// Система: тикает таймеры и спавнит волны
pub fn spawn_waves(
    mut commands: Commands,
    mut timers: ResMut<SpawnTimers>,
    mut rng: ResMut<DeterministicRng>,
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    mut enemy_pool: ResMut<EntityPool<Enemy>>,
    mut obstacle_pool: ResMut<EntityPool<Obstacle>>,
    mut collectible_pool: ResMut<EntityPool<Collectible>>,
    mut visuals: EventWriter<VisualEvent>,
    live_obstacles: Query<(&Transform, &Pooled), With<Obstacle>>,
) {
    let delta = time.delta_secs();
    let half = config.arena.half_extent;

    timers.enemy -= delta;
    if timers.enemy <= 0.0 {
        timers.enemy += config.spawn.enemy_interval;

        if enemy_pool.live_count() < config.spawn.max_enemies && !config.enemies.is_empty() {
            let archetype = rng.rng.gen_range(0..config.enemies.len());
            // Кольцо у края арены, подальше от центра
            let angle = rng.rng.gen_range(0.0..std::f32::consts::TAU);
            let radius = rng.rng.gen_range(0.6..0.9) * (half - 1.0);
            let y = config.enemies[archetype].half_extents[1] + 0.1;
            let position = Vec3::new(angle.cos() * radius, y, angle.sin() * radius);

            spawn_enemy(
                &mut commands,
                &mut enemy_pool,
                &mut visuals,
                &config,
                archetype,
                position,
            );
        }
    }

    timers.obstacle -= delta;
    if timers.obstacle <= 0.0 {
        timers.obstacle += config.spawn.obstacle_interval;

        if obstacle_pool.live_count() < config.spawn.max_obstacles {
            let obstacle_half = Vec3::from_array(config.spawn.obstacle_half_extents);
            // До 8 попыток найти позицию без нахлёста
            for _ in 0..8 {
                let x = rng.rng.gen_range(-0.8..0.8) * half;
                let z = rng.rng.gen_range(-0.8..0.8) * half;
                let position = Vec3::new(x, obstacle_half.y, z);

                let overlaps = live_obstacles.iter().any(|(transform, pooled)| {
                    pooled.active
                        && aabb_overlap(
                            position,
                            obstacle_half,
                            transform.translation,
                            obstacle_half,
                        )
                });
                // Центр арены — spawn игрока, держим свободным
                if overlaps || Vec2::new(position.x, position.z).length() < 3.0 {
                    continue;
                }

                spawn_obstacle(
                    &mut commands,
                    &mut obstacle_pool,
                    &mut visuals,
                    &config,
                    position,
                );
                break;
            }
        }
    }

    timers.collectible -= delta;
    if timers.collectible <= 0.0 {
        timers.collectible += config.spawn.collectible_interval;

        if collectible_pool.live_count() < config.spawn.max_collectibles {
            let x = rng.rng.gen_range(-0.7..0.7) * half;
            let z = rng.rng.gen_range(-0.7..0.7) * half;
            let position = Vec3::new(x, 1.0, z);

            spawn_collectible(
                &mut commands,
                &mut collectible_pool,
                &mut visuals,
                &config,
                position,
            );
        }
    }
}

pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpawnTimers>();

        // Spawn-системы упорядочены между собой: детерминированный
        // порядок аллокации entity id между прогонами
        app.add_systems(
            FixedUpdate,
            spawn_waves
                .in_set(SimSet::Update)
                .before(crate::projectile::spawn_projectiles),
        );
    }
}
