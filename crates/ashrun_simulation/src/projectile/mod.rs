//! Снаряды: spawn → полёт → expiry / попадание → deferred removal
//!
//! Урон и очки начисляются синхронно в resolve-пассе (после шага, по
//! событиям этого шага); detach тел — только в removal-пассе. Дубликаты
//! collision-событий одной пары в одном тике гасятся проверкой очереди.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::{BodyOwner, Enemy, Health, Projectile};
use crate::config::{ArenaConfig, GameConfig};
use crate::lifecycle::{doom, Doomed, EntityPool, Pooled, RemovalQueue};
use crate::logger;
use crate::physics::{projectile_groups, SimSet};
use crate::scoreboard::Score;
use crate::visual::{VisualEvent, VisualKind};

/// Запрос на выстрел (player fire-система или host)
#[derive(Event, Debug, Clone, Copy)]
pub struct FireRequest {
    pub origin: Vec3,
    /// Ненормированное направление; нулевое — запрос игнорируется
    pub direction: Vec3,
}

/// Событие: враг уничтожен (host: звук, VFX, UI)
#[derive(Event, Debug, Clone, Copy)]
pub struct EnemyKilled {
    pub entity: Entity,
    pub score_value: u32,
}

/// За пределами арены + запас: стены должны поймать снаряд раньше
const BOUNDS_MARGIN: f32 = 5.0;

/// Система: спавнит снаряды по FireRequest (слот из пула или новый)
pub fn spawn_projectiles(
    mut commands: Commands,
    mut requests: EventReader<FireRequest>,
    mut pool: ResMut<EntityPool<Projectile>>,
    mut visuals: EventWriter<VisualEvent>,
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
) {
    for request in requests.read() {
        let Some(direction) = request.direction.try_normalize() else {
            continue;
        };

        let bundle = (
            Transform::from_translation(request.origin),
            Projectile {
                spawned_at: time.elapsed_secs(),
                origin: request.origin,
                damage: config.projectile.damage,
            },
            BodyOwner::Projectile,
            Pooled { active: true },
            RigidBody::Dynamic,
            Collider::ball(config.projectile.radius),
            Velocity {
                linvel: direction * config.projectile.speed,
                angvel: Vec3::ZERO,
            },
            // Снаряды летят по прямой; быстрые + маленькие → CCD
            GravityScale(0.0),
            Ccd::enabled(),
            ActiveEvents::COLLISION_EVENTS,
            projectile_groups(),
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
            kind: VisualKind::Projectile,
        });
    }
}

/// Система: старение снарядов — lifetime, дальность, world bounds
pub fn expire_projectiles(
    mut commands: Commands,
    mut queue: ResMut<RemovalQueue>,
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    projectiles: Query<(Entity, &Projectile, &Transform, &Pooled), Without<Doomed>>,
) {
    let now = time.elapsed_secs();
    for (entity, projectile, transform, pooled) in projectiles.iter() {
        if !pooled.active || queue.contains(entity) {
            continue;
        }
        if should_expire(now, projectile, transform.translation, &config) {
            doom(entity, &mut queue, &mut commands);
        }
    }
}

/// Пограничные случаи (ровно lifetime / ровно max_range) — в пользу despawn
pub(crate) fn should_expire(
    now: f32,
    projectile: &Projectile,
    position: Vec3,
    config: &GameConfig,
) -> bool {
    if now - projectile.spawned_at >= config.projectile.lifetime {
        return true;
    }
    if position.distance_squared(projectile.origin) >= config.projectile.max_range.powi(2) {
        return true;
    }
    out_of_bounds(position, &config.arena)
}

fn out_of_bounds(position: Vec3, arena: &ArenaConfig) -> bool {
    position.y < arena.min_y
        || position.x.abs() > arena.half_extent + BOUNDS_MARGIN
        || position.z.abs() > arena.half_extent + BOUNDS_MARGIN
}

/// Система: разбор попаданий снарядов по CollisionEvent'ам шага
///
/// static/obstacle → снаряд в очередь; enemy (не помеченный) → урон,
/// при смерти пометка + очки ровно один раз; снаряд расходуется при
/// любом попадании.
pub fn resolve_projectile_hits(
    mut commands: Commands,
    mut collisions: EventReader<CollisionEvent>,
    mut queue: ResMut<RemovalQueue>,
    mut score: ResMut<Score>,
    mut killed: EventWriter<EnemyKilled>,
    config: Res<GameConfig>,
    owners: Query<&BodyOwner>,
    projectiles: Query<&Projectile>,
    mut enemies: Query<(&Enemy, &mut Health)>,
) {
    for event in collisions.read() {
        let CollisionEvent::Started(a, b, _flags) = *event else {
            continue;
        };
        let Some((projectile_entity, other)) = projectile_of(&owners, a, b) else {
            continue;
        };

        // Движок может доставить дубликат события той же пары в одном
        // тике; помеченный снаряд уже израсходован
        if queue.contains(projectile_entity) {
            continue;
        }

        match owners.get(other) {
            Ok(BodyOwner::Static) | Ok(BodyOwner::Obstacle) => {
                doom(projectile_entity, &mut queue, &mut commands);
            }
            Ok(BodyOwner::Enemy) => {
                if !queue.contains(other) {
                    if let Ok((enemy, mut health)) = enemies.get_mut(other) {
                        let damage = projectiles
                            .get(projectile_entity)
                            .map(|p| p.damage)
                            .unwrap_or(config.projectile.damage);
                        health.take_damage(damage);

                        if !health.is_alive() {
                            let score_value = config
                                .enemies
                                .get(enemy.archetype)
                                .map(|a| a.score_value)
                                .unwrap_or(0);
                            score.points += score_value;
                            score.kills += 1;
                            killed.write(EnemyKilled {
                                entity: other,
                                score_value,
                            });
                            doom(other, &mut queue, &mut commands);

                            logger::log(&format!(
                                "💥 Enemy {:?} destroyed (+{} pts)",
                                other, score_value
                            ));
                        }
                    }
                }
                // Снаряд расходуется при любом попадании
                doom(projectile_entity, &mut queue, &mut commands);
            }
            _ => {}
        }
    }
}

/// (снаряд, второй участник), если ровно один из пары — снаряд
fn projectile_of(
    owners: &Query<&BodyOwner>,
    a: Entity,
    b: Entity,
) -> Option<(Entity, Entity)> {
    match (owners.get(a), owners.get(b)) {
        (Ok(BodyOwner::Projectile), Ok(BodyOwner::Projectile)) => None,
        (Ok(BodyOwner::Projectile), _) => Some((a, b)),
        (_, Ok(BodyOwner::Projectile)) => Some((b, a)),
        _ => None,
    }
}

pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<FireRequest>().add_event::<EnemyKilled>();

        // FireRequest'ы игрока обрабатываются в том же тике: spawn строго
        // после player_fire (и порядок аллокации entity id стабилен)
        app.add_systems(
            FixedUpdate,
            (spawn_projectiles, expire_projectiles)
                .chain()
                .in_set(SimSet::Update)
                .after(crate::player::player_fire),
        );
        app.add_systems(
            FixedLast,
            resolve_projectile_hits.in_set(SimSet::Resolve),
        );
    }
}
