//! Player: движение, прыжок (contact-gated), slide, урон/invincibility
//!
//! Grounded — производное от SurfaceContacts (контактный счётчик), не от
//! позиции. Прыжок переключает MoveState оптимистично; авторитетное
//! состояние пересчитывается из tracker'а на следующем тике.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::{
    BodyOwner, Collectible, FireControl, Invincible, Lives, MoveState, Player, Pose,
};
use crate::config::GameConfig;
use crate::input::{AimDirection, InputState};
use crate::lifecycle::{doom, RemovalQueue};
use crate::logger;
use crate::physics::contact::other_of;
use crate::physics::{player_groups, SimSet, SurfaceContacts};
use crate::projectile::FireRequest;
use crate::scoreboard::Score;
use crate::visual::{VisualEvent, VisualKind};

/// Событие: жизни кончились (phase FSM уводит в GameOver)
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerDied;

/// Точка появления игрока: капсула целиком над полом
pub(crate) fn spawn_point(config: &GameConfig) -> Vec3 {
    Vec3::new(
        0.0,
        config.player.half_height + config.player.radius + 0.05,
        0.0,
    )
}

/// Startup: единственный persistent игрок (не pooled)
pub fn spawn_player(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut visuals: EventWriter<VisualEvent>,
) {
    let pc = &config.player;
    let entity = commands
        .spawn((
            (
                Transform::from_translation(spawn_point(&config)),
                Player,
                Lives::new(pc.lives),
                MoveState::default(),
                Pose::default(),
                FireControl::default(),
                BodyOwner::Player,
            ),
            (
                RigidBody::Dynamic,
                Collider::capsule_y(pc.half_height, pc.radius),
                Velocity::zero(),
                LockedAxes::ROTATION_LOCKED,
                Friction::coefficient(1.0),
                Ccd::enabled(),
                ActiveEvents::COLLISION_EVENTS,
                player_groups(),
            ),
        ))
        .id();

    visuals.write(VisualEvent::Attached {
        entity,
        kind: VisualKind::Player,
    });
    logger::log_info(&format!("Player spawned: {:?}", entity));
}

/// Система: MoveState из contact tracker'а
///
/// Приземление гасит остаточную отрицательную вертикальную скорость.
pub fn update_move_state(
    contacts: Res<SurfaceContacts>,
    mut player: Query<(&mut MoveState, &mut Velocity), With<Player>>,
) {
    let Ok((mut state, mut velocity)) = player.single_mut() else {
        return;
    };

    match (*state, contacts.is_grounded()) {
        (MoveState::Airborne, true) => {
            *state = MoveState::Grounded;
            if velocity.linvel.y < 0.0 {
                velocity.linvel.y = 0.0;
            }
        }
        (MoveState::Grounded, false) => {
            *state = MoveState::Airborne;
        }
        _ => {}
    }
}

/// Система: горизонтальное движение
///
/// Input зажат → прямое выставление скорости. Idle в воздухе → decay
/// по фактору из config'а. Idle на земле → скорость не трогаем,
/// затухание отдано трению движка.
pub fn apply_player_movement(
    input: Res<InputState>,
    config: Res<GameConfig>,
    mut player: Query<(&MoveState, &mut Velocity), With<Player>>,
) {
    let Ok((state, mut velocity)) = player.single_mut() else {
        return;
    };

    if input.any_movement() {
        let axis = input.move_axis;
        velocity.linvel.x = axis.x * config.player.move_speed;
        // Вперёд = -Z (bevy right-handed, камера смотрит в -Z)
        velocity.linvel.z = -axis.y * config.player.move_speed;
    } else if *state == MoveState::Airborne {
        velocity.linvel.x *= config.player.air_decay;
        velocity.linvel.z *= config.player.air_decay;
    }
}

/// Система: прыжок, gated контактным счётчиком
pub fn player_jump(
    input: Res<InputState>,
    contacts: Res<SurfaceContacts>,
    config: Res<GameConfig>,
    mut player: Query<(&mut MoveState, &mut Velocity, &Pose), With<Player>>,
) {
    if !input.jump_pressed {
        return;
    }
    let Ok((mut state, mut velocity, pose)) = player.single_mut() else {
        return;
    };

    // Не в воздухе, не из slide'а, не пока ещё взлетаем (контакт с полом
    // живёт тик-другой после отрыва)
    if !contacts.is_grounded() || pose.is_sliding() || velocity.linvel.y > 0.1 {
        return;
    }

    velocity.linvel.y = config.player.jump_speed;
    *state = MoveState::Airborne; // Оптимистично; авторитетен tracker
}

/// Система: slide — time-boxed hitbox override
///
/// Старт только из (Grounded, Normal): укороченная капсула, тело
/// опускается так, чтобы база осталась заякоренной. По истечению таймера
/// коллайдер и позиция восстанавливаются.
pub fn player_slide(
    mut commands: Commands,
    input: Res<InputState>,
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    mut player: Query<(Entity, &MoveState, &mut Pose, &mut Transform), With<Player>>,
) {
    let Ok((entity, state, mut pose, mut transform)) = player.single_mut() else {
        return;
    };
    let pc = &config.player;
    let drop = pc.half_height - pc.slide_half_height;

    match *pose {
        Pose::Sliding { remaining } => {
            let remaining = remaining - time.delta_secs();
            if remaining <= 0.0 {
                commands
                    .entity(entity)
                    .insert(Collider::capsule_y(pc.half_height, pc.radius));
                transform.translation.y += drop;
                *pose = Pose::Normal;
            } else {
                *pose = Pose::Sliding { remaining };
            }
        }
        Pose::Normal => {
            if input.slide_pressed && *state == MoveState::Grounded {
                commands
                    .entity(entity)
                    .insert(Collider::capsule_y(pc.slide_half_height, pc.radius));
                transform.translation.y -= drop;
                *pose = Pose::Sliding {
                    remaining: pc.slide_duration,
                };
            }
        }
    }
}

/// Система: invincibility-таймер + blink
///
/// Видимость переключается с фиксированной частотой и уходит host'у
/// как VisualEvent::Visibility; по истечению — компонент снимается,
/// видимость восстанавливается.
pub fn tick_invincibility(
    mut commands: Commands,
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    mut visuals: EventWriter<VisualEvent>,
    mut player: Query<(Entity, &mut Invincible), With<Player>>,
) {
    let Ok((entity, mut invincible)) = player.single_mut() else {
        return;
    };
    let delta = time.delta_secs();

    invincible.remaining -= delta;
    if invincible.remaining <= 0.0 {
        commands.entity(entity).remove::<Invincible>();
        visuals.write(VisualEvent::Visibility {
            entity,
            visible: true,
        });
        return;
    }

    invincible.blink_timer += delta;
    let half_period = 0.5 / config.player.blink_hz;
    while invincible.blink_timer >= half_period {
        invincible.blink_timer -= half_period;
        invincible.visible = !invincible.visible;
        visuals.write(VisualEvent::Visibility {
            entity,
            visible: invincible.visible,
        });
    }
}

/// Система: выстрел игрока → FireRequest
pub fn player_fire(
    input: Res<InputState>,
    aim: Res<AimDirection>,
    config: Res<GameConfig>,
    time: Res<Time<Fixed>>,
    mut requests: EventWriter<FireRequest>,
    mut player: Query<(&Transform, &mut FireControl), With<Player>>,
) {
    let Ok((transform, mut fire)) = player.single_mut() else {
        return;
    };
    fire.cooldown_left = (fire.cooldown_left - time.delta_secs()).max(0.0);

    if !input.fire_pressed || !fire.can_fire() {
        return;
    }
    let Some(direction) = aim.0.try_normalize() else {
        return;
    };

    fire.cooldown_left = config.projectile.fire_cooldown;
    // Дуло чуть впереди капсулы (groups и так исключают self-hit)
    let muzzle = transform.translation
        + direction * (config.player.radius + config.projectile.radius + 0.2);
    requests.write(FireRequest {
        origin: muzzle,
        direction,
    });
}

/// Система: контакты игрока по событиям шага
///
/// Collectible → очки + пометка; Enemy/Obstacle → урон (no-op при
/// invincibility), одна потеря жизни за тик; жизни кончились → PlayerDied.
pub fn resolve_player_contacts(
    mut commands: Commands,
    mut collisions: EventReader<CollisionEvent>,
    mut queue: ResMut<RemovalQueue>,
    mut score: ResMut<Score>,
    mut died: EventWriter<PlayerDied>,
    config: Res<GameConfig>,
    owners: Query<&BodyOwner>,
    collectibles: Query<&Collectible>,
    mut player: Query<(Entity, &mut Lives, Option<&Invincible>), With<Player>>,
) {
    let Ok((player_entity, mut lives, invincible)) = player.single_mut() else {
        return;
    };
    let mut damaged_this_tick = false;

    for event in collisions.read() {
        let CollisionEvent::Started(a, b, _flags) = *event else {
            continue;
        };
        let Some(other) = other_of(player_entity, a, b) else {
            continue;
        };

        match owners.get(other) {
            Ok(BodyOwner::Collectible) => {
                if queue.contains(other) {
                    continue;
                }
                let value = collectibles
                    .get(other)
                    .map(|c| c.value)
                    .unwrap_or(config.spawn.collectible_value);
                score.points += value;
                doom(other, &mut queue, &mut commands);
                logger::log(&format!("✨ Pickup +{} pts", value));
            }
            Ok(BodyOwner::Enemy) | Ok(BodyOwner::Obstacle) => {
                // Урон при invincibility — no-op; Invincible вставляется
                // через Commands (виден со следующего тика), поэтому
                // повторные удары этого тика гасим локальным флагом
                if damaged_this_tick || invincible.is_some() {
                    continue;
                }
                damaged_this_tick = true;

                lives.remaining = lives.remaining.saturating_sub(1);
                commands
                    .entity(player_entity)
                    .insert(Invincible::new(config.player.invincibility_duration));
                logger::log_info(&format!("Player hit, {} lives left", lives.remaining));

                if lives.is_dead() {
                    died.write(PlayerDied);
                }
            }
            _ => {}
        }
    }
}

/// Reset игрока на входе в Playing (phase FSM)
pub fn reset_player(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut visuals: EventWriter<VisualEvent>,
    mut player: Query<
        (
            Entity,
            &mut Transform,
            &mut Velocity,
            &mut Lives,
            &mut MoveState,
            &mut Pose,
            &mut FireControl,
        ),
        With<Player>,
    >,
) {
    let Ok((entity, mut transform, mut velocity, mut lives, mut state, mut pose, mut fire)) =
        player.single_mut()
    else {
        return;
    };
    let pc = &config.player;

    transform.translation = spawn_point(&config);
    transform.rotation = Quat::IDENTITY;
    *velocity = Velocity::zero();
    *lives = Lives::new(pc.lives);
    *state = MoveState::Airborne;
    *pose = Pose::Normal;
    *fire = FireControl::default();

    commands.entity(entity).remove::<Invincible>();
    // Slide мог не довосстановить hitbox
    commands
        .entity(entity)
        .insert(Collider::capsule_y(pc.half_height, pc.radius));
    visuals.write(VisualEvent::Visibility {
        entity,
        visible: true,
    });
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerDied>();

        app.add_systems(Startup, spawn_player.after(crate::physics::setup_arena));
        app.add_systems(
            FixedUpdate,
            (
                update_move_state,
                player_jump,
                player_slide,
                apply_player_movement,
                tick_invincibility,
                player_fire,
            )
                .chain()
                .in_set(SimSet::Update),
        );
        // Оба resolve-пасса пишут очередь и счёт — порядок фиксируем
        app.add_systems(
            FixedLast,
            resolve_player_contacts
                .in_set(SimSet::Resolve)
                .after(crate::projectile::resolve_projectile_hits),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_point_is_above_floor() {
        let config = GameConfig::standard();
        let point = spawn_point(&config);
        assert!(point.y > config.player.half_height + config.player.radius);
    }

    #[test]
    fn test_slide_drop_restores_symmetrically() {
        let config = GameConfig::standard();
        let drop = config.player.half_height - config.player.slide_half_height;

        let mut y = 0.9;
        y -= drop; // slide start
        y += drop; // slide end
        assert!((y - 0.9).abs() < 1e-6);
    }
}
