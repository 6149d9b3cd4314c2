//! Физический слой: Rapier + каркас тикового пайплайна
//!
//! Rapier consumed, не reimplemented: тела — это entity с RigidBody +
//! Collider (+Velocity), контакты приходят EventReader'ом CollisionEvent,
//! add/remove body — вставка/снятие компонентов.
//!
//! Порядок внутри одного fixed-тика (load-bearing, см. SimSet):
//!   FixedUpdate:  Input → Update (gameplay, до шага)
//!   [шаг Rapier — fixed schedule плагина]
//!   FixedLast:    Contacts → Resolve → Removal (после шага, до следующего)
//!
//! Detach тел ВНУТРИ шага — UB движка; разнесение по расписанию делает
//! его невозможным структурно, а не проверкой в runtime.

pub mod contact;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::BodyOwner;
use crate::config::GameConfig;

pub use contact::SurfaceContacts;

/// Фазы тикового пайплайна симуляции
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Свёртка input-событий в InputState + phase-переходы (FixedUpdate)
    Input,
    /// Gameplay до шага физики: движение, steering, spawn, expiry (FixedUpdate)
    Update,
    /// Contact tracking по событиям шага (FixedLast)
    Contacts,
    /// Collision resolve: урон, очки, пометки на удаление (FixedLast)
    Resolve,
    /// Deferred removal: detach помеченных entity (FixedLast)
    Removal,
}

// Collision groups (membership, filter)
pub const GROUP_STATIC: Group = Group::GROUP_1;
pub const GROUP_PLAYER: Group = Group::GROUP_2;
pub const GROUP_ENEMY: Group = Group::GROUP_3;
pub const GROUP_PROJECTILE: Group = Group::GROUP_4;
pub const GROUP_PICKUP: Group = Group::GROUP_5;

pub fn static_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_STATIC, Group::ALL)
}

pub fn player_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PLAYER, GROUP_STATIC | GROUP_ENEMY | GROUP_PICKUP)
}

pub fn enemy_groups() -> CollisionGroups {
    CollisionGroups::new(
        GROUP_ENEMY,
        GROUP_STATIC | GROUP_PLAYER | GROUP_ENEMY | GROUP_PROJECTILE,
    )
}

/// Снаряды не коллайдят с игроком (self-hit) и друг с другом
pub fn projectile_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PROJECTILE, GROUP_STATIC | GROUP_ENEMY)
}

pub fn pickup_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PICKUP, GROUP_PLAYER)
}

/// Startup: пол и стены арены (static, вне пулов, живут всегда)
pub fn setup_arena(mut commands: Commands, config: Res<GameConfig>) {
    let half = config.arena.half_extent;
    const WALL_HEIGHT: f32 = 3.0;
    const WALL_THICKNESS: f32 = 0.5;

    // Пол: верхняя грань на y = 0
    commands.spawn((
        Transform::from_xyz(0.0, -0.5, 0.0),
        RigidBody::Fixed,
        Collider::cuboid(half, 0.5, half),
        static_groups(),
        BodyOwner::Static,
    ));

    // Четыре стены по периметру
    let walls = [
        (Vec3::new(half + WALL_THICKNESS, WALL_HEIGHT, 0.0), Vec3::new(WALL_THICKNESS, WALL_HEIGHT, half)),
        (Vec3::new(-half - WALL_THICKNESS, WALL_HEIGHT, 0.0), Vec3::new(WALL_THICKNESS, WALL_HEIGHT, half)),
        (Vec3::new(0.0, WALL_HEIGHT, half + WALL_THICKNESS), Vec3::new(half, WALL_HEIGHT, WALL_THICKNESS)),
        (Vec3::new(0.0, WALL_HEIGHT, -half - WALL_THICKNESS), Vec3::new(half, WALL_HEIGHT, WALL_THICKNESS)),
    ];
    for (position, half_extents) in walls {
        commands.spawn((
            Transform::from_translation(position),
            RigidBody::Fixed,
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
            static_groups(),
            BodyOwner::Static,
        ));
    }

    crate::logger::log_info(&format!("Arena ready: {0}x{0}m, walls up", half * 2.0));
}

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule());

        // Gameplay до шага: сам шаг Rapier живёт в fixed schedule плагина,
        // позже FixedUpdate; resolve/removal — в FixedLast, строго после.
        app.configure_sets(
            FixedUpdate,
            (SimSet::Input, SimSet::Update)
                .chain()
                .before(PhysicsSet::SyncBackend),
        );
        app.configure_sets(
            FixedLast,
            (SimSet::Contacts, SimSet::Resolve, SimSet::Removal).chain(),
        );

        app.add_systems(Startup, setup_arena);
        app.add_systems(
            FixedLast,
            contact::track_surface_contacts.in_set(SimSet::Contacts),
        );
        app.init_resource::<SurfaceContacts>();
    }
}
