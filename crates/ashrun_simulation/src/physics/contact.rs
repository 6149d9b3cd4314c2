//! Contact tracker: "стоит ли игрок на статичной поверхности"
//!
//! Счётчик контактов игрок ↔ static (zero-mass) тело. Инкремент на
//! begin-contact, декремент на end-contact, пол на нуле. Потребители
//! (player state machine) опрашивают is_grounded каждый тик.

use bevy::prelude::*;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;
use bevy_rapier3d::prelude::*;

use crate::components::Player;

/// Счётчик контактов игрока со статичными поверхностями
///
/// ended() — saturating: begin/end события не гарантированно парные
/// (движок может потерять end-contact при удалении тела или рестарте
/// мира), поэтому пол на нуле — обязательный инвариант, не workaround.
#[derive(Resource, Debug, Default)]
pub struct SurfaceContacts {
    count: u32,
}

impl SurfaceContacts {
    pub fn began(&mut self) {
        self.count += 1;
    }

    pub fn ended(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    pub fn is_grounded(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Сброс при рестарте раунда (накопленные непарные контакты)
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Система: ведёт счётчик по CollisionEvent'ам шага
///
/// Контакт учитывается iff ровно одно из двух тел — игрок, второе —
/// RigidBody::Fixed, и пара не sensor'ная (pickup'ы не "земля").
pub fn track_surface_contacts(
    mut collisions: EventReader<CollisionEvent>,
    mut contacts: ResMut<SurfaceContacts>,
    player: Query<Entity, With<Player>>,
    bodies: Query<&RigidBody>,
) {
    let Ok(player_entity) = player.single() else {
        return;
    };

    let is_static =
        |entity: Entity| matches!(bodies.get(entity), Ok(RigidBody::Fixed));

    for event in collisions.read() {
        match *event {
            CollisionEvent::Started(a, b, flags) => {
                if flags.contains(CollisionEventFlags::SENSOR) {
                    continue;
                }
                if let Some(other) = other_of(player_entity, a, b) {
                    if is_static(other) {
                        contacts.began();
                    }
                }
            }
            CollisionEvent::Stopped(a, b, flags) => {
                if flags.contains(CollisionEventFlags::SENSOR) {
                    continue;
                }
                if let Some(other) = other_of(player_entity, a, b) {
                    if is_static(other) {
                        contacts.ended();
                    }
                }
            }
        }
    }
}

/// Второй участник пары, если ровно один из двух — player
pub(crate) fn other_of(player: Entity, a: Entity, b: Entity) -> Option<Entity> {
    match (a == player, b == player) {
        (true, false) => Some(b),
        (false, true) => Some(a),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_never_negative() {
        let mut contacts = SurfaceContacts::default();

        // Непарный end-contact — пол на нуле
        contacts.ended();
        assert_eq!(contacts.count(), 0);

        contacts.began();
        contacts.began();
        contacts.ended();
        contacts.ended();
        contacts.ended(); // Лишний end
        assert_eq!(contacts.count(), 0);
    }

    #[test]
    fn test_grounded_from_count() {
        let mut contacts = SurfaceContacts::default();
        assert!(!contacts.is_grounded());

        contacts.began();
        assert!(contacts.is_grounded());

        contacts.ended();
        assert!(!contacts.is_grounded());
    }

    #[test]
    fn test_reset() {
        let mut contacts = SurfaceContacts::default();
        contacts.began();
        contacts.began();

        contacts.reset();
        assert!(!contacts.is_grounded());
    }

    #[test]
    fn test_other_of_requires_exactly_one_player() {
        let player = Entity::from_raw(1);
        let ground = Entity::from_raw(2);

        assert_eq!(other_of(player, player, ground), Some(ground));
        assert_eq!(other_of(player, ground, player), Some(ground));
        assert_eq!(other_of(player, ground, ground), None);
        assert_eq!(other_of(player, player, player), None);
    }
}
