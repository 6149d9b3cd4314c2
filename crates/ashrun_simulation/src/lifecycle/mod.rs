//! Entity pools + deferred removal
//!
//! Правило движка: никаких структурных мутаций тел во время шага физики.
//! Gameplay-системы и collision-обработчики только ПОМЕЧАЮТ entity
//! (RemovalQueue + маркер Doomed); реальный detach — perform_removals,
//! который расписанием закреплён в FixedLast, строго после шага и до
//! следующего (см. physics::SimSet).
//!
//! Pooled entity между использованиями не despawn'ится: физические
//! компоненты снимаются, слот уходит в free-list, Transform и маркер
//! остаются. Пул только растёт.

use std::collections::HashSet;
use std::marker::PhantomData;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::{BodyOwner, Collectible, Enemy, Obstacle, Projectile};
use crate::visual::VisualEvent;

/// Флаг пула: занимает ли entity активный слот (update/draw)
#[derive(Component, Debug, Clone, Copy)]
pub struct Pooled {
    pub active: bool,
}

/// Маркер: entity логически мертва в этом тике
///
/// Инвариант: помеченная entity не участвует в collision-resolve повторно.
/// Авторитетный источник — RemovalQueue (маркер применяется через Commands
/// и виден только со следующего тика, очередь — сразу).
#[derive(Component, Debug, Clone, Copy)]
pub struct Doomed;

/// Очередь deferred removal
///
/// mark идемпотентен; порядок добавления сохраняется для детерминизма
/// detach-пасса.
#[derive(Resource, Debug, Default)]
pub struct RemovalQueue {
    order: Vec<Entity>,
    members: HashSet<Entity>,
}

impl RemovalQueue {
    /// true если entity была добавлена (false — повторная пометка, no-op)
    pub fn mark(&mut self, entity: Entity) -> bool {
        if !self.members.insert(entity) {
            return false;
        }
        self.order.push(entity);
        true
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn drain(&mut self) -> Vec<Entity> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
    }
}

/// Помечает entity на удаление: очередь + Doomed маркер
///
/// Повторная пометка (или пометка уже убранной entity) — silent no-op.
pub fn doom(entity: Entity, queue: &mut RemovalQueue, commands: &mut Commands) {
    if !queue.mark(entity) {
        return;
    }
    if let Ok(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.insert(Doomed);
    }
}

/// Пул entity одного вида (generic по маркер-компоненту)
///
/// Слоты никогда не освобождаются насовсем — индексы/Entity id, розданные
/// в этом тике, остаются валидными.
#[derive(Resource, Debug)]
pub struct EntityPool<T: Component> {
    free: Vec<Entity>,
    live: Vec<Entity>,
    _marker: PhantomData<T>,
}

impl<T: Component> Default for EntityPool<T> {
    fn default() -> Self {
        Self {
            free: Vec::new(),
            live: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<T: Component> EntityPool<T> {
    /// Переиспользовать свободный слот; None — пул пуст, caller спавнит
    /// новую entity и регистрирует её через register
    pub fn acquire(&mut self) -> Option<Entity> {
        let entity = self.free.pop()?;
        self.live.push(entity);
        Some(entity)
    }

    /// Регистрирует свежесозданную entity как живую (пул растёт)
    pub fn register(&mut self, entity: Entity) {
        self.live.push(entity);
    }

    /// Живой слот → free-list; false если entity не была живой (no-op)
    pub fn release(&mut self, entity: Entity) -> bool {
        let Some(index) = self.live.iter().position(|&e| e == entity) else {
            return false;
        };
        self.live.swap_remove(index);
        self.free.push(entity);
        true
    }

    pub fn is_live(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    pub fn live(&self) -> &[Entity] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Все живые → free-list; возвращает бывших живых (phase reset)
    pub fn recycle_all(&mut self) -> Vec<Entity> {
        let recycled = std::mem::take(&mut self.live);
        self.free.extend(recycled.iter().copied());
        recycled
    }
}

/// Снимает физические компоненты с entity (detach от мира)
///
/// Вызывается только между шагами физики: из perform_removals (FixedLast)
/// или из phase-reset'а (StateTransition).
pub(crate) fn strip_body(commands: &mut Commands, entity: Entity) {
    if let Ok(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.remove::<(
            RigidBody,
            Collider,
            Velocity,
            CollisionGroups,
            ActiveEvents,
            GravityScale,
            Ccd,
            LockedAxes,
            Sensor,
            Friction,
            Restitution,
            Doomed,
        )>();
    }
}

/// Деактивирует все живые слоты пула (phase reset; вне шага физики)
pub(crate) fn deactivate_pool<T: Component>(
    pool: &mut EntityPool<T>,
    commands: &mut Commands,
    pooled: &mut Query<&mut Pooled>,
    visuals: &mut EventWriter<VisualEvent>,
) {
    for entity in pool.recycle_all() {
        visuals.write(VisualEvent::Detached { entity });
        strip_body(commands, entity);
        if let Ok(mut slot) = pooled.get_mut(entity) {
            slot.active = false;
        }
    }
}

/// Detach-пасс: дренирует RemovalQueue после шага физики
///
/// Для каждой помеченной живой entity: Detached визуалу, снятие физических
/// компонентов, слот → free-list, active = false. Очередь после вызова
/// пуста. Entity, уже убранные (не live ни в одном пуле), пропускаются
/// молча.
pub fn perform_removals(
    mut commands: Commands,
    mut queue: ResMut<RemovalQueue>,
    mut projectiles: ResMut<EntityPool<Projectile>>,
    mut enemies: ResMut<EntityPool<Enemy>>,
    mut obstacles: ResMut<EntityPool<Obstacle>>,
    mut collectibles: ResMut<EntityPool<Collectible>>,
    owners: Query<&BodyOwner>,
    mut pooled: Query<&mut Pooled>,
    mut visuals: EventWriter<VisualEvent>,
) {
    for entity in queue.drain() {
        let Ok(owner) = owners.get(entity) else {
            continue;
        };

        let released = match owner {
            BodyOwner::Projectile => projectiles.release(entity),
            BodyOwner::Enemy => enemies.release(entity),
            BodyOwner::Obstacle => obstacles.release(entity),
            BodyOwner::Collectible => collectibles.release(entity),
            // Player/Static не проходят через пул — сюда не попадают
            _ => false,
        };
        if !released {
            continue;
        }

        visuals.write(VisualEvent::Detached { entity });
        strip_body(&mut commands, entity);

        if let Ok(mut slot) = pooled.get_mut(entity) {
            slot.active = false;
        }
    }
}

pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RemovalQueue>()
            .init_resource::<EntityPool<Projectile>>()
            .init_resource::<EntityPool<Enemy>>()
            .init_resource::<EntityPool<Obstacle>>()
            .init_resource::<EntityPool<Collectible>>();

        app.add_systems(
            FixedLast,
            perform_removals.in_set(crate::physics::SimSet::Removal),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_is_idempotent() {
        let mut queue = RemovalQueue::default();
        let entity = Entity::from_raw(7);

        assert!(queue.mark(entity));
        assert!(!queue.mark(entity)); // Повторная пометка — no-op
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = RemovalQueue::default();
        queue.mark(Entity::from_raw(1));
        queue.mark(Entity::from_raw(2));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
        assert!(!queue.contains(Entity::from_raw(1)));
    }

    #[test]
    fn test_pool_reuses_released_slot() {
        let mut pool: EntityPool<Projectile> = EntityPool::default();
        let entity = Entity::from_raw(3);

        assert!(pool.acquire().is_none()); // Пул пуст
        pool.register(entity);
        assert!(pool.is_live(entity));

        assert!(pool.release(entity));
        assert!(!pool.is_live(entity));

        // Слот вернулся: acquire отдаёт ту же entity
        assert_eq!(pool.acquire(), Some(entity));
        assert!(pool.is_live(entity));
    }

    #[test]
    fn test_release_unknown_is_noop() {
        let mut pool: EntityPool<Projectile> = EntityPool::default();
        assert!(!pool.release(Entity::from_raw(9)));
    }

    #[test]
    fn test_recycle_all() {
        let mut pool: EntityPool<Enemy> = EntityPool::default();
        pool.register(Entity::from_raw(1));
        pool.register(Entity::from_raw(2));

        let recycled = pool.recycle_all();
        assert_eq!(recycled.len(), 2);
        assert_eq!(pool.live_count(), 0);

        // Оба слота доступны для reuse
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_none());
    }
}
