//! Integration: entity lifecycle — пулы, deferred removal, снаряды
//!
//! Headless App с manual-временем: каждый app.update() ≈ один fixed-тик
//! (первый update только инициализирует часы), поэтому тики считаем с
//! запасом, а проверяем инварианты, не точные номера тиков.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;
use bevy_rapier3d::prelude::*;

use ashrun_simulation::phase::GamePhase;
use ashrun_simulation::physics::enemy_groups;
use ashrun_simulation::*;

fn create_game_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / TICK_HZ,
    )));
    app.update(); // Startup + инициализация времени
    app
}

fn enter_playing(app: &mut App) {
    app.world_mut()
        .resource_mut::<NextState<GamePhase>>()
        .set(GamePhase::Playing);
    // Переход применяется на следующем update (StateTransition)
    app.update();
    app.update();
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

/// Spawn врага напрямую в мир + регистрация в пуле (без волнового spawn'а)
fn spawn_test_enemy(app: &mut App, position: Vec3, health: u32) -> Entity {
    let entity = app
        .world_mut()
        .spawn((
            (
                Transform::from_translation(position),
                Enemy { archetype: 0 },
                Health::new(health),
                BodyOwner::Enemy,
                Pooled { active: true },
            ),
            (
                RigidBody::Dynamic,
                Collider::cuboid(0.4, 0.6, 0.4),
                Velocity::zero(),
                LockedAxes::ROTATION_LOCKED,
                enemy_groups(),
            ),
        ))
        .id();
    app.world_mut()
        .resource_mut::<EntityPool<Enemy>>()
        .register(entity);
    entity
}

#[test]
fn test_projectile_expires_by_lifetime() {
    let mut app = create_game_app(1);
    enter_playing(&mut app);
    // Изолируем lifetime-ветку: дальность не должна сработать раньше
    app.world_mut()
        .resource_mut::<GameConfig>()
        .projectile
        .max_range = 1000.0;

    // Вверх: не встретит ни стен, ни врагов — умрёт только по lifetime
    app.world_mut().send_event(FireRequest {
        origin: Vec3::new(0.0, 5.0, 0.0),
        direction: Vec3::Y,
    });
    run_ticks(&mut app, 3);

    assert_eq!(
        app.world().resource::<EntityPool<Projectile>>().live_count(),
        1,
        "projectile must be live after spawn"
    );
    let projectile = app.world().resource::<EntityPool<Projectile>>().live()[0];

    // lifetime = 3.0s при 60 Hz = 180 тиков; запас на инициализацию часов
    let lifetime = app.world().resource::<GameConfig>().projectile.lifetime;
    run_ticks(&mut app, (lifetime * TICK_HZ as f32) as usize + 30);

    assert_eq!(
        app.world().resource::<EntityPool<Projectile>>().live_count(),
        0,
        "projectile must expire within lifetime + epsilon"
    );
    assert!(app.world().resource::<RemovalQueue>().is_empty());
    // Detach: физические компоненты сняты, слот неактивен
    assert!(app.world().get::<Collider>(projectile).is_none());
    assert!(app.world().get::<RigidBody>(projectile).is_none());
    assert!(!app.world().get::<Pooled>(projectile).unwrap().active);
}

#[test]
fn test_pool_reuses_projectile_entity() {
    let mut app = create_game_app(2);
    enter_playing(&mut app);

    app.world_mut().send_event(FireRequest {
        origin: Vec3::new(0.0, 5.0, 0.0),
        direction: Vec3::Y,
    });
    run_ticks(&mut app, 3);
    let first = app.world().resource::<EntityPool<Projectile>>().live()[0];

    let lifetime = app.world().resource::<GameConfig>().projectile.lifetime;
    run_ticks(&mut app, (lifetime * TICK_HZ as f32) as usize + 30);
    assert_eq!(
        app.world().resource::<EntityPool<Projectile>>().live_count(),
        0
    );

    // Второй выстрел переиспользует тот же слот (Entity id)
    app.world_mut().send_event(FireRequest {
        origin: Vec3::new(0.0, 5.0, 0.0),
        direction: Vec3::Y,
    });
    run_ticks(&mut app, 3);

    let pool = app.world().resource::<EntityPool<Projectile>>();
    assert_eq!(pool.live_count(), 1);
    assert_eq!(pool.live()[0], first);
    assert!(app.world().get::<Pooled>(first).unwrap().active);
    assert!(app.world().get::<Collider>(first).is_some());
}

#[test]
fn test_single_score_per_kill_on_duplicate_hits() {
    let mut app = create_game_app(3);
    enter_playing(&mut app);

    let enemy = spawn_test_enemy(&mut app, Vec3::new(0.0, 0.6, -8.0), 5);

    // Два снаряда в воздух (никуда не попадут сами)
    for _ in 0..2 {
        app.world_mut().send_event(FireRequest {
            origin: Vec3::new(0.0, 5.0, 0.0),
            direction: Vec3::Y,
        });
        app.update();
    }
    run_ticks(&mut app, 2);
    let projectiles: Vec<Entity> = app
        .world()
        .resource::<EntityPool<Projectile>>()
        .live()
        .to_vec();
    assert_eq!(projectiles.len(), 2);

    // Оба "попадания" в одном тике: здоровье 5, урон 10 → смерть от
    // первого; второе должно быть проигнорировано (враг уже помечен)
    app.world_mut()
        .send_event(CollisionEvent::Started(projectiles[0], enemy, CollisionEventFlags::empty()));
    app.world_mut()
        .send_event(CollisionEvent::Started(projectiles[1], enemy, CollisionEventFlags::empty()));
    run_ticks(&mut app, 3);

    let score = app.world().resource::<Score>();
    let expected = app.world().resource::<GameConfig>().enemies[0].score_value;
    assert_eq!(score.points, expected, "score must be awarded exactly once");
    assert_eq!(score.kills, 1);

    // Враг убран, оба снаряда израсходованы
    assert!(!app.world().resource::<EntityPool<Enemy>>().is_live(enemy));
    assert_eq!(
        app.world().resource::<EntityPool<Projectile>>().live_count(),
        0
    );
}

#[test]
fn test_removal_is_atomic_and_idempotent() {
    let mut app = create_game_app(4);
    enter_playing(&mut app);

    let enemy = spawn_test_enemy(&mut app, Vec3::new(5.0, 0.6, 5.0), 20);
    assert!(app.world().resource::<EntityPool<Enemy>>().is_live(enemy));

    // Двойная пометка — тот же эффект, что одиночная
    {
        let mut queue = app.world_mut().resource_mut::<RemovalQueue>();
        assert!(queue.mark(enemy));
        assert!(!queue.mark(enemy));
        assert_eq!(queue.len(), 1);
    }
    run_ticks(&mut app, 2);

    assert!(app.world().resource::<RemovalQueue>().is_empty());
    assert!(!app.world().resource::<EntityPool<Enemy>>().is_live(enemy));
    assert!(app.world().get::<Collider>(enemy).is_none());
    assert!(!app.world().get::<Pooled>(enemy).unwrap().active);

    // Пометка уже убранной entity — silent no-op
    {
        let mut queue = app.world_mut().resource_mut::<RemovalQueue>();
        queue.mark(enemy);
    }
    run_ticks(&mut app, 2);
    assert!(app.world().resource::<RemovalQueue>().is_empty());
    assert!(!app.world().resource::<EntityPool<Enemy>>().is_live(enemy));
}

#[test]
fn test_projectile_consumed_on_static_hit() {
    let mut app = create_game_app(5);
    enter_playing(&mut app);

    // Горизонтально в стену: static hit раньше lifetime
    app.world_mut().send_event(FireRequest {
        origin: Vec3::new(0.0, 1.0, 0.0),
        direction: Vec3::NEG_Z,
    });
    run_ticks(&mut app, 3);
    assert_eq!(
        app.world().resource::<EntityPool<Projectile>>().live_count(),
        1
    );

    // Стена на z = -25.5, скорость 30 m/s → меньше секунды полёта
    run_ticks(&mut app, 90);
    assert_eq!(
        app.world().resource::<EntityPool<Projectile>>().live_count(),
        0,
        "projectile must be consumed on wall hit"
    );
}

#[test]
fn test_pools_deactivated_on_round_restart() {
    let mut app = create_game_app(6);
    enter_playing(&mut app);

    let enemy = spawn_test_enemy(&mut app, Vec3::new(5.0, 0.6, 5.0), 20);
    app.world_mut().send_event(FireRequest {
        origin: Vec3::new(0.0, 5.0, 0.0),
        direction: Vec3::Y,
    });
    run_ticks(&mut app, 3);

    // Рестарт раунда: повторный вход в Playing
    app.world_mut()
        .resource_mut::<NextState<GamePhase>>()
        .set(GamePhase::Title);
    run_ticks(&mut app, 2);
    enter_playing(&mut app);

    assert_eq!(app.world().resource::<EntityPool<Enemy>>().live_count(), 0);
    assert_eq!(
        app.world().resource::<EntityPool<Projectile>>().live_count(),
        0
    );
    assert!(!app.world().get::<Pooled>(enemy).unwrap().active);
    assert!(app.world().get::<Collider>(enemy).is_none());
    assert_eq!(app.world().resource::<Score>().points, 0);
}
