//! ASHRUN Simulation Core
//!
//! Headless ECS-симуляция аркадных режимов (exploration shooter /
//! endless runner) на Bevy 0.16 + Rapier. Renderer, окно, input-девайсы
//! и носитель рекордов — external collaborators: крейт шлёт VisualEvent'ы
//! и читает InputEvent'ы, больше ничего про host не знает.
//!
//! Тиковый пайплайн (fixed 60 Hz, порядок — инвариант):
//!   input fold → gameplay update → шаг Rapier → contact tracking →
//!   collision resolve → deferred removal → (host: render sync)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod assets;
pub mod components;
pub mod config;
pub mod input;
pub mod lifecycle;
pub mod logger;
pub mod phase;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod scoreboard;
pub mod spawner;
pub mod visual;

// Re-export базовых типов для удобства
pub use components::*;
pub use config::GameConfig;
pub use input::{Action, AimDirection, InputEvent, InputState};
pub use lifecycle::{Doomed, EntityPool, Pooled, RemovalQueue};
pub use phase::{GamePhase, MenuLatch};
pub use physics::{SimSet, SurfaceContacts};
pub use player::PlayerDied;
pub use projectile::{EnemyKilled, FireRequest};
pub use scoreboard::{HighScores, Score, ScoreStore};
pub use spawner::SpawnTimers;
pub use visual::{VisualEvent, VisualKind};

/// Частота fixed-тика симуляции
pub const TICK_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Host мог вставить свой конфиг до плагина
        if !app.world().contains_resource::<GameConfig>() {
            app.insert_resource(GameConfig::standard());
        }

        app.insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .insert_resource(DeterministicRng::new(42));

        app.add_plugins((
            visual::VisualPlugin,
            assets::AssetStorePlugin,
            input::InputPlugin,
            physics::PhysicsPlugin,
            lifecycle::LifecyclePlugin,
            phase::PhasePlugin,
            player::PlayerPlugin,
            ai::SteeringPlugin,
            projectile::ProjectilePlugin,
            spawner::SpawnerPlugin,
            scoreboard::ScoreboardPlugin::default(),
        ));
    }
}

/// Детерминистичный RNG resource (seeded, волновой spawn)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// MinimalPlugins не включает transform и state — добавляем руками
/// (Rapier пишет в Transform, phase FSM живёт на bevy_state).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins((
        MinimalPlugins,
        bevy::transform::TransformPlugin,
        bevy::state::app::StatesPlugin,
    ))
    .insert_resource(DeterministicRng::new(seed))
    .insert_resource(Time::<Fixed>::from_hz(TICK_HZ));

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Собирает компоненты в байты (Debug-формат), сортируя по Entity id.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_rng_reproducible() {
        use rand::Rng;

        let mut a = DeterministicRng::new(7);
        let mut b = DeterministicRng::new(7);

        let seq_a: Vec<u32> = (0..16).map(|_| a.rng.gen()).collect();
        let seq_b: Vec<u32> = (0..16).map(|_| b.rng.gen()).collect();
        assert_eq!(seq_a, seq_b);

        let mut c = DeterministicRng::new(8);
        let seq_c: Vec<u32> = (0..16).map(|_| c.rng.gen()).collect();
        assert_ne!(seq_a, seq_c);
    }
}
