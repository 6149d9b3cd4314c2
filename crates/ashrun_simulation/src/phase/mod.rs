//! Game phase FSM: Title → Controls → Playing → GameOver → Title
//!
//! Переходы edge-triggered: latch армится ТОЛЬКО key-up'ом Confirm, так
//! что зажатая клавиша не проскакивает несколько фаз за раз (и первый
//! key-down после запуска игнорируется до первого key-up).
//!
//! Гейтинг: SimSet::Update и SimSet::Resolve бегут только в Playing.
//! Render-сторона (host) продолжает тянуть Transform'ы в любой фазе —
//! финальный кадр GameOver остаётся на экране.

use bevy::prelude::*;

use crate::components::{Collectible, Enemy, Obstacle, Projectile};
use crate::config::GameConfig;
use crate::lifecycle::{deactivate_pool, EntityPool, Pooled, RemovalQueue};
use crate::logger;
use crate::physics::{SimSet, SurfaceContacts};
use crate::player::PlayerDied;
use crate::scoreboard::{HighScoreTable, Score};
use crate::spawner::SpawnTimers;
use crate::visual::VisualEvent;

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GamePhase {
    #[default]
    Title,
    Controls,
    Playing,
    GameOver,
}

/// Edge-latch меню: армится key-up'ом Confirm, гасится переходом
#[derive(Resource, Debug, Default)]
pub struct MenuLatch {
    pub armed: bool,
}

/// Следующая фаза по Confirm (None — Confirm в этой фазе не переключает)
pub(crate) fn next_phase(phase: GamePhase) -> Option<GamePhase> {
    match phase {
        GamePhase::Title => Some(GamePhase::Controls),
        GamePhase::Controls => Some(GamePhase::Playing),
        GamePhase::Playing => None,
        GamePhase::GameOver => Some(GamePhase::Title),
    }
}

/// Система: phase-переходы по Confirm через latch
pub fn menu_transitions(
    input: Res<crate::input::InputState>,
    mut latch: ResMut<MenuLatch>,
    phase: Res<State<GamePhase>>,
    mut next: ResMut<NextState<GamePhase>>,
) {
    if input.confirm_released {
        latch.armed = true;
    }
    if !input.confirm_pressed || !latch.armed {
        return;
    }

    if let Some(target) = next_phase(*phase.get()) {
        latch.armed = false;
        next.set(target);
        logger::log_info(&format!("Phase: {:?} → {:?}", phase.get(), target));
    }
}

/// Система: терминальное условие — жизни кончились
pub fn check_terminal(
    mut died: EventReader<PlayerDied>,
    mut next: ResMut<NextState<GamePhase>>,
) {
    if died.read().next().is_some() {
        next.set(GamePhase::GameOver);
        logger::log_info("Game over: out of lives");
    }
}

/// OnEnter(Playing): счёт, таймеры, контактный счётчик, очередь
pub fn reset_round_state(
    mut score: ResMut<Score>,
    mut timers: ResMut<SpawnTimers>,
    mut contacts: ResMut<SurfaceContacts>,
    mut queue: ResMut<RemovalQueue>,
    config: Res<GameConfig>,
) {
    score.reset();
    *timers = SpawnTimers::from_config(&config.spawn);
    // Рестарт мира теряет end-contact'ы — счётчик в ноль принудительно
    contacts.reset();
    queue.clear();
}

/// OnEnter(Playing): все pooled entity → inactive
///
/// StateTransition идёт между тиками, шаг физики не исполняется —
/// немедленный detach здесь безопасен.
pub fn reset_pools(
    mut commands: Commands,
    mut visuals: EventWriter<VisualEvent>,
    mut pooled: Query<&mut Pooled>,
    mut projectiles: ResMut<EntityPool<Projectile>>,
    mut enemies: ResMut<EntityPool<Enemy>>,
    mut obstacles: ResMut<EntityPool<Obstacle>>,
    mut collectibles: ResMut<EntityPool<Collectible>>,
) {
    deactivate_pool(&mut projectiles, &mut commands, &mut pooled, &mut visuals);
    deactivate_pool(&mut enemies, &mut commands, &mut pooled, &mut visuals);
    deactivate_pool(&mut obstacles, &mut commands, &mut pooled, &mut visuals);
    deactivate_pool(&mut collectibles, &mut commands, &mut pooled, &mut visuals);
}

/// OnEnter(GameOver): счёт раунда → таблица рекордов (+persist)
pub fn submit_high_score(score: Res<Score>, mut table: ResMut<HighScoreTable>) {
    logger::log_info(&format!(
        "Round over: {} pts, {} kills",
        score.points, score.kills
    ));
    table.submit_and_save(score.points);
}

pub struct PhasePlugin;

impl Plugin for PhasePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GamePhase>().init_resource::<MenuLatch>();

        // Gameplay бежит только в Playing; Input/Contacts/Removal — всегда
        app.configure_sets(
            FixedUpdate,
            SimSet::Update.run_if(in_state(GamePhase::Playing)),
        );
        app.configure_sets(
            FixedLast,
            SimSet::Resolve.run_if(in_state(GamePhase::Playing)),
        );

        app.add_systems(
            FixedUpdate,
            menu_transitions
                .in_set(SimSet::Input)
                .after(crate::input::collect_input),
        );
        app.add_systems(
            FixedLast,
            check_terminal
                .in_set(SimSet::Resolve)
                .after(crate::player::resolve_player_contacts),
        );

        app.add_systems(
            OnEnter(GamePhase::Playing),
            (reset_round_state, reset_pools, crate::player::reset_player).chain(),
        );
        app.add_systems(OnEnter(GamePhase::GameOver), submit_high_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle() {
        assert_eq!(next_phase(GamePhase::Title), Some(GamePhase::Controls));
        assert_eq!(next_phase(GamePhase::Controls), Some(GamePhase::Playing));
        assert_eq!(next_phase(GamePhase::Playing), None);
        assert_eq!(next_phase(GamePhase::GameOver), Some(GamePhase::Title));
    }

    #[test]
    fn test_latch_starts_disarmed() {
        // Первый key-down без предшествующего key-up не переключает фазу
        let latch = MenuLatch::default();
        assert!(!latch.armed);
    }
}
