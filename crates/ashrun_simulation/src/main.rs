//! Headless-прогон ASHRUN
//!
//! Smoke-run без рендера: проходит меню, крутит фиксированные тики,
//! печатает счёт. Время — manual (каждый update ровно один тик).

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use ashrun_simulation::phase::GamePhase;
use ashrun_simulation::{
    create_headless_app, Action, InputEvent, Score, SimulationPlugin, TICK_HZ,
};

fn main() {
    let seed = 42;
    println!("Starting ASHRUN headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / TICK_HZ,
    )));

    // Первый update инициализирует время и Startup-системы
    app.update();

    // Title → Controls → Playing: Confirm c key-up между нажатиями
    for _ in 0..3 {
        app.world_mut().send_event(InputEvent::Released(Action::Confirm));
        app.update();
        app.world_mut().send_event(InputEvent::Pressed(Action::Confirm));
        app.update();
    }
    let phase = *app.world().resource::<State<GamePhase>>().get();
    println!("Phase after menu walk: {:?}", phase);

    // 30 секунд симуляции: бежим вперёд и постреливаем
    app.world_mut().send_event(InputEvent::Pressed(Action::Forward));
    for tick in 0..1800 {
        if tick % 30 == 0 {
            app.world_mut().send_event(InputEvent::Pressed(Action::Fire));
        }
        app.update();

        if tick % 300 == 0 {
            let score = app.world().resource::<Score>();
            let entity_count = app.world().entities().len();
            println!(
                "Tick {}: {} pts, {} kills, {} entities",
                tick, score.points, score.kills, entity_count
            );
        }
    }

    let score = app.world().resource::<Score>();
    println!(
        "Simulation complete: {} pts, {} kills",
        score.points, score.kills
    );
}
