//! Input-слой (consumed interface)
//!
//! Host (окно, тесты, headless runner) шлёт дискретные key-down/key-up
//! события как InputEvent; симуляция раз в тик сворачивает их в
//! InputState: held-оси + одно-тиковые edge-флаги. Сами клавиши и их
//! маппинг — ответственность host'а.

use bevy::prelude::*;

use crate::physics::SimSet;

/// Игровое действие (уже замапленное host'ом)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Jump,
    /// Secondary: slide
    Slide,
    Fire,
    /// Подтверждение в меню / pause
    Confirm,
    Forward,
    Back,
    Left,
    Right,
}

/// Событие host → симуляция
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pressed(Action),
    Released(Action),
    /// Аналоговый стик: перекрывает цифровую ось пока != ZERO
    Axis(Vec2),
}

/// Направление прицеливания (host пишет из камеры каждый кадр)
#[derive(Resource, Debug, Clone, Copy)]
pub struct AimDirection(pub Vec3);

impl Default for AimDirection {
    fn default() -> Self {
        Self(Vec3::NEG_Z)
    }
}

/// Свёрнутое состояние input'а на текущий тик
///
/// *_pressed / confirm_released — edge-флаги, живут один тик.
#[derive(Resource, Debug, Default)]
pub struct InputState {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    analog: Vec2,

    /// Движенческая ось (x: право+, y: вперёд+), длина ≤ 1
    pub move_axis: Vec2,
    pub jump_pressed: bool,
    pub slide_pressed: bool,
    pub fire_pressed: bool,
    pub confirm_pressed: bool,
    pub confirm_released: bool,
}

impl InputState {
    /// Начало тика: edge-флаги сбрасываются, held-состояние остаётся
    pub fn begin_tick(&mut self) {
        self.jump_pressed = false;
        self.slide_pressed = false;
        self.fire_pressed = false;
        self.confirm_pressed = false;
        self.confirm_released = false;
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Pressed(action) => self.press(action),
            InputEvent::Released(action) => self.release(action),
            InputEvent::Axis(axis) => self.analog = axis,
        }
    }

    fn press(&mut self, action: Action) {
        match action {
            Action::Jump => self.jump_pressed = true,
            Action::Slide => self.slide_pressed = true,
            Action::Fire => self.fire_pressed = true,
            Action::Confirm => self.confirm_pressed = true,
            Action::Forward => self.forward = true,
            Action::Back => self.back = true,
            Action::Left => self.left = true,
            Action::Right => self.right = true,
        }
    }

    fn release(&mut self, action: Action) {
        match action {
            Action::Confirm => self.confirm_released = true,
            Action::Forward => self.forward = false,
            Action::Back => self.back = false,
            Action::Left => self.left = false,
            Action::Right => self.right = false,
            // Jump/Slide/Fire — чистые edge-действия, release не трекаем
            _ => {}
        }
    }

    /// Пересчёт оси из held-состояния (аналог приоритетнее цифры)
    pub fn refresh_axis(&mut self) {
        if self.analog.length_squared() > 0.0 {
            self.move_axis = self.analog.clamp_length_max(1.0);
            return;
        }

        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.forward as i8 - self.back as i8) as f32;
        let axis = Vec2::new(x, y);
        self.move_axis = if axis.length_squared() > 1.0 {
            axis.normalize()
        } else {
            axis
        };
    }

    pub fn any_movement(&self) -> bool {
        self.move_axis.length_squared() > 0.0001
    }
}

/// Система: свёртка событий тика в InputState
pub fn collect_input(mut events: EventReader<InputEvent>, mut input: ResMut<InputState>) {
    input.begin_tick();
    for event in events.read() {
        input.apply(event);
    }
    input.refresh_axis();
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<InputEvent>()
            .init_resource::<InputState>()
            .init_resource::<AimDirection>();

        app.add_systems(FixedUpdate, collect_input.in_set(SimSet::Input));
    }
}
