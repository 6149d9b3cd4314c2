//! Компоненты игрока
//!
//! Состояние игрока — два явных state-machine тега вместо набора bool'ов:
//! - MoveState: Grounded | Airborne (derived из contact tracker'а)
//! - Pose: Normal | Sliding (time-boxed hitbox override)
//! Нелегальные комбинации ("slide в воздухе") непредставимы — slide
//! стартует только из (Grounded, Normal).

use bevy::prelude::*;

/// Маркер игрока (ровно один, persistent, не pooled)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Счётчик жизней
#[derive(Component, Debug, Clone, Copy)]
pub struct Lives {
    pub remaining: u32,
}

impl Lives {
    pub fn new(remaining: u32) -> Self {
        Self { remaining }
    }

    pub fn is_dead(&self) -> bool {
        self.remaining == 0
    }
}

/// Движенческое состояние (авторитетный источник — SurfaceContacts,
/// пересчитывается каждый тик; прыжок переключает в Airborne оптимистично)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveState {
    #[default]
    Airborne,
    Grounded,
}

/// Поза игрока
///
/// Sliding — time-boxed override: hitbox укорочен, база заякорена,
/// по истечению таймера размеры и позиция восстанавливаются.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Pose {
    Normal,
    Sliding {
        /// Оставшееся время slide'а (секунды)
        remaining: f32,
    },
}

impl Default for Pose {
    fn default() -> Self {
        Self::Normal
    }
}

impl Pose {
    pub fn is_sliding(&self) -> bool {
        matches!(self, Pose::Sliding { .. })
    }
}

/// Параллельный invincibility-таймер после полученного урона
///
/// Пока компонент присутствует — урон no-op; blink-флаг переключается
/// с фиксированной частотой и уходит host'у как VisualEvent::Visibility.
#[derive(Component, Debug, Clone, Copy)]
pub struct Invincible {
    /// Оставшееся время (секунды)
    pub remaining: f32,
    /// Аккумулятор до следующего переключения видимости
    pub blink_timer: f32,
    /// Текущая видимость (blink)
    pub visible: bool,
}

impl Invincible {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration,
            blink_timer: 0.0,
            visible: true,
        }
    }
}

/// Cooldown стрельбы игрока
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct FireControl {
    /// Секунды до следующего разрешённого выстрела
    pub cooldown_left: f32,
}

impl FireControl {
    pub fn can_fire(&self) -> bool {
        self.cooldown_left <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_default() {
        assert_eq!(Pose::default(), Pose::Normal);
        assert!(!Pose::default().is_sliding());
        assert!(Pose::Sliding { remaining: 0.5 }.is_sliding());
    }

    #[test]
    fn test_lives() {
        let mut lives = Lives::new(2);
        assert!(!lives.is_dead());

        lives.remaining -= 1;
        lives.remaining -= 1;
        assert!(lives.is_dead());
    }

    #[test]
    fn test_fire_control() {
        let mut fire = FireControl::default();
        assert!(fire.can_fire());

        fire.cooldown_left = 0.25;
        assert!(!fire.can_fire());
    }
}
