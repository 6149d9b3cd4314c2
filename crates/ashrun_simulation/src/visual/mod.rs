//! Контракт с renderer'ом (external collaborator)
//!
//! Симуляция не рисует. Renderer-host подписывается на VisualEvent и держит
//! свою сцену: Attached → создать node, Detached → убрать node,
//! Visibility → blink. Позиции/ориентации host копирует сам из Transform
//! (physics writeback) раз в кадр: visual.position ← body.position,
//! visual.rotation ← body.rotation.
//!
//! События шлются ТОЛЬКО из lifecycle-пасса и gameplay-систем — между
//! шагами физики, поэтому host может безопасно мутировать сцену прямо
//! в обработчике.

use bevy::prelude::*;

/// Какой визуал создавать для entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    Player,
    Enemy {
        /// Индекс в GameConfig.enemies (модель/материал по шаблону)
        archetype: usize,
    },
    Projectile,
    Obstacle,
    Collectible,
}

/// Событие симуляция → renderer
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum VisualEvent {
    Attached { entity: Entity, kind: VisualKind },
    Detached { entity: Entity },
    Visibility { entity: Entity, visible: bool },
}

pub struct VisualPlugin;

impl Plugin for VisualPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<VisualEvent>();
    }
}
