//! Gameplay events raised by the simulation
//!
//! The core never calls into audio, HUD or persistence; it queues events
//! and the host drains them after each frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::level::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreAwarded { points: u32 },
    ItemCollected { id: EntityId },
    KeyCollected { id: EntityId },
    LevelComplete,
    /// Ghost or spike contact; `damage` is the hazard's nominal damage
    LifeLost { remaining: u32, damage: u32 },
    GameOver,
    Bounced { id: EntityId },
    FellIntoHole { id: EntityId },
    Teleported { id: EntityId, to: Vec3 },

    // Battle mode
    Countdown { remaining: u32 },
    BattleStarted,
    BallEliminated { index: usize, player: bool },
    Victory,
    Defeat { timed_out: bool },
}
