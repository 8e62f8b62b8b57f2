//! Game session for the maze, normal and pacman modes
//!
//! The session owns the avatar, the loaded level and the collision system,
//! keeps the score, and turns collision events into the host-facing
//! `on_game_over` / `on_level_complete` signals.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::avatar::Avatar;
use super::events::GameEvent;
use super::frame::CollisionSystem;
use super::level::Level;
use crate::accepts_dt;
use crate::tuning::CollisionTuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    /// Exit reached; waiting for the host to load the next level
    LevelComplete,
    /// Out of lives; waiting for the host to restart
    GameOver,
}

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired rolling direction on the XZ plane, length ≤ 1
    pub move_dir: Vec2,
    /// Jump if resting on the floor
    pub jump: bool,
}

type Callback = Box<dyn FnMut(u32)>;

pub struct GameSession {
    avatar: Avatar,
    level: Level,
    system: CollisionSystem,
    tuning: CollisionTuning,
    score: u32,
    phase: SessionPhase,
    events: Vec<GameEvent>,
    on_game_over: Option<Callback>,
    on_level_complete: Option<Callback>,
}

impl GameSession {
    pub fn new(level: Level, lives: u32, tuning: CollisionTuning) -> Self {
        let avatar = Avatar::new(level.spawn, crate::consts::AVATAR_RADIUS, lives);
        Self {
            avatar,
            level,
            system: CollisionSystem::new(tuning.clone()),
            tuning,
            score: 0,
            phase: SessionPhase::Playing,
            events: Vec::new(),
            on_game_over: None,
            on_level_complete: None,
        }
    }

    /// Register the game-over signal; receives the final score
    pub fn on_game_over(&mut self, f: impl FnMut(u32) + 'static) {
        self.on_game_over = Some(Box::new(f));
    }

    /// Register the level-complete signal; receives the current score
    pub fn on_level_complete(&mut self, f: impl FnMut(u32) + 'static) {
        self.on_level_complete = Some(Box::new(f));
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    /// Take the events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one frame: move the avatar, then run the collision pass
    pub fn update(&mut self, dt: f32, input: &TickInput) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        if !accepts_dt(dt) {
            log::warn!("session update skipped: bad dt {dt}");
            return;
        }

        let floor_y = self.level.floor_y;
        if input.jump && self.avatar.on_floor(floor_y) {
            self.avatar.velocity.y = self.tuning.avatar_jump_speed;
        }
        let accel = input.move_dir.clamp_length_max(1.0) * self.tuning.avatar_accel;
        self.avatar
            .integrate(dt, accel, self.tuning.avatar_gravity, floor_y);

        let events = self.system.update(&mut self.avatar, &mut self.level, dt);
        for event in events {
            self.apply(&event);
            self.events.push(event);
        }
    }

    fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ScoreAwarded { points } => self.add_score(*points),
            GameEvent::GameOver if self.phase == SessionPhase::Playing => {
                self.phase = SessionPhase::GameOver;
                log::info!("game over with score {}", self.score);
                if let Some(cb) = self.on_game_over.as_mut() {
                    cb(self.score);
                }
            }
            GameEvent::LevelComplete if self.phase == SessionPhase::Playing => {
                self.phase = SessionPhase::LevelComplete;
                log::info!("level complete with score {}", self.score);
                if let Some(cb) = self.on_level_complete.as_mut() {
                    cb(self.score);
                }
            }
            _ => {}
        }
    }

    /// Explicit restart of the current level: flags, avatar and clock reset.
    /// Score and lives carry over unless the run ended in game over.
    pub fn restart_level(&mut self) {
        if self.phase == SessionPhase::GameOver {
            self.score = 0;
            self.avatar.reset_lives();
        }
        self.level.restart();
        self.avatar.spawn = self.level.spawn;
        self.avatar.respawn();
        self.system.reset();
        self.events.clear();
        self.phase = SessionPhase::Playing;
    }

    /// Swap in the next level, keeping score and lives
    pub fn load_level(&mut self, level: Level) {
        log::info!("loading {:?} level", level.mode);
        self.level = level;
        self.avatar.spawn = self.level.spawn;
        self.avatar.respawn();
        self.system.reset();
        self.phase = SessionPhase::Playing;
    }
}
