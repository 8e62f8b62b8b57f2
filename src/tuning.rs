//! Data-driven game balance
//!
//! Every physics and rule constant the simulation reads lives here so a
//! level pack or test can override it from JSON without touching code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

fn invalid(field: &'static str, reason: &'static str) -> TuningError {
    TuningError::Invalid { field, reason }
}

/// Constants used by the avatar collision system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Extra distance added to every blocking push-out
    pub separation_slop: f32,
    /// Velocity multiplier after hitting an obstacle or an elevated tile side
    pub obstacle_damping: f32,
    /// Velocity multiplier after hitting a maze wall or the level boundary
    pub wall_damping: f32,
    /// Obstacles shorter than this are climbable steps
    pub step_max_height: f32,
    /// Avatar bottom within this distance of a step top is supported
    pub step_support_tolerance: f32,
    /// Avatar bottom further than this below a step top is blocked
    pub step_block_depth: f32,
    /// Vertical tolerance for standing on an elevated tile
    pub tile_support_tolerance: f32,
    /// Edge length of an elevated tile footprint
    pub tile_size: f32,
    /// Half size of the collectible/key/exit trigger boxes
    pub pickup_half_extent: f32,
    /// Ghost contact radius and vertical band
    pub ghost_radius: f32,
    pub ghost_band: f32,
    /// Spike contact radius and vertical band
    pub spike_radius: f32,
    pub spike_band: f32,
    /// Bounce pad contact radius and vertical band
    pub pad_radius: f32,
    pub pad_band: f32,
    /// Hole trigger radius is `max(width, depth) * hole_radius_scale`
    pub hole_radius_scale: f32,
    pub hole_band: f32,
    /// Portal contact radius and vertical band
    pub portal_radius: f32,
    pub portal_band: f32,
    /// Global portal cooldown in milliseconds, shared by every portal
    pub portal_cooldown_ms: f64,
    /// Height above the floor at which teleported avatars are placed
    pub teleport_height: f32,
    /// Gravity applied to the avatar by the session (units/s²)
    pub avatar_gravity: f32,
    /// Planar acceleration at full stick deflection (units/s²)
    pub avatar_accel: f32,
    /// Upward speed given by a jump from the floor
    pub avatar_jump_speed: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            separation_slop: 0.1,
            obstacle_damping: 0.8,
            wall_damping: 0.5,
            step_max_height: 2.0,
            step_support_tolerance: 1.0,
            step_block_depth: 2.0,
            tile_support_tolerance: 3.0,
            tile_size: crate::consts::CELL_SIZE,
            pickup_half_extent: 0.5,
            ghost_radius: 0.8,
            ghost_band: 2.0,
            spike_radius: 0.6,
            spike_band: 1.0,
            pad_radius: 1.0,
            pad_band: 1.0,
            hole_radius_scale: 2.5,
            hole_band: 1.5,
            portal_radius: 1.0,
            portal_band: 2.0,
            portal_cooldown_ms: 1000.0,
            teleport_height: 1.0,
            avatar_gravity: -20.0,
            avatar_accel: 12.0,
            avatar_jump_speed: 8.0,
        }
    }
}

impl CollisionTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.separation_slop >= 0.0) {
            return Err(invalid("separation_slop", "must be >= 0"));
        }
        for (field, value) in [
            ("obstacle_damping", self.obstacle_damping),
            ("wall_damping", self.wall_damping),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must be within 0..=1"));
            }
        }
        for (field, value) in [
            ("step_max_height", self.step_max_height),
            ("tile_size", self.tile_size),
            ("pickup_half_extent", self.pickup_half_extent),
            ("ghost_radius", self.ghost_radius),
            ("spike_radius", self.spike_radius),
            ("pad_radius", self.pad_radius),
            ("hole_radius_scale", self.hole_radius_scale),
            ("portal_radius", self.portal_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be finite and > 0"));
            }
        }
        if self.step_block_depth < self.step_support_tolerance {
            return Err(invalid(
                "step_block_depth",
                "must be >= step_support_tolerance",
            ));
        }
        if !(self.portal_cooldown_ms >= 0.0) {
            return Err(invalid("portal_cooldown_ms", "must be >= 0"));
        }
        Ok(())
    }
}

/// Constants used by the battle-mode sphere simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleTuning {
    /// Vertical acceleration (units/s², negative is down)
    pub gravity: f32,
    /// Per-tick horizontal velocity multiplier
    pub friction: f32,
    /// Multiplier applied to the closing speed on ball contact
    pub bounce_force: f32,
    /// Inward velocity added when a ball drifts past the arena rim
    pub containment_impulse: f32,
    /// Balls below this height are eliminated
    pub fall_threshold: f32,
    /// Round length before a forced defeat (seconds)
    pub max_round_time: f32,
    /// Seconds between bot target refreshes
    pub bot_retarget_interval: f32,
    /// Bot seek acceleration at level 1
    pub bot_base_force: f32,
    /// Extra bot seek acceleration per level above 1
    pub bot_force_per_level: f32,
    /// Player input acceleration at full stick
    pub player_force: f32,
    pub arena_radius: f32,
    pub ball_radius: f32,
}

impl Default for BattleTuning {
    fn default() -> Self {
        use crate::consts::{BATTLE_ARENA_RADIUS, BATTLE_BALL_RADIUS};
        Self {
            gravity: -25.0,
            friction: 0.98,
            bounce_force: 15.0,
            containment_impulse: 2.0,
            fall_threshold: -10.0,
            max_round_time: 60.0,
            bot_retarget_interval: 0.5,
            bot_base_force: 8.0,
            bot_force_per_level: 2.0,
            player_force: 20.0,
            arena_radius: BATTLE_ARENA_RADIUS,
            ball_radius: BATTLE_BALL_RADIUS,
        }
    }
}

impl BattleTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.friction > 0.0 && self.friction <= 1.0) {
            return Err(invalid("friction", "must be within (0, 1]"));
        }
        if !(self.ball_radius > 0.0) {
            return Err(invalid("ball_radius", "must be > 0"));
        }
        if !(self.arena_radius > self.ball_radius) {
            return Err(invalid("arena_radius", "must exceed ball_radius"));
        }
        if !(self.max_round_time > 0.0) {
            return Err(invalid("max_round_time", "must be > 0"));
        }
        if !(self.bot_retarget_interval > 0.0) {
            return Err(invalid("bot_retarget_interval", "must be > 0"));
        }
        if !self.gravity.is_finite() || !self.bounce_force.is_finite() {
            return Err(invalid("gravity", "gravity and bounce_force must be finite"));
        }
        if self.fall_threshold >= 0.0 {
            return Err(invalid("fall_threshold", "must be below the arena floor"));
        }
        Ok(())
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub collision: CollisionTuning,
    pub battle: BattleTuning,
}

impl Tuning {
    /// Parse and validate tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        self.collision.validate()?;
        self.battle.validate()
    }
}
