//! Roll Arena - collision and sphere-physics core for a 3D ball game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (collision detection, response, battle physics)
//! - `tuning`: Data-driven physics and rule constants
//! - `settings`: Player-facing preferences (difficulty preset)

pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{Difficulty, Settings};
pub use tuning::{BattleTuning, CollisionTuning, Tuning, TuningError};

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the demo host loop (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta the core accepts; anything above is a no-op tick
    pub const MAX_FRAME_DT: f32 = 1.0;

    /// Avatar defaults
    pub const AVATAR_RADIUS: f32 = 0.5;
    pub const AVATAR_LIVES: u32 = 3;

    /// Level grid cell edge length (world units)
    pub const CELL_SIZE: f32 = 2.0;

    /// Score awards
    pub const COLLECTIBLE_POINTS: u32 = 10;
    pub const KEY_POINTS: u32 = 50;

    /// Battle defaults
    pub const BATTLE_BALL_RADIUS: f32 = 1.0;
    pub const BATTLE_ARENA_RADIUS: f32 = 15.0;
    pub const COUNTDOWN_SECONDS: u32 = 3;
}

/// Distance between two points projected onto the XZ plane
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar(a - b).length()
}

/// Drop the Y component of a world-space vector
#[inline]
pub fn planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Rebuild a world-space vector from an XZ pair and a height
#[inline]
pub fn from_planar(p: Vec2, y: f32) -> Vec3 {
    Vec3::new(p.x, y, p.y)
}

/// A delta time the core is willing to integrate.
///
/// Zero, negative, non-finite and over-long frames are rejected so a stalled
/// host (tab in background, debugger pause) cannot blow up the integration.
#[inline]
pub fn accepts_dt(dt: f32) -> bool {
    dt.is_finite() && dt > 0.0 && dt <= consts::MAX_FRAME_DT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 10.0, 0.0);
        let b = Vec3::new(3.0, -5.0, 4.0);
        assert!((planar_distance(a, b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_planar_round_trip_keeps_height() {
        let v = from_planar(planar(Vec3::new(1.0, 2.0, 3.0)), 7.0);
        assert_eq!(v, Vec3::new(1.0, 7.0, 3.0));
    }

    #[test]
    fn test_rejects_degenerate_dt() {
        assert!(accepts_dt(consts::SIM_DT));
        assert!(accepts_dt(1.0));
        assert!(!accepts_dt(0.0));
        assert!(!accepts_dt(-0.01));
        assert!(!accepts_dt(1.5));
        assert!(!accepts_dt(f32::NAN));
        assert!(!accepts_dt(f32::INFINITY));
    }
}
