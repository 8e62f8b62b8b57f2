//! The player's rolling ball in maze and chase modes

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::geometry::{Aabb, Sphere};
use crate::consts::{AVATAR_LIVES, AVATAR_RADIUS};

/// Player avatar: a sphere with a velocity and a life counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    pub position: Vec3,
    pub velocity: Vec3,
    radius: f32,
    /// Where the avatar reappears after a hazard hit
    pub spawn: Vec3,
    lives: u32,
    max_lives: u32,
}

impl Avatar {
    pub fn new(spawn: Vec3, radius: f32, lives: u32) -> Self {
        debug_assert!(radius > 0.0, "avatar radius must be positive");
        Self {
            position: spawn,
            velocity: Vec3::ZERO,
            radius: radius.max(f32::EPSILON),
            spawn,
            lives,
            max_lives: lives,
        }
    }

    pub fn at_spawn(spawn: Vec3) -> Self {
        Self::new(spawn, AVATAR_RADIUS, AVATAR_LIVES)
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Height of the lowest point of the ball
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y - self.radius
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::around_sphere(self.position, self.radius)
    }

    pub fn sphere(&self) -> Sphere {
        Sphere::new(self.position, self.radius)
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Remove one life and return how many remain
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn is_out_of_lives(&self) -> bool {
        self.lives == 0
    }

    pub fn reset_lives(&mut self) {
        self.lives = self.max_lives;
    }

    /// Put the avatar back at its spawn point, at rest
    pub fn respawn(&mut self) {
        self.position = self.spawn;
        self.velocity = Vec3::ZERO;
    }

    /// Move to `target` and stop
    pub fn teleport(&mut self, target: Vec3) {
        self.position = target;
        self.velocity = Vec3::ZERO;
    }

    /// Whether the ball rests on the floor plane
    pub fn on_floor(&self, floor_y: f32) -> bool {
        self.bottom() <= floor_y + 1e-3
    }

    /// Semi-implicit Euler step: planar acceleration from input, gravity on
    /// Y, then a floor plane at `floor_y`.
    pub fn integrate(&mut self, dt: f32, accel: Vec2, gravity: f32, floor_y: f32) {
        self.velocity.x += accel.x * dt;
        self.velocity.z += accel.y * dt;
        self.velocity.y += gravity * dt;
        self.position += self.velocity * dt;

        let rest_y = floor_y + self.radius;
        if self.position.y < rest_y {
            self.position.y = rest_y;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
        }
    }
}
