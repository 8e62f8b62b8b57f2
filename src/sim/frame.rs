//! Per-frame collision pass for maze, normal and pacman modes
//!
//! Detection and response are interleaved entity by entity, in the fixed
//! category order. The avatar is threaded through as one mutable handle, so
//! a wall push or hazard respawn is already visible to every later check in
//! the same frame.

use super::avatar::Avatar;
use super::collision::CollisionDetector;
use super::events::GameEvent;
use super::level::{CATEGORY_ORDER, Category, Level};
use super::response::{FrameContext, PortalCooldown, ResponseResolver};
use crate::accepts_dt;
use crate::tuning::CollisionTuning;

/// Detector + resolver pair with the frame clock and portal cooldown
#[derive(Debug, Clone, Default)]
pub struct CollisionSystem {
    detector: CollisionDetector,
    resolver: ResponseResolver,
    /// Milliseconds of accepted frame time since the level started
    clock_ms: f64,
    portal_cooldown: PortalCooldown,
}

impl CollisionSystem {
    pub fn new(tuning: CollisionTuning) -> Self {
        Self {
            detector: CollisionDetector::new(tuning.clone()),
            resolver: ResponseResolver::new(tuning),
            clock_ms: 0.0,
            portal_cooldown: PortalCooldown::default(),
        }
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Clear the clock and cooldown (level load or restart)
    pub fn reset(&mut self) {
        self.clock_ms = 0.0;
        self.portal_cooldown.reset();
    }

    /// Run one collision frame. Returns the events it raised.
    pub fn update(&mut self, avatar: &mut Avatar, level: &mut Level, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !accepts_dt(dt) {
            log::warn!("collision update skipped: bad dt {dt}");
            return events;
        }
        self.clock_ms += f64::from(dt) * 1000.0;
        let now_ms = self.clock_ms;
        let cooldown_ms = self.detector.tuning().portal_cooldown_ms;

        for category in CATEGORY_ORDER {
            if !level.category_active(category) {
                continue;
            }

            if category == Category::WorldBounds {
                if let Some(contact) = self.detector.check_bounds(avatar, level) {
                    let mut ctx = FrameContext {
                        now_ms,
                        portal_cooldown: &mut self.portal_cooldown,
                        events: &mut events,
                    };
                    self.resolver.resolve(&contact, avatar, level, &mut ctx);
                }
                continue;
            }

            for id in level.ids_in(category) {
                let portal_ready = self.portal_cooldown.ready(now_ms, cooldown_ms);
                let Some(contact) = self.detector.check_entity(avatar, level, id, portal_ready) else {
                    continue;
                };
                let mut ctx = FrameContext {
                    now_ms,
                    portal_cooldown: &mut self.portal_cooldown,
                    events: &mut events,
                };
                self.resolver.resolve(&contact, avatar, level, &mut ctx);
            }
        }

        events
    }
}
