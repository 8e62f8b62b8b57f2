//! Collision response: turns contacts into corrections and game events
//!
//! Blocking contacts move the avatar and damp its velocity. Trigger contacts
//! go through the level's mutation hooks so collect/activate stay
//! idempotent. Every handler mutates the avatar in place; the caller runs
//! them one at a time so the next check sees the corrected state.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::avatar::Avatar;
use super::collision::{Contact, ContactKind, ContactTarget};
use super::events::GameEvent;
use super::level::{BouncePadKind, EntityId, GridCell, Level, LevelEntity};
use crate::consts::{COLLECTIBLE_POINTS, KEY_POINTS};
use crate::tuning::CollisionTuning;

/// Global portal cooldown shared by every portal in a level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalCooldown {
    last_trigger_ms: Option<f64>,
}

impl PortalCooldown {
    pub fn ready(&self, now_ms: f64, cooldown_ms: f64) -> bool {
        self.last_trigger_ms
            .is_none_or(|last| now_ms - last >= cooldown_ms)
    }

    pub fn trigger(&mut self, now_ms: f64) {
        self.last_trigger_ms = Some(now_ms);
    }

    pub fn reset(&mut self) {
        self.last_trigger_ms = None;
    }
}

/// Mutable per-frame state the resolver writes into
pub struct FrameContext<'a> {
    /// Collision clock in milliseconds
    pub now_ms: f64,
    pub portal_cooldown: &'a mut PortalCooldown,
    pub events: &'a mut Vec<GameEvent>,
}

/// Applies the game-rule response for each contact
#[derive(Debug, Clone, Default)]
pub struct ResponseResolver {
    tuning: CollisionTuning,
}

impl ResponseResolver {
    pub fn new(tuning: CollisionTuning) -> Self {
        Self { tuning }
    }

    pub fn resolve(
        &self,
        contact: &Contact,
        avatar: &mut Avatar,
        level: &mut Level,
        ctx: &mut FrameContext<'_>,
    ) {
        let id = match contact.target {
            ContactTarget::WorldBounds => {
                self.clamp_to_bounds(avatar, level);
                return;
            }
            ContactTarget::Entity(id) => id,
        };
        let Some(entity) = level.entity(id).cloned() else {
            return;
        };

        match entity {
            LevelEntity::Obstacle { .. }
            | LevelEntity::Wall { .. }
            | LevelEntity::ElevatedTile { .. } => self.apply_solid(contact, avatar),
            LevelEntity::Collectible { .. } => {
                if level.collect_item(id) {
                    log::debug!("collected item {id}");
                    ctx.events.push(GameEvent::ItemCollected { id });
                    ctx.events.push(GameEvent::ScoreAwarded {
                        points: COLLECTIBLE_POINTS,
                    });
                }
            }
            LevelEntity::Key { .. } => {
                if level.collect_key(id) {
                    log::debug!("collected key {id}");
                    ctx.events.push(GameEvent::KeyCollected { id });
                    ctx.events.push(GameEvent::ScoreAwarded { points: KEY_POINTS });
                }
            }
            LevelEntity::Exit { .. } => {
                if level.activate_exit(id) {
                    log::info!("exit {id} activated, level complete");
                    ctx.events.push(GameEvent::LevelComplete);
                }
            }
            LevelEntity::Ghost { .. } => self.hit_hazard(avatar, 1, ctx),
            LevelEntity::Spike { damage, .. } => self.hit_hazard(avatar, damage, ctx),
            LevelEntity::BouncePad {
                kind,
                force,
                direction,
                ..
            } => {
                apply_bounce(avatar, kind, force, direction);
                ctx.events.push(GameEvent::Bounced { id });
            }
            LevelEntity::Hole { destination, .. } => {
                log::debug!("avatar fell into hole {id}");
                avatar.teleport(destination);
                ctx.events.push(GameEvent::FellIntoHole { id });
            }
            LevelEntity::Portal { destination, .. } => {
                self.enter_portal(id, destination, avatar, level, ctx);
            }
        }
    }

    /// Blocking and supporting responses for solid geometry
    fn apply_solid(&self, contact: &Contact, avatar: &mut Avatar) {
        match contact.kind {
            ContactKind::Support { surface_y } => {
                avatar.position.y = surface_y + avatar.radius();
                if avatar.velocity.y < 0.0 {
                    avatar.velocity.y = 0.0;
                }
            }
            ContactKind::Block { damping } => {
                let depth = contact.overlap.length();
                let Some(dir) = contact.overlap.try_normalize() else {
                    return;
                };
                let mut push = dir * (depth + self.tuning.separation_slop);
                // Never launch the avatar upward
                push.y = push.y.min(avatar.radius() * 0.5);
                avatar.position += push;
                avatar.velocity *= damping;
            }
            ContactKind::Touch => {}
        }
    }

    fn clamp_to_bounds(&self, avatar: &mut Avatar, level: &Level) {
        let limit = (level.half_extent - avatar.radius()).max(0.0);
        let damping = self.tuning.wall_damping;
        if avatar.position.x.abs() > limit {
            avatar.position.x = avatar.position.x.clamp(-limit, limit);
            avatar.velocity.x *= damping;
        }
        if avatar.position.z.abs() > limit {
            avatar.position.z = avatar.position.z.clamp(-limit, limit);
            avatar.velocity.z *= damping;
        }
    }

    fn hit_hazard(&self, avatar: &mut Avatar, damage: u32, ctx: &mut FrameContext<'_>) {
        let remaining = avatar.lose_life();
        avatar.respawn();
        log::debug!("hazard hit, {remaining} lives left");
        ctx.events.push(GameEvent::LifeLost { remaining, damage });
        if avatar.is_out_of_lives() {
            log::info!("out of lives, game over");
            ctx.events.push(GameEvent::GameOver);
            avatar.reset_lives();
        }
    }

    fn enter_portal(
        &self,
        id: EntityId,
        destination: GridCell,
        avatar: &mut Avatar,
        level: &mut Level,
        ctx: &mut FrameContext<'_>,
    ) {
        if !ctx
            .portal_cooldown
            .ready(ctx.now_ms, self.tuning.portal_cooldown_ms)
        {
            return;
        }
        let target = level.grid_to_world(destination, level.floor_y + self.tuning.teleport_height);
        avatar.teleport(target);
        ctx.portal_cooldown.trigger(ctx.now_ms);
        if let Some(LevelEntity::Portal {
            last_trigger_time, ..
        }) = level.entity_mut(id)
        {
            *last_trigger_time = Some(ctx.now_ms);
        }
        log::debug!("portal {id} -> ({:.1}, {:.1})", target.x, target.z);
        ctx.events.push(GameEvent::Teleported { id, to: target });
    }
}

/// Pads are never consumed; every qualifying overlap re-applies the force
fn apply_bounce(avatar: &mut Avatar, kind: BouncePadKind, force: f32, direction: Vec3) {
    match kind {
        BouncePadKind::Vertical => avatar.velocity.y = force,
        BouncePadKind::Horizontal => {
            let Some(dir) = direction.try_normalize() else {
                return;
            };
            let along = avatar.velocity.dot(dir);
            avatar.velocity += dir * (force - along);
        }
    }
}
