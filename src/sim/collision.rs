//! Collision detection between the avatar and static level geometry
//!
//! Detection is pure: it reads the avatar and the catalog and reports
//! contacts. What a contact *does* is decided by `ResponseResolver`.
//!
//! Solid geometry (obstacles, walls, elevated tiles) and pickups (collectibles,
//! key, exit) are tested box against box. Round things on the floor (ghosts,
//! spikes, bounce pads, holes, portals) are tested by XZ distance to their
//! center plus a vertical band, so a ball rolling over them counts but one
//! flying high above does not.

use glam::Vec3;

use super::avatar::Avatar;
use super::geometry::{Aabb, Axes};
use super::level::{CATEGORY_ORDER, Category, EntityId, Level, LevelEntity};
use crate::planar_distance;
use crate::tuning::CollisionTuning;

/// What a contact was made with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactTarget {
    Entity(EntityId),
    WorldBounds,
}

/// How a contact should be answered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactKind {
    /// Push the avatar out and damp its velocity by `damping`
    Block { damping: f32 },
    /// Stand the avatar on a surface whose top is at `surface_y`
    Support { surface_y: f32 },
    /// Non-blocking overlap (pickups, hazards, pads, holes, portals)
    Touch,
}

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub target: ContactTarget,
    pub kind: ContactKind,
    /// Penetration vector: displacement that moves the avatar out of the
    /// target along the axis of least separation (planar offset from the
    /// target's center for round triggers)
    pub overlap: Vec3,
}

impl Contact {
    fn entity(id: EntityId, kind: ContactKind, overlap: Vec3) -> Self {
        Self {
            target: ContactTarget::Entity(id),
            kind,
            overlap,
        }
    }
}

/// Scans an avatar against a level catalog
#[derive(Debug, Clone, Default)]
pub struct CollisionDetector {
    tuning: CollisionTuning,
}

impl CollisionDetector {
    pub fn new(tuning: CollisionTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &CollisionTuning {
        &self.tuning
    }

    /// Every contact of the current avatar state, in processing order.
    ///
    /// This is a snapshot: no contact is resolved, so later entries do not
    /// see corrections from earlier ones. The frame loop in `CollisionSystem`
    /// interleaves detection and response instead.
    pub fn check_all(&self, avatar: &Avatar, level: &Level, portal_ready: bool) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for category in CATEGORY_ORDER {
            if !level.category_active(category) {
                continue;
            }
            if category == Category::WorldBounds {
                contacts.extend(self.check_bounds(avatar, level));
                continue;
            }
            for id in level.ids_in(category) {
                contacts.extend(self.check_entity(avatar, level, id, portal_ready));
            }
        }
        contacts
    }

    /// Test a single catalog entity. `portal_ready` is false while the
    /// global portal cooldown is running.
    pub fn check_entity(
        &self,
        avatar: &Avatar,
        level: &Level,
        id: EntityId,
        portal_ready: bool,
    ) -> Option<Contact> {
        let entity = level.entity(id)?;
        if !level.category_active(entity.category()) {
            return None;
        }
        let t = &self.tuning;

        match *entity {
            LevelEntity::Obstacle {
                bounds,
                height,
                is_step_like,
            } => {
                let Some(bounds) = bounds else {
                    log::trace!("obstacle {id} has no bounds, skipping");
                    return None;
                };
                self.check_obstacle(avatar, id, &bounds, is_step_like || height < t.step_max_height)
            }
            LevelEntity::Wall { bounds } => {
                let Some(bounds) = bounds else {
                    log::trace!("wall {id} has no bounds, skipping");
                    return None;
                };
                let push = avatar.bounds().overlap(&bounds, Axes::Horizontal)?;
                Some(Contact::entity(
                    id,
                    ContactKind::Block {
                        damping: t.wall_damping,
                    },
                    push,
                ))
            }
            LevelEntity::ElevatedTile {
                world_x,
                world_z,
                height,
            } => self.check_elevated_tile(avatar, id, world_x, world_z, height),
            LevelEntity::Collectible {
                position,
                collected,
            }
            | LevelEntity::Key {
                position,
                collected,
            } => {
                if collected {
                    return None;
                }
                self.check_pickup_box(avatar, id, position)
            }
            LevelEntity::Exit { position, .. } => self.check_pickup_box(avatar, id, position),
            LevelEntity::Ghost { position } => {
                check_planar(avatar, id, position, t.ghost_radius + avatar.radius(), t.ghost_band)
            }
            LevelEntity::Spike { position, .. } => {
                check_planar(avatar, id, position, t.spike_radius + avatar.radius(), t.spike_band)
            }
            LevelEntity::BouncePad { position, .. } => {
                check_planar(avatar, id, position, t.pad_radius + avatar.radius(), t.pad_band)
            }
            LevelEntity::Hole {
                position,
                width,
                depth,
                ..
            } => {
                // Coarse footprint: a disc, not the true rectangle
                let trigger = width.max(depth) * t.hole_radius_scale;
                check_planar(avatar, id, position, trigger, t.hole_band)
            }
            LevelEntity::Portal { position, .. } => {
                if !portal_ready {
                    return None;
                }
                check_planar(avatar, id, position, t.portal_radius + avatar.radius(), t.portal_band)
            }
        }
    }

    /// Level boundary: X and Z must stay within ±(half_extent − radius)
    pub fn check_bounds(&self, avatar: &Avatar, level: &Level) -> Option<Contact> {
        let limit = (level.half_extent - avatar.radius()).max(0.0);
        let pos = avatar.position;
        let clamped_x = pos.x.clamp(-limit, limit);
        let clamped_z = pos.z.clamp(-limit, limit);
        if clamped_x == pos.x && clamped_z == pos.z {
            return None;
        }
        Some(Contact {
            target: ContactTarget::WorldBounds,
            kind: ContactKind::Block {
                damping: self.tuning.wall_damping,
            },
            overlap: Vec3::new(clamped_x - pos.x, 0.0, clamped_z - pos.z),
        })
    }

    fn check_obstacle(&self, avatar: &Avatar, id: EntityId, bounds: &Aabb, step: bool) -> Option<Contact> {
        let t = &self.tuning;
        let avatar_box = avatar.bounds();
        if !avatar_box.intersects(bounds) {
            return None;
        }

        let block = ContactKind::Block {
            damping: t.obstacle_damping,
        };
        if !step {
            return Some(Contact::entity(id, block, avatar_box.overlap(bounds, Axes::All)?));
        }

        let top = bounds.max.y;
        let gap = avatar.bottom() - top;
        if gap.abs() <= t.step_support_tolerance {
            return Some(Contact::entity(
                id,
                ContactKind::Support { surface_y: top },
                Vec3::new(0.0, -gap, 0.0),
            ));
        }
        if gap < -t.step_block_depth {
            return Some(Contact::entity(
                id,
                block,
                avatar_box.overlap(bounds, Axes::Horizontal)?,
            ));
        }
        // Between support and block range: the avatar is mid-climb
        None
    }

    fn check_elevated_tile(
        &self,
        avatar: &Avatar,
        id: EntityId,
        world_x: f32,
        world_z: f32,
        height: f32,
    ) -> Option<Contact> {
        let t = &self.tuning;
        let half = t.tile_size * 0.5;
        let reach = half + avatar.radius();
        let pos = avatar.position;
        let dx = pos.x - world_x;
        let dz = pos.z - world_z;

        if dx.abs() >= reach || dz.abs() >= reach {
            return None;
        }

        let gap = avatar.bottom() - height;
        if gap.abs() <= t.tile_support_tolerance && avatar.velocity.y <= 0.0 {
            return Some(Contact::entity(
                id,
                ContactKind::Support { surface_y: height },
                Vec3::new(0.0, -gap, 0.0),
            ));
        }

        if pos.y > 0.0 && pos.y < height + avatar.radius() {
            // Side hit: push along the horizontal axis with the larger penetration
            let pen_x = reach - dx.abs();
            let pen_z = reach - dz.abs();
            let push = if pen_x >= pen_z {
                Vec3::new(pen_x * sign(dx), 0.0, 0.0)
            } else {
                Vec3::new(0.0, 0.0, pen_z * sign(dz))
            };
            return Some(Contact::entity(
                id,
                ContactKind::Block {
                    damping: t.obstacle_damping,
                },
                push,
            ));
        }
        None
    }

    fn check_pickup_box(&self, avatar: &Avatar, id: EntityId, position: Vec3) -> Option<Contact> {
        let trigger = Aabb::from_center_half(position, Vec3::splat(self.tuning.pickup_half_extent));
        let overlap = avatar.bounds().overlap(&trigger, Axes::All)?;
        Some(Contact::entity(id, ContactKind::Touch, overlap))
    }
}

/// XZ distance-to-center test with a vertical band
fn check_planar(avatar: &Avatar, id: EntityId, center: Vec3, trigger: f32, band: f32) -> Option<Contact> {
    let pos = avatar.position;
    if (pos.y - center.y).abs() > band {
        return None;
    }
    if planar_distance(pos, center) >= trigger {
        return None;
    }
    let offset = Vec3::new(pos.x - center.x, 0.0, pos.z - center.z);
    Some(Contact::entity(id, ContactKind::Touch, offset))
}

#[inline]
fn sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{BouncePadKind, GridCell, LevelMode};

    fn detector() -> CollisionDetector {
        CollisionDetector::new(CollisionTuning::default())
    }

    fn avatar_at(x: f32, y: f32, z: f32) -> Avatar {
        Avatar::new(Vec3::new(x, y, z), 0.5, 3)
    }

    fn crate_box() -> Aabb {
        Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 4.0, 1.0))
    }

    #[test]
    fn test_obstacle_without_bounds_never_collides() {
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::Obstacle {
            bounds: None,
            height: 3.0,
            is_step_like: false,
        });
        assert!(detector().check_entity(&avatar_at(0.0, 0.5, 0.0), &level, 0, true).is_none());
    }

    #[test]
    fn test_obstacle_side_hit_blocks() {
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::obstacle(crate_box()));
        let contact = detector()
            .check_entity(&avatar_at(1.3, 1.0, 0.0), &level, 0, true)
            .unwrap();
        assert_eq!(contact.kind, ContactKind::Block { damping: 0.8 });
        assert!(contact.overlap.x > 0.0);
        assert!((contact.overlap.x - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_step_supports_when_bottom_near_top() {
        let step = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::obstacle(step));
        // Bottom at 0.7, top at 1.0
        let contact = detector()
            .check_entity(&avatar_at(0.8, 1.2, 0.0), &level, 0, true)
            .unwrap();
        assert_eq!(contact.kind, ContactKind::Support { surface_y: 1.0 });
    }

    #[test]
    fn test_step_like_flag_marks_tall_obstacle_climbable() {
        let tall = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.5, 1.0));
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::Obstacle {
            bounds: Some(tall),
            height: 2.5,
            is_step_like: true,
        });
        let contact = detector()
            .check_entity(&avatar_at(0.0, 2.2, 0.0), &level, 0, true)
            .unwrap();
        assert_eq!(contact.kind, ContactKind::Support { surface_y: 2.5 });
    }

    #[test]
    fn test_step_mid_climb_is_ignored() {
        let step = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 1.8, 1.0));
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::obstacle(step));
        // Bottom at 0.3: 1.5 below the top, inside neither range
        assert!(detector().check_entity(&avatar_at(1.2, 0.8, 0.0), &level, 0, true).is_none());
    }

    #[test]
    fn test_walls_ignored_outside_maze() {
        let mut level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::wall(crate_box()));
        let avatar = avatar_at(1.3, 1.0, 0.0);
        assert!(detector().check_entity(&avatar, &level, 0, true).is_none());
        level.mode = LevelMode::Maze;
        let contact = detector().check_entity(&avatar, &level, 0, true).unwrap();
        assert_eq!(contact.kind, ContactKind::Block { damping: 0.5 });
        assert_eq!(contact.overlap.y, 0.0);
    }

    #[test]
    fn test_elevated_tile_support_and_side() {
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::ElevatedTile {
            world_x: 0.0,
            world_z: 0.0,
            height: 5.0,
        });
        // Within 3 units of the top, falling
        let mut avatar = avatar_at(0.5, 3.0, 0.0);
        avatar.velocity.y = -1.0;
        let contact = detector().check_entity(&avatar, &level, 0, true).unwrap();
        assert_eq!(contact.kind, ContactKind::Support { surface_y: 5.0 });

        // Low on the side: X penetration 0.3, Z penetration 1.2, pushed along Z
        let avatar = avatar_at(1.2, 0.5, 0.3);
        let contact = detector().check_entity(&avatar, &level, 0, true).unwrap();
        assert!(matches!(contact.kind, ContactKind::Block { .. }));
        assert_eq!(contact.overlap.x, 0.0);
        assert!((contact.overlap.z - 1.2).abs() < 1e-5);

        // Deeper along X than Z: pushed along X, away from the center
        let avatar = avatar_at(-0.2, 0.5, 1.4);
        let contact = detector().check_entity(&avatar, &level, 0, true).unwrap();
        assert!((contact.overlap.x + 1.3).abs() < 1e-5);
        assert_eq!(contact.overlap.z, 0.0);

        // Outside the footprint + radius
        assert!(detector().check_entity(&avatar_at(1.6, 0.5, 0.0), &level, 0, true).is_none());
    }

    #[test]
    fn test_collected_items_are_invisible() {
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::Collectible {
            position: Vec3::new(0.0, 0.5, 0.0),
            collected: true,
        });
        assert!(detector().check_entity(&avatar_at(0.0, 0.5, 0.0), &level, 0, true).is_none());
    }

    #[test]
    fn test_planar_triggers_respect_band() {
        let level = Level::new(LevelMode::Normal, 20.0).with(LevelEntity::BouncePad {
            position: Vec3::ZERO,
            kind: BouncePadKind::Vertical,
            force: 10.0,
            direction: Vec3::Y,
        });
        assert!(detector().check_entity(&avatar_at(0.5, 0.5, 0.5), &level, 0, true).is_some());
        assert!(detector().check_entity(&avatar_at(0.5, 3.0, 0.5), &level, 0, true).is_none());
    }

    #[test]
    fn test_hole_trigger_radius_scales_with_footprint() {
        let level = Level::new(LevelMode::Normal, 40.0).with(LevelEntity::Hole {
            position: Vec3::ZERO,
            width: 1.0,
            depth: 2.0,
            destination: Vec3::new(0.0, 0.5, 30.0),
        });
        // Trigger radius 2 * 2.5 = 5
        assert!(detector().check_entity(&avatar_at(4.9, 0.5, 0.0), &level, 0, true).is_some());
        assert!(detector().check_entity(&avatar_at(5.1, 0.5, 0.0), &level, 0, true).is_none());
    }

    #[test]
    fn test_portal_gated_by_cooldown() {
        let level = Level::new(LevelMode::Normal, 20.0)
            .with(LevelEntity::portal(Vec3::ZERO, GridCell::new(1, 1)));
        let avatar = avatar_at(0.2, 0.5, 0.0);
        assert!(detector().check_entity(&avatar, &level, 0, true).is_some());
        assert!(detector().check_entity(&avatar, &level, 0, false).is_none());
    }

    #[test]
    fn test_bounds_reports_clamp_offset() {
        let level = Level::new(LevelMode::Normal, 10.0);
        let contact = detector().check_bounds(&avatar_at(11.0, 0.5, -3.0), &level).unwrap();
        assert_eq!(contact.target, ContactTarget::WorldBounds);
        assert!((contact.overlap.x + 1.5).abs() < 1e-5);
        assert_eq!(contact.overlap.z, 0.0);
        assert!(detector().check_bounds(&avatar_at(0.0, 0.5, 0.0), &level).is_none());
    }

    #[test]
    fn test_check_all_follows_category_order() {
        // Catalog order is deliberately scrambled
        let level = Level::new(LevelMode::Normal, 10.0)
            .with(LevelEntity::Ghost {
                position: Vec3::new(9.5, 0.5, 0.0),
            })
            .with(LevelEntity::collectible(Vec3::new(9.5, 0.5, 0.0)))
            .with(LevelEntity::obstacle(Aabb::new(
                Vec3::new(9.0, 0.0, -1.0),
                Vec3::new(12.0, 4.0, 1.0),
            )));
        let contacts = detector().check_all(&avatar_at(9.8, 0.5, 0.0), &level, true);
        let targets: Vec<_> = contacts.iter().map(|c| c.target).collect();
        assert_eq!(
            targets,
            vec![
                ContactTarget::Entity(2),
                ContactTarget::Entity(1),
                ContactTarget::Entity(0),
                ContactTarget::WorldBounds,
            ]
        );
    }
}
