//! Static level catalog
//!
//! Level entities are created when a level is loaded and live until it is
//! torn down. The collision core reads them every frame and changes them
//! only through the mutation hooks (`collect_item`, `collect_key`,
//! `activate_exit`), which keep the collected/activated flags monotonic.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use crate::consts::CELL_SIZE;

/// Index of an entity inside its level
pub type EntityId = usize;

/// Game mode a level is played in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelMode {
    /// Open collectible level: needs every collectible and the key
    #[default]
    Normal,
    /// Like `Normal`, with blocking maze walls
    Maze,
    /// Chase level: clearing the collectibles opens the exit
    Pacman,
}

/// A cell of the level grid (portals address destinations this way)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub col: i32,
    pub row: i32,
}

impl GridCell {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

/// Direction a bounce pad throws the avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BouncePadKind {
    Vertical,
    Horizontal,
}

/// Collision categories, listed in the order they are processed each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Obstacle,
    Wall,
    ElevatedTile,
    Collectible,
    Key,
    Exit,
    Hazard,
    BouncePad,
    Hole,
    Portal,
    WorldBounds,
}

/// Per-frame processing order. Later categories observe the avatar state
/// already corrected by earlier ones.
pub const CATEGORY_ORDER: [Category; 11] = [
    Category::Obstacle,
    Category::Wall,
    Category::ElevatedTile,
    Category::Collectible,
    Category::Key,
    Category::Exit,
    Category::Hazard,
    Category::BouncePad,
    Category::Hole,
    Category::Portal,
    Category::WorldBounds,
];

/// A static level entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LevelEntity {
    /// Solid block; short ones are climbable steps. A record without bounds
    /// never collides.
    Obstacle {
        bounds: Option<Aabb>,
        height: f32,
        is_step_like: bool,
    },
    /// Maze wall, only solid in maze mode
    Wall { bounds: Option<Aabb> },
    /// Raised floor tile centred on (world_x, world_z), top at `height`
    ElevatedTile {
        world_x: f32,
        world_z: f32,
        height: f32,
    },
    Collectible { position: Vec3, collected: bool },
    Key { position: Vec3, collected: bool },
    Exit { position: Vec3, activated: bool },
    Ghost { position: Vec3 },
    BouncePad {
        position: Vec3,
        kind: BouncePadKind,
        force: f32,
        direction: Vec3,
    },
    Spike { position: Vec3, damage: u32 },
    /// Drop into the underworld at `destination`
    Hole {
        position: Vec3,
        width: f32,
        depth: f32,
        destination: Vec3,
    },
    Portal {
        position: Vec3,
        destination: GridCell,
        /// Clock time (ms) of the last teleport through this portal
        last_trigger_time: Option<f64>,
    },
}

impl LevelEntity {
    pub fn category(&self) -> Category {
        match self {
            LevelEntity::Obstacle { .. } => Category::Obstacle,
            LevelEntity::Wall { .. } => Category::Wall,
            LevelEntity::ElevatedTile { .. } => Category::ElevatedTile,
            LevelEntity::Collectible { .. } => Category::Collectible,
            LevelEntity::Key { .. } => Category::Key,
            LevelEntity::Exit { .. } => Category::Exit,
            LevelEntity::Ghost { .. } | LevelEntity::Spike { .. } => Category::Hazard,
            LevelEntity::BouncePad { .. } => Category::BouncePad,
            LevelEntity::Hole { .. } => Category::Hole,
            LevelEntity::Portal { .. } => Category::Portal,
        }
    }

    pub fn obstacle(bounds: Aabb) -> Self {
        let height = bounds.max.y - bounds.min.y;
        LevelEntity::Obstacle {
            bounds: Some(bounds),
            height,
            is_step_like: false,
        }
    }

    pub fn wall(bounds: Aabb) -> Self {
        LevelEntity::Wall {
            bounds: Some(bounds),
        }
    }

    pub fn collectible(position: Vec3) -> Self {
        LevelEntity::Collectible {
            position,
            collected: false,
        }
    }

    pub fn key(position: Vec3) -> Self {
        LevelEntity::Key {
            position,
            collected: false,
        }
    }

    pub fn exit(position: Vec3) -> Self {
        LevelEntity::Exit {
            position,
            activated: false,
        }
    }

    pub fn portal(position: Vec3, destination: GridCell) -> Self {
        LevelEntity::Portal {
            position,
            destination,
            last_trigger_time: None,
        }
    }
}

/// A loaded level: mode, extents and the entity catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub mode: LevelMode,
    /// Playable area spans ±half_extent on X and Z
    pub half_extent: f32,
    pub cell_size: f32,
    /// Height of the ground plane
    pub floor_y: f32,
    pub spawn: Vec3,
    entities: Vec<LevelEntity>,
}

impl Level {
    pub fn new(mode: LevelMode, half_extent: f32) -> Self {
        Self {
            mode,
            half_extent,
            cell_size: CELL_SIZE,
            floor_y: 0.0,
            spawn: Vec3::new(0.0, crate::consts::AVATAR_RADIUS, 0.0),
            entities: Vec::new(),
        }
    }

    pub fn with_spawn(mut self, spawn: Vec3) -> Self {
        self.spawn = spawn;
        self
    }

    /// Add an entity, returning its id
    pub fn push(&mut self, entity: LevelEntity) -> EntityId {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn with(mut self, entity: LevelEntity) -> Self {
        self.push(entity);
        self
    }

    pub fn entities(&self) -> &[LevelEntity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&LevelEntity> {
        self.entities.get(id)
    }

    /// Mutable access for hosts that move entities (ghost AI)
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut LevelEntity> {
        self.entities.get_mut(id)
    }

    /// Ids of a category's entities, in catalog order
    pub fn ids_in(&self, category: Category) -> Vec<EntityId> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.category() == category)
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether a category takes part in collision for this level's mode
    pub fn category_active(&self, category: Category) -> bool {
        match category {
            Category::Wall => self.mode == LevelMode::Maze,
            _ => true,
        }
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| matches!(e, LevelEntity::Collectible { collected: false, .. }))
            .count()
    }

    pub fn has_key(&self) -> bool {
        self.entities
            .iter()
            .any(|e| matches!(e, LevelEntity::Key { .. }))
    }

    pub fn key_collected(&self) -> bool {
        self.entities
            .iter()
            .any(|e| matches!(e, LevelEntity::Key { collected: true, .. }))
    }

    pub fn exit_activated(&self) -> bool {
        self.entities
            .iter()
            .any(|e| matches!(e, LevelEntity::Exit { activated: true, .. }))
    }

    /// Mark a collectible as taken. Returns false if it was already taken or
    /// the id is not a collectible.
    pub fn collect_item(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(id) {
            Some(LevelEntity::Collectible { collected, .. }) if !*collected => {
                *collected = true;
                true
            }
            _ => false,
        }
    }

    /// Mark the key `id` as taken. False if `id` is not an untaken key.
    pub fn collect_key(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(id) {
            Some(LevelEntity::Key { collected, .. }) if !*collected => {
                *collected = true;
                true
            }
            _ => false,
        }
    }

    /// Exit opens once every collectible is gone; outside pacman mode the
    /// key must also be held (levels without a key skip that check).
    pub fn can_activate_exit(&self) -> bool {
        if self.remaining_collectibles() > 0 {
            return false;
        }
        match self.mode {
            LevelMode::Pacman => true,
            LevelMode::Normal | LevelMode::Maze => !self.has_key() || self.key_collected(),
        }
    }

    /// Activate the exit. Succeeds at most once per level run.
    pub fn activate_exit(&mut self, id: EntityId) -> bool {
        if self.exit_activated() || !self.can_activate_exit() {
            return false;
        }
        match self.entities.get_mut(id) {
            Some(LevelEntity::Exit { activated, .. }) => {
                *activated = true;
                true
            }
            _ => false,
        }
    }

    /// World-space center of a grid cell at the given height
    pub fn grid_to_world(&self, cell: GridCell, y: f32) -> Vec3 {
        Vec3::new(
            -self.half_extent + (cell.col as f32 + 0.5) * self.cell_size,
            y,
            -self.half_extent + (cell.row as f32 + 0.5) * self.cell_size,
        )
    }

    /// Explicit level restart: clears every collected/activated flag
    pub fn restart(&mut self) {
        for entity in &mut self.entities {
            match entity {
                LevelEntity::Collectible { collected, .. } | LevelEntity::Key { collected, .. } => {
                    *collected = false
                }
                LevelEntity::Exit { activated, .. } => *activated = false,
                LevelEntity::Portal {
                    last_trigger_time, ..
                } => *last_trigger_time = None,
                _ => {}
            }
        }
    }
}
