//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame delta, rejected when degenerate
//! - Seeded RNG only
//! - Fixed check order (category, then entity ID) and fixed pair order
//! - No rendering, audio or platform dependencies; hosts drain `GameEvent`s

pub mod avatar;
pub mod battle;
pub mod collision;
pub mod events;
pub mod frame;
pub mod geometry;
pub mod level;
pub mod response;
pub mod session;

pub use avatar::Avatar;
pub use battle::{BattleBall, BattlePhase, BattleSimulator};
pub use collision::{CollisionDetector, Contact, ContactKind, ContactTarget};
pub use events::GameEvent;
pub use frame::CollisionSystem;
pub use geometry::{Aabb, Axes, Sphere};
pub use level::{
    BouncePadKind, CATEGORY_ORDER, Category, EntityId, GridCell, Level, LevelEntity, LevelMode,
};
pub use response::{FrameContext, PortalCooldown, ResponseResolver};
pub use session::{GameSession, SessionPhase, TickInput};
