//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, every timer counted in ticks
//! - Seeded RNG only
//! - Stable iteration order (spawn order, ascending id)
//! - No rendering or platform dependencies

pub mod collision;
pub mod craft;
pub mod geometry;
pub mod hostile;
pub mod level;
pub mod map;
pub mod projectile;
pub mod session;
pub mod state;
pub mod tick;
pub mod weapons;

pub use craft::{Craft, StatBlock, StatKind};
pub use geometry::{Rect, rect_overlaps_circle, rect_overlaps_rect};
pub use hostile::{Archetype, AttackPolicy, Hostile, MovementPolicy, Shield};
pub use level::{LevelLayout, SpawnPoint, TileKind, Wall, WallKind, generate_geometry};
pub use map::{LevelSet, LevelSource, MapDirectory};
pub use projectile::{Affiliation, Projectile};
pub use session::Session;
pub use state::{GameEvent, GamePhase, GameState, Snapshot};
pub use tick::{TickInput, TickOutcome, tick};
pub use weapons::{BASIC_CONFIG, WeaponConfig, WeaponTable, fire};
