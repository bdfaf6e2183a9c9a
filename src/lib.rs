//! Nano Drone - A top-down arena shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, combat, hostile AI, level lifecycle)
//! - `settings`: Session configuration loaded from JSON
//! - `error`: Failures at the data-loading edges

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{LevelError, SettingsError};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Simulation ticks per simulated second. Every cooldown and timer is
    /// counted in ticks at this rate.
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default tile edge in world units
    pub const TILE_SIZE: f32 = 50.0;

    /// Craft defaults
    pub const CRAFT_RADIUS: f32 = 35.0;
    pub const CRAFT_BASE_HEALTH: f32 = 100.0;
    pub const CRAFT_HEALTH_PER_POINT: f32 = 20.0;
    pub const CRAFT_BASE_SPEED: f32 = 3.0;
    pub const CRAFT_SPEED_PER_POINT: f32 = 0.5;
    /// Base reload interval (ticks)
    pub const CRAFT_BASE_RELOAD: f32 = 60.0;
    pub const CRAFT_RELOAD_PER_POINT: f32 = 2.0;
    pub const CRAFT_MIN_RELOAD: f32 = 5.0;
    /// Ticks without damage before regeneration kicks in (5 seconds)
    pub const REGEN_DELAY_TICKS: u64 = 5 * TICK_RATE as u64;
    pub const REGEN_BASE: f32 = 0.5;
    pub const REGEN_PER_POINT: f32 = 0.3;
    /// Contact damage dealt to a hostile per body damage point
    pub const BODY_DAMAGE_PER_POINT: f32 = 6.0;
    /// Highest level a single stat can reach
    pub const STAT_CAP: u8 = 7;

    /// Experience curve
    pub const XP_FIRST_THRESHOLD: u32 = 100;
    pub const XP_THRESHOLD_GROWTH: f32 = 1.2;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 5.0;
    pub const PROJECTILE_BASE_SPEED: f32 = 10.0;
    pub const PROJECTILE_SPEED_PER_POINT: f32 = 1.5;
    pub const PROJECTILE_BASE_DAMAGE: f32 = 10.0;
    pub const PROJECTILE_DAMAGE_PER_POINT: f32 = 3.0;
    /// Integrity per penetration point
    pub const INTEGRITY_PER_PENETRATION: f32 = 10.0;
    /// Integrity consumed every time a projectile hits a hostile
    pub const INTEGRITY_COST_PER_HIT: f32 = 20.0;
    /// Distance ahead of the craft centre where projectiles spawn
    pub const MUZZLE_OFFSET: f32 = 30.0;
    /// Projectiles this far outside the world are discarded
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 100.0;

    /// Contact damage per throttled contact tick (before difficulty scaling)
    pub const CONTACT_DAMAGE: f32 = 10.0;
    /// Per-hostile contact throttle (1 second)
    pub const CONTACT_COOLDOWN_TICKS: u32 = TICK_RATE;

    /// Difficulty growth per level index
    pub const DIFFICULTY_STEP: f32 = 0.1;

    /// Level complete interstitial (4.5 seconds)
    pub const TRANSITION_TICKS: u32 = 270;
}

/// Difficulty multiplier applied to hostile health, hostile projectile damage
/// and contact damage for a level index.
#[inline]
pub fn difficulty_multiplier(level_index: u32) -> f32 {
    1.0 + level_index as f32 * consts::DIFFICULTY_STEP
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle in radians from `from` toward `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
