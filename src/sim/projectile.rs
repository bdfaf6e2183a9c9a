//! Projectiles fired by the craft and by hostiles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::direction;

/// Which side fired a projectile. Fixed for the projectile's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affiliation {
    Craft,
    Hostile,
}

/// A projectile in flight.
///
/// Carries no reference to whoever fired it, only the affiliation tag, so the
/// shooter can be removed while its shots are still travelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Per-tick displacement, fixed at spawn (no homing)
    pub vel: Vec2,
    pub damage: f32,
    /// Remaining hit budget; the projectile is spent once this reaches zero
    pub integrity: f32,
    pub max_integrity: f32,
    pub affiliation: Affiliation,
    pub radius: f32,
}

impl Projectile {
    /// Create a projectile travelling along `angle` at `speed` units per tick
    pub fn new(
        pos: Vec2,
        angle: f32,
        speed: f32,
        damage: f32,
        penetration: u32,
        affiliation: Affiliation,
    ) -> Self {
        let integrity = penetration as f32 * INTEGRITY_PER_PENETRATION;
        debug_assert!(integrity > 0.0, "projectile needs at least one penetration point");
        Self {
            pos,
            vel: direction(angle) * speed,
            damage,
            integrity,
            max_integrity: integrity,
            affiliation,
            radius: PROJECTILE_RADIUS,
        }
    }

    pub fn update(&mut self) {
        self.pos += self.vel;
    }

    /// Consume integrity for one hit. Returns true when the projectile is spent.
    pub fn register_hit(&mut self) -> bool {
        self.integrity -= INTEGRITY_COST_PER_HIT;
        self.is_spent()
    }

    #[inline]
    pub fn is_spent(&self) -> bool {
        self.integrity <= 0.0
    }

    /// Remaining integrity as a fraction of the starting value
    pub fn integrity_ratio(&self) -> f32 {
        if self.max_integrity <= 0.0 {
            0.0
        } else {
            (self.integrity / self.max_integrity).clamp(0.0, 1.0)
        }
    }

    /// Whether the projectile has left the world by more than the margin
    pub fn is_out_of_bounds(&self, world_size: Vec2) -> bool {
        self.pos.x < -OUT_OF_BOUNDS_MARGIN
            || self.pos.y < -OUT_OF_BOUNDS_MARGIN
            || self.pos.x > world_size.x + OUT_OF_BOUNDS_MARGIN
            || self.pos.y > world_size.y + OUT_OF_BOUNDS_MARGIN
    }
}
