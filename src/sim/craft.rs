//! The player-controlled craft and its progression
//!
//! The craft survives level loads; only its position is replaced when a new
//! level starts. Stats, level, experience and weapon configuration persist for
//! the whole session.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::weapons::{BASIC_CONFIG, WeaponTable};
use crate::angle_to;
use crate::consts::*;

/// The eight upgradeable stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    HealthRegen,
    MaxHealth,
    BodyDamage,
    BulletSpeed,
    BulletPenetration,
    BulletDamage,
    Reload,
    MovementSpeed,
}

impl StatKind {
    /// Upgrade panel order
    pub const ALL: [StatKind; 8] = [
        StatKind::HealthRegen,
        StatKind::MaxHealth,
        StatKind::BodyDamage,
        StatKind::BulletSpeed,
        StatKind::BulletPenetration,
        StatKind::BulletDamage,
        StatKind::Reload,
        StatKind::MovementSpeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::HealthRegen => "health_regen",
            StatKind::MaxHealth => "max_health",
            StatKind::BodyDamage => "body_damage",
            StatKind::BulletSpeed => "bullet_speed",
            StatKind::BulletPenetration => "bullet_penetration",
            StatKind::BulletDamage => "bullet_damage",
            StatKind::Reload => "reload",
            StatKind::MovementSpeed => "movement_speed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        StatKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

/// Stat levels, each in `0..=STAT_CAP`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub health_regen: u8,
    pub max_health: u8,
    pub body_damage: u8,
    pub bullet_speed: u8,
    pub bullet_penetration: u8,
    pub bullet_damage: u8,
    pub reload: u8,
    pub movement_speed: u8,
}

impl StatBlock {
    pub fn get(&self, kind: StatKind) -> u8 {
        match kind {
            StatKind::HealthRegen => self.health_regen,
            StatKind::MaxHealth => self.max_health,
            StatKind::BodyDamage => self.body_damage,
            StatKind::BulletSpeed => self.bullet_speed,
            StatKind::BulletPenetration => self.bullet_penetration,
            StatKind::BulletDamage => self.bullet_damage,
            StatKind::Reload => self.reload,
            StatKind::MovementSpeed => self.movement_speed,
        }
    }

    fn get_mut(&mut self, kind: StatKind) -> &mut u8 {
        match kind {
            StatKind::HealthRegen => &mut self.health_regen,
            StatKind::MaxHealth => &mut self.max_health,
            StatKind::BodyDamage => &mut self.body_damage,
            StatKind::BulletSpeed => &mut self.bullet_speed,
            StatKind::BulletPenetration => &mut self.bullet_penetration,
            StatKind::BulletDamage => &mut self.bullet_damage,
            StatKind::Reload => &mut self.reload,
            StatKind::MovementSpeed => &mut self.movement_speed,
        }
    }

    /// Raise a stat by one unless it is capped. Returns true on success.
    pub fn raise(&mut self, kind: StatKind) -> bool {
        let level = self.get_mut(kind);
        if *level >= STAT_CAP {
            return false;
        }
        *level += 1;
        true
    }

    pub fn max_health(&self) -> f32 {
        CRAFT_BASE_HEALTH + self.max_health as f32 * CRAFT_HEALTH_PER_POINT
    }

    pub fn movement_speed(&self) -> f32 {
        CRAFT_BASE_SPEED + self.movement_speed as f32 * CRAFT_SPEED_PER_POINT
    }

    /// Reload interval in ticks before weapon configuration modifiers
    pub fn reload_interval(&self) -> f32 {
        (CRAFT_BASE_RELOAD - self.reload as f32 * CRAFT_RELOAD_PER_POINT).max(CRAFT_MIN_RELOAD)
    }

    /// Health regenerated per tick once the regen delay has passed
    pub fn regen_per_tick(&self) -> f32 {
        REGEN_BASE + self.health_regen as f32 * REGEN_PER_POINT
    }

    pub fn projectile_speed(&self) -> f32 {
        PROJECTILE_BASE_SPEED + self.bullet_speed as f32 * PROJECTILE_SPEED_PER_POINT
    }

    pub fn projectile_damage(&self) -> f32 {
        PROJECTILE_BASE_DAMAGE + self.bullet_damage as f32 * PROJECTILE_DAMAGE_PER_POINT
    }

    pub fn penetration(&self) -> u32 {
        1 + self.bullet_penetration as u32
    }

    pub fn body_damage(&self) -> f32 {
        self.body_damage as f32 * BODY_DAMAGE_PER_POINT
    }
}

/// The single player-controlled entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Craft {
    pub pos: Vec2,
    /// Facing angle (radians)
    pub angle: f32,
    pub radius: f32,
    /// Key into the weapon configuration table
    pub weapon_config: String,
    pub stats: StatBlock,
    pub max_health: f32,
    pub speed: f32,
    /// Reload interval in ticks (derived from stats)
    pub reload_interval: f32,
    pub health: f32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub level: u32,
    pub skill_points: u32,
    /// Tick of the most recent damage, gates regeneration
    pub last_damage_tick: u64,
    /// Ticks until the weapon can fire again
    pub weapon_cooldown: f32,
}

impl Craft {
    pub fn new(pos: Vec2) -> Self {
        Self::with_stats(pos, StatBlock::default())
    }

    pub fn with_stats(pos: Vec2, stats: StatBlock) -> Self {
        let mut craft = Self {
            pos,
            angle: 0.0,
            radius: CRAFT_RADIUS,
            weapon_config: BASIC_CONFIG.to_string(),
            stats,
            max_health: 0.0,
            speed: 0.0,
            reload_interval: 0.0,
            health: 0.0,
            xp: 0,
            xp_to_next_level: XP_FIRST_THRESHOLD,
            level: 1,
            skill_points: 0,
            last_damage_tick: 0,
            weapon_cooldown: 0.0,
        };
        craft.recompute_derived();
        craft.health = craft.max_health;
        craft
    }

    /// Recompute attributes derived from stats. Current health is kept but
    /// clamped to the new maximum.
    pub fn recompute_derived(&mut self) {
        self.max_health = self.stats.max_health();
        self.speed = self.stats.movement_speed();
        self.reload_interval = self.stats.reload_interval();
        self.health = self.health.clamp(0.0, self.max_health);
    }

    /// Per-tick self update: movement, aim, cooldown and regeneration.
    ///
    /// `movement` holds the two input axes; each is reduced to -1, 0 or 1 and
    /// diagonal input is scaled by 1/√2 so every direction moves at the same
    /// speed.
    pub fn update(&mut self, movement: Vec2, aim: Option<Vec2>, now: u64) {
        let mut dir = Vec2::new(axis(movement.x), axis(movement.y));
        if dir.x != 0.0 && dir.y != 0.0 {
            dir *= FRAC_1_SQRT_2;
        }
        self.pos += dir * self.speed;

        if let Some(target) = aim {
            self.angle = angle_to(self.pos, target);
        }

        self.weapon_cooldown = (self.weapon_cooldown - 1.0).max(0.0);

        if now.saturating_sub(self.last_damage_tick) > REGEN_DELAY_TICKS {
            self.health = (self.health + self.stats.regen_per_tick()).min(self.max_health);
        }
    }

    /// Subtract damage, clamping at zero. Returns true if the craft is destroyed.
    pub fn apply_damage(&mut self, amount: f32, now: u64) -> bool {
        self.health = (self.health - amount).max(0.0);
        self.last_damage_tick = now;
        self.is_destroyed()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Bounding box used for wall collision
    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }

    /// Add experience, levelling up as many times as it covers.
    /// Returns the number of levels gained.
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.xp_to_next_level = (self.xp_to_next_level as f32 * XP_THRESHOLD_GROWTH) as u32;
            self.level += 1;
            if awards_skill_point(self.level) {
                self.skill_points += 1;
            }
            gained += 1;
        }
        gained
    }

    /// Spend a skill point on a stat. Rejected when no points are left or the
    /// stat is capped.
    pub fn upgrade_stat(&mut self, kind: StatKind) -> bool {
        if self.skill_points == 0 {
            return false;
        }
        if !self.stats.raise(kind) {
            return false;
        }
        self.skill_points -= 1;
        self.recompute_derived();
        true
    }

    /// Switch weapon configuration. Unknown ids are rejected so the craft
    /// always holds a valid table key.
    pub fn select_weapon_config(&mut self, id: &str, table: &WeaponTable) -> bool {
        if !table.contains(id) {
            return false;
        }
        self.weapon_config = id.to_string();
        true
    }

    /// Put the craft back at a spawn point with full health
    pub fn respawn(&mut self, spawn: Vec2, now: u64) {
        self.pos = spawn;
        self.health = self.max_health;
        self.weapon_cooldown = 0.0;
        self.last_damage_tick = now;
    }
}

fn axis(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Levels 2..=28 and 30 each award a point, then every third level after 30
fn awards_skill_point(level: u32) -> bool {
    level <= 28 || level == 30 || (level > 30 && (level - 30) % 3 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_stats() {
        let stats = StatBlock {
            max_health: 2,
            movement_speed: 2,
            reload: 5,
            ..Default::default()
        };
        let craft = Craft::with_stats(Vec2::ZERO, stats);
        assert_eq!(craft.max_health, 140.0);
        assert_eq!(craft.health, 140.0);
        assert_eq!(craft.speed, 4.0);
        assert_eq!(craft.reload_interval, 50.0);
    }

    #[test]
    fn test_reload_interval_floor() {
        let mut stats = StatBlock::default();
        stats.reload = 7;
        assert_eq!(stats.reload_interval(), 46.0);
        // Floor only matters below 5 ticks; the cap keeps stats above it
        assert!(stats.reload_interval() >= CRAFT_MIN_RELOAD);
    }

    #[test]
    fn test_diagonal_movement_normalized() {
        let mut craft = Craft::new(Vec2::ZERO);
        craft.update(Vec2::new(1.0, 1.0), None, 0);
        assert!((craft.pos.length() - craft.speed).abs() < 1e-4);

        let mut straight = Craft::new(Vec2::ZERO);
        straight.update(Vec2::new(1.0, 0.0), None, 0);
        assert_eq!(straight.pos, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_aim_sets_angle() {
        let mut craft = Craft::new(Vec2::ZERO);
        craft.update(Vec2::ZERO, Some(Vec2::new(0.0, 100.0)), 0);
        assert!((craft.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_cooldown_floors_at_zero() {
        let mut craft = Craft::new(Vec2::ZERO);
        craft.weapon_cooldown = 1.5;
        craft.update(Vec2::ZERO, None, 0);
        assert_eq!(craft.weapon_cooldown, 0.5);
        craft.update(Vec2::ZERO, None, 0);
        assert_eq!(craft.weapon_cooldown, 0.0);
    }

    #[test]
    fn test_regen_waits_for_delay() {
        let mut craft = Craft::new(Vec2::ZERO);
        craft.apply_damage(50.0, 100);
        craft.update(Vec2::ZERO, None, 100 + REGEN_DELAY_TICKS);
        assert_eq!(craft.health, 50.0);
        craft.update(Vec2::ZERO, None, 101 + REGEN_DELAY_TICKS);
        assert_eq!(craft.health, 50.5);
    }

    #[test]
    fn test_regen_clamped_to_max() {
        let mut craft = Craft::new(Vec2::ZERO);
        craft.health = craft.max_health - 0.1;
        craft.update(Vec2::ZERO, None, 10_000);
        assert_eq!(craft.health, craft.max_health);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut craft = Craft::new(Vec2::ZERO);
        assert!(craft.apply_damage(500.0, 1));
        assert_eq!(craft.health, 0.0);
    }

    #[test]
    fn test_level_up_awards_skill_point() {
        let mut craft = Craft::new(Vec2::ZERO);
        assert_eq!(craft.gain_xp(99), 0);
        assert_eq!(craft.gain_xp(1), 1);
        assert_eq!(craft.level, 2);
        assert_eq!(craft.xp, 0);
        assert_eq!(craft.xp_to_next_level, 120);
        assert_eq!(craft.skill_points, 1);
    }

    #[test]
    fn test_large_xp_award_levels_repeatedly() {
        let mut craft = Craft::new(Vec2::ZERO);
        // 100 + 120 = 220 covers two levels with 10 left over
        assert_eq!(craft.gain_xp(230), 2);
        assert_eq!(craft.level, 3);
        assert_eq!(craft.xp, 10);
        assert_eq!(craft.xp_to_next_level, 144);
    }

    #[test]
    fn test_skill_point_schedule() {
        assert!(awards_skill_point(28));
        assert!(!awards_skill_point(29));
        assert!(awards_skill_point(30));
        assert!(!awards_skill_point(31));
        assert!(awards_skill_point(33));
    }

    #[test]
    fn test_upgrade_requires_points_and_respects_cap() {
        let mut craft = Craft::new(Vec2::ZERO);
        assert!(!craft.upgrade_stat(StatKind::MaxHealth));

        craft.skill_points = 10;
        for _ in 0..STAT_CAP {
            assert!(craft.upgrade_stat(StatKind::MaxHealth));
        }
        assert!(!craft.upgrade_stat(StatKind::MaxHealth));
        assert_eq!(craft.stats.max_health, STAT_CAP);
        assert_eq!(craft.skill_points, 3);
        assert_eq!(craft.max_health, 240.0);
    }

    #[test]
    fn test_stat_kind_round_trip_names() {
        for kind in StatKind::ALL {
            assert_eq!(StatKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(StatKind::from_str("luck"), None);
    }

    #[test]
    fn test_select_weapon_config_rejects_unknown() {
        let table = WeaponTable::global();
        let mut craft = Craft::new(Vec2::ZERO);
        assert!(craft.select_weapon_config("TWIN", table));
        assert_eq!(craft.weapon_config, "TWIN");
        assert!(!craft.select_weapon_config("LASER", table));
        assert_eq!(craft.weapon_config, "TWIN");
    }
}
