//! Weapon configurations and the craft's firing system
//!
//! Every configuration is a cannon layout plus multipliers. The built-in table
//! is built once per process and never mutated; adding a configuration means
//! adding an entry to [`WeaponTable::builtin`].

use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;
use std::sync::OnceLock;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::craft::Craft;
use super::projectile::{Affiliation, Projectile};
use crate::consts::MUZZLE_OFFSET;
use crate::direction;

/// Fallback configuration every table must contain
pub const BASIC_CONFIG: &str = "BASIC";

/// One barrel of a weapon configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannonSpec {
    /// Angular offset from the craft's facing (degrees)
    pub angle_offset: f32,
    /// Sideways offset of the muzzle, perpendicular to facing (world units)
    pub lateral_offset: f32,
}

impl CannonSpec {
    pub const fn new(angle_offset: f32, lateral_offset: f32) -> Self {
        Self {
            angle_offset,
            lateral_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub cannons: Vec<CannonSpec>,
    /// Added to 1.0 and multiplied into projectile damage
    pub damage_multiplier: f32,
    /// Reload interval is divided by this
    pub reload_speed: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_speed_bonus: Option<f32>,
    /// Random angular jitter per projectile (radians, ±spread)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<f32>,
    #[serde(default)]
    pub description: String,
}

impl WeaponConfig {
    fn new(cannons: Vec<CannonSpec>, damage_multiplier: f32, reload_speed: f32, description: &str) -> Self {
        Self {
            cannons,
            damage_multiplier,
            reload_speed,
            bullet_speed_bonus: None,
            spread: None,
            description: description.to_string(),
        }
    }
}

/// Read-only mapping from configuration id to configuration.
///
/// Always contains [`BASIC_CONFIG`]; lookups of unknown ids fall back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, WeaponConfig>",
    into = "BTreeMap<String, WeaponConfig>"
)]
pub struct WeaponTable {
    configs: BTreeMap<String, WeaponConfig>,
    basic: WeaponConfig,
}

impl TryFrom<BTreeMap<String, WeaponConfig>> for WeaponTable {
    type Error = String;

    fn try_from(configs: BTreeMap<String, WeaponConfig>) -> Result<Self, Self::Error> {
        let basic = configs
            .get(BASIC_CONFIG)
            .cloned()
            .ok_or_else(|| format!("weapon table is missing the {} entry", BASIC_CONFIG))?;
        if let Some((id, _)) = configs.iter().find(|(_, c)| c.reload_speed <= 0.0) {
            return Err(format!("weapon configuration {} has a non-positive reload speed", id));
        }
        Ok(Self { configs, basic })
    }
}

impl From<WeaponTable> for BTreeMap<String, WeaponConfig> {
    fn from(table: WeaponTable) -> Self {
        table.configs
    }
}

impl WeaponTable {
    /// The process-wide built-in table
    pub fn global() -> &'static WeaponTable {
        static TABLE: OnceLock<WeaponTable> = OnceLock::new();
        TABLE.get_or_init(WeaponTable::builtin)
    }

    /// Build the stock configuration set
    pub fn builtin() -> Self {
        let mut configs = BTreeMap::new();
        let mut add = |id: &str, config: WeaponConfig| {
            configs.insert(id.to_string(), config);
        };

        add(
            BASIC_CONFIG,
            WeaponConfig::new(vec![CannonSpec::new(0.0, 0.0)], 1.0, 1.0, "Basic single cannon"),
        );
        add(
            "TWIN",
            WeaponConfig::new(
                vec![CannonSpec::new(0.0, -10.0), CannonSpec::new(0.0, 10.0)],
                0.8,
                1.0,
                "Two parallel cannons",
            ),
        );
        add(
            "TRIPLET",
            WeaponConfig::new(
                vec![
                    CannonSpec::new(0.0, -12.0),
                    CannonSpec::new(0.0, 0.0),
                    CannonSpec::new(0.0, 12.0),
                ],
                0.7,
                1.0,
                "Three parallel cannons",
            ),
        );
        add(
            "QUAD",
            WeaponConfig::new(
                (0..4).map(|i| CannonSpec::new(i as f32 * 90.0, 0.0)).collect(),
                0.6,
                1.0,
                "Four directional cannons",
            ),
        );
        add(
            "OCTO",
            WeaponConfig::new(
                (0..8).map(|i| CannonSpec::new(i as f32 * 45.0, 0.0)).collect(),
                0.5,
                1.2,
                "Eight directional cannons",
            ),
        );
        add(
            "PENTA_SHOT",
            WeaponConfig::new(
                vec![
                    CannonSpec::new(-30.0, -15.0),
                    CannonSpec::new(-15.0, -8.0),
                    CannonSpec::new(0.0, 0.0),
                    CannonSpec::new(15.0, 8.0),
                    CannonSpec::new(30.0, 15.0),
                ],
                0.65,
                0.9,
                "Five spread cannons",
            ),
        );
        add(
            "SNIPER",
            WeaponConfig {
                bullet_speed_bonus: Some(2.0),
                ..WeaponConfig::new(vec![CannonSpec::new(0.0, 0.0)], 2.25, 0.35, "High damage, slow fire")
            },
        );
        add(
            "MACHINE_GUN",
            WeaponConfig {
                spread: Some(0.15),
                ..WeaponConfig::new(vec![CannonSpec::new(0.0, 0.0)], 0.6, 2.0, "Fast fire, low accuracy")
            },
        );

        let basic = configs[BASIC_CONFIG].clone();
        Self { configs, basic }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a configuration, falling back to BASIC for unknown ids
    pub fn get(&self, id: &str) -> &WeaponConfig {
        self.configs.get(id).unwrap_or(&self.basic)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.configs.contains_key(id)
    }

    /// Configuration ids in stable order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}

/// Fire the craft's current configuration.
///
/// No-op while the weapon is cooling down. Otherwise emits one projectile per
/// cannon into `out`, resets the cooldown and returns how many were fired.
pub fn fire<R: Rng + ?Sized>(
    craft: &mut Craft,
    table: &WeaponTable,
    rng: &mut R,
    out: &mut Vec<Projectile>,
) -> usize {
    if craft.weapon_cooldown > 0.0 {
        return 0;
    }

    let config = table.get(&craft.weapon_config);
    let damage = craft.stats.projectile_damage() * (1.0 + config.damage_multiplier);
    let penetration = craft.stats.penetration();
    let speed = craft.stats.projectile_speed() * config.bullet_speed_bonus.unwrap_or(1.0);

    let forward = direction(craft.angle);
    let side = direction(craft.angle + FRAC_PI_2);
    let muzzle = craft.pos + forward * MUZZLE_OFFSET;

    for cannon in &config.cannons {
        let mut angle = craft.angle + cannon.angle_offset.to_radians();
        if let Some(spread) = config.spread.filter(|s| *s > 0.0) {
            angle += rng.random_range(-spread..=spread);
        }
        let pos = muzzle + side * cannon.lateral_offset;
        out.push(Projectile::new(pos, angle, speed, damage, penetration, Affiliation::Craft));
    }

    craft.weapon_cooldown = craft.reload_interval / config.reload_speed;
    config.cannons.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::craft::StatBlock;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_builtin_has_basic() {
        let table = WeaponTable::builtin();
        assert!(table.contains(BASIC_CONFIG));
        assert_eq!(table.get("NOPE"), table.get(BASIC_CONFIG));
        assert_eq!(table.ids().count(), 8);
    }

    #[test]
    fn test_fire_basic() {
        let table = WeaponTable::builtin();
        let mut craft = Craft::new(Vec2::new(100.0, 100.0));
        let mut out = Vec::new();

        assert_eq!(fire(&mut craft, &table, &mut rng(), &mut out), 1);
        let p = &out[0];
        // Muzzle 30 units ahead of the craft along facing (angle 0)
        assert!((p.pos - Vec2::new(130.0, 100.0)).length() < 1e-4);
        // (10 + 0) * (1 + 1.0)
        assert_eq!(p.damage, 20.0);
        assert_eq!(p.integrity, 10.0);
        assert!((p.vel - Vec2::new(10.0, 0.0)).length() < 1e-4);
        assert_eq!(craft.weapon_cooldown, 60.0);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let table = WeaponTable::builtin();
        let mut craft = Craft::new(Vec2::ZERO);
        let mut out = Vec::new();
        let mut rng = rng();

        assert_eq!(fire(&mut craft, &table, &mut rng, &mut out), 1);
        assert_eq!(fire(&mut craft, &table, &mut rng, &mut out), 0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_twin_lateral_offsets() {
        let table = WeaponTable::builtin();
        let mut craft = Craft::new(Vec2::ZERO);
        craft.weapon_config = "TWIN".to_string();
        let mut out = Vec::new();

        assert_eq!(fire(&mut craft, &table, &mut rng(), &mut out), 2);
        // Facing +x, perpendicular is +y
        assert!((out[0].pos - Vec2::new(30.0, -10.0)).length() < 1e-4);
        assert!((out[1].pos - Vec2::new(30.0, 10.0)).length() < 1e-4);
        assert!((out[0].damage - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_sniper_speed_and_reload() {
        let table = WeaponTable::builtin();
        let stats = StatBlock {
            bullet_speed: 2,
            bullet_penetration: 2,
            ..Default::default()
        };
        let mut craft = Craft::with_stats(Vec2::ZERO, stats);
        craft.weapon_config = "SNIPER".to_string();
        let mut out = Vec::new();

        fire(&mut craft, &table, &mut rng(), &mut out);
        // (10 + 2 * 1.5) * 2.0
        assert!((out[0].vel.length() - 26.0).abs() < 1e-3);
        assert_eq!(out[0].integrity, 30.0);
        assert!((craft.weapon_cooldown - 60.0 / 0.35).abs() < 1e-3);
    }

    #[test]
    fn test_machine_gun_spread_bounded() {
        let table = WeaponTable::builtin();
        let mut craft = Craft::new(Vec2::ZERO);
        craft.weapon_config = "MACHINE_GUN".to_string();
        let mut rng = rng();
        for _ in 0..50 {
            let mut out = Vec::new();
            craft.weapon_cooldown = 0.0;
            fire(&mut craft, &table, &mut rng, &mut out);
            let angle = out[0].vel.y.atan2(out[0].vel.x);
            assert!(angle.abs() <= 0.15 + 1e-5);
        }
    }

    #[test]
    fn test_quad_fires_every_direction() {
        let table = WeaponTable::builtin();
        let mut craft = Craft::new(Vec2::ZERO);
        craft.weapon_config = "QUAD".to_string();
        let mut out = Vec::new();

        fire(&mut craft, &table, &mut rng(), &mut out);
        let sum: Vec2 = out.iter().map(|p| p.vel).sum();
        assert!(sum.length() < 1e-3);
    }

    #[test]
    fn test_table_json_round_trip() {
        let table = WeaponTable::builtin();
        let json = table.to_json().unwrap();
        let restored = WeaponTable::from_json(&json).unwrap();
        assert_eq!(restored, table);
        assert_eq!(restored.get("SNIPER").bullet_speed_bonus, Some(2.0));
        assert_eq!(restored.get("MACHINE_GUN").spread, Some(0.15));
        assert_eq!(restored.get("PENTA_SHOT").cannons.len(), 5);
    }

    #[test]
    fn test_table_without_basic_rejected() {
        let json = r#"{ "TWIN": { "cannons": [], "damage_multiplier": 0.8, "reload_speed": 1.0 } }"#;
        assert!(WeaponTable::from_json(json).is_err());
    }
}
