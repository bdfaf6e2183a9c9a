//! Hostiles: archetypes, aggro state machine and behaviour policies
//!
//! Each archetype maps to a stat profile plus one movement policy and one
//! attack policy, chosen when the hostile is created. The per-tick update
//! only dispatches to those policies, so a new archetype is a new profile
//! row rather than another branch in the update.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::projectile::{Affiliation, Projectile};
use crate::{angle_to, direction};

/// Hostiles fire only when the craft is closer than this
pub const FIRING_RANGE: f32 = 500.0;
/// Idle rotation per tick while not engaged (radians)
pub const IDLE_DRIFT: f32 = 0.02;
/// Fraction of incoming damage removed while a shield is up
pub const SHIELD_MITIGATION: f32 = 0.9;

/// Named hostile profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Melee rusher, never fires
    Charger,
    /// Mostly stationary, single shots
    Turret,
    /// Keeps a distance band, fires a fan
    Gunner,
    /// Boss: shielded, summons chargers
    Overseer,
}

impl Archetype {
    /// Archetypes that can appear at an ordinary enemy spawn point
    pub const REGULAR: [Archetype; 3] = [Archetype::Turret, Archetype::Charger, Archetype::Gunner];

    pub fn is_boss(&self) -> bool {
        matches!(self, Archetype::Overseer)
    }

    pub fn profile(&self) -> Profile {
        match self {
            Archetype::Charger => Profile {
                max_health: 30.0,
                speed: 3.0,
                shot_interval: 0,
                xp_value: 25,
                aggro_enter: 250.0,
                aggro_exit: 500.0,
                radius: 30.0,
                movement: MovementPolicy::Charge,
                attack: AttackPolicy::None,
                shield: None,
                summon: None,
            },
            Archetype::Turret => Profile {
                max_health: 80.0,
                speed: 0.5,
                shot_interval: 90,
                xp_value: 15,
                aggro_enter: 350.0,
                aggro_exit: 500.0,
                radius: 30.0,
                movement: MovementPolicy::Anchor {
                    advance_beyond: 400.0,
                    creep: 0.3,
                },
                attack: AttackPolicy::Single {
                    speed: 8.0,
                    damage: 10.0,
                    penetration: 3,
                },
                shield: None,
                summon: None,
            },
            Archetype::Gunner => Profile {
                max_health: 100.0,
                speed: 1.5,
                shot_interval: 45,
                xp_value: 50,
                aggro_enter: 400.0,
                aggro_exit: 500.0,
                radius: 30.0,
                movement: MovementPolicy::HoldBand {
                    min: 300.0,
                    max: 400.0,
                },
                attack: AttackPolicy::Fan {
                    count: 5,
                    step: 0.3,
                    speed: 7.0,
                    damage: 8.0,
                    penetration: 2,
                },
                shield: None,
                summon: None,
            },
            Archetype::Overseer => Profile {
                max_health: 600.0,
                speed: 1.0,
                shot_interval: 60,
                xp_value: 200,
                aggro_enter: 450.0,
                aggro_exit: 700.0,
                radius: 50.0,
                movement: MovementPolicy::HoldBand {
                    min: 250.0,
                    max: 450.0,
                },
                attack: AttackPolicy::Fan {
                    count: 5,
                    step: 0.3,
                    speed: 7.0,
                    damage: 12.0,
                    penetration: 3,
                },
                shield: Some(Shield::new(600, 180)),
                summon: Some(Summoner::new(480, 4)),
            },
        }
    }
}

/// Static numbers for an archetype
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub max_health: f32,
    pub speed: f32,
    /// Ticks between volleys; 0 means the archetype never fires
    pub shot_interval: u32,
    pub xp_value: u32,
    pub aggro_enter: f32,
    pub aggro_exit: f32,
    pub radius: f32,
    pub movement: MovementPolicy,
    pub attack: AttackPolicy,
    pub shield: Option<Shield>,
    pub summon: Option<Summoner>,
}

/// How an engaged hostile moves relative to the craft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementPolicy {
    /// Close distance at full speed
    Charge,
    /// Hold position; creep forward at `creep × speed` beyond `advance_beyond`
    Anchor { advance_beyond: f32, creep: f32 },
    /// Retreat inside `min`, advance beyond `max`, hold otherwise
    HoldBand { min: f32, max: f32 },
}

impl MovementPolicy {
    /// Displacement for one tick. `toward` is the unit vector to the craft.
    pub fn step(&self, toward: Vec2, distance: f32, speed: f32) -> Vec2 {
        match *self {
            MovementPolicy::Charge => toward * speed,
            MovementPolicy::Anchor {
                advance_beyond,
                creep,
            } => {
                if distance > advance_beyond {
                    toward * speed * creep
                } else {
                    Vec2::ZERO
                }
            }
            MovementPolicy::HoldBand { min, max } => {
                if distance < min {
                    -toward * speed
                } else if distance > max {
                    toward * speed
                } else {
                    Vec2::ZERO
                }
            }
        }
    }
}

/// What an engaged hostile fires when its cooldown expires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackPolicy {
    None,
    Single {
        speed: f32,
        damage: f32,
        penetration: u32,
    },
    /// Symmetric fan of `count` shots spaced `step` radians apart
    Fan {
        count: u32,
        step: f32,
        speed: f32,
        damage: f32,
        penetration: u32,
    },
}

impl AttackPolicy {
    /// Emit one volley from `pos` along `angle`, damage scaled by `difficulty`
    pub fn volley(&self, pos: Vec2, angle: f32, difficulty: f32, out: &mut Vec<Projectile>) -> usize {
        match *self {
            AttackPolicy::None => 0,
            AttackPolicy::Single {
                speed,
                damage,
                penetration,
            } => {
                out.push(Projectile::new(
                    pos,
                    angle,
                    speed,
                    damage * difficulty,
                    penetration,
                    Affiliation::Hostile,
                ));
                1
            }
            AttackPolicy::Fan {
                count,
                step,
                speed,
                damage,
                penetration,
            } => {
                let half = (count as f32 - 1.0) / 2.0;
                for i in 0..count {
                    let offset = (i as f32 - half) * step;
                    out.push(Projectile::new(
                        pos,
                        angle + offset,
                        speed,
                        damage * difficulty,
                        penetration,
                        Affiliation::Hostile,
                    ));
                }
                count as usize
            }
        }
    }
}

/// Boss shield cycle: cooldown → active for a fixed duration → cooldown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub active: bool,
    /// Ticks left while active
    pub remaining: u32,
    /// Ticks left until the next activation
    pub cooldown: u32,
    pub duration: u32,
    pub interval: u32,
}

impl Shield {
    pub fn new(interval: u32, duration: u32) -> Self {
        Self {
            active: false,
            remaining: 0,
            cooldown: interval,
            duration,
            interval,
        }
    }

    /// Advance one tick. Returns `Some(active)` when the shield toggles.
    pub fn tick(&mut self) -> Option<bool> {
        if self.active {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.active = false;
                self.cooldown = self.interval;
                return Some(false);
            }
        } else {
            self.cooldown = self.cooldown.saturating_sub(1);
            if self.cooldown == 0 {
                self.active = true;
                self.remaining = self.duration;
                return Some(true);
            }
        }
        None
    }
}

/// Periodic minion summoning for bosses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summoner {
    pub interval: u32,
    pub countdown: u32,
    /// Live minion cap for this summoner
    pub max_live: usize,
}

impl Summoner {
    pub fn new(interval: u32, max_live: usize) -> Self {
        Self {
            interval,
            countdown: interval,
            max_live,
        }
    }
}

/// Side effects of a hostile update that the world has to carry out
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostileUpdate {
    /// The hostile wants to summon a minion
    pub summon: bool,
    /// Shield toggled to this state
    pub shield_toggled: Option<bool>,
}

/// An AI-controlled adversary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostile {
    pub id: u32,
    pub archetype: Archetype,
    pub pos: Vec2,
    /// Facing angle (radians)
    pub angle: f32,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    /// Ticks until the next volley
    pub shot_cooldown: u32,
    pub shot_interval: u32,
    pub xp_value: u32,
    pub aggroed: bool,
    pub aggro_enter: f32,
    pub aggro_exit: f32,
    /// Level scaling applied to health at creation and to damage dealt
    pub difficulty: f32,
    /// Tick of the last contact damage this hostile dealt
    pub last_contact_tick: Option<u64>,
    pub movement: MovementPolicy,
    pub attack: AttackPolicy,
    pub shield: Option<Shield>,
    pub summon: Option<Summoner>,
    /// Boss that summoned this hostile, if any
    pub summoner: Option<u32>,
}

impl Hostile {
    pub fn new(id: u32, archetype: Archetype, pos: Vec2, difficulty: f32) -> Self {
        let profile = archetype.profile();
        debug_assert!(profile.max_health > 0.0);
        debug_assert!(profile.aggro_exit >= profile.aggro_enter);

        let max_health = profile.max_health * difficulty;
        Self {
            id,
            archetype,
            pos,
            angle: 0.0,
            radius: profile.radius,
            health: max_health,
            max_health,
            speed: profile.speed,
            shot_cooldown: profile.shot_interval,
            shot_interval: profile.shot_interval,
            xp_value: profile.xp_value,
            aggroed: false,
            aggro_enter: profile.aggro_enter,
            aggro_exit: profile.aggro_exit,
            difficulty,
            last_contact_tick: None,
            movement: profile.movement,
            attack: profile.attack,
            shield: profile.shield,
            summon: profile.summon,
            summoner: None,
        }
    }

    /// Per-tick self update.
    ///
    /// Runs the aggro hysteresis, then either the engaged behaviour (face,
    /// move, count down, fire) or the idle drift. Shields tick regardless of
    /// aggro. Projectiles are pushed into `out`.
    pub fn update(&mut self, craft_pos: Vec2, out: &mut Vec<Projectile>) -> HostileUpdate {
        let mut result = HostileUpdate::default();

        if let Some(shield) = self.shield.as_mut() {
            result.shield_toggled = shield.tick();
        }

        let offset = craft_pos - self.pos;
        let distance = offset.length();

        if !self.aggroed {
            if distance <= self.aggro_enter {
                self.aggroed = true;
            }
        } else if distance > self.aggro_exit {
            self.aggroed = false;
        }

        if self.aggroed && distance > 0.0 {
            self.angle = angle_to(self.pos, craft_pos);
            let toward = offset / distance;
            self.pos += self.movement.step(toward, distance, self.speed);

            self.shot_cooldown = self.shot_cooldown.saturating_sub(1);
            if self.shot_cooldown == 0 && self.shot_interval > 0 && distance < FIRING_RANGE {
                self.attack.volley(self.pos, self.angle, self.difficulty, out);
                self.shot_cooldown = self.shot_interval;
            }

            if let Some(summon) = self.summon.as_mut() {
                summon.countdown = summon.countdown.saturating_sub(1);
                if summon.countdown == 0 {
                    summon.countdown = summon.interval;
                    result.summon = true;
                }
            }
        } else {
            self.angle += IDLE_DRIFT;
        }

        result
    }

    /// Damage intake for projectile and body hits.
    ///
    /// Applies shield mitigation, clamps at zero and forces aggro.
    /// Returns the damage actually applied.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = if self.is_shielded() {
            amount * (1.0 - SHIELD_MITIGATION)
        } else {
            amount
        };
        self.health = (self.health - applied).max(0.0);
        self.aggroed = true;
        applied
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_shielded(&self) -> bool {
        self.shield.is_some_and(|s| s.active)
    }

    /// Bounding box used for wall collision
    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }

    /// Spawn position for a summoned minion, just in front of this hostile
    pub fn minion_spawn_point(&self) -> Vec2 {
        self.pos + direction(self.angle) * (self.radius + 40.0)
    }

    /// Whether contact damage is allowed again at tick `now`
    pub fn contact_ready(&self, now: u64, cooldown: u32) -> bool {
        self.last_contact_tick
            .is_none_or(|last| now.saturating_sub(last) >= cooldown as u64)
    }
}
