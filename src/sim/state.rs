//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives in `GameState`. The session owns
//! it exclusively; renderers only see `Snapshot`s.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::craft::{Craft, StatBlock};
use super::hostile::{Archetype, Hostile};
use super::level::{LevelLayout, SpawnPoint, Wall};
use super::projectile::{Affiliation, Projectile};
use crate::difficulty_multiplier;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No level has been applied yet
    Loading,
    /// Per-tick pipeline runs
    Active,
    /// All hostiles cleared, waiting for the advance signal
    Complete,
    /// Interstitial before the next level is applied
    Transitioning { remaining: u32, next_index: u32 },
    /// Craft destroyed, waiting for retry or abort
    PlayerDied,
    /// Session ended by the player
    Aborted,
}

/// Events emitted during a tick or a lifecycle transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelLoaded { index: u32, name: String, hostiles: usize },
    LevelLoadFailed { index: u32, reason: String },
    LevelComplete { index: u32 },
    HostileKilled { id: u32, archetype: Archetype, xp: u32 },
    CraftLevelUp { level: u32 },
    CraftDamaged { amount: f32, health: f32 },
    CraftDestroyed,
    ShieldRaised { id: u32 },
    ShieldDropped { id: u32 },
    MinionSpawned { summoner: u32, id: u32 },
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Current level (1-based; 0 before the first load)
    pub level_index: u32,
    pub level_name: String,
    pub difficulty: f32,
    pub world_size: Vec2,
    pub walls: Vec<Wall>,
    pub craft_spawn: Vec2,
    pub hostile_spawns: Vec<SpawnPoint>,
    pub craft: Craft,
    /// Live hostiles (ascending id)
    pub hostiles: Vec<Hostile>,
    pub projectiles: Vec<Projectile>,
    /// Hostiles spawned by the level itself at load
    pub initial_hostile_count: usize,
    /// Set once per level when the last hostile dies
    pub level_complete: bool,
    /// Events since the last drain. Hosts that never drain still see a
    /// bounded list: `Session::step` keeps only the newest `EVENT_BACKLOG`.
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create an empty state with the given seed. No level is loaded.
    pub fn new(seed: u64) -> Self {
        Self::with_craft(seed, Craft::new(Vec2::ZERO))
    }

    pub fn with_stats(seed: u64, stats: StatBlock) -> Self {
        Self::with_craft(seed, Craft::with_stats(Vec2::ZERO, stats))
    }

    fn with_craft(seed: u64, craft: Craft) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: GamePhase::Loading,
            level_index: 0,
            level_name: String::new(),
            difficulty: 1.0,
            world_size: Vec2::ZERO,
            walls: Vec::new(),
            craft_spawn: Vec2::ZERO,
            hostile_spawns: Vec::new(),
            craft,
            hostiles: Vec::new(),
            projectiles: Vec::new(),
            initial_hostile_count: 0,
            level_complete: false,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Apply a loaded layout and start the level.
    ///
    /// The craft keeps its stats, level and health; only its position moves
    /// to the level spawn.
    pub fn apply_layout(&mut self, index: u32, layout: LevelLayout) {
        self.level_index = index;
        self.difficulty = difficulty_multiplier(index);
        self.level_name = layout.name;
        self.world_size = layout.world_size;
        self.walls = layout.walls;
        self.craft_spawn = layout.craft_spawn;
        self.hostile_spawns = layout.hostile_spawns;

        self.craft.pos = self.craft_spawn;
        self.projectiles.clear();
        self.populate_level();

        log::info!(
            "Level {} '{}' loaded: {} hostiles, {} walls, difficulty {:.1}",
            index,
            self.level_name,
            self.initial_hostile_count,
            self.walls.len(),
            self.difficulty
        );
        if let Some(boss) = self.hostiles.iter().find(|h| h.archetype.is_boss()) {
            log::info!("Level {} boss: {:?} (id {})", index, boss.archetype, boss.id);
        }
        if self.initial_hostile_count == 0 {
            log::warn!("Level {} has no hostiles and can never complete", index);
        }
        self.events.push(GameEvent::LevelLoaded {
            index,
            name: self.level_name.clone(),
            hostiles: self.initial_hostile_count,
        });
    }

    /// Respawn the current level's hostiles and return to Active
    pub fn populate_level(&mut self) {
        self.hostiles.clear();
        let spawns = self.hostile_spawns.clone();
        for spawn in spawns {
            let archetype = spawn.archetype.unwrap_or_else(|| self.random_archetype());
            let id = self.next_entity_id();
            self.hostiles
                .push(Hostile::new(id, archetype, spawn.pos, self.difficulty));
        }
        self.initial_hostile_count = self.hostiles.len();
        self.level_complete = false;
        self.phase = GamePhase::Active;
    }

    /// Pick a regular archetype with the session RNG
    pub fn random_archetype(&mut self) -> Archetype {
        let i = self.rng.random_range(0..Archetype::REGULAR.len());
        Archetype::REGULAR[i]
    }

    /// Summon a Charger for a boss. Minions start engaged and do not count
    /// toward the level's initial hostile count.
    pub fn spawn_minion(&mut self, summoner: u32, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let mut minion = Hostile::new(id, Archetype::Charger, pos, self.difficulty);
        minion.summoner = Some(summoner);
        minion.aggroed = true;
        self.hostiles.push(minion);
        self.events.push(GameEvent::MinionSpawned { summoner, id });
        log::debug!("Hostile {} summoned minion {}", summoner, id);
        id
    }

    /// Live minions belonging to a summoner
    pub fn live_minions(&self, summoner: u32) -> usize {
        self.hostiles
            .iter()
            .filter(|h| h.summoner == Some(summoner))
            .count()
    }

    /// Reset after death: full health at the spawn point, fresh hostiles,
    /// no projectiles in flight.
    pub fn reset_for_retry(&mut self) {
        self.craft.respawn(self.craft_spawn, self.time_ticks);
        self.projectiles.clear();
        self.populate_level();
    }

    pub fn remaining_hostiles(&self) -> usize {
        self.hostiles.len()
    }

    /// Read-only view for renderers and UI
    pub fn snapshot(&self) -> Snapshot {
        let craft = &self.craft;
        Snapshot {
            tick: self.time_ticks,
            phase: self.phase,
            level_index: self.level_index,
            level_name: self.level_name.clone(),
            world_size: self.world_size,
            walls: self.walls.clone(),
            craft: CraftView {
                pos: craft.pos,
                angle: craft.angle,
                health: craft.health,
                max_health: craft.max_health,
                level: craft.level,
                xp: craft.xp,
                xp_to_next_level: craft.xp_to_next_level,
                skill_points: craft.skill_points,
                weapon_config: craft.weapon_config.clone(),
                stats: craft.stats,
            },
            hostiles: self
                .hostiles
                .iter()
                .map(|h| HostileView {
                    id: h.id,
                    pos: h.pos,
                    angle: h.angle,
                    health: h.health,
                    max_health: h.max_health,
                    archetype: h.archetype,
                    aggroed: h.aggroed,
                    shielded: h.is_shielded(),
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    pos: p.pos,
                    affiliation: p.affiliation,
                    integrity_ratio: p.integrity_ratio(),
                })
                .collect(),
            level_complete: self.level_complete,
            initial_hostile_count: self.initial_hostile_count,
            remaining_hostiles: self.remaining_hostiles(),
        }
    }
}

/// Craft as seen by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftView {
    pub pos: Vec2,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub skill_points: u32,
    pub weapon_config: String,
    pub stats: StatBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostileView {
    pub id: u32,
    pub pos: Vec2,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub archetype: Archetype,
    pub aggroed: bool,
    pub shielded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub affiliation: Affiliation,
    pub integrity_ratio: f32,
}

/// Per-tick read-only view of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub level_index: u32,
    pub level_name: String,
    pub world_size: Vec2,
    pub walls: Vec<Wall>,
    pub craft: CraftView,
    pub hostiles: Vec<HostileView>,
    pub projectiles: Vec<ProjectileView>,
    pub level_complete: bool,
    pub initial_hostile_count: usize,
    pub remaining_hostiles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::grid_from_rows;

    fn layout() -> LevelLayout {
        let grid = grid_from_rows(&[
            "..........",
            ".P......E.",
            "..........",
            "....E...S.",
        ]);
        LevelLayout::from_grid("test", &grid, 50.0).unwrap()
    }

    #[test]
    fn test_apply_layout_spawns_hostiles() {
        let mut state = GameState::new(7);
        state.apply_layout(2, layout());
        assert_eq!(state.phase, GamePhase::Active);
        assert_eq!(state.initial_hostile_count, 3);
        assert_eq!(state.craft.pos, Vec2::new(75.0, 75.0));
        assert!((state.difficulty - 1.2).abs() < 1e-6);
        assert_eq!(state.hostiles[2].archetype, Archetype::Overseer);
        assert!((state.hostiles[2].max_health - 720.0).abs() < 1e-3);
        assert!(matches!(
            state.events.last(),
            Some(GameEvent::LevelLoaded { index: 2, hostiles: 3, .. })
        ));
    }

    #[test]
    fn test_random_archetypes_follow_seed() {
        let mut a = GameState::new(99);
        let mut b = GameState::new(99);
        a.apply_layout(1, layout());
        b.apply_layout(1, layout());
        let kinds = |s: &GameState| s.hostiles.iter().map(|h| h.archetype).collect::<Vec<_>>();
        assert_eq!(kinds(&a), kinds(&b));
        assert!(kinds(&a)[..2].iter().all(|k| Archetype::REGULAR.contains(k)));
    }

    #[test]
    fn test_ids_unique_across_reloads() {
        let mut state = GameState::new(1);
        state.apply_layout(1, layout());
        let first: Vec<u32> = state.hostiles.iter().map(|h| h.id).collect();
        state.reset_for_retry();
        assert!(state.hostiles.iter().all(|h| !first.contains(&h.id)));
    }

    #[test]
    fn test_minions_are_tracked_per_summoner() {
        let mut state = GameState::new(1);
        state.apply_layout(1, layout());
        let boss = state.hostiles[2].id;
        state.spawn_minion(boss, Vec2::new(100.0, 100.0));
        state.spawn_minion(boss, Vec2::new(120.0, 100.0));
        assert_eq!(state.live_minions(boss), 2);
        assert_eq!(state.initial_hostile_count, 3);
        assert_eq!(state.remaining_hostiles(), 5);
    }

    #[test]
    fn test_retry_restores_health_and_clears_projectiles() {
        let mut state = GameState::new(1);
        state.apply_layout(1, layout());
        state.craft.pos = Vec2::new(300.0, 100.0);
        state.craft.apply_damage(60.0, 0);
        state.projectiles.push(Projectile::new(Vec2::ZERO, 0.0, 1.0, 1.0, 1, Affiliation::Craft));
        state.hostiles.clear();
        state.level_complete = true;

        state.reset_for_retry();
        assert_eq!(state.craft.health, state.craft.max_health);
        assert_eq!(state.craft.pos, state.craft_spawn);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.hostiles.len(), 3);
        assert!(!state.level_complete);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::new(3);
        state.apply_layout(1, layout());
        let snap = state.snapshot();
        assert_eq!(snap.remaining_hostiles, 3);
        assert_eq!(snap.craft.weapon_config, "BASIC");
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
