//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::collision::{
    clamp_to_world, cull_projectiles, hits_wall, remove_dead_hostiles, resolve_contact,
    resolve_craft_projectiles, resolve_craft_walls, resolve_hostile_projectiles,
    resolve_hostile_walls, separate_hostiles,
};
use super::geometry::Rect;
use super::hostile::Archetype;
use super::state::{GameEvent, GamePhase, GameState};
use super::weapons::{WeaponTable, fire};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement axes; each component is read as -1, 0 or 1
    pub movement: Vec2,
    /// World point to face, if any
    pub aim: Option<Vec2>,
    /// Fire this tick
    pub fire: bool,
}

/// What happened to the session during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing ran (no level loaded, dead, transitioning or aborted)
    Idle,
    Running,
    /// The last hostile died this tick
    LevelComplete,
    /// The craft was destroyed; the rest of the tick was skipped
    CraftDestroyed,
}

/// Advance the game state by one fixed timestep.
///
/// Runs while a level is Active or Complete. The pass order is fixed:
/// craft movement and walls, firing, projectiles and walls, hostiles and
/// walls, contact, hostile separation, craft projectiles, hostile
/// projectiles, then the completion check.
pub fn tick(state: &mut GameState, input: &TickInput, weapons: &WeaponTable) -> TickOutcome {
    if !matches!(state.phase, GamePhase::Active | GamePhase::Complete) {
        return TickOutcome::Idle;
    }

    state.time_ticks += 1;
    let now = state.time_ticks;

    let prev = state.craft.pos;
    state.craft.update(input.movement, input.aim, now);
    resolve_craft_walls(state, prev);

    if input.fire {
        fire(&mut state.craft, weapons, &mut state.rng, &mut state.projectiles);
    }

    for projectile in &mut state.projectiles {
        projectile.update();
    }
    cull_projectiles(state);

    update_hostiles(state);

    if resolve_contact(state) {
        return destroy_craft(state);
    }
    // Body damage can kill on contact
    remove_dead_hostiles(state);

    separate_hostiles(state);

    resolve_craft_projectiles(state);
    remove_dead_hostiles(state);

    if resolve_hostile_projectiles(state) {
        return destroy_craft(state);
    }

    check_completion(state)
}

/// Hostile self-update, wall resolution, then any minion summons
fn update_hostiles(state: &mut GameState) {
    let craft_pos = state.craft.pos;
    let prev: Vec<Vec2> = state.hostiles.iter().map(|h| h.pos).collect();
    let mut summons = Vec::new();

    for hostile in &mut state.hostiles {
        let result = hostile.update(craft_pos, &mut state.projectiles);
        match result.shield_toggled {
            Some(true) => {
                log::debug!("Hostile {} shield up", hostile.id);
                state.events.push(GameEvent::ShieldRaised { id: hostile.id });
            }
            Some(false) => {
                log::debug!("Hostile {} shield down", hostile.id);
                state.events.push(GameEvent::ShieldDropped { id: hostile.id });
            }
            None => {}
        }
        if result.summon {
            let max_live = hostile.summon.map_or(0, |s| s.max_live);
            summons.push((hostile.id, hostile.pos, hostile.minion_spawn_point(), max_live));
        }
    }

    resolve_hostile_walls(state, &prev);

    let minion_radius = Archetype::Charger.profile().radius;
    for (summoner, summoner_pos, spawn, max_live) in summons {
        if state.live_minions(summoner) >= max_live {
            continue;
        }
        let mut pos = clamp_to_world(spawn, minion_radius, state.world_size);
        if hits_wall(&state.walls, &Rect::around(pos, minion_radius), |k| k.blocks_hostiles()) {
            pos = summoner_pos;
        }
        state.spawn_minion(summoner, pos);
    }
}

/// Death path: health is already clamped at zero by the damage intake
fn destroy_craft(state: &mut GameState) -> TickOutcome {
    state.phase = GamePhase::PlayerDied;
    state.events.push(GameEvent::CraftDestroyed);
    log::info!(
        "Craft destroyed on level {} at tick {}",
        state.level_index,
        state.time_ticks
    );
    TickOutcome::CraftDestroyed
}

/// One-shot completion: fires only the first time the level's hostiles are
/// all gone
fn check_completion(state: &mut GameState) -> TickOutcome {
    if state.level_complete || state.initial_hostile_count == 0 || !state.hostiles.is_empty() {
        return TickOutcome::Running;
    }
    state.level_complete = true;
    state.phase = GamePhase::Complete;
    state.events.push(GameEvent::LevelComplete {
        index: state.level_index,
    });
    log::info!("Level {} complete", state.level_index);
    TickOutcome::LevelComplete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::hostile::Hostile;
    use crate::sim::level::{LevelLayout, Wall, WallKind, grid_from_rows};
    use crate::sim::projectile::{Affiliation, Projectile};

    /// 2000x2000 open arena with the craft at (1000, 1000) and no hostiles
    fn arena() -> GameState {
        let row = ".".repeat(40);
        let rows: Vec<&str> = (0..40).map(|_| row.as_str()).collect();
        let layout = LevelLayout::from_grid("arena", &grid_from_rows(&rows), 50.0).unwrap();
        let mut state = GameState::new(42);
        state.apply_layout(0, layout);
        state.events.clear();
        state
    }

    fn add_hostile(state: &mut GameState, archetype: Archetype, pos: Vec2) -> u32 {
        let id = state.next_entity_id();
        state
            .hostiles
            .push(Hostile::new(id, archetype, pos, state.difficulty));
        state.initial_hostile_count = state.hostiles.len();
        id
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn table() -> WeaponTable {
        WeaponTable::builtin()
    }

    #[test]
    fn test_idle_outside_active_phases() {
        let mut state = GameState::new(1);
        assert_eq!(tick(&mut state, &idle(), &table()), TickOutcome::Idle);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_craft_spawned_against_wall_can_leave() {
        let grid = grid_from_rows(&["......", ".#P...", "......"]);
        let layout = LevelLayout::from_grid("nook", &grid, 50.0).unwrap();
        let mut state = GameState::new(3);
        state.apply_layout(1, layout);
        let weapons = table();
        let spawn = state.craft.pos;
        assert!(hits_wall(&state.walls, &state.craft.bounds(), |k| k.blocks_craft()));

        let toward = TickInput {
            movement: Vec2::NEG_X,
            ..idle()
        };
        tick(&mut state, &toward, &weapons);
        assert_eq!(state.craft.pos, spawn);

        let away = TickInput {
            movement: Vec2::X,
            ..idle()
        };
        for _ in 0..30 {
            tick(&mut state, &away, &weapons);
        }
        assert!(state.craft.pos.x > spawn.x + 60.0);
        assert!(!hits_wall(&state.walls, &state.craft.bounds(), |k| k.blocks_craft()));
    }

    #[test]
    fn test_hostile_spawned_against_wall_can_leave() {
        let mut state = arena();
        let weapons = table();
        state.walls.push(Wall {
            rect: Rect::new(1100.0, 900.0, 50.0, 200.0),
            kind: WallKind::Solid,
        });
        state.craft.pos = Vec2::new(1400.0, 1000.0);
        add_hostile(&mut state, Archetype::Charger, Vec2::new(1170.0, 1000.0));
        assert!(hits_wall(&state.walls, &state.hostiles[0].bounds(), |k| k.blocks_hostiles()));

        for _ in 0..10 {
            tick(&mut state, &idle(), &weapons);
        }
        let charger = &state.hostiles[0];
        assert!(charger.aggroed);
        assert!(charger.pos.x > 1170.0);
        assert!(!hits_wall(&state.walls, &charger.bounds(), |k| k.blocks_hostiles()));
    }

    #[test]
    fn test_hostile_shoved_into_wall_keeps_chasing() {
        let mut state = arena();
        let weapons = table();
        state.walls.push(Wall {
            rect: Rect::new(1080.0, 900.0, 50.0, 200.0),
            kind: WallKind::Solid,
        });
        add_hostile(&mut state, Archetype::Charger, Vec2::new(1040.0, 1000.0));

        let retreat = TickInput {
            movement: Vec2::NEG_X,
            ..idle()
        };
        tick(&mut state, &retreat, &weapons);
        // Contact pushed the charger into the wall
        assert!(hits_wall(&state.walls, &state.hostiles[0].bounds(), |k| k.blocks_hostiles()));

        for _ in 0..59 {
            tick(&mut state, &retreat, &weapons);
        }
        assert_eq!(state.craft.pos, Vec2::new(820.0, 1000.0));
        let charger = &state.hostiles[0];
        assert!(charger.pos.x < 900.0);
        assert!(!hits_wall(&state.walls, &charger.bounds(), |k| k.blocks_hostiles()));
    }

    #[test]
    fn test_turret_wakes_when_craft_approaches() {
        let mut state = arena();
        let weapons = table();
        state.craft.pos = Vec2::new(100.0, 1000.0);
        add_hostile(&mut state, Archetype::Turret, Vec2::new(1100.0, 1000.0));

        for _ in 0..10 {
            tick(&mut state, &idle(), &weapons);
        }
        let turret = &state.hostiles[0];
        assert_eq!(turret.pos, Vec2::new(1100.0, 1000.0));
        assert!(!turret.aggroed);
        assert_eq!(turret.shot_cooldown, 90);
        assert!(state.projectiles.is_empty());

        state.craft.pos = Vec2::new(800.0, 1000.0);
        tick(&mut state, &idle(), &weapons);
        let turret = &state.hostiles[0];
        assert!(turret.aggroed);
        assert_eq!(turret.shot_cooldown, 89);
    }

    #[test]
    fn test_projectile_removed_on_second_hit() {
        let mut state = arena();
        let weapons = table();
        state.craft.pos = Vec2::new(100.0, 100.0);
        add_hostile(&mut state, Archetype::Gunner, Vec2::new(1500.0, 1500.0));
        state.projectiles.push(Projectile::new(
            Vec2::new(1500.0, 1500.0),
            0.0,
            0.0,
            10.0,
            3,
            Affiliation::Craft,
        ));

        tick(&mut state, &idle(), &weapons);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].integrity, 10.0);
        assert_eq!(state.hostiles[0].health, 90.0);

        tick(&mut state, &idle(), &weapons);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.hostiles[0].health, 80.0);
    }

    #[test]
    fn test_level_completes_exactly_once() {
        let mut state = arena();
        let weapons = table();
        state.craft.pos = Vec2::new(100.0, 100.0);
        for i in 0..5 {
            add_hostile(&mut state, Archetype::Charger, Vec2::new(1200.0 + 100.0 * i as f32, 1800.0));
        }
        assert_eq!(state.initial_hostile_count, 5);

        for h in &mut state.hostiles {
            h.health = 0.0;
        }
        assert_eq!(tick(&mut state, &idle(), &weapons), TickOutcome::LevelComplete);
        assert!(state.level_complete);
        assert_eq!(state.phase, GamePhase::Complete);

        // A late minion dying afterwards does not complete the level again
        let boss = 999;
        state.spawn_minion(boss, Vec2::new(1500.0, 1500.0));
        state.hostiles[0].health = 0.0;
        assert_eq!(tick(&mut state, &idle(), &weapons), TickOutcome::Running);
        assert!(state.level_complete);

        let completions = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelComplete { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_contact_death_skips_rest_of_tick() {
        let mut state = arena();
        let weapons = table();
        state.craft.health = 5.0;
        add_hostile(&mut state, Archetype::Charger, Vec2::new(1040.0, 1000.0));
        state.projectiles.push(Projectile::new(
            Vec2::new(1000.0, 1000.0),
            0.0,
            0.0,
            50.0,
            1,
            Affiliation::Hostile,
        ));

        assert_eq!(tick(&mut state, &idle(), &weapons), TickOutcome::CraftDestroyed);
        assert_eq!(state.craft.health, 0.0);
        assert_eq!(state.phase, GamePhase::PlayerDied);
        // The hostile projectile pass never ran
        assert_eq!(state.projectiles.len(), 1);

        assert_eq!(tick(&mut state, &idle(), &weapons), TickOutcome::Idle);
        let deaths = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::CraftDestroyed))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_wall_collision_reverts_craft() {
        let mut state = arena();
        let weapons = table();
        state.walls.push(Wall {
            rect: Rect::new(1036.0, 900.0, 50.0, 200.0),
            kind: WallKind::Solid,
        });
        let start = state.craft.pos;
        let input = TickInput {
            movement: Vec2::new(1.0, 0.0),
            ..Default::default()
        };
        tick(&mut state, &input, &weapons);
        assert_eq!(state.craft.pos, start);
    }

    #[test]
    fn test_fire_twice_within_cooldown_is_one_volley() {
        let mut state = arena();
        let weapons = table();
        add_hostile(&mut state, Archetype::Charger, Vec2::new(1900.0, 1900.0));
        let input = TickInput {
            fire: true,
            aim: Some(Vec2::new(1000.0, 0.0)),
            ..Default::default()
        };
        tick(&mut state, &input, &weapons);
        tick(&mut state, &input, &weapons);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].affiliation, Affiliation::Craft);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut state = arena();
            let weapons = table();
            add_hostile(&mut state, Archetype::Gunner, Vec2::new(1300.0, 1000.0));
            add_hostile(&mut state, Archetype::Turret, Vec2::new(700.0, 1000.0));
            state.craft.weapon_config = "MACHINE_GUN".to_string();
            for i in 0..240 {
                let input = TickInput {
                    movement: Vec2::new(if i % 60 < 30 { 1.0 } else { -1.0 }, 0.0),
                    aim: Some(Vec2::new(1300.0, 1000.0)),
                    fire: true,
                };
                tick(&mut state, &input, &weapons);
            }
            state.snapshot()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_boss_summons_minions() {
        let mut state = arena();
        let weapons = table();
        state.craft.health = 1.0e9;
        state.craft.max_health = 1.0e9;
        let boss = add_hostile(&mut state, Archetype::Overseer, Vec2::new(1350.0, 1000.0));

        for _ in 0..480 {
            tick(&mut state, &idle(), &weapons);
        }
        assert_eq!(state.live_minions(boss), 1);
        assert_eq!(state.initial_hostile_count, 1);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::MinionSpawned { .. })));
    }
}
