//! Nano Drone entry point
//!
//! Runs a headless session: loads settings, builds the level source, then
//! drives the craft with a simple autopilot for a fixed tick budget.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use glam::Vec2;
    use nano_drone::Settings;
    use nano_drone::consts::*;
    use nano_drone::sim::{
        GameEvent, GamePhase, GameState, LevelLayout, LevelSet, LevelSource, Session, StatKind,
        TickOutcome,
    };
    use nano_drone::sim::level::grid_from_rows;

    /// Ten simulated minutes
    const TICK_BUDGET: u64 = 10 * 60 * TICK_RATE as u64;
    const RETRIES: u32 = 1;
    /// Distance the autopilot tries to keep from its target
    const STANDOFF: f32 = 260.0;

    const ARENA_1: &[&str] = &[
        "........................",
        ".P......................",
        "..........####..........",
        "..........####.....E....",
        "...E....................",
        "...............BBBB.....",
        "........E...............",
        "........................",
    ];

    const ARENA_2: &[&str] = &[
        "..............................",
        ".P.........#..................",
        "...........#.......E..........",
        "...........#..................",
        "....E..........######.....E...",
        "..............................",
        "........BBBBBB........E.......",
        "..................S...........",
        "..............................",
    ];

    fn built_in_levels(settings: &Settings) -> LevelSet {
        let tile = settings.tile_size.unwrap_or(TILE_SIZE);
        let levels = [("Proving Ground", ARENA_1), ("Overseer's Den", ARENA_2)]
            .into_iter()
            .filter_map(|(name, rows)| match LevelLayout::from_grid(name, &grid_from_rows(rows), tile) {
                Ok(layout) => Some(layout.with_border(settings.effective_border())),
                Err(e) => {
                    log::error!("Built-in level '{}' is invalid: {}", name, e);
                    None
                }
            })
            .collect();
        LevelSet::new(levels)
    }

    /// Movement axes and aim point toward the nearest hostile
    fn autopilot(state: &GameState) -> Option<(Vec2, Vec2)> {
        let craft = state.craft.pos;
        let target = state
            .hostiles
            .iter()
            .min_by(|a, b| {
                a.pos
                    .distance_squared(craft)
                    .partial_cmp(&b.pos.distance_squared(craft))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?
            .pos;
        let offset = target - craft;
        let movement = if offset.length() > STANDOFF {
            offset.signum()
        } else {
            -offset.signum()
        };
        Some((movement, target))
    }

    fn spend_skill_points<S: LevelSource>(session: &mut Session<S>) {
        const PRIORITY: [StatKind; 5] = [
            StatKind::Reload,
            StatKind::BulletDamage,
            StatKind::MaxHealth,
            StatKind::BulletPenetration,
            StatKind::MovementSpeed,
        ];
        while session.state().craft.skill_points > 0 {
            if !PRIORITY.iter().any(|&stat| session.request_stat_upgrade(stat)) {
                break;
            }
        }
    }

    pub fn run() {
        let settings_path = std::env::args()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("nano_drone.json"));
        let settings = Settings::load(&settings_path);

        let source: Box<dyn LevelSource> = match settings.map_directory() {
            Some(dir) => {
                log::info!("Loading maps from {}", dir.dir.display());
                Box::new(dir)
            }
            None => Box::new(built_in_levels(&settings)),
        };

        let mut session = Session::new(source, settings.seed);
        if let Err(e) = session.start(settings.starting_level) {
            log::error!("Cannot start level {}: {}", settings.starting_level, e);
            return;
        }
        session.select_weapon_config("TWIN");

        let mut retries_left = RETRIES;
        let mut kills = 0u32;

        while session.state().time_ticks < TICK_BUDGET {
            match session.phase() {
                GamePhase::Complete => {
                    spend_skill_points(&mut session);
                    if session.advance_to_next_level().is_err() {
                        log::info!("No more levels");
                        break;
                    }
                }
                GamePhase::PlayerDied if retries_left > 0 => {
                    retries_left -= 1;
                    session.retry_after_death();
                }
                GamePhase::PlayerDied => {
                    session.abort_to_menu();
                }
                GamePhase::Aborted | GamePhase::Loading => break,
                GamePhase::Active | GamePhase::Transitioning { .. } => {}
            }

            if let Some((movement, aim)) = autopilot(session.state()) {
                session.apply_movement_input(movement);
                session.set_aim_target(aim);
                session.trigger_fire();
            }

            if session.step() == TickOutcome::CraftDestroyed {
                log::warn!("Craft lost ({} retries left)", retries_left);
            }
            kills += session
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::HostileKilled { .. }))
                .count() as u32;
        }

        let snap = session.snapshot();
        log::info!(
            "Finished in phase {:?} on level {} '{}' after {} ticks: craft level {}, {} kills, {:.0}/{:.0} health",
            snap.phase,
            snap.level_index,
            snap.level_name,
            snap.tick,
            snap.craft.level,
            kills,
            snap.craft.health,
            snap.craft.max_health
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Nano Drone (headless) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is used directly
}
