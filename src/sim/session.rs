//! Level and session lifecycle
//!
//! `Session` owns the game state and the level source, buffers player input
//! between ticks, and drives the phase machine:
//!
//! ```text
//! Loading -> Active -> Complete -> Transitioning -> Active (next level)
//!            Active -> PlayerDied -> Active (retry) | Aborted
//! ```

use glam::Vec2;

use super::craft::StatKind;
use super::level::LevelLayout;
use super::map::LevelSource;
use super::state::{GameEvent, GamePhase, GameState, Snapshot};
use super::tick::{TickInput, TickOutcome, tick};
use super::weapons::WeaponTable;
use crate::consts::*;
use crate::error::LevelError;

/// Most undrained events kept; older ones are dropped first
pub const EVENT_BACKLOG: usize = 4096;

pub struct Session<S: LevelSource> {
    state: GameState,
    source: S,
    weapons: &'static WeaponTable,
    input: TickInput,
    /// Layout waiting for the end of the transition
    pending: Option<LevelLayout>,
    accumulator: f32,
}

impl<S: LevelSource> Session<S> {
    /// New session in the Loading phase, using the global weapon table
    pub fn new(source: S, seed: u64) -> Self {
        Self {
            state: GameState::new(seed),
            source,
            weapons: WeaponTable::global(),
            input: TickInput::default(),
            pending: None,
            accumulator: 0.0,
        }
    }

    pub fn with_weapons(mut self, weapons: &'static WeaponTable) -> Self {
        self.weapons = weapons;
        self
    }

    /// Load a level and make it active. On failure the session is left
    /// exactly as it was.
    pub fn start(&mut self, index: u32) -> Result<(), LevelError> {
        let layout = self.load(index)?;
        self.input = TickInput::default();
        self.state.apply_layout(index, layout);
        Ok(())
    }

    fn load(&mut self, index: u32) -> Result<LevelLayout, LevelError> {
        self.source.load_level(index).inspect_err(|e| {
            log::warn!("Failed to load level {}: {}", index, e);
            self.state.events.push(GameEvent::LevelLoadFailed {
                index,
                reason: e.to_string(),
            });
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for scripted setups and debugging
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Held movement direction; stays in effect until changed
    pub fn apply_movement_input(&mut self, direction: Vec2) {
        self.input.movement = direction;
    }

    pub fn set_aim_target(&mut self, point: Vec2) {
        self.input.aim = Some(point);
    }

    /// Fire on the next tick only
    pub fn trigger_fire(&mut self) {
        self.input.fire = true;
    }

    /// Spend a skill point. Rejected without points or when the stat is capped.
    pub fn request_stat_upgrade(&mut self, stat: StatKind) -> bool {
        let craft = &mut self.state.craft;
        if craft.upgrade_stat(stat) {
            log::info!(
                "Upgraded {} to {} ({} points left)",
                stat.as_str(),
                craft.stats.get(stat),
                craft.skill_points
            );
            true
        } else {
            log::debug!("Stat upgrade {} rejected", stat.as_str());
            false
        }
    }

    /// Switch weapon configuration; only ids present in the table are accepted
    pub fn select_weapon_config(&mut self, id: &str) -> bool {
        let accepted = self.state.craft.select_weapon_config(id, self.weapons);
        if accepted {
            log::info!("Weapon configuration set to {}", id);
        } else {
            log::warn!("Unknown weapon configuration '{}'", id);
        }
        accepted
    }

    /// Leave a completed level.
    ///
    /// No-op unless the level is Complete. The next layout is loaded right
    /// away; if that fails the session stays Complete on the current level
    /// and the error is returned. Otherwise the transition interstitial
    /// starts and the new level becomes active when it ends.
    pub fn advance_to_next_level(&mut self) -> Result<(), LevelError> {
        if self.state.phase != GamePhase::Complete {
            log::debug!("Advance ignored in phase {:?}", self.state.phase);
            return Ok(());
        }
        let next_index = self.state.level_index + 1;
        let layout = self.load(next_index)?;
        self.pending = Some(layout);
        self.state.phase = GamePhase::Transitioning {
            remaining: TRANSITION_TICKS,
            next_index,
        };
        log::info!("Transitioning to level {}", next_index);
        Ok(())
    }

    /// Restart the current level after death. Only valid in PlayerDied.
    pub fn retry_after_death(&mut self) -> bool {
        if self.state.phase != GamePhase::PlayerDied {
            return false;
        }
        self.input = TickInput::default();
        self.state.reset_for_retry();
        log::info!("Retrying level {}", self.state.level_index);
        true
    }

    /// End the session after death. Only valid in PlayerDied.
    pub fn abort_to_menu(&mut self) -> bool {
        if self.state.phase != GamePhase::PlayerDied {
            return false;
        }
        self.state.phase = GamePhase::Aborted;
        log::info!("Session aborted on level {}", self.state.level_index);
        true
    }

    /// Advance one tick. Counts down the transition when one is running;
    /// otherwise runs the simulation with the buffered input.
    pub fn step(&mut self) -> TickOutcome {
        let outcome = self.run_tick();
        let backlog = self.state.events.len();
        if backlog > EVENT_BACKLOG {
            log::debug!("Dropping {} undrained events", backlog - EVENT_BACKLOG);
            self.state.events.drain(..backlog - EVENT_BACKLOG);
        }
        outcome
    }

    fn run_tick(&mut self) -> TickOutcome {
        if let GamePhase::Transitioning {
            remaining,
            next_index,
        } = self.state.phase
        {
            let remaining = remaining.saturating_sub(1);
            if remaining > 0 {
                self.state.phase = GamePhase::Transitioning {
                    remaining,
                    next_index,
                };
            } else if let Some(layout) = self.pending.take() {
                self.input = TickInput::default();
                self.state.apply_layout(next_index, layout);
            }
            return TickOutcome::Idle;
        }

        let outcome = tick(&mut self.state, &self.input, self.weapons);
        self.input.fire = false;
        outcome
    }

    /// Convert wall-clock time into fixed ticks, at most `MAX_SUBSTEPS` per
    /// call. Returns the number of ticks run.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.min(0.1);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }
}
