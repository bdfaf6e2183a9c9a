//! Collision detection and resolution passes
//!
//! Each pass handles one pair of entity classes. `tick` runs them in a fixed
//! order: later passes assume positions were already corrected by earlier
//! ones within the same tick.

use glam::Vec2;

use super::geometry::{Rect, rect_overlaps_circle, rect_overlaps_rect};
use super::level::{Wall, WallKind};
use super::projectile::Affiliation;
use super::state::{GameEvent, GameState};
use crate::consts::*;

/// Whether `bounds` overlaps any wall whose kind satisfies `blocks`
pub fn hits_wall(walls: &[Wall], bounds: &Rect, blocks: impl Fn(WallKind) -> bool) -> bool {
    walls
        .iter()
        .any(|w| blocks(w.kind) && rect_overlaps_rect(&w.rect, bounds))
}

/// Whether a move from `before` to `after` runs into a wall whose kind
/// satisfies `blocks`: the overlap with some wall grows. A fresh collision
/// always counts. An entity that already overlaps a wall (spawned against it
/// or shoved into it) may move anywhere that does not push it deeper.
pub fn move_blocked(walls: &[Wall], before: &Rect, after: &Rect, blocks: impl Fn(WallKind) -> bool) -> bool {
    walls.iter().filter(|w| blocks(w.kind)).any(|w| {
        let Some(now) = w.rect.intersection(after) else {
            return false;
        };
        let was = w.rect.intersection(before).map_or(0.0, |r| r.area());
        now.area() > was
    })
}

/// Keep a circle's centre inside the world, at least `radius` from each edge
pub fn clamp_to_world(pos: Vec2, radius: f32, world_size: Vec2) -> Vec2 {
    if world_size.x <= 0.0 || world_size.y <= 0.0 {
        return pos;
    }
    let lo = Vec2::splat(radius).min(world_size / 2.0);
    let hi = (world_size - Vec2::splat(radius)).max(world_size / 2.0);
    pos.max(lo).min(hi)
}

/// Craft vs geometry: full revert to `prev` when the move runs into a wall,
/// no sliding
pub fn resolve_craft_walls(state: &mut GameState, prev: Vec2) {
    let craft = &mut state.craft;
    let before = Rect::around(prev, craft.radius);
    if move_blocked(&state.walls, &before, &craft.bounds(), |k| k.blocks_craft()) {
        craft.pos = prev;
    }
    craft.pos = clamp_to_world(craft.pos, craft.radius, state.world_size);
}

/// Projectile vs geometry and world bounds: drop anything that left the
/// world or touches a projectile-stopping wall
pub fn cull_projectiles(state: &mut GameState) {
    let walls = &state.walls;
    let world = state.world_size;
    state.projectiles.retain(|p| {
        !p.is_out_of_bounds(world)
            && !walls
                .iter()
                .any(|w| w.kind.stops_projectiles() && rect_overlaps_circle(&w.rect, p.pos, p.radius))
    });
}

/// Hostile vs geometry: same binary revert as the craft. `prev` holds one
/// position per hostile, in order.
pub fn resolve_hostile_walls(state: &mut GameState, prev: &[Vec2]) {
    debug_assert_eq!(prev.len(), state.hostiles.len());
    for (hostile, &before) in state.hostiles.iter_mut().zip(prev) {
        let from = Rect::around(before, hostile.radius);
        if move_blocked(&state.walls, &from, &hostile.bounds(), |k| k.blocks_hostiles()) {
            hostile.pos = before;
        }
        hostile.pos = clamp_to_world(hostile.pos, hostile.radius, state.world_size);
    }
}

/// Hostile vs craft contact.
///
/// Overlapping hostiles are pushed out by the full overlap (the craft is
/// never pushed). The push ignores walls; a hostile shoved into one backs
/// out on a later tick through `resolve_hostile_walls`. Each hostile deals
/// contact damage at most once per `CONTACT_COOLDOWN_TICKS`, and takes body
/// damage back when the craft has the stat. Returns true if the craft was destroyed; remaining hostiles are
/// not processed in that case.
pub fn resolve_contact(state: &mut GameState) -> bool {
    let now = state.time_ticks;
    let body_damage = state.craft.stats.body_damage();
    let contact_damage = CONTACT_DAMAGE * state.difficulty;

    for hostile in &mut state.hostiles {
        let offset = hostile.pos - state.craft.pos;
        let distance = offset.length();
        let min_distance = hostile.radius + state.craft.radius;
        if distance >= min_distance || distance <= 0.0 {
            continue;
        }

        hostile.pos += offset / distance * (min_distance - distance);

        if !hostile.contact_ready(now, CONTACT_COOLDOWN_TICKS) {
            continue;
        }
        hostile.last_contact_tick = Some(now);

        if body_damage > 0.0 {
            hostile.take_damage(body_damage);
        }

        let destroyed = state.craft.apply_damage(contact_damage, now);
        state.events.push(GameEvent::CraftDamaged {
            amount: contact_damage,
            health: state.craft.health,
        });
        if destroyed {
            return true;
        }
    }
    false
}

/// Hostile vs hostile: push each overlapping pair apart by half the overlap
pub fn separate_hostiles(state: &mut GameState) {
    let n = state.hostiles.len();
    for j in 1..n {
        let (left, right) = state.hostiles.split_at_mut(j);
        let b = &mut right[0];
        for a in left.iter_mut() {
            let offset = b.pos - a.pos;
            let distance = offset.length();
            let min_distance = a.radius + b.radius;
            if distance < min_distance && distance > 0.0 {
                let push = offset / distance * ((min_distance - distance) / 2.0);
                a.pos -= push;
                b.pos += push;
            }
        }
    }
}

/// Craft projectiles vs hostiles.
///
/// A projectile hits the first live hostile it overlaps (distance below the
/// hostile radius) and nothing else that tick. Spent projectiles are
/// removed. Dead hostiles stay in the list for `remove_dead_hostiles`.
pub fn resolve_craft_projectiles(state: &mut GameState) {
    let hostiles = &mut state.hostiles;
    state.projectiles.retain_mut(|p| {
        if p.affiliation != Affiliation::Craft {
            return true;
        }
        let Some(target) = hostiles
            .iter_mut()
            .find(|h| !h.is_dead() && p.pos.distance(h.pos) < h.radius)
        else {
            return true;
        };
        target.take_damage(p.damage);
        !p.register_hit()
    });
}

/// Remove hostiles with no health left, awarding their experience
pub fn remove_dead_hostiles(state: &mut GameState) {
    if !state.hostiles.iter().any(|h| h.is_dead()) {
        return;
    }

    let (dead, alive): (Vec<_>, Vec<_>) = std::mem::take(&mut state.hostiles)
        .into_iter()
        .partition(|h| h.is_dead());
    state.hostiles = alive;

    for hostile in dead {
        log::debug!("Hostile {} ({:?}) destroyed", hostile.id, hostile.archetype);
        state.events.push(GameEvent::HostileKilled {
            id: hostile.id,
            archetype: hostile.archetype,
            xp: hostile.xp_value,
        });
        let before = state.craft.level;
        if state.craft.gain_xp(hostile.xp_value) > 0 {
            log::info!("Craft level {} -> {}", before, state.craft.level);
            state.events.push(GameEvent::CraftLevelUp {
                level: state.craft.level,
            });
        }
    }
}

/// Hostile projectiles vs craft. Every overlapping projectile (distance below
/// the craft radius) deals its damage and is removed. Returns true if the
/// craft was destroyed; later projectiles are left untouched.
pub fn resolve_hostile_projectiles(state: &mut GameState) -> bool {
    let now = state.time_ticks;
    let craft = &mut state.craft;
    let events = &mut state.events;
    let mut destroyed = false;

    state.projectiles.retain(|p| {
        if destroyed || p.affiliation != Affiliation::Hostile {
            return true;
        }
        if p.pos.distance(craft.pos) >= craft.radius {
            return true;
        }
        destroyed = craft.apply_damage(p.damage, now);
        events.push(GameEvent::CraftDamaged {
            amount: p.damage,
            health: craft.health,
        });
        false
    });
    destroyed
}
