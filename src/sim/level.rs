//! Static level geometry and layouts
//!
//! Tile grids are merged into axis-aligned wall rectangles once per level
//! load. Walls never change afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::hostile::Archetype;
use crate::error::LevelError;

/// One cell of a level grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    Wall,
    Barrier,
    PlayerSpawn,
    EnemySpawn,
    BossSpawn,
}

impl TileKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            TileKind::Empty => "empty",
            TileKind::Wall => "wall",
            TileKind::Barrier => "barrier",
            TileKind::PlayerSpawn => "player_spawn",
            TileKind::EnemySpawn => "enemy_spawn",
            TileKind::BossSpawn => "boss_spawn",
        }
    }

    /// Parse a map tag. Unknown tags read as empty floor.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "wall" => TileKind::Wall,
            "barrier" => TileKind::Barrier,
            "player_spawn" => TileKind::PlayerSpawn,
            "enemy_spawn" => TileKind::EnemySpawn,
            "boss_spawn" => TileKind::BossSpawn,
            _ => TileKind::Empty,
        }
    }

    /// Geometry category produced by this tile, if any
    pub fn wall_kind(&self) -> Option<WallKind> {
        match self {
            TileKind::Wall => Some(WallKind::Solid),
            TileKind::Barrier => Some(WallKind::EnemyBarrier),
            _ => None,
        }
    }
}

/// Geometry category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    /// Interior walls from the map grid
    Solid,
    /// World edge
    Border,
    /// Keeps hostiles in their area; the craft and projectiles pass through
    EnemyBarrier,
}

impl WallKind {
    /// Categories that come from tiles, in generation order
    pub const FROM_TILES: [WallKind; 2] = [WallKind::Solid, WallKind::EnemyBarrier];

    pub fn blocks_craft(&self) -> bool {
        matches!(self, WallKind::Solid | WallKind::Border)
    }

    pub fn blocks_hostiles(&self) -> bool {
        true
    }

    pub fn stops_projectiles(&self) -> bool {
        matches!(self, WallKind::Solid | WallKind::Border)
    }
}

/// A merged wall rectangle in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub rect: Rect,
    pub kind: WallKind,
}

/// Merge every tile of one category into disjoint rectangles.
///
/// Row-major scan. Each unvisited matching tile grows right while tiles
/// match, then grows down while the whole width band matches. Rectangles are
/// returned in tile units (x, y, w, h).
pub fn merge_tiles(grid: &[Vec<TileKind>], kind: WallKind) -> Vec<(usize, usize, usize, usize)> {
    let height = grid.len();
    let mut visited: Vec<Vec<bool>> = grid.iter().map(|row| vec![false; row.len()]).collect();
    let open = |x: usize, y: usize, visited: &Vec<Vec<bool>>| -> bool {
        grid[y].get(x).is_some_and(|t| t.wall_kind() == Some(kind)) && !visited[y][x]
    };

    let mut out = Vec::new();
    for y in 0..height {
        for x in 0..grid[y].len() {
            if !open(x, y, &visited) {
                continue;
            }

            let mut w = 1;
            while open(x + w, y, &visited) {
                w += 1;
            }

            let mut h = 1;
            while y + h < height && (x..x + w).all(|cx| open(cx, y + h, &visited)) {
                h += 1;
            }

            for row in visited.iter_mut().skip(y).take(h) {
                for cell in row.iter_mut().skip(x).take(w) {
                    *cell = true;
                }
            }
            out.push((x, y, w, h));
        }
    }
    out
}

/// Build wall rectangles for every tile category, in world units
pub fn generate_geometry(grid: &[Vec<TileKind>], tile_size: f32) -> Vec<Wall> {
    WallKind::FROM_TILES
        .iter()
        .flat_map(|&kind| {
            merge_tiles(grid, kind).into_iter().map(move |(x, y, w, h)| Wall {
                rect: Rect::new(
                    x as f32 * tile_size,
                    y as f32 * tile_size,
                    w as f32 * tile_size,
                    h as f32 * tile_size,
                ),
                kind,
            })
        })
        .collect()
}

/// Where a hostile appears when the level loads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub pos: Vec2,
    /// Fixed archetype, or `None` to pick a regular one at random
    pub archetype: Option<Archetype>,
}

impl SpawnPoint {
    pub fn random(pos: Vec2) -> Self {
        Self {
            pos,
            archetype: None,
        }
    }

    pub fn fixed(pos: Vec2, archetype: Archetype) -> Self {
        Self {
            pos,
            archetype: Some(archetype),
        }
    }
}

/// Everything the simulation needs to start a level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelLayout {
    pub name: String,
    pub world_size: Vec2,
    pub tile_size: f32,
    pub walls: Vec<Wall>,
    pub craft_spawn: Vec2,
    pub hostile_spawns: Vec<SpawnPoint>,
}

impl LevelLayout {
    /// Build a layout from a tag grid. Spawns are taken from spawn tiles
    /// (tile centres); a grid without a player spawn starts the craft in the
    /// middle of the world.
    pub fn from_grid(name: impl Into<String>, grid: &[Vec<TileKind>], tile_size: f32) -> Result<Self, LevelError> {
        let width = grid.first().map_or(0, Vec::len);
        if let Some((row, found)) = grid
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != width)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(LevelError::InvalidGrid {
                expected_width: width,
                row,
                found,
            });
        }

        let world_size = Vec2::new(width as f32 * tile_size, grid.len() as f32 * tile_size);
        let mut craft_spawn = None;
        let mut hostile_spawns = Vec::new();
        for (y, row) in grid.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                let centre = Vec2::new((x as f32 + 0.5) * tile_size, (y as f32 + 0.5) * tile_size);
                match tile {
                    // Last player spawn tile wins
                    TileKind::PlayerSpawn => craft_spawn = Some(centre),
                    TileKind::EnemySpawn => hostile_spawns.push(SpawnPoint::random(centre)),
                    TileKind::BossSpawn => hostile_spawns.push(SpawnPoint::fixed(centre, Archetype::Overseer)),
                    _ => {}
                }
            }
        }

        Ok(Self {
            name: name.into(),
            world_size,
            tile_size,
            walls: generate_geometry(grid, tile_size),
            craft_spawn: craft_spawn.unwrap_or(world_size / 2.0),
            hostile_spawns,
        })
    }

    /// Surround the world with border walls of the given thickness, placed
    /// just outside the world edges.
    pub fn with_border(mut self, thickness: f32) -> Self {
        if thickness <= 0.0 {
            return self;
        }
        let Vec2 { x: w, y: h } = self.world_size;
        let t = thickness;
        let border = [
            Rect::new(-t, -t, w + 2.0 * t, t),
            Rect::new(-t, h, w + 2.0 * t, t),
            Rect::new(-t, 0.0, t, h),
            Rect::new(w, 0.0, t, h),
        ];
        self.walls.extend(border.into_iter().map(|rect| Wall {
            rect,
            kind: WallKind::Border,
        }));
        self
    }

    /// World bounds as a rectangle anchored at the origin
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.world_size.x, self.world_size.y)
    }

    pub fn walls_of(&self, kind: WallKind) -> impl Iterator<Item = &Wall> {
        self.walls.iter().filter(move |w| w.kind == kind)
    }
}

/// Parse a grid of text rows, one character per tile. Used by tests and the
/// built-in arena: `#` wall, `B` barrier, `P` player, `E` enemy, `S` boss.
pub fn grid_from_rows(rows: &[&str]) -> Vec<Vec<TileKind>> {
    rows.iter()
        .map(|row| {
            row.chars()
                .map(|c| match c {
                    '#' => TileKind::Wall,
                    'B' => TileKind::Barrier,
                    'P' => TileKind::PlayerSpawn,
                    'E' => TileKind::EnemySpawn,
                    'S' => TileKind::BossSpawn,
                    _ => TileKind::Empty,
                })
                .collect()
        })
        .collect()
}
