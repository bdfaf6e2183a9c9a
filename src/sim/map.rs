//! Level sources: where layouts come from
//!
//! Map files are JSON produced by the external map converter:
//!
//! ```json
//! { "metadata": { "width": 3, "height": 2, "tile_size": 50,
//!                 "world_width": 150, "world_height": 100,
//!                 "player_spawn": [25, 25], "enemy_spawns": [[125, 75]] },
//!   "grid": [["player_spawn", "empty", "wall"], ["empty", "barrier", "enemy_spawn"]] }
//! ```
//!
//! Spawn lists in the metadata are world coordinates and win over spawn
//! tags in the grid when present.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hostile::Archetype;
use super::level::{LevelLayout, SpawnPoint, TileKind};
use crate::consts::TILE_SIZE;
use crate::error::LevelError;

/// Anything that can produce the layout for a level index (1-based)
pub trait LevelSource {
    fn load_level(&self, index: u32) -> Result<LevelLayout, LevelError>;
}

impl<S: LevelSource + ?Sized> LevelSource for Box<S> {
    fn load_level(&self, index: u32) -> Result<LevelLayout, LevelError> {
        (**self).load_level(index)
    }
}

/// Map file metadata block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapMetadata {
    pub name: Option<String>,
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    pub world_width: Option<f32>,
    pub world_height: Option<f32>,
    pub player_spawn: Option<[f32; 2]>,
    pub enemy_spawns: Option<Vec<[f32; 2]>>,
    pub boss_spawns: Option<Vec<[f32; 2]>>,
}

impl Default for MapMetadata {
    fn default() -> Self {
        Self {
            name: None,
            width: 0,
            height: 0,
            tile_size: TILE_SIZE,
            world_width: None,
            world_height: None,
            player_spawn: None,
            enemy_spawns: None,
            boss_spawns: None,
        }
    }
}

/// On-disk map file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFile {
    #[serde(default)]
    pub metadata: MapMetadata,
    pub grid: Vec<Vec<String>>,
}

impl MapFile {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Convert into a layout. `tile_size` overrides the file's tile size;
    /// metadata coordinates are rescaled to match.
    pub fn into_layout(self, default_name: &str, tile_size: Option<f32>) -> Result<LevelLayout, LevelError> {
        let grid: Vec<Vec<TileKind>> = self
            .grid
            .iter()
            .map(|row| row.iter().map(|tag| TileKind::from_tag(tag)).collect())
            .collect();

        let meta = self.metadata;
        if meta.width > 0 {
            if let Some((row, found)) = grid
                .iter()
                .enumerate()
                .find(|(_, r)| r.len() != meta.width)
                .map(|(i, r)| (i, r.len()))
            {
                return Err(LevelError::InvalidGrid {
                    expected_width: meta.width,
                    row,
                    found,
                });
            }
        }

        let file_tile = if meta.tile_size > 0.0 { meta.tile_size } else { TILE_SIZE };
        let tile = tile_size.unwrap_or(file_tile);
        let scale = tile / file_tile;
        let to_world = |p: [f32; 2]| Vec2::new(p[0], p[1]) * scale;

        let name = meta.name.clone().unwrap_or_else(|| default_name.to_string());
        let mut layout = LevelLayout::from_grid(name, &grid, tile)?;

        if let (Some(w), Some(h)) = (meta.world_width, meta.world_height) {
            layout.world_size = Vec2::new(w, h) * scale;
        }
        if let Some(spawn) = meta.player_spawn {
            layout.craft_spawn = to_world(spawn);
        }
        if meta.enemy_spawns.is_some() || meta.boss_spawns.is_some() {
            let regular = meta
                .enemy_spawns
                .unwrap_or_default()
                .into_iter()
                .map(|p| SpawnPoint::random(to_world(p)));
            let bosses = meta
                .boss_spawns
                .unwrap_or_default()
                .into_iter()
                .map(|p| SpawnPoint::fixed(to_world(p), Archetype::Overseer));
            layout.hostile_spawns = regular.chain(bosses).collect();
        }

        Ok(layout)
    }
}

/// Parse map JSON, reporting failures against `path`
pub fn parse_map(json: &str, path: &Path, tile_size: Option<f32>) -> Result<LevelLayout, LevelError> {
    let file = MapFile::from_json(json).map_err(|e| LevelError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let default_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("level")
        .to_string();
    file.into_layout(&default_name, tile_size)
}

/// Directory of `level_{n}.json` files
#[derive(Debug, Clone)]
pub struct MapDirectory {
    pub dir: PathBuf,
    /// Border wall thickness; 0 disables the border
    pub border_thickness: f32,
    pub tile_size: Option<f32>,
}

impl MapDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            border_thickness: 0.0,
            tile_size: None,
        }
    }

    pub fn with_border(mut self, thickness: f32) -> Self {
        self.border_thickness = thickness;
        self
    }

    pub fn with_tile_size(mut self, tile_size: Option<f32>) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir.join(format!("level_{}.json", index))
    }
}

impl LevelSource for MapDirectory {
    fn load_level(&self, index: u32) -> Result<LevelLayout, LevelError> {
        let path = self.path_for(index);
        if !path.is_file() {
            return Err(LevelError::NotFound { index });
        }
        let json = fs::read_to_string(&path).map_err(|e| LevelError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let layout = parse_map(&json, &path, self.tile_size)?;
        log::debug!("Parsed map {} ({} walls)", path.display(), layout.walls.len());
        Ok(layout.with_border(self.border_thickness))
    }
}

/// In-memory list of layouts; level 1 is the first entry
#[derive(Debug, Clone, Default)]
pub struct LevelSet {
    pub levels: Vec<LevelLayout>,
}

impl LevelSet {
    pub fn new(levels: Vec<LevelLayout>) -> Self {
        Self { levels }
    }

    pub fn push(&mut self, layout: LevelLayout) {
        self.levels.push(layout);
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl LevelSource for LevelSet {
    fn load_level(&self, index: u32) -> Result<LevelLayout, LevelError> {
        index
            .checked_sub(1)
            .and_then(|i| self.levels.get(i as usize))
            .cloned()
            .ok_or(LevelError::NotFound { index })
    }
}
