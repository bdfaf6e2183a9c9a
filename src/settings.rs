//! Session settings
//!
//! Stored as a JSON file next to the binary. Missing fields take their
//! defaults, and an unreadable file falls back to the defaults entirely.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::sim::map::MapDirectory;

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Level the session starts on (1-based)
    pub starting_level: u32,
    /// Run seed; fixes archetype picks and weapon spread
    pub seed: u64,
    /// Directory holding `level_{n}.json` maps. Without one the built-in
    /// arena is used.
    pub level_dir: Option<PathBuf>,

    // === Map loading ===
    /// Surround each map with border walls
    pub border_walls: bool,
    /// Border wall thickness in world units
    pub border_thickness: f32,
    /// Override the tile size stored in map files
    pub tile_size: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_level: 1,
            seed: 0x5EED,
            level_dir: None,
            border_walls: true,
            border_thickness: 50.0,
            tile_size: None,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Effective border thickness (0 when borders are off)
    pub fn effective_border(&self) -> f32 {
        if self.border_walls {
            self.border_thickness.max(0.0)
        } else {
            0.0
        }
    }

    /// Map directory source configured from these settings, if a level
    /// directory is set
    pub fn map_directory(&self) -> Option<MapDirectory> {
        self.level_dir.as_ref().map(|dir| {
            MapDirectory::new(dir)
                .with_border(self.effective_border())
                .with_tile_size(self.tile_size)
        })
    }
}
