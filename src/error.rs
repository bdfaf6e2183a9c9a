//! Error types for the fallible edges of the crate
//!
//! The tick itself never fails. Only loading data from outside the process
//! (level maps, settings files) can go wrong, and those failures are reported
//! through these types so callers can keep the session on its current level.

use std::fmt;
use std::path::PathBuf;

/// Failure to produce a level layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// No map asset exists for the requested level index
    NotFound { index: u32 },
    /// The map file exists but could not be read
    Io { path: PathBuf, message: String },
    /// The map file is not valid map JSON
    Parse { path: PathBuf, message: String },
    /// A grid row does not match the declared width
    InvalidGrid {
        expected_width: usize,
        row: usize,
        found: usize,
    },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NotFound { index } => write!(f, "no map asset for level {}", index),
            LevelError::Io { path, message } => {
                write!(f, "failed to read map '{}': {}", path.display(), message)
            }
            LevelError::Parse { path, message } => {
                write!(f, "malformed map '{}': {}", path.display(), message)
            }
            LevelError::InvalidGrid {
                expected_width,
                row,
                found,
            } => write!(
                f,
                "grid row {} has {} tiles, expected {}",
                row, found, expected_width
            ),
        }
    }
}

impl std::error::Error for LevelError {}

/// Failure to read or write a settings file
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "settings file error: {}", e),
            SettingsError::Parse(e) => write!(f, "settings parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}
