//! Path management for gstar configuration files.
//!
//! ```text
//! ~/.config/gstar/            # Config directory
//! └── config.toml             # Application configuration
//! ```
//!
//! Runtime data (database, generated images, logs) lives where the config
//! points to, relative to the working directory by default.

use std::path::PathBuf;

const APP_DIR_NAME: &str = "gstar";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct GstarPaths;

impl GstarPaths {
    /// Returns the gstar configuration directory (e.g. `~/.config/gstar/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the default config file path (e.g. `~/.config/gstar/config.toml`).
    pub fn default_config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file_layout() {
        if let Ok(path) = GstarPaths::default_config_file() {
            assert!(path.ends_with("gstar/config.toml"));
        }
    }
}
