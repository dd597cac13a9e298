//! Configuration loading.
//!
//! Resolution order: built-in defaults, then a TOML file, then environment
//! variable overrides. The result is built once at startup and never
//! reloaded.

use crate::paths::GstarPaths;
use gstar_core::config::AppConfig;
use gstar_core::{GstarError, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "GSTAR_CONFIG";

pub struct ConfigService;

impl ConfigService {
    /// Loads the configuration for this process.
    ///
    /// `explicit` (from the command line) wins over `$GSTAR_CONFIG`, which
    /// wins over `~/.config/gstar/config.toml`. An explicitly named file must
    /// exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
        let mut config = match Self::resolve_path(explicit) {
            Some(path) => Self::load_from_file(&path)?,
            None => AppConfig::default(),
        };
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        GstarPaths::default_config_file()
            .ok()
            .filter(|path| path.exists())
    }

    pub fn load_from_file(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GstarError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies environment overrides through `lookup` so callers (and tests)
    /// decide where values come from.
    pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GEMINI_TOKEN") {
            config.gemini.api_key = value;
        }
        if let Some(value) = lookup("GEMINI_MODEL") {
            config.gemini.model = value;
        }
        if let Some(value) = lookup("IMAGE_MODEL") {
            config.gemini.image_model = value;
        }
        if let Some(value) = lookup("JWT_SECRET_KEY") {
            config.auth.jwt_secret = value;
        }
        if let Some(value) = lookup("JWT_ALGORITHM") {
            config.auth.jwt_algorithm = value;
        }
        if let Some(value) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            config.auth.access_token_expire_minutes = parse_number("ACCESS_TOKEN_EXPIRE_MINUTES", &value)?;
        }
        if let Some(value) = lookup("REFRESH_TOKEN_EXPIRE_DAYS") {
            config.auth.refresh_token_expire_days = parse_number("REFRESH_TOKEN_EXPIRE_DAYS", &value)?;
        }
        if let Some(value) = lookup("DATABASE_PATH") {
            config.database.path = value;
        }
        if let Some(value) = lookup("GSTAR_HOST") {
            config.server.host = value;
        }
        if let Some(value) = lookup("GSTAR_PORT") {
            config.server.port = parse_number("GSTAR_PORT", &value)?;
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GstarError::config(format!("{key} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[gemini]\nmodel = \"gemini-test\"\n\n[database]\npath = \":memory:\"\n",
        )
        .unwrap();

        let config = ConfigService::load_from_file(&path).expect("Should load config");
        assert_eq!(config.gemini.model, "gemini-test");
        assert!(config.database.is_in_memory());
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigService::load_from_file(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(GstarError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GEMINI_TOKEN", "secret"),
            ("JWT_SECRET_KEY", "jwt"),
            ("GSTAR_PORT", "9100"),
            ("REFRESH_TOKEN_EXPIRE_DAYS", "14"),
        ]);
        let mut config = AppConfig::default();
        ConfigService::apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.gemini.api_key, "secret");
        assert_eq!(config.auth.jwt_secret, "jwt");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.auth.refresh_token_expire_days, 14);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_bad_number_override() {
        let mut config = AppConfig::default();
        let result = ConfigService::apply_env_overrides(&mut config, |key| {
            (key == "GSTAR_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(GstarError::Config(_))));
    }
}
