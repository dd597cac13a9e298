//! Application configuration.
//!
//! `AppConfig` is built once at process start (see the infrastructure
//! `ConfigService`) and handed by reference to every component constructor.
//! Every section is defaulted so a partial `config.toml` is valid.

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub gemini: GeminiSettings,
    pub images: ImageSettings,
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file. `:memory:` keeps everything in memory.
    pub path: String,
}

impl DatabaseSettings {
    pub const IN_MEMORY: &'static str = ":memory:";

    pub fn is_in_memory(&self) -> bool {
        self.path == Self::IN_MEMORY
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "gstar.db".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "your-secret-key-here-change-in-production".to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: String,
    /// Text model used for story generation and background keywords.
    pub model: String,
    /// Image model used for background rendering.
    pub image_model: String,
    pub base_url: String,
    /// Upper bound for a single image-generation request.
    pub image_timeout_secs: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            image_timeout_secs: 60,
        }
    }
}

/// How generated background files are named on disk.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageNaming {
    /// `{keyword}_{YYYYMMDD_HHMMSS}.png`, eligible for keyword reuse.
    #[default]
    Timestamp,
    /// `{uuid}.png`, never reused.
    Uuid,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImageSettings {
    pub dir: String,
    pub url_prefix: String,
    pub placeholder_url: String,
    pub naming: ImageNaming,
    pub reuse_cached: bool,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            dir: "static/generated_images".to_string(),
            url_prefix: "/static/generated_images".to_string(),
            placeholder_url: "https://placeholder.com/background.jpg".to_string(),
            naming: ImageNaming::Timestamp,
            reuse_cached: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub dir: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [images]
            naming = "uuid"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.images.naming, ImageNaming::Uuid);
        assert!(config.images.reuse_cached);
        assert_eq!(config.auth.access_token_expire_minutes, 30);
        assert_eq!(config.gemini.image_timeout_secs, 60);
    }

    #[test]
    fn test_in_memory_database() {
        let settings = DatabaseSettings {
            path: DatabaseSettings::IN_MEMORY.to_string(),
        };
        assert!(settings.is_in_memory());
        assert!(!DatabaseSettings::default().is_in_memory());
    }
}
