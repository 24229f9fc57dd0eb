//! Configuration for adphotos.
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual values. The bot token is only read from the
//! environment (or a `.env` file loaded before this runs).
//!
//! ```toml
//! admin_id = 123456789
//! users_file = "allowed_users.json"
//! health_port = 8080
//!
//! [pipeline]
//! photos_per_album = 10
//! jpeg_quality = 90
//!
//! [gallery]
//! max_photos = 50
//!
//! [browser]
//! headless = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scrapers::{BrowserEngineConfig, GalleryConfig};
use crate::services::PipelineConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "adphotos.toml";

/// Default allow-list location.
pub const DEFAULT_USERS_FILE: &str = "allowed_users.json";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Telegram bot token. Environment only; empty when unset.
    #[serde(skip)]
    pub bot_token: String,
    /// Telegram user id of the administrator.
    pub admin_id: u64,
    /// Allow-list JSON file.
    pub users_file: PathBuf,
    /// Upper bound on allow-list size, administrator included.
    pub max_users: Option<usize>,
    /// Tell the administrator when someone without access writes to the bot.
    pub notify_admin_on_denied: bool,
    /// Port of the liveness endpoint.
    pub health_port: u16,
    /// How many times the bot loop is started before giving up.
    pub restart_attempts: u32,
    /// First restart delay; doubles on each further attempt.
    pub restart_base_delay_secs: u64,
    pub pipeline: PipelineConfig,
    pub gallery: GalleryConfig,
    pub browser: BrowserEngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_id: 0,
            users_file: PathBuf::from(DEFAULT_USERS_FILE),
            max_users: None,
            notify_admin_on_denied: true,
            health_port: 8080,
            restart_attempts: 5,
            restart_base_delay_secs: 5,
            pipeline: PipelineConfig::default(),
            gallery: GalleryConfig::default(),
            browser: BrowserEngineConfig::default(),
        }
    }
}

impl Settings {
    /// Load from `path` (if it exists) and the process environment.
    ///
    /// A missing file is only an error when it was asked for explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let contents = if explicit || path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("Loaded config from {}", path.display());
            Some(text)
        } else {
            None
        };

        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build settings from TOML text and an environment lookup.
    pub fn from_sources(
        toml_text: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut settings: Settings = match toml_text {
            Some(text) => toml::from_str(text)?,
            None => Settings::default(),
        };

        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = env("BOT_TOKEN") {
            settings.bot_token = token;
        }

        if let Some(id) = env("ADMIN_ID") {
            settings.admin_id = parse_env("ADMIN_ID", &id)?;
        }
        if let Some(file) = env("USERS_FILE") {
            settings.users_file = PathBuf::from(file);
        }
        if let Some(port) = env("HEALTH_PORT") {
            settings.health_port = parse_env("HEALTH_PORT", &port)?;
        }
        if let Some(url) = env("CHROME_REMOTE_URL") {
            settings.browser.remote_url = Some(url);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings the bot needs but offline commands do not.
    pub fn require_bot(&self) -> Result<(), ConfigError> {
        if self.bot_token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.admin_id == 0 {
            return Err(ConfigError::InvalidValue {
                key: "admin_id",
                reason: "must be set to the administrator's Telegram user id".to_string(),
            });
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.photos_per_album == 0 || self.pipeline.photos_per_album > 10 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.photos_per_album",
                reason: format!(
                    "{} is outside 1..=10 (Telegram media group limit)",
                    self.pipeline.photos_per_album
                ),
            });
        }
        if !(1..=100).contains(&self.pipeline.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.jpeg_quality",
                reason: format!("{} is outside 1..=100", self.pipeline.jpeg_quality),
            });
        }
        if self.max_users == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "max_users",
                reason: "must leave room for the administrator".to_string(),
            });
        }
        Ok(())
    }

    pub fn restart_base_delay(&self) -> Duration {
        Duration::from_secs(self.restart_base_delay_secs)
    }
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: format!("{:?}: {}", value, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[("BOT_TOKEN", "123:abc"), ("ADMIN_ID", "42")];

    #[test]
    fn test_defaults_from_env_only() {
        let settings = Settings::from_sources(None, env(BASE)).unwrap();

        assert_eq!(settings.bot_token, "123:abc");
        assert_eq!(settings.admin_id, 42);
        assert_eq!(settings.users_file, PathBuf::from("allowed_users.json"));
        assert_eq!(settings.health_port, 8080);
        assert!(settings.notify_admin_on_denied);
        assert_eq!(settings.pipeline.photos_per_album, 10);
        assert_eq!(settings.pipeline.jpeg_quality, 90);
        assert_eq!(settings.gallery.max_photos, 50);
        assert!(settings.browser.headless);
    }

    #[test]
    fn test_missing_token() {
        let settings = Settings::from_sources(None, env(&[("ADMIN_ID", "42")])).unwrap();
        assert!(matches!(settings.require_bot(), Err(ConfigError::MissingToken)));

        let settings =
            Settings::from_sources(None, env(&[("BOT_TOKEN", "  "), ("ADMIN_ID", "42")])).unwrap();
        assert!(matches!(settings.require_bot(), Err(ConfigError::MissingToken)));

        let settings = Settings::from_sources(None, env(BASE)).unwrap();
        assert!(settings.require_bot().is_ok());
    }

    #[test]
    fn test_toml_sections_and_env_overrides() {
        let toml = r#"
            admin_id = 7
            users_file = "/data/users.json"
            max_users = 20
            notify_admin_on_denied = false
            health_port = 9000

            [pipeline]
            photos_per_album = 5
            album_delay_ms = 0

            [gallery]
            max_photos = 30
            settle_delay_ms = 2000

            [browser]
            headless = false
        "#;
        let settings = Settings::from_sources(
            Some(toml),
            env(&[
                ("BOT_TOKEN", "t"),
                ("HEALTH_PORT", "8081"),
                ("CHROME_REMOTE_URL", "http://chrome:9222"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.admin_id, 7);
        assert_eq!(settings.users_file, PathBuf::from("/data/users.json"));
        assert_eq!(settings.max_users, Some(20));
        assert!(!settings.notify_admin_on_denied);
        assert_eq!(settings.health_port, 8081);
        assert_eq!(settings.pipeline.photos_per_album, 5);
        assert_eq!(settings.pipeline.min_width, 300);
        assert_eq!(settings.gallery.max_photos, 30);
        assert_eq!(settings.gallery.max_idle_iterations, 3);
        assert!(!settings.browser.headless);
        assert_eq!(settings.browser.remote_url.as_deref(), Some("http://chrome:9222"));
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_sources(None, env(&[("BOT_TOKEN", "t"), ("ADMIN_ID", "abc")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "ADMIN_ID", .. }));

        let settings = Settings::from_sources(None, env(&[("BOT_TOKEN", "t")])).unwrap();
        assert!(matches!(
            settings.require_bot(),
            Err(ConfigError::InvalidValue { key: "admin_id", .. })
        ));

        let err = Settings::from_sources(Some("[pipeline]\nphotos_per_album = 11"), env(BASE))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "pipeline.photos_per_album",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_error() {
        let err = Settings::from_sources(Some("admin_id = ["), env(BASE)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
