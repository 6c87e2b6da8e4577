use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "PREP_CONFIG";
pub const DB_URL_ENV: &str = "PREP_DB_URL";

const DEFAULT_DATABASE_URL: &str = "sqlite://prep.sqlite3";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings read from the TOML config file. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

impl AppConfig {
    /// Read `path`, or return defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a given file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Database URL after applying the environment and flag overrides, in
    /// that order.
    #[must_use]
    pub fn database_url(&self, env: Option<String>, flag: Option<String>) -> String {
        flag.or(env)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.database_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config: AppConfig = toml::from_str("log_filter = \"debug\"").unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn nonexistent_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/prep/config.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = std::env::temp_dir().join("prep-test-config-invalid");
        let path = dir.join("bad.toml");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "database_url = [[[").unwrap();

        let result = AppConfig::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let config = AppConfig {
            database_url: "sqlite://file.db".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.database_url(None, None), "sqlite://file.db");
        assert_eq!(
            config.database_url(Some("sqlite://env.db".into()), None),
            "sqlite://env.db"
        );
        assert_eq!(
            config.database_url(Some("sqlite://env.db".into()), Some("sqlite://flag.db".into())),
            "sqlite://flag.db"
        );
        assert_eq!(config.database_url(Some("  ".into()), None), "sqlite://file.db");
    }
}
