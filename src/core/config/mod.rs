//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! msm has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Overrides for the current working directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. Explicit path (`--config`)
//! 2. `$MSM_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/msm/config.toml`
//! 4. `~/.msm/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use msm::core::config::Config;
//!
//! let result = Config::load(None, None).unwrap();
//! let config = result.config;
//! println!("pool size: {}", config.max_connections());
//! ```

pub mod schema;

pub use schema::{FileConfig, LoggingConfig, PoolConfig, TreeConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::types::MaxDepth;

/// Default number of concurrent units of work.
pub const DEFAULT_MAX_CONNECTIONS: usize = 20;

/// Default acquisition timeout in milliseconds.
pub const DEFAULT_ACQUISITION_TIMEOUT_MS: u64 = 20_000;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// Accessors apply defaults; project values override global ones.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Project configuration (if present)
    pub project: Option<FileConfig>,
    merged: FileConfig,
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// `explicit` is the `--config` path, which must exist when given.
    /// If `project_dir` is provided, `.msm/config.toml` beneath it is
    /// layered on top.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// hold invalid values. Missing default files are not an error.
    pub fn load(
        explicit: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let global_path = match explicit {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
            None => Self::find_global(),
        };
        let project_path = project_dir
            .map(Self::project_config_path)
            .filter(|p| p.exists());

        Self::load_from(global_path.as_deref(), project_path.as_deref())
    }

    /// Load from exact file paths, skipping discovery.
    pub fn load_from(
        global_path: Option<&Path>,
        project_path: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let global = match global_path {
            Some(path) => Self::read_config(path)?,
            None => FileConfig::default(),
        };
        let project = project_path.map(Self::read_config).transpose()?;

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        let merged = match &project {
            Some(p) => global.merged_with(p),
            None => global.clone(),
        };

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                merged,
                global_path: global_path.map(Path::to_path_buf),
                project_path: project_path.map(Path::to_path_buf),
            },
        })
    }

    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("MSM_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("msm/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".msm/config.toml"))
            .filter(|p| p.exists())
    }

    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.msm/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".msm/config.toml"))
    }

    /// Get the path for project config under `dir`.
    pub fn project_config_path(dir: &Path) -> PathBuf {
        dir.join(".msm/config.toml")
    }

    /// Write global config atomically to the canonical location.
    pub fn write_global(config: &FileConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        Self::write_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed, writes a sibling temp file
    /// and renames it into place.
    pub fn write_atomic(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Maximum concurrent units of work. Defaults to 20.
    pub fn max_connections(&self) -> usize {
        self.merged
            .pool
            .as_ref()
            .and_then(|p| p.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    /// How long to wait for a unit of work. Defaults to 20 seconds.
    pub fn acquisition_timeout(&self) -> Duration {
        let ms = self
            .merged
            .pool
            .as_ref()
            .and_then(|p| p.acquisition_timeout_ms)
            .unwrap_or(DEFAULT_ACQUISITION_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    /// Log level. Defaults to "warn".
    pub fn log_level(&self) -> &str {
        self.merged
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Depth bound for tree reads that do not specify one.
    pub fn default_max_depth(&self) -> MaxDepth {
        self.merged
            .tree
            .as_ref()
            .and_then(|t| t.default_max_depth)
            .into()
    }

    /// The merged view of both scopes.
    pub fn effective(&self) -> &FileConfig {
        &self.merged
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_files() {
        let config = Config::load_from(None, None).unwrap().config;

        assert_eq!(config.max_connections(), 20);
        assert_eq!(config.acquisition_timeout(), Duration::from_millis(20_000));
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.default_max_depth(), MaxDepth::Unbounded);
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn load_global_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [pool]
            max_connections = 3

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap().config;
        assert_eq!(config.max_connections(), 3);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.global_config_loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let result = Config::load(Some(&missing), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn project_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(
            &global,
            "[pool]\nmax_connections = 8\nacquisition_timeout_ms = 100\n",
        )
        .unwrap();

        let project_dir = temp.path().join("work");
        let project = Config::project_config_path(&project_dir);
        fs::create_dir_all(project.parent().unwrap()).unwrap();
        fs::write(&project, "[pool]\nmax_connections = 2\n[tree]\ndefault_max_depth = 4\n")
            .unwrap();

        let config = Config::load(Some(&global), Some(&project_dir))
            .unwrap()
            .config;
        assert_eq!(config.max_connections(), 2);
        assert_eq!(config.acquisition_timeout(), Duration::from_millis(100));
        assert_eq!(config.default_max_depth(), MaxDepth::Limited(4));
        assert!(config.project_config_loaded_from().is_some());
    }

    #[test]
    fn invalid_value_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[pool]\nmax_connections = 0\n").unwrap();

        let result = Config::load_from(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "uri = \"bolt://localhost\"\n").unwrap();

        let result = Config::load_from(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn write_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        let file = FileConfig {
            logging: Some(LoggingConfig {
                level: Some("info".to_string()),
            }),
            ..Default::default()
        };

        Config::write_atomic(&path, &file).unwrap();
        assert!(path.exists());

        let config = Config::load_from(Some(&path), None).unwrap().config;
        assert_eq!(config.log_level(), "info");
    }
}
