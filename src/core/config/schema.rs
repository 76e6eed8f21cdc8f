//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `--config <path>` if given
//! 2. `$MSM_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/msm/config.toml`
//! 4. `~/.msm/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! Located at `.msm/config.toml` in the working directory. Same schema;
//! any field it sets overrides the global value.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they are usable
//! (e.g., a pool needs at least one connection).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration file contents (either scope).
///
/// # Example
///
/// ```toml
/// [pool]
/// max_connections = 20
/// acquisition_timeout_ms = 20000
///
/// [logging]
/// level = "warn"
///
/// [tree]
/// default_max_depth = 5
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Unit-of-work pool settings
    pub pool: Option<PoolConfig>,

    /// Log output settings
    pub logging: Option<LoggingConfig>,

    /// Tree read defaults
    pub tree: Option<TreeConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(pool) = &self.pool {
            pool.validate()?;
        }
        if let Some(logging) = &self.logging {
            logging.validate()?;
        }
        Ok(())
    }

    /// Overlay `other` on top of `self`, field by field.
    pub fn merged_with(&self, other: &FileConfig) -> FileConfig {
        let pool = match (&self.pool, &other.pool) {
            (Some(base), Some(over)) => Some(PoolConfig {
                max_connections: over.max_connections.or(base.max_connections),
                acquisition_timeout_ms: over
                    .acquisition_timeout_ms
                    .or(base.acquisition_timeout_ms),
            }),
            (base, over) => over.clone().or_else(|| base.clone()),
        };
        let logging = match (&self.logging, &other.logging) {
            (Some(base), Some(over)) => Some(LoggingConfig {
                level: over.level.clone().or_else(|| base.level.clone()),
            }),
            (base, over) => over.clone().or_else(|| base.clone()),
        };
        let tree = match (&self.tree, &other.tree) {
            (Some(base), Some(over)) => Some(TreeConfig {
                default_max_depth: over.default_max_depth.or(base.default_max_depth),
            }),
            (base, over) => over.clone().or_else(|| base.clone()),
        };
        FileConfig {
            pool,
            logging,
            tree,
        }
    }
}

/// Unit-of-work pool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Maximum concurrent units of work
    pub max_connections: Option<usize>,

    /// How long an operation waits for a unit of work, in milliseconds
    pub acquisition_timeout_ms: Option<u64>,
}

impl PoolConfig {
    /// Validate the pool configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == Some(0) {
            return Err(ConfigError::InvalidValue(
                "pool.max_connections must be at least 1".to_string(),
            ));
        }
        if self.acquisition_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue(
                "pool.acquisition_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level ("trace", "debug", "info", "warn" or "error")
    pub level: Option<String>,
}

impl LoggingConfig {
    /// Valid log levels.
    pub const VALID_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validate the logging configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.level {
            if !Self::VALID_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid log level '{}', must be one of: {}",
                    level,
                    Self::VALID_LEVELS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Tree read defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    /// Depth bound used when a request does not give one (unbounded if unset)
    pub default_max_depth: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FileConfig::default();
        assert!(config.pool.is_none());
        assert!(config.logging.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_connections_rejected() {
        let config = FileConfig {
            pool: Some(PoolConfig {
                max_connections: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let pool = PoolConfig {
            acquisition_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(pool.validate().is_err());
    }

    #[test]
    fn invalid_level_rejected() {
        let logging = LoggingConfig {
            level: Some("loud".to_string()),
        };
        assert!(logging.validate().is_err());
        let logging = LoggingConfig {
            level: Some("debug".to_string()),
        };
        assert!(logging.validate().is_ok());
    }

    #[test]
    fn roundtrip() {
        let config = FileConfig {
            pool: Some(PoolConfig {
                max_connections: Some(4),
                acquisition_timeout_ms: Some(500),
            }),
            logging: Some(LoggingConfig {
                level: Some("info".to_string()),
            }),
            tree: Some(TreeConfig {
                default_max_depth: Some(3),
            }),
        };

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: FileConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn reject_unknown_fields() {
        let toml = r#"
            [pool]
            max_connections = 3
            max_sessions = 9
        "#;
        let result: Result<FileConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn merge_prefers_overlay_per_field() {
        let global = FileConfig {
            pool: Some(PoolConfig {
                max_connections: Some(20),
                acquisition_timeout_ms: Some(20_000),
            }),
            logging: Some(LoggingConfig {
                level: Some("warn".to_string()),
            }),
            tree: None,
        };
        let project = FileConfig {
            pool: Some(PoolConfig {
                max_connections: Some(2),
                acquisition_timeout_ms: None,
            }),
            logging: None,
            tree: Some(TreeConfig {
                default_max_depth: Some(1),
            }),
        };

        let merged = global.merged_with(&project);
        let pool = merged.pool.unwrap();
        assert_eq!(pool.max_connections, Some(2));
        assert_eq!(pool.acquisition_timeout_ms, Some(20_000));
        assert_eq!(merged.logging.unwrap().level.as_deref(), Some("warn"));
        assert_eq!(merged.tree.unwrap().default_max_depth, Some(1));
    }
}
