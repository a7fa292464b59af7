//! Provider configuration.
//!
//! ```toml
//! [storage]
//! path = "/var/lib/forecast/weather.db"
//!
//! [provider]
//! authority = "forecast.provider"
//! notify_buffer = 100
//!
//! [sync]
//! prune_past = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use forecast_types::contract::DEFAULT_AUTHORITY;

use crate::events::DEFAULT_NOTIFY_BUFFER;

/// Maximum number of buffered change events per subscriber.
pub const MAX_NOTIFY_BUFFER: usize = 10_000;

/// Provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Routing and notification settings.
    pub provider: ProviderConfig,
    /// Sync settings.
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from the default path, or defaults if absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// This checks:
    /// - Storage path is not empty
    /// - Authority is a single non-empty component usable in a locator
    /// - Notification buffer is between 1 and [`MAX_NOTIFY_BUFFER`]
    ///
    /// # Example
    ///
    /// ```
    /// use forecast_core::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.storage.validate());
        errors.extend(self.provider.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: forecast_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Routing and notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Authority component of every locator the provider answers.
    pub authority: String,
    /// Change events buffered per subscriber before it is considered lagging.
    pub notify_buffer: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
            notify_buffer: DEFAULT_NOTIFY_BUFFER,
        }
    }
}

impl ProviderConfig {
    /// Validate provider configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.authority.is_empty() {
            errors.push(ValidationError {
                field: "provider.authority".to_string(),
                message: "authority cannot be empty".to_string(),
            });
        } else if self
            .authority
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
        {
            errors.push(ValidationError {
                field: "provider.authority".to_string(),
                message: format!(
                    "invalid authority '{}': must not contain whitespace, '/', '?' or '#'",
                    self.authority
                ),
            });
        }

        if self.notify_buffer == 0 {
            errors.push(ValidationError {
                field: "provider.notify_buffer".to_string(),
                message: "notify buffer must be at least 1".to_string(),
            });
        } else if self.notify_buffer > MAX_NOTIFY_BUFFER {
            errors.push(ValidationError {
                field: "provider.notify_buffer".to_string(),
                message: format!(
                    "notify buffer {} is too large (maximum {})",
                    self.notify_buffer, MAX_NOTIFY_BUFFER
                ),
            });
        }

        errors
    }
}

/// Sync configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delete records dated before today in the same transaction as each sync.
    pub prune_past: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { prune_past: true }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path (e.g., `provider.authority`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("forecast")
        .join("provider.toml")
}
