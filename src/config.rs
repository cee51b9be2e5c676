//! Engine configuration
//!
//! Loaded from a TOML file (all keys optional) and then overridden by
//! command-line flags.
//!
//! ```toml
//! skip_invalid = true
//! preview_limit = 10
//! stats_extended = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a replay run
///
/// # Example
/// ```
/// use isocore::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert!(!config.skip_invalid);
/// assert_eq!(config.preview_limit, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Skip malformed records instead of aborting the run
    ///
    /// Skipped lines never reach the classifier, so they are not part of
    /// `total_processed`; they are reported separately.
    ///
    /// Default: false
    pub skip_invalid: bool,

    /// Maximum number of mapped records kept for the report (0 = keep all)
    ///
    /// Only the records list is truncated. Counters always cover the
    /// whole input.
    ///
    /// Default: 3
    pub preview_limit: usize,

    /// Compute percentile latency statistics
    ///
    /// Default: false
    pub stats_extended: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skip_invalid: false,
            preview_limit: 3,
            stats_extended: false,
        }
    }
}

impl EngineConfig {
    /// Abort on the first malformed record and keep every mapped record
    pub fn strict() -> Self {
        Self {
            skip_invalid: false,
            preview_limit: 0,
            stats_extended: true,
        }
    }

    /// Tolerate malformed records
    pub fn permissive() -> Self {
        Self {
            skip_invalid: true,
            ..Self::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // usize already rules out negatives; cap absurd preview sizes
        if self.preview_limit > 1_000_000 {
            return Err(ConfigError::Invalid(format!(
                "preview_limit must be <= 1000000, got {}",
                self.preview_limit
            )));
        }
        Ok(())
    }

    /// Whether another mapped record fits in the preview
    pub fn keeps_record(&self, kept: usize) -> bool {
        self.preview_limit == 0 || kept < self.preview_limit
    }
}
