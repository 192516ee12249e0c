//! Validator configuration.
//!
//! Built once at startup and handed to the validator; it is never mutated
//! afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which local override layers the validator consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Consult SLURM assertions before anything else.
    pub apply_assertions: bool,
    /// Consult SLURM filters before ROAs.
    pub apply_filters: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            apply_assertions: true,
            apply_filters: true,
        }
    }
}

impl ValidatorConfig {
    /// Plain RPKI validation with every SLURM layer disabled.
    #[must_use]
    pub const fn rpki_only() -> Self {
        Self {
            apply_assertions: false,
            apply_filters: false,
        }
    }

    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on malformed JSON or unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` if it is not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
