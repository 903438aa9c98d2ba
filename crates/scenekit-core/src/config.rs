//! Kernel tunables.

use crate::error::ConfigError;
use crate::geometry::DEFAULT_MAX_DENOMINATOR;
use crate::geometry::rect::DEFAULT_GAP_TOLERANCE;
use crate::presence::DEFAULT_MAX_VISIBLE_CURSORS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of undo steps kept by a document.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Settings shared by documents and sessions. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Largest denominator produced when simplifying ratios.
    pub max_denominator: u64,
    /// Allowed deviation from the mean gap for spacing to count as uniform.
    pub gap_tolerance: f64,
    pub max_visible_cursors: usize,
    pub max_undo_history: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_denominator: DEFAULT_MAX_DENOMINATOR,
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
            max_visible_cursors: DEFAULT_MAX_VISIBLE_CURSORS,
            max_undo_history: MAX_UNDO_HISTORY,
        }
    }
}

impl KernelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded kernel config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_denominator == 0 {
            return Err(ConfigError::Invalid("max_denominator must be at least 1".into()));
        }
        if !self.gap_tolerance.is_finite() || self.gap_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gap_tolerance must be a non-negative number, got {}",
                self.gap_tolerance
            )));
        }
        Ok(())
    }
}
